pub mod rest;

use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::Rng as _;
use reqwest::Url;
use tempfile::TempDir;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, error};
use watchlist_server::config::{Parser, ServerConfig};

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

/// Server configuration with fresh data directory (and thus empty database) and random port
pub fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let database_url = format!("sqlite://{}/watchlist.db", data_dir);
    let port = random_port()?.to_string();
    let args = &[
        "watchlist-e2e-tests",
        "--data-dir",
        &data_dir,
        "--database-url",
        &database_url,
        "--port",
        &port,
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub fn base_url(config: &ServerConfig) -> Result<Url> {
    let url = Url::parse(&format!(
        "http://{}:{}/",
        config.listen_address, config.port
    ))?;
    Ok(url)
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut().unwrap().push(&segment.to_string());
    url
}

/// Running server, stopped when dropped
pub struct ServerGuard {
    shutdown: Option<oneshot::Sender<()>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn launch_env(config: ServerConfig) -> Result<(reqwest::Client, ServerGuard)> {
    let state = watchlist_server::run::build_state(&config).await?;
    let addr: std::net::SocketAddr =
        format!("{}:{}", config.listen_address, config.port).parse()?;
    let (sender, receiver) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = receiver.await;
    };
    let handle = tokio::spawn(async move {
        if let Err(e) =
            watchlist_server::run::run_graceful_with_state(config, state, shutdown).await
        {
            error!("Server error: {e}");
        }
    });

    let mut retries = 50;
    loop {
        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => break,
            Err(e) if retries > 0 => {
                debug!("Server not ready yet: {e}");
                retries -= 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(e) => return Err(anyhow!("Server did not start: {e}")),
        }
    }

    let client = reqwest::Client::new();
    Ok((
        client,
        ServerGuard {
            shutdown: Some(sender),
            handle,
        },
    ))
}
