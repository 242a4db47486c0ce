use tracing_subscriber::EnvFilter;
use watchlist_server::{
    config::{Parser as _, ServerConfig},
    run::run,
    Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = ServerConfig::parse();
    run(args).await
}
