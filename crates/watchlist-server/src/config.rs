use std::path::PathBuf;

pub use clap::Parser;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 5000,
        env = "WATCHLIST_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "WATCHLIST_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/watchlist.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "WATCHLIST_DATA_DIR",
        help = "Data directory for default database, default is system default like ~/.local/share/watchlist",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(long, env = "WATCHLIST_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("watchlist"))
        .unwrap_or_else(|| PathBuf::from("watchlist"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// True when database lives in data directory
    pub fn uses_default_database(&self) -> bool {
        self.database_url.is_none()
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/watchlist.db", self.data_dir))
    }
}
