// config.rs
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub cors_origin: String,
    /// Insert a bare user row for identities the store has not seen yet.
    pub auto_provision_users: bool,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn init() -> Result<Config, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `init` reads the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let port = match lookup("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a valid port number, got {:?}", v))?,
            None => 5000,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got {:?}", v))?,
            None => 10,
        };

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let auto_provision_users = lookup("AUTO_PROVISION_USERS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let log_level = match lookup("LOG_LEVEL") {
            Some(v) => v
                .trim()
                .parse::<LevelFilter>()
                .map_err(|_| format!("LOG_LEVEL must be one of off, error, warn, info, debug, trace, got {:?}", v))?,
            None => LevelFilter::DEBUG,
        };

        Ok(Config {
            database_url,
            port,
            db_max_connections,
            cors_origin,
            auto_provision_users,
            log_level,
        })
    }
}
