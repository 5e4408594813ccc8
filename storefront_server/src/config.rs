use std::{env, io::Write, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use sf_common::{
    helpers::{env_flag, env_parse, env_string},
    Secret,
};
use storefront_engine::{
    auth_objects::BootstrapAdmin,
    storage::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS},
    store_api::dashboard_api::DEFAULT_LOW_STOCK_THRESHOLD,
    StorageConfig,
    StoragePreference,
};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8080;
const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 24 * 60;
/// Shorter secrets are accepted, but trigger a warning.
const MIN_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Created on startup if no user with that username exists.
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Fill an empty catalog with demo products owned by the bootstrap admin.
    pub seed_demo_catalog: bool,
    pub low_stock_threshold: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            bootstrap_admin: None,
            seed_demo_catalog: false,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env_string("SF_HOST").unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = match env_parse::<u16>("SF_PORT") {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                error!("🪛️ SF_PORT is not a valid port. {e} Using the default, {DEFAULT_SF_PORT}, instead.");
                DEFAULT_SF_PORT
            },
            None => DEFAULT_SF_PORT,
        };
        let storage = storage_config_from_env();
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = env_flag("SF_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("SF_USE_FORWARDED", false);
        let bootstrap_admin = bootstrap_admin_from_env();
        let seed_demo_catalog = env_flag("SF_SEED_DEMO_CATALOG", false);
        if seed_demo_catalog && bootstrap_admin.is_none() {
            warn!("🪛️ SF_SEED_DEMO_CATALOG is set, but the demo catalog needs a bootstrap admin to own it. Skipping.");
        }
        let low_stock_threshold = match env_parse::<i64>("SF_LOW_STOCK_THRESHOLD") {
            Some(Ok(n)) if n >= 0 => n,
            Some(_) => {
                warn!(
                    "🪛️ Invalid configuration value for SF_LOW_STOCK_THRESHOLD. Using the default of \
                     {DEFAULT_LOW_STOCK_THRESHOLD}."
                );
                DEFAULT_LOW_STOCK_THRESHOLD
            },
            None => DEFAULT_LOW_STOCK_THRESHOLD,
        };
        Self {
            host,
            port,
            storage,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            bootstrap_admin,
            seed_demo_catalog,
            low_stock_threshold,
        }
    }
}

fn storage_config_from_env() -> StorageConfig {
    let preference = match env_parse::<StoragePreference>("SF_STORAGE") {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            error!("🪛️ {e}. Selecting a backend automatically.");
            StoragePreference::Auto
        },
        None => {
            info!("🪛️ SF_STORAGE is not set. Selecting a backend automatically.");
            StoragePreference::Auto
        },
    };
    let postgres_url = env_string("SF_POSTGRES_URL");
    let mysql_url = env_string("SF_MYSQL_URL");
    if preference == StoragePreference::Auto && postgres_url.is_none() && mysql_url.is_none() {
        warn!("🪛️ Neither SF_POSTGRES_URL nor SF_MYSQL_URL is set. The in-memory store will be used.");
    }
    let max_connections = match env_parse::<u32>("SF_DB_MAX_CONNECTIONS") {
        Some(Ok(n)) if n > 0 => n,
        Some(_) => {
            warn!("🪛️ Invalid value for SF_DB_MAX_CONNECTIONS. Using the default of {DEFAULT_MAX_CONNECTIONS}.");
            DEFAULT_MAX_CONNECTIONS
        },
        None => DEFAULT_MAX_CONNECTIONS,
    };
    let connect_timeout = match env_parse::<u64>("SF_DB_CONNECT_TIMEOUT") {
        Some(Ok(secs)) => StdDuration::from_secs(secs),
        Some(Err(e)) => {
            warn!("🪛️ Invalid value for SF_DB_CONNECT_TIMEOUT. {e}");
            DEFAULT_CONNECT_TIMEOUT
        },
        None => DEFAULT_CONNECT_TIMEOUT,
    };
    let run_migrations = env_flag("SF_RUN_MIGRATIONS", true);
    StorageConfig { preference, postgres_url, mysql_url, max_connections, connect_timeout, run_migrations }
}

fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    match (env_string("SF_ADMIN_USERNAME"), env_string("SF_ADMIN_EMAIL"), env::var("SF_ADMIN_PASSWORD").ok()) {
        (Some(username), Some(email), Some(password)) => {
            Some(BootstrapAdmin { username, email, password: Secret::new(password) })
        },
        (None, None, None) => {
            info!("🪛️ No bootstrap admin is configured.");
            None
        },
        _ => {
            warn!(
                "🪛️ The bootstrap admin needs all of SF_ADMIN_USERNAME, SF_ADMIN_EMAIL and SF_ADMIN_PASSWORD. No \
                 admin account will be created."
            );
            None
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC key used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token stays valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since every token becomes invalid when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = random_secret();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, you \
                     are doing it wrong! Set the SF_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self {
            jwt_secret: Secret::new(secret),
            token_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("SF_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [SF_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("SF_JWT_SECRET is empty".into()));
        }
        if secret.len() < MIN_SECRET_LENGTH {
            warn!("🪛️ SF_JWT_SECRET is shorter than {MIN_SECRET_LENGTH} characters. Consider using a longer secret.");
        }
        let token_lifetime = match env_parse::<i64>("SF_JWT_LIFETIME_MINUTES") {
            Some(Ok(minutes)) if minutes > 0 => Duration::minutes(minutes),
            Some(_) => {
                warn!(
                    "🪛️ Invalid configuration value for SF_JWT_LIFETIME_MINUTES. Using the default of \
                     {DEFAULT_TOKEN_LIFETIME_MINUTES} minutes."
                );
                Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES)
            },
            None => {
                info!(
                    "🪛️ SF_JWT_LIFETIME_MINUTES is not set. Tokens are valid for {DEFAULT_TOKEN_LIFETIME_MINUTES} \
                     minutes."
                );
                Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES)
            },
        };
        Ok(Self { jwt_secret: Secret::new(secret), token_lifetime })
    }
}

fn random_secret() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the server configuration that request handlers need. Secrets are deliberately left out.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
