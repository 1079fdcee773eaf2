//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub app_url: String,
    pub discord_client_id: String,
    pub discord_client_secret: String,
    pub discord_bot_token: String,
    pub discord_guild_id: String,
    pub discord_public_key: String,
    pub discord_broker_role_id: String,
    pub discord_staff_roles: String,
    pub discord_user_roles: String,
    pub imgur_client_id: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing or improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "ticketdesk".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()
                .unwrap(),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET is required"),
            jwt_duration_minutes: env::var("JWT_DURATION_MINUTES")
                .unwrap_or("1440".into())
                .parse()
                .unwrap(),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            discord_client_id: env::var("DISCORD_CLIENT_ID").unwrap_or_default(),
            discord_client_secret: env::var("DISCORD_CLIENT_SECRET").unwrap_or_default(),
            discord_bot_token: env::var("DISCORD_BOT_TOKEN").unwrap_or_default(),
            discord_guild_id: env::var("DISCORD_GUILD_ID").unwrap_or_default(),
            discord_public_key: env::var("DISCORD_PUBLIC_KEY").unwrap_or_default(),
            discord_broker_role_id: env::var("DISCORD_BROKER_ROLE_ID").unwrap_or_default(),
            discord_staff_roles: env::var("DISCORD_STAFF_ROLES").unwrap_or_default(),
            discord_user_roles: env::var("DISCORD_USER_ROLES").unwrap_or_default(),
            imgur_client_id: env::var("IMGUR_CLIENT_ID").unwrap_or_default(),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap();
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value.into());
    }

    pub fn set_app_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.app_url = value.into());
    }

    pub fn set_discord_guild_id(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.discord_guild_id = value.into());
    }

    pub fn set_discord_public_key(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.discord_public_key = value.into());
    }

    pub fn set_discord_broker_role_id(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.discord_broker_role_id = value.into());
    }

    pub fn set_discord_staff_roles(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.discord_staff_roles = value.into());
    }

    pub fn set_discord_user_roles(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.discord_user_roles = value.into());
    }
}

// --- Module-level accessors ---
//
// Call sites read single values through `config::port()` style functions so
// the read lock is held only for the duration of one clone.

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn app_url() -> String {
    AppConfig::global().app_url.clone()
}

pub fn discord_client_id() -> String {
    AppConfig::global().discord_client_id.clone()
}

pub fn discord_client_secret() -> String {
    AppConfig::global().discord_client_secret.clone()
}

pub fn discord_bot_token() -> String {
    AppConfig::global().discord_bot_token.clone()
}

pub fn discord_guild_id() -> String {
    AppConfig::global().discord_guild_id.clone()
}

pub fn discord_public_key() -> String {
    AppConfig::global().discord_public_key.clone()
}

pub fn discord_broker_role_id() -> String {
    AppConfig::global().discord_broker_role_id.clone()
}

pub fn discord_staff_roles() -> String {
    AppConfig::global().discord_staff_roles.clone()
}

pub fn discord_user_roles() -> String {
    AppConfig::global().discord_user_roles.clone()
}

pub fn imgur_client_id() -> String {
    AppConfig::global().imgur_client_id.clone()
}
