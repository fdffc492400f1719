use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELF_ENV";
const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";

/// Deployment environment the console is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `SHELF_*` variables (nested keys joined with `__`).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_filename = format!("{}.toml", environment);
        let environment_path = config_dir.join(environment_filename);

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("SHELF")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Location of the remote catalog (GraphQL) and its token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "ApiSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiSettings::default_graphql_path")]
    pub graphql_path: String,
    #[serde(default = "ApiSettings::default_token_path")]
    pub token_path: String,
    #[serde(default = "ApiSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Development backends serve self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl ApiSettings {
    fn default_base_url() -> String {
        "https://localhost:3000".to_string()
    }

    fn default_graphql_path() -> String {
        "/graphql".to_string()
    }

    fn default_token_path() -> String {
        "/auth/token".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10000
    }

    pub fn graphql_url(&self) -> String {
        join_url(&self.base_url, &self.graphql_path)
    }

    pub fn token_url(&self) -> String {
        join_url(&self.base_url, &self.token_path)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            graphql_path: Self::default_graphql_path(),
            token_path: Self::default_token_path(),
            timeout_ms: Self::default_timeout_ms(),
            accept_invalid_certs: false,
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Role identifier in `realm_access.roles` that grants write access.
    #[serde(default = "AuthSettings::default_admin_role")]
    pub admin_role: String,
    /// Where the bearer token is persisted between runs.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl AuthSettings {
    fn default_admin_role() -> String {
        "buch-admin".to_string()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_role: Self::default_admin_role(),
            token_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_api_points_at_local_backend() {
        let settings = Settings::default();
        assert_eq!(settings.api.graphql_url(), "https://localhost:3000/graphql");
        assert_eq!(settings.api.token_url(), "https://localhost:3000/auth/token");
        assert!(!settings.api.accept_invalid_certs);
    }

    #[test]
    fn url_join_tolerates_slashes() {
        let api = ApiSettings {
            base_url: "http://127.0.0.1:9000/".to_string(),
            graphql_path: "graphql".to_string(),
            ..ApiSettings::default()
        };
        assert_eq!(api.graphql_url(), "http://127.0.0.1:9000/graphql");
    }

    #[test]
    fn default_admin_role() {
        assert_eq!(Settings::default().auth.admin_role, "buch-admin");
    }
}
