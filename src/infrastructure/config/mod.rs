use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::domain::activity::{ActivityCatalog, DEFAULT_REVIT_VERSION};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::security::keyring::KeyringManager;

pub const ENV_PREFIX: &str = "APSFLOW_";
pub const CONFIG_PATH_ENV: &str = "APSFLOW_CONFIG";
const LEGACY_TOKEN_ENV: &str = "APS_ACCESS_TOKEN";
const TOKEN_KEY: &str = "aps-access-token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApsConfig {
    pub base_url: String,
    pub da_region: String,
    pub request_timeout_secs: u64,
}

impl ApsConfig {
    pub fn design_automation_url(&self) -> String {
        format!(
            "{}/da/{}/v3",
            self.base_url.trim_end_matches('/'),
            self.da_region
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub max_wait_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    pub aps: ApsConfig,
    pub polling: PollingConfig,
    pub default_revit_version: String,
    pub activities: ActivityCatalog,
    pub http: HttpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            aps: ApsConfig {
                base_url: "https://developer.api.autodesk.com".to_string(),
                da_region: "us-east".to_string(),
                request_timeout_secs: 30,
            },
            polling: PollingConfig {
                interval_secs: 10,
                max_wait_secs: 600,
            },
            default_revit_version: DEFAULT_REVIT_VERSION.to_string(),
            activities: ActivityCatalog::default(),
            http: HttpConfig {
                host: "127.0.0.1".to_string(),
                port: 8787,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then `APSFLOW_*` variables.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        if let Some(path) = &path {
            debug!(path = %path, "Loading configuration file");
        }
        Self::from_figment(Self::figment(path.as_deref().map(Path::new)))
    }

    fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            return Err(AppError::ConfigError(
                "polling.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.polling.max_wait_secs == 0 {
            return Err(AppError::ConfigError(
                "polling.max_wait_secs must be greater than zero".to_string(),
            ));
        }
        if url::Url::parse(&self.aps.base_url).is_err() {
            return Err(AppError::ConfigError(format!(
                "aps.base_url is not a valid URL: {}",
                self.aps.base_url
            )));
        }
        Ok(())
    }
}

pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new("apsflow"),
        }
    }

    pub fn save_access_token(&self, token: &str) -> Result<()> {
        self.keyring.set_secret(TOKEN_KEY, token)
    }

    pub fn get_access_token(&self) -> Result<String> {
        self.keyring.get_secret(TOKEN_KEY)
    }

    pub fn delete_access_token(&self) -> Result<()> {
        self.keyring.delete_secret(TOKEN_KEY)
    }

    /// Configured token first, then `APS_ACCESS_TOKEN`, then the keyring.
    pub fn resolve_access_token(&self, config: &AppConfig) -> Result<String> {
        if let Some(token) = non_blank(config.access_token.clone()) {
            return Ok(token);
        }
        if let Some(token) = non_blank(std::env::var(LEGACY_TOKEN_ENV).ok()) {
            return Ok(token);
        }
        self.get_access_token().map_err(|err| {
            AppError::SecurityError(format!(
                "No APS access token configured (set APSFLOW_ACCESS_TOKEN or run `apsflow token set`): {}",
                err
            ))
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn with_toml(toml: &str) -> Result<AppConfig> {
        AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = with_toml("").unwrap();
        assert_eq!(config.polling.interval_secs, 10);
        assert_eq!(config.polling.max_wait_secs, 600);
        assert_eq!(config.default_revit_version, "2024");
        assert_eq!(
            config.aps.design_automation_url(),
            "https://developer.api.autodesk.com/da/us-east/v3"
        );
    }

    #[test]
    fn test_toml_overrides() {
        let config = with_toml(
            r#"
            default_revit_version = "2023"

            [aps]
            da_region = "eu-west"

            [polling]
            interval_secs = 5

            [activities.ifc_export.signatures]
            "2023" = "signature"
            "#,
        )
        .unwrap();
        assert_eq!(config.polling.interval_secs, 5);
        assert_eq!(config.polling.max_wait_secs, 600);
        assert_eq!(config.default_revit_version, "2023");
        assert!(config.aps.design_automation_url().contains("/da/eu-west/v3"));
        assert_eq!(
            config.activities.ifc_export.signatures.get("2023").map(String::as_str),
            Some("signature")
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = with_toml("[polling]\ninterval_secs = 0").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(with_toml("[aps]\nbase_url = \"not a url\"").is_err());
    }

    #[test]
    fn test_env_overrides_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "apsflow.toml",
                "[polling]\ninterval_secs = 5\nmax_wait_secs = 300\n",
            )?;
            jail.set_env("APSFLOW_POLLING__MAX_WAIT_SECS", "120");
            jail.set_env("APSFLOW_APS__DA_REGION", "eu-west");

            let config = AppConfig::from_figment(AppConfig::figment(Some(Path::new(
                "apsflow.toml",
            ))))
            .map_err(|e| e.to_string())?;
            assert_eq!(config.polling.interval_secs, 5);
            assert_eq!(config.polling.max_wait_secs, 120);
            assert_eq!(config.aps.da_region, "eu-west");
            Ok(())
        });
    }

    #[test]
    fn test_load_reads_file_named_by_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                "default_revit_version = \"2023\"\n[http]\nport = 9100\n",
            )?;
            jail.set_env(CONFIG_PATH_ENV, "custom.toml");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.default_revit_version, "2023");
            assert_eq!(config.http.port, 9100);
            assert_eq!(config.polling.max_wait_secs, 600);
            Ok(())
        });
    }

    #[test]
    fn test_blank_configured_token_falls_back_to_env() {
        Jail::expect_with(|jail| {
            jail.set_env(LEGACY_TOKEN_ENV, "legacy-token");
            let config = AppConfig {
                access_token: Some("   ".to_string()),
                ..Default::default()
            };

            let token = ConfigService::new()
                .resolve_access_token(&config)
                .map_err(|e| e.to_string())?;
            assert_eq!(token, "legacy-token");
            Ok(())
        });
    }

    #[test]
    fn test_access_token_from_prefixed_env() {
        Jail::expect_with(|jail| {
            jail.set_env("APSFLOW_ACCESS_TOKEN", "env-token");
            let config = AppConfig::from_figment(AppConfig::figment(None))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.access_token.as_deref(), Some("env-token"));
            Ok(())
        });
    }

    #[test]
    fn test_configured_token_wins() {
        let config = AppConfig {
            access_token: Some("  token-from-config ".to_string()),
            ..Default::default()
        };
        let token = ConfigService::new().resolve_access_token(&config).unwrap();
        assert_eq!(token, "token-from-config");
    }
}
