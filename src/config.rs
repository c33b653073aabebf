use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Environment variable {key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read from `PRIVATE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub oba_server_url: String,
    pub oba_api_key: String,
    pub obaco_api_base_url: String,
    pub region_id: String,
    pub geocoder_provider: String,
    pub geocoder_api_key: String,
    pub alerts_test_mode: bool,
    pub port: u16,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, self::Error> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, self::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, self::Error> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(self::Error::Missing(key))
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| self::Error::Invalid {
                key: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let alerts_test_mode = matches!(
            lookup("PRIVATE_ALERTS_TEST_MODE").as_deref(),
            Some("true") | Some("1")
        );

        Ok(Self {
            oba_server_url: required("PRIVATE_OBA_SERVER_URL")?,
            oba_api_key: required("PRIVATE_OBA_API_KEY")?,
            obaco_api_base_url: required("PRIVATE_OBACO_API_BASE_URL")?,
            region_id: required("PRIVATE_REGION_ID")?,
            geocoder_provider: lookup("PRIVATE_OBA_GEOCODER_PROVIDER")
                .unwrap_or_else(|| "google".into()),
            geocoder_api_key: lookup("PRIVATE_OBA_GEOCODER_API_KEY").unwrap_or_default(),
            alerts_test_mode,
            port,
        })
    }
}
