use crate::core::types::Exchange;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::env;
use std::fmt;

/// API credentials for one exchange account.
///
/// Owned by the caller; connectors only borrow them while a request is being
/// built. Secrets are zeroized on drop and never printed.
#[derive(Clone)]
pub struct ExchangeCredentials {
    pub exchange: Exchange,
    pub api_key: Secret<String>,
    pub api_secret: Secret<String>,
    pub wallet_address: Option<String>,
}

impl fmt::Debug for ExchangeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeCredentials")
            .field("exchange", &self.exchange)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("wallet_address", &self.wallet_address)
            .finish()
    }
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeCredentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeCredentials", 4)?;
        state.serialize_field("exchange", &self.exchange)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("api_secret", "[REDACTED]")?;
        state.serialize_field("wallet_address", &self.wallet_address)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeCredentials {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CredentialsHelper {
            exchange: Exchange,
            #[serde(default)]
            api_key: String,
            #[serde(default)]
            api_secret: String,
            #[serde(default)]
            wallet_address: Option<String>,
        }

        let helper = CredentialsHelper::deserialize(deserializer)?;
        Ok(Self {
            exchange: helper.exchange,
            api_key: Secret::new(helper.api_key),
            api_secret: Secret::new(helper.api_secret),
            wallet_address: helper.wallet_address.filter(|w| !w.is_empty()),
        })
    }
}

impl ExchangeCredentials {
    pub fn new(exchange: Exchange, api_key: String, api_secret: String) -> Self {
        Self {
            exchange,
            api_key: Secret::new(api_key),
            api_secret: Secret::new(api_secret),
            wallet_address: None,
        }
    }

    /// Credentials for exchanges that expose account state by address only.
    pub fn wallet(exchange: Exchange, wallet_address: impl Into<String>) -> Self {
        Self {
            exchange,
            api_key: Secret::new(String::new()),
            api_secret: Secret::new(String::new()),
            wallet_address: Some(wallet_address.into()),
        }
    }

    #[must_use]
    pub fn with_wallet_address(mut self, wallet_address: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self
    }

    /// Create credentials from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY`
    /// - `{PREFIX}_API_SECRET` (or `{PREFIX}_SECRET_KEY`)
    /// - `{PREFIX}_WALLET_ADDRESS` (optional, required for Hyperliquid)
    pub fn from_env(exchange: Exchange) -> Result<Self, ConfigError> {
        let prefix = exchange.env_prefix();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_var = format!("{}_API_SECRET", prefix);
        let legacy_secret_var = format!("{}_SECRET_KEY", prefix);
        let wallet_var = format!("{}_WALLET_ADDRESS", prefix);

        let api_key = env::var(&api_key_var).unwrap_or_default();
        let api_secret = env::var(&secret_var)
            .or_else(|_| env::var(&legacy_secret_var))
            .unwrap_or_default();
        let wallet_address = env::var(&wallet_var).ok().filter(|w| !w.is_empty());

        let credentials = Self {
            exchange,
            api_key: Secret::new(api_key),
            api_secret: Secret::new(api_secret),
            wallet_address,
        };

        if credentials.is_usable() {
            Ok(credentials)
        } else if exchange == Exchange::Hyperliquid {
            Err(ConfigError::MissingEnvironmentVariable(wallet_var))
        } else if credentials.api_key().is_empty() {
            Err(ConfigError::MissingEnvironmentVariable(api_key_var))
        } else {
            Err(ConfigError::MissingEnvironmentVariable(secret_var))
        }
    }

    /// Create credentials from a specific .env file path, falling back to
    /// the process environment when the file does not exist.
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange: Exchange, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange)
    }

    /// Load every exchange whose credentials are present in the environment
    /// (after reading `.env` when the `env-file` feature is on).
    pub fn all_from_env() -> HashMap<Exchange, Self> {
        #[cfg(feature = "env-file")]
        {
            let _ = dotenv::dotenv();
        }

        Exchange::ALL
            .into_iter()
            .filter_map(|exchange| Self::from_env(exchange).ok().map(|c| (exchange, c)))
            .collect()
    }

    /// Whether these credentials are enough to query account state.
    pub fn is_usable(&self) -> bool {
        match self.exchange {
            Exchange::Hyperliquid => self.account_address().is_some(),
            _ => self.has_credentials(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.api_secret.expose_secret().is_empty()
    }

    /// Address used for address-keyed account queries. Falls back to the API
    /// key, which some deployments store the address in.
    pub fn account_address(&self) -> Option<&str> {
        self.wallet_address
            .as_deref()
            .filter(|w| !w.is_empty())
            .or_else(|| Some(self.api_key()).filter(|k| !k.is_empty()))
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get API secret (use carefully - exposes secret)
    pub fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

/// Transport settings shared by every connector built by the factory
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    /// REST request timeout in seconds
    pub timeout_seconds: u64,
    /// Base URL overrides per exchange (testnets, proxies, mock servers)
    pub base_urls: HashMap<Exchange, String>,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            base_urls: HashMap::new(),
        }
    }
}

impl ConnectorSettings {
    #[must_use]
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, exchange: Exchange, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(exchange, base_url.into());
        self
    }

    pub fn base_url(&self, exchange: Exchange, default: &str) -> String {
        self.base_urls
            .get(&exchange)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
