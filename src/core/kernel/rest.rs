use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{encode_query, AuthHeaders, SignRequest, Signer};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{instrument, trace};

/// REST client trait for making HTTP requests
///
/// Implementations execute exactly one request per call and classify the
/// outcome: non-2xx responses become `ExchangeError::ApiError`, network
/// failures become `ExchangeError::TransportError`. Retrying is left to the
/// caller.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs
    /// * `authenticated` - Whether to sign the request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;

    /// Make a GET request with strongly-typed response
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        let value = self.get(endpoint, query_params, authenticated).await?;
        serde_json::from_value(value).map_err(|e| {
            ExchangeError::DeserializationError(format!("Failed to deserialize JSON: {}", e))
        })
    }

    /// Make a POST request with a JSON body
    async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;

    /// Name of the exchange this client talks to, for errors and tracing
    fn exchange_name(&self) -> &str;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Optional client-side request quota
    pub quota: Option<Quota>,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name of the exchange
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange_name,
            timeout_seconds: 15,
            user_agent: "perpscope/0.1".to_string(),
            quota: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Throttle requests client-side
    pub fn with_rate_limit(mut self, quota: Quota) -> Self {
        self.quota = Some(quota);
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| ExchangeError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let limiter = self
            .config
            .quota
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            limiter,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    /// Create an unauthenticated client with default settings
    pub fn new(base_url: String, exchange_name: String) -> Result<Self, ExchangeError> {
        RestClientBuilder::new(RestClientConfig::new(base_url, exchange_name)).build()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Get the current timestamp in milliseconds
    fn get_timestamp() -> Result<u64, ExchangeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| ExchangeError::Other(format!("Failed to get timestamp: {}", e)))
    }

    fn build_url(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query)
        }
    }

    fn sign(
        &self,
        method: &Method,
        endpoint: &str,
        params: &[(String, String)],
        body: &str,
    ) -> Result<AuthHeaders, ExchangeError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ExchangeError::AuthError(format!(
                "{}: authentication required but no signer provided",
                self.config.exchange_name
            ))
        })?;

        signer.sign_request(&SignRequest {
            method: method.as_str(),
            path: endpoint,
            params,
            body,
            timestamp: Self::get_timestamp()?,
        })
    }

    /// Classify the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e, "Failed to read response body"))?;

        trace!("Response body: {}", response_text);

        if !status.is_success() {
            return Err(ExchangeError::api(
                self.config.exchange_name.clone(),
                status.as_u16(),
                response_text,
            ));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            ExchangeError::DeserializationError(format!(
                "{}: failed to parse JSON response: {}",
                self.config.exchange_name, e
            ))
        })
    }

    fn transport_error(&self, error: &reqwest::Error, context: &str) -> ExchangeError {
        let kind = if error.is_timeout() {
            "timed out"
        } else if error.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        ExchangeError::transport(
            self.config.exchange_name.clone(),
            format!("{} ({}): {}", context, kind, error),
        )
    }

    /// Make a request with the given parameters
    #[instrument(skip(self, query_params, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        let params: Vec<(String, String)> = query_params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let body_text = match body {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };

        // Timestamp and nonce are taken after the quota wait
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let (headers, query) = if authenticated {
            let auth = self.sign(&method, endpoint, &params, &body_text)?;
            (auth.headers, auth.query)
        } else {
            (Vec::new(), params)
        };

        let url = self.build_url(endpoint, &encode_query(&query)?);
        let mut request = self.client.request(method, &url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        if body.is_some() {
            request = request
                .header("Content-Type", "application/json")
                .body(body_text);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e, "Request failed"))?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.make_request(Method::GET, endpoint, query_params, None, authenticated)
            .await
    }

    #[instrument(skip(self, body), fields(exchange = %self.config.exchange_name, endpoint = %endpoint))]
    async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.make_request(Method::POST, endpoint, &[], Some(body), authenticated)
            .await
    }

    fn exchange_name(&self) -> &str {
        &self.config.exchange_name
    }
}
