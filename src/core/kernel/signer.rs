use crate::core::errors::ExchangeError;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Canonical description of a request to be signed
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    /// HTTP method (GET, POST, ...)
    pub method: &'a str,
    /// Endpoint path including any gateway prefix
    pub path: &'a str,
    /// Unsigned query parameters in caller order
    pub params: &'a [(String, String)],
    /// Raw request body (empty for GET)
    pub body: &'a str,
    /// Request timestamp / nonce in milliseconds
    pub timestamp: u64,
}

impl SignRequest<'_> {
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

/// Authentication material produced by a signer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Headers to attach to the request
    pub headers: Vec<(String, String)>,
    /// Final ordered query parameters, sent exactly as signed
    pub query: Vec<(String, String)>,
}

impl AuthHeaders {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub type SignatureResult = Result<AuthHeaders, ExchangeError>;

/// Signer trait for request authentication
///
/// Each exchange is one signing strategy behind this interface. Signing is a
/// pure function of the request (the timestamp is an input), so signers hold
/// no mutable state and can be shared across concurrent requests.
pub trait Signer: Send + Sync {
    fn sign_request(&self, request: &SignRequest<'_>) -> SignatureResult;
}

/// Percent-encode parameters as `k=v&k=v`, keeping their order.
pub fn encode_query(params: &[(String, String)]) -> Result<String, ExchangeError> {
    if params.is_empty() {
        return Ok(String::new());
    }
    let url = Url::parse_with_params("http://localhost/", params)
        .map_err(|e| ExchangeError::Other(format!("Failed to encode query: {}", e)))?;
    Ok(url.query().unwrap_or_default().to_string())
}

/// Parameters sorted ascending by key (stable for equal keys).
pub fn sorted_params(params: &[(String, String)]) -> Vec<(String, String)> {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
}

pub fn hmac_sha256_hex(secret: &[u8], payload: &[u8]) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ExchangeError::AuthError(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// `base64(HMAC-SHA512(secret, SHA256(message)))`
pub fn sha256_then_hmac_sha512_b64(secret: &[u8], message: &[u8]) -> Result<String, ExchangeError> {
    let digest = Sha256::digest(message);
    let mut mac = HmacSha512::new_from_slice(secret)
        .map_err(|e| ExchangeError::AuthError(format!("Failed to create HMAC: {}", e)))?;
    mac.update(&digest);
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn decode_base64_secret(exchange: &str, secret: &str) -> Result<Vec<u8>, ExchangeError> {
    if secret.trim().is_empty() {
        return Err(ExchangeError::invalid_secret(exchange, "secret is empty"));
    }
    general_purpose::STANDARD
        .decode(secret.trim())
        .map_err(|e| ExchangeError::invalid_secret(exchange, format!("not valid base64: {}", e)))
}
