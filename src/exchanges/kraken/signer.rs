use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{decode_base64_secret, encode_query, sha256_then_hmac_sha512_b64};
use crate::core::kernel::{AuthHeaders, SignRequest, SignatureResult, Signer};
use crate::core::types::Exchange;
use zeroize::Zeroizing;

/// Gateway prefix that is not part of the signed path
const GATEWAY_PREFIX: &str = "/derivatives";

/// Kraken Futures signing.
///
/// REST: `base64(HMAC-SHA512(secret, SHA256(postData + nonce + path)))`
/// where `postData` is the query string (plus the body for POST) and `path`
/// has the `/derivatives` prefix removed. The WebSocket challenge uses the
/// same construction over the challenge string alone.
pub struct KrakenSigner {
    api_key: String,
    secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for KrakenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenSigner").finish_non_exhaustive()
    }
}

impl KrakenSigner {
    /// Decodes the base64 secret once; an undecodable secret is rejected here.
    pub fn new(api_key: String, secret_b64: &str) -> Result<Self, ExchangeError> {
        let secret = decode_base64_secret(Exchange::KrakenFutures.as_str(), secret_b64)?;
        Ok(Self {
            api_key,
            secret: Zeroizing::new(secret),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign a WebSocket challenge
    pub fn sign_challenge(&self, challenge: &str) -> Result<String, ExchangeError> {
        sha256_then_hmac_sha512_b64(&self.secret, challenge.as_bytes())
    }

    /// `Authent` value for a REST call
    pub fn authent(&self, post_data: &str, nonce: u64, path: &str) -> Result<String, ExchangeError> {
        let sign_path = path.strip_prefix(GATEWAY_PREFIX).unwrap_or(path);
        let message = format!("{}{}{}", post_data, nonce, sign_path);
        sha256_then_hmac_sha512_b64(&self.secret, message.as_bytes())
    }
}

impl Signer for KrakenSigner {
    fn sign_request(&self, request: &SignRequest<'_>) -> SignatureResult {
        let query = request.params.to_vec();
        let mut post_data = encode_query(&query)?;
        if request.is_post() {
            post_data.push_str(request.body);
        }

        let authent = self.authent(&post_data, request.timestamp, request.path)?;

        Ok(AuthHeaders {
            headers: vec![
                ("APIKey".to_string(), self.api_key.clone()),
                ("Nonce".to_string(), request.timestamp.to_string()),
                ("Authent".to_string(), authent),
            ],
            query,
        })
    }
}
