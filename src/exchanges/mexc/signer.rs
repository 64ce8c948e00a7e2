use crate::core::kernel::signer::{encode_query, hmac_sha256_hex, sorted_params};
use crate::core::kernel::{AuthHeaders, SignRequest, SignatureResult, Signer};
use secrecy::{ExposeSecret, Secret};

/// MEXC contract API signing: hex HMAC-SHA256 over
/// `apiKey + requestTimeMs + payload`, where the payload is the sorted query
/// string for GET and the raw JSON body for POST.
pub struct MexcSigner {
    api_key: String,
    secret_key: Secret<String>,
}

impl MexcSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
        }
    }
}

impl Signer for MexcSigner {
    fn sign_request(&self, request: &SignRequest<'_>) -> SignatureResult {
        let query = sorted_params(request.params);
        let payload = if request.is_post() {
            request.body.to_string()
        } else {
            encode_query(&query)?
        };

        let message = format!("{}{}{}", self.api_key, request.timestamp, payload);
        let signature = hmac_sha256_hex(self.secret_key.expose_secret().as_bytes(), message.as_bytes())?;

        Ok(AuthHeaders {
            headers: vec![
                ("ApiKey".to_string(), self.api_key.clone()),
                ("Request-Time".to_string(), request.timestamp.to_string()),
                ("Signature".to_string(), signature),
            ],
            query,
        })
    }
}
