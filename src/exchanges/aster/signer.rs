use crate::core::kernel::signer::{encode_query, hmac_sha256_hex, sorted_params};
use crate::core::kernel::{AuthHeaders, SignRequest, SignatureResult, Signer};
use secrecy::{ExposeSecret, Secret};

/// Binance-style HMAC-SHA256 signing: the parameters plus `timestamp` are
/// sorted by key, percent-encoded, and the hex digest is appended as
/// `signature`. The key travels in `X-MBX-APIKEY`.
pub struct AsterSigner {
    api_key: String,
    secret_key: Secret<String>,
}

impl AsterSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
        }
    }
}

impl Signer for AsterSigner {
    fn sign_request(&self, request: &SignRequest<'_>) -> SignatureResult {
        let mut params = request.params.to_vec();
        params.push(("timestamp".to_string(), request.timestamp.to_string()));

        let mut query = sorted_params(&params);
        let payload = encode_query(&query)?;
        let signature = hmac_sha256_hex(self.secret_key.expose_secret().as_bytes(), payload.as_bytes())?;
        query.push(("signature".to_string(), signature));

        Ok(AuthHeaders {
            headers: vec![("X-MBX-APIKEY".to_string(), self.api_key.clone())],
            query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_golden_value() {
        let signer = AsterSigner::new("aster-key".into(), "aster-secret".into());
        let params = vec![("symbol".to_string(), "BTCUSDT".to_string())];
        let auth = signer
            .sign_request(&SignRequest {
                method: "GET",
                path: "/fapi/v2/positionRisk",
                params: &params,
                body: "",
                timestamp: 1_700_000_000_000,
            })
            .unwrap();

        assert_eq!(auth.header("X-MBX-APIKEY"), Some("aster-key"));
        assert_eq!(auth.query_param("timestamp"), Some("1700000000000"));
        assert_eq!(
            auth.query_param("signature"),
            Some("f1414cddcdf3a882514a85a5cbd7aae3b9a3a6f6146ebd720ec758d1fac115f7")
        );
        assert_eq!(auth.query.last().map(|(k, _)| k.as_str()), Some("signature"));
    }

    #[test]
    fn test_signing_is_deterministic_and_sorted() {
        let signer = AsterSigner::new("k".into(), "s".into());
        let params = vec![
            ("symbol".to_string(), "ETHUSDT".to_string()),
            ("limit".to_string(), "10".to_string()),
        ];
        let request = SignRequest {
            method: "GET",
            path: "/fapi/v1/openOrders",
            params: &params,
            body: "",
            timestamp: 42,
        };
        let first = signer.sign_request(&request).unwrap();
        let second = signer.sign_request(&request).unwrap();
        assert_eq!(first, second);

        let keys: Vec<&str> = first.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["limit", "symbol", "timestamp", "signature"]);
    }
}
