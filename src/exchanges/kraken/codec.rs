use crate::core::errors::ExchangeError;
use crate::core::kernel::WsCodec;
use crate::core::stream::StreamEvent;
use crate::exchanges::kraken::conversions::{convert_stream_balances, convert_stream_positions};
use crate::exchanges::kraken::signer::KrakenSigner;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;

pub const FEED_OPEN_POSITIONS: &str = "open_positions";
pub const FEED_BALANCES: &str = "balances";

const REQUIRED_FEEDS: &[&str] = &[FEED_OPEN_POSITIONS, FEED_BALANCES];

/// Kraken Futures `ws/v1` private feed protocol
///
/// `challenge` -> sign -> one authenticated `subscribe` per feed.
pub struct KrakenStreamCodec {
    signer: Arc<KrakenSigner>,
}

impl KrakenStreamCodec {
    pub fn new(signer: Arc<KrakenSigner>) -> Self {
        Self { signer }
    }

    fn decode_text(&self, text: &str) -> Result<Option<StreamEvent>, ExchangeError> {
        let value: Value = serde_json::from_str(text)?;

        if let Some(event) = value.get("event").and_then(Value::as_str) {
            let message = || {
                value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            return Ok(Some(match event {
                "challenge" => StreamEvent::Challenge(message()),
                "subscribed" => match value.get("feed").and_then(Value::as_str) {
                    Some(feed) => StreamEvent::Subscribed(feed.to_string()),
                    None => StreamEvent::Ignored,
                },
                "error" | "alert" | "subscribed_failed" => {
                    let reason = message();
                    StreamEvent::ServerError(if reason.is_empty() {
                        format!("server sent {}", event)
                    } else {
                        reason
                    })
                }
                _ => StreamEvent::Ignored,
            }));
        }

        match value.get("feed").and_then(Value::as_str) {
            Some("open_positions") => Ok(Some(StreamEvent::Positions(convert_stream_positions(&value)))),
            Some("balances" | "balances_snapshot") => {
                Ok(Some(StreamEvent::Balances(convert_stream_balances(&value))))
            }
            Some(_) => Ok(Some(StreamEvent::Ignored)),
            None => Ok(None),
        }
    }
}

impl WsCodec for KrakenStreamCodec {
    type Message = StreamEvent;

    fn encode_handshake(&self) -> Result<Message, ExchangeError> {
        let request = json!({
            "event": "challenge",
            "api_key": self.signer.api_key(),
        });
        Ok(Message::Text(request.to_string()))
    }

    fn encode_subscription(&self, challenge: &str) -> Result<Vec<Message>, ExchangeError> {
        let signed = self.signer.sign_challenge(challenge)?;
        Ok(REQUIRED_FEEDS
            .iter()
            .map(|feed| {
                let request = json!({
                    "event": "subscribe",
                    "feed": feed,
                    "api_key": self.signer.api_key(),
                    "original_challenge": challenge,
                    "signed_challenge": signed,
                });
                Message::Text(request.to_string())
            })
            .collect())
    }

    fn required_feeds(&self) -> &[&'static str] {
        REQUIRED_FEEDS
    }

    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ExchangeError> {
        match message {
            Message::Text(text) => self.decode_text(&text),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> KrakenStreamCodec {
        let signer = KrakenSigner::new("kraken-key".into(), "a3Jha2VuLXRlc3Qtc2VjcmV0LWJ5dGVz").unwrap();
        KrakenStreamCodec::new(Arc::new(signer))
    }

    fn text(message: &Message) -> Value {
        match message {
            Message::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    fn decode(raw: &str) -> Option<StreamEvent> {
        codec().decode_message(Message::Text(raw.to_string())).unwrap()
    }

    #[test]
    fn test_handshake_and_subscriptions() {
        let codec = codec();
        let handshake = text(&codec.encode_handshake().unwrap());
        assert_eq!(handshake["event"], "challenge");
        assert_eq!(handshake["api_key"], "kraken-key");

        let subscriptions = codec.encode_subscription("abc123").unwrap();
        assert_eq!(subscriptions.len(), 2);
        let feeds: Vec<Value> = subscriptions.iter().map(text).collect();
        assert_eq!(feeds[0]["feed"], "open_positions");
        assert_eq!(feeds[1]["feed"], "balances");
        for feed in &feeds {
            assert_eq!(feed["event"], "subscribe");
            assert_eq!(feed["original_challenge"], "abc123");
            assert_eq!(
                feed["signed_challenge"],
                "+qup7LqovwM7clRGXoCQVcR/mCCAuqWlwQZ39OJP0WY5z4YmCcPBbakF5GMAyrtKyCoUr7U0rYFex5PL8T3wTg=="
            );
        }
    }

    #[test]
    fn test_decode_events() {
        assert_eq!(
            decode(r#"{"event":"challenge","message":"c-1"}"#),
            Some(StreamEvent::Challenge("c-1".into()))
        );
        assert_eq!(
            decode(r#"{"event":"subscribed","feed":"balances"}"#),
            Some(StreamEvent::Subscribed("balances".into()))
        );
        assert_eq!(
            decode(r#"{"event":"error","message":"Invalid API key"}"#),
            Some(StreamEvent::ServerError("Invalid API key".into()))
        );
        assert_eq!(
            decode(r#"{"event":"info","version":1}"#),
            Some(StreamEvent::Ignored)
        );
        assert_eq!(decode(r#"{"feed":"heartbeat","time":1}"#), Some(StreamEvent::Ignored));
        assert_eq!(decode(r#"{"unrelated":true}"#), None);
    }

    #[test]
    fn test_decode_feeds() {
        match decode(r#"{"feed":"open_positions","positions":[{"instrument":"PF_XBTUSD","balance":0.2}]}"#) {
            Some(StreamEvent::Positions(Some(positions))) => {
                assert_eq!(positions[0].size, Some(0.2));
            }
            other => panic!("unexpected {:?}", other),
        }
        match decode(r#"{"feed":"balances_snapshot","flex_futures":{"margin_equity":"500"}}"#) {
            Some(StreamEvent::Balances(balances)) => {
                assert_eq!(balances.margin_equity, Some(500.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(codec().decode_message(Message::Text("{not json".into())).is_err());
        assert!(codec().decode_message(Message::Binary(vec![1, 2])).unwrap().is_none());
    }
}
