use crate::core::errors::ExchangeError;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for exchange-specific WebSocket protocols
///
/// A codec turns protocol steps (challenge request, authenticated
/// subscriptions, keep-alive) into wire messages and decodes inbound frames
/// into typed events. It holds the key material needed to answer a
/// challenge; the transport never sees it.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this exchange
    type Message: Send + Sync;

    /// Message opening the authentication handshake
    fn encode_handshake(&self) -> Result<Message, ExchangeError>;

    /// One subscription message per required feed, authenticated with the
    /// server-issued `challenge`
    fn encode_subscription(&self, challenge: &str) -> Result<Vec<Message>, ExchangeError>;

    /// Application-level keep-alive frame
    fn encode_keepalive(&self) -> Message {
        Message::Ping(Vec::new())
    }

    /// Feeds that must be acknowledged before the session counts as subscribed
    fn required_feeds(&self) -> &[&'static str];

    /// Decode a raw WebSocket message into a typed message
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Message was ignored/filtered by codec
    /// - `Err(error)` - Failed to decode message
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ExchangeError>;
}
