use crate::core::errors::ExchangeError;
use crate::core::kernel::{TungsteniteWs, WsCodec, WsConfig, WsSession};
use crate::core::stream::machine::{Action, StreamEvent, StreamMachine};
use crate::core::stream::reconnect::ReconnectPolicy;
use crate::core::types::{ConnectionState, ConnectionStatus, Exchange};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, Interval};
use tracing::{debug, info, info_span, warn, Instrument};

/// Live stream session settings
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Time allowed between socket open and full subscription
    pub handshake_timeout: Duration,
    /// Keep-alive period, kept below the exchange's idle timeout
    pub keepalive_interval: Duration,
    /// How long `disconnect()` waits for the session task before aborting it
    pub shutdown_grace: Duration,
    pub reconnect: ReconnectPolicy,
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(50),
            shutdown_grace: Duration::from_secs(5),
            reconnect: ReconnectPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    #[must_use]
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

/// Persistent authenticated WebSocket session.
///
/// The session runs in one spawned task that owns the socket and the
/// [`StreamMachine`]; every state change is published as an immutable
/// snapshot on a watch channel.
pub struct LiveStreamClient<C: WsCodec<Message = StreamEvent>> {
    exchange: Exchange,
    config: StreamConfig,
    codec: Arc<C>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl<C: WsCodec<Message = StreamEvent>> LiveStreamClient<C> {
    pub fn new(exchange: Exchange, codec: C, config: StreamConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::default());
        Self {
            exchange,
            config,
            codec: Arc::new(codec),
            state_tx: Arc::new(state_tx),
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Current state snapshot
    pub fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Invoke `callback` with every published state until the client is dropped.
    pub fn on_state<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(&ConnectionState) + Send + 'static,
    {
        let mut rx = self.state_tx.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                callback(&snapshot);
            }
        })
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start the session. Returns immediately with the status at
    /// `Connecting`; the handshake continues in the background. Calling it
    /// while a session is running is a no-op.
    pub fn connect(&mut self) {
        if self.is_running() {
            debug!(exchange = %self.exchange, "Stream already running");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut machine = StreamMachine::new(self.codec.required_feeds());
        let (next, _) = machine.step(StreamEvent::Connect, now_ms());
        machine = next;
        self.state_tx.send_replace(machine.state().clone());

        let session = Session {
            exchange: self.exchange,
            config: self.config.clone(),
            codec: Arc::clone(&self.codec),
            state_tx: Arc::clone(&self.state_tx),
            shutdown: shutdown_rx,
            machine,
        };
        let span = info_span!("live_stream", exchange = %self.exchange, url = %self.config.url);
        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(tokio::spawn(session.run().instrument(span)));
    }

    /// Stop the session: shutdown is signalled before the socket closes, so
    /// no reconnect can be scheduled afterwards.
    pub async fn disconnect(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(self.config.shutdown_grace, &mut task)
                .await
                .is_err()
            {
                warn!(exchange = %self.exchange, "Stream task did not stop in time, aborting");
                task.abort();
            }
        }

        self.state_tx.send_if_modified(|state| {
            if *state == ConnectionState::default() {
                false
            } else {
                *state = ConnectionState::default();
                true
            }
        });
        info!(exchange = %self.exchange, "Stream disconnected");
    }
}

impl<C: WsCodec<Message = StreamEvent>> Drop for LiveStreamClient<C> {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
    }
}

enum SessionEnd {
    Shutdown,
    Reconnect { subscribed: bool },
}

struct Session<C: WsCodec<Message = StreamEvent>> {
    exchange: Exchange,
    config: StreamConfig,
    codec: Arc<C>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Receiver<bool>,
    machine: StreamMachine,
}

impl<C: WsCodec<Message = StreamEvent>> Session<C> {
    async fn run(mut self) {
        let mut attempt = 0u32;

        loop {
            match self.run_connection().await {
                SessionEnd::Shutdown => break,
                SessionEnd::Reconnect { subscribed } => {
                    if subscribed {
                        attempt = 0;
                    }
                    attempt += 1;

                    let Some(delay) = self.config.reconnect.delay_for(attempt) else {
                        warn!("Reconnect attempts exhausted");
                        self.advance(StreamEvent::ReconnectsExhausted);
                        break;
                    };

                    info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
                    tokio::select! {
                        () = sleep(delay) => {}
                        _ = self.shutdown.changed() => {
                            self.advance(StreamEvent::Disconnect);
                            break;
                        }
                    }
                    self.advance(StreamEvent::Connect);
                }
            }
        }
    }

    /// Apply an event and perform the actions that need no socket.
    fn advance(&mut self, event: StreamEvent) -> Vec<Action> {
        let (next, actions) = self.machine.step(event, now_ms());
        self.machine = next;
        if actions.contains(&Action::Publish) {
            self.state_tx.send_replace(self.machine.state().clone());
        }
        actions
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn run_connection(&mut self) -> SessionEnd {
        if self.shutdown_requested() {
            self.advance(StreamEvent::Disconnect);
            return SessionEnd::Shutdown;
        }

        let mut ws = TungsteniteWs::new(self.config.url.clone(), self.exchange.to_string())
            .with_config(WsConfig {
                connect_timeout_ms: self.config.connect_timeout.as_millis() as u64,
            });

        let connected = tokio::select! {
            result = ws.connect() => result,
            _ = self.shutdown.changed() => {
                self.advance(StreamEvent::Disconnect);
                return SessionEnd::Shutdown;
            }
        };
        if let Err(e) = connected {
            warn!("Stream connection failed: {}", e);
            self.advance(StreamEvent::SocketClosed(Some(e.to_string())));
            return SessionEnd::Reconnect { subscribed: false };
        }

        let mut subscribed = false;
        let mut keepalive: Option<Interval> = None;
        let handshake_deadline = sleep(self.config.handshake_timeout);
        tokio::pin!(handshake_deadline);

        let mut actions = self.advance(StreamEvent::SocketOpened);

        loop {
            let pending = std::mem::take(&mut actions);
            for (index, action) in pending.iter().cloned().enumerate() {
                let outcome = match action {
                    Action::RequestChallenge => self.send(&mut ws, self.codec.encode_handshake()).await,
                    Action::Subscribe { challenge } => {
                        self.send_all(&mut ws, self.codec.encode_subscription(&challenge))
                            .await
                    }
                    Action::StartKeepAlive => {
                        subscribed = true;
                        let period = self.config.keepalive_interval;
                        keepalive = Some(interval_at(Instant::now() + period, period));
                        info!("Stream subscribed");
                        Ok(())
                    }
                    Action::Reconnect => {
                        let _ = ws.close().await;
                        return SessionEnd::Reconnect { subscribed };
                    }
                    Action::Publish => Ok(()),
                };

                if let Err(e) = outcome {
                    let skipped = skipped_after(&pending, index);
                    if !skipped.is_empty() {
                        debug!(?skipped, "Dropping remaining actions after failure: {}", e);
                    }
                    let event = if e.is_retryable() {
                        StreamEvent::SocketClosed(Some(e.to_string()))
                    } else {
                        StreamEvent::ServerError(e.to_string())
                    };
                    actions = self.advance(event);
                    break;
                }
            }
            if !actions.is_empty() {
                continue;
            }

            let handshake_pending = self.machine.status() != ConnectionStatus::Subscribed;
            let event = tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = ws.close().await;
                    self.advance(StreamEvent::Disconnect);
                    return SessionEnd::Shutdown;
                }
                () = &mut handshake_deadline, if handshake_pending => StreamEvent::HandshakeTimeout,
                () = next_tick(&mut keepalive) => {
                    if let Err(e) = ws.send_raw(self.codec.encode_keepalive()).await {
                        StreamEvent::SocketClosed(Some(e.to_string()))
                    } else {
                        StreamEvent::Ignored
                    }
                }
                frame = ws.next_raw() => match frame {
                    Some(Ok(message)) => match self.codec.decode_message(message) {
                        Ok(Some(event)) => event,
                        Ok(None) => StreamEvent::Ignored,
                        Err(e) => {
                            warn!("Failed to decode stream frame: {}", e);
                            StreamEvent::Ignored
                        }
                    },
                    Some(Err(e)) => StreamEvent::SocketClosed(Some(e.to_string())),
                    None => StreamEvent::SocketClosed(None),
                },
            };

            debug!(?event, "Stream event");
            actions = self.advance(event);
        }
    }

    async fn send(
        &self,
        ws: &mut TungsteniteWs,
        message: Result<tokio_tungstenite::tungstenite::Message, ExchangeError>,
    ) -> Result<(), ExchangeError> {
        ws.send_raw(message?).await
    }

    async fn send_all(
        &self,
        ws: &mut TungsteniteWs,
        messages: Result<Vec<tokio_tungstenite::tungstenite::Message>, ExchangeError>,
    ) -> Result<(), ExchangeError> {
        for message in messages? {
            ws.send_raw(message).await?;
        }
        Ok(())
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

/// Actions after the one at `failed` that will not run
fn skipped_after(actions: &[Action], failed: usize) -> &[Action] {
    actions.get(failed + 1..).unwrap_or_default()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_after_failure() {
        let actions = vec![
            Action::Subscribe {
                challenge: "abc123".into(),
            },
            Action::Publish,
        ];
        assert_eq!(skipped_after(&actions, 0), &[Action::Publish]);
        assert!(skipped_after(&actions, 1).is_empty());
        assert!(skipped_after(&[], 0).is_empty());
    }
}
