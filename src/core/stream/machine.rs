use crate::core::types::{ConnectionState, ConnectionStatus, StreamBalances, StreamPosition};
use std::collections::BTreeSet;

/// Inputs to the session state machine: socket lifecycle, decoded frames
/// and caller commands.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Caller asked for a connection (or a reconnect attempt starts)
    Connect,
    SocketOpened,
    /// Server-issued challenge string
    Challenge(String),
    /// Subscription acknowledged for a feed
    Subscribed(String),
    /// Positions feed update; `None` when the message carried no list
    Positions(Option<Vec<StreamPosition>>),
    Balances(StreamBalances),
    ServerError(String),
    SocketClosed(Option<String>),
    HandshakeTimeout,
    ReconnectsExhausted,
    /// Caller asked to stop
    Disconnect,
    /// Heartbeats, info banners and other frames with no effect
    Ignored,
}

/// I/O the driver must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RequestChallenge,
    Subscribe { challenge: String },
    StartKeepAlive,
    /// Drop the socket and go through the reconnect schedule
    Reconnect,
    /// Publish the new state to subscribers
    Publish,
}

/// Handshake and merge logic of one streaming session, free of I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMachine {
    state: ConnectionState,
    required_feeds: BTreeSet<String>,
    acknowledged: BTreeSet<String>,
    closing: bool,
}

impl StreamMachine {
    pub fn new(required_feeds: &[&str]) -> Self {
        Self {
            state: ConnectionState::default(),
            required_feeds: required_feeds.iter().map(ToString::to_string).collect(),
            acknowledged: BTreeSet::new(),
            closing: false,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Apply one event. Returns the next machine and the actions to perform.
    #[must_use]
    pub fn step(&self, event: StreamEvent, now_ms: i64) -> (Self, Vec<Action>) {
        let mut next = self.clone();
        let actions = next.apply(event, now_ms);
        (next, actions)
    }

    fn apply(&mut self, event: StreamEvent, now_ms: i64) -> Vec<Action> {
        if self.closing && !matches!(event, StreamEvent::Connect) {
            return Vec::new();
        }

        match event {
            StreamEvent::Connect => {
                self.closing = false;
                self.acknowledged.clear();
                self.state.status = ConnectionStatus::Connecting;
                self.state.error = None;
                vec![Action::Publish]
            }
            StreamEvent::SocketOpened => vec![Action::RequestChallenge],
            StreamEvent::Challenge(challenge) => {
                if self.state.status != ConnectionStatus::Connecting {
                    return Vec::new();
                }
                self.state.status = ConnectionStatus::Challenged;
                vec![Action::Subscribe { challenge }, Action::Publish]
            }
            StreamEvent::Subscribed(feed) => {
                self.acknowledged.insert(feed);
                let complete = self.required_feeds.is_subset(&self.acknowledged);
                if self.state.status == ConnectionStatus::Challenged && complete {
                    self.state.status = ConnectionStatus::Subscribed;
                    self.state.error = None;
                    vec![Action::StartKeepAlive, Action::Publish]
                } else {
                    Vec::new()
                }
            }
            StreamEvent::Positions(update) => {
                if let Some(incoming) = update {
                    self.state.positions = merge_positions(&self.state.positions, incoming);
                }
                self.state.last_update_ts = Some(now_ms);
                vec![Action::Publish]
            }
            StreamEvent::Balances(patch) => {
                self.state.balances.merge(&patch);
                self.state.last_update_ts = Some(now_ms);
                vec![Action::Publish]
            }
            StreamEvent::ServerError(message) => {
                self.fail(message);
                vec![Action::Publish, Action::Reconnect]
            }
            StreamEvent::HandshakeTimeout => {
                if self.state.status == ConnectionStatus::Subscribed {
                    return Vec::new();
                }
                self.fail("handshake timed out".to_string());
                vec![Action::Publish, Action::Reconnect]
            }
            StreamEvent::SocketClosed(reason) => {
                self.acknowledged.clear();
                self.state.status = ConnectionStatus::Disconnected;
                if reason.is_some() {
                    self.state.error = reason;
                }
                vec![Action::Publish, Action::Reconnect]
            }
            StreamEvent::ReconnectsExhausted => {
                self.fail("reconnect attempts exhausted".to_string());
                vec![Action::Publish]
            }
            StreamEvent::Disconnect => {
                self.closing = true;
                self.acknowledged.clear();
                self.state = ConnectionState::default();
                vec![Action::Publish]
            }
            StreamEvent::Ignored => Vec::new(),
        }
    }

    fn fail(&mut self, message: String) {
        self.acknowledged.clear();
        self.state.status = ConnectionStatus::Error;
        self.state.error = Some(message);
    }
}

/// The incoming list decides which instruments are open; each one's fields
/// overlay its previous values. Closed and dust entries drop out.
fn merge_positions(previous: &[StreamPosition], incoming: Vec<StreamPosition>) -> Vec<StreamPosition> {
    incoming
        .into_iter()
        .map(|update| {
            match previous.iter().find(|p| p.instrument == update.instrument) {
                Some(existing) => {
                    let mut merged = existing.clone();
                    merged.merge(&update);
                    merged
                }
                None => update,
            }
        })
        .filter(StreamPosition::is_open)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEEDS: &[&str] = &["open_positions", "balances"];

    fn run(machine: StreamMachine, events: Vec<StreamEvent>) -> (StreamMachine, Vec<Action>) {
        events.into_iter().fold((machine, Vec::new()), |(m, mut all), event| {
            let (next, actions) = m.step(event, 1_000);
            all.extend(actions);
            (next, all)
        })
    }

    fn subscribed() -> StreamMachine {
        run(
            StreamMachine::new(FEEDS),
            vec![
                StreamEvent::Connect,
                StreamEvent::SocketOpened,
                StreamEvent::Challenge("abc123".into()),
                StreamEvent::Subscribed("open_positions".into()),
                StreamEvent::Subscribed("balances".into()),
            ],
        )
        .0
    }

    fn position(instrument: &str, size: Option<f64>, pnl: Option<f64>) -> StreamPosition {
        StreamPosition {
            instrument: instrument.into(),
            size,
            unrealized_pnl: pnl,
            ..StreamPosition::default()
        }
    }

    #[test]
    fn test_handshake_transitions() {
        let machine = StreamMachine::new(FEEDS);
        let (machine, actions) = machine.step(StreamEvent::Connect, 0);
        assert_eq!(machine.status(), ConnectionStatus::Connecting);
        assert_eq!(actions, vec![Action::Publish]);

        let (machine, actions) = machine.step(StreamEvent::SocketOpened, 0);
        assert_eq!(actions, vec![Action::RequestChallenge]);

        let (machine, actions) = machine.step(StreamEvent::Challenge("abc123".into()), 0);
        assert_eq!(machine.status(), ConnectionStatus::Challenged);
        assert_eq!(
            actions,
            vec![
                Action::Subscribe {
                    challenge: "abc123".into()
                },
                Action::Publish
            ]
        );

        let (machine, actions) = machine.step(StreamEvent::Subscribed("open_positions".into()), 0);
        assert_eq!(machine.status(), ConnectionStatus::Challenged);
        assert!(actions.is_empty());

        let (machine, actions) = machine.step(StreamEvent::Subscribed("balances".into()), 0);
        assert_eq!(machine.status(), ConnectionStatus::Subscribed);
        assert_eq!(actions, vec![Action::StartKeepAlive, Action::Publish]);
    }

    #[test]
    fn test_empty_update_preserves_state() {
        let (machine, _) = run(
            subscribed(),
            vec![
                StreamEvent::Positions(Some(vec![position("PF_XBTUSD", Some(0.5), Some(12.0))])),
                StreamEvent::Balances(StreamBalances {
                    portfolio_value: Some(1_000.0),
                    ..StreamBalances::default()
                }),
            ],
        );
        let before = machine.state().clone();

        let (after, _) = run(
            machine,
            vec![
                StreamEvent::Positions(None),
                StreamEvent::Balances(StreamBalances::default()),
            ],
        );
        assert_eq!(after.state().positions, before.positions);
        assert_eq!(after.state().balances, before.balances);
        assert_eq!(after.state().status, before.status);
    }

    #[test]
    fn test_positions_merge_field_by_field_and_drop_closed() {
        let (machine, _) = run(
            subscribed(),
            vec![StreamEvent::Positions(Some(vec![
                position("PF_XBTUSD", Some(0.5), Some(12.0)),
                position("PF_ETHUSD", Some(-2.0), Some(-3.0)),
            ]))],
        );
        let (machine, _) = run(
            machine,
            vec![StreamEvent::Positions(Some(vec![
                position("PF_XBTUSD", None, Some(15.0)),
                position("PF_SOLUSD", Some(0.00001), None),
            ]))],
        );

        let positions = &machine.state().positions;
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].instrument, "PF_XBTUSD");
        assert_eq!(positions[0].size, Some(0.5));
        assert_eq!(positions[0].unrealized_pnl, Some(15.0));
    }

    #[test]
    fn test_unintentional_close_schedules_reconnect() {
        let (machine, actions) = subscribed().step(StreamEvent::SocketClosed(None), 0);
        assert_eq!(machine.status(), ConnectionStatus::Disconnected);
        assert!(actions.contains(&Action::Reconnect));
    }

    #[test]
    fn test_disconnect_suppresses_reconnect() {
        let (machine, _) = subscribed().step(StreamEvent::Disconnect, 0);
        assert_eq!(*machine.state(), ConnectionState::default());

        let (machine, actions) = machine.step(StreamEvent::SocketClosed(None), 0);
        assert!(actions.is_empty());
        assert_eq!(machine.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_errors_and_timeouts() {
        let (machine, actions) = StreamMachine::new(FEEDS).step(StreamEvent::Connect, 0);
        assert_eq!(actions, vec![Action::Publish]);
        let (machine, actions) = machine.step(StreamEvent::HandshakeTimeout, 0);
        assert_eq!(machine.status(), ConnectionStatus::Error);
        assert_eq!(actions, vec![Action::Publish, Action::Reconnect]);

        let (machine, _) = subscribed().step(StreamEvent::ServerError("bad signature".into()), 0);
        assert_eq!(machine.status(), ConnectionStatus::Error);
        assert_eq!(machine.state().error.as_deref(), Some("bad signature"));

        let (machine, actions) = subscribed().step(StreamEvent::HandshakeTimeout, 0);
        assert_eq!(machine.status(), ConnectionStatus::Subscribed);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_exhausted_reconnects_stay_in_error_until_connect() {
        let (machine, _) = subscribed().step(StreamEvent::SocketClosed(Some("reset".into())), 0);
        assert_eq!(machine.status(), ConnectionStatus::Disconnected);

        let (machine, actions) = machine.step(StreamEvent::ReconnectsExhausted, 0);
        assert_eq!(machine.status(), ConnectionStatus::Error);
        assert_eq!(
            machine.state().error.as_deref(),
            Some("reconnect attempts exhausted")
        );
        assert_eq!(actions, vec![Action::Publish]);

        let (machine, actions) = machine.step(StreamEvent::Connect, 0);
        assert_eq!(machine.status(), ConnectionStatus::Connecting);
        assert_eq!(machine.state().error, None);
        assert_eq!(actions, vec![Action::Publish]);
    }

    #[test]
    fn test_updates_stamp_last_update() {
        let (machine, _) = subscribed().step(StreamEvent::Balances(StreamBalances::default()), 42);
        assert_eq!(machine.state().last_update_ts, Some(42));
    }
}
