//! Kraken Futures live stream against an in-process WebSocket server.

use futures_util::{SinkExt, StreamExt};
use perpscope::core::stream::{LiveStreamClient, ReconnectPolicy, StreamConfig};
use perpscope::core::types::{ConnectionState, ConnectionStatus, Exchange};
use perpscope::exchanges::kraken::{self, KrakenStreamCodec};
use perpscope::ExchangeCredentials;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

const SECRET: &str = "a3Jha2VuLXRlc3Qtc2VjcmV0LWJ5dGVz";
const SIGNED_ABC123: &str =
    "+qup7LqovwM7clRGXoCQVcR/mCCAuqWlwQZ39OJP0WY5z4YmCcPBbakF5GMAyrtKyCoUr7U0rYFex5PL8T3wTg==";

type ServerSocket = WebSocketStream<TcpStream>;

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_json(ws: &mut ServerSocket) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("client went away: {:?}", other),
        }
    }
}

async fn send_json(ws: &mut ServerSocket, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Serve the challenge and acknowledge both subscriptions.
async fn handshake(ws: &mut ServerSocket) {
    let request = next_json(ws).await;
    assert_eq!(request["event"], "challenge");
    assert_eq!(request["api_key"], "kraken-key");
    send_json(ws, json!({"event": "challenge", "message": "abc123"})).await;

    for _ in 0..2 {
        let subscription = next_json(ws).await;
        assert_eq!(subscription["event"], "subscribe");
        assert_eq!(subscription["original_challenge"], "abc123");
        assert_eq!(subscription["signed_challenge"], SIGNED_ABC123);
        send_json(ws, json!({"event": "subscribed", "feed": subscription["feed"]})).await;
    }
}

async fn drain(mut ws: ServerSocket) {
    while let Some(Ok(_)) = ws.next().await {}
}

fn client(addr: SocketAddr, policy: ReconnectPolicy) -> LiveStreamClient<KrakenStreamCodec> {
    let credentials =
        ExchangeCredentials::new(Exchange::KrakenFutures, "kraken-key".into(), SECRET.into());
    let config = StreamConfig::new(format!("ws://{}", addr))
        .with_handshake_timeout(Duration::from_secs(2))
        .with_reconnect_policy(policy);
    kraken::build_stream_client(&credentials, config).unwrap()
}

async fn wait_until(
    rx: &mut watch::Receiver<ConnectionState>,
    condition: impl FnMut(&ConnectionState) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(condition))
        .await
        .expect("timed out waiting for stream state")
        .map(|_| ())
        .expect("state channel closed");
}

#[tokio::test]
async fn test_handshake_feeds_and_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        handshake(&mut ws).await;
        send_json(
            &mut ws,
            json!({"feed": "open_positions", "positions": [{
                "instrument": "PF_XBTUSD",
                "balance": 0.5,
                "entry_price": 30000,
                "mark_price": 31000,
                "pnl": 500,
                "effective_leverage": 5
            }]}),
        )
        .await;
        send_json(
            &mut ws,
            json!({"feed": "balances", "flex_futures": {"portfolio_value": 10000, "available_margin": 8000}}),
        )
        .await;
        drain(ws).await;
    });

    let mut client = client(addr, ReconnectPolicy::default());
    let mut rx = client.subscribe();
    client.connect();
    assert_eq!(client.state().status, ConnectionStatus::Connecting);

    wait_until(&mut rx, |state| {
        state.status == ConnectionStatus::Subscribed
            && !state.positions.is_empty()
            && state.balances.total_balance.is_some()
    })
    .await;

    let state = client.state();
    assert!(state.last_update_ts.is_some());
    assert_eq!(state.balances.total_balance, Some(10000.0));
    let positions = state.open_positions(Exchange::KrakenFutures);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].ticker, "PF_XBTUSD");
    assert_eq!(positions[0].size, 0.5);
    assert!((positions[0].margin_usd - 3100.0).abs() < 1e-9);

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::default());
    assert!(!client.is_running());

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not see the close")
        .unwrap();
}

#[tokio::test]
async fn test_server_error_sets_error_state() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _ = next_json(&mut ws).await;
        send_json(&mut ws, json!({"event": "error", "message": "Invalid API key"})).await;
        drain(ws).await;
    });

    let policy = ReconnectPolicy::default().with_initial_delay(Duration::from_secs(30));
    let mut client = client(addr, policy);
    let mut rx = client.subscribe();
    client.connect();

    wait_until(&mut rx, |state| state.status == ConnectionStatus::Error).await;
    assert_eq!(client.state().error.as_deref(), Some("Invalid API key"));

    // Disconnect cancels the pending reconnect.
    client.disconnect().await;
    assert_eq!(client.state().status, ConnectionStatus::Disconnected);
    assert!(!client.is_running());
}

#[tokio::test]
async fn test_reconnects_after_socket_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut first = accept(&listener).await;
        handshake(&mut first).await;
        drop(first);

        let mut second = accept(&listener).await;
        handshake(&mut second).await;
        send_json(
            &mut second,
            json!({"feed": "open_positions", "positions": [{"instrument": "PF_ETHUSD", "balance": -2}]}),
        )
        .await;
        drain(second).await;
    });

    let policy = ReconnectPolicy::default().with_initial_delay(Duration::from_millis(20));
    let mut client = client(addr, policy);
    let mut rx = client.subscribe();
    client.connect();

    wait_until(&mut rx, |state| {
        state.status == ConnectionStatus::Subscribed
            && state.positions.iter().any(|p| p.instrument == "PF_ETHUSD")
    })
    .await;
    assert_eq!(client.state().positions[0].size, Some(-2.0));

    client.disconnect().await;
}

#[tokio::test]
async fn test_exhausted_reconnects_end_in_error_until_connect() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let policy = ReconnectPolicy::default()
        .with_initial_delay(Duration::from_millis(10))
        .with_max_attempts(2);
    let mut client = client(addr, policy);
    let mut rx = client.subscribe();
    let exhausted = |state: &ConnectionState| {
        state.status == ConnectionStatus::Error
            && state.error.as_deref() == Some("reconnect attempts exhausted")
    };

    client.connect();
    wait_until(&mut rx, exhausted).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session task kept running after exhausting reconnects");
    assert_eq!(client.state().status, ConnectionStatus::Error);

    client.connect();
    assert_eq!(client.state().status, ConnectionStatus::Connecting);
    assert!(client.is_running());
    wait_until(&mut rx, exhausted).await;

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::default());
}
