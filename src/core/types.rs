use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sizes below this magnitude are treated as closed positions.
pub const SIZE_EPSILON: f64 = 1e-4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TypesError {
    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),
}

/// Exchanges with a perpetuals connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exchange {
    Aster,
    Hyperliquid,
    KrakenFutures,
    Mexc,
}

impl Exchange {
    pub const ALL: [Self; 4] = [Self::Aster, Self::Hyperliquid, Self::KrakenFutures, Self::Mexc];

    /// Stable identifier used as the `platform` key and in entity ids.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aster => "aster",
            Self::Hyperliquid => "hyperliquid",
            Self::KrakenFutures => "kraken_futures",
            Self::Mexc => "mexc",
        }
    }

    /// Prefix of the environment variables holding this exchange's credentials.
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Aster => "ASTER",
            Self::Hyperliquid => "HYPERLIQUID",
            Self::KrakenFutures => "KRAKEN_FUTURES",
            Self::Mexc => "MEXC",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aster" => Ok(Self::Aster),
            "hyperliquid" | "hl" => Ok(Self::Hyperliquid),
            "kraken_futures" | "kraken" | "krakenfutures" => Ok(Self::KrakenFutures),
            "mexc" => Ok(Self::Mexc),
            other => Err(TypesError::UnknownExchange(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
    Unknown,
}

impl PositionSide {
    /// Interpret an explicit side/direction label. Labels that carry no
    /// direction (`BOTH`, empty) yield `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" | "b" | "bid" => Self::Long,
            "short" | "sell" | "a" | "ask" => Self::Short,
            _ => Self::Unknown,
        }
    }

    /// Side implied by the sign of a size.
    pub fn from_size(size: f64) -> Self {
        if size > 0.0 {
            Self::Long
        } else if size < 0.0 {
            Self::Short
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "Long"),
            Self::Short => write!(f, "Short"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// An open perpetual position, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub ticker: String,
    /// Signed size in base-asset units.
    pub size: f64,
    pub entry_price: Option<f64>,
    pub margin_usd: f64,
    pub unrealized_pnl_usd: f64,
    pub leverage: Option<f64>,
    pub side: PositionSide,
    pub platform: Exchange,
}

impl Position {
    /// `{platform}-{ticker}-{side}`, lowercase. The side keeps hedge-mode
    /// long and short legs of one symbol apart.
    pub fn make_id(platform: Exchange, ticker: &str, side: PositionSide) -> String {
        format!("{}-{}-{}", platform, ticker, side).to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub id: String,
    pub display_name: String,
    /// `None` means the exchange does not report per-order margin;
    /// `Some(0.0)` means the order reserves none.
    pub margin_usd: Option<f64>,
    pub platform: Exchange,
}

/// A USD-denominated balance line (available margin, locked margin or equity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntry {
    pub id: String,
    pub asset: String,
    pub amount_usd: f64,
    pub platform: Exchange,
}

pub type MarginEntry = AccountEntry;
pub type EquityEntry = AccountEntry;

impl AccountEntry {
    pub fn new(platform: Exchange, kind: &str, asset: &str, amount_usd: f64) -> Self {
        Self {
            id: format!("{}-{}-{}", platform, kind, asset.to_ascii_lowercase()),
            asset: asset.to_string(),
            amount_usd,
            platform,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpetualsSnapshot {
    pub positions: Vec<Position>,
    pub open_orders: Vec<OpenOrder>,
    pub available_margin: Vec<MarginEntry>,
    pub locked_margin: Vec<MarginEntry>,
    pub equity: Vec<EquityEntry>,
}

impl PerpetualsSnapshot {
    /// Concatenate another snapshot into this one. No de-duplication: the
    /// same ticker can legitimately appear on several platforms.
    pub fn extend(&mut self, other: Self) {
        self.positions.extend(other.positions);
        self.open_orders.extend(other.open_orders);
        self.available_margin.extend(other.available_margin);
        self.locked_margin.extend(other.locked_margin);
        self.equity.extend(other.equity);
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
            && self.open_orders.is_empty()
            && self.available_margin.is_empty()
            && self.locked_margin.is_empty()
            && self.equity.is_empty()
    }

    pub fn total_equity_usd(&self) -> f64 {
        self.equity.iter().map(|e| e.amount_usd).sum()
    }
}

/// Data categories fetched by a connector pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotCategory {
    Discovery,
    Positions,
    OpenOrders,
    AvailableMargin,
    LockedMargin,
    Equity,
}

impl fmt::Display for SnapshotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovery => "discovery",
            Self::Positions => "positions",
            Self::OpenOrders => "open_orders",
            Self::AvailableMargin => "available_margin",
            Self::LockedMargin => "locked_margin",
            Self::Equity => "equity",
        };
        f.write_str(name)
    }
}

/// A non-fatal failure recorded while building a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFailure {
    pub category: SnapshotCategory,
    pub reason: String,
}

/// Result of one exchange pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub exchange: Exchange,
    pub snapshot: PerpetualsSnapshot,
    pub gaps: Vec<CategoryFailure>,
}

impl SnapshotReport {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            snapshot: PerpetualsSnapshot::default(),
            gaps: Vec::new(),
        }
    }

    pub fn record_gap(&mut self, category: SnapshotCategory, reason: impl Into<String>) {
        self.gaps.push(CategoryFailure {
            category,
            reason: reason.into(),
        });
    }

    pub fn is_degraded(&self) -> bool {
        !self.gaps.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Challenged,
    Subscribed,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Position as reported by a streaming feed. Every field is optional because
/// feeds may send partial updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPosition {
    pub instrument: String,
    pub size: Option<f64>,
    pub entry_price: Option<f64>,
    pub mark_price: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub leverage: Option<f64>,
    pub initial_margin: Option<f64>,
}

impl StreamPosition {
    /// Overlay the fields present in `patch`; absent fields keep their value.
    pub fn merge(&mut self, patch: &Self) {
        overlay(&mut self.size, patch.size);
        overlay(&mut self.entry_price, patch.entry_price);
        overlay(&mut self.mark_price, patch.mark_price);
        overlay(&mut self.unrealized_pnl, patch.unrealized_pnl);
        overlay(&mut self.leverage, patch.leverage);
        overlay(&mut self.initial_margin, patch.initial_margin);
    }

    pub fn is_open(&self) -> bool {
        self.size.map_or(true, |size| size.abs() >= SIZE_EPSILON)
    }

    pub fn to_position(&self, platform: Exchange) -> Option<Position> {
        let size = self.size?;
        if size.abs() < SIZE_EPSILON {
            return None;
        }
        let margin_usd = self.initial_margin.unwrap_or_else(|| {
            match (self.mark_price.or(self.entry_price), self.leverage) {
                (Some(price), Some(leverage)) if leverage > 0.0 => (size * price).abs() / leverage,
                _ => 0.0,
            }
        });
        let side = PositionSide::from_size(size);
        Some(Position {
            id: Position::make_id(platform, &self.instrument, side),
            ticker: self.instrument.clone(),
            size,
            entry_price: self.entry_price,
            margin_usd,
            unrealized_pnl_usd: self.unrealized_pnl.unwrap_or(0.0),
            leverage: self.leverage,
            side,
            platform,
        })
    }
}

/// Account balances as reported by a streaming feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBalances {
    pub balance_value: Option<f64>,
    pub portfolio_value: Option<f64>,
    pub collateral_value: Option<f64>,
    pub margin_equity: Option<f64>,
    pub available_margin: Option<f64>,
    pub initial_margin: Option<f64>,
    pub pnl: Option<f64>,
    pub unrealized_funding: Option<f64>,
    pub total_unrealized: Option<f64>,
    /// Derived from the other fields on every merge.
    pub total_balance: Option<f64>,
}

impl StreamBalances {
    /// Overlay the fields present in `patch`, then re-derive the total.
    pub fn merge(&mut self, patch: &Self) {
        overlay(&mut self.balance_value, patch.balance_value);
        overlay(&mut self.portfolio_value, patch.portfolio_value);
        overlay(&mut self.collateral_value, patch.collateral_value);
        overlay(&mut self.margin_equity, patch.margin_equity);
        overlay(&mut self.available_margin, patch.available_margin);
        overlay(&mut self.initial_margin, patch.initial_margin);
        overlay(&mut self.pnl, patch.pnl);
        overlay(&mut self.unrealized_funding, patch.unrealized_funding);
        overlay(&mut self.total_unrealized, patch.total_unrealized);
        self.total_balance = self.derive_total().or(self.total_balance);
    }

    /// Total account balance: the first synonym present wins; the sum of
    /// available and initial margin is only an estimate.
    pub fn derive_total(&self) -> Option<f64> {
        self.portfolio_value
            .or(self.balance_value)
            .or(self.margin_equity)
            .or(self.collateral_value)
            .or_else(|| match (self.available_margin, self.initial_margin) {
                (Some(available), Some(initial)) => Some(available + initial),
                (Some(available), None) => Some(available),
                _ => None,
            })
    }
}

fn overlay(slot: &mut Option<f64>, incoming: Option<f64>) {
    if let Some(value) = incoming.filter(|v| v.is_finite()) {
        *slot = Some(value);
    }
}

/// Live state of one streaming session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub last_update_ts: Option<i64>,
    pub positions: Vec<StreamPosition>,
    pub balances: StreamBalances,
    pub error: Option<String>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            last_update_ts: None,
            positions: Vec::new(),
            balances: StreamBalances::default(),
            error: None,
        }
    }
}

impl ConnectionState {
    pub fn open_positions(&self, platform: Exchange) -> Vec<Position> {
        self.positions
            .iter()
            .filter_map(|p| p.to_position(platform))
            .collect()
    }
}
