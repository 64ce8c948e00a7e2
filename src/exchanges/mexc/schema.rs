//! Payload tables for the MEXC contract API. Volumes are in contracts.

use crate::core::normalize::{FieldChain, Missing, Shape, TextChain};

pub const POSITION_SHAPES: &[Shape] = &[
    Shape::Path("data"),
    Shape::Path("data.resultList"),
    Shape::Path("positions"),
    Shape::TopLevel,
];

pub const ORDER_SHAPES: &[Shape] = &[
    Shape::Path("data"),
    Shape::Path("data.resultList"),
    Shape::Path("orders"),
    Shape::TopLevel,
];

pub const ASSET_SHAPES: &[Shape] = &[Shape::Path("data"), Shape::TopLevel];

/// Margin assets counted towards the snapshot
pub const STABLECOINS: &[&str] = &["USDT", "USDC"];

pub const SYMBOL: TextChain = TextChain::new("ticker", &["symbol"]);

/// `1` long, `2` short
pub const POSITION_TYPE: FieldChain = FieldChain::new("side", &["positionType"], Missing::Null);
pub const HOLD_VOLUME: FieldChain = FieldChain::new("size", &["holdVol", "vol"], Missing::Zero);
pub const ENTRY_PRICE: FieldChain = FieldChain::new(
    "entryPrice",
    &["holdAvgPrice", "openAvgPrice"],
    Missing::Null,
);
pub const LEVERAGE: FieldChain = FieldChain::new("leverage", &["leverage"], Missing::Null);
pub const MARGIN: FieldChain = FieldChain::new("marginUsd", &["im", "oim"], Missing::Null);
pub const UNREALIZED_PNL: FieldChain = FieldChain::new(
    "unrealizedPnlUsd",
    &["unrealized", "unrealisedPnl", "pnl"],
    Missing::Zero,
);

pub const ORDER_ID: TextChain = TextChain::new("id", &["orderId", "externalOid"]);
/// `1` open long, `2` close short, `3` open short, `4` close long
pub const ORDER_SIDE: FieldChain = FieldChain::new("side", &["side"], Missing::Null);
pub const ORDER_VOLUME: FieldChain = FieldChain::new("quantity", &["vol"], Missing::Null);
pub const ORDER_PRICE: FieldChain = FieldChain::new("price", &["price"], Missing::Null);
pub const ORDER_MARGIN: FieldChain = FieldChain::new("marginUsd", &["orderMargin"], Missing::Null);

pub const CURRENCY: TextChain = TextChain::new("asset", &["currency"]);
pub const AVAILABLE: FieldChain = FieldChain::new(
    "availableMargin",
    &["availableBalance", "availableOpen"],
    Missing::Null,
);
pub const POSITION_MARGIN: FieldChain = FieldChain::new("lockedMargin", &["positionMargin"], Missing::Null);
pub const FROZEN: FieldChain = FieldChain::new("lockedMargin", &["frozenBalance"], Missing::Null);
pub const EQUITY: FieldChain = FieldChain::new("equity", &["equity", "cashBalance"], Missing::Null);

pub const CONTRACT_ROOTS: &[&str] = &["data"];
pub const CONTRACT_SIZE: FieldChain = FieldChain::new("contractSize", &["contractSize"], Missing::Null);
