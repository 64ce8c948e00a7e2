//! Payload tables for the Hyperliquid `/info` endpoint.
//!
//! Position entries come either wrapped (`{"position": {..}, "type": ..}`)
//! or flat, so every chain lists the wrapped path first.

use crate::core::normalize::{FieldChain, Missing, Shape, TextChain};

/// `perpDexs` answers `[null, {"name": ..}, ..]`; the null is the default dex.
pub const DEX_SHAPES: &[Shape] = &[Shape::NullWrapped, Shape::TopLevel, Shape::Path("data")];
pub const DEX_NAME: TextChain = TextChain::new("name", &["name"]);

pub const POSITION_SHAPES: &[Shape] = &[
    Shape::Path("assetPositions"),
    Shape::Path("data.assetPositions"),
    Shape::Path("positions"),
    Shape::NullWrapped,
    Shape::TopLevel,
];

pub const ORDER_SHAPES: &[Shape] = &[
    Shape::TopLevel,
    Shape::Path("data"),
    Shape::Path("orders"),
    Shape::NullWrapped,
];

/// Paths at which the account summary may sit, root first.
pub const ACCOUNT_ROOTS: &[&str] = &["data"];

pub const COIN: TextChain = TextChain::new("ticker", &["position.coin", "coin"]);

pub const SIZE: FieldChain = FieldChain::new("size", &["position.szi", "szi"], Missing::Zero);
pub const ENTRY_PRICE: FieldChain =
    FieldChain::new("entryPrice", &["position.entryPx", "entryPx"], Missing::Null);
pub const POSITION_VALUE: FieldChain =
    FieldChain::new("positionValue", &["position.positionValue", "positionValue"], Missing::Null);
pub const MARGIN: FieldChain =
    FieldChain::new("marginUsd", &["position.marginUsed", "marginUsed"], Missing::Null);
pub const UNREALIZED_PNL: FieldChain = FieldChain::new(
    "unrealizedPnlUsd",
    &["position.unrealizedPnl", "unrealizedPnl"],
    Missing::Zero,
);
pub const LEVERAGE: FieldChain = FieldChain::new(
    "leverage",
    &["position.leverage.value", "leverage.value", "leverage"],
    Missing::Null,
);

pub const ORDER_ID: TextChain = TextChain::new("id", &["oid", "cloid"]);
pub const ORDER_SIDE: TextChain = TextChain::new("side", &["side"]);
pub const ORDER_SIZE: FieldChain = FieldChain::new("quantity", &["sz", "origSz"], Missing::Null);
pub const ORDER_PRICE: FieldChain =
    FieldChain::new("price", &["limitPx", "triggerPx"], Missing::Null);

pub const AVAILABLE: FieldChain = FieldChain::new("availableMargin", &["withdrawable"], Missing::Null);
pub const LOCKED: FieldChain = FieldChain::new(
    "lockedMargin",
    &["marginSummary.totalMarginUsed", "crossMarginSummary.totalMarginUsed"],
    Missing::Null,
);
pub const EQUITY: FieldChain = FieldChain::new(
    "equity",
    &["marginSummary.accountValue", "crossMarginSummary.accountValue"],
    Missing::Null,
);
