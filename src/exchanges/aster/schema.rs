//! Payload tables for the Aster futures API (Binance-compatible).
//!
//! Shapes are tried in order; field chains take the first finite candidate.

use crate::core::normalize::{FieldChain, Missing, Shape, TextChain};

pub const POSITION_SHAPES: &[Shape] = &[
    Shape::TopLevel,
    Shape::Path("data"),
    Shape::Path("positions"),
    Shape::NullWrapped,
];

pub const ORDER_SHAPES: &[Shape] = &[
    Shape::TopLevel,
    Shape::Path("data"),
    Shape::Path("orders"),
    Shape::NullWrapped,
];

/// Paths at which the account object may sit, root first.
pub const ACCOUNT_ROOTS: &[&str] = &["data"];

pub const SYMBOL: TextChain = TextChain::new("ticker", &["symbol", "pair"]);
/// `BOTH` in one-way mode, which carries no direction.
pub const POSITION_SIDE: TextChain = TextChain::new("side", &["positionSide", "side"]);

pub const SIZE: FieldChain = FieldChain::new(
    "size",
    &["positionAmt", "positionAmount", "size"],
    Missing::Zero,
);
pub const ENTRY_PRICE: FieldChain = FieldChain::new("entryPrice", &["entryPrice", "avgPrice"], Missing::Null);
pub const MARK_PRICE: FieldChain = FieldChain::new("markPrice", &["markPrice"], Missing::Null);
pub const NOTIONAL: FieldChain = FieldChain::new("notional", &["notional", "notionalValue"], Missing::Null);
pub const LEVERAGE: FieldChain = FieldChain::new("leverage", &["leverage"], Missing::Null);
/// Cross positions report `0` here, so a non-positive value falls through
/// to `|notional| / leverage`.
pub const MARGIN: FieldChain = FieldChain::new(
    "marginUsd",
    &["isolatedMargin", "initialMargin", "positionInitialMargin"],
    Missing::Null,
);
pub const UNREALIZED_PNL: FieldChain = FieldChain::new(
    "unrealizedPnlUsd",
    &["unRealizedProfit", "unrealizedProfit", "unrealizedPnl"],
    Missing::Zero,
);

pub const ORDER_ID: TextChain = TextChain::new("id", &["orderId", "clientOrderId"]);
pub const ORDER_SIDE: TextChain = TextChain::new("side", &["side"]);
pub const ORDER_QUANTITY: FieldChain = FieldChain::new("quantity", &["origQty", "quantity"], Missing::Null);
pub const ORDER_PRICE: FieldChain = FieldChain::new("price", &["price", "stopPrice"], Missing::Null);

pub const AVAILABLE: FieldChain = FieldChain::new(
    "availableMargin",
    &["availableBalance", "maxWithdrawAmount"],
    Missing::Null,
);
pub const LOCKED: FieldChain = FieldChain::new(
    "lockedMargin",
    &["totalInitialMargin", "totalPositionInitialMargin"],
    Missing::Null,
);
pub const EQUITY: FieldChain = FieldChain::new(
    "equity",
    &["totalMarginBalance", "totalCrossWalletBalance", "totalWalletBalance"],
    Missing::Null,
);
