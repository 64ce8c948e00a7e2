//! Payload tables for Kraken Futures REST v3 and the `ws/v1` private feeds.

use crate::core::normalize::{FieldChain, Missing, Shape, TextChain};

pub const POSITION_SHAPES: &[Shape] = &[
    Shape::Path("openPositions"),
    Shape::Path("positions"),
    Shape::Path("data"),
    Shape::NullWrapped,
    Shape::TopLevel,
];

pub const ORDER_SHAPES: &[Shape] = &[
    Shape::Path("openOrders"),
    Shape::Path("orders"),
    Shape::Path("data"),
    Shape::NullWrapped,
    Shape::TopLevel,
];

/// `accounts` is an object keyed by account name (`flex`, `cash`, `fi_xbtusd`, ..)
pub const ACCOUNT_SHAPES: &[Shape] = &[
    Shape::ObjectValues("accounts"),
    Shape::Path("accounts"),
    Shape::Path("data"),
];

pub const SYMBOL: TextChain = TextChain::new("ticker", &["symbol", "instrument"]);
pub const SIDE: TextChain = TextChain::new("side", &["side", "direction"]);

/// Unsigned; the sign comes from `side`.
pub const SIZE: FieldChain = FieldChain::new("size", &["size", "balance", "qty"], Missing::Zero);
pub const ENTRY_PRICE: FieldChain = FieldChain::new("entryPrice", &["price", "entryPrice", "avgEntryPrice"], Missing::Null);
pub const MARK_PRICE: FieldChain = FieldChain::new("markPrice", &["markPrice", "mark_price"], Missing::Null);
pub const LEVERAGE: FieldChain = FieldChain::new(
    "leverage",
    &["leverage", "effectiveLeverage", "maxFixedLeverage"],
    Missing::Null,
);
pub const MARGIN: FieldChain = FieldChain::new("marginUsd", &["initialMargin", "margin"], Missing::Null);
pub const UNREALIZED_PNL: FieldChain = FieldChain::new(
    "unrealizedPnlUsd",
    &["unrealizedPnl", "pnl", "upnl"],
    Missing::Zero,
);

pub const ORDER_ID: TextChain = TextChain::new("id", &["order_id", "orderId", "cliOrdId"]);
pub const ORDER_QUANTITY: FieldChain = FieldChain::new(
    "quantity",
    &["unfilledSize", "quantity", "size"],
    Missing::Null,
);
pub const ORDER_PRICE: FieldChain = FieldChain::new("price", &["limitPrice", "stopPrice", "price"], Missing::Null);
/// Orders report no margin unless one of these is present.
pub const ORDER_MARGIN: FieldChain = FieldChain::new("marginUsd", &["initialMargin", "margin"], Missing::Null);

/// Flex accounts use camelCase totals, single-collateral margin accounts
/// nest them under `auxiliary` / `marginRequirements`.
pub const AVAILABLE: FieldChain = FieldChain::new(
    "availableMargin",
    &["availableMargin", "auxiliary.af"],
    Missing::Null,
);
pub const LOCKED: FieldChain = FieldChain::new(
    "lockedMargin",
    &["initialMargin", "marginRequirements.im"],
    Missing::Null,
);
pub const EQUITY: FieldChain = FieldChain::new(
    "equity",
    &["portfolioValue", "auxiliary.pv", "balanceValue", "marginEquity"],
    Missing::Null,
);

pub mod stream {
    use super::*;

    pub const INSTRUMENT: TextChain = TextChain::new("instrument", &["instrument", "symbol"]);
    pub const SIZE: FieldChain = FieldChain::new("size", &["balance", "size"], Missing::Null);
    pub const ENTRY_PRICE: FieldChain = FieldChain::new("entryPrice", &["entry_price"], Missing::Null);
    pub const MARK_PRICE: FieldChain = FieldChain::new("markPrice", &["mark_price"], Missing::Null);
    pub const PNL: FieldChain = FieldChain::new("unrealizedPnl", &["pnl"], Missing::Null);
    pub const LEVERAGE: FieldChain = FieldChain::new("leverage", &["effective_leverage", "leverage"], Missing::Null);
    pub const INITIAL_MARGIN: FieldChain = FieldChain::new("initialMargin", &["initial_margin"], Missing::Null);

    pub const BALANCE_VALUE: FieldChain = FieldChain::new("balanceValue", &["balance_value"], Missing::Null);
    pub const PORTFOLIO_VALUE: FieldChain = FieldChain::new("portfolioValue", &["portfolio_value"], Missing::Null);
    pub const COLLATERAL_VALUE: FieldChain = FieldChain::new("collateralValue", &["collateral_value"], Missing::Null);
    pub const MARGIN_EQUITY: FieldChain = FieldChain::new("marginEquity", &["margin_equity"], Missing::Null);
    pub const AVAILABLE_MARGIN: FieldChain = FieldChain::new("availableMargin", &["available_margin"], Missing::Null);
    pub const INITIAL_MARGIN_TOTAL: FieldChain = FieldChain::new("initialMargin", &["initial_margin"], Missing::Null);
    pub const BALANCE_PNL: FieldChain = FieldChain::new("pnl", &["pnl"], Missing::Null);
    pub const UNREALIZED_FUNDING: FieldChain = FieldChain::new("unrealizedFunding", &["unrealized_funding"], Missing::Null);
    pub const TOTAL_UNREALIZED: FieldChain = FieldChain::new("totalUnrealized", &["total_unrealized"], Missing::Null);
}
