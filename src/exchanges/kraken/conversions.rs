use crate::core::normalize::{
    discover, is_dust, lookup, margin_from_notional, order_display_name, signed_size, FieldChain,
};
use crate::core::types::{
    AccountEntry, Exchange, OpenOrder, Position, PositionSide, StreamBalances, StreamPosition,
};
use crate::exchanges::kraken::schema::{self, stream};
use serde_json::Value;

const PLATFORM: Exchange = Exchange::KrakenFutures;

/// `openpositions`: sizes are magnitudes, direction comes from `side`.
pub fn convert_positions(payload: &Value) -> Vec<Position> {
    discover(PLATFORM, "positions", schema::POSITION_SHAPES, payload)
        .into_iter()
        .filter_map(convert_position)
        .collect()
}

fn convert_position(entry: &Value) -> Option<Position> {
    let ticker = schema::SYMBOL.resolve(entry)?;
    let side = schema::SIDE
        .resolve(entry)
        .map(|label| PositionSide::from_label(&label))
        .unwrap_or(PositionSide::Unknown);
    let size = signed_size(schema::SIZE.resolve_or_zero(entry), side);
    if is_dust(size) {
        return None;
    }
    let side = PositionSide::from_size(size);

    let entry_price = schema::ENTRY_PRICE.resolve(entry).filter(|p| *p > 0.0);
    let leverage = schema::LEVERAGE.resolve(entry).filter(|l| *l > 0.0);
    let margin_usd = schema::MARGIN.find(entry).unwrap_or_else(|| {
        let price = schema::MARK_PRICE.find(entry).or(entry_price).unwrap_or(0.0);
        margin_from_notional(size * price, leverage)
    });

    Some(Position {
        id: Position::make_id(PLATFORM, &ticker, side),
        ticker,
        size,
        entry_price,
        margin_usd,
        unrealized_pnl_usd: schema::UNREALIZED_PNL.resolve_or_zero(entry),
        leverage,
        side,
        platform: PLATFORM,
    })
}

pub fn convert_open_orders(payload: &Value) -> Vec<OpenOrder> {
    discover(PLATFORM, "open_orders", schema::ORDER_SHAPES, payload)
        .into_iter()
        .filter_map(|entry| {
            let id = schema::ORDER_ID.resolve(entry)?;
            let ticker = schema::SYMBOL.resolve(entry).unwrap_or_default();
            let side = schema::SIDE.resolve(entry);
            Some(OpenOrder {
                id: format!("{}-{}", PLATFORM, id),
                display_name: order_display_name(
                    side.as_deref(),
                    schema::ORDER_QUANTITY.resolve(entry),
                    &ticker,
                    schema::ORDER_PRICE.resolve(entry),
                ),
                margin_usd: schema::ORDER_MARGIN.find(entry),
                platform: PLATFORM,
            })
        })
        .collect()
}

/// Account totals summed over every sub-account that reports them.
/// Accounts without any of the fields (cash accounts) contribute nothing.
pub fn convert_accounts(
    payload: &Value,
) -> (Vec<AccountEntry>, Vec<AccountEntry>, Vec<AccountEntry>) {
    let accounts = discover(PLATFORM, "accounts", schema::ACCOUNT_SHAPES, payload);

    let total = |chain: &FieldChain, kind: &str| {
        let values: Vec<f64> = accounts.iter().filter_map(|a| chain.find(a)).collect();
        if values.is_empty() {
            Vec::new()
        } else {
            vec![AccountEntry::new(PLATFORM, kind, "USD", values.iter().sum())]
        }
    };

    (
        total(&schema::AVAILABLE, "available"),
        total(&schema::LOCKED, "locked"),
        total(&schema::EQUITY, "equity"),
    )
}

/// Entries of an `open_positions` feed message; `None` when it has no list.
pub fn convert_stream_positions(message: &Value) -> Option<Vec<StreamPosition>> {
    let entries = lookup(message, "positions")?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| {
                Some(StreamPosition {
                    instrument: stream::INSTRUMENT.resolve(entry)?,
                    size: stream::SIZE.resolve(entry),
                    entry_price: stream::ENTRY_PRICE.resolve(entry),
                    mark_price: stream::MARK_PRICE.resolve(entry),
                    unrealized_pnl: stream::PNL.resolve(entry),
                    leverage: stream::LEVERAGE.resolve(entry),
                    initial_margin: stream::INITIAL_MARGIN.resolve(entry),
                })
            })
            .collect(),
    )
}

/// The `flex_futures` block of a `balances` feed message. Absent fields stay
/// `None` so the merge keeps their previous values.
pub fn convert_stream_balances(message: &Value) -> StreamBalances {
    let Some(flex) = lookup(message, "flex_futures") else {
        return StreamBalances::default();
    };
    StreamBalances {
        balance_value: stream::BALANCE_VALUE.resolve(flex),
        portfolio_value: stream::PORTFOLIO_VALUE.resolve(flex),
        collateral_value: stream::COLLATERAL_VALUE.resolve(flex),
        margin_equity: stream::MARGIN_EQUITY.resolve(flex),
        available_margin: stream::AVAILABLE_MARGIN.resolve(flex),
        initial_margin: stream::INITIAL_MARGIN_TOTAL.resolve(flex),
        pnl: stream::BALANCE_PNL.resolve(flex),
        unrealized_funding: stream::UNREALIZED_FUNDING.resolve(flex),
        total_unrealized: stream::TOTAL_UNREALIZED.resolve(flex),
        total_balance: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn short_xbt() -> Value {
        json!({
            "side": "short",
            "symbol": "PF_XBTUSD",
            "price": 30000.0,
            "fillTime": "2024-01-01T00:00:00.000Z",
            "size": 0.5,
            "leverage": 5,
            "unrealizedFunding": 0.0001
        })
    }

    #[test]
    fn test_positions_from_every_shape() {
        let expected = convert_positions(&json!({"result": "success", "openPositions": [short_xbt()]}));
        assert_eq!(expected.len(), 1);
        for payload in [
            json!({"positions": [short_xbt()]}),
            json!({"data": [short_xbt()]}),
            json!([null, [short_xbt()]]),
            json!([short_xbt()]),
        ] {
            assert_eq!(convert_positions(&payload), expected);
        }
    }

    #[test]
    fn test_side_signs_size_and_margin_falls_back() {
        let position = &convert_positions(&json!({"openPositions": [short_xbt()]}))[0];
        assert_eq!(position.id, "kraken_futures-pf_xbtusd-short");
        assert_eq!(position.size, -0.5);
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.entry_price, Some(30000.0));
        assert!((position.margin_usd - 3000.0).abs() < 1e-9);
        assert_eq!(position.unrealized_pnl_usd, 0.0);
    }

    #[test]
    fn test_orders_margin_only_when_reported() {
        let payload = json!({"openOrders": [
            {"order_id": "a1", "symbol": "PF_ETHUSD", "side": "buy", "unfilledSize": 2, "limitPrice": 2000},
            {"order_id": "a2", "symbol": "PF_ETHUSD", "side": "sell", "unfilledSize": 1, "initialMargin": "150"}
        ]});
        let orders = convert_open_orders(&payload);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].display_name, "BUY 2 PF_ETHUSD @ 2000");
        assert_eq!(orders[0].margin_usd, None);
        assert_eq!(orders[1].margin_usd, Some(150.0));
    }

    #[test]
    fn test_accounts_are_summed() {
        let payload = json!({"result": "success", "accounts": {
            "cash": {"type": "cashAccount", "balances": {"xbt": 0.1}},
            "flex": {
                "type": "multiCollateralMarginAccount",
                "availableMargin": 800.0,
                "initialMargin": 200.0,
                "portfolioValue": 1000.0
            },
            "fi_xbtusd": {
                "type": "marginAccount",
                "auxiliary": {"af": 50.0, "pv": 60.0},
                "marginRequirements": {"im": 10.0}
            }
        }});
        let (available, locked, equity) = convert_accounts(&payload);
        assert_eq!(available[0].amount_usd, 850.0);
        assert_eq!(locked[0].amount_usd, 210.0);
        assert_eq!(equity[0].amount_usd, 1060.0);
        assert_eq!(equity[0].id, "kraken_futures-equity-usd");

        let (available, _, _) = convert_accounts(&json!({"accounts": {}}));
        assert!(available.is_empty());
    }

    #[test]
    fn test_stream_messages() {
        let positions = convert_stream_positions(&json!({
            "feed": "open_positions",
            "positions": [{"instrument": "PF_XBTUSD", "balance": 0.1, "entry_price": 30000, "pnl": 5}]
        }))
        .unwrap();
        assert_eq!(positions[0].instrument, "PF_XBTUSD");
        assert_eq!(positions[0].size, Some(0.1));
        assert_eq!(positions[0].mark_price, None);
        assert!(convert_stream_positions(&json!({"feed": "open_positions"})).is_none());

        let balances = convert_stream_balances(&json!({
            "feed": "balances",
            "flex_futures": {"portfolio_value": 1200.5, "available_margin": 900}
        }));
        assert_eq!(balances.portfolio_value, Some(1200.5));
        assert_eq!(balances.available_margin, Some(900.0));
        assert_eq!(balances.balance_value, None);
    }
}
