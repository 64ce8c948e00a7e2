use crate::core::normalize::{
    discover, is_dust, locate_object, margin_from_notional, order_display_name,
};
use crate::core::types::{AccountEntry, Exchange, OpenOrder, Position, PositionSide};
use crate::exchanges::hyperliquid::schema;
use crate::exchanges::hyperliquid::types::PerpDex;
use serde_json::Value;

const PLATFORM: Exchange = Exchange::Hyperliquid;
const COLLATERAL: &str = "USDC";

/// Dexes listed by `perpDexs`, default dex first
pub fn convert_perp_dexs(payload: &Value) -> Vec<PerpDex> {
    let mut dexes = vec![PerpDex::default_dex()];
    for entry in discover(PLATFORM, "perp_dexs", schema::DEX_SHAPES, payload) {
        let Some(name) = schema::DEX_NAME.resolve(entry) else {
            continue;
        };
        if !dexes.iter().any(|dex| dex.name == name) {
            dexes.push(PerpDex { name });
        }
    }
    dexes
}

/// Positions from one dex's `clearinghouseState`
pub fn convert_positions(payload: &Value, dex: &PerpDex) -> Vec<Position> {
    discover(PLATFORM, "positions", schema::POSITION_SHAPES, payload)
        .into_iter()
        .filter_map(|entry| convert_position(entry, dex))
        .collect()
}

fn convert_position(entry: &Value, dex: &PerpDex) -> Option<Position> {
    let size = schema::SIZE.resolve_or_zero(entry);
    if is_dust(size) {
        return None;
    }
    let ticker = schema::COIN.resolve(entry)?;
    let leverage = schema::LEVERAGE.resolve(entry).filter(|l| *l > 0.0);
    let margin_usd = schema::MARGIN.find(entry).unwrap_or_else(|| {
        margin_from_notional(schema::POSITION_VALUE.resolve_or_zero(entry), leverage)
    });

    let side = PositionSide::from_size(size);
    Some(Position {
        id: Position::make_id(PLATFORM, &scoped(dex, &ticker), side),
        ticker,
        size,
        entry_price: schema::ENTRY_PRICE.resolve(entry),
        margin_usd,
        unrealized_pnl_usd: schema::UNREALIZED_PNL.resolve_or_zero(entry),
        leverage,
        side,
        platform: PLATFORM,
    })
}

/// Open orders from `frontendOpenOrders`; margin is never reported per order.
pub fn convert_open_orders(payload: &Value) -> Vec<OpenOrder> {
    discover(PLATFORM, "open_orders", schema::ORDER_SHAPES, payload)
        .into_iter()
        .filter_map(|entry| {
            let id = schema::ORDER_ID.resolve(entry)?;
            let ticker = schema::COIN.resolve(entry).unwrap_or_default();
            let side = schema::ORDER_SIDE.resolve(entry).map(|label| {
                match PositionSide::from_label(&label) {
                    PositionSide::Long => "BUY".to_string(),
                    PositionSide::Short => "SELL".to_string(),
                    PositionSide::Unknown => label,
                }
            });
            Some(OpenOrder {
                id: format!("{}-{}", PLATFORM, id),
                display_name: order_display_name(
                    side.as_deref(),
                    schema::ORDER_SIZE.resolve(entry),
                    &ticker,
                    schema::ORDER_PRICE.resolve(entry),
                ),
                margin_usd: None,
                platform: PLATFORM,
            })
        })
        .collect()
}

/// Margin summary of one dex as (available, locked, equity) entries
pub fn convert_account(
    payload: &Value,
    dex: &PerpDex,
) -> (Vec<AccountEntry>, Vec<AccountEntry>, Vec<AccountEntry>) {
    let Some(state) = locate_object(payload, schema::ACCOUNT_ROOTS) else {
        return (Vec::new(), Vec::new(), Vec::new());
    };

    let entry = |kind: &str, value: Option<f64>| {
        value
            .map(|amount| vec![AccountEntry::new(PLATFORM, &scoped(dex, kind), COLLATERAL, amount)])
            .unwrap_or_default()
    };

    (
        entry("available", schema::AVAILABLE.resolve(state)),
        entry("locked", schema::LOCKED.resolve(state)),
        entry("equity", schema::EQUITY.resolve(state)),
    )
}

fn scoped(dex: &PerpDex, name: &str) -> String {
    if dex.is_default() {
        name.to_string()
    } else {
        format!("{}-{}", dex.name, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> Value {
        json!({
            "assetPositions": [
                {
                    "type": "oneWay",
                    "position": {
                        "coin": "ETH",
                        "szi": "-1.5",
                        "entryPx": "2000.0",
                        "positionValue": "3150.0",
                        "unrealizedPnl": "-150.0",
                        "marginUsed": "315.0",
                        "leverage": {"type": "cross", "value": 10}
                    }
                },
                {"type": "oneWay", "position": {"coin": "BTC", "szi": "0.0"}}
            ],
            "marginSummary": {"accountValue": "1000.5", "totalMarginUsed": "315.0"},
            "withdrawable": "685.5"
        })
    }

    #[test]
    fn test_wrapped_and_flat_entries_match() {
        let wrapped = convert_positions(&state(), &PerpDex::default_dex());
        assert_eq!(wrapped.len(), 1);

        let flat = json!([null, [{
            "coin": "ETH",
            "szi": "-1.5",
            "entryPx": "2000.0",
            "unrealizedPnl": "-150.0",
            "marginUsed": "315.0",
            "leverage": {"type": "cross", "value": 10}
        }]]);
        assert_eq!(convert_positions(&flat, &PerpDex::default_dex()), wrapped);

        let position = &wrapped[0];
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.margin_usd, 315.0);
        assert_eq!(position.leverage, Some(10.0));
        assert_eq!(position.id, "hyperliquid-eth-short");
    }

    #[test]
    fn test_dex_discovery_keeps_default_first() {
        let dexes = convert_perp_dexs(&json!([null, {"name": "xyz", "full_name": "XYZ"}]));
        assert_eq!(
            dexes,
            vec![PerpDex::default_dex(), PerpDex { name: "xyz".into() }]
        );
        assert_eq!(convert_perp_dexs(&json!({"weird": 1})), vec![PerpDex::default_dex()]);
    }

    #[test]
    fn test_blank_and_repeated_dex_names_are_skipped() {
        let dexes = convert_perp_dexs(&json!([
            null,
            {"name": ""},
            {"name": "   "},
            {"name": "xyz"},
            {"name": "xyz"}
        ]));
        assert_eq!(
            dexes,
            vec![PerpDex::default_dex(), PerpDex { name: "xyz".into() }]
        );
    }

    #[test]
    fn test_account_entries_are_scoped_per_dex() {
        let dex = PerpDex { name: "xyz".into() };
        let (available, locked, equity) = convert_account(&state(), &dex);
        assert_eq!(available[0].amount_usd, 685.5);
        assert_eq!(locked[0].amount_usd, 315.0);
        assert_eq!(equity[0].amount_usd, 1000.5);
        assert_eq!(equity[0].id, "hyperliquid-xyz-equity-usdc");

        let (_, _, equity) = convert_account(&state(), &PerpDex::default_dex());
        assert_eq!(equity[0].id, "hyperliquid-equity-usdc");
    }

    #[test]
    fn test_orders() {
        let orders = convert_open_orders(&json!([
            {"coin": "BTC", "side": "B", "limitPx": "29000", "sz": "0.1", "oid": 77}
        ]));
        assert_eq!(orders[0].display_name, "BUY 0.1 BTC @ 29000");
        assert_eq!(orders[0].id, "hyperliquid-77");
        assert_eq!(orders[0].margin_usd, None);
    }
}
