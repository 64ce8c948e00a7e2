use crate::core::normalize::{
    contracts_to_base, discover, is_dust, locate_object, lookup, margin_from_notional,
    order_display_name, signed_size, Shape,
};
use crate::core::types::{AccountEntry, Exchange, OpenOrder, Position, PositionSide};
use crate::exchanges::mexc::schema;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

const PLATFORM: Exchange = Exchange::Mexc;

/// Contract size per symbol, from `/contract/detail`
pub type ContractSizes = HashMap<String, f64>;

/// Multiplier used when a symbol's contract size is unknown
pub const DEFAULT_CONTRACT_SIZE: f64 = 1.0;

pub fn contract_size(sizes: &ContractSizes, symbol: &str) -> f64 {
    sizes.get(symbol).copied().unwrap_or(DEFAULT_CONTRACT_SIZE)
}

/// Symbols referenced by a positions or orders payload, deduplicated
pub fn symbols(payload: &Value, shapes: &[Shape]) -> BTreeSet<String> {
    discover(PLATFORM, "symbols", shapes, payload)
        .into_iter()
        .filter_map(|entry| schema::SYMBOL.resolve(entry))
        .collect()
}

/// `contractSize` for `symbol`. The detail endpoint returns an object for a
/// single symbol and an array otherwise.
pub fn convert_contract_size(payload: &Value, symbol: &str) -> Option<f64> {
    let entry = match lookup(payload, "data") {
        Some(Value::Array(contracts)) => contracts
            .iter()
            .find(|c| schema::SYMBOL.resolve(c).as_deref() == Some(symbol))?,
        _ => locate_object(payload, schema::CONTRACT_ROOTS)?,
    };
    schema::CONTRACT_SIZE.find(entry).filter(|size| *size > 0.0)
}

pub fn convert_positions(payload: &Value, sizes: &ContractSizes) -> Vec<Position> {
    discover(PLATFORM, "positions", schema::POSITION_SHAPES, payload)
        .into_iter()
        .filter_map(|entry| convert_position(entry, sizes))
        .collect()
}

fn position_side(position_type: Option<f64>) -> PositionSide {
    match position_type.map(|t| t as i64) {
        Some(1) => PositionSide::Long,
        Some(2) => PositionSide::Short,
        _ => PositionSide::Unknown,
    }
}

fn convert_position(entry: &Value, sizes: &ContractSizes) -> Option<Position> {
    let ticker = schema::SYMBOL.resolve(entry)?;
    let volume = schema::HOLD_VOLUME.resolve_or_zero(entry);
    let side = position_side(schema::POSITION_TYPE.find(entry));
    let size = signed_size(contracts_to_base(volume, contract_size(sizes, &ticker)), side);
    if is_dust(size) {
        return None;
    }
    let side = PositionSide::from_size(size);

    let entry_price = schema::ENTRY_PRICE.resolve(entry).filter(|p| *p > 0.0);
    let leverage = schema::LEVERAGE.resolve(entry).filter(|l| *l > 0.0);
    let margin_usd = schema::MARGIN
        .find(entry)
        .filter(|m| *m > 0.0)
        .unwrap_or_else(|| margin_from_notional(size * entry_price.unwrap_or(0.0), leverage));

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

fn order_side(code: Option<f64>) -> Option<&'static str> {
    match code.map(|c| c as i64) {
        Some(1 | 2) => Some("BUY"),
        Some(3 | 4) => Some("SELL"),
        _ => None,
    }
}

pub fn convert_open_orders(payload: &Value, sizes: &ContractSizes) -> Vec<OpenOrder> {
    discover(PLATFORM, "open_orders", schema::ORDER_SHAPES, payload)
        .into_iter()
        .filter_map(|entry| {
            let id = schema::ORDER_ID.resolve(entry)?;
            let ticker = schema::SYMBOL.resolve(entry).unwrap_or_default();
            let quantity = schema::ORDER_VOLUME
                .resolve(entry)
                .map(|vol| contracts_to_base(vol, contract_size(sizes, &ticker)));
            Some(OpenOrder {
                id: format!("{}-{}", PLATFORM, id),
                display_name: order_display_name(
                    order_side(schema::ORDER_SIDE.find(entry)),
                    quantity,
                    &ticker,
                    schema::ORDER_PRICE.resolve(entry),
                ),
                margin_usd: schema::ORDER_MARGIN.find(entry),
                platform: PLATFORM,
            })
        })
        .collect()
}

/// Per-currency (available, locked, equity) entries for stablecoin assets.
/// Locked margin is position margin plus margin frozen by open orders.
pub fn convert_assets(
    payload: &Value,
) -> (Vec<AccountEntry>, Vec<AccountEntry>, Vec<AccountEntry>) {
    let mut available = Vec::new();
    let mut locked = Vec::new();
    let mut equity = Vec::new();

    for asset in discover(PLATFORM, "assets", schema::ASSET_SHAPES, payload) {
        let Some(currency) = schema::CURRENCY.resolve(asset) else {
            continue;
        };
        let currency = currency.to_ascii_uppercase();
        if !schema::STABLECOINS.contains(&currency.as_str()) {
            continue;
        }

        if let Some(amount) = schema::AVAILABLE.find(asset) {
            available.push(AccountEntry::new(PLATFORM, "available", &currency, amount));
        }
        let position_margin = schema::POSITION_MARGIN.find(asset);
        let frozen = schema::FROZEN.find(asset);
        if position_margin.is_some() || frozen.is_some() {
            let amount = position_margin.unwrap_or(0.0) + frozen.unwrap_or(0.0);
            locked.push(AccountEntry::new(PLATFORM, "locked", &currency, amount));
        }
        if let Some(amount) = schema::EQUITY.find(asset) {
            equity.push(AccountEntry::new(PLATFORM, "equity", &currency, amount));
        }
    }

    (available, locked, equity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sizes() -> ContractSizes {
        HashMap::from([("BTC_USDT".to_string(), 0.0001)])
    }

    fn short_btc() -> Value {
        json!({
            "positionId": 1,
            "symbol": "BTC_USDT",
            "positionType": 2,
            "holdVol": 100,
            "holdAvgPrice": 30000,
            "leverage": 10,
            "im": 30.5
        })
    }

    #[test]
    fn test_positions_from_every_shape() {
        let expected = convert_positions(&json!({"success": true, "data": [short_btc()]}), &sizes());
        assert_eq!(expected.len(), 1);
        for payload in [
            json!({"data": {"resultList": [short_btc()]}}),
            json!({"positions": [short_btc()]}),
            json!([short_btc()]),
        ] {
            assert_eq!(convert_positions(&payload, &sizes()), expected);
        }
    }

    #[test]
    fn test_position_type_and_contract_size() {
        let position = &convert_positions(&json!({"data": [short_btc()]}), &sizes())[0];
        assert_eq!(position.side, PositionSide::Short);
        assert!((position.size + 0.01).abs() < 1e-12);
        assert_eq!(position.margin_usd, 30.5);
        assert_eq!(position.id, "mexc-btc_usdt-short");
    }

    #[test]
    fn test_fixed_point_volume_is_rescaled() {
        let payload = json!({"data": [{
            "symbol": "ETH_USDT", "positionType": 1, "holdVol": 120000, "holdAvgPrice": 2000, "leverage": 5
        }]});
        let sizes = HashMap::from([("ETH_USDT".to_string(), 0.001)]);
        let position = &convert_positions(&payload, &sizes)[0];
        assert!((position.size - 0.012).abs() < 1e-12);
        assert_eq!(position.side, PositionSide::Long);
        assert!((position.margin_usd - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_contract_size_defaults_to_one() {
        let payload = json!({"data": [{"symbol": "DOGE_USDT", "positionType": 1, "holdVol": 7}]});
        let position = &convert_positions(&payload, &ContractSizes::new())[0];
        assert_eq!(position.size, 7.0);
    }

    #[test]
    fn test_orders_report_margin() {
        let payload = json!({"data": [{
            "orderId": "739113577038255616", "symbol": "BTC_USDT", "side": 3,
            "vol": 50, "price": 31000, "orderMargin": 15.5
        }]});
        let orders = convert_open_orders(&payload, &sizes());
        assert_eq!(orders[0].display_name, "SELL 0.005 BTC_USDT @ 31000");
        assert_eq!(orders[0].margin_usd, Some(15.5));
    }

    #[test]
    fn test_only_stablecoin_assets_count() {
        let payload = json!({"success": true, "data": [
            {"currency": "USDT", "availableBalance": 900, "positionMargin": 80, "frozenBalance": 20, "equity": 1000},
            {"currency": "BTC", "availableBalance": 0.1, "equity": 0.1}
        ]});
        let (available, locked, equity) = convert_assets(&payload);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "mexc-available-usdt");
        assert_eq!(locked[0].amount_usd, 100.0);
        assert_eq!(equity[0].amount_usd, 1000.0);
    }

    #[test]
    fn test_contract_size_lookup() {
        let single = json!({"success": true, "data": {"symbol": "BTC_USDT", "contractSize": 0.0001}});
        assert_eq!(convert_contract_size(&single, "BTC_USDT"), Some(0.0001));

        let many = json!({"data": [
            {"symbol": "ETH_USDT", "contractSize": 0.01},
            {"symbol": "BTC_USDT", "contractSize": 0.0001}
        ]});
        assert_eq!(convert_contract_size(&many, "ETH_USDT"), Some(0.01));
        assert_eq!(convert_contract_size(&many, "SOL_USDT"), None);
        assert_eq!(convert_contract_size(&json!({"data": {"contractSize": 0}}), "X"), None);
    }
}
