use crate::core::normalize::{
    discover, infer_side, is_dust, locate_object, margin_from_notional, order_display_name,
};
use crate::core::types::{AccountEntry, Exchange, OpenOrder, Position, PositionSide};
use crate::exchanges::aster::schema;
use serde_json::Value;

const PLATFORM: Exchange = Exchange::Aster;

/// Convert a `positionRisk` payload into open positions
pub fn convert_positions(payload: &Value) -> Vec<Position> {
    discover(PLATFORM, "positions", schema::POSITION_SHAPES, payload)
        .into_iter()
        .filter_map(convert_position)
        .collect()
}

fn convert_position(entry: &Value) -> Option<Position> {
    let size = schema::SIZE.resolve_or_zero(entry);
    if is_dust(size) {
        return None;
    }
    let ticker = schema::SYMBOL.resolve(entry)?;

    let explicit = schema::POSITION_SIDE
        .resolve(entry)
        .map(|label| PositionSide::from_label(&label));
    let side = infer_side(explicit, size);

    let entry_price = schema::ENTRY_PRICE.resolve(entry).filter(|p| *p > 0.0);
    let leverage = schema::LEVERAGE.resolve(entry).filter(|l| *l > 0.0);
    let margin_usd = schema::MARGIN
        .find(entry)
        .filter(|m| *m > 0.0)
        .unwrap_or_else(|| {
            let notional = schema::NOTIONAL.find(entry).unwrap_or_else(|| {
                size * schema::MARK_PRICE
                    .find(entry)
                    .or(entry_price)
                    .unwrap_or(0.0)
            });
            margin_from_notional(notional, leverage)
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

/// Open orders; Aster reports no per-order margin, so `margin_usd` is `None`.
pub fn convert_open_orders(payload: &Value) -> Vec<OpenOrder> {
    discover(PLATFORM, "open_orders", schema::ORDER_SHAPES, payload)
        .into_iter()
        .filter_map(|entry| {
            let id = schema::ORDER_ID.resolve(entry)?;
            let ticker = schema::SYMBOL.resolve(entry).unwrap_or_default();
            let side = schema::ORDER_SIDE.resolve(entry);
            Some(OpenOrder {
                id: format!("{}-{}", PLATFORM, id),
                display_name: order_display_name(
                    side.as_deref(),
                    schema::ORDER_QUANTITY.resolve(entry),
                    &ticker,
                    schema::ORDER_PRICE.resolve(entry),
                ),
                margin_usd: None,
                platform: PLATFORM,
            })
        })
        .collect()
}

/// Account totals split into (available, locked, equity) entries
pub fn convert_account(
    payload: &Value,
) -> (Vec<AccountEntry>, Vec<AccountEntry>, Vec<AccountEntry>) {
    let Some(account) = locate_object(payload, schema::ACCOUNT_ROOTS) else {
        return (Vec::new(), Vec::new(), Vec::new());
    };

    let entry = |kind: &str, value: Option<f64>| {
        value
            .map(|amount| vec![AccountEntry::new(PLATFORM, kind, "USD", amount)])
            .unwrap_or_default()
    };

    (
        entry("available", schema::AVAILABLE.resolve(account)),
        entry("locked", schema::LOCKED.resolve(account)),
        entry("equity", schema::EQUITY.resolve(account)),
    )
}
