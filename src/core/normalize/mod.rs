//! Schema-tolerant extraction of canonical entities from exchange JSON.
//!
//! Each exchange describes its payloads with constant tables: an ordered
//! list of [`Shape`]s per collection and a [`FieldChain`] per canonical
//! field. The functions here interpret those tables; they never fail, an
//! unrecognised payload becomes an empty list plus a logged
//! [`NormalizationGap`].

pub mod fields;
pub mod numeric;
pub mod shapes;

pub use fields::{locate_object, lookup, FieldChain, Missing, TextChain};
pub use numeric::{
    coerce_f64, contracts_to_base, infer_side, is_dust, margin_from_notional, rescale_fixed_point,
    signed_size,
};
pub use shapes::{discover, try_discover, NormalizationGap, Shape};

/// Human-readable order label: `BUY 0.5 BTCUSDT @ 30000`.
pub fn order_display_name(
    side: Option<&str>,
    quantity: Option<f64>,
    ticker: &str,
    price: Option<f64>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(5);
    if let Some(side) = side.filter(|s| !s.is_empty()) {
        parts.push(side.to_ascii_uppercase());
    }
    if let Some(quantity) = quantity {
        parts.push(quantity.abs().to_string());
    }
    parts.push(ticker.to_string());
    if let Some(price) = price.filter(|p| *p > 0.0) {
        parts.push(format!("@ {}", price));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_display_name() {
        assert_eq!(
            order_display_name(Some("buy"), Some(0.5), "BTCUSDT", Some(30_000.0)),
            "BUY 0.5 BTCUSDT @ 30000"
        );
        assert_eq!(order_display_name(None, None, "ETH", Some(0.0)), "ETH");
    }
}
