use crate::core::types::{PositionSide, SIZE_EPSILON};
use serde_json::Value;

const FIXED_POINT_SCALE: f64 = 10_000.0;

/// Accept JSON numbers and numeric strings; only finite values are valid.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Undo fixed-point integer encodings: an integral value with magnitude of
/// at least 10,000 that is an exact multiple of 10,000 is divided by 10,000.
/// Anything else is returned unchanged.
pub fn rescale_fixed_point(value: f64) -> f64 {
    let looks_fixed_point = value.fract() == 0.0
        && value.abs() >= FIXED_POINT_SCALE
        && value % FIXED_POINT_SCALE == 0.0;
    if looks_fixed_point {
        value / FIXED_POINT_SCALE
    } else {
        value
    }
}

/// Convert a volume quoted in contracts into base-asset units.
pub fn contracts_to_base(volume: f64, contract_size: f64) -> f64 {
    rescale_fixed_point(volume) * contract_size
}

/// Explicit side wins; otherwise the sign of the size decides.
pub fn infer_side(explicit: Option<PositionSide>, size: f64) -> PositionSide {
    match explicit {
        Some(side @ (PositionSide::Long | PositionSide::Short)) => side,
        _ => PositionSide::from_size(size),
    }
}

/// Size with the sign implied by `side`, for feeds that report magnitudes.
pub fn signed_size(size: f64, side: PositionSide) -> f64 {
    match side {
        PositionSide::Long => size.abs(),
        PositionSide::Short => -size.abs(),
        PositionSide::Unknown => size,
    }
}

pub fn is_dust(size: f64) -> bool {
    !size.is_finite() || size.abs() < SIZE_EPSILON
}

/// Margin implied by a notional and a leverage, `0.0` when leverage is unusable.
pub fn margin_from_notional(notional: f64, leverage: Option<f64>) -> f64 {
    match leverage {
        Some(leverage) if leverage > 0.0 => notional.abs() / leverage,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_f64(&json!("1.25")), Some(1.25));
        assert_eq!(coerce_f64(&json!(-3)), Some(-3.0));
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
    }

    #[test]
    fn test_fixed_point_volume_with_contract_size() {
        let base = contracts_to_base(120_000.0, 0.001);
        assert!((base - 0.012).abs() < 1e-12);
    }

    #[test]
    fn test_small_integers_are_not_rescaled() {
        assert_eq!(rescale_fixed_point(5.0), 5.0);
        assert_eq!(rescale_fixed_point(9_999.0), 9_999.0);
        assert_eq!(rescale_fixed_point(12_345.0), 12_345.0);
        assert_eq!(rescale_fixed_point(10_000.5), 10_000.5);
        assert_eq!(rescale_fixed_point(-20_000.0), -2.0);
        assert!((contracts_to_base(3.0, 0.001) - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_side_inference() {
        assert_eq!(infer_side(Some(PositionSide::Short), 2.0), PositionSide::Short);
        assert_eq!(infer_side(Some(PositionSide::Unknown), -2.0), PositionSide::Short);
        assert_eq!(infer_side(None, 2.0), PositionSide::Long);
        assert_eq!(signed_size(2.0, PositionSide::Short), -2.0);
    }

    #[test]
    fn test_dust_and_margin() {
        assert!(is_dust(0.00009));
        assert!(is_dust(f64::NAN));
        assert!(!is_dust(-0.0001));
        assert_eq!(margin_from_notional(-1_000.0, Some(10.0)), 100.0);
        assert_eq!(margin_from_notional(1_000.0, Some(0.0)), 0.0);
    }
}
