//! Row-limit argument resolution.

use serde_json::Value as JsonValue;

/// Turn a loosely-typed `limit` argument into a bounded row count.
///
/// Absent or non-numeric values yield `default`. Numbers are truncated toward
/// zero and clamped to `[1, max]`. Never fails.
pub fn resolve_limit(raw: Option<&JsonValue>, default: u32, max: u32) -> u32 {
    let max = max.max(1);
    let Some(value) = raw.and_then(JsonValue::as_f64) else {
        return default;
    };
    if value.is_nan() {
        return default;
    }

    // `as` saturates, and truncates toward zero.
    let truncated = value as i64;
    truncated.clamp(1, i64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(raw: Option<JsonValue>) -> u32 {
        resolve_limit(raw.as_ref(), 100, 1000)
    }

    #[test]
    fn test_absent_uses_default() {
        assert_eq!(resolve(None), 100);
    }

    #[test]
    fn test_non_numeric_uses_default() {
        assert_eq!(resolve(Some(json!("50"))), 100);
        assert_eq!(resolve(Some(json!(null))), 100);
        assert_eq!(resolve(Some(json!(true))), 100);
        assert_eq!(resolve(Some(json!([5]))), 100);
    }

    #[test]
    fn test_in_range_passes_through() {
        assert_eq!(resolve(Some(json!(5))), 5);
        assert_eq!(resolve(Some(json!(1000))), 1000);
    }

    #[test]
    fn test_fractional_is_truncated() {
        assert_eq!(resolve(Some(json!(42.9))), 42);
        assert_eq!(resolve(Some(json!(0.5))), 1);
    }

    #[test]
    fn test_clamps_low_and_high() {
        assert_eq!(resolve(Some(json!(0))), 1);
        assert_eq!(resolve(Some(json!(-5))), 1);
        assert_eq!(resolve(Some(json!(2000))), 1000);
        assert_eq!(resolve(Some(json!(1e300))), 1000);
    }

    #[test]
    fn test_search_bounds() {
        assert_eq!(resolve_limit(None, 10, 20), 10);
        assert_eq!(resolve_limit(Some(&json!(25)), 10, 20), 20);
    }

    #[test]
    fn test_idempotent_on_output() {
        for raw in [None, Some(json!(0)), Some(json!(-3)), Some(json!(7)), Some(json!(5000))] {
            let once = resolve(raw);
            let twice = resolve(Some(json!(once)));
            assert_eq!(once, twice);
        }
    }
}
