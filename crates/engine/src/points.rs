//! Point arithmetic. Points are integer hundredths (`250` = 2.50 points).

use crate::EngineError;

/// Split `total` hundredths between `helpers` people.
///
/// Every helper gets `total / helpers`; the remainder is handed out one
/// hundredth at a time, starting with the first helper. The shares always
/// sum to `total`.
pub fn split_points(total: i64, helpers: usize) -> Vec<i64> {
    let Ok(n) = i64::try_from(helpers) else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }

    let base = total / n;
    let remainder = total % n;

    (0..n).map(|i| if i < remainder { base + 1 } else { base }).collect()
}

/// Render hundredths as a decimal string, e.g. `250` → `"2.50"`.
pub fn format_points(hundredths: i64) -> String {
    let sign = if hundredths < 0 { "-" } else { "" };
    let abs = hundredths.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Parse a non-negative decimal with at most two fractional digits.
pub fn parse_points(input: &str) -> Result<i64, EngineError> {
    let invalid = || EngineError::Validation(format!("'{input}' is not a valid points value"));
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 2 {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_hands_out_remainder_in_order() {
        assert_eq!(split_points(100, 3), vec![34, 33, 33]);
        assert_eq!(split_points(250, 2), vec![125, 125]);
        assert_eq!(split_points(5, 1), vec![5]);
        assert!(split_points(100, 0).is_empty());
    }

    #[test]
    fn shares_always_sum_to_total() {
        for total in [0, 1, 99, 101, 1234] {
            for n in 1..=7 {
                assert_eq!(split_points(total, n).iter().sum::<i64>(), total);
            }
        }
    }

    #[test]
    fn formats_hundredths() {
        assert_eq!(format_points(250), "2.50");
        assert_eq!(format_points(5), "0.05");
        assert_eq!(format_points(-50), "-0.50");
    }

    #[test]
    fn parses_decimal_input() {
        assert_eq!(parse_points("2").unwrap(), 200);
        assert_eq!(parse_points("2.5").unwrap(), 250);
        assert_eq!(parse_points(" 0.05 ").unwrap(), 5);
        assert_eq!(parse_points(".5").unwrap(), 50);
        assert!(parse_points("1.234").is_err());
        assert!(parse_points("-1").is_err());
        assert!(parse_points("abc").is_err());
    }
}
