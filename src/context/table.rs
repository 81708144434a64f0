//! Cell and label normalization for financial report tables.
//!
//! Every cell is interpreted exactly once, here. Downstream code only
//! ever sees a signed decimal or an explicit non-numeric marker; no
//! currency symbols, separators, or parenthesized negatives survive
//! past this boundary.

/// A table cell after normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Number {
        value: f64,
        /// Set when the raw cell carried a trailing `%`. The stored
        /// value is already divided by 100; the flag is a hint for the
        /// judge's format-equivalence checks.
        percent_scaled: bool,
    },
    /// The cell failed numeric parsing ("n/a", "-", empty, prose).
    /// Referencing it during execution is an error, never a zero.
    NonNumeric,
}

/// Interprets a raw cell string.
///
/// Rules, applied in order:
/// 1. trim surrounding whitespace;
/// 2. `( ... )` marks a negative;
/// 3. a trailing `%` divides the value by 100 and sets the flag;
/// 4. `$` and thousands separators are stripped;
/// 5. whatever remains must parse as a signed decimal.
pub fn parse_cell(raw: &str) -> CellValue {
    let mut s = raw.trim();
    if s.is_empty() {
        return CellValue::NonNumeric;
    }

    let mut negative = false;
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].trim();
    }

    let mut percent_scaled = false;
    if let Some(stripped) = s.strip_suffix('%') {
        percent_scaled = true;
        s = stripped.trim_end();
    }

    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    match cleaned.parse::<f64>() {
        Ok(mut value) => {
            if negative {
                value = -value;
            }
            if percent_scaled {
                value /= 100.0;
            }
            CellValue::Number {
                value,
                percent_scaled,
            }
        }
        Err(_) => CellValue::NonNumeric,
    }
}

/// Normalizes a row/column label for lookup: lowercase, trimmed, and
/// punctuation-insensitive (any non-alphanumeric run collapses to a
/// single space). Both the stored labels and the query go through this,
/// so `"12/31/06"` matches `"12/31/06 "` and `"United Parcel Service, Inc."`
/// matches `"united parcel service inc."`.
pub fn normalize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_space = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("91.06", 91.06, false)]
    #[case("$ 1,234.5", 1234.5, false)]
    #[case("(123.4)", -123.4, false)]
    #[case("( $2,000 )", -2000.0, false)]
    #[case("14.1%", 0.141, true)]
    #[case("(3.2%)", -0.032, true)]
    #[case("-8.94", -8.94, false)]
    #[case("100", 100.0, false)]
    fn numeric_cells(#[case] raw: &str, #[case] value: f64, #[case] percent: bool) {
        match parse_cell(raw) {
            CellValue::Number {
                value: v,
                percent_scaled,
            } => {
                assert!((v - value).abs() < 1e-12, "{raw}: got {v}");
                assert_eq!(percent_scaled, percent);
            }
            CellValue::NonNumeric => panic!("{raw} should be numeric"),
        }
    }

    #[rstest]
    #[case("n/a")]
    #[case("")]
    #[case("   ")]
    #[case("-")]
    #[case("see note 4")]
    fn non_numeric_cells(#[case] raw: &str) {
        assert_eq!(parse_cell(raw), CellValue::NonNumeric);
    }

    #[rstest]
    #[case("United Parcel Service, Inc.", "united parcel service inc")]
    #[case("  12/31/06 ", "12 31 06")]
    #[case("Net Sales", "net sales")]
    #[case("net   sales", "net sales")]
    fn label_normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_label(raw), expected);
    }
}
