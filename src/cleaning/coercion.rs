//! Value coercion shared by the sheet normalizers.
//!
//! Raw sheets are read as text, but normalizers also accept typed frames, so
//! every helper first casts the column to `String` (non-strict).

use polars::prelude::*;

use crate::error::Result;

/// Materialize a column as optional strings, trimming surrounding whitespace.
///
/// Blank cells become `None` so that "missing" has a single representation.
pub fn text_values(column: &Column) -> Result<Vec<Option<String>>> {
    let as_text = column.cast(&DataType::String)?;
    let values = as_text
        .str()?
        .into_iter()
        .map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

/// Parse a count cell. Strict: `"3,5"` and `"1,000"` do not parse.
pub fn parse_count(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a coordinate cell, accepting a decimal comma ("3,5").
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replacen(',', ".", 1).parse::<f64>())
        .ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Coerce a count cell: unparsable or missing → 0, fractional → truncated,
/// negative → 0.
pub fn coerce_count(raw: Option<&str>) -> i64 {
    raw.and_then(parse_count)
        .map(|v| v.trunc().max(0.0) as i64)
        .unwrap_or(0)
}

/// Coerce a column of counts to `Int64` with no nulls.
pub fn count_column(column: &Column, name: &str) -> Result<Column> {
    let values: Vec<i64> = text_values(column)?
        .iter()
        .map(|v| coerce_count(v.as_deref()))
        .collect();
    Ok(Series::new(name.into(), values).into_column())
}

/// Coerce a column to `Float64`, unparsable cells become null.
pub fn float_column(column: &Column, name: &str) -> Result<Column> {
    let values: Vec<Option<f64>> = text_values(column)?
        .iter()
        .map(|v| v.as_deref().and_then(parse_number))
        .collect();
    Ok(Series::new(name.into(), values).into_column())
}

/// Text column with missing cells filled by `""`.
pub fn filled_text_column(column: &Column, name: &str) -> Result<Column> {
    let values: Vec<String> = text_values(column)?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    Ok(Series::new(name.into(), values).into_column())
}

/// Text column, nulls preserved.
pub fn text_column(column: &Column, name: &str) -> Result<Column> {
    Ok(Series::new(name.into(), text_values(column)?).into_column())
}

/// Header labels that a reader invents for empty header cells.
///
/// pandas writes `Unnamed: 3`, polars writes `column_4`; both mean the cell
/// was blank.
pub fn is_placeholder_header(name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || name.starts_with("Unnamed:") {
        return true;
    }
    name.strip_prefix("column_")
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_count_policy() {
        assert_eq!(coerce_count(Some("12")), 12);
        assert_eq!(coerce_count(Some(" 3 ")), 3);
        assert_eq!(coerce_count(Some("2.0")), 2);
        assert_eq!(coerce_count(Some("2.9")), 2);
        assert_eq!(coerce_count(Some("abc")), 0);
        assert_eq!(coerce_count(Some("")), 0);
        assert_eq!(coerce_count(Some("-4")), 0);
        assert_eq!(coerce_count(Some("nan")), 0);
        assert_eq!(coerce_count(None), 0);
    }

    #[test]
    fn test_comma_counts_are_unparsable() {
        assert_eq!(coerce_count(Some("1,5")), 0);
        assert_eq!(coerce_count(Some("3,5")), 0);
        assert_eq!(coerce_count(Some("1,000")), 0);
        assert_eq!(parse_count("1,000"), None);
    }

    #[test]
    fn test_parse_number_decimal_comma() {
        assert_eq!(parse_number("4,25"), Some(4.25));
        assert_eq!(parse_number("-1.5"), Some(-1.5));
        assert_eq!(parse_number("x"), None);
    }

    #[test]
    fn test_placeholder_headers() {
        assert!(is_placeholder_header(""));
        assert!(is_placeholder_header("Unnamed: 4"));
        assert!(is_placeholder_header("column_12"));
        assert!(!is_placeholder_header("column_"));
        assert!(!is_placeholder_header("Bird"));
    }

    #[test]
    fn test_text_values_from_typed_column() {
        let column = Series::new("n".into(), &[Some(1i64), None, Some(3)]).into_column();
        let values = text_values(&column).unwrap();
        assert_eq!(values, vec![Some("1".to_string()), None, Some("3".to_string())]);
    }
}
