use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crate::errors::{Result, StockApiError};
use crate::models::table::Cell;

// 日期转换工具
pub fn int_to_naive_date(date_int: i64) -> Result<NaiveDate> {
    let date_str = date_int.to_string();
    if date_str.len() != 8 {
        return Err(StockApiError::Unknown(format!("Invalid date format: {}", date_str)));
    }

    let year = date_str[0..4].parse::<i32>()
        .map_err(|e| StockApiError::Unknown(e.to_string()))?;
    let month = date_str[4..6].parse::<u32>()
        .map_err(|e| StockApiError::Unknown(e.to_string()))?;
    let day = date_str[6..8].parse::<u32>()
        .map_err(|e| StockApiError::Unknown(e.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| StockApiError::Unknown(format!("Invalid date: {}-{}-{}", year, month, day)))
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn parse_date_str(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt.date());
        }
    }

    // 带时区的时间戳保留其本地日期
    Ok(DateTime::parse_from_rfc3339(text)?.date_naive())
}

/// Parse a date cell; `None` means the row should be dropped.
///
/// Integers between 19000101 and 29991231 are read as `YYYYMMDD`, any
/// other integer as unix seconds.
pub fn cell_to_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Text(text) => parse_date_str(text).ok(),
        Cell::Int(v) if (19000101..=29991231).contains(v) => int_to_naive_date(*v).ok(),
        Cell::Int(v) => DateTime::from_timestamp(*v, 0).map(|dt| dt.date_naive()),
        Cell::Float(_) | Cell::Null => None,
    }
}

/// Strict numeric coercion: only finite values survive.
pub fn cell_to_f64(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Int(v) => *v as f64,
        Cell::Float(v) => *v,
        Cell::Text(text) => text.trim().parse::<f64>().ok()?,
        Cell::Null => return None,
    };
    value.is_finite().then_some(value)
}

pub fn cell_to_i64(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Int(v) => Some(*v),
        Cell::Text(text) => text
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| cell_to_f64(cell).map(|v| v.round() as i64)),
        _ => cell_to_f64(cell).map(|v| v.round() as i64),
    }
}

/// Round half to even on the scaled value.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Trailing fixed-size window reduction.
///
/// Position `i` sees `values[i + 1 - window ..= i]`; the first
/// `window - 1` positions and any window containing a missing value are
/// `None`.
pub fn rolling<F>(values: &[Option<f64>], window: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut buf = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            buf.clear();
            for v in &values[i + 1 - window..=i] {
                buf.push((*v)?);
            }
            reduce(&buf)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_to_naive_date() {
        assert_eq!(int_to_naive_date(20240105).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!(int_to_naive_date(2024015).is_err());
        assert!(int_to_naive_date(20241305).is_err());
    }

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        for text in [
            "2024-02-29",
            "2024/02/29",
            "20240229",
            "2024-02-29 09:15:00",
            "2024-02-29T09:15:00",
            "2024-02-29T09:15:00+05:30",
            " 2024-02-29 ",
        ] {
            assert_eq!(parse_date_str(text).unwrap(), expected, "{}", text);
        }
        assert!(parse_date_str("2023-02-29").is_err());
        assert!(parse_date_str("not a date").is_err());
    }

    #[test]
    fn test_cell_to_date() {
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(cell_to_date(&Cell::Int(20240105)), Some(jan5));
        assert_eq!(cell_to_date(&Cell::Int(1704412800)), Some(jan5));
        assert_eq!(cell_to_date(&Cell::Float(1.0)), None);
        assert_eq!(cell_to_date(&Cell::Null), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(cell_to_f64(&Cell::Text(" 12.5".into())), Some(12.5));
        assert_eq!(cell_to_f64(&Cell::Int(3)), Some(3.0));
        assert_eq!(cell_to_f64(&Cell::Float(f64::NAN)), None);
        assert_eq!(cell_to_f64(&Cell::Float(f64::INFINITY)), None);
        assert_eq!(cell_to_f64(&Cell::Text("n/a".into())), None);
        assert_eq!(cell_to_i64(&Cell::Float(1500.0)), Some(1500));
        assert_eq!(cell_to_i64(&Cell::Text("42".into())), Some(42));
        assert_eq!(cell_to_i64(&Cell::Null), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to((105.0 - 100.0) / 100.0, 4), 0.05);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(-0.123456, 4), -0.1235);
    }

    #[test]
    fn test_sample_std_uses_bessel_correction() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138089935299395).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_rolling_window() {
        let values: Vec<Option<f64>> = (1..=5).map(|v| Some(v as f64)).collect();
        let out = rolling(&values, 3, mean);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);

        let gappy = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let out = rolling(&gappy, 2, mean);
        assert_eq!(out, vec![None, None, None, Some(3.5), Some(4.5)]);
    }
}
