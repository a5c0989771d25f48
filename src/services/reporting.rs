use crate::models::stock::{columns, Comparison, Performer, PriceTable, Summary};
use crate::util;

/// 52-week style summary over every retained row.
///
/// Each field is `None` when the table is empty or its source column is
/// missing.
pub fn summarize(table: &PriceTable) -> Summary {
    if table.is_empty() {
        return Summary::empty();
    }

    let records = table.records();
    let high = table
        .has_column(columns::HIGH)
        .then(|| records.iter().filter_map(|r| r.high).reduce(f64::max))
        .flatten();
    let low = table
        .has_column(columns::LOW)
        .then(|| records.iter().filter_map(|r| r.low).reduce(f64::min))
        .flatten();
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();

    Summary {
        week_52_high: high.map(|v| util::round_to(v, 2)),
        week_52_low: low.map(|v| util::round_to(v, 2)),
        average_close: util::mean(&closes).map(|v| util::round_to(v, 2)),
    }
}

/// Compare two series by mean `Daily_Return`.
///
/// The first series is the better performer only when its mean is
/// strictly greater; equal means go to the second series.
pub fn compare(first: &PriceTable, second: &PriceTable) -> Comparison {
    if first.is_empty() || second.is_empty() {
        return Comparison::empty();
    }

    let avg_1 = mean_return(first);
    let avg_2 = mean_return(second);

    let better = match (avg_1, avg_2) {
        (Some(a), Some(b)) if a > b => Performer::Stock1,
        _ => Performer::Stock2,
    };

    Comparison {
        stock_1_avg_return: avg_1.map(|v| util::round_to(v, 4)),
        stock_2_avg_return: avg_2.map(|v| util::round_to(v, 4)),
        better_performer: Some(better),
    }
}

fn mean_return(table: &PriceTable) -> Option<f64> {
    let returns: Vec<f64> = table.records().iter().filter_map(|r| r.daily_return).collect();
    util::mean(&returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::DerivedRecord;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn record(day: u32, high: f64, low: f64, close: f64, daily_return: f64) -> DerivedRecord {
        DerivedRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            open: close,
            high: Some(high),
            low: Some(low),
            close,
            volume: None,
            extra: BTreeMap::new(),
            daily_return: Some(daily_return),
            ma_7: None,
            volatility: None,
        }
    }

    fn all_columns() -> Vec<String> {
        ["Date", "Open", "High", "Low", "Close", "Daily_Return"].iter().map(|s| s.to_string()).collect()
    }

    fn returns_table(returns: &[f64]) -> PriceTable {
        let records = returns
            .iter()
            .enumerate()
            .map(|(i, r)| record(i as u32 + 1, 1.0, 1.0, 1.0, *r))
            .collect();
        PriceTable::new(all_columns(), records)
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&PriceTable::default()), Summary::empty());
    }

    #[test]
    fn test_summarize_example() {
        let table = PriceTable::new(
            all_columns(),
            vec![
                record(1, 10.0, 5.0, 8.0, 0.0),
                record(2, 12.0, 6.0, 9.0, 0.0),
                record(3, 9.0, 4.0, 7.0, 0.0),
            ],
        );
        let summary = summarize(&table);
        assert_eq!(summary.week_52_high, Some(12.0));
        assert_eq!(summary.week_52_low, Some(4.0));
        assert_eq!(summary.average_close, Some(8.0));
    }

    #[test]
    fn test_summarize_missing_high_low_columns() {
        let columns = vec!["Date".to_string(), "Open".to_string(), "Close".to_string()];
        let table = PriceTable::new(columns, vec![record(1, 10.0, 5.0, 8.126, 0.0)]);
        let summary = summarize(&table);
        assert_eq!(summary.week_52_high, None);
        assert_eq!(summary.week_52_low, None);
        assert_eq!(summary.average_close, Some(8.13));
    }

    #[test]
    fn test_compare_empty() {
        assert_eq!(compare(&PriceTable::default(), &returns_table(&[0.01])), Comparison::empty());
        assert_eq!(compare(&returns_table(&[0.01]), &PriceTable::default()), Comparison::empty());
    }

    #[test]
    fn test_compare_first_better() {
        let result = compare(&returns_table(&[0.02, 0.04]), &returns_table(&[0.01]));
        assert_eq!(result.stock_1_avg_return, Some(0.03));
        assert_eq!(result.stock_2_avg_return, Some(0.01));
        assert_eq!(result.better_performer, Some(Performer::Stock1));
    }

    #[test]
    fn test_compare_second_better() {
        let result = compare(&returns_table(&[-0.01]), &returns_table(&[0.0]));
        assert_eq!(result.better_performer, Some(Performer::Stock2));
    }

    #[test]
    fn test_compare_tie_favors_second() {
        let result = compare(&returns_table(&[0.01, 0.01]), &returns_table(&[0.01]));
        assert_eq!(result.stock_1_avg_return, Some(0.01));
        assert_eq!(result.stock_2_avg_return, Some(0.01));
        assert_eq!(result.better_performer, Some(Performer::Stock2));
    }
}
