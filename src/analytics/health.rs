//! Advisory data-quality checks. Never blocks an answer.

use crate::table::{Field, Table, UNKNOWN};

/// Human-readable warnings about the board's data.
pub fn data_health(table: &Table) -> Vec<String> {
    let mut issues = Vec::new();

    let total: f64 = table.records.iter().map(|r| r.value).sum();
    if total == 0.0 {
        issues.push("Total value is 0. The value column may be unmapped or empty.".to_string());
    }

    if table.has(Field::Date) {
        let missing = table.records.iter().filter(|r| r.date.is_none()).count();
        if missing > 0 {
            issues.push(format!("{} records are missing a target close date.", missing));
        }
    }

    let no_status = table.records.iter().filter(|r| r.status == UNKNOWN).count();
    if no_status > 0 {
        issues.push(format!("{} records have no status.", no_status));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;

    #[test]
    fn test_zero_value_and_missing_dates() {
        let mut present = Field::REQUIRED.to_vec();
        present.push(Field::Date);
        let t = Table::new(
            vec![
                Record {
                    status: "Open".into(),
                    ..Default::default()
                },
                Record {
                    status: "Open".into(),
                    date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
                    ..Default::default()
                },
            ],
            present,
        );
        let issues = data_health(&t);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].starts_with("Total value is 0"));
        assert_eq!(issues[1], "1 records are missing a target close date.");
    }

    #[test]
    fn test_no_date_column_no_date_warning() {
        let t = Table::new(
            vec![Record {
                status: "Open".into(),
                value: 10.0,
                ..Default::default()
            }],
            Field::REQUIRED,
        );
        assert!(data_health(&t).is_empty());
    }

    #[test]
    fn test_unknown_status_warning() {
        let t = Table::new(
            vec![Record {
                value: 10.0,
                ..Default::default()
            }],
            Field::REQUIRED,
        );
        assert_eq!(data_health(&t), vec!["1 records have no status.".to_string()]);
    }
}
