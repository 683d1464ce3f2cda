//! Board data normalization.
//!
//! Renames board column titles to canonical fields, coerces values and
//! dates, and fills required fields with `"Unknown"`. Never fails: a bad
//! cell degrades to a default so one malformed row cannot block the rest.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::table::{Field, ProbabilityLabel, RawTable, Record, Table, UNKNOWN};

/// Day-first formats are tried before ISO-like ones.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%d-%m-%y",
    "%d/%m/%y",
    "%d.%m.%y",
];

/// Years below this came from a two-digit field read as `%Y`.
const MIN_YEAR: i32 = 1000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
];

const CURRENCY_CHARS: &[char] = &['$', '₹', '€', '£', ','];

/// Normalize a raw board fetch using a board's column mapping.
///
/// A header spelled exactly as a canonical field wins, then an alias such as
/// `Sector`, then the first mapped title present. Every other column passes
/// through unchanged into `Record::extra`.
pub fn normalize(raw: &RawTable, mapping: &[(&str, &str)]) -> Table {
    // Trimmed title → original key in the row maps.
    let titles: Vec<(String, &str)> = raw
        .headers
        .iter()
        .map(|h| (h.trim().to_string(), h.as_str()))
        .collect();

    let mut sources: HashMap<Field, &str> = HashMap::new();
    for (trimmed, original) in &titles {
        if let Some(field) = Field::from_exact(trimmed) {
            sources.entry(field).or_insert(*original);
        }
    }
    for (trimmed, original) in &titles {
        if let Some(field) = Field::from_canonical(trimmed) {
            sources.entry(field).or_insert(*original);
        }
    }
    for (raw_title, canonical) in mapping {
        let Some(field) = Field::from_canonical(canonical) else {
            log::warn!("Mapping for '{}' targets unknown field '{}'", raw_title, canonical);
            continue;
        };
        if sources.contains_key(&field) {
            continue;
        }
        if let Some((_, original)) = titles.iter().find(|(t, _)| t.as_str() == *raw_title) {
            sources.insert(field, *original);
        }
    }

    let extra_headers: Vec<(String, &str)> = titles
        .iter()
        .filter(|(_, original)| !sources.values().any(|s| s == original))
        .cloned()
        .collect();

    let mut coerced_values = 0usize;
    let mut unparsed_dates = 0usize;
    let mut records = Vec::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let cell = |field: Field| {
            sources
                .get(&field)
                .map(|key| row.get(*key).map(String::as_str).unwrap_or(""))
        };

        let mut record = Record {
            item: cell(Field::Item).map(clean_text).unwrap_or_else(unknown),
            owner: cell(Field::Owner).map(clean_text).unwrap_or_else(unknown),
            status: cell(Field::Status).map(clean_text).unwrap_or_else(unknown),
            group: cell(Field::Group).map(clean_text).unwrap_or_else(unknown),
            stage: cell(Field::Stage).map(clean_text),
            ..Default::default()
        };

        if let Some(text) = cell(Field::Value) {
            match parse_value(text) {
                Some(v) => record.value = v,
                None => {
                    if !text.trim().is_empty() {
                        coerced_values += 1;
                    }
                }
            }
        }

        if let Some(text) = cell(Field::Date) {
            record.date = parse_date(text);
            if record.date.is_none() && !text.trim().is_empty() {
                unparsed_dates += 1;
            }
        }

        if let Some(text) = cell(Field::Probability) {
            record.set_probability(ProbabilityLabel::parse(text));
        }

        record.extra = extra_headers
            .iter()
            .map(|(trimmed, original)| {
                let text = row.get(*original).cloned().unwrap_or_default();
                (trimmed.clone(), text)
            })
            .collect::<BTreeMap<_, _>>();

        records.push(record);
    }

    if coerced_values > 0 || unparsed_dates > 0 {
        log::debug!(
            "Normalized {} rows: {} values coerced to 0, {} dates unparseable",
            records.len(),
            coerced_values,
            unparsed_dates
        );
    }

    let mut present: Vec<Field> = sources.keys().copied().collect();
    present.extend(Field::REQUIRED);

    let mut table = Table::new(records, present);
    table.extra_headers = extra_headers.into_iter().map(|(t, _)| t).collect();
    table
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Trim, and map blanks and the literal "nan" to `"Unknown"`.
pub fn clean_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a money cell such as `"$1,200"`, `"₹ 264,398.08"` or `"489360"`.
///
/// Returns `None` for anything that is not a finite number. Negative
/// amounts clamp to 0.
pub fn parse_value(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| !CURRENCY_CHARS.contains(c) && !c.is_whitespace())
        .collect();
    let lowered = stripped.to_lowercase();
    let number = lowered
        .strip_prefix("inr")
        .or_else(|| lowered.strip_prefix("rs."))
        .or_else(|| lowered.strip_prefix("rs"))
        .unwrap_or(lowered.as_str());
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.max(0.0))
}

/// Parse a date cell, accepting day-first and ISO-like layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let plausible = |d: &NaiveDate| d.year() >= MIN_YEAR;
    let date = DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .find(plausible);
    if date.is_some() {
        return date;
    }
    let datetime = DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .find(plausible);
    if datetime.is_some() {
        return datetime;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
        .filter(plausible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::board_by_key;

    fn raw(rows: Vec<Vec<(&str, &str)>>) -> RawTable {
        RawTable::from_rows(
            rows.into_iter()
                .map(|r| {
                    r.into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn test_value_coercion_scenario() {
        let table = normalize(&raw(vec![vec![("Value", "1,200")], vec![("Value", "abc")]]), &[]);
        let values: Vec<f64> = table.records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1200.0, 0.0]);
    }

    #[test]
    fn test_parse_value_formats() {
        assert_eq!(parse_value("489360"), Some(489360.0));
        assert_eq!(parse_value("264,398.08"), Some(264398.08));
        assert_eq!(parse_value("$ 1,000"), Some(1000.0));
        assert_eq!(parse_value("₹12,50,000"), Some(1250000.0));
        assert_eq!(parse_value("Rs. 500"), Some(500.0));
        assert_eq!(parse_value("-20"), Some(0.0));
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value("inf"), None);
    }

    #[test]
    fn test_parse_date_day_first_and_iso() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 26).unwrap();
        assert_eq!(parse_date("26-02-2026"), Some(d));
        assert_eq!(parse_date("26/02/2026"), Some(d));
        assert_eq!(parse_date("2026-02-26"), Some(d));
        assert_eq!(parse_date("2026-02-26 14:30:00"), Some(d));
        assert_eq!(parse_date("2026-02-26T10:00:00+05:30"), Some(d));
        assert_eq!(parse_date("26 Feb 2026"), Some(d));
        // Ambiguous dates read day-first.
        assert_eq!(parse_date("03-04-2026"), NaiveDate::from_ymd_opt(2026, 4, 3));
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_date_two_digit_year() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 26);
        assert_eq!(parse_date("26-02-26"), d);
        assert_eq!(parse_date("26/02/26"), d);
        assert_eq!(parse_date("26.02.26"), d);
        assert_eq!(parse_date("0026-02-26"), None);
    }

    #[test]
    fn test_mapping_renames_and_passes_through() {
        let deals = board_by_key("deals").unwrap();
        let table = normalize(
            &raw(vec![vec![
                ("Name", "Acme renewal"),
                ("Deal Status", " Open "),
                ("Masked Deal value", "$5,000"),
                ("Sector/service", "Mining"),
                ("Deal Stage", "B. Proposal"),
                ("Closure Probability", "High"),
                ("Tentative Close Date", "01-03-2026"),
                ("Region", "West"),
            ]]),
            deals.columns,
        );
        let r = &table.records[0];
        assert_eq!(r.item, "Acme renewal");
        assert_eq!(r.status, "Open");
        assert_eq!(r.group, "Mining");
        assert_eq!(r.owner, UNKNOWN);
        assert_eq!(r.stage.as_deref(), Some("B. Proposal"));
        assert_eq!(r.value, 5000.0);
        assert_eq!(r.weighted_value, Some(4000.0));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(r.extra.get("Region").map(String::as_str), Some("West"));
        assert!(table.has(Field::Stage));
        assert!(table.has(Field::Owner));
        assert_eq!(table.extra_headers, vec!["Region"]);
    }

    #[test]
    fn test_first_present_mapping_wins() {
        let deals = board_by_key("deals").unwrap();
        let table = normalize(
            &raw(vec![vec![("Name", "item-42"), ("Deal Name", "Big Deal")]]),
            deals.columns,
        );
        assert_eq!(table.records[0].item, "Big Deal");
        assert_eq!(table.records[0].extra.get("Name").map(String::as_str), Some("item-42"));
    }

    #[test]
    fn test_required_fields_get_sentinel() {
        let table = normalize(&raw(vec![vec![("Colour", "red")]]), &[]);
        for field in Field::REQUIRED {
            assert!(table.has(field), "{field} missing");
        }
        assert!(!table.has(Field::Stage));
        assert!(!table.has(Field::Date));
        let r = &table.records[0];
        assert_eq!(r.status, UNKNOWN);
        assert_eq!(r.value, 0.0);
        assert_eq!(r.stage, None);
    }

    #[test]
    fn test_text_cleaning() {
        let table = normalize(
            &raw(vec![
                vec![("Status", "nan"), ("Owner", "  OW_7 ")],
                vec![("Status", "")],
            ]),
            &[],
        );
        assert_eq!(table.records[0].status, UNKNOWN);
        assert_eq!(table.records[0].owner, "OW_7");
        assert_eq!(table.records[1].status, UNKNOWN);
        assert_eq!(table.records[1].owner, UNKNOWN);
    }

    #[test]
    fn test_headers_are_trimmed_before_mapping() {
        let table = normalize(
            &raw(vec![vec![(" Deal Status ", "Won")]]),
            &[("Deal Status", "Status")],
        );
        assert_eq!(table.records[0].status, "Won");
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let table = normalize(&raw(vec![vec![("Date", "next week")]]), &[]);
        assert!(table.has(Field::Date));
        assert_eq!(table.records[0].date, None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let deals = board_by_key("deals").unwrap();
        let first = normalize(
            &raw(vec![
                vec![
                    ("Name", "a"),
                    ("Deal Name", "Alpha"),
                    ("Masked Deal value", "1,234.5"),
                    ("Tentative Close Date", "15-01-2026"),
                    ("Closure Probability", "Medium"),
                    ("Deal Stage", ""),
                    ("Notes", "call back"),
                ],
                vec![
                    ("Name", "b"),
                    ("Masked Deal value", "oops"),
                    ("Tentative Close Date", "bad"),
                    ("Closure Probability", "Perhaps"),
                ],
            ]),
            deals.columns,
        );
        let second = normalize(&first.to_raw(), deals.columns);
        assert_eq!(first.records, second.records);
        assert_eq!(first.present, second.present);
    }

    #[test]
    fn test_canonical_header_beats_alias() {
        let first = normalize(&raw(vec![vec![("Sector", "Mining"), ("Group", "Top")]]), &[]);
        assert_eq!(first.records[0].group, "Top");
        assert_eq!(first.records[0].extra.get("Sector").map(String::as_str), Some("Mining"));

        let second = normalize(&first.to_raw(), &[]);
        assert_eq!(first.records, second.records);
    }
}
