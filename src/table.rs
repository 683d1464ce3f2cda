//! Board tables, before and after normalization.
//!
//! A [`RawTable`] is exactly what the board returned: string cells keyed by
//! column title. A [`Table`] holds canonical [`Record`]s with typed fields,
//! plus the set of optional columns the board actually carried.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

/// Sentinel for missing or unreadable text.
pub const UNKNOWN: &str = "Unknown";

/// One board fetch, untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column titles in first-seen order.
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    /// Build a table from rows of (title, text) pairs, collecting headers in
    /// first-seen order.
    pub fn from_rows(rows: Vec<Vec<(String, String)>>) -> Self {
        let mut table = RawTable::default();
        for row in rows {
            let mut cells = HashMap::with_capacity(row.len());
            for (title, text) in row {
                if !table.headers.contains(&title) {
                    table.headers.push(title.clone());
                }
                cells.insert(title, text);
            }
            table.rows.push(cells);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Cell text, empty when the row has no value for this column.
    pub fn cell<'a>(&'a self, row: usize, header: &str) -> &'a str {
        self.rows
            .get(row)
            .and_then(|r| r.get(header))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Canonical field names shared by every board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Item,
    Owner,
    Status,
    Group,
    Stage,
    Value,
    Date,
    Probability,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Item,
        Field::Owner,
        Field::Status,
        Field::Group,
        Field::Stage,
        Field::Value,
        Field::Date,
        Field::Probability,
    ];

    /// Fields every normalized table carries, filled with `"Unknown"` when
    /// the board lacks them.
    pub const REQUIRED: [Field; 5] = [
        Field::Item,
        Field::Status,
        Field::Value,
        Field::Group,
        Field::Owner,
    ];

    pub fn canonical(self) -> &'static str {
        match self {
            Field::Item => "Item",
            Field::Owner => "Owner",
            Field::Status => "Status",
            Field::Group => "Group",
            Field::Stage => "Stage",
            Field::Value => "Value",
            Field::Date => "Date",
            Field::Probability => "Probability",
        }
    }

    /// Parse a canonical name exactly as [`Field::canonical`] spells it.
    pub fn from_exact(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.canonical() == name)
    }

    /// Parse a canonical name, accepting the older aliases.
    pub fn from_canonical(name: &str) -> Option<Field> {
        match name {
            "Item" => Some(Field::Item),
            "Owner" => Some(Field::Owner),
            "Status" => Some(Field::Status),
            "Group" | "Sector" => Some(Field::Group),
            "Stage" => Some(Field::Stage),
            "Value" => Some(Field::Value),
            "Date" | "Target_Close" => Some(Field::Date),
            "Probability" | "Probability_Label" => Some(Field::Probability),
            _ => None,
        }
    }

    /// Fields that can be used as a grouping dimension.
    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Field::Item | Field::Owner | Field::Status | Field::Group | Field::Stage
        )
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Close-probability bucket as entered on the board.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityLabel {
    High,
    Medium,
    Low,
    Won,
    Lost,
    Other(String),
}

/// Score given to labels outside the known buckets.
pub const UNMAPPED_PROBABILITY_FLOOR: f64 = 0.1;

impl ProbabilityLabel {
    pub fn parse(text: &str) -> Option<ProbabilityLabel> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return None;
        }
        let label = match trimmed.to_lowercase().as_str() {
            "high" => ProbabilityLabel::High,
            "medium" | "med" => ProbabilityLabel::Medium,
            "low" => ProbabilityLabel::Low,
            "won" => ProbabilityLabel::Won,
            "lost" => ProbabilityLabel::Lost,
            _ => ProbabilityLabel::Other(trimmed.to_string()),
        };
        Some(label)
    }

    /// Estimated close probability in [0, 1].
    pub fn score(&self) -> f64 {
        match self {
            ProbabilityLabel::High => 0.8,
            ProbabilityLabel::Medium => 0.5,
            ProbabilityLabel::Low => 0.2,
            ProbabilityLabel::Won => 1.0,
            ProbabilityLabel::Lost => 0.0,
            ProbabilityLabel::Other(_) => UNMAPPED_PROBABILITY_FLOOR,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProbabilityLabel::High => "High",
            ProbabilityLabel::Medium => "Medium",
            ProbabilityLabel::Low => "Low",
            ProbabilityLabel::Won => "Won",
            ProbabilityLabel::Lost => "Lost",
            ProbabilityLabel::Other(s) => s,
        }
    }
}

/// One normalized board row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub item: String,
    pub owner: String,
    pub status: String,
    pub group: String,
    /// Present whenever the board has a stage column.
    pub stage: Option<String>,
    pub value: f64,
    pub date: Option<NaiveDate>,
    pub probability: Option<ProbabilityLabel>,
    pub probability_score: Option<f64>,
    /// `value × probability_score`, only when a probability was given.
    pub weighted_value: Option<f64>,
    /// Columns that did not map to a canonical field, by raw title.
    pub extra: BTreeMap<String, String>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            item: UNKNOWN.to_string(),
            owner: UNKNOWN.to_string(),
            status: UNKNOWN.to_string(),
            group: UNKNOWN.to_string(),
            stage: None,
            value: 0.0,
            date: None,
            probability: None,
            probability_score: None,
            weighted_value: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Record {
    /// Text of a categorical field, `None` for numeric/date fields or an
    /// absent stage.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Item => Some(&self.item),
            Field::Owner => Some(&self.owner),
            Field::Status => Some(&self.status),
            Field::Group => Some(&self.group),
            Field::Stage => self.stage.as_deref(),
            Field::Value | Field::Date | Field::Probability => None,
        }
    }

    /// Set the probability label and derive score and weighted value.
    pub fn set_probability(&mut self, label: Option<ProbabilityLabel>) {
        self.probability_score = label.as_ref().map(ProbabilityLabel::score);
        self.weighted_value = self.probability_score.map(|p| self.value * p);
        self.probability = label;
    }
}

/// An ordered set of records sharing one field set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub records: Vec<Record>,
    /// Canonical columns present on the board (or inserted as required).
    pub present: BTreeSet<Field>,
    /// Pass-through column titles in board order.
    pub extra_headers: Vec<String>,
}

impl Table {
    pub fn new(records: Vec<Record>, present: impl IntoIterator<Item = Field>) -> Self {
        Self {
            records,
            present: present.into_iter().collect(),
            extra_headers: Vec::new(),
        }
    }

    pub fn has(&self, field: Field) -> bool {
        self.present.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Render back into canonical headers, the inverse of normalization.
    pub fn to_raw(&self) -> RawTable {
        let mut headers: Vec<String> = Field::ALL
            .iter()
            .filter(|f| self.has(**f))
            .map(|f| f.canonical().to_string())
            .collect();
        headers.extend(self.extra_headers.iter().cloned());

        let rows = self
            .records
            .iter()
            .map(|r| {
                let mut cells = HashMap::new();
                for field in Field::ALL.iter().filter(|f| self.has(**f)) {
                    let text = match field {
                        Field::Value => r.value.to_string(),
                        Field::Date => r
                            .date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_default(),
                        Field::Probability => r
                            .probability
                            .as_ref()
                            .map(|p| p.as_str().to_string())
                            .unwrap_or_default(),
                        other => r.text(*other).unwrap_or_default().to_string(),
                    };
                    cells.insert(field.canonical().to_string(), text);
                }
                for (k, v) in &r.extra {
                    cells.insert(k.clone(), v.clone());
                }
                cells
            })
            .collect();

        RawTable { headers, rows }
    }
}
