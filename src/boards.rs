//! Static board configuration.
//!
//! Each board declares the keywords that route a question to it and the
//! exact raw-header → canonical-field mapping for its columns. The table is
//! declared in routing order: the first board whose keywords match wins.

#[derive(Debug)]
pub struct BoardConfig {
    /// Logical key, also used in `Config::boards`.
    pub key: &'static str,
    pub name: &'static str,
    /// Environment variable holding the board id.
    pub env_var: &'static str,
    pub keywords: &'static [&'static str],
    /// Raw column title → canonical field name. When several titles map to
    /// the same field, the first one present on the board wins.
    pub columns: &'static [(&'static str, &'static str)],
}

impl BoardConfig {
    /// True if any routing keyword occurs in the (already lower-cased) text.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Board used when no keyword matches.
pub const FALLBACK_BOARD: &str = "deals";

pub static BOARDS: &[BoardConfig] = &[
    BoardConfig {
        key: "deals",
        name: "Sales Pipeline",
        env_var: "MONDAY_BOARD_ID_DEALS",
        keywords: &["pipeline", "sales", "deal", "revenue", "forecast", "close"],
        columns: &[
            ("Deal Name", "Item"),
            ("Name", "Item"),
            ("Owner code", "Owner"),
            ("Deal Status", "Status"),
            ("Masked Deal value", "Value"),
            ("Tentative Close Date", "Date"),
            ("Sector/service", "Group"),
            ("Deal Stage", "Stage"),
            ("Closure Probability", "Probability"),
        ],
    },
    BoardConfig {
        key: "work_orders",
        name: "Work Orders",
        env_var: "MONDAY_BOARD_ID_WORK_ORDERS",
        keywords: &[
            "work",
            "order",
            "execution",
            "project",
            "delivery",
            "operational",
        ],
        columns: &[
            ("Deal name masked", "Item"),
            ("Name", "Item"),
            ("BD/KAM Personnel code", "Owner"),
            ("Execution Status", "Status"),
            ("Amount in Rupees (Excl of GST) (Masked)", "Value"),
            ("Probable End Date", "Date"),
            ("Sector", "Group"),
            ("Nature of Work", "Stage"),
        ],
    },
];

/// Look up a board by its logical key.
pub fn board_by_key(key: &str) -> Option<&'static BoardConfig> {
    BOARDS.iter().find(|b| b.key == key)
}

/// The designated fallback board.
pub fn fallback_board() -> &'static BoardConfig {
    board_by_key(FALLBACK_BOARD).unwrap_or(&BOARDS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_keys_are_unique() {
        for (i, a) in BOARDS.iter().enumerate() {
            for b in &BOARDS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_fallback_is_deals() {
        assert_eq!(fallback_board().name, "Sales Pipeline");
    }

    #[test]
    fn test_matches_uses_substrings() {
        let wo = board_by_key("work_orders").unwrap();
        assert!(wo.matches("which work orders are done"));
        assert!(!wo.matches("revenue by sector"));
    }
}
