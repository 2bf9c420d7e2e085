use std::collections::HashSet;

use crate::model::{ChainEntry, EntryKey};

/// Concatenates candidate lists in order and keeps the first entry seen for
/// each `(date_string, book_page, instrument)` key.
pub fn merge_candidates<I>(groups: I) -> Vec<ChainEntry>
where
    I: IntoIterator<Item = Vec<ChainEntry>>,
{
    let mut seen = HashSet::<EntryKey>::new();
    let mut merged = Vec::new();

    for entry in groups.into_iter().flatten() {
        if seen.insert(entry.key()) {
            merged.push(entry);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry(date_string: &str, grantor: &str, instrument: &str, book_page: &str) -> ChainEntry {
        ChainEntry {
            date: NaiveDate::parse_from_str(date_string, "%m/%d/%Y").expect("test date"),
            date_string: date_string.to_string(),
            grantor: grantor.to_string(),
            grantee: "GRANTEE".to_string(),
            instrument: instrument.to_string(),
            book_page: book_page.to_string(),
            remark: None,
            is_vesting: true,
            line: None,
        }
    }

    #[test]
    fn first_strategy_wins_on_key_collision() {
        let first = vec![entry("10/17/2024", "SOUTH CHERRY", "WARRANTY DEED", "1024-18978")];
        let second = vec![
            entry("10/17/2024", "S0UTH CHERRV", "WARRANTY DEED", "1024-18978"),
            entry("11/18/2021", "SHORT CREEK", "WARRANTY DEED", "979-60"),
        ];

        let merged = merge_candidates(vec![first, second]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].grantor, "SOUTH CHERRY");
        assert_eq!(merged[1].grantor, "SHORT CREEK");
    }

    #[test]
    fn differing_instrument_keeps_both_records() {
        let merged = merge_candidates(vec![vec![
            entry("10/17/2024", "A", "WARRANTY DEED", "1024-18978"),
            entry("10/17/2024", "A", "DEED OF TRUST", "1024-18978"),
        ]]);

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_groups_merge_to_nothing() {
        assert!(merge_candidates(Vec::<Vec<ChainEntry>>::new()).is_empty());
        assert!(merge_candidates(vec![Vec::new(), Vec::new()]).is_empty());
    }
}
