use std::collections::HashSet;

use chrono::{Days, Local, NaiveDate};
use tracing::debug;

use super::sort_newest_first;
use crate::model::{ChainEntry, ChainResult, EntryKey};

/// Standard title-search lookback, in days.
pub const LOOKBACK_DAYS: u64 = 730;

/// Minimal newest-first run of vesting deeds reaching back past
/// `as_of - 730 days`. The newest vesting deed is always kept; older ones are
/// added until the last one added sits on or before the cutoff.
///
/// `as_of` defaults to today's local calendar date.
pub fn select_24_month_chain(entries: &[ChainEntry], as_of: Option<NaiveDate>) -> Vec<ChainEntry> {
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let mut vesting = entries
        .iter()
        .filter(|entry| entry.is_vesting)
        .cloned()
        .collect::<Vec<ChainEntry>>();
    if vesting.is_empty() {
        return Vec::new();
    }
    sort_newest_first(&mut vesting);

    let Some(cutoff) = as_of.checked_sub_days(Days::new(LOOKBACK_DAYS)) else {
        vesting.truncate(1);
        return vesting;
    };

    let mut kept = Vec::new();
    for deed in vesting {
        let reaches_cutoff = deed.date <= cutoff;
        kept.push(deed);
        if reaches_cutoff {
            break;
        }
    }

    debug!(%as_of, %cutoff, kept = kept.len(), "24-month chain selected");
    kept
}

impl ChainResult {
    pub fn from_entries(all: Vec<ChainEntry>, as_of: Option<NaiveDate>) -> Self {
        let kept = select_24_month_chain(&all, as_of);
        Self { kept, all }
    }

    /// Entries found but not kept, in `all` order.
    pub fn other(&self) -> Vec<&ChainEntry> {
        let kept = self.kept_keys();
        self.all
            .iter()
            .filter(|entry| !kept.contains(&entry.key()))
            .collect()
    }

    /// Moves the entry with `key` into the kept list. Returns false when no
    /// such entry exists or it is already kept. The 24-month rule is not
    /// re-checked.
    pub fn keep(&mut self, key: &EntryKey) -> bool {
        if self.kept_keys().contains(key) {
            return false;
        }
        let Some(entry) = self.all.iter().find(|entry| entry.key() == *key) else {
            return false;
        };

        self.kept.push(entry.clone());
        sort_newest_first(&mut self.kept);
        true
    }

    /// Moves the entry with `key` out of the kept list.
    pub fn release(&mut self, key: &EntryKey) -> bool {
        let before = self.kept.len();
        self.kept.retain(|entry| entry.key() != *key);
        self.kept.len() != before
    }

    fn kept_keys(&self) -> HashSet<EntryKey> {
        self.kept.iter().map(ChainEntry::key).collect()
    }
}
