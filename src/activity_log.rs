//! Session-scoped activity log

use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::cascade::Quote;

/// One confirmed selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLogEntry {
    pub segment: String,
    pub code: String,
    pub activity_label: String,
    pub points_per_unit: u64,
    pub count: u32,
    pub total_points: u64,
    pub added_at: DateTime<Local>,
}

impl From<&Quote> for ActivityLogEntry {
    fn from(quote: &Quote) -> Self {
        Self {
            segment: quote.segment.clone(),
            code: quote.code.clone(),
            activity_label: quote.activity_label.clone(),
            points_per_unit: quote.points_per_unit,
            count: quote.count,
            total_points: quote.total_points(),
            added_at: Local::now(),
        }
    }
}

/// Append-only list of entries, editable by deleting rows
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ActivityLog {
    entries: Vec<ActivityLogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Identical entries stay distinct rows.
    pub fn add(&mut self, entry: ActivityLogEntry) {
        self.entries.push(entry);
    }

    /// Remove every entry whose current position is in `indices`.
    ///
    /// Positions past the end are ignored. Returns how many entries were removed.
    pub fn delete_selected(&mut self, indices: &BTreeSet<usize>) -> usize {
        let before = self.entries.len();
        let mut position = 0;
        self.entries.retain(|_| {
            let keep = !indices.contains(&position);
            position += 1;
            keep
        });
        before - self.entries.len()
    }

    /// Sum of `total_points`; 0 for an empty log
    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.total_points))
    }

    pub fn entries(&self) -> &[ActivityLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
