//! Selection cascade: segment, then code, then optional activity and
//! refinement levels
//!
//! Each level narrows the rule table. Once segment and code are chosen the
//! cascade lands on exactly one row, either automatically or after the
//! activity and refinement (sub-category) prompts.

use serde::Serialize;

use crate::error::RuleError;
use crate::rules::{RuleRow, RuleTable};

/// Current user choices at every level of the cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    segment: Option<String>,
    code: Option<String>,
    activity: Option<String>,
    refinement: Option<String>,
    count: u32,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            segment: None,
            code: None,
            activity: None,
            refinement: None,
            count: 1,
        }
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn activity(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    pub fn refinement(&self) -> Option<&str> {
        self.refinement.as_deref()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Picking a segment invalidates everything below it
    pub fn set_segment(&mut self, segment: impl Into<String>) {
        self.segment = Some(segment.into());
        self.code = None;
        self.activity = None;
        self.refinement = None;
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = Some(code.into());
        self.activity = None;
        self.refinement = None;
    }

    pub fn set_activity(&mut self, activity: impl Into<String>) {
        self.activity = Some(activity.into());
        self.refinement = None;
    }

    pub fn set_refinement(&mut self, refinement: impl Into<String>) {
        self.refinement = Some(refinement.into());
    }

    /// Counts below one never reach the multiplication
    pub fn set_count(&mut self, count: u32) {
        self.count = count.max(1);
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully resolved rule row together with the repetition count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub segment: String,
    pub code: String,
    pub activity_label: String,
    pub points_raw: Option<String>,
    pub points_per_unit: u64,
    pub count: u32,
}

impl Quote {
    fn from_row(row: &RuleRow, count: u32) -> Self {
        Self {
            segment: row.segment.clone(),
            code: row.code.clone(),
            activity_label: row.activity_label(),
            points_raw: row.points_raw.clone(),
            points_per_unit: row.points,
            count,
        }
    }

    pub fn total_points(&self) -> u64 {
        self.points_per_unit.saturating_mul(u64::from(self.count))
    }
}

/// Outcome of evaluating a selection against the rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Segment or code not chosen yet, or no longer present in the table
    Unselected,
    /// The code covers several activities; the user must pick one of these
    NeedsActivity(Vec<String>),
    /// Several rows match; the user must pick one of these
    NeedsRefinement(Vec<String>),
    Resolved(Quote),
}

/// Push `value` unless already present, keeping first-seen order
fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Distinct non-blank segments in first-seen order
pub fn segments(table: &RuleTable) -> Vec<String> {
    let mut out = Vec::new();
    for row in table.rows() {
        if !row.segment.trim().is_empty() {
            push_unique(&mut out, &row.segment);
        }
    }
    out
}

/// Distinct codes within a segment in first-seen order
pub fn codes(table: &RuleTable, segment: &str) -> Vec<String> {
    let mut out = Vec::new();
    for row in table.rows().iter().filter(|r| r.segment == segment) {
        if !row.code.trim().is_empty() {
            push_unique(&mut out, &row.code);
        }
    }
    out
}

/// Rows under a segment+code, narrowed to one activity when given
fn matching_rows<'a>(
    table: &'a RuleTable,
    segment: &'a str,
    code: &'a str,
    activity: Option<&'a str>,
) -> impl Iterator<Item = &'a RuleRow> + 'a {
    table.rows().iter().filter(move |r| {
        r.segment == segment
            && r.code == code
            && activity.map_or(true, |a| r.activity.as_deref() == Some(a))
    })
}

/// Activity options, or `None` when the code needs no activity prompt.
///
/// Only tables with both an activity and a sub-category column have this
/// level, and a prompt is needed only when the code spans more than one
/// distinct activity.
pub fn activities(table: &RuleTable, segment: &str, code: &str) -> Option<Vec<String>> {
    if !table.has_activity_level() {
        return None;
    }

    let mut out = Vec::new();
    for row in matching_rows(table, segment, code, None) {
        if let Some(activity) = row.activity.as_deref() {
            push_unique(&mut out, activity);
        }
    }

    if out.len() > 1 {
        Some(out)
    } else {
        None
    }
}

/// Refinement options, or `None` when the selection needs no prompt.
///
/// `activity` narrows the rows first; pass the chosen activity when
/// [`activities`] asked for one. A prompt is needed only when more than one
/// row matches and at least one of them carries a non-blank refinement value.
pub fn refinements(
    table: &RuleTable,
    segment: &str,
    code: &str,
    activity: Option<&str>,
) -> Option<Vec<String>> {
    let level = table.refinement();
    let rows: Vec<&RuleRow> = matching_rows(table, segment, code, activity).collect();
    if rows.len() <= 1 {
        return None;
    }

    let mut out = Vec::new();
    for row in rows {
        if let Some(value) = row.refinement(level) {
            push_unique(&mut out, value);
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Evaluate a selection. Pure and cheap; callers re-run it after every change.
pub fn resolve(table: &RuleTable, selection: &Selection) -> Resolution {
    let (Some(segment), Some(code)) = (selection.segment(), selection.code()) else {
        return Resolution::Unselected;
    };

    let activity = match activities(table, segment, code) {
        None => None,
        Some(options) => match selection.activity() {
            Some(choice) if options.iter().any(|o| o == choice) => Some(choice),
            _ => return Resolution::NeedsActivity(options),
        },
    };

    let row = match refinements(table, segment, code, activity) {
        None => matching_rows(table, segment, code, activity).next(),
        Some(options) => {
            let level = table.refinement();
            let chosen = selection.refinement().and_then(|choice| {
                matching_rows(table, segment, code, activity)
                    .find(|r| r.refinement(level) == Some(choice))
            });
            match chosen {
                Some(row) => Some(row),
                None => return Resolution::NeedsRefinement(options),
            }
        }
    };

    match row {
        Some(row) => Resolution::Resolved(Quote::from_row(row, selection.count())),
        None => Resolution::Unselected,
    }
}

/// Resolve a one-shot selection given by name, as the command line does.
///
/// Unlike [`resolve`], every problem is reported as an error naming the
/// valid choices.
pub fn quote(
    table: &RuleTable,
    segment: &str,
    code: &str,
    activity: Option<&str>,
    refinement: Option<&str>,
    count: u32,
) -> Result<Quote, RuleError> {
    if !segments(table).iter().any(|s| s == segment) {
        return Err(RuleError::UnknownSegment(segment.to_string()));
    }
    if !codes(table, segment).iter().any(|c| c == code) {
        return Err(RuleError::UnknownCode {
            segment: segment.to_string(),
            code: code.to_string(),
        });
    }

    let mut selection = Selection::new();
    selection.set_segment(segment);
    selection.set_code(code);
    selection.set_count(count);
    if let Some(choice) = activity {
        selection.set_activity(choice);
    }
    if let Some(choice) = refinement {
        selection.set_refinement(choice);
    }

    match resolve(table, &selection) {
        Resolution::Resolved(quote) => Ok(quote),
        Resolution::NeedsActivity(options) => match activity {
            None => Err(RuleError::ActivityRequired { options }),
            Some(choice) => Err(RuleError::UnknownActivity {
                choice: choice.to_string(),
                options,
            }),
        },
        Resolution::NeedsRefinement(options) => match refinement {
            None => Err(RuleError::RefinementRequired { options }),
            Some(choice) => Err(RuleError::UnknownRefinement {
                choice: choice.to_string(),
                options,
            }),
        },
        Resolution::Unselected => Err(RuleError::UnknownCode {
            segment: segment.to_string(),
            code: code.to_string(),
        }),
    }
}
