//! Session controller
//!
//! Owns the rule table handle, the current selection and the activity log.
//! Every user action maps to one method here and performs one state
//! transition; the UI re-renders from [`Session::current`] afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::activity_log::{ActivityLog, ActivityLogEntry};
use crate::cascade::{self, Resolution, Selection};
use crate::rules::RuleTable;

pub struct Session {
    table: Arc<RuleTable>,
    selection: Selection,
    log: ActivityLog,
}

impl Session {
    /// Start a session with the first segment and its first code selected
    pub fn new(table: Arc<RuleTable>) -> Self {
        let mut session = Self {
            table,
            selection: Selection::new(),
            log: ActivityLog::new(),
        };
        if let Some(first) = cascade::segments(&session.table).into_iter().next() {
            session.select_segment(&first);
        }
        session
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn segments(&self) -> Vec<String> {
        cascade::segments(&self.table)
    }

    pub fn codes(&self) -> Vec<String> {
        self.selection
            .segment()
            .map(|s| cascade::codes(&self.table, s))
            .unwrap_or_default()
    }

    /// Options for the activity dropdown, if the current code spans several
    pub fn activities(&self) -> Option<Vec<String>> {
        match (self.selection.segment(), self.selection.code()) {
            (Some(segment), Some(code)) => cascade::activities(&self.table, segment, code),
            _ => None,
        }
    }

    /// Options for the refinement prompt, if the current selection needs one
    pub fn refinements(&self) -> Option<Vec<String>> {
        let (Some(segment), Some(code)) = (self.selection.segment(), self.selection.code()) else {
            return None;
        };
        let activity = self.activities().and(self.selection.activity());
        cascade::refinements(&self.table, segment, code, activity)
    }

    /// Select a segment and default the code to its first option
    pub fn select_segment(&mut self, segment: &str) {
        tracing::debug!(segment, "Segment selected");
        self.selection.set_segment(segment);
        if let Some(first) = self.codes().into_iter().next() {
            self.select_code(&first);
        }
    }

    /// Select a code and default the activity to its first option
    pub fn select_code(&mut self, code: &str) {
        tracing::debug!(code, "Code selected");
        self.selection.set_code(code);
        if let Some(first) = self.activities().and_then(|a| a.into_iter().next()) {
            self.selection.set_activity(first);
        }
    }

    pub fn select_activity(&mut self, activity: &str) {
        tracing::debug!(activity, "Activity selected");
        self.selection.set_activity(activity);
    }

    pub fn select_refinement(&mut self, refinement: &str) {
        tracing::debug!(refinement, "Refinement selected");
        self.selection.set_refinement(refinement);
    }

    pub fn set_count(&mut self, count: u32) {
        self.selection.set_count(count);
    }

    /// Move the count by `delta`, never below one
    pub fn step_count(&mut self, delta: i64) {
        let next = (i64::from(self.selection.count()) + delta).clamp(1, i64::from(u32::MAX));
        self.selection.set_count(next as u32);
    }

    /// The always-current evaluation of the selection
    pub fn current(&self) -> Resolution {
        cascade::resolve(&self.table, &self.selection)
    }

    /// Append the current quote to the log. Returns `None` while unresolved.
    pub fn add_current(&mut self) -> Option<&ActivityLogEntry> {
        let Resolution::Resolved(quote) = self.current() else {
            return None;
        };
        let entry = ActivityLogEntry::from(&quote);
        tracing::info!(
            segment = %entry.segment,
            code = %entry.code,
            points = entry.points_per_unit,
            count = entry.count,
            total = entry.total_points,
            "Added to activity log"
        );
        self.log.add(entry);
        self.log.entries().last()
    }

    pub fn delete_selected(&mut self, indices: &BTreeSet<usize>) -> usize {
        let removed = self.log.delete_selected(indices);
        tracing::info!(
            requested = indices.len(),
            removed,
            remaining = self.log.len(),
            "Deleted from activity log"
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "Segment,Code,Sub-category,Points\n\
                         Service,S1,,10\n\
                         ,S2,A,5\n\
                         ,,B,8\n\
                         Sales,P1,,20\n";

    fn session() -> Session {
        let table = RuleTable::from_reader(RULES.as_bytes()).unwrap();
        Session::new(Arc::new(table))
    }

    #[test]
    fn test_new_session_preselects_first_options() {
        let session = session();
        assert_eq!(session.selection().segment(), Some("Service"));
        assert_eq!(session.selection().code(), Some("S1"));
        assert!(session.log().is_empty());
        assert!(matches!(session.current(), Resolution::Resolved(_)));
    }

    #[test]
    fn test_scenario_sub_category_then_add() {
        let mut session = session();

        session.select_code("S1");
        match session.current() {
            Resolution::Resolved(q) => assert_eq!(q.points_per_unit, 10),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(session.refinements(), None);

        session.select_code("S2");
        assert_eq!(
            session.refinements(),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        assert!(session.add_current().is_none());

        session.select_refinement("B");
        session.set_count(3);
        let entry = session.add_current().cloned().unwrap();
        assert_eq!(entry.total_points, 24);
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.log().total(), 24);
    }

    #[test]
    fn test_activity_defaults_to_first_and_narrows_sub_categories() {
        let table = RuleTable::from_reader(
            "Segment,Code,Activity,Sub-category,Points\n\
             Service,S1,Visit,A,10\n\
             ,,,B,12\n\
             ,,Call,,5\n"
                .as_bytes(),
        )
        .unwrap();
        let mut session = Session::new(Arc::new(table));

        assert_eq!(
            session.activities(),
            Some(vec!["Visit".to_string(), "Call".to_string()])
        );
        assert_eq!(session.selection().activity(), Some("Visit"));
        assert_eq!(
            session.refinements(),
            Some(vec!["A".to_string(), "B".to_string()])
        );

        session.select_activity("Call");
        assert_eq!(session.refinements(), None);
        let entry = session.add_current().cloned().unwrap();
        assert_eq!(entry.activity_label, "Call");
        assert_eq!(entry.total_points, 5);
    }

    #[test]
    fn test_select_segment_defaults_code() {
        let mut session = session();
        session.select_segment("Sales");
        assert_eq!(session.selection().code(), Some("P1"));
        assert_eq!(session.codes(), vec!["P1"]);
    }

    #[test]
    fn test_step_count_floor() {
        let mut session = session();
        session.step_count(-5);
        assert_eq!(session.selection().count(), 1);
        session.step_count(4);
        assert_eq!(session.selection().count(), 5);
    }

    #[test]
    fn test_delete_selected_recomputes_total() {
        let mut session = session();
        session.add_current();
        session.set_count(2);
        session.add_current();
        assert_eq!(session.log().total(), 30);

        assert_eq!(session.delete_selected(&BTreeSet::from([0, 7])), 1);
        assert_eq!(session.log().total(), 20);
    }
}
