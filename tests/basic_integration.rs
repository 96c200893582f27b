// Library-level integration tests: rule table to session to export

use std::collections::BTreeSet;
use std::sync::Arc;

use contest_points::export::{self, LogTable};
use contest_points::{Resolution, RuleTable, Session};

const RULES: &str = "\
Segment,Code,Sub-category,Points
Service,S1,,10
,S2,A,5
,,B,8
Outreach,O1,,per member
";

fn session() -> Session {
    let table = RuleTable::from_reader(RULES.as_bytes()).expect("rule table should parse");
    Session::new(Arc::new(table))
}

#[test]
fn test_sub_category_selection_and_total() {
    let mut session = session();
    session.select_segment("Service");
    session.select_code("S2");

    match session.current() {
        Resolution::NeedsRefinement(options) => assert_eq!(options, vec!["A", "B"]),
        other => panic!("expected a sub-category prompt, got {:?}", other),
    }

    session.select_refinement("B");
    session.set_count(3);
    let entry = session.add_current().expect("selection should resolve");
    assert_eq!(entry.points_per_unit, 8);
    assert_eq!(entry.total_points, 24);
    assert_eq!(session.log().total(), 24);
}

#[test]
fn test_add_and_delete_keep_total_consistent() {
    let mut session = session();
    session.select_segment("Service");
    session.select_code("S1");
    session.set_count(2);
    session.add_current();

    session.select_code("S2");
    session.select_refinement("A");
    session.set_count(1);
    session.add_current();

    session.select_segment("Outreach");
    session.add_current();

    assert_eq!(session.log().len(), 3);
    assert_eq!(session.log().total(), 25);

    let removed = session.delete_selected(&BTreeSet::from([0, 7]));
    assert_eq!(removed, 1);
    assert_eq!(session.log().total(), 5);
    assert_eq!(session.log().entries()[0].code, "S2");
}

#[test]
fn test_non_numeric_points_count_as_zero() {
    let mut session = session();
    session.select_segment("Outreach");
    session.set_count(5);
    let entry = session.add_current().expect("selection should resolve");
    assert_eq!(entry.total_points, 0);
}

#[test]
fn test_empty_log_has_nothing_to_export() {
    let session = session();
    assert_eq!(session.log().total(), 0);

    let table = LogTable::from_log(session.log());
    assert!(table.is_empty());
    assert!(export::render_text(&table).is_none());
    assert!(export::render_image(&table).is_err());
}

#[test]
fn test_text_export_lists_every_entry() {
    let mut session = session();
    session.select_segment("Service");
    session.select_code("S1");
    session.add_current();
    session.set_count(3);
    session.add_current();

    let text = export::render_text(&LogTable::from_log(session.log())).unwrap();
    assert_eq!(text.lines().filter(|l| l.contains("S1")).count(), 2);
    assert!(text.trim_end().ends_with("Total Points: 40"));
}

#[test]
fn test_activity_level_reaches_every_row() {
    let table = RuleTable::from_reader(
        "Segment,Code,Activity,Sub-category,Points\n\
         Service,S1,Visit,A,10\n\
         ,,,B,12\n\
         ,,Call,,5\n\
         ,S2,Meeting,,3\n"
            .as_bytes(),
    )
    .expect("rule table should parse");
    let mut session = Session::new(Arc::new(table));

    // Visit is preselected and still needs its sub-category
    assert!(matches!(
        session.current(),
        Resolution::NeedsRefinement(_)
    ));
    session.select_refinement("B");
    session.add_current().expect("Visit / B should resolve");

    session.select_activity("Call");
    session.add_current().expect("Call should resolve");

    session.select_code("S2");
    assert_eq!(session.activities(), None);
    assert_eq!(session.refinements(), None);
    session.add_current().expect("S2 should resolve");

    let labels: Vec<_> = session
        .log()
        .entries()
        .iter()
        .map(|e| e.activity_label.as_str())
        .collect();
    assert_eq!(labels, vec!["Visit / B", "Call", "Meeting"]);
    assert_eq!(session.log().total(), 12 + 5 + 3);
}
