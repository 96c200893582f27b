//! Rule table loading
//!
//! The contest rule sheet lists each segment and code only on the first row of
//! its group and leaves the cells below blank. Loading forward-fills every
//! column so each row stands on its own, then derives the numeric points.
//! Activity and sub-category only fill down within one segment+code group.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, RuleError};
use crate::points::extract_points;

/// One row of the rule table after forward-fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRow {
    pub segment: String,
    pub code: String,
    pub activity: Option<String>,
    pub sub_category: Option<String>,
    pub points_raw: Option<String>,
    pub points: u64,
}

impl RuleRow {
    /// Value of the third cascade level for this row, if any
    pub fn refinement(&self, level: Refinement) -> Option<&str> {
        match level {
            Refinement::SubCategory => self.sub_category.as_deref(),
            Refinement::Activity => self.activity.as_deref(),
            Refinement::None => None,
        }
    }

    /// Human label for the log: activity, then sub-category, falling back to the code
    pub fn activity_label(&self) -> String {
        match (self.activity.as_deref(), self.sub_category.as_deref()) {
            (Some(activity), Some(sub)) if activity != sub => format!("{} / {}", activity, sub),
            (Some(activity), _) => activity.to_string(),
            (None, Some(sub)) => sub.to_string(),
            (None, None) => self.code.clone(),
        }
    }
}

/// Which column refines a segment+code (+activity) selection into a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    SubCategory,
    Activity,
    None,
}

impl Refinement {
    pub fn label(&self) -> &'static str {
        match self {
            Refinement::SubCategory => "Sub-category",
            Refinement::Activity => "Activity",
            Refinement::None => "-",
        }
    }
}

/// Header positions resolved from the CSV header row
#[derive(Debug)]
struct Columns {
    segment: usize,
    code: usize,
    activity: Option<usize>,
    sub_category: Option<usize>,
    points: usize,
}

/// Lower-case and drop separators so "Sub-category", "Sub Category" and
/// "sub_category" all compare equal.
fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> std::result::Result<Self, RuleError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |names: &[&str]| normalized.iter().position(|h| names.contains(&h.as_str()));

        let segment = find(&["segment"]).ok_or(RuleError::MissingColumn("Segment"))?;
        let code = find(&["code"])
            .or_else(|| find(&["code:activity"]))
            .ok_or(RuleError::MissingColumn("Code"))?;
        let points = find(&["points", "point"]).ok_or(RuleError::MissingColumn("Points"))?;

        Ok(Columns {
            segment,
            code,
            activity: find(&["activity", "category"]),
            sub_category: find(&["subcategory"]),
            points,
        })
    }
}

/// Immutable rule table, loaded once per session
#[derive(Debug, Clone)]
pub struct RuleTable {
    rows: Vec<RuleRow>,
    refinement: Refinement,
    activity_level: bool,
}

impl RuleTable {
    /// Load the rule table from a CSV file
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RuleError::NotFound(path.to_path_buf()).into());
        }
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            refinement = table.refinement.label(),
            activity_level = table.activity_level,
            "Loaded rule table"
        );
        Ok(table)
    }

    /// Load the rule table from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().map_err(RuleError::Read)?.clone();
        let columns = Columns::resolve(&headers)?;
        tracing::debug!(?columns, "Resolved rule table columns");

        let mut raw_rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(RuleError::Read)?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            raw_rows.push(record);
        }

        let rows = forward_fill(&raw_rows, &columns)?;

        let refinement = if columns.sub_category.is_some() {
            Refinement::SubCategory
        } else if columns.activity.is_some() {
            Refinement::Activity
        } else {
            Refinement::None
        };

        Ok(RuleTable {
            rows,
            refinement,
            activity_level: columns.activity.is_some() && columns.sub_category.is_some(),
        })
    }

    /// Build a table from already-filled rows.
    ///
    /// Rows that carry activities get their own activity level when
    /// sub-categories are the refinement.
    pub fn from_rows(rows: Vec<RuleRow>, refinement: Refinement) -> Self {
        let activity_level =
            refinement == Refinement::SubCategory && rows.iter().any(|r| r.activity.is_some());
        RuleTable {
            rows,
            refinement,
            activity_level,
        }
    }

    pub fn rows(&self) -> &[RuleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The column used as the last cascade level
    pub fn refinement(&self) -> Refinement {
        self.refinement
    }

    /// Whether activity is a level of its own between code and sub-category.
    /// True only when the sheet has both an activity and a sub-category column.
    pub fn has_activity_level(&self) -> bool {
        self.activity_level
    }
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Carry the last non-blank value of each column down into blank cells.
///
/// Activity restarts whenever the segment or code changes, and sub-category
/// restarts whenever the activity does too, so a group without
/// sub-categories never inherits its neighbour's.
fn forward_fill(
    records: &[csv::StringRecord],
    columns: &Columns,
) -> std::result::Result<Vec<RuleRow>, RuleError> {
    let first = records.first().ok_or(RuleError::Empty)?;
    if cell(first, columns.segment).is_none() {
        return Err(RuleError::BlankFirstRow { column: "Segment" });
    }
    if cell(first, columns.code).is_none() {
        return Err(RuleError::BlankFirstRow { column: "Code" });
    }

    let fill = |last: &mut Option<String>, index: Option<usize>, record: &csv::StringRecord| {
        if let Some(value) = index.and_then(|i| cell(record, i)) {
            *last = Some(value);
        }
        last.clone()
    };

    let mut last_segment = None;
    let mut last_code = None;
    let mut last_activity = None;
    let mut last_sub_category = None;
    let mut last_points = None;

    let mut rows: Vec<RuleRow> = Vec::with_capacity(records.len());
    for record in records {
        let segment = fill(&mut last_segment, Some(columns.segment), record).unwrap_or_default();
        let code = fill(&mut last_code, Some(columns.code), record).unwrap_or_default();
        let prev = rows.last();
        if prev.map_or(true, |p| p.segment != segment || p.code != code) {
            last_activity = None;
        }
        let activity = fill(&mut last_activity, columns.activity, record);
        if prev.map_or(true, |p| p.segment != segment || p.code != code || p.activity != activity)
        {
            last_sub_category = None;
        }

        let points_raw = fill(&mut last_points, Some(columns.points), record);
        rows.push(RuleRow {
            segment,
            code,
            activity,
            sub_category: fill(&mut last_sub_category, columns.sub_category, record),
            points: extract_points(points_raw.as_deref()),
            points_raw,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<RuleTable> {
        RuleTable::from_reader(csv.as_bytes())
    }

    #[test]
    fn test_forward_fill_segment_and_code() {
        let table = load(
            "Segment,Code,Activity,Points\n\
             Service,S1,Visit,10\n\
             ,,Call,5\n\
             ,S2,Meeting,8\n\
             Sales,P1,Pitch,20\n",
        )
        .unwrap();

        assert_eq!(table.len(), 4);
        for row in table.rows() {
            assert!(!row.segment.is_empty());
            assert!(!row.code.is_empty());
        }
        assert_eq!(table.rows()[1].segment, "Service");
        assert_eq!(table.rows()[1].code, "S1");
        assert_eq!(table.rows()[2].segment, "Service");
        assert_eq!(table.rows()[2].code, "S2");
        assert_eq!(table.rows()[3].segment, "Sales");
        assert_eq!(table.refinement(), Refinement::Activity);
    }

    #[test]
    fn test_points_are_derived_and_filled() {
        let table = load(
            "Segment,Code,Activity,Points\n\
             Service,S1,Visit,5 per member\n\
             ,,Call,\n\
             ,,Note,descriptive only\n",
        )
        .unwrap();

        assert_eq!(table.rows()[0].points, 5);
        assert_eq!(table.rows()[1].points_raw.as_deref(), Some("5 per member"));
        assert_eq!(table.rows()[1].points, 5);
        assert_eq!(table.rows()[2].points, 0);
    }

    #[test]
    fn test_combined_code_activity_header_and_sub_category() {
        let table = load(
            "Segment,Code : Activity,Sub-category,Points\n\
             Service,S1: Visit,,10\n\
             ,S2: Call,A,5\n\
             ,,B,8\n",
        )
        .unwrap();

        assert_eq!(table.refinement(), Refinement::SubCategory);
        assert_eq!(table.rows()[0].code, "S1: Visit");
        assert_eq!(table.rows()[0].sub_category, None);
        assert_eq!(table.rows()[2].code, "S2: Call");
        assert_eq!(table.rows()[2].sub_category.as_deref(), Some("B"));
    }

    #[test]
    fn test_sub_category_does_not_leak_into_next_code() {
        let table = load(
            "Segment,Code,Sub-category,Points\n\
             Service,S2,A,5\n\
             ,,B,8\n\
             ,S3,,4\n\
             ,,,6\n",
        )
        .unwrap();

        assert_eq!(table.rows()[1].sub_category.as_deref(), Some("B"));
        assert_eq!(table.rows()[2].sub_category, None);
        assert_eq!(table.rows()[3].sub_category, None);
        assert_eq!(table.rows()[3].code, "S3");
        assert_eq!(table.rows()[3].points, 6);
        assert_eq!(crate::cascade::refinements(&table, "Service", "S3", None), None);
    }

    #[test]
    fn test_activity_fills_within_its_code() {
        let table = load(
            "Segment,Code,Activity,Sub-category,Points\n\
             Service,S1,Visit,A,10\n\
             ,,,B,12\n\
             ,,Call,,5\n\
             ,S2,,,3\n",
        )
        .unwrap();

        assert!(table.has_activity_level());
        assert_eq!(table.refinement(), Refinement::SubCategory);
        assert_eq!(table.rows()[1].activity.as_deref(), Some("Visit"));
        assert_eq!(table.rows()[2].activity.as_deref(), Some("Call"));
        assert_eq!(table.rows()[2].sub_category, None);
        assert_eq!(table.rows()[3].activity, None);
    }

    #[test]
    fn test_activity_level_needs_both_columns() {
        let table = load("Segment,Code,Activity,Points\nService,S1,Visit,10\n").unwrap();
        assert!(!table.has_activity_level());
        assert_eq!(table.refinement(), Refinement::Activity);

        let table = load("Segment,Code,Sub-category,Points\nService,S1,A,10\n").unwrap();
        assert!(!table.has_activity_level());
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = load("Segment,Code,Points\nService,S1,10\n,,\n\nService,S2,4\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.refinement(), Refinement::None);
    }

    #[test]
    fn test_missing_required_column() {
        let err = load("Segment,Activity,Points\nService,Visit,10\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PointsError::Rules(RuleError::MissingColumn("Code"))
        ));

        let err = load("Segment,Code\nService,S1\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PointsError::Rules(RuleError::MissingColumn("Points"))
        ));
    }

    #[test]
    fn test_blank_first_row_fails_fast() {
        let err = load("Segment,Code,Points\n,S1,10\nService,S2,5\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PointsError::Rules(RuleError::BlankFirstRow { column: "Segment" })
        ));

        let err = load("Segment,Code,Points\nService,,10\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PointsError::Rules(RuleError::BlankFirstRow { column: "Code" })
        ));
    }

    #[test]
    fn test_empty_table() {
        let err = load("Segment,Code,Points\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PointsError::Rules(RuleError::Empty)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = RuleTable::from_path(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PointsError::Rules(RuleError::NotFound(_))
        ));
    }

    #[test]
    fn test_header_normalization() {
        assert_eq!(normalize_header("\u{feff}Segment"), "segment");
        assert_eq!(normalize_header(" Sub Category "), "subcategory");
        assert_eq!(normalize_header("sub_category"), "subcategory");
        assert_eq!(normalize_header("Code : Activity"), "code:activity");
    }

    #[test]
    fn test_activity_label() {
        let mut row = RuleRow {
            segment: "Service".to_string(),
            code: "S2".to_string(),
            activity: Some("Call".to_string()),
            sub_category: Some("B".to_string()),
            points_raw: Some("8".to_string()),
            points: 8,
        };
        assert_eq!(row.activity_label(), "Call / B");

        row.sub_category = None;
        assert_eq!(row.activity_label(), "Call");

        row.activity = None;
        assert_eq!(row.activity_label(), "S2");
    }
}
