//! Custom error types for the points calculator
//!
//! Library code returns these structured errors; the binary converts them
//! into `anyhow` errors at the edge.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the points calculator
#[derive(Error, Debug)]
pub enum PointsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule table loading and lookup errors
    #[error("Rule table error: {0}")]
    Rules(#[from] RuleError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration file: {0}")]
    SaveFailed(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Rule table errors
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Rule file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read rule table: {0}")]
    Read(#[from] csv::Error),

    #[error("Rule table is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Rule table has no data rows")]
    Empty,

    #[error("First data row has a blank '{column}'; nothing to forward-fill from")]
    BlankFirstRow { column: &'static str },

    #[error("Unknown segment: {0}")]
    UnknownSegment(String),

    #[error("Unknown code '{code}' in segment '{segment}'")]
    UnknownCode { segment: String, code: String },

    #[error("An activity is required; choose one of: {}", .options.join(", "))]
    ActivityRequired { options: Vec<String> },

    #[error("Unknown activity '{choice}'; choose one of: {}", .options.join(", "))]
    UnknownActivity {
        choice: String,
        options: Vec<String>,
    },

    #[error("A sub-category is required; choose one of: {}", .options.join(", "))]
    RefinementRequired { options: Vec<String> },

    #[error("Unknown sub-category '{choice}'; choose one of: {}", .options.join(", "))]
    UnknownRefinement {
        choice: String,
        options: Vec<String>,
    },
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("The activity log is empty; nothing to export")]
    EmptyLog,

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Result type alias for the points calculator
pub type Result<T> = std::result::Result<T, PointsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PointsError::Rules(RuleError::MissingColumn("Points"));
        assert!(err.to_string().contains("missing required column 'Points'"));

        let err = PointsError::Export(ExportError::EmptyLog);
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let points_err: PointsError = io_err.into();
        assert!(matches!(points_err, PointsError::Io(_)));

        let rule_err: PointsError = RuleError::Empty.into();
        assert!(matches!(rule_err, PointsError::Rules(RuleError::Empty)));
    }

    #[test]
    fn test_refinement_errors_list_options() {
        let err = RuleError::RefinementRequired {
            options: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "A sub-category is required; choose one of: A, B"
        );

        let err = RuleError::UnknownRefinement {
            choice: "C".to_string(),
            options: vec!["A".to_string()],
        };
        assert!(err.to_string().contains("'C'"));
    }

    #[test]
    fn test_activity_errors_list_options() {
        let err = RuleError::ActivityRequired {
            options: vec!["Visit".to_string(), "Call".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "An activity is required; choose one of: Visit, Call"
        );

        let err = RuleError::UnknownActivity {
            choice: "Email".to_string(),
            options: vec!["Visit".to_string()],
        };
        assert!(err.to_string().contains("'Email'"));
    }
}
