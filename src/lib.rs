//! Contest points calculator
//!
//! Loads a contest rule sheet, narrows it through a segment / code /
//! sub-category cascade, multiplies per-unit points by a repetition count and
//! keeps the results in a session activity log that can be exported.

pub mod activity_log;
pub mod cascade;
pub mod config;
pub mod error;
pub mod export;
pub mod interactive;
pub mod logging;
pub mod points;
pub mod rules;
pub mod session;

pub use activity_log::{ActivityLog, ActivityLogEntry};
pub use cascade::{Quote, Resolution, Selection};
pub use error::{PointsError, Result};
pub use rules::{RuleRow, RuleTable};
pub use session::Session;
