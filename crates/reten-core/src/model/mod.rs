//! Domain model for checkpoint reports.

pub mod report;

pub use report::{
    Category, Comment, Heat, Location, Report, ReportId, CORROBORATION_THRESHOLD,
    MAX_COMMENT_CHARS, MAX_DESCRIPTION_CHARS, TOKEN_PREFIX_CHARS, token_prefix,
    visibility_window,
};
