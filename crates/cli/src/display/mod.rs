pub mod formatter;

pub use formatter::{format_projects, format_rule_results};
