mod client;
pub mod jql;
pub mod status;
mod url_utils;

pub use client::JiraClient;
pub use jql::{base_jql, with_extra_clauses, Clause, JqlQuery, TypeFilter};
pub use status::{DefectStatus, DEFECT_STATUS_ORDER, TREND_STATUSES};
pub use url_utils::jira_search_url;
