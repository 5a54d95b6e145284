mod service;
pub mod window;

pub use service::{require_statuses, resolve_type_filter, DefectService};
pub use window::DEFAULT_TREND_DAYS;
