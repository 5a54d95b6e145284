use chrono::{DateTime, Days, NaiveDate, TimeZone};

pub const DEFAULT_TREND_DAYS: usize = 7;

/// One calendar day as the half-open range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Midnight of `start` in the reference time zone, RFC 3339.
    pub label: String,
}

impl DayWindow {
    fn new<Tz: TimeZone>(start: NaiveDate, tz: &Tz) -> Option<Self>
    where
        Tz::Offset: std::fmt::Display,
    {
        let end = start.succ_opt()?;
        let label = start
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
            .map_or_else(|| start.format("%Y-%m-%d").to_string(), |dt| dt.to_rfc3339());

        Some(Self { start, end, label })
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// The `n` calendar days ending with the reference day, oldest first.
///
/// Days come from the reference's own wall clock, never from its UTC
/// instant, so a zone ahead of or behind UTC keeps its local date.
pub fn trailing_days<Tz: TimeZone>(n: usize, reference: &DateTime<Tz>) -> Vec<DayWindow>
where
    Tz::Offset: std::fmt::Display,
{
    let today = reference.date_naive();
    let tz = reference.timezone();

    (0..n)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
        .filter_map(|day| DayWindow::new(day, &tz))
        .collect()
}
