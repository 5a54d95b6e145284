use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use futures::future::join_all;
use log::{debug, info};

use super::window::{trailing_days, DayWindow};
use crate::config::JiraConfig;
use crate::error::{DefectLensError, Result};
use crate::fallback::{Fallback, FallbackMonitor};
use crate::models::{
    Breakdown, ChartRow, DaySummary, DefectSummary, DueSummary, StatusCountResult,
};
use crate::providers::jira::status::status_names;
use crate::providers::jira::{
    base_jql, jira_search_url, with_extra_clauses, Clause, DefectStatus, JiraClient, JqlQuery,
    TypeFilter, DEFECT_STATUS_ORDER, TREND_STATUSES,
};
use crate::providers::CountSource;

/// Resolves the `type` parameter: absent means All, unknown means Bug.
pub fn resolve_type_filter(raw: Option<&str>, monitor: &FallbackMonitor) -> TypeFilter {
    let Some(raw) = raw else {
        return TypeFilter::All;
    };
    TypeFilter::parse(raw).unwrap_or_else(|| {
        monitor.record(&Fallback::UnknownTypeFilter { raw });
        TypeFilter::Bug
    })
}

pub fn require_statuses(statuses: &[String]) -> Result<()> {
    if statuses.is_empty() {
        return Err(DefectLensError::InvalidInput(
            "Query must include at least one status".to_string(),
        ));
    }
    Ok(())
}

pub struct DefectService {
    source: Arc<dyn CountSource>,
    project_key: String,
    site_url: String,
    monitor: Arc<FallbackMonitor>,
}

impl DefectService {
    pub fn new(
        source: Arc<dyn CountSource>,
        project_key: &str,
        site_url: &str,
        monitor: Arc<FallbackMonitor>,
    ) -> Self {
        Self {
            source,
            project_key: project_key.to_string(),
            site_url: site_url.trim_end_matches('/').to_string(),
            monitor,
        }
    }

    /// Service backed by the live Jira approximate-count endpoint.
    pub fn from_config(config: &JiraConfig, monitor: Arc<FallbackMonitor>) -> Result<Self> {
        let client = JiraClient::new(config, Arc::clone(&monitor))?;
        Ok(Self::new(
            Arc::new(client),
            &config.project_key,
            config.site_url(),
            monitor,
        ))
    }

    pub fn monitor(&self) -> &FallbackMonitor {
        &self.monitor
    }

    pub fn type_filter(&self, raw: Option<&str>) -> TypeFilter {
        resolve_type_filter(raw, &self.monitor)
    }

    fn query(&self, type_filter: TypeFilter) -> JqlQuery {
        JqlQuery::new(&self.project_key, type_filter)
    }

    async fn count(&self, query: &JqlQuery) -> u64 {
        self.source.approximate_count(&query.to_string()).await
    }

    /// Counts issues per status, all statuses in flight at once.
    ///
    /// # Errors
    /// Returns `InvalidInput` when `statuses` is empty; no request is made.
    pub async fn summarize(
        &self,
        statuses: &[String],
        type_filter: TypeFilter,
        extra: &[Clause],
    ) -> Result<DefectSummary> {
        require_statuses(statuses)?;

        debug!(
            "Summarizing {} statuses (type: {})",
            statuses.len(),
            type_filter.as_str()
        );

        let futures = statuses.iter().map(|status| async move {
            let base = base_jql(&self.project_key, type_filter, Some(status));
            let jql = with_extra_clauses(&base, extra);
            StatusCountResult {
                status: status.clone(),
                count: self.source.approximate_count(&jql).await,
            }
        });

        let results = join_all(futures).await;

        Ok(DefectSummary::from_results(results))
    }

    /// To Do counts issues created that day; the other tracked statuses count
    /// transitions into them during that day.
    async fn summarize_day(&self, window: &DayWindow, type_filter: TypeFilter) -> DaySummary {
        let (start, end) = (window.start_str(), window.end_str());

        let futures = TREND_STATUSES.iter().map(|&status| {
            let query = match status {
                DefectStatus::ToDo => self
                    .query(type_filter)
                    .with_status(status.as_str())
                    .and(Clause::created_between(&start, &end)),
                _ => self
                    .query(type_filter)
                    .and(Clause::changed_to_between(status.as_str(), &start, &end)),
            };
            async move { (status, self.count(&query).await) }
        });

        let mut day = DaySummary {
            date: window.label.clone(),
            todo: 0,
            in_progress: 0,
            done: 0,
        };
        for (status, count) in join_all(futures).await {
            match status {
                DefectStatus::ToDo => day.todo = count,
                DefectStatus::InProgress => day.in_progress = count,
                DefectStatus::Done => day.done = count,
                _ => {}
            }
        }
        day
    }

    /// One [`DaySummary`] per day of the trailing window, oldest first.
    pub async fn summarize_by_day_window<Tz: TimeZone>(
        &self,
        days: usize,
        type_filter: TypeFilter,
        reference: &DateTime<Tz>,
    ) -> Vec<DaySummary>
    where
        Tz::Offset: std::fmt::Display,
    {
        let windows = trailing_days(days, reference);
        info!(
            "Collecting {} day trend (type: {})",
            windows.len(),
            type_filter.as_str()
        );

        join_all(
            windows
                .iter()
                .map(|window| self.summarize_day(window, type_filter)),
        )
        .await
    }

    /// Due-date and assignee focus totals across the dashboard statuses.
    pub async fn due_summary(&self, type_filter: TypeFilter) -> Result<DueSummary> {
        let statuses = status_names(&DEFECT_STATUS_ORDER);
        let done = status_names(&[DefectStatus::Done]);
        let focus = |jql: &str| [Clause::Grouped(jql.to_string())];

        let done_today_clause = [Clause::changed_to(
            DefectStatus::Done.as_str(),
            "AFTER startOfDay()",
        )];
        let empty_due_clause = focus("duedate is EMPTY");
        let due_today_clause = focus("duedate = now()");
        let delayed_clause = focus("duedate < now()");
        let unassigned_clause = focus("assignee = EMPTY");

        let (done_today, empty_due, due_today, delayed, unassigned) = tokio::join!(
            self.summarize(&done, type_filter, &done_today_clause),
            self.summarize(&statuses, type_filter, &empty_due_clause),
            self.summarize(&statuses, type_filter, &due_today_clause),
            self.summarize(&statuses, type_filter, &delayed_clause),
            self.summarize(&statuses, type_filter, &unassigned_clause),
        );

        Ok(DueSummary {
            done_today_total: done_today?.total,
            empty_due_date_total: empty_due?.total,
            today_due_date_total: due_today?.total,
            delayed_due_date_total: delayed?.total,
            assignee_empty_total: unassigned?.total,
        })
    }

    /// Pie chart rows for the dashboard statuses, each linked to Jira search.
    pub async fn breakdown(&self, type_filter: TypeFilter) -> Result<Breakdown> {
        let summary = self
            .summarize(&status_names(&DEFECT_STATUS_ORDER), type_filter, &[])
            .await?;

        let rows: Vec<ChartRow> = summary
            .summary
            .into_iter()
            .filter_map(|(name, amount)| {
                let status = DefectStatus::from_name(&name)?;
                if status.excluded_from_chart() {
                    return None;
                }
                let jql = base_jql(&self.project_key, type_filter, Some(&name));
                Some(ChartRow {
                    link: jira_search_url(&self.site_url, &jql),
                    fill: status.chart_color().to_string(),
                    status: name,
                    amount,
                })
            })
            .collect();

        let total = rows
            .iter()
            .fold(0u64, |total, row| total.saturating_add(row.amount));
        Ok(Breakdown { rows, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::FixedOffset;
    use mockito::Matcher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns the count of the first needle found in the JQL, else 0.
    struct FakeSource {
        counts: Vec<(&'static str, u64)>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(counts: Vec<(&'static str, u64)>) -> Arc<Self> {
            Arc::new(Self {
                counts,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CountSource for FakeSource {
        async fn approximate_count(&self, jql: &str) -> u64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(jql.to_string());
            self.counts
                .iter()
                .find(|(needle, _)| jql.contains(needle))
                .map_or(0, |(_, count)| *count)
        }
    }

    fn service(source: Arc<FakeSource>) -> DefectService {
        DefectService::new(
            source,
            "S2SWFE",
            "https://acme.atlassian.net/",
            Arc::new(FallbackMonitor::new()),
        )
    }

    fn names(statuses: &[&str]) -> Vec<String> {
        statuses.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_summarize_rejects_empty_status_list_before_any_call() {
        let source = FakeSource::new(vec![]);
        let service = service(Arc::clone(&source));

        let err = service
            .summarize(&[], TypeFilter::Bug, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, DefectLensError::InvalidInput(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_folds_counts_and_total() {
        let source = FakeSource::new(vec![
            (r#"status = "To Do""#, 3),
            (r#"status = "Done""#, 5),
        ]);
        let service = service(Arc::clone(&source));

        let summary = service
            .summarize(&names(&["To Do", "Done"]), TypeFilter::Bug, &[])
            .await
            .unwrap();

        assert_eq!(summary.summary["To Do"], 3);
        assert_eq!(summary.summary["Done"], 5);
        assert_eq!(summary.total, 8);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_summarize_appends_extra_clauses_to_every_status() {
        let source = FakeSource::new(vec![]);
        let service = service(Arc::clone(&source));

        service
            .summarize(
                &names(&["Blocked", "Reviewing"]),
                TypeFilter::All,
                &[
                    Clause::Raw("updated >= -7d".to_string()),
                    Clause::Grouped("duedate is EMPTY".to_string()),
                ],
            )
            .await
            .unwrap();

        let mut seen = source.seen();
        seen.sort();
        assert_eq!(
            seen,
            [
                r#"project = "S2SWFE" AND type IN (Bug, Task) AND status = "Blocked" AND updated >= -7d AND (duedate is EMPTY)"#,
                r#"project = "S2SWFE" AND type IN (Bug, Task) AND status = "Reviewing" AND updated >= -7d AND (duedate is EMPTY)"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_summarize_isolates_failed_status() {
        let mut server = mockito::Server::new_async().await;
        let _todo = server
            .mock("POST", "/rest/api/3/search/approximate-count")
            .match_body(Matcher::Regex("To Do".to_string()))
            .with_status(200)
            .with_body(r#"{"count": 4}"#)
            .create_async()
            .await;
        let _done = server
            .mock("POST", "/rest/api/3/search/approximate-count")
            .match_body(Matcher::Regex("Done".to_string()))
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;
        let _blocked = server
            .mock("POST", "/rest/api/3/search/approximate-count")
            .match_body(Matcher::Regex("Blocked".to_string()))
            .with_status(200)
            .with_body(r#"{"count": 6}"#)
            .create_async()
            .await;

        let config = JiraConfig::from_parts(
            Some(&server.url()),
            Some("qa@example.com"),
            Some("secret"),
            "S2SWFE",
            5,
        )
        .unwrap();
        let monitor = Arc::new(FallbackMonitor::new());
        let service = DefectService::from_config(&config, Arc::clone(&monitor)).unwrap();

        let summary = service
            .summarize(&names(&["To Do", "Done", "Blocked"]), TypeFilter::Bug, &[])
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_string(&summary).unwrap(),
            r#"{"summary":{"To Do":4,"Done":0,"Blocked":6},"total":10}"#
        );
        assert_eq!(monitor.snapshot().degraded_counts, 1);
    }

    #[tokio::test]
    async fn test_summarize_total_saturates_on_huge_counts() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/rest/api/3/search/approximate-count")
            .with_status(200)
            .with_body(format!(r#"{{"count": {}}}"#, u64::MAX))
            .expect(2)
            .create_async()
            .await;

        let config = JiraConfig::from_parts(
            Some(&server.url()),
            Some("qa@example.com"),
            Some("secret"),
            "S2SWFE",
            5,
        )
        .unwrap();
        let service =
            DefectService::from_config(&config, Arc::new(FallbackMonitor::new())).unwrap();

        let summary = service
            .summarize(&names(&["To Do", "Done"]), TypeFilter::Bug, &[])
            .await
            .unwrap();

        assert_eq!(summary.summary["To Do"], u64::MAX);
        assert_eq!(summary.summary["Done"], u64::MAX);
        assert_eq!(summary.total, u64::MAX);
    }

    #[tokio::test]
    async fn test_breakdown_total_saturates() {
        let source = FakeSource::new(vec![
            (r#"status = "To Do""#, u64::MAX),
            (r#"status = "Blocked""#, u64::MAX),
        ]);
        let service = service(source);

        let breakdown = service.breakdown(TypeFilter::Bug).await.unwrap();

        assert_eq!(breakdown.total, u64::MAX);
    }

    #[test]
    fn test_type_filter_resolution() {
        let service = service(FakeSource::new(vec![]));

        assert_eq!(service.type_filter(None), TypeFilter::All);
        assert_eq!(service.type_filter(Some("Task")), TypeFilter::Task);
        assert_eq!(service.monitor().snapshot().unknown_type_filter, 0);

        assert_eq!(service.type_filter(Some("Story")), TypeFilter::Bug);
        assert_eq!(service.monitor().snapshot().unknown_type_filter, 1);
    }

    #[tokio::test]
    async fn test_day_window_queries_and_order() {
        let source = FakeSource::new(vec![
            (r#"created >= "2024-03-04""#, 1),
            (r#"CHANGED TO "In Progress" AFTER "2024-03-09""#, 2),
            (r#"CHANGED TO "Done" AFTER "2024-03-10""#, 3),
        ]);
        let service = service(Arc::clone(&source));
        let reference = FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 10, 9, 15, 0)
            .unwrap();

        let days = service
            .summarize_by_day_window(7, TypeFilter::Bug, &reference)
            .await;

        assert_eq!(days.len(), 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 21);
        assert_eq!(days[0].date, "2024-03-04T00:00:00+07:00");
        assert_eq!(days[6].date, "2024-03-10T00:00:00+07:00");
        assert_eq!((days[0].todo, days[0].in_progress, days[0].done), (1, 0, 0));
        assert_eq!((days[5].todo, days[5].in_progress, days[5].done), (0, 2, 0));
        assert_eq!((days[6].todo, days[6].in_progress, days[6].done), (0, 0, 3));

        let seen = source.seen();
        assert!(seen.contains(
            &r#"project = "S2SWFE" AND type = Bug AND status = "To Do" AND created >= "2024-03-10" AND created < "2024-03-11""#
                .to_string()
        ));
        assert!(seen.contains(
            &r#"project = "S2SWFE" AND type = Bug AND status CHANGED TO "Done" AFTER "2024-03-10" BEFORE "2024-03-11""#
                .to_string()
        ));
    }

    #[tokio::test]
    async fn test_due_summary_totals() {
        let source = FakeSource::new(vec![
            ("CHANGED TO \"Done\" AFTER startOfDay()", 2),
            ("(duedate is EMPTY)", 1),
            ("(duedate = now())", 3),
            ("(duedate < now())", 4),
            ("(assignee = EMPTY)", 10),
        ]);
        let service = service(Arc::clone(&source));

        let due = service.due_summary(TypeFilter::All).await.unwrap();

        // five dashboard statuses per focus metric, one for done today
        assert_eq!(source.calls.load(Ordering::SeqCst), 21);
        assert_eq!(
            due,
            DueSummary {
                done_today_total: 2,
                empty_due_date_total: 5,
                today_due_date_total: 15,
                delayed_due_date_total: 20,
                assignee_empty_total: 50,
            }
        );
    }

    #[tokio::test]
    async fn test_breakdown_rows_have_colors_and_links() {
        let source = FakeSource::new(vec![
            (r#"status = "To Do""#, 5),
            (r#"status = "Blocked""#, 1),
        ]);
        let service = service(source);

        let breakdown = service.breakdown(TypeFilter::Bug).await.unwrap();

        assert_eq!(breakdown.rows.len(), 5);
        assert_eq!(breakdown.total, 6);

        let todo = &breakdown.rows[0];
        assert_eq!(todo.status, "To Do");
        assert_eq!(todo.amount, 5);
        assert_eq!(todo.fill, "var(--chart-5)");
        assert_eq!(
            todo.link,
            "https://acme.atlassian.net/issues/?jql=project%20%3D%20%22S2SWFE%22%20AND%20type%20%3D%20Bug%20AND%20status%20%3D%20%22To%20Do%22"
        );
        assert_eq!(breakdown.rows[2].fill, "var(--chart-1)");
    }

    #[tokio::test]
    async fn test_summarize_uses_configured_project_key() {
        let source = FakeSource::new(vec![]);
        let service = DefectService::new(
            Arc::clone(&source) as Arc<dyn CountSource>,
            "QA",
            "https://acme.atlassian.net",
            Arc::new(FallbackMonitor::new()),
        );

        service
            .summarize(&names(&["Done"]), TypeFilter::Task, &[])
            .await
            .unwrap();
        let breakdown = service.breakdown(TypeFilter::Task).await.unwrap();

        assert!(source.seen()[0].starts_with(r#"project = "QA" AND type = Task"#));
        assert!(breakdown.rows[0].link.contains("project%20%3D%20%22QA%22"));
    }
}
