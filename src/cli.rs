use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

use crate::config::{JiraConfig, DEFAULT_PROJECT_KEY, DEFAULT_TIMEOUT_SECS};
use crate::defects::{DefectService, DEFAULT_TREND_DAYS};
use crate::fallback::FallbackMonitor;
use crate::models::TrendResponse;
use crate::providers::jira::Clause;
use crate::server::{self, AppState, DefectParams};

#[derive(Parser)]
#[command(name = "defectlens")]
#[command(author, version, about = "Jira defect dashboard backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    jira: JiraArgs,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct JiraArgs {
    /// Jira site URL (e.g. "https://acme.atlassian.net")
    #[arg(long, env = "JIRA_BASE_URL", global = true)]
    jira_url: Option<String>,

    /// Jira account email
    #[arg(long, env = "JIRA_EMAIL", global = true)]
    email: Option<String>,

    /// Jira API token
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Jira project key every query is scoped to
    #[arg(long, env = "JIRA_PROJECT_KEY", default_value = DEFAULT_PROJECT_KEY, global = true)]
    project: String,

    /// Timeout in seconds for each count request
    #[arg(long, env = "JIRA_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,
}

impl JiraArgs {
    fn config(&self) -> crate::error::Result<JiraConfig> {
        JiraConfig::from_parts(
            self.jira_url.as_deref(),
            self.email.as_deref(),
            self.api_token.as_deref(),
            &self.project,
            self.timeout_secs,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "DEFECTLENS_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Print per-status counts once
    Query {
        /// Status to count (repeatable)
        #[arg(short, long = "status", required = true)]
        statuses: Vec<String>,

        /// Issue type filter: All, Bug or Task
        #[arg(short = 't', long = "type")]
        type_filter: Option<String>,

        /// JQL time clause appended as-is (e.g. "created >= startOfDay()")
        #[arg(long)]
        time: Option<String>,

        /// Extra JQL clause, appended in parentheses (e.g. "duedate is EMPTY")
        #[arg(long)]
        jql: Option<String>,
    },
    /// Print the trailing daily trend once
    Trend {
        /// Number of days, ending today
        #[arg(short, long, default_value_t = DEFAULT_TREND_DAYS)]
        days: usize,

        /// Issue type filter: All, Bug or Task
        #[arg(short = 't', long = "type")]
        type_filter: Option<String>,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let monitor = Arc::new(FallbackMonitor::new());

        match &self.command {
            Commands::Serve { bind } => {
                let state = Arc::new(AppState::from_config(self.jira.config(), monitor));
                server::serve(*bind, state).await
            }
            Commands::Query {
                statuses,
                type_filter,
                time,
                jql,
            } => {
                let service = DefectService::from_config(&self.jira.config()?, monitor)?;
                let params = DefectParams {
                    statuses: statuses.clone(),
                    type_filter: type_filter.clone(),
                    time: time.clone(),
                    jql: jql.clone(),
                };
                let clauses: Vec<Clause> = params.clauses()?;
                let type_filter = service.type_filter(params.type_filter.as_deref());

                let summary = service
                    .summarize(&params.statuses, type_filter, &clauses)
                    .await?;
                self.write_output(&summary)?;
                Ok(())
            }
            Commands::Trend { days, type_filter } => {
                let service = DefectService::from_config(&self.jira.config()?, monitor)?;
                let type_filter = service.type_filter(type_filter.as_deref());

                let days = service
                    .summarize_by_day_window(*days, type_filter, &Local::now())
                    .await;
                self.write_output(&TrendResponse { days })?;
                Ok(())
            }
        }
    }

    fn write_output<T: Serialize>(&self, value: &T) -> crate::error::Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}
