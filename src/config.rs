use std::time::Duration;

use url::Url;

use crate::auth::{ApiToken, Credentials};
use crate::error::{DefectLensError, Result, MISSING_CONFIG_MESSAGE};

pub const DEFAULT_PROJECT_KEY: &str = "S2SWFE";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything needed to talk to one Jira site, built once at startup.
#[derive(Debug)]
pub struct JiraConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    pub project_key: String,
    pub timeout: Duration,
}

impl JiraConfig {
    /// Validates the raw settings. Any missing or blank secret is a
    /// configuration error.
    pub fn from_parts(
        base_url: Option<&str>,
        email: Option<&str>,
        api_token: Option<&str>,
        project_key: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        let (Some(base_url), Some(email), Some(api_token)) =
            (present(base_url), present(email), present(api_token))
        else {
            return Err(DefectLensError::Config(MISSING_CONFIG_MESSAGE.to_string()));
        };

        // Url::join treats a path without a trailing slash as a file name
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| DefectLensError::Config(format!("Invalid Jira base URL: {e}")))?;

        Ok(Self {
            base_url,
            credentials: Credentials::new(email, ApiToken::from(api_token)),
            project_key: project_key.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Base URL as users type it, without the trailing slash.
    pub fn site_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
