pub mod jira;

use async_trait::async_trait;

/// Anything that can turn a JQL query into an approximate issue count.
///
/// Implementations never fail: an unavailable count is reported as 0.
#[async_trait]
pub trait CountSource: Send + Sync {
    async fn approximate_count(&self, jql: &str) -> u64;
}
