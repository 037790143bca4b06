use crate::config::{Config, OrgKind};
use crate::errors::MetricsError;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::{debug, info};

const API_VERSION: &str = "2022-11-28";

pub fn usage_url(config: &Config) -> String {
    let base = config.api_base.trim_end_matches('/');
    match config.kind {
        OrgKind::Org => format!("{base}/orgs/{}/copilot/usage", config.org),
        OrgKind::Enterprise => format!("{base}/enterprises/{}/copilot/usage", config.org),
    }
}

/// Fetches the raw usage payload. Any non-2xx status fails the run.
pub async fn fetch_usage(config: &Config) -> Result<String, MetricsError> {
    config.require_org()?;
    if config.bearer_token.trim().is_empty() {
        return Err(MetricsError::Config("bearer_token is required to fetch metrics".into()));
    }

    let url = usage_url(config);
    info!("fetching usage metrics from {url}");

    let response = reqwest::Client::new()
        .get(&url)
        .header(ACCEPT, "application/vnd.github+json")
        .header(AUTHORIZATION, format!("Bearer {}", config.bearer_token))
        .header("X-Accepted-GitHub-Permissions", "contents=read")
        .header("X-GitHub-Api-Version", API_VERSION)
        .header(USER_AGENT, concat!("copilot-metrics/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(MetricsError::Status {
            status: status.as_u16(),
            body,
        });
    }

    debug!("received {} bytes", body.len());
    Ok(body)
}
