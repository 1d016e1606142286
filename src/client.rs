use crate::{
    api::{LogQueryBody, LogQueryResponse},
    auth::{AccessToken, Authenticator, Credentials},
    error::{AuthError, FetchError},
    logger::LoggingConfig,
    model::{Filter, LogRecord, QueryWindow},
    poll::{LogSource, PollConfig},
};
use attohttpc::StatusCode;
use chrono::Utc;
use log::{debug, info, trace, warn};
use std::time::Duration;

/// Configuration settings for a run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Tenant endpoints
    pub tenant: Tenant,
    /// API client credentials
    pub credentials: Credentials,
    /// Filter sent with every query
    pub filter: Filter,
    /// Poll loop timing and paging
    pub poll: PollConfig,
    /// Timeout applied to every HTTP call, defaults to 30 seconds.
    pub request_timeout: Duration,
    /// Re-authenticate when the token expires within this margin, defaults to 60 seconds.
    pub refresh_margin: Duration,
    pub logging_config: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tenant: Tenant::default(),
            credentials: Credentials::default(),
            filter: Filter::default(),
            poll: PollConfig::default(),
            request_timeout: Duration::from_secs(30),
            refresh_margin: Duration::from_secs(60),
            logging_config: LoggingConfig::default(),
        }
    }
}

/// Base URL of a tenant and the endpoints derived from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tenant {
    base_url: String,
}

impl Tenant {
    pub fn from_hostname(hostname: &str) -> Self {
        Tenant {
            base_url: format!("https://{}", hostname),
        }
    }

    /// A tenant at an explicit base URL such as `http://127.0.0.1:8080`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Tenant {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/oidc/endpoint/default/token", self.base_url)
    }

    pub fn query_url(&self) -> String {
        format!("{}/v1.0/logs/query", self.base_url)
    }
}

/// Log fetcher bound to one tenant. Owns the access token and renews it
/// when it is about to expire or the tenant rejects it.
#[derive(Debug)]
pub struct TenantClient {
    query_url: String,
    authenticator: Authenticator,
    token: AccessToken,
    timeout: Duration,
    refresh_margin: Duration,
}

impl TenantClient {
    /// Authenticates once and returns a client ready to query.
    pub fn connect(config: &Config) -> Result<TenantClient, AuthError> {
        let authenticator = Authenticator::new(
            config.tenant.token_url(),
            config.credentials.clone(),
            config.request_timeout,
        );
        let token = authenticator.authenticate()?;
        info!("Authenticated, token expires at {:?}", token.expires_at());
        Ok(TenantClient {
            query_url: config.tenant.query_url(),
            authenticator,
            token,
            timeout: config.request_timeout,
            refresh_margin: config.refresh_margin,
        })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    fn refresh(&mut self) -> Result<(), AuthError> {
        self.token = self.authenticator.authenticate()?;
        info!("Access token renewed, expires at {:?}", self.token.expires_at());
        Ok(())
    }

    fn query(&self, window: &QueryWindow, filter: &Filter) -> Result<Vec<LogRecord>, FetchError> {
        let body = LogQueryBody::from_window(window, filter);
        trace!("Querying {} with {:?}", self.query_url, body);

        let resp = attohttpc::post(&self.query_url)
            .bearer_auth(self.token.secret())
            .timeout(self.timeout)
            .json(&body)?
            .send()?;

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => return Err(FetchError::Unauthorized),
            status => return Err(FetchError::Status(status)),
        }
        let text = resp.text()?;
        let page: LogQueryResponse = serde_json::from_str(&text)?;
        debug!(
            "Query [{}, {}] returned count={:?}",
            window.start, window.end, page.count
        );
        Ok(page.into_records())
    }
}

impl LogSource for TenantClient {
    fn fetch(&mut self, window: &QueryWindow, filter: &Filter) -> Result<Vec<LogRecord>, FetchError> {
        if self.token.expires_within(Utc::now(), self.refresh_margin) {
            debug!("Access token about to expire, renewing");
            self.refresh()?;
        }
        match self.query(window, filter) {
            Err(FetchError::Unauthorized) => {
                warn!("Access token rejected, re-authenticating");
                self.refresh()?;
                self.query(window, filter)
            }
            other => other,
        }
    }
}
