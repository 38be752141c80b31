//! HTTP client for the slow-control historian REST API.

use crate::credentials::{self, CredentialSource, Terminal};
use crate::error::{AuthError, Error, HttpError};
use crate::helpers::{to_unix_seconds, TimeSpec};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const BASE_URL: &str = "https://xenonnt.lngs.infn.it/slowcontrol_temp";
const LOGIN: &str = "Login";
const QUERY: &str = "GetSCData";
const LAST_MEASURED: &str = "getLastMeasuredValue";
const LAST_MEASURED_PMTS: &str = "GetLastMeasuredPMTValues";
const QUERY_TYPES: [&str; 2] = ["LAB", "RAWBYTIME"];
/// Token time to live, in seconds.
const TOKEN_TTL: i64 = 24 * 3600;
/// Margin subtracted from the nominal lifetime so a token cannot expire
/// while a request is in transit, in seconds.
const EARLY_EXPIRY: i64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Client for the slow-control historian service.
///
/// Credentials are resolved lazily on first use (explicit value, then
/// environment, then interactive prompt) and the bearer token obtained from
/// the login exchange is cached until shortly before it expires. Methods
/// take `&mut self`; the check-then-act token refresh is not safe to share
/// across threads without external synchronization.
pub struct HistorianClient {
    base_url: String,
    user_agent: String,
    http: HttpClient,
    source: Box<dyn CredentialSource + Send + Sync>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    token_deadline: i64,
}

impl HistorianClient {
    /// Create a client. Either credential may be omitted and resolved later.
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self::with_source(username, password, Box::new(Terminal))
    }

    /// Create a client with a custom credential source (tests use fakes).
    pub fn with_source(
        username: Option<String>,
        password: Option<String>,
        source: Box<dyn CredentialSource + Send + Sync>,
    ) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: format!("historian-cli/{}", crate::VERSION),
            http: build_http(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            source,
            username,
            password,
            token: None,
            token_deadline: 0,
        }
    }

    /// Point the client at a different service root.
    pub fn set_base_url(&mut self, url: &str) -> Result<(), Error> {
        Url::parse(url).map_err(|e| Error::Validation(format!("invalid base URL: {e}")))?;
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    /// Replace the transport timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.http = build_http(timeout);
    }

    /// Override the username.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    /// Override the password. A cached token keeps being served until its
    /// window lapses; call [`invalidate_token`](Self::invalidate_token) to
    /// force a re-login with the new credentials.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    /// Drop any cached token so the next authorized call logs in again.
    pub fn invalidate_token(&mut self) {
        self.token = None;
        self.token_deadline = 0;
    }

    /// Username, resolving it on first use.
    pub fn username(&mut self) -> Result<String, Error> {
        match &self.username {
            Some(user) => Ok(user.clone()),
            None => {
                let user = credentials::resolve_username(self.source.as_ref())?;
                self.username = Some(user.clone());
                Ok(user)
            }
        }
    }

    /// Password, resolving it on first use.
    pub fn password(&mut self) -> Result<String, Error> {
        match &self.password {
            Some(password) => Ok(password.clone()),
            None => {
                let password = credentials::resolve_password(self.source.as_ref())?;
                self.password = Some(password.clone());
                Ok(password)
            }
        }
    }

    /// Exchange the current credentials for a fresh bearer token.
    ///
    /// On failure any previously cached token is left untouched.
    pub async fn login(&mut self) -> Result<(), Error> {
        let username = self.username()?;
        let password = self.password()?;
        let url = format!("{}/{}", self.base_url, LOGIN);
        let res = self
            .http
            .post(&url)
            .form(&[("username", username.as_str()), ("password", password.as_str())])
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;
        if !res.status().is_success() {
            return Err(Error::Auth(AuthError::new(
                "could not fetch access token, check credentials",
            )));
        }
        let body: LoginResponse = res
            .json()
            .await
            .map_err(|e| Error::Other(format!("invalid login response: {e}")))?;
        self.token = Some(body.token);
        self.token_deadline = Utc::now().timestamp() + TOKEN_TTL - EARLY_EXPIRY;
        debug!(deadline = self.token_deadline, "access token refreshed");
        Ok(())
    }

    /// Current bearer token, logging in first when none is cached or the
    /// cached one has reached its deadline.
    pub async fn token(&mut self) -> Result<String, Error> {
        if self.token_is_stale(Utc::now().timestamp()) {
            self.login().await?;
        }
        self.token
            .clone()
            .ok_or_else(|| Error::Other("token missing after login".to_string()))
    }

    fn token_is_stale(&self, now: i64) -> bool {
        self.token.is_none() || now >= self.token_deadline
    }

    /// Latest measured value for one channel.
    pub async fn get_last_measured_value(&mut self, name: &str) -> Result<Value, Error> {
        let url = format!(
            "{}/{}?name={}&EndDateUnix={}",
            self.base_url,
            LAST_MEASURED,
            urlencoding::encode(name),
            Utc::now().timestamp()
        );
        self.get_json(&url).await
    }

    /// Latest values for the fixed PMT channel batch.
    pub async fn get_last_measured_pmts(&mut self) -> Result<Value, Error> {
        let url = format!(
            "{}/{}?EndDateUnix={}",
            self.base_url,
            LAST_MEASURED_PMTS,
            Utc::now().timestamp()
        );
        self.get_json(&url).await
    }

    /// Historical range query for one channel.
    ///
    /// `start` and `end` accept Unix seconds, fractional seconds, calendar
    /// text, or a `DateTime<Utc>`. `query_type` defaults to `"LAB"`,
    /// `interval` to 1 second; an unknown query type is rejected before any
    /// request is made.
    pub async fn get_measurements(
        &mut self,
        name: &str,
        start: impl Into<TimeSpec>,
        end: impl Into<TimeSpec>,
        query_type: Option<&str>,
        interval: Option<u32>,
    ) -> Result<Value, Error> {
        let start = to_unix_seconds(&start.into())?;
        let end = to_unix_seconds(&end.into())?;
        let query_type = query_type.unwrap_or("LAB");
        if !QUERY_TYPES.contains(&query_type) {
            return Err(Error::Validation(format!(
                "invalid query_type, must be one of: {}",
                QUERY_TYPES.join(", ")
            )));
        }
        let interval = interval.unwrap_or(1);
        let url = format!(
            "{}/{}?name={}&StartDateUnix={}&EndDateUnix={}&QueryType={}&interval={}",
            self.base_url,
            QUERY,
            urlencoding::encode(name),
            start,
            end,
            query_type,
            interval
        );
        self.get_json(&url).await
    }

    fn headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(token).expect("token header"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent).expect("user agent"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    async fn get_json(&mut self, url: &str) -> Result<Value, Error> {
        let token = self.token().await?;
        debug!(%url, "GET");
        let res = self
            .http
            .get(url)
            .headers(self.headers(&token))
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;
        let status = res.status();
        let body = res.text().await.map_err(|e| Error::Other(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Http(HttpError::new(status.as_u16(), Some(body))));
        }
        serde_json::from_str(&body).map_err(|e| Error::Other(format!("invalid JSON response: {e}")))
    }
}

fn build_http(timeout: Duration) -> HttpClient {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .expect("reqwest client")
}
