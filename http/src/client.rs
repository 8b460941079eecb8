//! Blocking GET and JSON POST requests that answer with a JSON object.

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::{Url, form_urlencoded};

use crate::error::HttpError;

/// A decoded response body.
pub type JsonMap = Map<String, Value>;

/// Sent with every request made by [`HttpClient::new`].
pub const USER_AGENT: &str = concat!("gblibx/", env!("CARGO_PKG_VERSION"));

/// Pause between POST attempts that failed to reach the server.
pub const POST_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How long POST keeps retrying in total before giving up.
pub const POST_RETRY_TOTAL: Duration = Duration::from_secs(300);

/// Key under which a body that is not a JSON object is returned.
pub const DATA_KEY: &str = "data";

/// A blocking HTTP client.
///
/// Only 200 and 201 count as success. POST retries requests that never got
/// an answer (connection refused, reset, timeout); a server that answers
/// with an error status is not retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    post_attempts: u32,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(HttpError::Client)?;
        Ok(Self::from_client(http))
    }

    /// Wraps a preconfigured client (proxies, TLS, timeouts).
    pub fn from_client(http: Client) -> Self {
        let attempts = POST_RETRY_TOTAL.as_secs() / POST_RETRY_DELAY.as_secs();
        Self {
            http,
            post_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
            retry_delay: POST_RETRY_DELAY,
        }
    }

    /// Tries a POST at most `attempts` times, sleeping `delay` in between.
    pub fn with_post_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.post_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    /// GETs `url` with `params` appended as an encoded query string.
    pub fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<JsonMap, HttpError> {
        let url = with_query(url, params)?;
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url.clone())
            .send()
            .map_err(|source| HttpError::Request {
                url: url.to_string(),
                source,
            })?;
        read_response(url.as_str(), resp)
    }

    /// [`get`](Self::get) with `key=value` strings, split at the first `=`.
    pub fn get_key_values(&self, url: &str, params: &[&str]) -> Result<JsonMap, HttpError> {
        let pairs = params
            .iter()
            .copied()
            .map(split_key_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.get(url, &pairs)
    }

    /// POSTs `body` as JSON.
    pub fn post_json<T>(&self, url: &str, body: &T) -> Result<JsonMap, HttpError>
    where
        T: Serialize + ?Sized,
    {
        let url = parse_url(url)?;
        let mut attempt = 1;
        loop {
            debug!(%url, attempt, "POST");
            match self.http.post(url.clone()).json(body).send() {
                Ok(resp) => return read_response(url.as_str(), resp),
                Err(source) if attempt < self.post_attempts && !source.is_builder() => {
                    warn!(%url, attempt, error = %source, "POST failed, retrying");
                    thread::sleep(self.retry_delay);
                    attempt += 1;
                }
                Err(source) => {
                    return Err(HttpError::Request {
                        url: url.to_string(),
                        source,
                    });
                }
            }
        }
    }
}

fn read_response(url: &str, resp: Response) -> Result<JsonMap, HttpError> {
    let status = resp.status();
    let body = resp.text().map_err(|source| HttpError::Request {
        url: url.to_string(),
        source,
    })?;
    if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
        debug!(url, code = status.as_u16(), "request rejected");
        return Err(HttpError::Status {
            code: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        });
    }
    response_map(&body)
}

fn parse_url(url: &str) -> Result<Url, HttpError> {
    Url::parse(url).map_err(|source| HttpError::Url {
        url: url.to_string(),
        source,
    })
}

/// `url` with `params` form-encoded into its query string.
pub fn with_query(url: &str, params: &[(&str, &str)]) -> Result<Url, HttpError> {
    let mut url = parse_url(url)?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// `http://host:port/path`.
pub fn http_url(host: &str, port: u16, path: &str) -> String {
    format!("http://{host}:{port}/{}", path.trim_start_matches('/'))
}

/// Form-encodes `value` (`a b&c` → `a+b%26c`).
pub fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Splits `key=value` at the first `=`.
pub fn split_key_value(kv: &str) -> Result<(&str, &str), HttpError> {
    kv.split_once('=')
        .ok_or_else(|| HttpError::Parameter(kv.to_string()))
}

/// Decodes a response body. An empty body is an empty object; anything but
/// an object is returned under [`DATA_KEY`].
pub fn response_map(body: &str) -> Result<JsonMap, HttpError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(JsonMap::new());
    }
    if body.starts_with('{') {
        return Ok(serde_json::from_str(body)?);
    }
    let data: Value = serde_json::from_str(body)?;
    let mut map = JsonMap::new();
    map.insert(DATA_KEY.to_string(), data);
    Ok(map)
}
