//! Small blocking HTTP helpers for JSON services.
//!
//! [`HttpClient::get`] appends form-encoded query parameters,
//! [`HttpClient::post_json`] sends a JSON body and retries while the server
//! cannot be reached. Both return the response as a JSON object
//! ([`JsonMap`]); a failing status surfaces as [`HttpError::Status`] with
//! its code.
//!
//! ```no_run
//! use gblibx_http::{HttpClient, http_url};
//! use serde_json::json;
//!
//! let client = HttpClient::new().unwrap();
//! let url = http_url("localhost", 3000, "/jobs.json");
//! let jobs = client.get(&url, &[("state", "queued")]).unwrap();
//! let created = client.post_json(&url, &json!({"name": "build"})).unwrap();
//! println!("{jobs:?} {created:?}");
//! ```

mod client;
mod error;

pub use client::{
    DATA_KEY, HttpClient, JsonMap, POST_RETRY_DELAY, POST_RETRY_TOTAL, USER_AGENT, encode,
    http_url, response_map, split_key_value, with_query,
};
pub use error::HttpError;
