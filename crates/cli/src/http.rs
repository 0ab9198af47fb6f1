// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request function backed by reqwest.
//!
//! Every outcome, including transport failures, comes back as an
//! [`ApiResponse`] so the executor and the drain see one error vocabulary.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use fl_core::ErrorInfo;

use crate::error::{Error, Result};
use crate::request::{ApiResponse, RequestFn, RequestFuture};

/// Client for the backend HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one request and normalizes the outcome.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResponse<T> {
        let url = self.url(path);
        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, %url, "sending request");
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return ApiResponse::err(classify_send_error(&e)),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return ApiResponse::err(classify_send_error(&e)),
        };
        parse_response(status, &text)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(Method::GET, path, None).await
    }

    /// A GET request function keyed by path, for use with an executor.
    pub fn get_fn<T>(&self) -> RequestFn<String, T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        Arc::new(move |path: String| -> RequestFuture<T> {
            let client = client.clone();
            async move { client.get(&path).await }.boxed()
        })
    }
}

fn classify_send_error(e: &reqwest::Error) -> ErrorInfo {
    if e.is_timeout() {
        ErrorInfo::timeout(e.to_string())
    } else if e.is_decode() {
        ErrorInfo::malformed(e.to_string())
    } else if e.is_builder() {
        ErrorInfo::unknown(e)
    } else {
        ErrorInfo::network(e.to_string())
    }
}

/// Turns a status and body into an [`ApiResponse`].
///
/// Bodies shaped like `{success, data, error}` are taken as the envelope;
/// any other JSON on a 2xx is the data itself.
pub fn parse_response<T: DeserializeOwned>(status: StatusCode, text: &str) -> ApiResponse<T> {
    let value: Option<Value> = serde_json::from_str(text).ok();
    let is_envelope = value
        .as_ref()
        .and_then(|v| v.get("success"))
        .is_some_and(Value::is_boolean);

    if !status.is_success() {
        let envelope_error = value
            .filter(|_| is_envelope)
            .and_then(|v| serde_json::from_value::<ApiResponse<Value>>(v).ok())
            .and_then(|r| r.error);
        let error = match envelope_error {
            Some(mut error) => {
                error.status = Some(status.as_u16());
                error
            }
            None => {
                let message = if text.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    text.trim().to_string()
                };
                ErrorInfo::from_status(status.as_u16(), message)
            }
        };
        return ApiResponse::err(error);
    }

    let Some(value) = value else {
        return ApiResponse::err(ErrorInfo::malformed("response body is not JSON"));
    };
    if is_envelope {
        serde_json::from_value(value)
            .unwrap_or_else(|e| ApiResponse::err(ErrorInfo::malformed(e.to_string())))
    } else {
        match serde_json::from_value(value) {
            Ok(data) => ApiResponse::ok(data),
            Err(e) => ApiResponse::err(ErrorInfo::malformed(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
