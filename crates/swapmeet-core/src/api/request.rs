//! Outgoing request descriptors and the 401 lifecycle transition.
//!
//! A `PendingRequest` captures everything needed to send a request again:
//! method, URL, headers, and a replayable body. It is never mutated in place;
//! the one permitted retry produces a new descriptor via
//! [`PendingRequest::into_retry`].

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;

use super::ApiError;

/// One field of a multipart upload
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                mime,
                bytes,
            },
        }
    }
}

/// Request payload in a form that can be sent more than once.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    fn to_form(parts: &[FormPart]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in parts {
            form = match &part.value {
                PartValue::Text(value) => form.text(part.name.clone(), value.clone()),
                PartValue::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime)?;
                    }
                    form.part(part.name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Merged over the default headers
    pub headers: Vec<(String, String)>,
    /// Appended to the URL query string
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}

/// What the client does next with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the response to the caller unmodified
    Resolve,
    /// Obtain a new access token and replay the request once
    Refresh,
}

/// Decide the next lifecycle step for `request` given a response status.
///
/// Only a 401 on a descriptor that has not been retried leads to a refresh.
pub fn classify(status: StatusCode, request: &PendingRequest) -> Disposition {
    if status == StatusCode::UNAUTHORIZED && !request.retried {
        Disposition::Refresh
    } else {
        Disposition::Resolve
    }
}

/// Descriptor for one outgoing call.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
    bearer: Option<String>,
    retried: bool,
}

impl PendingRequest {
    /// Build a descriptor for `base_url + path`, attaching the access token if any.
    pub fn build(
        method: Method,
        base_url: &str,
        path: &str,
        body: RequestBody,
        options: &RequestOptions,
        access_token: Option<&str>,
    ) -> Result<Self, ApiError> {
        let raw = join_url(base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if !options.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &options.query {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = default_headers();
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        if body.is_multipart() {
            // the transport writes multipart/form-data with its own boundary
            headers.remove(header::CONTENT_TYPE);
        }

        let request = Self {
            method,
            url,
            headers,
            body,
            bearer: None,
            retried: false,
        };
        match access_token {
            Some(token) => request.with_bearer(token),
            None => Ok(request),
        }
    }

    /// Copy of this descriptor with the `Authorization` header replaced
    pub fn with_bearer(&self, token: &str) -> Result<Self, ApiError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidHeader(header::AUTHORIZATION.to_string()))?;
        value.set_sensitive(true);

        let mut next = self.clone();
        next.headers.insert(header::AUTHORIZATION, value);
        next.bearer = Some(token.to_string());
        Ok(next)
    }

    /// The descriptor for the single replay after a successful refresh
    pub fn into_retry(self, token: &str) -> Result<Self, ApiError> {
        let mut next = self.with_bearer(token)?;
        next.retried = true;
        Ok(next)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Access token this descriptor carries, if any
    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn to_reqwest(&self, client: &Client) -> Result<RequestBuilder, ApiError> {
        let builder = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        Ok(match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(RequestBody::to_form(parts)?),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
