//! Builds [`HttpRequest`] values in JSON or multipart mode.
//!
//! # Design
//! The builder borrows the token and user agent from the configuration
//! snapshot the call captured, so a request never sees a token swapped in
//! halfway through building it. Every request gets `accept` and the verbatim
//! `authorization` header; `content-type` is set only when a body exists.

use serde::Serialize;
use url::Url;

use crate::error::ApiError;
use crate::http::{
    HttpMethod, HttpRequest, RequestBody, ACCEPT, ACCEPT_JSON, AUTHORIZATION, CONTENT_TYPE,
    CONTENT_TYPE_JSON, USER_AGENT,
};
use crate::multipart::Form;

#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    token: &'a str,
    user_agent: &'a str,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(token: &'a str, user_agent: &'a str) -> Self {
        Self { token, user_agent }
    }

    /// Build a request with an optional JSON body.
    ///
    /// `None` produces an empty body and no `content-type`, which is not the
    /// same as `Some(&json!({}))`.
    pub fn json<B>(&self, method: HttpMethod, url: Url, body: Option<&B>) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut headers = self.base_headers()?;
        let body = match body {
            Some(body) => {
                let bytes = serde_json::to_vec(body).map_err(ApiError::construction)?;
                headers.push((CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string()));
                RequestBody::Json(bytes)
            }
            None => RequestBody::Empty,
        };
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Build a multipart request; fails without a request if any attachment
    /// cannot be read.
    pub fn multipart(&self, method: HttpMethod, url: Url, form: &Form) -> Result<HttpRequest, ApiError> {
        let mut headers = self.base_headers()?;
        let encoded = form.encode()?;
        headers.push((CONTENT_TYPE.to_string(), encoded.content_type()));
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body: RequestBody::Multipart(encoded.body),
        })
    }

    fn base_headers(&self) -> Result<Vec<(String, String)>, ApiError> {
        check_header_value(AUTHORIZATION, self.token)?;
        let mut headers = vec![
            (ACCEPT.to_string(), ACCEPT_JSON.to_string()),
            (AUTHORIZATION.to_string(), self.token.to_string()),
        ];
        if !self.user_agent.is_empty() {
            check_header_value(USER_AGENT, self.user_agent)?;
            headers.push((USER_AGENT.to_string(), self.user_agent.to_string()));
        }
        Ok(headers)
    }
}

fn check_header_value(name: &str, value: &str) -> Result<(), ApiError> {
    if value.bytes().any(|b| (b < 0x20 && b != b'\t') || b == 0x7f) {
        return Err(ApiError::Construction(format!(
            "header '{name}' contains control characters"
        )));
    }
    Ok(())
}
