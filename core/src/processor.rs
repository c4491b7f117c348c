//! The request pipeline shared by every endpoint.
//!
//! # Design
//! A call moves through build, dispatch, decode and classify exactly once.
//! Each stage returns early through `?`, so a construction error never
//! reaches the transport, a transport error never reaches the decoder and a
//! malformed body never reaches the classifier. There are no retries.
//!
//! Only a 200 is decoded into the caller's payload type. Any other status
//! is decoded with the payload ignored, so an error body whose payload does
//! not fit the destination still classifies by status.
//!
//! The bulk path differs in three places: the identifier is validated before
//! anything is built, the body is multipart, and a 404 is answered before
//! decoding because the backend may send a non-JSON body with it. A failed
//! bulk update keeps the `updated`/`failed` lists in
//! [`ApiError::BulkRejected`] whenever the server sent any.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::{classify, failure};
use crate::client::Amp360Client;
use crate::context::CallContext;
use crate::endpoint::{encode_segment, QueryParams};
use crate::envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::Form;
use crate::request::RequestBuilder;
use crate::transport::Transport;

/// Result of a bulk update: what the server applied and what it rejected.
///
/// A call can succeed with a non-empty `failed` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdate<U, F> {
    pub updated: U,
    pub failed: F,
}

impl Amp360Client {
    /// Send a JSON (or bodiless) request and decode the `data` payload.
    pub async fn process<T, Q, B>(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
        Q: QueryParams + ?Sized,
        B: Serialize + ?Sized,
    {
        let session = self.session();
        let url = self.resolver().resolve(path, query)?;
        let request = RequestBuilder::new(&session.token, &session.user_agent).json(method, url, body)?;

        let response = dispatch(ctx, session.transport.as_ref(), request).await?;

        if response.status != 200 {
            let envelope = envelope::decode::<IgnoredAny>(&response.body)?;
            return Err(failure(response.status, &envelope.message));
        }

        let envelope = envelope::decode::<T>(&response.body)?;
        classify(response.status, envelope.success, &envelope.message)?;
        Ok(envelope.data)
    }

    /// POST a multipart form to `{path}/{id}` and decode the bulk envelope.
    pub async fn process_bulk<U, F>(
        &self,
        ctx: &CallContext,
        path: &str,
        id: &str,
        form: &Form,
    ) -> Result<BulkUpdate<U, F>, ApiError>
    where
        U: DeserializeOwned + Default,
        F: DeserializeOwned + Default,
    {
        if id.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "required identifier for '{path}' is missing"
            )));
        }

        let session = self.session();
        let url = self
            .resolver()
            .resolve::<()>(&format!("{path}/{}", encode_segment(id)), None)?;
        let request = RequestBuilder::new(&session.token, &session.user_agent).multipart(
            HttpMethod::Post,
            url,
            form,
        )?;

        let response = dispatch(ctx, session.transport.as_ref(), request).await?;
        if response.status == 404 {
            return Err(ApiError::EntityNotFound);
        }

        if response.status == 200 {
            let envelope = envelope::decode_bulk::<U, F>(&response.body)?;
            if envelope.success {
                return Ok(BulkUpdate {
                    updated: envelope.updated,
                    failed: envelope.failed,
                });
            }
        }

        let envelope = envelope::decode_bulk::<Value, Value>(&response.body)?;
        let error = failure(response.status, &envelope.message);
        if has_entries(&envelope.updated) || has_entries(&envelope.failed) {
            return Err(ApiError::BulkRejected {
                error: Box::new(error),
                updated: envelope.updated,
                failed: envelope.failed,
            });
        }
        Err(error)
    }
}

fn has_entries(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

async fn dispatch(
    ctx: &CallContext,
    transport: &dyn Transport,
    request: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let method = request.method;
    let url = request.url.clone();

    if ctx.is_done() {
        warn!(%method, %url, "call cancelled before dispatch");
        return Err(ApiError::Cancelled);
    }

    debug!(%method, %url, "dispatching request");
    let result = tokio::select! {
        biased;
        _ = ctx.done() => {
            warn!(%method, %url, "call cancelled in flight");
            return Err(ApiError::Cancelled);
        }
        result = transport.send(request) => result,
    };

    match result {
        Ok(response) => {
            debug!(%method, %url, status = response.status, "received response");
            Ok(response)
        }
        Err(_) if ctx.is_done() => {
            warn!(%method, %url, "transport failed after cancellation");
            Err(ApiError::Cancelled)
        }
        Err(err) => {
            debug!(%method, %url, error = %err, "transport failed");
            Err(ApiError::Transport(err))
        }
    }
}
