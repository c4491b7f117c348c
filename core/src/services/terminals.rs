//! Terminal endpoints.
//!
//! # Design
//! Update and delete address a terminal by its numeric id and reject `0`
//! locally. Parameter calls address it by the string id the parameter
//! endpoints use, and a blank id never reaches the network. Update and delete
//! payloads are discarded.

use serde::de::IgnoredAny;

use crate::client::Amp360Client;
use crate::context::CallContext;
use crate::endpoint::encode_segment;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::multipart::Form;
use crate::types::{
    CreatedTerminal, NewTerminal, ParamSet, ParamUpdate, ParamsQuery, TerminalDetails,
    TerminalDetailsQuery, TerminalList, TerminalsQuery,
};

use super::require_id;

/// Terminal CRUD, details and per-terminal parameters.
#[derive(Debug, Clone, Copy)]
pub struct TerminalsService<'a> {
    client: &'a Amp360Client,
}

impl<'a> TerminalsService<'a> {
    pub(crate) fn new(client: &'a Amp360Client) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        ctx: &CallContext,
        query: &TerminalsQuery,
    ) -> Result<TerminalList, ApiError> {
        self.client
            .process(ctx, HttpMethod::Get, "terminals", Some(query), None::<&()>)
            .await
    }

    /// Look a terminal up by id or serial number.
    pub async fn details(
        &self,
        ctx: &CallContext,
        query: &TerminalDetailsQuery,
    ) -> Result<TerminalDetails, ApiError> {
        self.client
            .process(ctx, HttpMethod::Get, "terminals/details", Some(query), None::<&()>)
            .await
    }

    pub async fn create(
        &self,
        ctx: &CallContext,
        terminal: &NewTerminal,
    ) -> Result<CreatedTerminal, ApiError> {
        self.client
            .process(ctx, HttpMethod::Post, "terminals", None::<&()>, Some(terminal))
            .await
    }

    pub async fn update(
        &self,
        ctx: &CallContext,
        id: u64,
        terminal: &NewTerminal,
    ) -> Result<(), ApiError> {
        let path = terminal_path(id)?;
        self.client
            .process::<IgnoredAny, _, _>(ctx, HttpMethod::Put, &path, None::<&()>, Some(terminal))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, ctx: &CallContext, id: u64) -> Result<(), ApiError> {
        let path = terminal_path(id)?;
        self.client
            .process::<IgnoredAny, _, ()>(ctx, HttpMethod::Delete, &path, None::<&()>, None)
            .await?;
        Ok(())
    }

    pub async fn params(
        &self,
        ctx: &CallContext,
        terminal_id: &str,
        query: &ParamsQuery,
    ) -> Result<ParamSet, ApiError> {
        require_id(terminal_id, "terminal")?;
        let path = format!("terminals/params/{}", encode_segment(terminal_id));
        self.client
            .process(ctx, HttpMethod::Get, &path, Some(query), None::<&()>)
            .await
    }

    pub async fn update_params(
        &self,
        ctx: &CallContext,
        terminal_id: &str,
        form: &Form,
    ) -> Result<ParamUpdate, ApiError> {
        self.client
            .process_bulk(ctx, "terminals/params", terminal_id, form)
            .await
    }
}

fn terminal_path(id: u64) -> Result<String, ApiError> {
    if id == 0 {
        return Err(ApiError::Validation("terminal id must be non-zero".to_string()));
    }
    Ok(format!("terminals/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::{RequestBody, CONTENT_TYPE};
    use crate::transport::stub::StubTransport;
    use std::sync::Arc;

    fn client(stub: &Arc<StubTransport>) -> Amp360Client {
        Amp360Client::with_transport(
            ClientConfig::new("tok").base_url("http://mock/v1"),
            Arc::clone(stub),
        )
        .unwrap()
    }

    fn ok(data: &str) -> Arc<StubTransport> {
        Arc::new(StubTransport::respond(
            200,
            &format!(r#"{{"success":true,"message":"","data":{data}}}"#),
        ))
    }

    #[tokio::test]
    async fn list_sends_only_set_filters() {
        let stub = ok(r#"{"count":1,"rows":[{"id":7,"serialNumber":"SN-7","status":"active","name":"Till"}]}"#);
        let list = client(&stub)
            .terminals()
            .list(
                &CallContext::new(),
                &TerminalsQuery {
                    serial_number: "SN-7".to_string(),
                    size: 20,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(list.rows[0].id, 7);
        assert_eq!(
            stub.last_request().unwrap().url,
            "http://mock/v1/terminals?serialNumber=SN-7&size=20"
        );
    }

    #[tokio::test]
    async fn details_by_serial_number() {
        let stub = ok(r#"{"templateDetails":[],"terminal":{"id":7,"serialNumber":"SN-7","queueFirmware":0}}"#);
        let details = client(&stub)
            .terminals()
            .details(
                &CallContext::new(),
                &TerminalDetailsQuery {
                    serial_number: "SN-7".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(details.terminal.serial_number, "SN-7");
        assert_eq!(
            stub.last_request().unwrap().url,
            "http://mock/v1/terminals/details?serialNumber=SN-7"
        );
    }

    #[tokio::test]
    async fn create_posts_json_body() {
        let stub = ok(r#"{"id":8,"serialNumber":"SN-8","name":"Bar","status":"active"}"#);
        let created = client(&stub)
            .terminals()
            .create(
                &CallContext::new(),
                &NewTerminal {
                    model_id: "test1".to_string(),
                    serial_number: "SN-8".to_string(),
                    name: "Bar".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, 8);

        let request = stub.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header(CONTENT_TYPE), Some("application/json"));
        let sent: serde_json::Value = serde_json::from_slice(request.body.as_bytes()).unwrap();
        assert_eq!(sent["serialNumber"], "SN-8");
    }

    #[tokio::test]
    async fn duplicate_serial_is_conflict() {
        let stub = Arc::new(StubTransport::respond(
            409,
            r#"{"success":false,"message":"Terminal already exists"}"#,
        ));
        let err = client(&stub)
            .terminals()
            .create(&CallContext::new(), &NewTerminal::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict));
    }

    #[tokio::test]
    async fn update_ignores_payload() {
        let stub = ok(r#"[1]"#);
        client(&stub)
            .terminals()
            .update(&CallContext::new(), 7, &NewTerminal::default())
            .await
            .unwrap();
        let request = stub.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.url, "http://mock/v1/terminals/7");
    }

    #[tokio::test]
    async fn delete_has_no_body() {
        let stub = ok("null");
        client(&stub)
            .terminals()
            .delete(&CallContext::new(), 7)
            .await
            .unwrap();
        let request = stub.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn params_always_send_category_key() {
        let stub = ok(r#"{"categories":[],"count":0,"rows":[]}"#);
        client(&stub)
            .terminals()
            .params(&CallContext::new(), "7", &ParamsQuery::default())
            .await
            .unwrap();
        assert_eq!(
            stub.last_request().unwrap().url,
            "http://mock/v1/terminals/params/7?categoryId="
        );
    }

    #[tokio::test]
    async fn zero_id_is_rejected_without_io() {
        let stub = ok("null");
        let client = client(&stub);
        let terminals = client.terminals();
        let ctx = CallContext::new();

        assert!(matches!(
            terminals.delete(&ctx, 0).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            terminals.update(&ctx, 0, &NewTerminal::default()).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            terminals.params(&ctx, "", &ParamsQuery::default()).await,
            Err(ApiError::Validation(_))
        ));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_terminal_params_update_is_not_found() {
        let stub = Arc::new(StubTransport::respond(404, "Not Found"));
        let err = client(&stub)
            .terminals()
            .update_params(&CallContext::new(), "404", &Form::new().field("A", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::EntityNotFound));
        assert_eq!(
            stub.last_request().unwrap().url,
            "http://mock/v1/terminals/params/404"
        );
    }
}
