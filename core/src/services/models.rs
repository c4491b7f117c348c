//! `GET models`.

use crate::client::Amp360Client;
use crate::context::CallContext;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::ModelList;

/// Terminal hardware models.
#[derive(Debug, Clone, Copy)]
pub struct ModelsService<'a> {
    client: &'a Amp360Client,
}

impl<'a> ModelsService<'a> {
    pub(crate) fn new(client: &'a Amp360Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, ctx: &CallContext) -> Result<ModelList, ApiError> {
        self.client
            .process(ctx, HttpMethod::Get, "models", None::<&()>, None::<&()>)
            .await
    }
}
