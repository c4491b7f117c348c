//! Template listing and template parameter sets.
//!
//! # Design
//! An unknown template surfaces as `EntityNotFound` through the 502
//! "Failed to find" rule rather than a 404.

use crate::client::Amp360Client;
use crate::context::CallContext;
use crate::endpoint::encode_segment;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::multipart::Form;
use crate::types::{ParamSet, ParamUpdate, ParamsQuery, TemplateList, TemplatesQuery};

use super::require_id;

/// Application templates and their parameter sets.
#[derive(Debug, Clone, Copy)]
pub struct TemplatesService<'a> {
    client: &'a Amp360Client,
}

impl<'a> TemplatesService<'a> {
    pub(crate) fn new(client: &'a Amp360Client) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        ctx: &CallContext,
        query: &TemplatesQuery,
    ) -> Result<TemplateList, ApiError> {
        self.client
            .process(ctx, HttpMethod::Get, "templates", Some(query), None::<&()>)
            .await
    }

    pub async fn params(
        &self,
        ctx: &CallContext,
        template_id: &str,
        query: &ParamsQuery,
    ) -> Result<ParamSet, ApiError> {
        require_id(template_id, "template")?;
        let path = format!("templates/params/{}", encode_segment(template_id));
        self.client
            .process(ctx, HttpMethod::Get, &path, Some(query), None::<&()>)
            .await
    }

    /// Upload new parameter values; tags the server rejects come back in
    /// `failed` without failing the call. If the update fails outright, any
    /// lists the server sent are in [`ApiError::bulk_lists`].
    pub async fn update_params(
        &self,
        ctx: &CallContext,
        template_id: &str,
        form: &Form,
    ) -> Result<ParamUpdate, ApiError> {
        self.client
            .process_bulk(ctx, "templates/params", template_id, form)
            .await
    }
}
