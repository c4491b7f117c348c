//! `GET client/children`, paged.

use crate::client::Amp360Client;
use crate::context::CallContext;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{CompaniesQuery, CompanyList};

/// Child companies of the authenticated client.
#[derive(Debug, Clone, Copy)]
pub struct CompaniesService<'a> {
    client: &'a Amp360Client,
}

impl<'a> CompaniesService<'a> {
    pub(crate) fn new(client: &'a Amp360Client) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        ctx: &CallContext,
        query: &CompaniesQuery,
    ) -> Result<CompanyList, ApiError> {
        self.client
            .process(ctx, HttpMethod::Get, "client/children", Some(query), None::<&()>)
            .await
    }
}
