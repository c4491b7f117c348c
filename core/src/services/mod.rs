//! Resource services: thin borrows of [`Amp360Client`](crate::Amp360Client)
//! grouping endpoint calls per entity.

mod companies;
mod models;
mod templates;
mod terminals;

pub use companies::CompaniesService;
pub use models::ModelsService;
pub use templates::TemplatesService;
pub use terminals::TerminalsService;

use crate::error::ApiError;

fn require_id(id: &str, what: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::Validation(format!("{what} id is required")));
    }
    Ok(())
}
