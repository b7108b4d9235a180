//! # hnsync-gateway
//!
//! Typed GraphQL operations over an authenticated HTTPS client. The
//! [`Gateway`] trait is the seam between the reconciliation engine and the
//! remote publishing service; [`HttpGateway`] is the production
//! implementation, and engine tests script failures through mock
//! implementations of the trait.

pub mod error;
pub mod http;
pub mod types;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use types::{
    CreateSeriesInput, CreatedPost, PublicationPage, PublicationSummary, PublishPostInput,
    RemotePost, RemoteSeries, UpdatePostInput, UserIdentity,
};

use hnsync_core::{PostId, PublicationId};

/// Environment variable holding the bearer token, unless overridden.
pub const TOKEN_ENV_VAR: &str = "HASHNODE_TOKEN";

/// Maximum posts per publication page; the API rejects larger requests.
pub const MAX_PAGE_SIZE: usize = 50;

/// The remote publishing service, as the applier sees it.
///
/// All calls are synchronous; each carries the client's outer timeout.
pub trait Gateway {
    /// Identity verification: the authenticated user and their publications.
    fn me(&self) -> Result<UserIdentity, GatewayError>;

    /// One page of a publication's posts plus its series list. Callers drive
    /// the cursor loop until `has_next_page` is false.
    fn publication_page(
        &self,
        publication: &PublicationId,
        first: usize,
        after: Option<&str>,
    ) -> Result<PublicationPage, GatewayError>;

    fn publish_post(&self, input: &PublishPostInput) -> Result<CreatedPost, GatewayError>;

    fn update_post(&self, input: &UpdatePostInput) -> Result<(), GatewayError>;

    fn remove_post(&self, id: &PostId) -> Result<(), GatewayError>;

    fn create_series(&self, input: &CreateSeriesInput) -> Result<RemoteSeries, GatewayError>;
}

/// Read the bearer token from [`TOKEN_ENV_VAR`].
pub fn token_from_env() -> Result<String, GatewayError> {
    match std::env::var(TOKEN_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(GatewayError::MissingToken {
            var: TOKEN_ENV_VAR.to_owned(),
        }),
    }
}
