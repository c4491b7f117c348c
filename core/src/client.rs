//! The AMP360 client: immutable endpoint resolver plus a swappable session.
//!
//! # Design
//! The base URL never changes after construction. The token, user agent and
//! transport live together in a `Session` behind a `RwLock<Arc<_>>`; each
//! call clones the `Arc` once and works from that snapshot, so swapping the
//! token or transport never affects requests already in flight. Resource
//! services are short-lived borrows of the client (`client.terminals()`).

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::config::ClientConfig;
use crate::endpoint::EndpointResolver;
use crate::error::ApiError;
use crate::services::{CompaniesService, ModelsService, TemplatesService, TerminalsService};
use crate::transport::{ReqwestTransport, Transport};

pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) user_agent: String,
    pub(crate) transport: Arc<dyn Transport>,
}

/// Client for the AMP360 terminal-management API.
pub struct Amp360Client {
    resolver: EndpointResolver,
    session: RwLock<Arc<Session>>,
}

impl Amp360Client {
    /// Build a client that uses the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, transport)
    }

    /// Build a client around a caller-supplied transport.
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self, ApiError>
    where
        T: Transport + 'static,
    {
        let resolver = EndpointResolver::new(config.environment.base_url())?;
        Ok(Self {
            resolver,
            session: RwLock::new(Arc::new(Session {
                token: config.token,
                user_agent: config.user_agent,
                transport: Arc::new(transport),
            })),
        })
    }

    pub fn base_url(&self) -> &Url {
        self.resolver.base_url()
    }

    pub fn token(&self) -> String {
        self.session.read().token.clone()
    }

    pub fn user_agent(&self) -> String {
        self.session.read().user_agent.clone()
    }

    /// Transport used by calls started from now on.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.session.read().transport)
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.update(|session| Session {
            token,
            user_agent: session.user_agent.clone(),
            transport: Arc::clone(&session.transport),
        });
    }

    pub fn set_transport<T>(&self, transport: T)
    where
        T: Transport + 'static,
    {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        self.update(|session| Session {
            token: session.token.clone(),
            user_agent: session.user_agent.clone(),
            transport,
        });
    }

    pub fn terminals(&self) -> TerminalsService<'_> {
        TerminalsService::new(self)
    }

    pub fn templates(&self) -> TemplatesService<'_> {
        TemplatesService::new(self)
    }

    pub fn models(&self) -> ModelsService<'_> {
        ModelsService::new(self)
    }

    pub fn companies(&self) -> CompaniesService<'_> {
        CompaniesService::new(self)
    }

    pub(crate) fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub(crate) fn session(&self) -> Arc<Session> {
        Arc::clone(&*self.session.read())
    }

    fn update(&self, f: impl FnOnce(&Session) -> Session) {
        let mut guard = self.session.write();
        let next = f(&**guard);
        *guard = Arc::new(next);
    }
}

impl fmt::Debug for Amp360Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Amp360Client")
            .field("base_url", &self.resolver.base_url().as_str())
            .field("user_agent", &self.user_agent())
            .finish_non_exhaustive()
    }
}
