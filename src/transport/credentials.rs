//! Credential providers.
//!
//! Token acquisition is owned by the surrounding application. The transport
//! only asks for the current secret right before each call.

use futures_util::future::{self, BoxFuture};
use std::fmt;
use std::sync::Arc;

use crate::transport::types::TransportError;

/// Supplies a bearer token or API key on demand.
pub trait CredentialProvider: Send + Sync + 'static {
    fn credential(&self) -> BoxFuture<'_, Result<String, TransportError>>;
}

/// A fixed secret, e.g. read from the environment at startup.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl CredentialProvider for StaticCredential {
    fn credential(&self) -> BoxFuture<'_, Result<String, TransportError>> {
        Box::pin(future::ready(Ok(self.0.clone())))
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticCredential(***)")
    }
}

/// Shared handle passed to `IntegrationManager::create_client`.
#[derive(Clone)]
pub struct Credentials(Arc<dyn CredentialProvider>);

impl Credentials {
    pub fn new(provider: impl CredentialProvider) -> Self {
        Self(Arc::new(provider))
    }

    /// Convenience for a fixed token or key.
    pub fn token(secret: impl Into<String>) -> Self {
        Self::new(StaticCredential::new(secret))
    }

    pub async fn resolve(&self) -> Result<String, TransportError> {
        self.0.credential().await
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}
