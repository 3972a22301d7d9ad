//! Endpoint registry and client factory.
//!
//! # Responsibilities
//! - Hold endpoint configurations keyed by id
//! - Build one client per endpoint, choosing the transport by service type
//! - Fan every client's events into the manager's channel
//! - Report health across clients
//!
//! # Design Decisions
//! - No global instance: the application builds one and shares it by `Arc`
//! - Re-registering an id replaces the config for clients created afterwards;
//!   existing clients keep the config they were built with

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::{EndpointConfig, IntegrationConfig};
use crate::health::EndpointHealth;
use crate::integration::client::IntegrationClient;
use crate::integration::types::ConfigurationError;
use crate::observability::events::{EventSink, IntegrationEvent};
use crate::transport::{AuthScheme, Credentials, HttpTransport, Transport};

#[derive(Debug, Default)]
pub struct IntegrationManager {
    endpoints: DashMap<String, Arc<EndpointConfig>>,
    clients: DashMap<String, Arc<IntegrationClient>>,
    events: EventSink,
}

impl IntegrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with every endpoint of a loaded config registered.
    pub fn from_config(config: &IntegrationConfig) -> Self {
        let manager = Self::new();
        for endpoint in &config.endpoints {
            manager.register_endpoint(endpoint.clone());
        }
        manager
    }

    /// Insert or replace an endpoint configuration.
    pub fn register_endpoint(&self, config: EndpointConfig) {
        tracing::info!(
            endpoint = %config.id,
            service_type = %config.service_type,
            base_url = %config.base_url,
            "Registered integration endpoint"
        );
        self.endpoints.insert(config.id.clone(), Arc::new(config));
    }

    pub fn endpoint(&self, id: &str) -> Option<Arc<EndpointConfig>> {
        self.endpoints.get(id).map(|r| r.value().clone())
    }

    /// Build the client for a registered endpoint using the built-in
    /// HTTP transport for its service type.
    pub fn create_client(
        &self,
        endpoint_id: &str,
        credentials: Option<Credentials>,
    ) -> Result<Arc<IntegrationClient>, ConfigurationError> {
        let endpoint = self.lookup(endpoint_id)?;

        let (auth, required) = AuthScheme::for_service(endpoint.service_type);
        let auth = match (&credentials, required) {
            (None, true) => {
                return Err(ConfigurationError::MissingCredentials {
                    endpoint_id: endpoint.id.clone(),
                    service_type: endpoint.service_type,
                })
            }
            (None, false) => AuthScheme::None,
            (Some(_), _) => auth,
        };

        let transport = HttpTransport::new(&endpoint, auth, credentials).map_err(|source| {
            ConfigurationError::Transport {
                endpoint_id: endpoint.id.clone(),
                source,
            }
        })?;

        Ok(self.install(endpoint, Arc::new(transport)))
    }

    /// Build the client for a registered endpoint around a caller-supplied
    /// transport.
    pub fn create_client_with_transport(
        &self,
        endpoint_id: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<IntegrationClient>, ConfigurationError> {
        let endpoint = self.lookup(endpoint_id)?;
        Ok(self.install(endpoint, transport))
    }

    fn lookup(&self, endpoint_id: &str) -> Result<Arc<EndpointConfig>, ConfigurationError> {
        self.endpoint(endpoint_id)
            .ok_or_else(|| ConfigurationError::UnknownEndpoint(endpoint_id.to_string()))
    }

    fn install(
        &self,
        endpoint: Arc<EndpointConfig>,
        transport: Arc<dyn Transport>,
    ) -> Arc<IntegrationClient> {
        let id = endpoint.id.clone();
        let client = Arc::new(IntegrationClient::with_events(
            endpoint,
            transport,
            self.events.forwarding_to(),
        ));

        if self.clients.insert(id.clone(), client.clone()).is_some() {
            tracing::info!(endpoint = %id, "Replaced integration client");
        } else {
            tracing::info!(endpoint = %id, "Created integration client");
        }
        client
    }

    pub fn get_client(&self, id: &str) -> Option<Arc<IntegrationClient>> {
        self.clients.get(id).map(|r| r.value().clone())
    }

    /// All clients, ordered by endpoint id.
    pub fn get_all_clients(&self) -> Vec<Arc<IntegrationClient>> {
        let mut clients: Vec<Arc<IntegrationClient>> =
            self.clients.iter().map(|r| r.value().clone()).collect();
        clients.sort_by(|a, b| a.id().cmp(b.id()));
        clients
    }

    /// Health snapshot of every client, keyed by endpoint id.
    pub fn get_health_status(&self) -> BTreeMap<String, EndpointHealth> {
        self.clients
            .iter()
            .map(|r| (r.key().clone(), EndpointHealth::from_client(r.value())))
            .collect()
    }

    /// Events of every client created by this manager.
    pub fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }
}
