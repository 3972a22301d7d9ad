//! HTTP transport built on reqwest.
//!
//! # Responsibilities
//! - Join the endpoint base address with the request path
//! - Authenticate per service type (bearer token, API key, none)
//! - Propagate the request id as `x-request-id`
//! - Map reqwest failures onto `TransportError`
//!
//! # Design Decisions
//! - Failure statuses are returned as ordinary responses; the client decides
//! - The deadline is enforced by the caller, reqwest's own timeout is a backstop

use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::{Host, Url};

use crate::config::{EndpointConfig, ServiceType};
use crate::transport::credentials::Credentials;
use crate::transport::types::{HttpMethod, IntegrationRequest, TransportError, TransportResponse};
use crate::transport::Transport;

/// How outbound calls are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    None,
    Bearer,
    ApiKey { header: &'static str },
}

impl AuthScheme {
    /// Scheme used for a service type, and whether credentials are mandatory.
    pub fn for_service(service_type: ServiceType) -> (Self, bool) {
        match service_type {
            ServiceType::Crm => (AuthScheme::Bearer, true),
            ServiceType::PhotoManagement => (AuthScheme::ApiKey { header: "x-api-key" }, true),
            ServiceType::Rest => (AuthScheme::Bearer, false),
        }
    }
}

/// Generic JSON-over-HTTP transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    auth: AuthScheme,
    credentials: Option<Credentials>,
    backstop: Duration,
}

impl HttpTransport {
    /// Create a transport for an endpoint.
    pub fn new(
        endpoint: &EndpointConfig,
        auth: AuthScheme,
        credentials: Option<Credentials>,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(&endpoint.base_url).map_err(|e| {
            TransportError::InvalidRequest(format!(
                "invalid base_url '{}': {}",
                endpoint.base_url, e
            ))
        })?;

        // Slightly above the client-side deadline so the caller's timer wins.
        let backstop = endpoint.timeout() + Duration::from_millis(500);
        let mut builder = reqwest::Client::builder()
            .timeout(backstop)
            .user_agent(concat!("integration-hub/", env!("CARGO_PKG_VERSION")));
        if is_loopback(&base_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            auth,
            credentials,
            backstop,
        })
    }

    pub fn auth(&self) -> AuthScheme {
        self.auth
    }

    /// Header set from credentials, if any. A caller-supplied header of the
    /// same name is not sent.
    pub fn owned_header(&self) -> Option<&'static str> {
        if self.credentials.is_none() {
            return None;
        }
        match self.auth {
            AuthScheme::None => None,
            AuthScheme::Bearer => Some("authorization"),
            AuthScheme::ApiKey { header } => Some(header),
        }
    }

    /// Full URL for a request path.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid path '{}': {}", path, e)))
    }

    async fn send(
        &self,
        request: &IntegrationRequest,
        request_id: &str,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header("x-request-id", request_id);

        let owned = self.owned_header();
        for (name, value) in &request.headers {
            if owned == Some(name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        if self.auth != AuthScheme::None {
            if let Some(credentials) = &self.credentials {
                let secret = credentials.resolve().await?;
                builder = match self.auth {
                    AuthScheme::Bearer => builder.bearer_auth(secret),
                    AuthScheme::ApiKey { header } => builder.header(header, secret),
                    AuthScheme::None => builder,
                };
            }
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        tracing::debug!(request_id = %request_id, status, "Transport call completed");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                after_ms: self.backstop.as_millis() as u64,
            }
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

impl Transport for HttpTransport {
    fn execute_request<'a>(
        &'a self,
        request: &'a IntegrationRequest,
        request_id: &'a str,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        Box::pin(self.send(request, request_id))
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Loopback targets never go through an environment proxy.
fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base_url: &str) -> EndpointConfig {
        EndpointConfig::new("crm", "CRM", ServiceType::Crm, base_url)
    }

    #[test]
    fn test_url_join_handles_slashes() {
        let transport =
            HttpTransport::new(&endpoint("https://crm.example.com/api/v2/"), AuthScheme::None, None)
                .unwrap();
        assert_eq!(
            transport.url_for("/contacts/1").unwrap().as_str(),
            "https://crm.example.com/api/v2/contacts/1"
        );
        assert_eq!(
            transport.url_for("contacts").unwrap().as_str(),
            "https://crm.example.com/api/v2/contacts"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new(&endpoint("::nope"), AuthScheme::None, None).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn test_owned_header_follows_auth_and_credentials() {
        let crm = endpoint("http://localhost");
        let token = || Some(Credentials::token("t"));

        let bearer = HttpTransport::new(&crm, AuthScheme::Bearer, token()).unwrap();
        assert_eq!(bearer.owned_header(), Some("authorization"));

        let api_key =
            HttpTransport::new(&crm, AuthScheme::ApiKey { header: "x-api-key" }, token()).unwrap();
        assert_eq!(api_key.owned_header(), Some("x-api-key"));

        let anonymous = HttpTransport::new(&crm, AuthScheme::Bearer, None).unwrap();
        assert_eq!(anonymous.owned_header(), None);
    }

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback(&Url::parse("http://127.0.0.1:8080").unwrap()));
        assert!(is_loopback(&Url::parse("http://localhost/api").unwrap()));
        assert!(is_loopback(&Url::parse("http://[::1]:9000").unwrap()));
        assert!(!is_loopback(&Url::parse("https://crm.example.com").unwrap()));
    }

    #[test]
    fn test_auth_scheme_per_service() {
        assert_eq!(AuthScheme::for_service(ServiceType::Crm), (AuthScheme::Bearer, true));
        assert_eq!(
            AuthScheme::for_service(ServiceType::PhotoManagement),
            (AuthScheme::ApiKey { header: "x-api-key" }, true)
        );
        assert_eq!(AuthScheme::for_service(ServiceType::Rest), (AuthScheme::Bearer, false));
    }
}
