//! The authenticated request layer.
//!
//! A [`Connector`] owns the endpoint, the credentials and the current session token.
//! Every resource fetched through it keeps a borrowed reference back to it, so further
//! navigation reuses the same session without authenticating again.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::client::{ClientConfig, PollPolicy};
use crate::config::ConnectorConfig;
use crate::envelope::{decode_xml, ApiResponse};
use crate::error::{decode_api_error, ApiErrorRecord, Error, Result};
use crate::types::{accept_header, AUTH_HEADER, SESSIONS_PATH};

const USER_AGENT: &str = concat!("vcloud-core/", env!("CARGO_PKG_VERSION"));

/// Builder for [`Connector`].
#[derive(Debug, Clone)]
pub struct ConnectorBuilder {
    config: ConnectorConfig,
    http_config: ClientConfig,
    poll_policy: Option<PollPolicy>,
}

impl ConnectorBuilder {
    /// Create a new builder from a [`ConnectorConfig`].
    #[must_use]
    pub fn new(config: ConnectorConfig) -> Self {
        let http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_body_logging(config.debug);

        Self {
            config,
            http_config,
            poll_policy: None,
        }
    }

    /// Override the HTTP client configuration used when building the connector.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Override the polling policy tasks use by default.
    #[must_use]
    pub const fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = Some(policy);
        self
    }

    /// Finalise the builder and create the [`Connector`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid, the CA certificate
    /// cannot be loaded, or the HTTP client cannot be built.
    pub fn build(self) -> Result<Connector> {
        self.config.check()?;
        let base_url = self.config.endpoint_url()?;

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(self.http_config.timeout)
            .connect_timeout(self.http_config.connect_timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host);

        if !self.config.tls_verify {
            warn!(endpoint = %base_url, "TLS verification disabled for vCloud connector");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.config.tls_ca_cert {
            debug!("loading vCloud CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::Config(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::Config(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        let poll_policy = self
            .poll_policy
            .unwrap_or_else(|| self.config.poll.policy());

        Ok(Connector {
            http,
            base_url,
            username: self.config.username,
            password: SecretString::from(self.config.password),
            accept: accept_header(&self.config.api_version),
            session: RwLock::new(None),
            poll_policy,
            log_bodies: self.http_config.log_bodies,
        })
    }
}

/// Single authenticated channel to the API.
///
/// Verbs hold a read lock on the session token for the whole round-trip and
/// [`authenticate`](Self::authenticate) holds the write lock, so a request never goes
/// out with a token that is being replaced.
pub struct Connector {
    http: Client,
    base_url: Url,
    username: String,
    password: SecretString,
    accept: String,
    session: RwLock<Option<SecretString>>,
    poll_policy: PollPolicy,
    log_bodies: bool,
}

impl Connector {
    /// Construct a connector directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`ConnectorBuilder::build`].
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        ConnectorBuilder::new(config).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: ConnectorConfig) -> ConnectorBuilder {
        ConnectorBuilder::new(config)
    }

    /// Return the endpoint every href is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default polling policy for tasks fetched through this connector.
    #[must_use]
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    /// Returns true if a session token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Open a session and store its token.
    ///
    /// Safe to call again to refresh the session; the previous token is discarded
    /// before the new attempt, so after a failure no token is held.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] with the server's message when the
    /// credentials are rejected, or [`Error::Transport`] if the endpoint is unreachable.
    pub async fn authenticate(&self) -> Result<()> {
        let url = self.resolve_href(SESSIONS_PATH)?;
        let mut session = self.session.write().await;
        *session = None;

        debug!(url = %url, username = %self.username, "Opening vCloud session");
        let response = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(ACCEPT, &self.accept)
            .send()
            .await?;

        let token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let envelope = self.read_envelope(response).await?;

        if !(200..300).contains(&envelope.status) {
            let message = match decode_xml::<ApiErrorRecord>(&envelope.body) {
                Ok(record) => record.message,
                Err(_) => format!("session endpoint returned status {}", envelope.status),
            };
            warn!(status = envelope.status, username = %self.username, "vCloud login rejected");
            return Err(Error::Authentication(message));
        }

        let token = token.filter(|value| !value.is_empty()).ok_or_else(|| {
            Error::Authentication(format!("response carried no `{AUTH_HEADER}` header"))
        })?;

        *session = Some(SecretString::from(token));
        info!(username = %self.username, "Authenticated vCloud session");
        Ok(())
    }

    /// Fetch a representation; succeeds only on `200 OK`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any other status, or a transport error.
    pub async fn get(&self, href: &str) -> Result<ApiResponse> {
        self.execute(Method::GET, href, None, StatusCode::OK).await
    }

    /// Submit a payload; succeeds only on `201 Created`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any other status, or a transport error.
    pub async fn post(
        &self,
        href: &str,
        body: impl Into<Vec<u8>>,
        media_type: &str,
    ) -> Result<ApiResponse> {
        self.execute(
            Method::POST,
            href,
            Some((body.into(), media_type)),
            StatusCode::CREATED,
        )
        .await
    }

    /// Replace a representation; succeeds only on `201 Created`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any other status, or a transport error.
    pub async fn put(
        &self,
        href: &str,
        body: impl Into<Vec<u8>>,
        media_type: &str,
    ) -> Result<ApiResponse> {
        self.execute(
            Method::PUT,
            href,
            Some((body.into(), media_type)),
            StatusCode::CREATED,
        )
        .await
    }

    /// Remove a resource; succeeds only on `200 OK`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any other status, or a transport error.
    pub async fn delete(&self, href: &str) -> Result<ApiResponse> {
        self.execute(Method::DELETE, href, None, StatusCode::OK).await
    }

    /// Normalize an href to path and query, then join it onto the endpoint.
    ///
    /// Absolute and scheme-relative hrefs keep only their path and query; the
    /// connector always owns scheme and host, so the session token never leaves the
    /// configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHref`] for empty or unparsable hrefs.
    pub fn resolve_href(&self, href: &str) -> Result<Url> {
        let href = href.trim();
        if href.is_empty() {
            return Err(Error::InvalidHref("empty href".to_string()));
        }

        let parsed = self
            .base_url
            .join(href)
            .map_err(|err| Error::InvalidHref(format!("`{href}`: {err}")))?;

        let mut url = self.base_url.clone();
        url.set_path(parsed.path());
        url.set_query(parsed.query());
        Ok(url)
    }

    async fn execute(
        &self,
        method: Method,
        href: &str,
        payload: Option<(Vec<u8>, &str)>,
        expected: StatusCode,
    ) -> Result<ApiResponse> {
        let url = self.resolve_href(href)?;
        let session = self.session.read().await;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, &self.accept);
        if let Some(token) = session.as_ref() {
            request = request.header(AUTH_HEADER, token.expose_secret());
        }
        if let Some((body, media_type)) = payload {
            request = request.header(CONTENT_TYPE, media_type).body(body);
        }

        debug!(%method, %url, "Sending vCloud request");
        let response = request.send().await?;
        let envelope = self.read_envelope(response).await?;
        drop(session);

        debug!(%method, %url, status = envelope.status, "Received vCloud response");
        if envelope.status != expected.as_u16() {
            return Err(decode_api_error(envelope.status, &envelope.body));
        }

        Ok(envelope)
    }

    async fn read_envelope(&self, response: Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();

        if self.log_bodies {
            trace!(status, body = %String::from_utf8_lossy(&body), "vCloud response body");
        }

        Ok(ApiResponse::new(status, content_type.as_deref(), body))
    }

    #[cfg(test)]
    pub(crate) async fn session_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|token| token.expose_secret().to_string())
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("poll_policy", &self.poll_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{basic_auth, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUTH_ERROR: &str = r#"<Error majorErrorCode="403" minorErrorCode="ACCESS_TO_RESOURCE_IS_FORBIDDEN" message="Invalid username or password"/>"#;
    const NOT_FOUND: &str = r#"<Error minorErrorCode="NOT_FOUND" message="Resource not found"/>"#;

    fn test_connector(server: &MockServer) -> Connector {
        let config = ConnectorConfig::new(server.uri(), "test@test", "test").unwrap();
        Connector::new(config).unwrap()
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .and(basic_auth("test@test", "test"))
            .and(header("accept", "application/*+xml;version=5.5"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-vcloud-authorization", "test"),
            )
            .mount(server)
            .await;
    }

    async fn authenticated(server: &MockServer) -> Connector {
        mount_session(server).await;
        let connector = test_connector(server);
        connector.authenticate().await.unwrap();
        connector
    }

    #[tokio::test]
    async fn authenticate_stores_token() {
        let server = MockServer::start().await;
        let connector = authenticated(&server).await;

        assert!(connector.is_authenticated().await);
        assert_eq!(connector.session_token().await.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn authenticate_rejected_keeps_token_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(403).set_body_string(AUTH_ERROR))
            .mount(&server)
            .await;

        let config = ConnectorConfig::new(server.uri(), "test@test", "wrong").unwrap();
        let connector = Connector::new(config).unwrap();
        let err = connector.authenticate().await.unwrap_err();

        assert_eq!(
            err,
            Error::Authentication("Invalid username or password".to_string())
        );
        assert_eq!(connector.session_token().await, None);
    }

    #[tokio::test]
    async fn authenticate_without_token_header_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let connector = test_connector(&server);
        let err = connector.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!connector.is_authenticated().await);
    }

    #[tokio::test]
    async fn reauthenticate_keeps_latest_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-vcloud-authorization", "first"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-vcloud-authorization", "second"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/org"))
            .and(header("x-vcloud-authorization", "second"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<OrgList/>"))
            .mount(&server)
            .await;

        let connector = test_connector(&server);
        connector.authenticate().await.unwrap();
        assert_eq!(connector.session_token().await.as_deref(), Some("first"));
        connector.authenticate().await.unwrap();
        assert_eq!(connector.session_token().await.as_deref(), Some("second"));

        let response = connector.get("/api/org").await.unwrap();
        assert_eq!(response.text(), "<OrgList/>");
    }

    /// Mount a session endpoint that hands out `first`, then `second` after `delay`.
    async fn mount_rotating_session(server: &MockServer, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-vcloud-authorization", "first"),
            )
            .up_to_n_times(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-vcloud-authorization", "second")
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }

    /// Mount `/api/org` echoing the session token it was called with.
    async fn mount_token_echo(server: &MockServer, delay: Duration) {
        for token in ["first", "second"] {
            Mock::given(method("GET"))
                .and(path("/api/org"))
                .and(header("x-vcloud-authorization", token))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(token)
                        .set_delay(delay),
                )
                .mount(server)
                .await;
        }
    }

    async fn assert_every_get_carried_a_token(server: &MockServer) {
        let requests = server.received_requests().await.unwrap();
        for request in requests.iter().filter(|r| r.method.as_str() == "GET") {
            let token = request
                .headers
                .get("x-vcloud-authorization")
                .and_then(|value| value.to_str().ok());
            assert!(
                matches!(token, Some("first" | "second")),
                "request went out with token {token:?}"
            );
        }
    }

    #[tokio::test]
    async fn request_waits_for_authentication_in_flight() {
        let server = MockServer::start().await;
        mount_rotating_session(&server, Duration::from_millis(200)).await;
        mount_token_echo(&server, Duration::ZERO).await;

        let connector = test_connector(&server);
        connector.authenticate().await.unwrap();

        let (login, response) = tokio::join!(connector.authenticate(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            connector.get("/api/org").await
        });
        login.unwrap();
        assert_eq!(response.unwrap().text(), "second");

        assert_eq!(connector.get("/api/org").await.unwrap().text(), "second");
        assert_every_get_carried_a_token(&server).await;
    }

    #[tokio::test]
    async fn authentication_waits_for_request_in_flight() {
        let server = MockServer::start().await;
        mount_rotating_session(&server, Duration::ZERO).await;
        mount_token_echo(&server, Duration::from_millis(200)).await;

        let connector = test_connector(&server);
        connector.authenticate().await.unwrap();

        let (response, login) = tokio::join!(connector.get("/api/org"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            connector.authenticate().await
        });
        assert_eq!(response.unwrap().text(), "first");
        login.unwrap();

        assert_eq!(connector.session_token().await.as_deref(), Some("second"));
        assert_eq!(connector.get("/api/org").await.unwrap().text(), "second");
        assert_every_get_carried_a_token(&server).await;
    }

    #[tokio::test]
    async fn get_sends_session_and_accept_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test"))
            .and(header("x-vcloud-authorization", "test"))
            .and(header("accept", "application/*+xml;version=5.5"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "OK",
                    "application/vnd.vmware.vcloud.org+xml;version=5.5",
                ),
            )
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let response = connector.get("/test").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "OK");
        assert_eq!(
            response.media_type.as_deref(),
            Some("application/vnd.vmware.vcloud.org+xml")
        );
    }

    #[tokio::test]
    async fn get_not_found_decodes_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string(NOT_FOUND))
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let err = connector.get("/missing").await.unwrap_err();

        assert_eq!(err.to_string(), "Resource not found");
        assert!(matches!(
            err,
            Error::Api { status: 404, ref minor_code, .. } if minor_code == "NOT_FOUND"
        ));
    }

    #[tokio::test]
    async fn get_with_undecodable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let err = connector.get("/broken").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn absolute_hrefs_are_rebased_on_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/vdc/42"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<Vdc/>"))
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let response = connector
            .get("https://vcd.example.com/api/vdc/42?page=2")
            .await
            .unwrap();
        assert_eq!(response.text(), "<Vdc/>");
    }

    #[tokio::test]
    async fn post_requires_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test"))
            .and(header("content-type", "application/vnd.vmware.vcloud.test+xml"))
            .and(body_string("test request"))
            .respond_with(ResponseTemplate::new(201).set_body_string("OK"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"<Error majorErrorCode="400" minorErrorCode="BAD_REQUEST" message="Unexpected EOF"/>"#,
            ))
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let ok = connector
            .post("/test", "test request", "application/vnd.vmware.vcloud.test+xml")
            .await
            .unwrap();
        assert_eq!(ok.status, 201);

        let err = connector
            .post("/test", "garbage", "application/vnd.vmware.vcloud.test+xml")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected EOF");
    }

    #[tokio::test]
    async fn put_with_ok_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<Error minorErrorCode="X" message="not created"/>"#),
            )
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let err = connector
            .put("/test", "test request", "application/xml")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn delete_requires_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let response = connector.delete("/test").await.unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn foreign_hosts_are_replaced_by_endpoint() {
        let config = ConnectorConfig::new("https://vcd.example.com", "test@test", "test").unwrap();
        let connector = Connector::new(config).unwrap();

        for href in [
            "//attacker.example/api/org",
            "https://attacker.example/api/org",
            "http://attacker.example:8443/api/org",
            "/api/org",
            "api/org",
        ] {
            let url = connector.resolve_href(href).unwrap();
            assert_eq!(url.as_str(), "https://vcd.example.com/api/org", "href {href}");
        }

        let url = connector
            .resolve_href("//attacker.example/api/query?type=vApp&format=records")
            .unwrap();
        assert_eq!(url.host_str(), Some("vcd.example.com"));
        assert_eq!(url.query(), Some("type=vApp&format=records"));
    }

    #[tokio::test]
    async fn scheme_relative_href_stays_on_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/org"))
            .and(header("x-vcloud-authorization", "test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<OrgList/>"))
            .expect(1)
            .mount(&server)
            .await;

        let connector = authenticated(&server).await;
        let response = connector.get("//attacker.example/api/org").await.unwrap();
        assert_eq!(response.text(), "<OrgList/>");
    }

    #[tokio::test]
    async fn empty_href_is_rejected() {
        let server = MockServer::start().await;
        let connector = test_connector(&server);
        let err = connector.get("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidHref(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let config = ConnectorConfig::new("http://127.0.0.1:1", "test@test", "test").unwrap();
        let connector = Connector::new(config).unwrap();
        let err = connector.authenticate().await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
