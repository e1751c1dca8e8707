//! Query endpoint client
//!
//! Sends natural-language queries to `POST <base>query?v=<version>` and
//! returns the decoded agent response.
//!
//! A response counts as successful only when the HTTP status is `200 OK`
//! *and* the embedded `status.code` is below 400. The service may answer 200
//! with an application error in the body, or a non-200 with a well-formed
//! error body; both are rejected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use tracing::{debug, instrument};

use crate::codec;
use crate::config::ClientConfig;
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::ClientError;
use crate::models::{Query, QueryResponse};
use crate::ports::QueryEndpoint;
use crate::transport::{HttpTransport, TransportRequest};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP client for the query endpoint
#[derive(Debug, Clone)]
pub struct QueryClient {
    transport: HttpTransport,
    config: Arc<ClientConfig>,
    url: Url,
    diagnostics: Diagnostics,
}

impl QueryClient {
    /// Create a query client
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the configuration is invalid
    /// and `ClientError::InvalidUrl` if no endpoint URL can be built from it.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Configuration)?;

        let transport = HttpTransport::new(Duration::from_millis(config.timeout_ms))?;
        let url = endpoint_url(&config, "query")?;

        Ok(Self {
            transport,
            config,
            url,
            diagnostics: Diagnostics::default(),
        })
    }

    /// Attach a diagnostic sink receiving request and response bodies
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Diagnostics::new(sink);
        self
    }

    /// Resolved endpoint URL
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(&self.config)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Ok(headers)
    }
}

#[async_trait]
impl QueryEndpoint for QueryClient {
    #[instrument(skip(self, query), fields(session_id = %query.session_id))]
    async fn query(&self, mut query: Query) -> Result<QueryResponse, ClientError> {
        query.lang = self.config.language.tag().to_string();

        let body = serde_json::to_vec(&query)?;
        self.diagnostics
            .emit("request body", &String::from_utf8_lossy(&body));

        let request = TransportRequest::new(Method::POST, self.url.clone())
            .with_headers(self.headers()?)
            .with_body(body);

        let response = self.transport.execute(request).await?;

        if response.content_length().is_none_or(|len| len == 0) {
            return Err(ClientError::EmptyResponse { endpoint: "query" });
        }

        let status = response.status();
        let status_line = response.status_line();
        let bytes = response.bytes().await?;
        let raw = String::from_utf8_lossy(&bytes).into_owned();
        self.diagnostics.emit("response body", &raw);

        let decoded = codec::decode(&bytes);

        if status != StatusCode::OK {
            return Err(ClientError::RequestRejected {
                status: status_line,
                body: raw,
            });
        }

        let response = decoded?;
        if !response.status.is_success() {
            return Err(ClientError::RequestRejected {
                status: status_line,
                body: raw,
            });
        }

        debug!(
            action = %response.result.action,
            intent = %response.result.metadata.intent_name,
            "Query resolved"
        );

        Ok(response)
    }
}

/// Build `<base><endpoint>?v=<version>`
pub(crate) fn endpoint_url(config: &ClientConfig, endpoint: &str) -> Result<Url, ClientError> {
    let base = config.normalized_base_url();
    let mut url = Url::parse(&base)
        .and_then(|base| base.join(endpoint))
        .map_err(|e| ClientError::InvalidUrl(format!("{base}{endpoint}: {e}")))?;
    url.query_pairs_mut().append_pair("v", &config.api_version);
    Ok(url)
}

/// `Authorization: Bearer <token>` header value, marked sensitive
pub(crate) fn bearer(config: &ClientConfig) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", config.token()))
        .map_err(|e| ClientError::Configuration(format!("Invalid access token: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::diagnostics::tests::RecordingSink;
    use crate::language::Language;

    fn success_body(session_id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "5bb49696-549d-4655-bfb1-21e1dc806379",
            "timestamp": "2016-12-30T14:29:02.746Z",
            "result": {
                "source": "agent",
                "resolvedQuery": "RequestText",
                "action": "ActionName",
                "parameters": {"param1": "value1"},
                "fulfillment": {"speech": "Some speech text"}
            },
            "status": {"code": 200, "errorType": "success"},
            "sessionId": session_id
        })
    }

    fn create_test_client(mock_server: &MockServer, language: Language) -> QueryClient {
        let config = ClientConfig::new("test-token", language)
            .with_base_url(format!("{}/v1/", mock_server.uri()))
            .with_timeout_ms(5000);
        QueryClient::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn endpoint_url_appends_version() {
        let config = ClientConfig::new("t", Language::English).with_base_url("http://host/v1");
        let url = endpoint_url(&config, "query").unwrap();
        assert_eq!(url.as_str(), "http://host/v1/query?v=20150910");
    }

    #[test]
    fn client_url_uses_custom_version() {
        let config = ClientConfig::new("t", Language::English)
            .with_base_url("http://proxy.local/api")
            .with_api_version("20170712");
        let client = QueryClient::new(Arc::new(config)).unwrap();
        assert_eq!(client.url().as_str(), "http://proxy.local/api/query?v=20170712");
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = ClientConfig::new("", Language::English);
        let err = QueryClient::new(Arc::new(config)).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[tokio::test]
    async fn query_overrides_caller_language() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/query"))
            .and(query_param("v", "20150910"))
            .and(body_json(serde_json::json!({
                "query": ["Hallo"],
                "lang": "de",
                "sessionId": "7"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("7")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, Language::German);
        let mut query = Query::text("7", "Hallo");
        query.lang = "fr".to_string();

        let response = client.query(query).await.unwrap();
        assert_eq!(response.session_id, "7");
    }

    #[tokio::test]
    async fn text_request_sends_expected_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/query"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json; charset=utf-8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("111")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, Language::English);
        let response = client.text_request("111", "RequestText").await.unwrap();

        assert_eq!(response.session_id, "111");
        assert_eq!(response.result.fulfillment.speech, "Some speech text");
    }

    #[tokio::test]
    async fn diagnostics_receive_both_bodies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("1")))
            .mount(&mock_server)
            .await;

        let sink = Arc::new(RecordingSink::default());
        let client =
            create_test_client(&mock_server, Language::English).with_diagnostics(sink.clone());

        client.text_request("1", "hi").await.unwrap();

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, "request body");
        assert!(lines[0].1.contains("\"query\":[\"hi\"]"));
        assert_eq!(lines[1].0, "response body");
        assert!(lines[1].1.contains("\"sessionId\":\"1\""));
    }

    #[tokio::test]
    async fn embedded_error_status_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": {"code": 401, "errorType": "unauthorized"},
                "sessionId": "1"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, Language::English);
        let err = client.text_request("1", "hi").await.unwrap_err();

        match err {
            ClientError::RequestRejected { status, body } => {
                assert_eq!(status, "200 OK");
                assert!(body.contains("unauthorized"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
