use super::Endpoint;
use crate::error::{ExplorerError, TransportError};
use reqwest::header::HeaderMap;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware};
use std::{fmt, sync::Arc, time::Duration};
use url::Url;

#[derive(Clone, Default)]
pub struct HttpApiClientConfig {
    /// Limit for a single request. `None` leaves requests unbounded.
    pub http_timeout: Option<Duration>,
    pub default_headers: HeaderMap,
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

// `Middleware` does not implement `Debug`, so the field is skipped.
impl fmt::Debug for HttpApiClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpApiClientConfig")
            .field("http_timeout", &self.http_timeout)
            .field("default_headers", &self.default_headers)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

#[derive(Clone)]
pub struct HttpApiClient {
    base_url: Url,
    http_client: ClientWithMiddleware,
}

impl HttpApiClient {
    pub fn new(base_url: Url, config: HttpApiClientConfig) -> Result<Self, ExplorerError> {
        let mut builder = reqwest::Client::builder().default_headers(config.default_headers);
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let http_client = config
            .middlewares
            .into_iter()
            .fold(ClientBuilder::new(client), |builder, middleware| {
                builder.with_arc(middleware)
            })
            .build();

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn url<E: Endpoint>(&self, endpoint: &E) -> Result<Url, ExplorerError> {
        endpoint
            .url(&self.base_url)
            .map_err(|err| TransportError::from(err).into())
    }

    /// Sends the request and decodes a successful JSON body.
    ///
    /// Non-2xx responses are returned as [`TransportError::UnexpectedStatus`]
    /// carrying the raw body, bodies which do not match `E::Response` as
    /// [`ExplorerError::MalformedResponse`] with the path of the offending field.
    #[tracing::instrument(skip_all, level = "debug", fields(url), err)]
    pub async fn request<E: Endpoint>(&self, endpoint: &E) -> Result<E::Response, ExplorerError> {
        let url = self.url(endpoint)?;
        tracing::Span::current().record("url", tracing::field::display(&url));

        let response = self
            .http_client
            .request(endpoint.method(), url.clone())
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::UnexpectedStatus {
                url,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            }
            .into());
        }

        let deserializer = &mut serde_json::Deserializer::from_slice(&body);
        serde_path_to_error::deserialize(deserializer)
            .map_err(|err| ExplorerError::MalformedResponse(format!("{url}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::{Method, StatusCode};
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[derive(Debug, Deserialize, PartialEq)]
    struct Status {
        status: String,
    }

    struct GetStatus;

    impl Endpoint for GetStatus {
        type Response = Status;

        fn method(&self) -> Method {
            Method::GET
        }

        fn path(&self) -> String {
            "status.json".to_string()
        }

        fn query(&self) -> Option<String> {
            Some("search=(a:[1+TO+2])+AND+b&count=c".to_string())
        }
    }

    async fn client_for(server: &MockServer) -> HttpApiClient {
        let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
        HttpApiClient::new(base_url, HttpApiClientConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn keeps_query_unescaped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let response = client.request(&GetStatus).await.unwrap();
        assert_eq!(
            response,
            Status {
                status: "ok".to_string()
            }
        );

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].url.query(),
            Some("search=(a:[1+TO+2])+AND+b&count=c")
        );
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status.json"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "NOT_FOUND", "message": "No matches found!" }
            })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let err = client.request(&GetStatus).await.unwrap_err();
        match err {
            ExplorerError::Transport(TransportError::UnexpectedStatus { status, body, .. }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("No matches found!"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_field_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "ok" })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let err = client.request(&GetStatus).await.unwrap_err();
        assert!(
            matches!(&err, ExplorerError::MalformedResponse(message) if message.contains("status")),
            "unexpected error: {err:?}"
        );
    }
}
