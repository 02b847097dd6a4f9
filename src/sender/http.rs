use bytes::Bytes;
use futures::future::BoxFuture;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::TransportError;
use crate::port::Publisher;

#[derive(Debug, Clone)]
pub struct HttpPublisherConfig {
    /// Base address of an nsqd HTTP interface, e.g. `http://127.0.0.1:4151`.
    pub endpoint: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpPublisherConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4151".to_string(),
            timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            user_agent: format!("rask-log-bus/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Publishes through nsqd's HTTP interface: `POST {endpoint}/pub?topic=…`
/// with the message body as the raw request body.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
    pub_url: Url,
}

impl HttpPublisher {
    pub fn new(config: HttpPublisherConfig) -> Result<Self, TransportError> {
        let pub_url = pub_url(&config.endpoint)?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            pub_url,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, topic: &str, body: Bytes) -> Result<(), TransportError> {
        let mut url = self.pub_url.clone();
        url.query_pairs_mut().append_pair("topic", topic);

        let response = self
            .client
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(endpoint = %self.endpoint, topic, "Published message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            endpoint: self.endpoint.clone(),
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

impl Publisher for HttpPublisher {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(self.send(topic, body))
    }
}

fn pub_url(endpoint: &str) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let mut url: Url = endpoint.parse().map_err(|e: url::ParseError| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{path}/pub"));
    url.set_query(None);
    Ok(url)
}
