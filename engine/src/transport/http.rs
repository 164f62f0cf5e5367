//! HTTP Transport
//!
//! [`Transport`] implementation backed by `reqwest`. All endpoints are POSTs
//! with multipart bodies. The client has no request timeout: a call runs
//! until the server answers or the connection fails.

use async_trait::async_trait;
use docsum_sdk::errors::ClientError;
use reqwest::multipart;
use reqwest::Client;

use super::{Endpoint, Form, FormField, Response, ResponseKind, Result, Transport, TransportError};

/// Transport talking to a live document server
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// API base URL without trailing slash (e.g. "http://localhost:8000/api")
    base_url: String,

    /// HTTP client for API requests
    client: Client,
}

impl HttpTransport {
    /// Create a transport for the API rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(base_url: impl Into<String>) -> std::result::Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("docsum/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn to_multipart(form: Form) -> multipart::Form {
        form.into_fields()
            .into_iter()
            .fold(multipart::Form::new(), |acc, field| match field {
                FormField::Text { name, value } => acc.text(name, value),
                FormField::File {
                    name,
                    file_name,
                    bytes,
                } => acc.part(name, multipart::Part::bytes(bytes).file_name(file_name)),
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<Form>,
        kind: ResponseKind,
    ) -> Result<Response> {
        let url = self.url(endpoint);

        let mut request = self.client.post(&url);
        if let Some(form) = payload {
            tracing::debug!(
                "Request {}: {} form field(s)",
                endpoint,
                form.fields().len()
            );
            request = request.multipart(Self::to_multipart(form));
        }

        let start = std::time::Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                TransportError::network(format!(
                    "Cannot connect to document server at {}. Is it running?",
                    self.base_url
                ))
            } else {
                TransportError::network(e.to_string())
            }
        })?;

        let status = response.status();
        tracing::info!(
            "{} responded {} in {:.1}s",
            endpoint,
            status.as_u16(),
            start.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let err = TransportError::from_response_body(status.as_u16(), &body);
            tracing::warn!("{} failed: {}", endpoint, err);
            return Err(err);
        }

        match kind {
            ResponseKind::Json => {
                let value = response.json().await.map_err(|e| {
                    TransportError::decode(format!("Failed to parse server response: {}", e))
                })?;
                Ok(Response::Json(value))
            }
            ResponseKind::Binary => {
                let bytes = response.bytes().await.map_err(|e| {
                    TransportError::network(format!("Failed to read server response: {}", e))
                })?;
                Ok(Response::Binary(bytes.to_vec()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_path() {
        let transport = HttpTransport::new("http://localhost:8000/api/").unwrap();

        assert_eq!(transport.base_url(), "http://localhost:8000/api");
        assert_eq!(
            transport.url(Endpoint::ExportPdf),
            "http://localhost:8000/api/download/pdf"
        );
    }
}
