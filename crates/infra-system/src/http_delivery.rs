// HTTP delivery adapter
// reason: reqwest for the JSON import request, tokio timeout as a hard upper bound
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use exchanger_core::port::{Delivery, DeliveryError, DeliveryReceipt, DeliveryRequest};

/// Upper bound for a single dispatch (30s)
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Response header carrying the endpoint's reference for the import
const REFERENCE_HEADER: &str = "x-import-reference";

/// Posts delivery requests as JSON to an import endpoint
pub struct HttpDelivery {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
    timeout: Duration,
}

impl HttpDelivery {
    /// Create a delivery client
    ///
    /// # Arguments
    /// * `endpoint` - Import endpoint URL; `None` makes every dispatch fail with `NotConfigured`
    /// * `token` - Optional bearer token
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            token: token.filter(|t| !t.trim().is_empty()),
            timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn post(
        &self,
        endpoint: &str,
        request: &DeliveryRequest,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let mut builder = self.client.post(endpoint).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let reference = response
            .headers()
            .get(REFERENCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(DeliveryReceipt {
            status: status.as_u16(),
            reference,
        })
    }
}

#[async_trait]
impl Delivery for HttpDelivery {
    async fn dispatch(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let endpoint = self.endpoint.as_deref().ok_or(DeliveryError::NotConfigured)?;

        info!(
            endpoint = %endpoint,
            table = %request.table,
            url = %request.url,
            "Dispatching import request"
        );

        match timeout(self.timeout, self.post(endpoint, request)).await {
            Ok(Ok(receipt)) => {
                info!(status = receipt.status, reference = ?receipt.reference, "Import request accepted");
                Ok(receipt)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Import request failed");
                Err(e)
            }
            Err(_) => Err(DeliveryError::Transport(format!(
                "request timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
