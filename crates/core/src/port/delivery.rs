// Delivery Port
// Hands a stored artifact over to the external delivery system

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Import request announced to the delivery endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub job: String,
    pub table: String,
    pub import_type: String,
    /// Public URL of the artifact
    pub url: String,
    pub run_id: String,
    pub synced_at: String,
}

/// Acknowledgement returned by the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub reference: Option<String>,
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Delivery endpoint not configured")]
    NotConfigured,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Delivery: Send + Sync {
    /// Dispatch one request. Failures are reported, never retried.
    async fn dispatch(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records requests; optionally fails every dispatch
    #[derive(Default)]
    pub struct RecordingDelivery {
        requests: Mutex<Vec<DeliveryRequest>>,
        failure: Option<String>,
    }

    impl RecordingDelivery {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                failure: Some(message.into()),
            }
        }

        pub fn requests(&self) -> Vec<DeliveryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Delivery for RecordingDelivery {
        async fn dispatch(
            &self,
            request: &DeliveryRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.failure {
                Some(msg) => Err(DeliveryError::Transport(msg.clone())),
                None => Ok(DeliveryReceipt {
                    status: 202,
                    reference: Some(format!("mock-{}", request.run_id)),
                }),
            }
        }
    }
}
