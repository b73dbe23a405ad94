//! NATS subscriber for incoming prediction requests

use crate::error::Result;
use crate::types::prediction::PredictionRequest;
use anyhow::Result as AnyResult;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving prediction requests from NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> AnyResult<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to prediction requests");
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode a request payload.
///
/// Accepts either `{"readings": [...]}` or a single bare reading object.
pub fn decode_request(payload: &[u8]) -> Result<PredictionRequest> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    if value.get("readings").is_some() {
        return Ok(serde_json::from_value(value)?);
    }
    let reading = serde_json::from_value(value)?;
    Ok(PredictionRequest {
        readings: vec![reading],
    })
}
