//! NATS replies carrying prediction results

use crate::types::prediction::PredictionResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes prediction responses to request reply subjects
#[derive(Clone)]
pub struct ReplyProducer {
    client: Client,
}

impl ReplyProducer {
    /// Create a new reply producer
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish a response to the given reply subject
    pub async fn reply(&self, subject: Subject, response: &PredictionResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;

        self.client.publish(subject.clone(), payload.into()).await?;

        debug!(
            subject = %subject,
            response_id = %response.response_id,
            labels = response.labels.len(),
            rejected = response.is_rejected(),
            "Published prediction response"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
