//! NATS request/reply loop around the inference service

use crate::config::AppConfig;
use crate::consumer::{decode_request, RequestConsumer};
use crate::metrics::{MetricsReporter, ServiceMetrics};
use crate::models::inference::InferenceService;
use crate::producer::ReplyProducer;
use crate::types::prediction::PredictionResponse;
use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Classify one request payload.
///
/// Bad payloads and failed predictions become rejected responses; the
/// service keeps running either way.
pub fn handle_payload(
    service: &InferenceService,
    metrics: &ServiceMetrics,
    payload: &[u8],
) -> PredictionResponse {
    let start = Instant::now();

    let outcome =
        decode_request(payload).and_then(|request| service.predict_batch(&request.readings));

    match outcome {
        Ok(labels) => {
            metrics.record_request(start.elapsed(), &labels);
            debug!(
                rows = labels.len(),
                latency_us = start.elapsed().as_micros(),
                "Request classified"
            );
            PredictionResponse::from_labels(labels)
        }
        Err(e) => {
            metrics.record_rejection();
            warn!(error = %e, "Prediction request rejected");
            PredictionResponse::rejected(e)
        }
    }
}

/// Serve prediction requests until the subscription closes.
///
/// Requests are handled one at a time, in arrival order.
pub async fn serve(config: &AppConfig, service: InferenceService) -> Result<()> {
    let metrics = Arc::new(ServiceMetrics::new());

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = ReplyProducer::new(client.clone());

    if config.service.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.service.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let mut subscription = consumer.subscribe().await?;
    info!(subject = %consumer.subject(), "Serving prediction requests");

    while let Some(message) = subscription.next().await {
        let response = handle_payload(&service, &metrics, &message.payload);

        match message.reply {
            Some(reply) => {
                if let Err(e) = producer.reply(reply, &response).await {
                    warn!(error = %e, "Failed to publish prediction response");
                }
            }
            None => {
                debug!(
                    response_id = %response.response_id,
                    "Request has no reply subject, response dropped"
                );
            }
        }
    }

    info!("Request subscription closed, shutting down");
    metrics.print_summary();

    Ok(())
}
