//! # Blossom Payment Client
//!
//! HTTP implementation of [`StatusSource`] against the Blossom payment API.
//! This is what the payment flow polls in production.

use crate::config::ClientConfig;
use async_trait::async_trait;
use blossom_core::{
    InvoiceRequest, PaymentDetails, PaymentError, PaymentResult, PaymentStatus, StatusResponse,
    StatusSource, INVOICE_PATH, PAYMENT_STATUS_PATH,
};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Client for the Blossom payment API
#[derive(Clone)]
pub struct BlossomPaymentClient {
    config: ClientConfig,
    client: Client,
}

impl BlossomPaymentClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> PaymentResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of one invoice's status resource. The id always lands in a single
    /// percent-encoded path segment.
    pub fn payment_url(&self, invoice_id: &str) -> PaymentResult<Url> {
        if matches!(invoice_id, "" | "." | "..") {
            return Err(PaymentError::InvalidRequest(format!(
                "Invalid invoice id: {:?}",
                invoice_id
            )));
        }

        let mut url = Url::parse(&self.config.url(PAYMENT_STATUS_PATH))
            .map_err(|e| PaymentError::Configuration(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::Configuration("API base URL cannot hold a path".to_string()))?
            .push(invoice_id);

        Ok(url)
    }

    /// Request a new invoice for provisioning a Blossom server
    #[instrument(skip(self, request), fields(amount_sats = request.amount_sats))]
    pub async fn request_invoice(&self, request: &InvoiceRequest) -> PaymentResult<PaymentDetails> {
        if request.amount_sats == 0 {
            return Err(PaymentError::InvalidRequest(
                "Invoice amount must be greater than zero".to_string(),
            ));
        }

        let url = self.config.url(INVOICE_PATH);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let details: PaymentDetails = read_json(response).await?;

        info!(
            "Created invoice: id={}, amount_sats={}",
            details.invoice_id, details.amount_sats
        );

        Ok(details)
    }
}

#[async_trait]
impl StatusSource for BlossomPaymentClient {
    #[instrument(skip(self))]
    async fn fetch_status(&self, invoice_id: &str) -> PaymentResult<PaymentStatus> {
        let url = self.payment_url(invoice_id)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let body: StatusResponse = read_json(response).await?;
        let status = body.parse_status()?;

        debug!("Invoice {} reported status={}", invoice_id, status);

        Ok(status)
    }

    #[instrument(skip(self))]
    async fn cancel_invoice(&self, invoice_id: &str) -> PaymentResult<()> {
        let url = self.payment_url(invoice_id)?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let body: StatusResponse = read_json(response).await?;
        info!("Cancelled invoice {}: status={}", invoice_id, body.status);

        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "blossom-api"
    }
}

// =============================================================================
// Response Handling
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
}

/// Read a JSON body, mapping non-2xx and unparsable bodies to typed errors
async fn read_json<T: DeserializeOwned>(response: Response) -> PaymentResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PaymentError::Network(e.to_string()))?;

    if !status.is_success() {
        error!("Payment API error: status={}, body={}", status, body);

        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);

        return Err(PaymentError::StatusEndpoint {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        PaymentError::MalformedResponse(format!("Failed to parse payment API response: {}", e))
    })
}
