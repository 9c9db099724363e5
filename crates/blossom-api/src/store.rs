//! # Invoice Store
//!
//! In-memory invoices for the development payment server. Status changes
//! follow the same rules a real Blossom backend enforces: a settled,
//! expired or cancelled invoice never changes again.

use blossom_core::{encode_npub, InvoiceRequest, PaymentDetails, PaymentError, PaymentResult, PaymentStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;
use uuid::Uuid;

/// One issued invoice
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRecord {
    pub details: PaymentDetails,
    /// Lowercase hex key the invoice was issued for
    pub pubkey: String,
    pub description: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Pending invoices past their expiry read as expired
    fn settle_expiry(&mut self, now: DateTime<Utc>) {
        if self.status == PaymentStatus::Pending && self.details.is_expired_at(now) {
            info!("Invoice {} expired", self.details.invoice_id);
            self.status = PaymentStatus::Expired;
        }
    }
}

#[derive(Debug, Default)]
pub struct InvoiceStore {
    invoices: RwLock<HashMap<String, InvoiceRecord>>,
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, InvoiceRecord>> {
        self.invoices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, InvoiceRecord>> {
        self.invoices.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a pending invoice for `request`, payable until `now + ttl`.
    pub fn create(
        &self,
        request: &InvoiceRequest,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> PaymentResult<PaymentDetails> {
        if request.amount_sats == 0 {
            return Err(PaymentError::InvalidRequest(
                "amount_sats must be greater than zero".to_string(),
            ));
        }
        let pubkey = request.pubkey.to_ascii_lowercase();
        encode_npub(&pubkey)?;
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            PaymentError::Configuration(format!("invoice TTL out of range: {}s", ttl.num_seconds()))
        })?;

        let invoice_id = format!("inv_{}", Uuid::new_v4().simple());
        let payment_request = dev_payment_request(&invoice_id, request.amount_sats);
        let details = PaymentDetails::new(&invoice_id, request.amount_sats, payment_request)
            .with_expiry(expires_at);

        let record = InvoiceRecord {
            details: details.clone(),
            pubkey,
            description: request.description.clone(),
            status: PaymentStatus::Pending,
            created_at: now,
        };
        self.write().insert(invoice_id, record);

        Ok(details)
    }

    pub fn get(&self, invoice_id: &str) -> Option<InvoiceRecord> {
        self.read().get(invoice_id).cloned()
    }

    /// Current status, applying expiry at `now`
    pub fn status(&self, invoice_id: &str, now: DateTime<Utc>) -> PaymentResult<PaymentStatus> {
        let mut invoices = self.write();
        let record = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| not_found(invoice_id))?;
        record.settle_expiry(now);
        Ok(record.status)
    }

    /// Move an invoice to `next`. Finished invoices only accept their own status.
    pub fn set_status(
        &self,
        invoice_id: &str,
        next: PaymentStatus,
        now: DateTime<Utc>,
    ) -> PaymentResult<PaymentStatus> {
        if next == PaymentStatus::Idle {
            return Err(PaymentError::InvalidRequest(
                "an issued invoice cannot return to idle".to_string(),
            ));
        }

        let mut invoices = self.write();
        let record = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| not_found(invoice_id))?;
        record.settle_expiry(now);

        if record.status.is_terminal() && record.status != next {
            return Err(PaymentError::InvalidRequest(format!(
                "invoice {} is already {}",
                invoice_id, record.status
            )));
        }

        info!("Invoice {} {} -> {}", invoice_id, record.status, next);
        record.status = next;
        Ok(next)
    }

    /// Cancel a pending invoice. Finished invoices keep their status.
    pub fn cancel(&self, invoice_id: &str, now: DateTime<Utc>) -> PaymentResult<PaymentStatus> {
        let mut invoices = self.write();
        let record = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| not_found(invoice_id))?;
        record.settle_expiry(now);

        if !record.status.is_terminal() {
            info!("Invoice {} cancelled", invoice_id);
            record.status = PaymentStatus::Cancelled;
        }
        Ok(record.status)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn not_found(invoice_id: &str) -> PaymentError {
    PaymentError::InvoiceNotFound {
        invoice_id: invoice_id.to_string(),
    }
}

/// Placeholder bolt11-looking string. Amount is in nano-BTC (10 per sat).
fn dev_payment_request(invoice_id: &str, amount_sats: u64) -> String {
    format!("lnbcrt{}n1{}", amount_sats * 10, invoice_id.trim_start_matches("inv_"))
}
