//! # Payment Status
//!
//! The closed set of states an invoice payment moves through.

use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a Blossom server invoice payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No flow opened yet
    Idle,
    /// Invoice issued, awaiting payment
    Pending,
    /// Invoice settled
    Paid,
    /// Invoice expired unpaid
    Expired,
    /// Invoice cancelled
    Cancelled,
    /// Endpoint reported an error, or the check failure bound was reached
    Error,
}

impl PaymentStatus {
    /// All status values, in progression order
    pub const ALL: [PaymentStatus; 6] = [
        PaymentStatus::Idle,
        PaymentStatus::Pending,
        PaymentStatus::Error,
        PaymentStatus::Paid,
        PaymentStatus::Expired,
        PaymentStatus::Cancelled,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Idle => "idle",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Error => "error",
        }
    }

    /// Terminal statuses stop polling
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Paid | PaymentStatus::Expired | PaymentStatus::Cancelled
        )
    }

    /// Position in the progression. A reported status ranked below the
    /// current one is a regression and is ignored.
    ///
    /// `Pending` and `Error` share a rank so an endpoint can move between
    /// them while the invoice is still open.
    pub fn progress_rank(&self) -> u8 {
        match self {
            PaymentStatus::Idle => 0,
            PaymentStatus::Pending | PaymentStatus::Error => 1,
            PaymentStatus::Paid | PaymentStatus::Expired | PaymentStatus::Cancelled => 2,
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Idle
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PaymentError::UnknownStatus {
                value: s.to_string(),
            })
    }
}

/// Body of `GET /api/blossom/payment/{invoiceId}`
///
/// The status is kept as a raw string so an unknown value can be reported
/// as [`PaymentError::UnknownStatus`] instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: PaymentStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
        }
    }

    /// Interpret the reported status, failing closed on unknown values
    pub fn parse_status(&self) -> Result<PaymentStatus, PaymentError> {
        self.status.parse()
    }
}
