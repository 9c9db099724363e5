//! # Identity Boundary
//!
//! The dashboard identifies users by the public key held in a browser
//! signing extension. This module wraps that provider and exposes a stable
//! `(public_key, is_authenticated)` pair plus its npub display encoding.

use crate::error::{PaymentError, PaymentResult};
use async_trait::async_trait;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Human-readable part of a bech32 public key
const NPUB_HRP: Hrp = Hrp::parse_unchecked("npub");

/// Length of an x-only public key
const PUBKEY_LEN: usize = 32;

/// Signing extension that can hand out the user's public key.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Hex-encoded public key, or `PaymentError::AuthUnavailable` when the
    /// extension is missing or the user refused.
    async fn get_public_key(&self) -> PaymentResult<String>;
}

/// Persisted identity pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySession {
    pub public_key: String,
    pub is_authenticated: bool,
}

impl IdentitySession {
    /// npub encoding of the session key
    pub fn npub(&self) -> PaymentResult<String> {
        encode_npub(&self.public_key)
    }
}

/// Binds the identity provider to the rest of the dashboard
pub struct IdentityBinder {
    provider: Arc<dyn IdentityProvider>,
    session: Option<IdentitySession>,
}

impl IdentityBinder {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: None,
        }
    }

    /// Ask the provider for the public key and record an authenticated session.
    ///
    /// A key the provider returns in a malformed shape is rejected with
    /// `InvalidPublicKey` and the previous session is left untouched.
    pub async fn bind(&mut self) -> PaymentResult<&IdentitySession> {
        let public_key = self.provider.get_public_key().await?.to_lowercase();
        decode_public_key(&public_key)?;

        let session = self.session.insert(IdentitySession {
            public_key,
            is_authenticated: true,
        });
        Ok(&*session)
    }

    /// Re-apply a persisted session (e.g. after a page reload)
    pub fn restore(&mut self, session: IdentitySession) -> PaymentResult<()> {
        decode_public_key(&session.public_key)?;
        self.session = Some(session);
        Ok(())
    }

    /// Forget the bound identity
    pub fn sign_out(&mut self) {
        self.session = None;
    }

    /// Current session, if any
    pub fn session(&self) -> Option<&IdentitySession> {
        self.session.as_ref()
    }

    pub fn public_key(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.public_key.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.is_authenticated)
            .unwrap_or(false)
    }

    /// npub of the bound key, `None` when signed out
    pub fn npub(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.npub().ok())
    }
}

fn decode_public_key(public_key_hex: &str) -> PaymentResult<[u8; PUBKEY_LEN]> {
    let bytes = hex::decode(public_key_hex)
        .map_err(|e| PaymentError::InvalidPublicKey(e.to_string()))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        PaymentError::InvalidPublicKey(format!(
            "Expected {} bytes, got {}",
            PUBKEY_LEN,
            bytes.len()
        ))
    })
}

/// Encode a hex public key as a bech32 `npub1...` string
pub fn encode_npub(public_key_hex: &str) -> PaymentResult<String> {
    let key = decode_public_key(public_key_hex)?;
    bech32::encode::<Bech32>(NPUB_HRP, &key)
        .map_err(|e| PaymentError::InvalidPublicKey(e.to_string()))
}

/// Decode an `npub1...` string back to a lowercase hex public key
pub fn decode_npub(npub: &str) -> PaymentResult<String> {
    let (hrp, data) =
        bech32::decode(npub).map_err(|e| PaymentError::InvalidPublicKey(e.to_string()))?;

    if hrp != NPUB_HRP {
        return Err(PaymentError::InvalidPublicKey(format!(
            "Unexpected HRP: {}",
            hrp
        )));
    }
    if data.len() != PUBKEY_LEN {
        return Err(PaymentError::InvalidPublicKey(format!(
            "Expected {} bytes, got {}",
            PUBKEY_LEN,
            data.len()
        )));
    }

    Ok(hex::encode(data))
}

/// Shortened npub for narrow UI slots, e.g. `npub180cv…kwsyjh6w6`
pub fn short_npub(npub: &str) -> String {
    if npub.len() <= 20 {
        return npub.to_string();
    }
    format!("{}…{}", &npub[..9], &npub[npub.len() - 9..])
}
