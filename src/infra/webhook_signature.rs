//! Payment provider webhook signatures.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The signed content
//! is `"<t>." ++ raw body`, so the body must reach this module exactly as it
//! arrived on the wire.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::app_error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Default accepted distance between the signature timestamp and now.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

pub struct WebhookSignatureVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    pub fn verify(&self, payload: &[u8], signature_header: &str) -> AppResult<()> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, payload: &[u8], signature_header: &str, now: i64) -> AppResult<()> {
        let (timestamp, signatures) = parse_header(signature_header)?;

        let expected = compute_signature(self.secret.expose_secret(), timestamp, payload);
        let matched = signatures
            .iter()
            .filter_map(|sig| hex::decode(sig).ok())
            .any(|sig| sig.len() == expected.len() && bool::from(sig.ct_eq(&expected)));

        if !matched {
            return Err(AppError::InvalidSignature("no matching signature".into()));
        }

        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(AppError::InvalidSignature(
                "timestamp outside tolerance".into(),
            ));
        }

        Ok(())
    }
}

/// Build a header value for `body`, as the provider would.
pub fn sign_webhook_payload(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let signature = hex::encode(compute_signature(secret, timestamp, body));
    format!("t={},v1={}", timestamp, signature)
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn parse_header(header: &str) -> AppResult<(i64, Vec<&str>)> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::InvalidSignature("missing timestamp".into()))?
        .parse::<i64>()
        .map_err(|_| AppError::InvalidSignature("invalid timestamp".into()))?;

    if signatures.is_empty() {
        return Err(AppError::InvalidSignature("missing v1 signature".into()));
    }

    Ok((timestamp, signatures))
}
