use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::X402Error;

/// Payment terms returned to a caller that has not paid yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChallenge {
    pub version: u32,
    /// Minimum amount in the asset's smallest unit.
    pub amount: String,
    pub asset: String,
    pub recipient: String,
    pub network: String,
    pub facilitator: String,
    pub description: String,
}

/// The 402 Payment Required response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequiredBody {
    pub error: String,
    pub x402: PaymentChallenge,
}

impl PaymentRequiredBody {
    pub fn new(challenge: PaymentChallenge) -> Self {
        Self {
            error: "Payment Required".to_string(),
            x402: challenge,
        }
    }
}

/// Payment proof decoded from the `X-PAYMENT` header.
///
/// The typed fields are the ones the gate checks locally. The full decoded
/// envelope, signature included, is kept untouched for the facilitator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentProof {
    pub protocol_version: Option<i64>,
    pub to: String,
    pub amount: String,
    pub valid_before: u64,
    envelope: Value,
}

impl PaymentProof {
    /// Decode a base64 header value into a proof.
    pub fn decode(header_value: &str) -> Result<Self, X402Error> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(header_value.trim())
            .map_err(|e| X402Error::InvalidPayment(format!("invalid base64: {e}")))?;
        let envelope: Value = serde_json::from_slice(&bytes)
            .map_err(|e| X402Error::InvalidPayment(format!("invalid JSON payload: {e}")))?;
        Self::from_envelope(envelope)
    }

    /// Build a proof from an already-parsed JSON envelope.
    pub fn from_envelope(envelope: Value) -> Result<Self, X402Error> {
        if !envelope.is_object() {
            return Err(X402Error::InvalidPayment(
                "payment envelope is not a JSON object".to_string(),
            ));
        }
        let view = EnvelopeView::deserialize(&envelope)
            .map_err(|e| X402Error::InvalidPayment(format!("invalid payment envelope: {e}")))?;
        let auth = view.payload.payload;

        Ok(Self {
            protocol_version: view.x402_version,
            to: auth.to,
            amount: auth.amount,
            valid_before: auth.valid_before,
            envelope,
        })
    }

    /// The decoded envelope exactly as the client sent it.
    pub fn envelope(&self) -> &Value {
        &self.envelope
    }
}

/// Base64-encode a payment envelope for the `X-PAYMENT` header.
pub fn encode_payment(envelope: &Value) -> Result<String, X402Error> {
    let json = serde_json::to_vec(envelope)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeView {
    #[serde(default, deserialize_with = "version_as_integer")]
    x402_version: Option<i64>,
    #[serde(default)]
    payload: SchemePayloadView,
}

#[derive(Default, Deserialize)]
struct SchemePayloadView {
    #[serde(default)]
    payload: AuthorizationView,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationView {
    #[serde(default)]
    to: String,
    #[serde(default = "zero_amount", deserialize_with = "amount_as_string")]
    amount: String,
    #[serde(default)]
    valid_before: u64,
}

impl Default for AuthorizationView {
    fn default() -> Self {
        Self {
            to: String::new(),
            amount: zero_amount(),
            valid_before: 0,
        }
    }
}

fn zero_amount() -> String {
    "0".to_string()
}

// Amounts are string-encoded on the wire, but plain integers show up too.
fn amount_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Amount::deserialize(deserializer)? {
        Amount::Text(s) => s,
        Amount::Unsigned(n) => n.to_string(),
        Amount::Signed(n) => n.to_string(),
    })
}

// `1.0` is the same version as `1`; a fractional version matches nothing.
fn version_as_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Version>::deserialize(deserializer)? {
        Some(Version::Integer(n)) => Some(n),
        Some(Version::Float(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(f as i64)
        }
        Some(Version::Float(_)) | None => None,
    })
}
