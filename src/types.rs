use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One row returned by the data store, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The in-flight half of an authorization attempt, carried in the pending-exchange cookie.
///
/// Encoded as base64url (no padding) of its JSON form. At most one exists per
/// browser: starting a second attempt overwrites the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExchange {
    pub code_verifier: String,
    pub state: String,
    /// Exact redirect URI sent to the identity provider; echoed on token exchange.
    pub redirect_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl PendingExchange {
    /// Serialize to the cookie payload format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Payload`] if JSON serialization fails.
    pub fn encode(&self) -> Result<String, Error> {
        let json = serde_json::to_vec(self).map_err(|e| Error::Payload(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parse a cookie payload produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Payload`] if the value is not base64url or not the expected JSON.
    pub fn decode(value: &str) -> Result<Self, Error> {
        let bytes = URL_SAFE_NO_PAD
            .decode(value.trim_end_matches('='))
            .map_err(|e| Error::Payload(format!("base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Payload(format!("json: {e}")))
    }
}

/// Backend user identifier (the `id` of the backend's auth user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Identifier of a caption being voted on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct CaptionId(pub String);

/// An up or down vote. Serialized as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
    Up,
    Down,
}

impl TryFrom<i64> for VoteValue {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(Error::InvalidVote(other)),
        }
    }
}

impl From<VoteValue> for i64 {
    fn from(v: VoteValue) -> Self {
        match v {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

/// A validated vote, ready to be recorded for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub caption_id: CaptionId,
    pub value: VoteValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PendingExchange {
        PendingExchange {
            code_verifier: "verifier-abc".into(),
            state: "state-xyz".into(),
            redirect_uri: "https://project.supabase.co/auth/v1/callback".into(),
            redirect_to: Some("/assignment-3".into()),
        }
    }

    #[test]
    fn pending_exchange_roundtrip() {
        let pending = sample();
        let decoded = PendingExchange::decode(&pending.encode().unwrap()).unwrap();
        assert_eq!(decoded, pending);
    }

    #[test]
    fn pending_exchange_roundtrip_without_redirect_to() {
        let pending = PendingExchange {
            redirect_to: None,
            ..sample()
        };
        let encoded = pending.encode().unwrap();
        assert_eq!(PendingExchange::decode(&encoded).unwrap(), pending);
    }

    #[test]
    fn pending_exchange_is_unpadded_base64url() {
        let encoded = sample().encode().unwrap();
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn pending_exchange_rejects_garbage() {
        assert!(matches!(
            PendingExchange::decode("not base64 at all!"),
            Err(Error::Payload(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(matches!(
            PendingExchange::decode(&not_json),
            Err(Error::Payload(_))
        ));
        let missing_state = URL_SAFE_NO_PAD.encode(br#"{"code_verifier":"v","redirect_uri":"r"}"#);
        assert!(PendingExchange::decode(&missing_state).is_err());
    }

    #[test]
    fn vote_value_accepts_only_unit_values() {
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
        assert!(matches!(VoteValue::try_from(0), Err(Error::InvalidVote(0))));
        assert!(VoteValue::try_from(2).is_err());
    }

    #[test]
    fn vote_value_serde() {
        assert_eq!(serde_json::to_string(&VoteValue::Down).unwrap(), "-1");
        let parsed: VoteValue = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, VoteValue::Up);
        assert!(serde_json::from_str::<VoteValue>("5").is_err());
    }

    #[test]
    fn newtypes_display_inner_value() {
        assert_eq!(UserId::from("user-123".to_string()).to_string(), "user-123");
        assert_eq!(CaptionId::from("cap-9".to_string()).to_string(), "cap-9");
    }
}
