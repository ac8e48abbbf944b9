//! # Summary
//!
//! Wire formats exchanged with clients. Field and tag names are fixed by
//! the clients already in the wild, hence the renames.

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::state::Tally;

pub const REGISTERED: &str = "vote registered";
pub const ALREADY_VOTED: &str = "already voted";
pub const INVALID_OPTION: &str = "invalid option";

/// Single ballot submitted by a client.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    /// Self-reported voter identifier
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Chosen option, empty when absent
    #[serde(rename = "opcao", default)]
    pub option: String,
}

impl Vote {
    pub fn new<U: Into<String>, O: Into<String>>(user_id: U, option: O) -> Self {
        Vote {
            user_id: user_id.into(),
            option: option.into(),
        }
    }

    /// Parses a raw inbound payload.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(payload).map_err(Error::Decode)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }
}

/// Broadcast sent by the server to every connected client.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
#[serde(tag = "tipo")]
pub enum Notification {
    /// Addressed to a voter whose ballot was recorded
    #[serde(rename = "confirmacao")]
    Confirmation {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "mensagem")]
        message: String,
    },

    /// Addressed to a voter whose ballot was rejected
    #[serde(rename = "erro")]
    Error {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "mensagem")]
        message: String,
    },

    /// Running tally after an accepted vote
    #[serde(rename = "parcial")]
    Partial {
        #[serde(rename = "resultado")]
        result: Tally,
    },

    /// Tally at poll close
    #[serde(rename = "final")]
    Final {
        #[serde(rename = "resultado")]
        result: Tally,
    },
}

impl Notification {
    pub fn confirmation<U: Into<String>>(user_id: U) -> Self {
        Notification::Confirmation {
            user_id: user_id.into(),
            message: REGISTERED.to_string(),
        }
    }

    pub fn error<U: Into<String>, M: Into<String>>(user_id: U, message: M) -> Self {
        Notification::Error {
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Voter this notification is addressed to, if any.
    pub fn recipient(&self) -> Option<&str> {
        match self {
        | Notification::Confirmation { user_id, .. }
        | Notification::Error { user_id, .. } => Some(user_id),
        | Notification::Partial { .. }
        | Notification::Final { .. } => None,
        }
    }

    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(payload).map_err(Error::Decode)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tally(a: usize, b: usize, c: usize) -> Tally {
        vec![("A", a), ("B", b), ("C", c)]
            .into_iter()
            .map(|(option, count)| (option.to_string(), count))
            .collect()
    }

    #[test]
    fn vote_uses_client_field_names() {
        let vote = Vote::decode(br#"{"userId":"alice","opcao":"A"}"#).unwrap();
        assert_eq!(vote, Vote::new("alice", "A"));

        let value: serde_json::Value = serde_json::from_slice(&vote.encode().unwrap()).unwrap();
        assert_eq!(value, json!({ "userId": "alice", "opcao": "A" }));
    }

    #[test]
    fn vote_rejects_malformed_payloads() {
        assert!(Vote::decode(b"not json").is_err());
        assert!(Vote::decode(br#"{"opcao":"A"}"#).is_err());
        assert!(Vote::decode(br#"{"userId":7,"opcao":"A"}"#).is_err());
    }

    #[test]
    fn vote_without_option_names_its_voter() {
        let vote = Vote::decode(br#"{"userId":"alice"}"#).unwrap();
        assert_eq!(vote, Vote::new("alice", ""));
    }

    #[test]
    fn vote_ignores_unknown_fields() {
        let vote = Vote::decode(br#"{"userId":"bob","opcao":"Z","extra":true}"#).unwrap();
        assert_eq!(vote, Vote::new("bob", "Z"));
    }

    #[test]
    fn confirmation_omits_result() {
        let bytes = Notification::confirmation("alice").encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({
            "tipo": "confirmacao",
            "userId": "alice",
            "mensagem": REGISTERED,
        }));
    }

    #[test]
    fn error_omits_result() {
        let bytes = Notification::error("bob", INVALID_OPTION).encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({
            "tipo": "erro",
            "userId": "bob",
            "mensagem": INVALID_OPTION,
        }));
    }

    #[test]
    fn tallies_omit_recipient() {
        let partial = Notification::Partial { result: tally(1, 0, 2) };
        let value: serde_json::Value = serde_json::from_slice(&partial.encode().unwrap()).unwrap();
        assert_eq!(value, json!({ "tipo": "parcial", "resultado": { "A": 1, "B": 0, "C": 2 } }));

        let last = Notification::Final { result: tally(3, 3, 3) };
        let value: serde_json::Value = serde_json::from_slice(&last.encode().unwrap()).unwrap();
        assert_eq!(value, json!({ "tipo": "final", "resultado": { "A": 3, "B": 3, "C": 3 } }));
    }

    #[test]
    fn notifications_decode_from_wire() {
        let decoded = Notification::decode(br#"{"tipo":"parcial","resultado":{"A":1,"B":0,"C":0}}"#).unwrap();
        assert_eq!(decoded, Notification::Partial { result: tally(1, 0, 0) });
        assert_eq!(decoded.recipient(), None);

        let decoded = Notification::decode(br#"{"tipo":"erro","userId":"x","mensagem":"already voted"}"#).unwrap();
        assert_eq!(decoded, Notification::error("x", ALREADY_VOTED));
        assert_eq!(decoded.recipient(), Some("x"));

        assert!(Notification::decode(br#"{"tipo":"unknown"}"#).is_err());
    }
}
