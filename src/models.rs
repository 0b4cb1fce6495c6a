//! Domain and wire types for inbound chat and mail.
//!
//! The service returns loosely-typed JSON: numeric fields arrive as either
//! numbers or strings depending on the endpoint and server version, and
//! most fields are optional in practice. Wire types here are tolerant of
//! that; the public [`InboundMessage`] / [`InboundMail`] types are not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Helper to deserialize an id as either string or integer.
fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct U64Visitor;

    impl Visitor<'_> for U64Visitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an unsigned integer or a string containing one")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u64, E> {
            u64::try_from(value).map_err(de::Error::custom)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
            value.parse().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(U64Visitor)
}

/// Same tolerance for optional epoch timestamps.
fn deserialize_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct OptI64Visitor;

    impl<'de> Visitor<'de> for OptI64Visitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer, a string containing one, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(OptI64Visitor)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value as i64))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse().map(Some).map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_option(OptI64Visitor)
}

/// Reference to a player: id plus display name.
///
/// Player lookup (profiles, clan membership) belongs to an external
/// collaborator; this engine only carries the back-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    /// Server-assigned player id
    pub id: u64,
    /// Display name as the server rendered it
    pub name: String,
}

/// Classification of an inbound chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Message in a public channel
    Public,
    /// Private message addressed to this session
    Private,
    /// Server announcement
    System,
}

/// An inbound chat message, produced per poll cycle and not retained
/// beyond dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Classification derived from the server-supplied type tag
    pub kind: MessageKind,
    /// Sending player
    pub sender: PlayerRef,
    /// Message text
    pub body: String,
    /// When the server says the message occurred
    pub occurred_at: DateTime<Utc>,
}

/// An inbound mail item.
///
/// By the time one of these is published it has already been consumed
/// server-side; see the poller for the at-most-once consequence.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMail {
    /// Server-assigned mail id
    pub id: String,
    /// Sending player
    pub sender: PlayerRef,
    /// Mail text
    pub body: String,
    /// When the server says the mail was sent
    pub occurred_at: DateTime<Utc>,
}

/// Status payload returned by the lightweight status endpoint.
///
/// The token rotates server-side on every status call, so this is both the
/// "am I logged in" probe and the token refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Freshly issued session token
    #[serde(rename = "pwd", default)]
    pub token: String,
    /// Player id of the authenticated account
    #[serde(rename = "playerid", deserialize_with = "deserialize_u64", default)]
    pub player_id: u64,
}

/// Wire shape of a player reference.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlayer {
    #[serde(deserialize_with = "deserialize_u64", default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// One message as returned by the chat poll endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChatMessage {
    /// Server-supplied type tag (`public`, `private`, `system`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub who: Option<RawPlayer>,
    #[serde(default)]
    pub msg: String,
    /// Epoch seconds, usually as a string
    #[serde(deserialize_with = "deserialize_opt_i64", default)]
    pub time: Option<i64>,
}

impl RawChatMessage {
    /// Classify the server type tag.
    ///
    /// Unknown tags are treated as public; the server adds tags without
    /// notice and dropping messages is worse than misfiling them.
    pub fn classify(&self) -> MessageKind {
        match self.kind.as_str() {
            "private" => MessageKind::Private,
            "system" | "event" => MessageKind::System,
            _ => MessageKind::Public,
        }
    }

    /// Convert into the public message type.
    pub fn into_inbound(self) -> InboundMessage {
        let kind = self.classify();
        let sender = match self.who {
            Some(raw) => PlayerRef {
                id: raw.id,
                name: raw.name,
            },
            None => PlayerRef {
                id: 0,
                name: String::new(),
            },
        };
        let occurred_at = self
            .time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        InboundMessage {
            kind,
            sender,
            body: self.msg,
            occurred_at,
        }
    }
}

/// Response of the cursor-based chat poll endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatPollResponse {
    /// New messages since the submitted cursor, in server order
    #[serde(default)]
    pub msgs: Vec<RawChatMessage>,
    /// Cursor to submit on the next poll
    #[serde(default)]
    pub last: String,
}

/// One mail item as returned by the mail listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MailEnvelope {
    pub id: String,
    #[serde(rename = "fromid", deserialize_with = "deserialize_u64", default)]
    pub from_id: u64,
    #[serde(rename = "fromname", default)]
    pub from_name: String,
    #[serde(default)]
    pub message: String,
    /// Epoch seconds, usually as a string
    #[serde(rename = "azunixtime", deserialize_with = "deserialize_opt_i64", default)]
    pub unix_time: Option<i64>,
}

impl MailEnvelope {
    /// Convert into the public mail type.
    pub fn into_inbound(self) -> InboundMail {
        let occurred_at = self
            .unix_time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        InboundMail {
            id: self.id,
            sender: PlayerRef {
                id: self.from_id,
                name: self.from_name,
            },
            body: self.message,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_parses() {
        let json = r#"{"pwd":"abc123","playerid":"2129446"}"#;
        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.token, "abc123");
        assert_eq!(status.player_id, 2129446);
    }

    #[test]
    fn test_status_response_numeric_player_id() {
        let json = r#"{"pwd":"abc123","playerid":42}"#;
        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.player_id, 42);
    }

    #[test]
    fn test_chat_poll_response_parses() {
        let json = r#"{
            "msgs": [
                {"type":"public","who":{"id":"11","name":"Alice"},"msg":"hello","time":"1736956800"},
                {"type":"private","who":{"id":22,"name":"Bob"},"msg":"psst","time":"1736956801"}
            ],
            "last": "1736956801"
        }"#;

        let resp: ChatPollResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.msgs.len(), 2);
        assert_eq!(resp.last, "1736956801");
        assert_eq!(resp.msgs[0].classify(), MessageKind::Public);
        assert_eq!(resp.msgs[1].classify(), MessageKind::Private);
    }

    #[test]
    fn test_chat_poll_response_empty() {
        let resp: ChatPollResponse = serde_json::from_str(r#"{"msgs":[],"last":"99"}"#).unwrap();
        assert!(resp.msgs.is_empty());
        assert_eq!(resp.last, "99");
    }

    #[test]
    fn test_classify_tags() {
        let mk = |tag: &str| RawChatMessage {
            kind: tag.to_string(),
            who: None,
            msg: String::new(),
            time: None,
        };
        assert_eq!(mk("public").classify(), MessageKind::Public);
        assert_eq!(mk("private").classify(), MessageKind::Private);
        assert_eq!(mk("system").classify(), MessageKind::System);
        assert_eq!(mk("event").classify(), MessageKind::System);
        // Unknown tags fall back to public
        assert_eq!(mk("mod_announce").classify(), MessageKind::Public);
        assert_eq!(mk("").classify(), MessageKind::Public);
    }

    #[test]
    fn test_into_inbound_message() {
        let raw = RawChatMessage {
            kind: "private".to_string(),
            who: Some(RawPlayer {
                id: 77,
                name: "Carol".to_string(),
            }),
            msg: "meet me in the clan hall".to_string(),
            time: Some(1736956800),
        };

        let msg = raw.into_inbound();
        assert_eq!(msg.kind, MessageKind::Private);
        assert_eq!(msg.sender.id, 77);
        assert_eq!(msg.sender.name, "Carol");
        assert_eq!(msg.body, "meet me in the clan hall");
        assert_eq!(msg.occurred_at.timestamp(), 1736956800);
    }

    #[test]
    fn test_into_inbound_message_missing_sender() {
        let raw = RawChatMessage {
            kind: "system".to_string(),
            who: None,
            msg: "The server is restarting soon.".to_string(),
            time: None,
        };

        let msg = raw.into_inbound();
        assert_eq!(msg.kind, MessageKind::System);
        assert_eq!(msg.sender.id, 0);
        assert!(msg.sender.name.is_empty());
    }

    #[test]
    fn test_mail_envelope_parses() {
        let json = r#"{
            "id": "5551212",
            "fromid": "88",
            "fromname": "Dave",
            "message": "here are the spoils",
            "azunixtime": "1736956800"
        }"#;

        let envelope: MailEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.id, "5551212");
        assert_eq!(envelope.from_id, 88);

        let mail = envelope.into_inbound();
        assert_eq!(mail.id, "5551212");
        assert_eq!(mail.sender.name, "Dave");
        assert_eq!(mail.body, "here are the spoils");
        assert_eq!(mail.occurred_at.timestamp(), 1736956800);
    }

    #[test]
    fn test_mail_envelope_minimal() {
        let envelope: MailEnvelope = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        assert_eq!(envelope.id, "1");
        assert_eq!(envelope.from_id, 0);
        assert!(envelope.message.is_empty());
        assert!(envelope.unix_time.is_none());
    }
}
