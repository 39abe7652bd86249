//! WebSocket message protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client -> Server messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Free-form client chatter; acknowledged with a static response.
    Message { data: serde_json::Value },
}

/// Server -> Client messages
///
/// Task change events are broadcast to every connected client. Delivery is
/// at-most-once: no acknowledgment, no retry, no replay on reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    TaskCreated {
        message: String,
        task_id: i64,
        name: String,
        status: String,
        created_at: DateTime<Utc>,
    },
    TaskUpdated {
        message: String,
        id: i64,
        name: String,
        status: String,
        created_at: DateTime<Utc>,
    },
    TaskDeleted {
        message: String,
        task_id: i64,
    },

    /// Acknowledgment for `ClientMessage::Message`.
    Response {
        message: String,
    },

    /// Sent when an incoming frame cannot be parsed.
    Error {
        code: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn events_carry_camel_case_type_tags() {
        let msg = ServerMessage::TaskCreated {
            message: "Task created successfully".to_string(),
            task_id: 7,
            name: "Buy milk".to_string(),
            status: "Pending".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "taskCreated");
        assert_eq!(json["task_id"], 7);
        assert_eq!(json["name"], "Buy milk");

        let msg = ServerMessage::TaskDeleted {
            message: "Task deleted successfully".to_string(),
            task_id: 7,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "taskDeleted");
    }

    #[test]
    fn client_message_parses_arbitrary_payload() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"message","data":{"hello":"world"}}"#).unwrap();
        let ClientMessage::Message { data } = msg;
        assert_eq!(data["hello"], "world");
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#);
        assert!(result.is_err());
    }
}
