use serde::{Deserialize, Serialize};

/// One decoded unit from the server-sent event stream.
///
/// Events exist only while a response is being decoded; they are folded
/// into session state and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// First event of a stream, carrying the server-assigned conversation id
    Setup {
        /// Identifier the server filed this exchange under
        conversation_id: String,
    },
    /// A text fragment to append to the in-progress assistant message
    Content {
        /// The fragment, applied by concatenation in arrival order
        content: String,
    },
    /// Normal termination of the stream
    Done {
        /// Id of the persisted message, when the server reports one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
    /// Server-side failure report
    Error {
        /// Diagnostic text from the server
        #[serde(default)]
        content: String,
    },
    /// Event kinds this client does not know; skipped by the decoder
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_event_decodes_conversation_id() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"setup","conversation_id":"abc-123"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Setup {
                conversation_id: "abc-123".into()
            }
        );
    }

    #[test]
    fn content_event_decodes_fragment() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"content","content":"Hello"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Content {
                content: "Hello".into()
            }
        );
    }

    #[test]
    fn done_event_carries_optional_message_id() {
        let bare: StreamEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(bare, StreamEvent::Done { message_id: None });

        let tagged: StreamEvent =
            serde_json::from_str(r#"{"type":"done","message_id":"m-1"}"#).unwrap();
        assert_eq!(
            tagged,
            StreamEvent::Done {
                message_id: Some("m-1".into())
            }
        );
    }

    #[test]
    fn unknown_type_maps_to_unknown() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"ping","content":"ignored"}"#).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
    }
}
