//! JSON rendering of events for the JavaScript bridge

use serde_json::{json, Value};
use sms_retriever::SmsEvent;

/// Bridge representation of an [`SmsEvent`]
pub trait BridgeEvent {
    /// Channel the event is sent on (`onSmsReceived`, `onTimeout`, `onError`)
    fn bridge_channel(&self) -> &'static str;

    /// Payload object as the bridge sends it
    fn to_bridge_json(&self) -> Value;

    /// `{ "event": channel, "payload": payload }`
    fn bridge_message(&self) -> Value {
        json!({
            "event": self.bridge_channel(),
            "payload": self.to_bridge_json(),
        })
    }
}

impl BridgeEvent for SmsEvent {
    fn bridge_channel(&self) -> &'static str {
        self.channel().name()
    }

    fn to_bridge_json(&self) -> Value {
        let payload = match self {
            SmsEvent::Received(payload) => serde_json::to_value(payload),
            SmsEvent::Timeout(payload) => serde_json::to_value(payload),
            SmsEvent::Error(payload) => serde_json::to_value(payload),
        };
        // Payloads are plain string/integer structs.
        payload.unwrap_or(Value::Null)
    }
}
