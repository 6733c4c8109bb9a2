// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload classification and call parameter extraction.
//!
//! Both rule lists are ordered; the first match wins. Nothing here fails:
//! a malformed field degrades to "not a call" or to the next extraction
//! rule.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use tether_core::types::{UNKNOWN_CALLER, scalar_to_string};
use tether_core::{CallIntent, GenericNotification, InboundPushPayload};

/// `data.type` of a call-signaling payload.
pub const CALL_TYPE: &str = "call";

/// `data.type` the backend uses for localized call notifications.
pub const NOTIFICATION_TYPE: &str = "NOTIFICATION_TYPE";

/// Title marker of a localized call notification.
pub const LOCALIZED_CALL_TITLE: &str = "Cuộc gọi";

/// Body prefixes stripped to recover the caller name.
const CALLER_PREFIXES: &[&str] = &["Cuộc gọi từ ", "Call from "];

/// What a payload turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// An actionable incoming call.
    Call(CallIntent),
    /// Anything displayable, including call payloads that failed the gate.
    Generic(GenericNotification),
    /// Nothing to show or act on.
    Unrecognized,
}

/// Normalizes `payload` in one pass.
pub fn classify(payload: &InboundPushPayload) -> Classification {
    if is_call_notification(payload) {
        let intent = extract_call_intent(payload);
        if intent.is_actionable() {
            return Classification::Call(intent);
        }
        debug!("call payload without channel or caller, treating as generic");
    }
    if payload.is_empty() {
        Classification::Unrecognized
    } else {
        Classification::Generic(GenericNotification::from_payload(payload))
    }
}

/// Call detection rules:
///
/// 1. `data.type == "call"`.
/// 2. `notification.title` contains "Cuộc gọi" and `data.type == "NOTIFICATION_TYPE"`.
pub fn is_call_notification(payload: &InboundPushPayload) -> bool {
    let kind = payload.data_str("type");
    let kind = kind.as_deref();

    if kind == Some(CALL_TYPE) {
        return true;
    }
    payload
        .title()
        .is_some_and(|title| title.contains(LOCALIZED_CALL_TITLE))
        && kind == Some(NOTIFICATION_TYPE)
}

/// Extraction rules:
///
/// 1. `data.callData`, a JSON string or an object.
/// 2. `data.channelId` with optional `callerName` and `callerImage`.
/// 3. `notification.body` plus `data.id`; the caller name is the body with
///    its "call from" prefix removed.
/// 4. An empty intent.
pub fn extract_call_intent(payload: &InboundPushPayload) -> CallIntent {
    if let Some(intent) = from_call_data(payload) {
        return intent;
    }

    if let Some(channel_id) = payload.data_str("channelId") {
        return CallIntent {
            caller_name: payload
                .data_str("callerName")
                .unwrap_or_else(|| UNKNOWN_CALLER.to_string()),
            channel_id,
            caller_image: payload.data_str("callerImage"),
        };
    }

    if let (Some(body), Some(id)) = (payload.body(), payload.data_str("id")) {
        return CallIntent {
            caller_name: strip_caller_prefix(body).to_string(),
            channel_id: id,
            caller_image: None,
        };
    }

    CallIntent::default()
}

fn from_call_data(payload: &InboundPushPayload) -> Option<CallIntent> {
    match payload.data_value("callData")? {
        Value::Object(fields) => Some(intent_from_fields(fields)),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Some(intent_from_fields(&fields)),
            Ok(_) => {
                warn!("callData is not a JSON object, ignoring");
                None
            }
            Err(e) => {
                warn!(error = %e, "callData is not valid JSON, ignoring");
                None
            }
        },
        _ => None,
    }
}

fn intent_from_fields(fields: &Map<String, Value>) -> CallIntent {
    let field = |key: &str| fields.get(key).and_then(scalar_to_string);
    CallIntent {
        caller_name: field("callerName").unwrap_or_default(),
        channel_id: field("channelId").unwrap_or_default(),
        caller_image: fields
            .get("callerImage")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn strip_caller_prefix(body: &str) -> &str {
    let trimmed = body.trim();
    CALLER_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use tether_core::types::IncomingCallParams;

    fn payload(value: Value) -> InboundPushPayload {
        InboundPushPayload::from_value(value)
    }

    #[test]
    fn type_call_is_a_call() {
        assert!(is_call_notification(&payload(json!({"data": {"type": "call"}}))));
    }

    #[test]
    fn localized_title_needs_notification_type() {
        let with_type = payload(json!({
            "notification": {"title": "Cuộc gọi đến", "body": "Cuộc gọi từ Mẹ"},
            "data": {"type": "NOTIFICATION_TYPE", "id": "ch-9"}
        }));
        assert!(is_call_notification(&with_type));

        let without_type = payload(json!({
            "notification": {"title": "Cuộc gọi đến"},
            "data": {"type": "chat"}
        }));
        assert!(!is_call_notification(&without_type));

        let type_without_title = payload(json!({
            "notification": {"title": "New message"},
            "data": {"type": "NOTIFICATION_TYPE"}
        }));
        assert!(!is_call_notification(&type_without_title));
    }

    #[test]
    fn call_data_string_wins_over_other_fields() {
        let p = payload(json!({"data": {
            "type": "call",
            "callData": "{\"callerName\":\"Dad\",\"channelId\":\"c-1\",\"callerImage\":\"https://img/d.png\"}",
            "channelId": "ignored"
        }}));
        let intent = extract_call_intent(&p);
        assert_eq!(intent.caller_name, "Dad");
        assert_eq!(intent.channel_id, "c-1");
        assert_eq!(intent.caller_image.as_deref(), Some("https://img/d.png"));
    }

    #[test]
    fn call_data_object_is_used_as_is() {
        let p = payload(json!({"data": {"callData": {"channelId": 77, "callerName": "Mom"}}}));
        let intent = extract_call_intent(&p);
        assert_eq!(intent.channel_id, "77");
        assert_eq!(intent.caller_name, "Mom");
        assert_eq!(intent.caller_image, None);
    }

    #[tracing_test::traced_test]
    #[test]
    fn malformed_call_data_falls_through_to_channel_id() {
        let p = payload(json!({"data": {"callData": "{not json", "channelId": "c-2"}}));
        let intent = extract_call_intent(&p);
        assert_eq!(intent.channel_id, "c-2");
        assert!(logs_contain("callData is not valid JSON"));
    }

    #[test]
    fn channel_id_without_caller_defaults_to_unknown() {
        let p = payload(json!({"data": {"type": "call", "channelId": "c-3"}}));
        let intent = extract_call_intent(&p);
        assert_eq!(intent.channel_id, "c-3");
        assert_eq!(intent.caller_name, "Unknown");
        assert_eq!(IncomingCallParams::from(&intent).caller_name, "Unknown");
    }

    #[test]
    fn empty_channel_id_with_default_caller_is_still_a_call() {
        let p = payload(json!({"data": {"type": "call", "channelId": ""}}));
        match classify(&p) {
            Classification::Call(intent) => {
                assert_eq!(intent.channel_id, "");
                assert_eq!(intent.caller_name, UNKNOWN_CALLER);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn body_prefix_is_stripped() {
        for (body, expected) in [
            ("Cuộc gọi từ Bà Nội", "Bà Nội"),
            ("Call from Grandpa ", "Grandpa"),
            ("  Uncle Joe  ", "Uncle Joe"),
        ] {
            let p = payload(json!({
                "notification": {"body": body},
                "data": {"id": 12}
            }));
            let intent = extract_call_intent(&p);
            assert_eq!(intent.caller_name, expected, "body {body:?}");
            assert_eq!(intent.channel_id, "12");
            assert_eq!(intent.caller_image, None);
        }
    }

    #[test]
    fn nothing_extractable_yields_empty_intent() {
        let p = payload(json!({"data": {"type": "call"}}));
        assert_eq!(extract_call_intent(&p), CallIntent::default());
    }

    #[test]
    fn unactionable_call_falls_back_to_generic() {
        let p = payload(json!({
            "notification": {"title": "Call"},
            "data": {"type": "call", "channelId": null}
        }));
        match classify(&p) {
            Classification::Generic(n) => assert_eq!(n.title, "Call"),
            other => panic!("expected generic, got {other:?}"),
        }
    }

    #[test]
    fn classify_routes_each_shape() {
        let call = payload(json!({"data": {"type": "call", "channelId": "c"}}));
        assert!(matches!(classify(&call), Classification::Call(_)));

        let chat = payload(json!({
            "notification": {"title": "Chat", "body": "hi"},
            "data": {"screen": "Chat"}
        }));
        assert!(matches!(classify(&chat), Classification::Generic(_)));

        assert_eq!(classify(&payload(json!("garbage"))), Classification::Unrecognized);
    }

    fn non_call_type() -> impl Strategy<Value = String> {
        "[A-Za-z_]{0,16}".prop_filter("not a call type", |s| s != CALL_TYPE && s != NOTIFICATION_TYPE)
    }

    proptest! {
        #[test]
        fn type_call_always_classifies_as_call(title in any::<Option<String>>(), extra in any::<String>()) {
            let mut value = json!({"data": {"type": "call", "extra": extra}});
            if let Some(title) = title {
                value["notification"] = json!({"title": title});
            }
            prop_assert!(is_call_notification(&payload(value)));
        }

        #[test]
        fn localized_title_with_notification_type_is_call(before in ".{0,12}", after in ".{0,12}") {
            let title = format!("{before}{LOCALIZED_CALL_TITLE}{after}");
            let p = payload(json!({
                "notification": {"title": title},
                "data": {"type": NOTIFICATION_TYPE}
            }));
            prop_assert!(is_call_notification(&p));
        }

        #[test]
        fn other_types_are_never_calls(kind in non_call_type(), title in ".{0,24}") {
            let p = payload(json!({
                "notification": {"title": title},
                "data": {"type": kind}
            }));
            prop_assert!(!is_call_notification(&p));
        }

        #[test]
        fn classification_never_panics(raw in ".{0,64}", n in any::<i64>()) {
            let p = payload(json!({
                "notification": {"title": raw.clone(), "body": raw.clone()},
                "data": {"type": "call", "callData": raw, "id": n}
            }));
            let _ = classify(&p);
        }
    }
}
