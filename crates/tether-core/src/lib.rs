// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tether client.
//!
//! This crate provides the collaborator trait definitions, error types, and
//! common types used throughout the Tether workspace. Platform services
//! (push SDK, voice SDK, navigator, store) implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TetherError;
pub use types::{
    CallIntent, DeviceToken, GenericNotification, InboundPushPayload, Route, SessionToken,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    AlertSink, BannerPresenter, CallSignalingApi, DeviceTokenApi, KeyValueStore, Navigator,
    NetworkMonitor, NotificationHandler, PermissionGate, PushProvider, VoiceEngine,
    VoiceEngineFactory,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ActiveCallParams, AlertKind, IncomingCallParams, PermissionKind, Platform, UNKNOWN_CALLER,
    };
    use serde_json::json;

    #[test]
    fn payload_from_value_keeps_known_parts() {
        let payload = InboundPushPayload::from_value(json!({
            "notification": {"title": "Hi", "body": "There"},
            "data": {"type": "call", "id": 42},
            "from": "ignored",
        }));
        assert_eq!(payload.title(), Some("Hi"));
        assert_eq!(payload.body(), Some("There"));
        assert_eq!(payload.data_str("type").as_deref(), Some("call"));
        assert_eq!(payload.data_str("id").as_deref(), Some("42"));
    }

    #[test]
    fn payload_from_value_tolerates_garbage() {
        let payload = InboundPushPayload::from_value(json!("not an object"));
        assert!(payload.is_empty());

        let payload = InboundPushPayload::from_value(json!({
            "notification": {"title": 7, "body": null},
            "data": [1, 2, 3],
        }));
        assert!(payload.is_empty());
    }

    #[test]
    fn null_data_fields_are_absent() {
        let payload = InboundPushPayload::from_value(json!({"data": {"channelId": null}}));
        assert!(payload.data_value("channelId").is_none());
        assert!(payload.data_str("channelId").is_none());
    }

    #[test]
    fn payload_deserializes_through_serde() {
        let payload: InboundPushPayload = serde_json::from_str(
            r#"{"notification":{"title":"T"},"data":{"screen":"Chat"}}"#,
        )
        .unwrap();
        assert_eq!(payload.title(), Some("T"));
        assert_eq!(payload.data_str("screen").as_deref(), Some("Chat"));
    }

    #[test]
    fn generic_notification_decodes_string_params() {
        let payload = InboundPushPayload::from_value(json!({
            "notification": {"title": "New message", "body": "Hello"},
            "data": {"screen": "ChatRoom", "params": "{\"roomId\":\"r1\"}"},
        }));
        let generic = GenericNotification::from_payload(&payload);
        assert_eq!(generic.screen(), Some("ChatRoom"));
        assert_eq!(generic.params(), json!({"roomId": "r1"}));
    }

    #[test]
    fn generic_notification_bad_params_become_empty_object() {
        let payload = InboundPushPayload::from_value(json!({
            "data": {"screen": "ChatRoom", "params": "{broken"},
        }));
        let generic = GenericNotification::from_payload(&payload);
        assert_eq!(generic.params(), json!({}));
        assert_eq!(generic.title, "");
    }

    #[test]
    fn call_intent_actionability() {
        assert!(!CallIntent::default().is_actionable());
        let intent = CallIntent {
            channel_id: "abc".into(),
            ..Default::default()
        };
        assert!(intent.is_actionable());
        assert_eq!(intent.display_name(), UNKNOWN_CALLER);
    }

    #[test]
    fn route_params_serialize_camel_case() {
        let intent = CallIntent {
            caller_name: "".into(),
            channel_id: "ch-1".into(),
            caller_image: None,
        };
        let params = serde_json::to_value(IncomingCallParams::from(&intent)).unwrap();
        assert_eq!(
            params,
            json!({"callerName": "Unknown", "channelId": "ch-1", "callerImage": null})
        );

        let active = ActiveCallParams {
            channel_id: "ch-1".into(),
            recipient_name: "Mom".into(),
            is_incoming: true,
            token: None,
        };
        let params = serde_json::to_value(active).unwrap();
        assert_eq!(
            params,
            json!({"channelId": "ch-1", "recipientName": "Mom", "isIncoming": true})
        );
    }

    #[test]
    fn user_facing_errors_map_to_alerts() {
        let denied = TetherError::PermissionDenied {
            permission: PermissionKind::Microphone,
        };
        assert!(denied.is_user_facing());
        let alert = denied.alert().unwrap();
        assert_eq!(alert.kind, AlertKind::PermissionDenied);
        assert!(alert.message.contains("microphone"));

        assert_eq!(
            TetherError::NetworkUnreachable.alert().unwrap().kind,
            AlertKind::NetworkUnreachable
        );
        assert!(!TetherError::backend("boom").is_user_facing());
        assert!(TetherError::backend("boom").alert().is_none());
    }

    #[test]
    fn platform_parses_lowercase() {
        use std::str::FromStr;
        assert_eq!(Platform::from_str("ios").unwrap(), Platform::Ios);
        assert_eq!(Platform::Android.to_string(), "android");
    }

    #[test]
    fn device_token_redacts() {
        let token = DeviceToken("abcdefghijklmnop".into());
        assert_eq!(token.redacted(), "abcdefgh…");
    }

    #[test]
    fn all_collaborator_traits_are_exported() {
        fn _assert_store<T: KeyValueStore>() {}
        fn _assert_push<T: PushProvider>() {}
        fn _assert_navigator<T: Navigator>() {}
        fn _assert_engine<T: VoiceEngine>() {}
        fn _assert_factory<T: VoiceEngineFactory>() {}
        fn _assert_permissions<T: PermissionGate>() {}
        fn _assert_network<T: NetworkMonitor>() {}
        fn _assert_alerts<T: AlertSink>() {}
        fn _assert_banner<T: BannerPresenter>() {}
        fn _assert_handler<T: NotificationHandler>() {}
        fn _assert_tokens<T: DeviceTokenApi>() {}
        fn _assert_signaling<T: CallSignalingApi>() {}
    }
}
