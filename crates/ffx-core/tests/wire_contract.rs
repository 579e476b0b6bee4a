//! Integration tests for the app/bridge wire contract.
//!
//! These tests feed the public decoders the exact frames the app core emits
//! and the exact payloads the messaging network delivers, and check what the
//! bridge gets out of them.

use ffx_core::{
    decode_command, decode_payload, ChannelName, OutboundCommand, Producer, ProtocolError,
    SubscriptionCreds, DECODE_FAILURE_PREFIX,
};
use serde_json::json;

#[test]
fn test_every_command_tag_is_recognised() {
    let frames = [
        r#"{"tag":"openExternalLink","data":{"url":"https://docs.example.com"}}"#,
        r#"{"tag":"reportIssue","data":{"message":"could not decode space"}}"#,
        r#"{"tag":"subscriptionCreds","data":{"subscribeKey":"k","accountId":"a","token":"t","spaceId":"s"}}"#,
    ];

    let tags: Vec<&'static str> = frames
        .iter()
        .map(|f| decode_command(f).expect("frame must decode").tag())
        .collect();

    assert_eq!(tags, ["openExternalLink", "reportIssue", "subscriptionCreds"]);
}

#[test]
fn test_pascal_case_tag_is_not_accepted() {
    // Tags are camelCase on the wire; the Rust variant name is not an alias.
    let result = decode_command(r#"{"tag":"OpenExternalLink","data":{"url":"x"}}"#);

    assert!(matches!(result, Err(ProtocolError::MalformedCommand(_))));
}

#[test]
fn test_extra_fields_from_the_app_are_ignored() {
    let frame = r#"{"tag":"reportIssue","data":{"message":"m","context":"ignored"},"v":2}"#;

    let cmd = decode_command(frame).unwrap();

    assert_eq!(
        cmd,
        OutboundCommand::ReportIssue {
            message: "m".to_string()
        }
    );
}

#[test]
fn test_credentials_frame_derives_space_channel() {
    let frame = r#"{"tag":"subscriptionCreds","data":{"subscribeKey":"sub-c-1","accountId":"acct-9","token":"tok","spaceId":"abc123"}}"#;

    let OutboundCommand::SubscriptionCreds(creds) = decode_command(frame).unwrap() else {
        panic!("expected subscriptionCreds");
    };

    assert_eq!(creds.channel(), ChannelName::for_space("abc123"));
    assert_eq!(creds.channel().as_str(), "space.abc123");
}

#[test]
fn test_credentials_debug_never_contains_token() {
    let creds = SubscriptionCreds {
        subscribe_key: "sub-c-1".to_string(),
        account_id: "acct-9".to_string(),
        token: "p0F2AkF0Gmxyz".to_string(),
        space_id: "abc123".to_string(),
    };
    let cmd = OutboundCommand::SubscriptionCreds(creds);

    assert!(!format!("{cmd:?}").contains("p0F2AkF0Gmxyz"));
}

#[test]
fn test_valid_payload_is_forwarded_unchanged() {
    let raw = r#"{"type":"member.joined","member":{"id":7,"tags":["a","b"]}}"#;

    let event = decode_payload(raw).unwrap();

    assert_eq!(
        event.value(),
        &json!({"type": "member.joined", "member": {"id": 7, "tags": ["a", "b"]}})
    );
}

#[test]
fn test_invalid_payload_issue_text_contains_literal_payload() {
    let failure = decode_payload("not json").unwrap_err();

    let message = failure.issue_message();

    assert!(message.starts_with(DECODE_FAILURE_PREFIX));
    assert!(message.contains("not json"));
}

#[test]
fn test_producer_tags_are_distinct() {
    assert_ne!(Producer::FromElm.as_str(), Producer::FromJs.as_str());
}
