//! End-to-end behaviour of the dispatcher against recording collaborators.
//!
//! Each test drives the bridge only through `OutboundCommand`s and simulated
//! network deliveries, then inspects what the fakes recorded.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use ffx_bridge::application::{Collaborators, Dispatcher, Route, SubscriptionState};
use ffx_bridge::domain::DeploymentMode;
use ffx_bridge::infrastructure::recording::{
    CollectingAppSink, ConnectionCall, RecordingHost, RecordingMessagingClient, RecordingTelemetry,
};
use ffx_core::{ChannelName, OutboundCommand, SubscriptionCreds, DECODE_FAILURE_PREFIX};

// ── Fixture ───────────────────────────────────────────────────────────────────

struct Harness {
    dispatcher: Dispatcher,
    messaging: RecordingMessagingClient,
    telemetry: RecordingTelemetry,
    host: RecordingHost,
    app: CollectingAppSink,
}

fn harness(deployment: DeploymentMode) -> Harness {
    let messaging = RecordingMessagingClient::new();
    let telemetry = RecordingTelemetry::new();
    let host = RecordingHost::new();
    let app = CollectingAppSink::new();

    let dispatcher = Dispatcher::new(
        deployment,
        Collaborators {
            messaging: Arc::new(messaging.clone()),
            telemetry: Arc::new(telemetry.clone()),
            host: Arc::new(host.clone()),
            app: Arc::new(app.clone()),
        },
    );

    Harness {
        dispatcher,
        messaging,
        telemetry,
        host,
        app,
    }
}

fn creds(space_id: &str) -> SubscriptionCreds {
    SubscriptionCreds {
        subscribe_key: "sub-c-1".to_string(),
        account_id: "acct-9".to_string(),
        token: "tok".to_string(),
        space_id: space_id.to_string(),
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[test]
fn test_every_command_variant_reaches_exactly_one_handler() {
    // Arrange
    let mut h = harness(DeploymentMode::Production);

    // Act / Assert: one command per variant, each observed by one fake only
    let route = h.dispatcher.dispatch(OutboundCommand::OpenExternalLink {
        url: "https://example.com".to_string(),
    });
    assert_eq!(route, Route::LinkOpener);
    assert_eq!(h.host.requested().len(), 1);
    assert!(h.telemetry.reports().is_empty());
    assert!(h.messaging.log().is_empty());

    let route = h.dispatcher.dispatch(OutboundCommand::ReportIssue {
        message: "boom".to_string(),
    });
    assert_eq!(route, Route::IssueReporter);
    assert_eq!(h.host.requested().len(), 1);
    assert_eq!(h.telemetry.reports().len(), 1);
    assert!(h.messaging.log().is_empty());

    let route = h
        .dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("abc123")));
    assert_eq!(route, Route::SubscriptionManager);
    assert_eq!(h.host.requested().len(), 1);
    assert_eq!(h.telemetry.reports().len(), 1);
    assert_eq!(h.messaging.connection_count(), 1);
}

#[test]
fn test_refused_link_open_is_swallowed() {
    let messaging = RecordingMessagingClient::new();
    let host = RecordingHost::refusing();
    let mut dispatcher = Dispatcher::new(
        DeploymentMode::Development,
        Collaborators {
            messaging: Arc::new(messaging),
            telemetry: Arc::new(RecordingTelemetry::new()),
            host: Arc::new(host.clone()),
            app: Arc::new(CollectingAppSink::new()),
        },
    );

    let route = dispatcher.dispatch(OutboundCommand::OpenExternalLink {
        url: "https://blocked.example.com".to_string(),
    });

    assert_eq!(route, Route::LinkOpener);
    assert_eq!(host.requested(), vec!["https://blocked.example.com".to_string()]);
}

// ── Subscription lifecycle ────────────────────────────────────────────────────

#[test]
fn test_many_credentials_leave_exactly_one_live_connection() {
    // Arrange
    let mut h = harness(DeploymentMode::Production);

    // Act
    for space in ["a", "b", "c", "d", "e"] {
        h.dispatcher
            .dispatch(OutboundCommand::SubscriptionCreds(creds(space)));
    }

    // Assert
    assert_eq!(h.messaging.connection_count(), 5);
    assert_eq!(h.messaging.live_connections(), 1);
    assert_eq!(h.messaging.stop_count(), 4);

    // Connection 3's stop precedes connection 4's subscribe.
    let log = h.messaging.log();
    let stop = log
        .iter()
        .position(|(id, call)| *id == 3 && *call == ConnectionCall::Stop)
        .unwrap();
    let subscribe = log
        .iter()
        .position(|(id, call)| *id == 4 && matches!(call, ConnectionCall::Subscribe(_)))
        .unwrap();
    assert!(stop < subscribe);
}

#[test]
fn test_channel_is_space_prefixed() {
    let mut h = harness(DeploymentMode::Production);

    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("abc123")));

    assert_eq!(
        h.messaging.subscribed_channels(),
        vec!["space.abc123".to_string()]
    );
}

#[test]
fn test_same_credentials_twice_restart_the_connection() {
    // Arrange
    let mut h = harness(DeploymentMode::Production);
    let same = creds("abc123");

    // Act
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(same.clone()));
    h.dispatcher.dispatch(OutboundCommand::SubscriptionCreds(same));

    // Assert: the stop on idle is a no-op, so only the real stop is recorded
    assert_eq!(h.messaging.stop_count(), 1);
    assert_eq!(
        h.messaging.subscribed_channels(),
        vec!["space.abc123".to_string(), "space.abc123".to_string()]
    );
    assert_eq!(
        h.dispatcher.subscriptions().state(),
        SubscriptionState::Active {
            generation: 1,
            channel: ChannelName::for_space("abc123"),
        }
    );
}

#[test]
fn test_stopped_connection_delivers_nothing() {
    let mut h = harness(DeploymentMode::Production);
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("old")));
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("new")));

    let old_delivered = h.messaging.deliver(0, r#"{"from":"old"}"#);
    let new_delivered = h.messaging.deliver(1, r#"{"from":"new"}"#);

    assert!(!old_delivered);
    assert!(new_delivered);
    assert_eq!(h.app.events().len(), 1);
    assert_eq!(h.app.events()[0].value(), &json!({"from": "new"}));
}

// ── Inbound pipeline ──────────────────────────────────────────────────────────

#[test]
fn test_valid_payload_reaches_app_without_report() {
    // Arrange
    let mut h = harness(DeploymentMode::Production);
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("abc123")));

    // Act
    h.messaging.deliver(0, r#"{"a":1}"#);

    // Assert
    let events = h.app.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].value(), &json!({"a": 1}));
    assert!(h.telemetry.reports().is_empty());
}

#[test]
fn test_malformed_payload_is_reported_not_forwarded() {
    // Arrange
    let mut h = harness(DeploymentMode::Production);
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("abc123")));

    // Act
    h.messaging.deliver(0, "not json");

    // Assert
    assert!(h.app.events().is_empty());
    let reports = h.telemetry.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].scope.tag("producer"), Some("fromJs"));
    assert!(reports[0].message.starts_with(DECODE_FAILURE_PREFIX));
    assert!(reports[0].message.contains("not json"));
    assert_eq!(
        reports[0].scope.contexts()["fromJs"],
        json!({"message": reports[0].message})
    );
}

#[test]
fn test_payloads_are_forwarded_in_delivery_order() {
    let mut h = harness(DeploymentMode::Development);
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("abc123")));

    for n in 0..5 {
        h.messaging.deliver(0, &format!(r#"{{"n":{n}}}"#));
    }

    let seen: Vec<_> = h
        .app
        .events()
        .iter()
        .map(|e| e.value()["n"].as_i64())
        .collect();
    assert_eq!(seen, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
}

// ── Deployment gating ─────────────────────────────────────────────────────────

#[test]
fn test_development_never_submits_telemetry() {
    // Arrange
    let mut h = harness(DeploymentMode::Development);
    h.dispatcher
        .dispatch(OutboundCommand::SubscriptionCreds(creds("abc123")));

    // Act: one report from each producer
    h.dispatcher.dispatch(OutboundCommand::ReportIssue {
        message: "from the app".to_string(),
    });
    h.messaging.deliver(0, "not json");

    // Assert
    assert!(h.telemetry.reports().is_empty());
    assert!(h.app.events().is_empty());
}

// ── Run loop ──────────────────────────────────────────────────────────────────

#[test]
fn test_run_loop_drains_queue_then_tears_down() {
    // Arrange
    let h = harness(DeploymentMode::Production);
    let (tx, rx) = mpsc::channel(8);
    tx.try_send(OutboundCommand::SubscriptionCreds(creds("abc123")))
        .unwrap();
    tx.try_send(OutboundCommand::ReportIssue {
        message: "late".to_string(),
    })
    .unwrap();
    drop(tx);

    // Act
    let dispatcher =
        tokio_test::block_on(h.dispatcher.run(rx, Arc::new(AtomicBool::new(true))));

    // Assert
    assert_eq!(h.telemetry.reports().len(), 1);
    assert_eq!(h.messaging.live_connections(), 0);
    assert_eq!(dispatcher.subscriptions().state(), SubscriptionState::Idle);
}
