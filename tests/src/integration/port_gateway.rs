//! # Port Gateway Flows
//!
//! Requests arriving as `iac-fxa-mgmt` messages and the `{data}`/`{error}`
//! replies written back on the same port.

#[cfg(test)]
mod tests {
    use crate::integration::{Harness, SETTLE};
    use fxa_manager::testing::{Behavior, RecordingConnector};
    use fxa_manager::{ManagerConfig, MessagePort};
    use serde_json::json;
    use shared_types::{Outcome, PortReply};
    use std::time::Duration;

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// getAccounts succeeding with "success" yields {data: "success"}.
    #[tokio::test]
    async fn test_get_accounts_success_reply() {
        let h = Harness::start(Behavior::Succeed(json!("success")), Behavior::Abandon);

        h.port_message("getAccounts").await;

        let replies = h.port_replies(1).await;
        assert_eq!(replies, vec![PortReply::Data(json!("success"))]);
        assert_eq!(
            serde_json::to_value(&replies[0]).unwrap(),
            json!({"data": "success"})
        );
        assert_eq!(h.accounts.calls(), vec!["getAccounts"]);
    }

    /// logout failing with "error" yields {error: "error"}.
    #[tokio::test]
    async fn test_logout_error_reply() {
        let h = Harness::start(Behavior::Fail(json!("error")), Behavior::Abandon);

        h.port_message("logout").await;

        let replies = h.port_replies(1).await;
        assert_eq!(
            serde_json::to_value(&replies[0]).unwrap(),
            json!({"error": "error"})
        );
        assert_eq!(h.accounts.calls(), vec!["logout"]);
    }

    /// openFlow on the port drives the login UI and replies on the port.
    #[tokio::test]
    async fn test_open_flow_on_port() {
        let mut h = Harness::start(Behavior::Abandon, Behavior::Succeed(json!({"verified": true})));

        h.port_message("openFlow").await;

        let replies = h.port_replies(1).await;
        assert_eq!(replies, vec![PortReply::Data(json!({"verified": true}))]);
        assert_eq!(h.ui.calls(), vec!["login"]);
        assert!(h.accounts.calls().is_empty());

        tokio::time::sleep(SETTLE).await;
        assert!(h.drain_content().is_empty());
    }

    // =============================================================================
    // PORT LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_port_connected_once_and_reused() {
        let h = Harness::start(Behavior::Succeed(json!([])), Behavior::Succeed(json!("ok")));
        assert!(!h.manager.has_port());

        for name in ["getAccounts", "logout", "openFlow", "getAccounts"] {
            h.port_message(name).await;
        }

        assert_eq!(h.port_replies(4).await.len(), 4);
        assert!(h.manager.has_port());
        assert_eq!(h.connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_port_skips_collaborator() {
        let h = Harness::start_with(
            ManagerConfig::default(),
            Behavior::Succeed(json!("never sent")),
            Behavior::Abandon,
            RecordingConnector::unavailable(),
        );

        h.port_message("getAccounts").await;
        tokio::time::sleep(SETTLE).await;

        assert!(h.accounts.calls().is_empty());
        let stats = h.manager.stats();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_custom_port_name() {
        let config = ManagerConfig {
            port_name: "fxa-mgmt-test".into(),
            ..ManagerConfig::default()
        };
        let h = Harness::start_with(
            config,
            Behavior::Succeed(json!("custom")),
            Behavior::Abandon,
            RecordingConnector::named("fxa-mgmt-test"),
        );

        h.port_message("getAccounts").await;

        assert_eq!(h.port_replies(1).await, vec![PortReply::Data(json!("custom"))]);
        assert_eq!(h.connector.port().name(), "fxa-mgmt-test");
    }

    #[tokio::test]
    async fn test_closed_port_released() {
        let h = Harness::start(Behavior::Succeed(json!(1)), Behavior::Abandon);
        h.connector.port().close();

        h.port_message("getAccounts").await;
        tokio::time::sleep(SETTLE).await;

        let stats = h.manager.stats();
        assert_eq!(stats.undeliverable, 1);
        assert_eq!(stats.replied, 0);
        assert!(!h.manager.has_port());
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    /// Replies follow collaborator completion order, not arrival order.
    #[tokio::test]
    async fn test_replies_in_completion_order() {
        let h = Harness::start(
            Behavior::Delayed(Duration::from_millis(100), Outcome::success("accounts")),
            Behavior::Succeed(json!("login")),
        );

        h.port_message("getAccounts").await;
        h.port_message("openFlow").await;

        let replies = h.port_replies(2).await;
        assert_eq!(
            replies,
            vec![
                PortReply::Data(json!("login")),
                PortReply::Data(json!("accounts")),
            ]
        );
    }

    #[tokio::test]
    async fn test_burst_of_requests() {
        let h = Harness::start(Behavior::Succeed(json!("ok")), Behavior::Fail(json!("no")));

        for _ in 0..25 {
            h.port_message("getAccounts").await;
            h.port_message("openFlow").await;
        }

        let replies = h.port_replies(50).await;
        assert_eq!(replies.iter().filter(|r| r.is_error()).count(), 25);
        assert_eq!(h.accounts.calls().len(), 25);
        assert_eq!(h.ui.calls().len(), 25);

        tokio::time::sleep(SETTLE).await;
        assert_eq!(h.manager.stats().replied, 50);
        assert_eq!(h.manager.in_flight(), 0);
    }
}
