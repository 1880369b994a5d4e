//! # Relay Properties
//!
//! Exactly one reply, reply shapes, id correlation, routing and unknown
//! operations, checked across both channels. Also covers listener
//! registration and deferred collaborator loading.

#[cfg(test)]
mod tests {
    use crate::integration::{init_tracing, Harness, SETTLE, WAIT};
    use async_trait::async_trait;
    use fxa_manager::testing::{
        Behavior, CountingLoader, RecordingConnector, ScriptedAccountClient, ScriptedLoginUi,
    };
    use fxa_manager::{
        AccountClient, AccountManagerApi, Collaborators, Continuation, DeferredLoader,
        FxAccountsManager, LoadError, ManagerConfig, ManagerError, UnknownOperationPolicy,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shared_bus::{EventPublisher, InMemoryEventBus, SystemEvent};
    use shared_types::{ContentReply, Envelope, Operation, Outcome, PortReply, RpId};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn payloads() -> Vec<Value> {
        vec![
            json!("success"),
            json!(""),
            json!(0),
            json!(null),
            json!([{"email": "a@example.com", "verified": true}]),
            json!({"nested": {"list": [1, 2, 3], "flag": false}}),
        ]
    }

    // =============================================================================
    // EXACTLY ONE REPLY
    // =============================================================================

    /// A collaborator calling both continuations produces one port reply.
    #[tokio::test]
    async fn test_double_settlement_single_port_reply() {
        let h = Harness::start(
            Behavior::SucceedThenFail(json!("first"), json!("second")),
            Behavior::Abandon,
        );

        h.port_message("getAccounts").await;

        assert_eq!(h.port_replies(1).await, vec![PortReply::Data(json!("first"))]);
        tokio::time::sleep(SETTLE).await;
        assert_eq!(h.connector.port().messages().len(), 1);
        assert_eq!(h.manager.stats().duplicate_settlements, 1);
    }

    /// Same on the relay channel.
    #[tokio::test]
    async fn test_double_settlement_single_content_reply() {
        let mut h = Harness::start(
            Behavior::Abandon,
            Behavior::SucceedThenFail(json!("first"), json!("second")),
        );

        h.chrome_event(9, "openFlow").await;

        assert_eq!(
            h.next_content().await,
            ContentReply::new(RpId::new(9), Outcome::success("first"))
        );
        tokio::time::sleep(SETTLE).await;
        assert!(h.drain_content().is_empty());
    }

    /// A continuation dropped unsettled yields no reply and is counted.
    #[tokio::test]
    async fn test_abandoned_continuation() {
        let h = Harness::start(Behavior::Abandon, Behavior::Abandon);

        h.port_message("logout").await;
        tokio::time::sleep(SETTLE).await;

        assert!(h.connector.port().messages().is_empty());
        let stats = h.manager.stats();
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.in_flight(), 0);
        assert_eq!(h.manager.in_flight(), 0);
    }

    /// A collaborator that never settles leaves a visible in-flight request.
    #[tokio::test]
    async fn test_hang_is_observable() {
        let mut h = Harness::start(Behavior::Abandon, Behavior::Hold);

        h.chrome_event(77, "openFlow").await;
        tokio::time::sleep(SETTLE).await;

        let stale = h.manager.stale(Duration::from_millis(10));
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].1.operation, Operation::OpenFlow);
        assert_eq!(stale[0].1.channel.id(), Some(RpId::new(77)));
        assert!(h.drain_content().is_empty());

        assert_eq!(h.ui.release(Outcome::failure("timeout")), 1);
        assert_eq!(
            h.next_content().await,
            ContentReply::new(RpId::new(77), Outcome::failure("timeout"))
        );
    }

    // =============================================================================
    // SHAPES AND CORRELATION
    // =============================================================================

    #[tokio::test]
    async fn test_port_shapes_preserve_payload() {
        for payload in payloads() {
            let ok = Harness::start(Behavior::Succeed(payload.clone()), Behavior::Abandon);
            ok.port_message("getAccounts").await;
            assert_eq!(
                serde_json::to_value(&ok.port_replies(1).await[0]).unwrap(),
                json!({"data": payload.clone()})
            );

            let err = Harness::start(Behavior::Fail(payload.clone()), Behavior::Abandon);
            err.port_message("logout").await;
            assert_eq!(
                serde_json::to_value(&err.port_replies(1).await[0]).unwrap(),
                json!({"error": payload})
            );
        }
    }

    #[tokio::test]
    async fn test_relay_shapes_preserve_payload_and_id() {
        let ids = [0_u64, 123, 4_294_967_296, u64::MAX];
        for (payload, id) in payloads().into_iter().zip(ids.into_iter().cycle()) {
            let mut ok = Harness::start(Behavior::Abandon, Behavior::Succeed(payload.clone()));
            ok.chrome_event(id, "openFlow").await;
            assert_eq!(
                serde_json::to_value(ok.next_content().await).unwrap(),
                json!({"id": id, "data": payload.clone()})
            );

            let mut err = Harness::start(Behavior::Abandon, Behavior::Fail(payload.clone()));
            err.chrome_event(id, "openFlow").await;
            assert_eq!(
                serde_json::to_value(err.next_content().await).unwrap(),
                json!({"id": id, "error": payload})
            );
        }
    }

    // =============================================================================
    // ROUTING
    // =============================================================================

    #[tokio::test]
    async fn test_routing_table() {
        let cases = [
            ("getAccounts", vec!["getAccounts"], Vec::<&str>::new()),
            ("logout", vec!["logout"], vec![]),
            ("openFlow", vec![], vec!["login"]),
        ];

        for (name, client_calls, ui_calls) in cases {
            let h = Harness::start(Behavior::Succeed(json!(1)), Behavior::Succeed(json!(2)));
            h.port_message(name).await;
            h.port_replies(1).await;

            assert_eq!(h.accounts.calls(), client_calls, "client calls for {name}");
            assert_eq!(h.ui.calls(), ui_calls, "ui calls for {name}");
        }
    }

    #[tokio::test]
    async fn test_unknown_names_produce_nothing() {
        let mut h = Harness::start(Behavior::Succeed(json!(1)), Behavior::Succeed(json!(2)));

        for name in ["", "GETACCOUNTS", "getaccounts", "open_flow", "deleteAccount"] {
            h.port_message(name).await;
        }
        tokio::time::sleep(SETTLE).await;

        assert!(h.connector.port().messages().is_empty());
        assert!(h.drain_content().is_empty());
        assert!(h.accounts.calls().is_empty());
        assert!(h.ui.calls().is_empty());
        assert_eq!(h.connector.connects(), 0);
        assert_eq!(h.manager.stats().ignored, 5);
    }

    #[tokio::test]
    async fn test_unknown_name_error_policy() {
        init_tracing();
        let config = ManagerConfig {
            unknown_operation: UnknownOperationPolicy::Error,
            ..ManagerConfig::default()
        };
        let manager = manager_with(config, Collaborators::new(
            Arc::new(ScriptedAccountClient::new(Behavior::Succeed(json!(1)))),
            Arc::new(ScriptedLoginUi::new(Behavior::Succeed(json!(2)))),
        ));

        let err = manager.on_port_message(Envelope::port("deleteAccount")).unwrap_err();
        assert_eq!(err.to_string(), "unknown operation 'deleteAccount' on port channel");

        let err = manager.handle_event(Envelope::chrome(3, "getAccounts")).unwrap_err();
        assert_eq!(err.to_string(), "unknown operation 'getAccounts' on relay channel");

        assert!(manager.on_port_message(Envelope::port("logout")).unwrap().is_some());
    }

    /// The port reads `name` only; a `method`-only envelope reaches nobody.
    #[tokio::test]
    async fn test_port_ignores_method_field() {
        let mut h = Harness::start(Behavior::Succeed(json!("ok")), Behavior::Succeed(json!("ui")));
        let envelope = Envelope::from_json(json!({"detail": {"method": "logout"}})).unwrap();
        let keyword = h.manager.config().port_name.clone();

        h.bus.publish(SystemEvent::iac(keyword, envelope)).await;
        tokio::time::sleep(SETTLE).await;

        assert!(h.connector.port().messages().is_empty());
        assert!(h.drain_content().is_empty());
        assert!(h.accounts.calls().is_empty());
        assert_eq!(h.manager.stats().ignored, 1);
    }

    /// The relay reads `method` only; a conflicting `name` does not matter.
    #[tokio::test]
    async fn test_relay_dispatches_on_method() {
        let mut h = Harness::start(Behavior::Succeed(json!("acct")), Behavior::Succeed(json!("flow")));
        let envelope = Envelope::from_json(json!({"id": 5, "name": "logout", "method": "openFlow"}))
            .unwrap();

        h.bus.publish(SystemEvent::RpChrome(envelope)).await;

        assert_eq!(
            h.next_content().await,
            ContentReply::new(RpId::new(5), Outcome::success("flow"))
        );
        assert!(h.accounts.calls().is_empty());
        assert_eq!(h.ui.calls(), vec!["login"]);
    }

    // =============================================================================
    // NO ENVELOPE LOST
    // =============================================================================

    /// Bursts larger than the bus queue are delayed, never dropped.
    #[tokio::test]
    async fn test_burst_larger_than_bus_queue() {
        let config = ManagerConfig {
            bus_capacity: 2,
            ..ManagerConfig::default()
        };
        let mut h = Harness::start_with(
            config,
            Behavior::Succeed(json!("ok")),
            Behavior::Succeed(json!("flow")),
            RecordingConnector::new(),
        );

        for _ in 0..5 {
            h.port_message("getAccounts").await;
        }
        assert_eq!(h.port_replies(5).await.len(), 5);

        let publisher = {
            let bus = h.bus.clone();
            tokio::spawn(async move {
                for id in 0..5 {
                    bus.publish(SystemEvent::RpChrome(Envelope::chrome(id, "openFlow")))
                        .await;
                }
            })
        };
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(h.next_content().await.id.value());
        }
        publisher.await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        tokio::time::sleep(SETTLE).await;
        let stats = h.manager.stats();
        assert_eq!(stats.received, 10);
        assert_eq!(stats.replied, 10);
        assert_eq!(stats.ignored, 0);
    }

    // =============================================================================
    // INITIALIZATION
    // =============================================================================

    #[tokio::test]
    async fn test_exactly_two_listeners() {
        let h = Harness::start(Behavior::Succeed(json!("once")), Behavior::Abandon);

        assert_eq!(h.manager.listener_count(), 2);
        assert!(matches!(h.manager.start(), Err(ManagerError::AlreadyStarted)));
        assert_eq!(h.manager.listener_count(), 2);

        // A second start must not double-deliver.
        h.port_message("getAccounts").await;
        h.port_replies(1).await;
        tokio::time::sleep(SETTLE).await;
        assert_eq!(h.accounts.calls().len(), 1);
        assert_eq!(h.connector.port().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_replies_with_error_and_retries() {
        init_tracing();
        let loader = Arc::new(CountingLoader::failing("fxa_client.js", "network down"));
        let accounts = Arc::new(ScriptedAccountClient::new(Behavior::Succeed(json!(1))));
        let connector = Arc::new(RecordingConnector::new());
        let manager = FxAccountsManager::new(
            ManagerConfig::default(),
            Collaborators::new(
                accounts.clone(),
                Arc::new(ScriptedLoginUi::new(Behavior::Abandon)),
            )
            .with_loader(loader.clone()),
            connector.clone(),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap();

        for _ in 0..2 {
            manager
                .on_port_message(Envelope::port("getAccounts"))
                .unwrap()
                .unwrap()
                .await
                .unwrap();
        }

        assert_eq!(
            connector.port().messages(),
            vec![
                PortReply::Error(json!("failed to load fxa_client.js: network down")),
                PortReply::Error(json!("failed to load fxa_client.js: network down")),
            ]
        );
        assert_eq!(loader.loads(), 2);
        assert!(accounts.calls().is_empty());
    }

    /// Loader that completes only when released.
    struct GatedLoader {
        gate: Notify,
        loads: Mutex<usize>,
    }

    #[async_trait]
    impl DeferredLoader for GatedLoader {
        async fn load(&self) -> Result<(), LoadError> {
            *self.loads.lock() += 1;
            self.gate.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_requests_wait_for_loader() {
        init_tracing();
        let loader = Arc::new(GatedLoader {
            gate: Notify::new(),
            loads: Mutex::new(0),
        });
        let accounts = Arc::new(ScriptedAccountClient::new(Behavior::Succeed(json!("ready"))));
        let connector = Arc::new(RecordingConnector::new());
        let manager = FxAccountsManager::new(
            ManagerConfig::default(),
            Collaborators::new(
                accounts.clone(),
                Arc::new(ScriptedLoginUi::new(Behavior::Abandon)),
            )
            .with_loader(loader.clone()),
            connector.clone(),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap();

        let first = manager.on_port_message(Envelope::port("getAccounts")).unwrap().unwrap();
        let second = manager.on_port_message(Envelope::port("logout")).unwrap().unwrap();
        tokio::time::sleep(SETTLE).await;
        assert!(accounts.calls().is_empty());
        assert_eq!(manager.in_flight(), 2);

        loader.gate.notify_one();
        tokio::time::timeout(WAIT, async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .unwrap();

        assert_eq!(*loader.loads.lock(), 1);
        assert_eq!(accounts.calls().len(), 2);
        assert_eq!(connector.port().messages().len(), 2);
    }

    // =============================================================================
    // HAND-WRITTEN COLLABORATOR
    // =============================================================================

    /// Account client that completes calls in reverse order of arrival.
    #[derive(Default)]
    struct ReversingClient {
        pending: Mutex<Vec<(&'static str, Continuation)>>,
    }

    impl ReversingClient {
        fn flush(&self) {
            let calls: Vec<_> = self.pending.lock().drain(..).rev().collect();
            for (name, done) in calls {
                done.succeed(name);
            }
        }
    }

    impl AccountClient for ReversingClient {
        fn get_accounts(&self, done: Continuation) {
            self.pending.lock().push(("getAccounts", done));
        }

        fn logout(&self, done: Continuation) {
            self.pending.lock().push(("logout", done));
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completion() {
        init_tracing();
        let client = Arc::new(ReversingClient::default());
        let connector = Arc::new(RecordingConnector::new());
        let manager = FxAccountsManager::new(
            ManagerConfig::default(),
            Collaborators::new(
                client.clone(),
                Arc::new(ScriptedLoginUi::new(Behavior::Abandon)),
            ),
            connector.clone(),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap();

        let a = manager.on_port_message(Envelope::port("getAccounts")).unwrap().unwrap();
        let b = manager.on_port_message(Envelope::port("logout")).unwrap().unwrap();
        tokio::time::sleep(SETTLE).await;
        client.flush();
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(
            connector.port().messages(),
            vec![
                PortReply::Data(json!("logout")),
                PortReply::Data(json!("getAccounts")),
            ]
        );
    }

    fn manager_with(config: ManagerConfig, collaborators: Collaborators) -> FxAccountsManager {
        FxAccountsManager::new(
            config,
            collaborators,
            Arc::new(RecordingConnector::new()),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap()
    }
}
