#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::super::MonitorCore;
    use crate::adapters::{FixedClock, InMemoryEventFeed};
    use crate::application::SessionMonitor;
    use crate::domain::foundation::{
        ErrorCode, FeedError, Progress, SessionId, SessionStatus, SubscriptionId, Timestamp,
    };
    use crate::domain::session::{EventEnvelope, SessionEvent, SessionSpec};
    use crate::ports::{EventFeed, EventSink, FeedFilter, Subscription};

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_millis(1_700_000_000_000).plus_secs(secs)
    }

    fn event(secs: i64, event: SessionEvent) -> EventEnvelope {
        EventEnvelope::new(at(secs), event)
    }

    fn session_new(secs: i64) -> EventEnvelope {
        event(
            secs,
            SessionEvent::SessionNew {
                client: "client-1".to_string(),
                spec: SessionSpec::new(json!({"name": "demo"})),
            },
        )
    }

    fn submit(secs: i64, tasks: usize) -> EventEnvelope {
        event(
            secs,
            SessionEvent::ClientSubmit {
                tasks: (0..tasks).map(|i| json!(i)).collect(),
                dataobjs: vec![json!("o")],
            },
        )
    }

    fn closed(secs: i64, reason: Option<&str>, message: &str) -> EventEnvelope {
        event(
            secs,
            SessionEvent::SessionClosed {
                reason: reason.map(str::to_string),
                message: Some(message.to_string()),
            },
        )
    }

    fn setup() -> (Arc<InMemoryEventFeed>, SessionMonitor) {
        let feed = Arc::new(InMemoryEventFeed::new());
        let monitor = SessionMonitor::new(feed.clone());
        (feed, monitor)
    }

    const SID: SessionId = SessionId::new(42);

    // ─────────────────────────────────────────────────────────────────────
    // Folding
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn single_batch_session_yields_closed_summary_and_unsubscribes() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.deliver(
            SID,
            vec![
                event(
                    0,
                    SessionEvent::SessionNew {
                        client: "c1".to_string(),
                        spec: SessionSpec::default(),
                    },
                ),
                submit(1, 3),
                event(2, SessionEvent::TaskStarted),
                event(3, SessionEvent::TaskStarted),
                event(4, SessionEvent::TaskFinished),
                closed(10, Some("Closed"), "done"),
            ],
        );

        let summary = handle.current_summary();
        let session = summary.session.clone().unwrap();
        assert_eq!(session.client, "c1");
        assert_eq!(session.created, at(0));
        assert_eq!(session.finished, Some(at(10)));
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.message, "done");
        assert_eq!(summary.submit_count, 1);
        assert_eq!(summary.tasks_count, 3);
        assert_eq!(summary.objs_count, 1);
        assert_eq!(summary.tasks_running, 0);
        assert_eq!(summary.tasks_finished, 1);
        assert_eq!(summary.error, None);
        assert!(handle.is_terminated());
        assert!(!handle.is_subscribed());
        assert_eq!(feed.unsubscribe_calls(), 1);
    }

    #[test]
    fn start_subscribes_with_session_filter() {
        let (feed, monitor) = setup();

        let handle = monitor.start(SID).unwrap();

        assert!(feed.is_subscribed(SID));
        assert!(!feed.is_subscribed(SessionId::new(43)));
        assert!(handle.is_subscribed());
        assert_eq!(handle.session_id(), SID);
        assert_eq!(handle.current_summary(), Default::default());
    }

    #[test]
    fn batches_fold_in_delivery_order() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.deliver(SID, vec![session_new(0), submit(1, 3)]);
        feed.deliver(
            SID,
            vec![
                event(2, SessionEvent::TaskStarted),
                event(3, SessionEvent::TaskStarted),
                event(4, SessionEvent::TaskFinished),
            ],
        );

        let summary = handle.current_summary();
        assert_eq!(summary.submit_count, 1);
        assert_eq!(summary.tasks_count, 3);
        assert_eq!(summary.objs_count, 1);
        assert_eq!(summary.tasks_running, 1);
        assert_eq!(summary.tasks_finished, 1);
        assert_eq!(summary.status(), Some(SessionStatus::Open));
        assert!(!handle.is_terminated());
    }

    #[test]
    fn other_sessions_do_not_leak_in() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.deliver(SessionId::new(7), vec![session_new(0), submit(1, 5)]);

        assert_eq!(handle.current_summary().tasks_count, 0);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Termination
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn close_unsubscribes_exactly_once() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.deliver(SID, vec![session_new(0), closed(5, None, "")]);

        assert!(handle.is_terminated());
        assert!(!handle.is_subscribed());
        assert!(!feed.is_subscribed(SID));
        assert_eq!(feed.unsubscribe_calls(), 1);

        handle.dispose();
        drop(handle);
        assert_eq!(feed.unsubscribe_calls(), 1);
    }

    #[test]
    fn events_after_close_in_same_batch_are_dropped() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.deliver(
            SID,
            vec![
                session_new(0),
                event(1, SessionEvent::TaskStarted),
                closed(2, Some("Error"), "worker crashed"),
                submit(3, 10),
            ],
        );

        let summary = handle.current_summary();
        assert_eq!(summary.status(), Some(SessionStatus::Error));
        assert_eq!(summary.tasks_count, 0);
        assert_eq!(summary.tasks_running, 0);
        assert_eq!(
            summary.session.as_ref().map(|s| s.message.as_str()),
            Some("worker crashed")
        );
    }

    #[test]
    fn terminal_summary_stays_frozen() {
        let core = MonitorCore::new(SID);
        core.on_batch(vec![session_new(0), closed(5, Some("ServerLost"), "")]);
        let frozen = core.lock_state().summary.clone();

        // A straggler batch the feed had already queued.
        core.on_batch(vec![submit(6, 2), event(7, SessionEvent::TaskStarted)]);

        assert_eq!(core.lock_state().summary, frozen);
        assert_eq!(frozen.status(), Some(SessionStatus::ServerLost));
    }

    #[test]
    fn close_without_open_synthesizes_session() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.deliver(SID, vec![closed(9, None, "bye")]);

        let session = handle.current_summary().session.unwrap();
        assert_eq!(session.client, "");
        assert_eq!(session.created, at(9));
        assert_eq!(session.finished, Some(at(9)));
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(feed.unsubscribe_calls(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Disposal
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn dispose_is_idempotent() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        handle.dispose();
        handle.dispose();

        assert!(!handle.is_subscribed());
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.unsubscribe_calls(), 1);

        feed.deliver(SID, vec![session_new(0)]);
        assert!(handle.current_summary().session.is_none());
    }

    #[test]
    fn callbacks_in_flight_at_dispose_do_not_change_summary() {
        let feed = Arc::new(CapturingFeed::default());
        let monitor = SessionMonitor::new(feed.clone());
        let handle = monitor.start(SID).unwrap();
        feed.push(vec![session_new(0), submit(1, 2)]);
        let before = handle.current_summary();

        handle.dispose();
        assert_eq!(feed.released(), 1);

        // The feed already committed to these callbacks before unsubscribe ran.
        feed.push(vec![event(2, SessionEvent::TaskStarted), closed(3, None, "")]);
        feed.fail(FeedError::transport("late"));

        assert_eq!(handle.current_summary(), before);
        assert!(!handle.is_terminated());
    }

    #[test]
    fn dropping_handle_unsubscribes() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        drop(handle);

        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.unsubscribe_calls(), 1);
    }

    #[test]
    fn feed_side_shutdown_reports_not_subscribed() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();

        feed.shutdown();

        assert!(!handle.is_subscribed());
        handle.dispose();
        assert_eq!(feed.unsubscribe_calls(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Errors
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn feed_errors_are_recorded_without_touching_counters() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();
        feed.deliver(SID, vec![session_new(0), submit(1, 2)]);

        feed.fail(SID, FeedError::transport("connection reset"));

        let summary = handle.current_summary();
        assert_eq!(summary.error, Some(FeedError::transport("connection reset")));
        assert_eq!(summary.tasks_count, 2);
        assert_eq!(summary.status(), Some(SessionStatus::Open));
        assert!(handle.is_subscribed());
    }

    #[test]
    fn errors_after_termination_are_still_recorded() {
        let core = MonitorCore::new(SID);
        core.on_batch(vec![session_new(0), closed(5, None, "")]);

        core.on_error(FeedError::Lagged { skipped: 2 });

        let summary = core.lock_state().summary.clone();
        assert_eq!(summary.error, Some(FeedError::Lagged { skipped: 2 }));
        assert_eq!(summary.status(), Some(SessionStatus::Closed));
    }

    #[test]
    fn subscribe_failure_maps_to_domain_error() {
        let monitor = SessionMonitor::new(Arc::new(RefusingFeed));

        let err = monitor.start(SID).err().unwrap();

        assert_eq!(err.code, ErrorCode::FeedUnavailable);
        assert_eq!(err.details.get("session_id").map(String::as_str), Some("42"));
    }

    #[test]
    fn close_during_subscribe_releases_immediately() {
        let feed = Arc::new(CapturingFeed::closing_on_subscribe());
        let monitor = SessionMonitor::new(feed.clone());

        let handle = monitor.start(SID).unwrap();

        assert!(handle.is_terminated());
        assert!(!handle.is_subscribed());
        assert_eq!(feed.released(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Snapshot
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn snapshot_uses_clock_while_open_and_finish_time_after_close() {
        let (feed, monitor) = setup();
        let handle = monitor.start(SID).unwrap();
        let clock = FixedClock::new(at(30));

        feed.deliver(
            SID,
            vec![
                session_new(0),
                submit(1, 4),
                event(2, SessionEvent::TaskStarted),
                event(3, SessionEvent::TaskFinished),
            ],
        );

        let open = handle.snapshot(&clock);
        assert_eq!(open.duration_secs, Some(30.0));
        assert_eq!(open.task_progress, Progress::of(1, 4));
        assert_eq!(open.title.as_deref(), Some("demo"));

        feed.deliver(SID, vec![closed(60, None, "")]);
        clock.advance_millis(600_000);

        let closed = handle.snapshot(&clock);
        assert_eq!(closed.duration_secs, Some(60.0));
        assert_eq!(closed.tasks_running, 0);
        assert_eq!(closed.session_id, SID);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Test feeds
    // ─────────────────────────────────────────────────────────────────────

    struct RefusingFeed;

    impl EventFeed for RefusingFeed {
        fn subscribe(
            &self,
            _filter: FeedFilter,
            _sink: Arc<dyn EventSink>,
        ) -> Result<Box<dyn Subscription>, FeedError> {
            Err(FeedError::Closed)
        }
    }

    /// Feed that keeps its sink and calls it whether or not the
    /// subscription is still live. Can also deliver a terminal batch from
    /// inside `subscribe`.
    #[derive(Default)]
    struct CapturingFeed {
        close_on_subscribe: bool,
        released: Arc<std::sync::atomic::AtomicUsize>,
        sink: std::sync::Mutex<Option<Arc<dyn EventSink>>>,
    }

    impl CapturingFeed {
        fn closing_on_subscribe() -> Self {
            Self {
                close_on_subscribe: true,
                ..Self::default()
            }
        }

        fn released(&self) -> usize {
            self.released.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn captured(&self) -> Arc<dyn EventSink> {
            self.sink.lock().unwrap().clone().unwrap()
        }

        fn push(&self, batch: Vec<EventEnvelope>) {
            self.captured().on_batch(batch);
        }

        fn fail(&self, error: FeedError) {
            self.captured().on_error(error);
        }
    }

    impl EventFeed for CapturingFeed {
        fn subscribe(
            &self,
            _filter: FeedFilter,
            sink: Arc<dyn EventSink>,
        ) -> Result<Box<dyn Subscription>, FeedError> {
            if self.close_on_subscribe {
                sink.on_batch(vec![session_new(0), closed(1, None, "")]);
            }
            *self.sink.lock().unwrap() = Some(sink);
            Ok(Box::new(CountingSubscription {
                id: SubscriptionId::new(),
                active: std::sync::atomic::AtomicBool::new(true),
                released: Arc::clone(&self.released),
            }))
        }
    }

    struct CountingSubscription {
        id: SubscriptionId,
        active: std::sync::atomic::AtomicBool,
        released: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Subscription for CountingSubscription {
        fn unsubscribe(&self) {
            use std::sync::atomic::Ordering;
            if self.active.swap(false, Ordering::SeqCst) {
                self.released.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_active(&self) -> bool {
            self.active.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn id(&self) -> SubscriptionId {
            self.id
        }
    }
}
