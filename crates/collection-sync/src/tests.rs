//! Session Integration Tests
//!
//! Whole-subsystem scenarios against the in-memory backend, driven on a
//! single-threaded `LocalPool` so interleavings are deterministic.

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::LocalPool;
    use serde_json::{json, Value};

    use crate::api::ApiError;
    use crate::config::SyncConfig;
    use crate::controller::{Direction, InputMode, ReorderTarget};
    use crate::domain::{FaqEntry, FaqPatch, ItemId, ItemKey, ItemRecord, ParentKind, ParentRef, Resource, UserId};
    use crate::error::{ErrorKind, SyncError};
    use crate::permission::{ParentEntity, Viewer};
    use crate::pointer::SlotBounds;
    use crate::reporter::CollectingReporter;
    use crate::retry::ImmediateDelay;
    use crate::scheduler::SyncScheduler;
    use crate::session::{CollectionSession, SessionDeps, SyncStatus};
    use crate::testing::{FakeApi, Method};

    struct Harness {
        pool: LocalPool,
        api: Rc<FakeApi>,
        scheduler: Rc<SyncScheduler>,
        reporter: Rc<CollectingReporter>,
        session: Rc<CollectionSession<FaqEntry>>,
    }

    impl Harness {
        fn keys(&self) -> Vec<ItemKey> {
            self.session.items().iter().map(|item| item.key).collect()
        }

        fn questions(&self) -> Vec<String> {
            self.session.items().iter().map(|item| item.payload.question.clone()).collect()
        }

        fn run(&mut self) {
            self.pool.run_until_stalled();
        }

        fn rounds(&self) -> u64 {
            self.scheduler.rounds(self.session.id())
        }
    }

    fn faq_json(i: usize, question: &str) -> Value {
        json!({ "id": format!("f{}", i), "order": i, "question": question, "answer": "answer", "event": "e1" })
    }

    fn harness_as(questions: &[&str], viewer: Viewer) -> Harness {
        let mut pool = LocalPool::new();
        let api = Rc::new(FakeApi::with_items(
            questions.iter().enumerate().map(|(i, q)| faq_json(i, q)).collect(),
        ));
        let scheduler = Rc::new(SyncScheduler::new());
        let reporter = Rc::new(CollectingReporter::new());
        let deps = SessionDeps {
            api: api.clone(),
            scheduler: scheduler.clone(),
            reporter: reporter.clone(),
            spawner: Rc::new(pool.spawner()),
            delay: Rc::new(ImmediateDelay),
        };
        let entity = ParentEntity::new(ParentRef::new(ParentKind::Event, "e1"), Some(UserId::from("owner")));
        let session = CollectionSession::new(entity, viewer, &SyncConfig::default(), deps);
        pool.run_until(session.load()).expect("load");
        Harness { pool, api, scheduler, reporter, session }
    }

    fn harness(questions: &[&str]) -> Harness {
        harness_as(questions, Viewer::member("owner"))
    }

    fn down() -> ReorderTarget {
        ReorderTarget::Direction(Direction::Down)
    }

    #[test]
    fn test_load_sorts_by_server_order() {
        let mut pool = LocalPool::new();
        let api = Rc::new(FakeApi::with_items(vec![faq_json(2, "C"), faq_json(0, "A"), faq_json(1, "B")]));
        let deps = SessionDeps {
            api: api.clone(),
            scheduler: Rc::new(SyncScheduler::new()),
            reporter: Rc::new(CollectingReporter::new()),
            spawner: Rc::new(pool.spawner()),
            delay: Rc::new(ImmediateDelay),
        };
        let entity = ParentEntity::new(ParentRef::new(ParentKind::Event, "e1"), None);
        let session: Rc<CollectionSession<FaqEntry>> =
            CollectionSession::new(entity, Viewer::anonymous(), &SyncConfig::default(), deps);
        pool.run_until(session.load()).unwrap();

        let questions: Vec<String> = session.items().iter().map(|item| item.payload.question.clone()).collect();
        assert_eq!(questions, vec!["A", "B", "C"]);
        assert_eq!(session.sync_state().status, SyncStatus::Idle);
        assert!(!session.sync_state().dirty);
    }

    #[test]
    fn test_drag_first_item_to_end_persists() {
        let mut h = harness(&["Q1", "Q2", "Q3"]);
        let key = h.keys()[0];

        h.session.reorder(key, ReorderTarget::Index(2), InputMode::Pointer).unwrap();
        // Visible before anything was sent
        assert_eq!(h.questions(), vec!["Q2", "Q3", "Q1"]);
        assert_eq!(h.api.writes(), 0);

        h.run();
        assert_eq!(h.api.server_questions(), vec!["Q2", "Q3", "Q1"]);
        assert_eq!(h.api.count(Method::Update), 3);
        let orders: Vec<u32> = h.session.items().iter().map(|item| item.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        let state = h.session.sync_state();
        assert_eq!(state.status, SyncStatus::Idle);
        assert!(!state.dirty && !state.in_flight);
    }

    #[test]
    fn test_rapid_keyboard_presses_coalesce() {
        let mut h = harness(&["Q1", "Q2", "Q3", "Q4"]);
        let key = h.keys()[0];
        h.api.gate();

        h.session.reorder(key, down(), InputMode::Keyboard).unwrap();
        h.run();
        assert_eq!(h.api.held(), 2);

        // Second press while the first round is still out
        h.session.reorder(key, down(), InputMode::Keyboard).unwrap();
        h.run();
        assert_eq!(h.questions(), vec!["Q2", "Q3", "Q1", "Q4"]);
        assert_eq!(h.api.writes(), 2);
        assert!(h.session.sync_state().in_flight);

        h.api.open();
        h.run();
        assert_eq!(h.rounds(), 2);
        assert_eq!(h.api.server_questions(), vec!["Q2", "Q3", "Q1", "Q4"]);
        assert_eq!(h.session.items()[2].key, key);
        assert!(!h.session.sync_state().dirty);
    }

    #[test]
    fn test_many_intents_in_flight_give_one_trailing_round() {
        let mut h = harness(&["A", "B", "C"]);
        let key = h.keys()[1];
        h.api.gate();

        h.session.edit(key, FaqPatch { answer: Some("v0".into()), ..Default::default() }).unwrap();
        h.run();
        for n in 1..=5 {
            h.session
                .edit(key, FaqPatch { answer: Some(format!("v{}", n)), ..Default::default() })
                .unwrap();
        }
        h.run();
        assert_eq!(h.api.writes(), 1);
        assert_eq!(h.rounds(), 1);

        h.api.open();
        h.run();
        assert_eq!(h.rounds(), 2);
        assert_eq!(h.api.writes(), 2);
        assert_eq!(h.api.server_items()[1]["answer"], "v5");
    }

    #[test]
    fn test_read_only_viewer_cannot_reorder() {
        let mut h = harness_as(&["A", "B", "C"], Viewer::anonymous());
        let key = h.keys()[0];
        let affordances = h.session.affordances();
        assert_eq!(affordances.tab_index, -1);
        assert!(!affordances.drag_handle && !affordances.edit_button && !affordances.delete_button);

        let result = h.session.reorder(key, down(), InputMode::Keyboard);
        assert!(matches!(result, Err(SyncError::Permission { .. })));
        h.run();

        assert_eq!(h.questions(), vec!["A", "B", "C"]);
        assert_eq!(h.api.writes(), 0);
        assert_eq!(h.rounds(), 0);
        let reports = h.reporter.take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_read_only_viewer_cannot_edit_add_or_remove() {
        let mut h = harness_as(&["A"], Viewer::member("someone-else"));
        let key = h.keys()[0];
        assert!(h.session.edit(key, FaqPatch { answer: Some("x".into()), ..Default::default() }).is_err());
        assert!(h.session.remove(key).is_err());
        assert!(h.session.add(FaqEntry::new("B", "b"), None).is_err());
        assert!(h.session.begin_drag(key, Vec::new()).is_err());
        h.run();
        assert_eq!(h.api.writes(), 0);
        assert_eq!(h.reporter.len(), 4);
    }

    #[test]
    fn test_failed_reorder_rolls_back_only_the_failed_item() {
        let mut h = harness(&["Q1", "Q2", "Q3"]);
        let key = h.keys()[0];
        h.api.fail_next(Method::Update, Some("f0"), ApiError::Status { status: 409, message: "stale".into() });

        h.session.reorder(key, ReorderTarget::Index(2), InputMode::Pointer).unwrap();
        h.run();

        assert_eq!(h.questions(), vec!["Q1", "Q2", "Q3"]);
        // Reorders are never retried
        assert_eq!(h.api.count(Method::Update), 3);
        let reports = h.reporter.take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ErrorKind::Conflict);
        assert_eq!(reports[0].item_id.as_deref(), Some("f0"));
        let state = h.session.sync_state();
        assert_eq!(state.status, SyncStatus::Error);
        assert!(state.dirty);
        // No automatic follow-up
        assert_eq!(h.rounds(), 1);
    }

    #[test]
    fn test_rollback_keeps_newer_intent() {
        let mut h = harness(&["A", "B", "C"]);
        let key = h.keys()[1];
        h.api.gate();

        h.session.edit(key, FaqPatch { answer: Some("v1".into()), ..Default::default() }).unwrap();
        h.run();
        h.session.edit(key, FaqPatch { answer: Some("v2".into()), ..Default::default() }).unwrap();
        h.api.fail_next(Method::Update, Some("f1"), ApiError::Status { status: 409, message: "stale".into() });

        h.api.open();
        h.run();

        assert_eq!(h.session.items()[1].payload.answer, "v2");
        assert_eq!(h.reporter.len(), 1);
        assert_eq!(h.api.server_items()[1]["answer"], "v2");
        assert_eq!(h.session.sync_state().status, SyncStatus::Idle);
    }

    #[test]
    fn test_content_edit_is_retried_transparently() {
        let mut h = harness(&["A", "B"]);
        let key = h.keys()[0];
        h.api.fail_next(Method::Update, Some("f0"), ApiError::Transport("connection reset".into()));

        h.session.edit(key, FaqPatch { question: Some("A2".into()), ..Default::default() }).unwrap();
        h.run();

        assert_eq!(h.api.count(Method::Update), 2);
        assert!(h.reporter.is_empty());
        assert_eq!(h.api.server_questions(), vec!["A2", "B"]);
    }

    #[test]
    fn test_content_edit_gives_up_after_two_retries() {
        let mut h = harness(&["A"]);
        let key = h.keys()[0];
        for _ in 0..3 {
            h.api.fail_next(Method::Update, Some("f0"), ApiError::Status { status: 503, message: "busy".into() });
        }

        h.session.edit(key, FaqPatch { answer: Some("new".into()), ..Default::default() }).unwrap();
        h.run();

        assert_eq!(h.api.count(Method::Update), 3);
        assert_eq!(h.session.items()[0].payload.answer, "answer");
        let reports = h.reporter.take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ErrorKind::Server);
    }

    #[test]
    fn test_add_creates_once_and_attaches_id() {
        let mut h = harness(&["A", "B", "C"]);
        let key = h.session.add(FaqEntry::new("D", "d"), None).unwrap();
        assert_eq!(h.questions(), vec!["A", "B", "C", "D"]);
        h.run();

        assert_eq!(h.api.count(Method::Create), 1);
        assert_eq!(h.api.count(Method::Delete), 0);
        assert_eq!(h.api.count(Method::Update), 0);
        let added = h.session.items().into_iter().find(|item| item.key == key).unwrap();
        assert_eq!(added.id, Some(ItemId::new("srv-1")));
        assert_eq!(h.api.server_questions(), vec!["A", "B", "C", "D"]);

        // Nothing left to do
        h.session.sync_now();
        h.run();
        assert_eq!(h.api.writes(), 1);
    }

    #[test]
    fn test_remove_is_a_single_delete() {
        let mut h = harness(&["A", "B", "C"]);
        let key = h.keys()[1];
        h.session.remove(key).unwrap();
        h.run();

        assert_eq!(h.api.count(Method::Delete), 1);
        assert_eq!(h.api.count(Method::Create), 0);
        assert_eq!(h.api.server_questions(), vec!["A", "C"]);
    }

    #[test]
    fn test_failed_create_discards_the_item() {
        let mut h = harness(&["A"]);
        h.api.fail_next(Method::Create, None, ApiError::Status { status: 422, message: "question too long".into() });
        h.session.add(FaqEntry::new("B", "b"), Some(0)).unwrap();
        h.run();

        assert_eq!(h.questions(), vec!["A"]);
        let reports = h.reporter.take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ErrorKind::Validation);
    }

    #[test]
    fn test_invalid_add_never_reaches_network() {
        let mut h = harness(&["A"]);
        let result = h.session.add(FaqEntry::new("", "answer"), None);
        assert!(matches!(result, Err(SyncError::Validation(_))));
        h.run();
        assert_eq!(h.api.writes(), 0);
        assert_eq!(h.questions(), vec!["A"]);
        assert_eq!(h.reporter.len(), 1);
    }

    #[test]
    fn test_failed_delete_restores_item() {
        let mut h = harness(&["A", "B", "C"]);
        let key = h.keys()[1];
        h.api.fail_next(Method::Delete, Some("f1"), ApiError::Transport("offline".into()));
        h.session.remove(key).unwrap();
        assert_eq!(h.questions(), vec!["A", "C"]);
        h.run();

        assert_eq!(h.questions(), vec!["A", "B", "C"]);
        assert_eq!(h.api.count(Method::Delete), 1);
        assert_eq!(h.reporter.take()[0].kind, ErrorKind::Network);
    }

    #[test]
    fn test_reload_discards_stale_round() {
        let mut h = harness(&["A", "B", "C"]);
        let key = h.keys()[0];
        h.api.gate();
        h.session.reorder(key, ReorderTarget::Index(2), InputMode::Pointer).unwrap();
        h.run();

        h.session.load_records(vec![
            ItemRecord::new(ItemId::new("x"), 0, FaqEntry::new("X", "x")),
            ItemRecord::new(ItemId::new("y"), 1, FaqEntry::new("Y", "y")),
        ]);
        h.api.open();
        h.run();

        assert_eq!(h.questions(), vec!["X", "Y"]);
        let synced: Vec<String> = h.session.last_synced().iter().map(|item| item.payload.question.clone()).collect();
        assert_eq!(synced, vec!["X", "Y"]);
        assert_eq!(h.session.sync_state().status, SyncStatus::Idle);
        assert!(h.reporter.is_empty());
    }

    #[test]
    fn test_pointer_drag_persists_once_on_drop() {
        let mut h = harness(&["Q1", "Q2", "Q3"]);
        let key = h.keys()[0];
        let slots = (0..3).map(|i| SlotBounds::new(i as f64 * 40.0, 40.0)).collect();

        h.session.begin_drag(key, slots).unwrap();
        h.session.drag_to(70.0).unwrap();
        h.session.drag_to(110.0).unwrap();
        assert_eq!(h.questions(), vec!["Q2", "Q3", "Q1"]);
        h.run();
        assert_eq!(h.api.writes(), 0);

        let outcome = h.session.end_drag().unwrap();
        assert!(outcome.moved());
        h.run();
        assert_eq!(h.rounds(), 1);
        assert_eq!(h.api.server_questions(), vec!["Q2", "Q3", "Q1"]);
    }

    #[test]
    fn test_orders_stay_dense_after_a_burst_of_moves() {
        let mut h = harness(&["A", "B", "C", "D", "E"]);
        let keys = h.keys();
        h.session.reorder(keys[4], ReorderTarget::Index(0), InputMode::Pointer).unwrap();
        h.session.reorder(keys[0], down(), InputMode::Keyboard).unwrap();
        h.session.reorder(keys[2], ReorderTarget::Index(4), InputMode::Pointer).unwrap();
        h.session.reorder(keys[3], ReorderTarget::Direction(Direction::Up), InputMode::Keyboard).unwrap();
        h.run();

        let local = h.questions();
        assert_eq!(h.api.server_questions(), local);
        let mut server_orders: Vec<u64> = h.api.server_items().iter().map(|item| item["order"].as_u64().unwrap()).collect();
        server_orders.sort();
        assert_eq!(server_orders, vec![0, 1, 2, 3, 4]);
        assert!(!h.session.sync_state().dirty);
    }

    #[test]
    fn test_state_observer_sees_lifecycle() {
        let mut h = harness(&["A", "B"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        h.session.subscribe_state(move |state| sink.borrow_mut().push(state.status));

        h.session.reorder(h.keys()[0], down(), InputMode::Keyboard).unwrap();
        h.run();

        let mut statuses = seen.borrow().clone();
        statuses.dedup();
        assert_eq!(statuses, vec![SyncStatus::Dirty, SyncStatus::Syncing, SyncStatus::Idle]);
    }

    #[test]
    fn test_last_observed_state_matches_session_after_drain() {
        let mut h = harness(&["A", "B", "C"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        h.session.subscribe_state(move |state| sink.borrow_mut().push(state));
        h.api.gate();

        let key = h.keys()[0];
        h.session.reorder(key, down(), InputMode::Keyboard).unwrap();
        h.run();
        h.session.reorder(key, down(), InputMode::Keyboard).unwrap();
        h.run();
        assert!(seen.borrow().last().is_some_and(|state| state.in_flight));

        h.api.open();
        h.run();
        let last = *seen.borrow().last().unwrap();
        assert!(!last.in_flight);
        assert_eq!(last.status, SyncStatus::Idle);
        assert_eq!(last, h.session.sync_state());
    }

    #[test]
    fn test_collections_sync_independently_on_one_scheduler() {
        let mut h = harness(&["Q1", "Q2"]);
        let resources_api = Rc::new(FakeApi::with_items(vec![
            json!({ "id": "r0", "order": 0, "name": "Docs", "url": "https://docs.example.org", "event": "e1" }),
            json!({ "id": "r1", "order": 1, "name": "Site", "url": "https://example.org", "event": "e1" }),
        ]));
        let deps = SessionDeps {
            api: resources_api.clone(),
            scheduler: h.scheduler.clone(),
            reporter: h.reporter.clone(),
            spawner: Rc::new(h.pool.spawner()),
            delay: Rc::new(ImmediateDelay),
        };
        let entity = ParentEntity::new(ParentRef::new(ParentKind::Event, "e1"), Some(UserId::from("owner")));
        let resources: Rc<CollectionSession<Resource>> =
            CollectionSession::new(entity, Viewer::member("owner"), &SyncConfig::default(), deps);
        h.pool.run_until(resources.load()).unwrap();
        assert_ne!(resources.id(), h.session.id());

        h.api.gate();
        resources_api.gate();
        h.session.reorder(h.keys()[0], down(), InputMode::Keyboard).unwrap();
        let resource_key = resources.items()[0].key;
        resources.reorder(resource_key, down(), InputMode::Keyboard).unwrap();
        h.run();

        // Both rounds are out at the same time
        assert_eq!(h.api.held(), 2);
        assert_eq!(resources_api.held(), 2);
        assert!(h.scheduler.in_flight(h.session.id()));
        assert!(h.scheduler.in_flight(resources.id()));

        h.api.open();
        resources_api.open();
        h.run();
        assert!(!h.session.sync_state().dirty && !h.session.sync_state().in_flight);
        assert!(!resources.sync_state().dirty && !resources.sync_state().in_flight);
        assert_eq!(h.scheduler.rounds(h.session.id()), 1);
        assert_eq!(h.scheduler.rounds(resources.id()), 1);
        let names: Vec<String> = resources.items().iter().map(|item| item.payload.name.clone()).collect();
        assert_eq!(names, vec!["Site", "Docs"]);
        assert!(h.reporter.is_empty());
    }

    #[test]
    fn test_reload_replaces_unsynced_local_changes() {
        let h = harness(&["A", "B"]);
        h.session.reorder(h.keys()[0], down(), InputMode::Keyboard).unwrap();
        assert!(h.session.sync_state().dirty);

        h.session.load_records(vec![
            ItemRecord::new(Some(ItemId::new("f0")), 0, FaqEntry::new("A", "answer")),
            ItemRecord::new(Some(ItemId::new("f1")), 1, FaqEntry::new("B", "answer")),
        ]);
        assert_eq!(h.questions(), vec!["A", "B"]);
        let state = h.session.sync_state();
        assert!(!state.dirty);
        assert_eq!(state.status, SyncStatus::Idle);
    }

    #[test]
    fn test_create_result_for_removed_item_is_deleted_again() {
        let mut h = harness(&["A"]);
        h.api.gate();
        let key = h.session.add(FaqEntry::new("B", "b"), None).unwrap();
        h.run();
        assert_eq!(h.api.held(), 1);

        h.session.remove(key).unwrap();
        h.api.open();
        h.run();

        assert_eq!(h.questions(), vec!["A"]);
        assert_eq!(h.api.server_questions(), vec!["A"]);
        assert_eq!(h.api.count(Method::Delete), 1);
        assert!(!h.session.sync_state().dirty);
        assert!(h.reporter.is_empty());
    }

    #[test]
    fn test_change_observer_receives_move() {
        let h = harness(&["A", "B", "C"]);
        let moves = Rc::new(RefCell::new(Vec::new()));
        let sink = moves.clone();
        h.session.subscribe(move |event| {
            if let Some(moved) = event.moved() {
                sink.borrow_mut().push(moved);
            }
        });

        h.session.reorder(h.keys()[2], ReorderTarget::Index(0), InputMode::Pointer).unwrap();
        assert_eq!(*moves.borrow(), vec![(2, 0)]);
    }

    #[test]
    fn test_fetch_failure_is_reported() {
        let mut h = harness(&["A"]);
        h.api.fail_next(Method::Fetch, None, ApiError::Transport("offline".into()));
        let result = h.pool.run_until(h.session.load());
        assert!(matches!(result, Err(SyncError::Network(_))));
        assert_eq!(h.reporter.len(), 1);
        assert_eq!(h.questions(), vec!["A"]);
    }
}
