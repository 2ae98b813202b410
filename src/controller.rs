/// Popup controller: owns the host handles and drives a `PopupSession`

use crate::bulk::{toggle_all, ActionResult, BulkPlan, Outcome, Plan, PopupSession, Request, TogglePlan};
use crate::directory::list_extensions;
use crate::error::PopupError;
use crate::host::{KeyValueStore, ManagementApi};
use crate::reconcile::reconcile_and_store;
use crate::storage::BatchStore;

pub struct PopupController<M, S> {
    api: M,
    store: BatchStore<S>,
    self_id: String,
}

impl<M: ManagementApi, S: KeyValueStore> PopupController<M, S> {
    pub fn new(api: M, store: S, self_id: &str) -> Self {
        PopupController {
            api,
            store: BatchStore::new(store),
            self_id: self_id.to_string(),
        }
    }

    /// Build the session for a freshly opened popup
    ///
    /// Failing to read the batch or the directory is fatal. Failing to write
    /// the reconciled batch back is returned as a warning.
    pub async fn open(&self) -> Result<(PopupSession, Vec<PopupError>), PopupError> {
        let mut session = PopupSession::new(&self.self_id);
        session.batch = self.store.load().await?;
        session.extensions = list_extensions(&self.api).await?;
        session.loaded = true;

        let mut warnings = Vec::new();
        if let Err(e) = reconcile_and_store(&self.store, &mut session.batch, &session.extensions).await {
            log::error!("Failed to save reconciled batch: {}", e);
            warnings.push(e);
        }
        Ok((session, warnings))
    }

    /// Re-read the directory and reconcile the batch against it
    async fn reload(&self, session: &mut PopupSession) -> Result<(), PopupError> {
        session.extensions = list_extensions(&self.api).await?;
        session.loaded = true;
        reconcile_and_store(&self.store, &mut session.batch, &session.extensions).await
    }

    /// Accept a request and mark the session `Processing`
    ///
    /// Everything is refused while the session is `Processing`, so the
    /// caller may write back the session returned by `run` wholesale.
    pub fn start(&self, session: &mut PopupSession, request: Request) -> Result<Plan, Outcome> {
        match request {
            Request::Bulk(kind) => session.begin(kind).map(Plan::Bulk).map_err(Outcome::Skipped),
            Request::Toggle { id, enable } => session.begin_toggle(&id, enable).map(Plan::Toggle),
        }
    }

    /// Carry out a plan from `start`
    ///
    /// Always hands the session back `Idle`, whatever the host reported.
    pub async fn run(&self, session: PopupSession, plan: Plan) -> (PopupSession, ActionResult) {
        match plan {
            Plan::Bulk(plan) => self.run_bulk(session, plan).await,
            Plan::Toggle(plan) => self.run_toggle(session, plan).await,
        }
    }

    async fn run_bulk(&self, mut session: PopupSession, plan: BulkPlan) -> (PopupSession, ActionResult) {
        let results = toggle_all(&self.api, plan.targets(), plan.kind().target_enabled()).await;
        let report = session.complete(&plan, &results);

        if report.failed.is_empty() {
            log::info!("{:?} finished for {} extensions", plan.kind(), report.succeeded.len());
        } else {
            log::warn!("{:?} failed for some extensions: {:?}", plan.kind(), report.failed);
        }

        let mut warnings = Vec::new();
        if let Err(e) = self.store.save(&session.batch).await {
            log::error!("Failed to save batch: {}", e);
            warnings.push(e);
        }
        if let Err(e) = self.reload(&mut session).await {
            log::error!("Failed to refresh extensions: {}", e);
            warnings.push(e);
        }

        session.finish();
        (session, ActionResult { outcome: Outcome::Bulk(report), warnings })
    }

    async fn run_toggle(&self, mut session: PopupSession, plan: TogglePlan) -> (PopupSession, ActionResult) {
        let mut warnings = Vec::new();

        let outcome = match self.api.set_enabled(plan.id(), plan.enable()).await {
            Ok(()) => {
                if session.apply_toggle(&plan) {
                    if let Err(e) = self.store.save(&session.batch).await {
                        log::error!("Failed to save batch: {}", e);
                        warnings.push(e);
                    }
                }
                Outcome::Toggled { enabled: plan.enable() }
            }
            Err(e) => {
                log::error!("Error toggling extension {}: {}", plan.id(), e);
                if let Err(reload_err) = self.reload(&mut session).await {
                    log::error!("Failed to refresh extensions: {}", reload_err);
                    warnings.push(reload_err);
                }
                Outcome::Failed(e)
            }
        };

        session.finish();
        (session, ActionResult { outcome, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::{BulkKind, BulkSkip, EngineState};
    use crate::extension_data::ExtensionRecord;
    use crate::host::fake::{FakeManagement, FakeStore};
    use crate::storage::{Batch, BATCH_STORAGE_KEY};
    use futures::executor::block_on;
    use serde_json::json;

    type TestController<'a> = PopupController<&'a FakeManagement, &'a FakeStore>;

    fn scenario_host() -> FakeManagement {
        FakeManagement::new(vec![
            ExtensionRecord::new("self", "Extension Switch", true, false),
            ExtensionRecord::new("A", "Alpha", true, true),
            ExtensionRecord::new("B", "Beta", true, true),
        ])
    }

    fn batch(ids: &[&str]) -> Batch {
        ids.iter().copied().collect()
    }

    fn open(controller: &TestController) -> PopupSession {
        let (session, warnings) = block_on(controller.open()).unwrap();
        assert!(warnings.is_empty());
        session
    }

    /// Start and run a request the way the popup does
    fn act(controller: &TestController, mut session: PopupSession, request: Request) -> (PopupSession, ActionResult) {
        match controller.start(&mut session, request) {
            Ok(plan) => block_on(controller.run(session, plan)),
            Err(outcome) => (session, ActionResult { outcome, warnings: Vec::new() }),
        }
    }

    fn pause(controller: &TestController, session: PopupSession) -> (PopupSession, ActionResult) {
        act(controller, session, Request::Bulk(BulkKind::Disable))
    }

    fn restore(controller: &TestController, session: PopupSession) -> (PopupSession, ActionResult) {
        act(controller, session, Request::Bulk(BulkKind::Restore))
    }

    fn toggle(controller: &TestController, session: PopupSession, id: &str, enable: bool) -> (PopupSession, ActionResult) {
        act(controller, session, Request::Toggle { id: id.to_string(), enable })
    }

    fn enabled_in(session: &PopupSession, id: &str) -> bool {
        session.extensions.iter().find(|r| r.id == id).unwrap().enabled
    }

    #[test]
    fn test_open_loads_directory_and_batch() {
        let api = scenario_host();
        api.set_externally("B", false);
        let store = FakeStore::default();
        store.values.borrow_mut().insert(BATCH_STORAGE_KEY.to_string(), json!(["B"]));
        let controller = PopupController::new(&api, &store, "self");

        let session = open(&controller);

        assert!(session.loaded);
        assert_eq!(session.state, EngineState::Idle);
        assert_eq!(session.extensions.len(), 3);
        assert_eq!(session.batch, batch(&["B"]));
    }

    #[test]
    fn test_open_reconciles_externally_enabled() {
        let api = scenario_host();
        api.set_externally("B", false);
        let store = FakeStore::default();
        store.values.borrow_mut().insert(BATCH_STORAGE_KEY.to_string(), json!(["A", "B"]));
        let controller = PopupController::new(&api, &store, "self");

        let session = open(&controller);

        assert_eq!(session.batch, batch(&["B"]));
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["B"])));
    }

    #[test]
    fn test_open_fails_when_host_listing_fails() {
        let api = scenario_host();
        *api.list_fails.borrow_mut() = true;
        let store = FakeStore::default();
        store.values.borrow_mut().insert(BATCH_STORAGE_KEY.to_string(), json!(["A"]));
        let controller = PopupController::new(&api, &store, "self");

        assert!(block_on(controller.open()).is_err());
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["A"])));
    }

    #[test]
    fn test_open_fails_when_batch_cannot_be_read() {
        let api = scenario_host();
        let store = FakeStore::default();
        *store.fail_reads.borrow_mut() = true;
        let controller = PopupController::new(&api, &store, "self");

        let result = block_on(controller.open());

        assert!(matches!(result, Err(PopupError::Storage(_))));
    }

    #[test]
    fn test_open_reports_failed_write_through() {
        let api = scenario_host();
        api.set_externally("B", false);
        let store = FakeStore::default();
        store.values.borrow_mut().insert(BATCH_STORAGE_KEY.to_string(), json!(["A", "B"]));
        *store.fail_writes.borrow_mut() = true;
        let controller = PopupController::new(&api, &store, "self");

        let (session, warnings) = block_on(controller.open()).unwrap();

        assert_eq!(session.batch, batch(&["B"]));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].notice(), "Error: Storage failed: quota exceeded");
    }

    #[test]
    fn test_bulk_disable_pauses_everything_but_self() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, result) = pause(&controller, session);

        assert_eq!(session.batch, batch(&["A", "B"]));
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["A", "B"])));
        assert_eq!(api.is_enabled("self"), Some(true));
        assert_eq!(api.is_enabled("A"), Some(false));
        assert_eq!(session.state, EngineState::Idle);
        assert_eq!(result.notices(), vec!["Disabled 2 extensions".to_string()]);
    }

    #[test]
    fn test_bulk_disable_replaces_previous_batch() {
        let api = scenario_host();
        api.set_externally("B", false);
        let store = FakeStore::default();
        store.values.borrow_mut().insert(BATCH_STORAGE_KEY.to_string(), json!(["B"]));
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, _) = pause(&controller, session);

        assert_eq!(session.batch, batch(&["A"]));
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["A"])));
    }

    #[test]
    fn test_bulk_disable_partial_failure_leaves_failures_out() {
        let api = scenario_host();
        api.reject("B");
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, result) = pause(&controller, session);

        assert_eq!(session.batch, batch(&["A"]));
        assert_eq!(api.is_enabled("B"), Some(true));
        assert_eq!(
            result.notices(),
            vec![
                "Disabled 1 extension".to_string(),
                "Some extensions could not be disabled".to_string()
            ]
        );
    }

    #[test]
    fn test_bulk_disable_with_all_failures_stores_nothing() {
        let api = scenario_host();
        api.reject("A");
        api.reject("B");
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, _) = pause(&controller, session);

        assert!(session.batch.is_empty());
        assert!(!store.contains(BATCH_STORAGE_KEY));
        assert_eq!(session.state, EngineState::Idle);
    }

    #[test]
    fn test_failed_batch_save_is_reported() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        *store.fail_writes.borrow_mut() = true;

        let (session, result) = pause(&controller, session);

        assert_eq!(session.state, EngineState::Idle);
        assert_eq!(session.batch, batch(&["A", "B"]));
        assert!(!store.contains(BATCH_STORAGE_KEY));
        assert_eq!(
            result.notices(),
            vec![
                "Disabled 2 extensions".to_string(),
                "Error: Storage failed: quota exceeded".to_string()
            ]
        );
    }

    #[test]
    fn test_bulk_restore_partial_failure_keeps_failed() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        let (session, _) = pause(&controller, session);
        api.reject("B");

        let (session, result) = restore(&controller, session);

        assert_eq!(session.batch, batch(&["B"]));
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["B"])));
        assert_eq!(api.is_enabled("A"), Some(true));
        assert_eq!(session.state, EngineState::Idle);
        assert!(result.notices().contains(&"Some extensions could not be re-enabled".to_string()));
    }

    #[test]
    fn test_bulk_restore_success_removes_key() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        let (session, _) = pause(&controller, session);

        let (session, result) = restore(&controller, session);

        assert!(session.batch.is_empty());
        assert!(!store.contains(BATCH_STORAGE_KEY));
        assert_eq!(result.notices(), vec!["Re-enabled 2 extensions".to_string()]);
    }

    #[test]
    fn test_restore_only_touches_reconciled_batch() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        let (_, _) = pause(&controller, session);
        api.set_externally("A", true);
        api.calls.borrow_mut().clear();

        let session = open(&controller);
        let (_, _) = restore(&controller, session);

        assert_eq!(*api.calls.borrow(), vec![("B".to_string(), true)]);
    }

    #[test]
    fn test_bulk_while_processing_is_ignored() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let mut session = open(&controller);
        session.state = EngineState::Processing;
        let before = session.clone();

        let (session, result) = pause(&controller, session);

        assert_eq!(session, before);
        assert!(matches!(result.outcome, Outcome::Skipped(BulkSkip::Busy)));
        assert!(result.notices().is_empty());
        assert_eq!(api.call_count(), 0);
        assert_eq!(*store.writes.borrow(), 0);
    }

    #[test]
    fn test_bulk_refused_while_toggle_in_flight() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let mut live = open(&controller);

        let plan = controller
            .start(&mut live, Request::Toggle { id: "B".to_string(), enable: false })
            .unwrap();
        let in_flight = live.clone();

        let refused = controller.start(&mut live, Request::Bulk(BulkKind::Disable));
        assert!(matches!(refused, Err(Outcome::Skipped(BulkSkip::Busy))));
        assert_eq!(live.state, EngineState::Processing);

        let (next, _) = block_on(controller.run(in_flight, plan));
        live = next;
        assert_eq!(live.state, EngineState::Idle);
        assert!(live.batch.is_empty());

        match controller.start(&mut live, Request::Bulk(BulkKind::Disable)) {
            Ok(Plan::Bulk(plan)) => assert_eq!(plan.targets(), &["A".to_string()]),
            other => panic!("expected a pause plan, got {:?}", other),
        }
    }

    #[test]
    fn test_toggle_refused_while_bulk_in_flight() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let mut live = open(&controller);

        let plan = controller.start(&mut live, Request::Bulk(BulkKind::Disable)).unwrap();
        let in_flight = live.clone();

        let refused = controller.start(&mut live, Request::Toggle { id: "A".to_string(), enable: false });
        assert!(matches!(refused, Err(Outcome::Skipped(BulkSkip::Busy))));

        let (next, _) = block_on(controller.run(in_flight, plan));
        assert_eq!(next.state, EngineState::Idle);
        assert_eq!(next.batch, batch(&["A", "B"]));
        assert_eq!(api.call_count(), 2);
    }

    #[test]
    fn test_bulk_restore_with_empty_batch_is_noop() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, result) = restore(&controller, session);

        assert_eq!(result.notices(), vec!["Nothing to restore".to_string()]);
        assert_eq!(session.state, EngineState::Idle);
        assert_eq!(api.call_count(), 0);
    }

    #[test]
    fn test_failed_refresh_is_reported_and_returns_idle() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        *api.list_fails.borrow_mut() = true;

        let (session, result) = pause(&controller, session);

        assert_eq!(session.state, EngineState::Idle);
        assert_eq!(session.batch, batch(&["A", "B"]));
        assert!(!enabled_in(&session, "A"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result
            .notices()
            .contains(&"Error: Host call failed: management unavailable".to_string()));
    }

    #[test]
    fn test_toggle_self_off_is_rejected_before_host() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, result) = toggle(&controller, session, "self", false);

        assert!(matches!(result.outcome, Outcome::Failed(PopupError::SelfProtection)));
        assert_eq!(api.call_count(), 0);
        assert!(enabled_in(&session, "self"));
        assert_eq!(session.state, EngineState::Idle);
    }

    #[test]
    fn test_toggle_enable_removes_from_batch() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        let (session, _) = pause(&controller, session);

        let (session, result) = toggle(&controller, session, "A", true);

        assert_eq!(result.notices(), vec!["Enabled extension".to_string()]);
        assert_eq!(session.batch, batch(&["B"]));
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["B"])));
        assert!(enabled_in(&session, "A"));
        assert_eq!(session.state, EngineState::Idle);
    }

    #[test]
    fn test_toggle_failed_batch_save_is_reported() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        let (session, _) = pause(&controller, session);
        *store.fail_writes.borrow_mut() = true;

        let (session, result) = toggle(&controller, session, "A", true);

        assert_eq!(session.batch, batch(&["B"]));
        assert_eq!(store.raw(BATCH_STORAGE_KEY), Some(json!(["A", "B"])));
        assert_eq!(
            result.notices(),
            vec![
                "Enabled extension".to_string(),
                "Error: Storage failed: quota exceeded".to_string()
            ]
        );
    }

    #[test]
    fn test_toggle_disable_does_not_join_batch() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);

        let (session, result) = toggle(&controller, session, "A", false);

        assert_eq!(result.notices(), vec!["Disabled extension".to_string()]);
        assert!(session.batch.is_empty());
        assert_eq!(api.is_enabled("A"), Some(false));
    }

    #[test]
    fn test_toggle_failure_reloads_directory() {
        let api = scenario_host();
        let store = FakeStore::default();
        let controller = PopupController::new(&api, &store, "self");
        let session = open(&controller);
        api.set_externally("B", false);
        api.reject("A");

        let (session, result) = toggle(&controller, session, "A", false);

        assert!(matches!(result.outcome, Outcome::Failed(PopupError::HostRejection { .. })));
        assert_eq!(result.notices(), vec!["Error: Failed to change A".to_string()]);
        assert!(!enabled_in(&session, "B"));
        assert_eq!(session.state, EngineState::Idle);
    }
}
