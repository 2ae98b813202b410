/// Bulk toggle engine: pause every eligible extension, restore the paused batch

use crate::error::PopupError;
use crate::extension_data::{ExtensionRecord, OperationResult};
use crate::host::ManagementApi;
use crate::storage::Batch;
use futures::future::join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Disable,
    Restore,
}

impl BulkKind {
    /// Enabled state each target is switched to
    pub fn target_enabled(self) -> bool {
        matches!(self, BulkKind::Restore)
    }
}

/// Everything one popup instance knows while it is open
#[derive(Debug, Clone, PartialEq)]
pub struct PopupSession {
    pub self_id: String,
    pub extensions: Vec<ExtensionRecord>,
    pub batch: Batch,
    pub state: EngineState,
    pub loaded: bool,
}

/// Why a bulk action did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkSkip {
    Busy,
    NothingEligible(BulkKind),
}

impl BulkSkip {
    pub fn notice(&self) -> Option<String> {
        match self {
            BulkSkip::Busy => None,
            BulkSkip::NothingEligible(BulkKind::Disable) => Some("Nothing to disable".to_string()),
            BulkSkip::NothingEligible(BulkKind::Restore) => Some("Nothing to restore".to_string()),
        }
    }
}

/// Targets of a bulk action that has moved the session into `Processing`
#[derive(Debug, Clone, PartialEq)]
pub struct BulkPlan {
    kind: BulkKind,
    targets: Vec<String>,
}

impl BulkPlan {
    pub fn kind(&self) -> BulkKind {
        self.kind
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

/// Single switch accepted by `PopupSession::begin_toggle`
#[derive(Debug, Clone, PartialEq)]
pub struct TogglePlan {
    id: String,
    enable: bool,
}

impl TogglePlan {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn enable(&self) -> bool {
        self.enable
    }
}

/// An action the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Bulk(BulkKind),
    Toggle { id: String, enable: bool },
}

/// An accepted action; the session is `Processing` until it has run
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Bulk(BulkPlan),
    Toggle(TogglePlan),
}

/// Aggregated outcome of one bulk action
#[derive(Debug, Clone, PartialEq)]
pub struct BulkReport {
    pub kind: BulkKind,
    pub succeeded: Vec<String>,
    pub failed: Vec<OperationResult>,
}

impl BulkReport {
    pub fn notices(&self) -> Vec<String> {
        let mut notices = Vec::new();
        let verb = match self.kind {
            BulkKind::Disable => "disabled",
            BulkKind::Restore => "re-enabled",
        };

        if !self.succeeded.is_empty() {
            let count = self.succeeded.len();
            let done = match self.kind {
                BulkKind::Disable => "Disabled",
                BulkKind::Restore => "Re-enabled",
            };
            notices.push(format!("{} {} extension{}", done, count, if count == 1 { "" } else { "s" }));
        }
        if !self.failed.is_empty() {
            notices.push(format!("Some extensions could not be {}", verb));
        }
        notices
    }
}

/// Result of any popup action, as the UI needs to report it
#[derive(Debug)]
pub enum Outcome {
    Bulk(BulkReport),
    Skipped(BulkSkip),
    Toggled { enabled: bool },
    Failed(PopupError),
}

impl Outcome {
    pub fn notices(&self) -> Vec<String> {
        match self {
            Outcome::Bulk(report) => report.notices(),
            Outcome::Skipped(skip) => skip.notice().into_iter().collect(),
            Outcome::Toggled { enabled } => {
                vec![format!("{} extension", if *enabled { "Enabled" } else { "Disabled" })]
            }
            Outcome::Failed(e) => vec![e.notice()],
        }
    }
}

/// Outcome of a finished action plus the failures that followed it
///
/// A warning is a storage or refresh failure after the host calls settled;
/// the action itself still happened.
#[derive(Debug)]
pub struct ActionResult {
    pub outcome: Outcome,
    pub warnings: Vec<PopupError>,
}

impl ActionResult {
    pub fn notices(&self) -> Vec<String> {
        let mut notices = self.outcome.notices();
        notices.extend(self.warnings.iter().map(PopupError::notice));
        notices
    }
}

/// Enabled items this popup may pause: never itself, never a locked item
pub fn disable_candidates(records: &[ExtensionRecord], self_id: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.enabled && r.id != self_id && r.may_disable)
        .map(|r| r.id.clone())
        .collect()
}

/// Enabled items that stay on during a pause
pub fn protected_count(records: &[ExtensionRecord], self_id: &str) -> usize {
    records
        .iter()
        .filter(|r| r.enabled && (r.id == self_id || !r.may_disable))
        .count()
}

impl PopupSession {
    pub fn new(self_id: &str) -> Self {
        PopupSession {
            self_id: self_id.to_string(),
            extensions: Vec::new(),
            batch: Batch::new(),
            state: EngineState::Idle,
            loaded: false,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.state == EngineState::Processing
    }

    /// Compute the targets of a bulk action and enter `Processing`
    ///
    /// Refused while another action is in flight; an empty target set
    /// leaves the session untouched.
    pub fn begin(&mut self, kind: BulkKind) -> Result<BulkPlan, BulkSkip> {
        if self.is_processing() {
            return Err(BulkSkip::Busy);
        }

        let targets = match kind {
            BulkKind::Disable => disable_candidates(&self.extensions, &self.self_id),
            BulkKind::Restore => self.batch.ids(),
        };
        if targets.is_empty() {
            return Err(BulkSkip::NothingEligible(kind));
        }

        self.state = EngineState::Processing;
        Ok(BulkPlan { kind, targets })
    }

    /// Accept a single switch and enter `Processing`
    ///
    /// Switching off the extension hosting the popup is refused before any
    /// host call.
    pub fn begin_toggle(&mut self, id: &str, enable: bool) -> Result<TogglePlan, Outcome> {
        if self.is_processing() {
            return Err(Outcome::Skipped(BulkSkip::Busy));
        }
        if id == self.self_id && !enable {
            return Err(Outcome::Failed(PopupError::SelfProtection));
        }

        self.state = EngineState::Processing;
        Ok(TogglePlan {
            id: id.to_string(),
            enable,
        })
    }

    /// Record a switch the host accepted. Returns true when the batch shrank.
    pub fn apply_toggle(&mut self, plan: &TogglePlan) -> bool {
        if let Some(record) = self.extensions.iter_mut().find(|r| r.id == plan.id) {
            record.enabled = plan.enable;
        }
        plan.enable && self.batch.remove(&plan.id)
    }

    /// Fold settled results into the snapshot and the batch
    ///
    /// After a pause the batch is exactly the items that were paused; after
    /// a restore it is exactly the items that failed to come back. The
    /// session stays `Processing` until `finish`.
    pub fn complete(&mut self, plan: &BulkPlan, results: &[OperationResult]) -> BulkReport {
        let enabled = plan.kind.target_enabled();

        for result in results.iter().filter(|r| r.success()) {
            if let Some(record) = self.extensions.iter_mut().find(|r| r.id == result.id) {
                record.enabled = enabled;
            }
        }

        let (succeeded, failed): (Vec<&OperationResult>, Vec<&OperationResult>) =
            results.iter().partition(|r| r.success());

        self.batch = match plan.kind {
            BulkKind::Disable => succeeded.iter().map(|r| r.id.as_str()).collect(),
            BulkKind::Restore => failed.iter().map(|r| r.id.as_str()).collect(),
        };

        BulkReport {
            kind: plan.kind,
            succeeded: succeeded.into_iter().map(|r| r.id.clone()).collect(),
            failed: failed.into_iter().cloned().collect(),
        }
    }

    pub fn finish(&mut self) {
        self.state = EngineState::Idle;
    }
}

/// Send one request per id, all at once, and wait for every one to settle
pub async fn toggle_all<M: ManagementApi>(api: &M, ids: &[String], enabled: bool) -> Vec<OperationResult> {
    join_all(ids.iter().map(|id| async move {
        match api.set_enabled(id, enabled).await {
            Ok(()) => OperationResult::succeeded(id),
            Err(PopupError::HostRejection { message, .. }) => OperationResult::failed(id, message),
            Err(e) => OperationResult::failed(id, e.to_string()),
        }
    }))
    .await
}
