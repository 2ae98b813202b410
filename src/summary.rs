/// Text for the aggregate "Active Group Switch" control

use crate::bulk::{disable_candidates, protected_count, BulkKind, PopupSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkSummary {
    Preparing,
    Working,
    Restorable { paused: usize },
    Pausable { eligible: usize, protected: usize },
    NothingPausable { protected: usize },
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

impl BulkSummary {
    /// A pending batch takes precedence over pausing more
    pub fn from_session(session: &PopupSession) -> Self {
        if !session.loaded {
            return BulkSummary::Preparing;
        }
        if session.is_processing() {
            return BulkSummary::Working;
        }
        if !session.batch.is_empty() {
            return BulkSummary::Restorable { paused: session.batch.len() };
        }

        let eligible = disable_candidates(&session.extensions, &session.self_id).len();
        let protected = protected_count(&session.extensions, &session.self_id);
        if eligible > 0 {
            BulkSummary::Pausable { eligible, protected }
        } else {
            BulkSummary::NothingPausable { protected }
        }
    }

    pub fn description(&self) -> String {
        match *self {
            BulkSummary::Preparing => "Preparing batch controls...".to_string(),
            BulkSummary::Working => "Working through the batch...".to_string(),
            BulkSummary::Restorable { paused } => {
                format!("{} paused extension{} ready to restore.", paused, plural(paused))
            }
            BulkSummary::Pausable { eligible, protected } => {
                let mut text = format!("{} enabled extension{} can pause together.", eligible, plural(eligible));
                if protected > 0 {
                    let verb = if protected == 1 { "stays" } else { "stay" };
                    text.push_str(&format!(" {} protected extension{} {} on.", protected, plural(protected), verb));
                }
                text
            }
            BulkSummary::NothingPausable { protected } => {
                let mut text = "No pause-able extensions right now.".to_string();
                if protected > 0 {
                    let verb = if protected == 1 { "remains" } else { "remain" };
                    text.push_str(&format!(" {} protected extension{} {} on.", protected, plural(protected), verb));
                }
                text
            }
        }
    }

    /// The button offered next to the description, if any
    pub fn action(&self) -> Option<(BulkKind, &'static str)> {
        match self {
            BulkSummary::Restorable { .. } => Some((BulkKind::Restore, "Re-enable batch")),
            BulkSummary::Pausable { .. } => Some((BulkKind::Disable, "Pause active set")),
            _ => None,
        }
    }
}
