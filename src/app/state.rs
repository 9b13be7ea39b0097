use crate::poll::PollStatus;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViewMode {
    List,
    Details,
}

/// Poll awaiting a y/n answer before deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: String,
    pub question: String,
}

pub struct StatusMessage {
    pub message: String,
    pub is_error: bool,
    pub timestamp: std::time::Instant,
}

/// Status filter after `current` in the cycle all -> Active -> Inactive ->
/// Upcoming -> all.
pub fn next_status_filter(current: Option<PollStatus>) -> Option<PollStatus> {
    match current {
        None => Some(PollStatus::Active),
        Some(PollStatus::Active) => Some(PollStatus::Inactive),
        Some(PollStatus::Inactive) => Some(PollStatus::Upcoming),
        Some(PollStatus::Upcoming) => None,
    }
}
