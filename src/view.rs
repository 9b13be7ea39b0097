//! View models composed from reconciler state and results projections.

use chrono::{DateTime, Utc};

use crate::error::SyncError;
use crate::poll::{Poll, PollStatus, Stats};
use crate::reconciler::SyncState;
use crate::results::ResultsProjection;
use crate::service::PollStore;

/// What to show above the poll list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    None,
    Loading,
    /// Cached polls shown because the store failed.
    Stale(String),
    /// The store failed and nothing was cached.
    Error(String),
    NoData,
}

impl Banner {
    pub fn from_state(state: &SyncState) -> Self {
        match state {
            SyncState::Loading => Banner::Loading,
            SyncState::Degraded { error, .. } => Banner::Stale(error.to_string()),
            SyncState::Ready { polls, error } if polls.is_empty() => match error {
                Some(e) => Banner::Error(e.to_string()),
                None => Banner::NoData,
            },
            SyncState::Ready { .. } => Banner::None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Banner::None => None,
            Banner::Loading => Some("Loading polls...".to_string()),
            Banner::Stale(e) => Some(format!("Showing cached polls ({})", e)),
            Banner::Error(e) => Some(format!("Could not load polls: {}", e)),
            Banner::NoData => Some("No polls found".to_string()),
        }
    }
}

/// Where the detail view's vote counts came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsSource {
    Live,
    /// The results call failed; counts are the list-level ones.
    ListFallback(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollDetails {
    pub id: String,
    pub question: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: PollStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub projection: ResultsProjection,
    pub source: ResultsSource,
}

/// Combine live results with the list-level entity. Live values win; the
/// list options are only used when the results carry none.
pub fn resolve_stats(poll: &Poll, live: Stats) -> Stats {
    if live.option_stats.is_empty() && !poll.options.is_empty() {
        let list = Stats::from_poll(poll);
        return Stats {
            total_votes: live.total_votes.max(list.total_votes),
            option_stats: list.option_stats,
            ..live
        };
    }
    live
}

/// Build the drill-down view for one poll.
///
/// `known` is the list-level entity if the caller already holds it;
/// otherwise the poll is fetched. A failed results call falls back to the
/// list-level counts, except `NotFound`, which is returned as is.
pub async fn load_details(
    store: &dyn PollStore,
    id: &str,
    known: Option<&Poll>,
    palette_size: usize,
) -> Result<PollDetails, SyncError> {
    let poll = match known {
        Some(poll) => poll.clone(),
        None => store.get(id).await?,
    };

    let (stats, source) = match store.results(id).await {
        Ok(live) => (resolve_stats(&poll, live), ResultsSource::Live),
        Err(SyncError::NotFound(missing)) => return Err(SyncError::NotFound(missing)),
        Err(e) => {
            tracing::warn!("Results for poll {} unavailable, using list counts: {}", id, e);
            (Stats::from_poll(&poll), ResultsSource::ListFallback(e.to_string()))
        }
    };

    Ok(PollDetails {
        id: poll.id.clone(),
        question: stats.question.clone(),
        description: stats.description.clone(),
        category: stats.category.clone(),
        status: stats.status,
        start_date: poll.start_date,
        end_date: poll.end_date,
        projection: ResultsProjection::from_stats(&stats, palette_size),
        source,
    })
}
