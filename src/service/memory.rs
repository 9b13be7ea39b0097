//! In-memory poll store.
//!
//! Backs demo mode when no remote is configured, and doubles as a
//! controllable store: the outage switch makes every call fail the way an
//! unreachable remote would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::PollStore;
use crate::error::SyncError;
use crate::poll::{OptionStat, Poll, PollFilters, PollOption, PollStatus, Stats};

#[derive(Default)]
pub struct MemoryPollStore {
    polls: Mutex<Vec<Poll>>,
    /// Fixed list responses keyed by filter, used instead of filtering `polls`.
    canned: Mutex<HashMap<PollFilters, Vec<Poll>>>,
    offline: AtomicBool,
    results_offline: AtomicBool,
}

impl MemoryPollStore {
    pub fn new(polls: Vec<Poll>) -> Self {
        Self {
            polls: Mutex::new(polls),
            ..Default::default()
        }
    }

    /// A store seeded with a handful of demo polls.
    pub fn demo() -> Self {
        Self::new(demo_polls())
    }

    /// Simulate a full outage: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Fail only the dedicated results call.
    pub fn set_results_offline(&self, offline: bool) {
        self.results_offline.store(offline, Ordering::SeqCst);
    }

    /// Answer `list(filters)` with `polls` regardless of the stored set.
    pub fn respond_with(&self, filters: PollFilters, polls: Vec<Poll>) -> Result<(), SyncError> {
        let mut canned = self.canned.lock().map_err(poisoned)?;
        canned.insert(filters, polls);
        Ok(())
    }

    fn ensure_online(&self) -> Result<(), SyncError> {
        if self.is_offline() {
            Err(SyncError::RemoteUnavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> SyncError {
    SyncError::RemoteUnavailable(format!("lock poisoned: {e}"))
}

#[async_trait]
impl PollStore for MemoryPollStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn list(&self, filters: &PollFilters) -> Result<Vec<Poll>, SyncError> {
        self.ensure_online()?;
        if let Some(polls) = self.canned.lock().map_err(poisoned)?.get(filters) {
            return Ok(polls.clone());
        }
        let polls = self.polls.lock().map_err(poisoned)?;
        Ok(polls.iter().filter(|p| filters.matches(p)).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Poll, SyncError> {
        self.ensure_online()?;
        let polls = self.polls.lock().map_err(poisoned)?;
        polls
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    async fn results(&self, id: &str) -> Result<Stats, SyncError> {
        self.ensure_online()?;
        if self.results_offline.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteUnavailable("results endpoint offline".to_string()));
        }
        let poll = self.get(id).await?;
        Ok(Stats {
            question: poll.question.clone(),
            description: poll.description.clone(),
            category: poll.category.clone(),
            status: poll.status,
            total_votes: poll.option_vote_sum(),
            option_stats: poll.options.iter().map(OptionStat::from).collect(),
        })
    }

    async fn remove(&self, id: &str) -> Result<(), SyncError> {
        let failed = |reason: &str| SyncError::DeleteFailed {
            id: id.to_string(),
            reason: reason.to_string(),
        };
        if self.is_offline() {
            return Err(failed("store is offline"));
        }
        let mut polls = self.polls.lock().map_err(|_| failed("lock poisoned"))?;
        let before = polls.len();
        polls.retain(|p| p.id != id);
        if polls.len() == before {
            return Err(failed("no such poll"));
        }
        Ok(())
    }
}

fn demo_poll(id: &str, question: &str, category: &str, status: PollStatus, options: &[(&str, u64)]) -> Poll {
    let now = Utc::now();
    let (start_date, end_date) = match status {
        PollStatus::Active => (Some(now - Duration::days(2)), Some(now + Duration::days(5))),
        PollStatus::Inactive => (Some(now - Duration::days(30)), Some(now - Duration::days(10))),
        PollStatus::Upcoming => (Some(now + Duration::days(3)), Some(now + Duration::days(10))),
    };
    let options: Vec<PollOption> = options
        .iter()
        .map(|(label, votes)| PollOption {
            label: label.to_string(),
            votes: *votes,
        })
        .collect();
    Poll {
        id: id.to_string(),
        question: question.to_string(),
        description: None,
        category: Some(category.to_string()),
        status,
        start_date,
        end_date,
        total_votes: options.iter().map(|o| o.votes).sum(),
        options,
    }
}

fn demo_polls() -> Vec<Poll> {
    vec![
        demo_poll(
            "1",
            "Where should the new polling station open?",
            "infrastructure",
            PollStatus::Active,
            &[("Library", 412), ("Community hall", 298), ("Primary school", 175)],
        ),
        demo_poll(
            "2",
            "Extend early voting to two weeks?",
            "policy",
            PollStatus::Active,
            &[("Yes", 1320), ("No", 655), ("Undecided", 91)],
        ),
        demo_poll(
            "3",
            "Preferred ballot paper format",
            "operations",
            PollStatus::Inactive,
            &[("Single sheet", 88), ("Booklet", 57)],
        ),
        demo_poll(
            "4",
            "Volunteer shift length",
            "operations",
            PollStatus::Upcoming,
            &[("4 hours", 0), ("6 hours", 0), ("8 hours", 0)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::sample_poll;

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = MemoryPollStore::demo();
        let active = store
            .list(&PollFilters::with_status(PollStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|p| p.status == PollStatus::Active));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryPollStore::demo();
        assert_eq!(
            store.get("nope").await.unwrap_err(),
            SyncError::NotFound("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_results_recompute_total() {
        let mut poll = sample_poll("9", &[2, 3]);
        poll.total_votes = 1;
        let store = MemoryPollStore::new(vec![poll]);
        let stats = store.results("9").await.unwrap();
        assert_eq!(stats.total_votes, 5);
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let store = MemoryPollStore::demo();
        store.set_offline(true);
        assert!(matches!(
            store.list(&PollFilters::default()).await,
            Err(SyncError::RemoteUnavailable(_))
        ));
        assert!(matches!(
            store.remove("1").await,
            Err(SyncError::DeleteFailed { .. })
        ));
        store.set_offline(false);
        assert!(store.remove("1").await.is_ok());
        assert!(store.remove("1").await.is_err());
    }

    #[tokio::test]
    async fn test_canned_response_overrides_filtering() {
        let store = MemoryPollStore::demo();
        let filters = PollFilters::with_status(PollStatus::Upcoming);
        store.respond_with(filters.clone(), Vec::new()).unwrap();
        assert!(store.list(&filters).await.unwrap().is_empty());
        assert_eq!(store.list(&PollFilters::default()).await.unwrap().len(), 4);
    }
}
