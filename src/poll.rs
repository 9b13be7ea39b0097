use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a poll as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PollStatus {
    Active,
    Inactive,
    Upcoming,
}

impl std::fmt::Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollStatus::Active => write!(f, "Active"),
            PollStatus::Inactive => write!(f, "Inactive"),
            PollStatus::Upcoming => write!(f, "Upcoming"),
        }
    }
}

impl std::str::FromStr for PollStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(PollStatus::Active),
            "inactive" | "closed" => Ok(PollStatus::Inactive),
            "upcoming" | "scheduled" => Ok(PollStatus::Upcoming),
            _ => Err(anyhow::anyhow!("Unknown poll status: {}", s)),
        }
    }
}

impl TryFrom<String> for PollStatus {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One selectable choice within a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub label: String,
    pub votes: u64,
}

/// A poll as held by the remote store and mirrored in the local cache.
///
/// `total_votes` is whatever the store reported; it is not kept in sync
/// with the option counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: PollStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub total_votes: u64,
}

impl Poll {
    /// Sum of the per-option vote counts.
    pub fn option_vote_sum(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

/// Per-option entry of a results response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionStat {
    pub label: String,
    pub votes: u64,
}

impl From<&PollOption> for OptionStat {
    fn from(option: &PollOption) -> Self {
        Self {
            label: option.label.clone(),
            votes: option.votes,
        }
    }
}

/// Derived per-poll results snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: PollStatus,
    pub total_votes: u64,
    #[serde(default)]
    pub option_stats: Vec<OptionStat>,
}

impl Stats {
    /// Build stats from the list-level entity alone.
    ///
    /// The reported total is raised to the option sum when it falls short,
    /// so no option can exceed 100%.
    pub fn from_poll(poll: &Poll) -> Self {
        Self {
            question: poll.question.clone(),
            description: poll.description.clone(),
            category: poll.category.clone(),
            status: poll.status,
            total_votes: poll.total_votes.max(poll.option_vote_sum()),
            option_stats: poll.options.iter().map(OptionStat::from).collect(),
        }
    }
}

/// Filters forwarded to `PollStore::list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PollFilters {
    pub status: Option<PollStatus>,
    pub category: Option<String>,
}

impl PollFilters {
    pub fn with_status(status: PollStatus) -> Self {
        Self {
            status: Some(status),
            category: None,
        }
    }

    pub fn matches(&self, poll: &Poll) -> bool {
        let status_ok = self.status.map(|s| s == poll.status).unwrap_or(true);
        let category_ok = match (&self.category, &poll.category) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        };
        status_ok && category_ok
    }

    /// Query parameters for the REST surface; unset filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(ref category) = self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }

    /// Short label for status bars and headers.
    pub fn describe(&self) -> String {
        match (&self.status, &self.category) {
            (None, None) => "all".to_string(),
            (Some(s), None) => s.to_string(),
            (None, Some(c)) => c.clone(),
            (Some(s), Some(c)) => format!("{} / {}", s, c),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_poll(id: &str, votes: &[u64]) -> Poll {
    Poll {
        id: id.to_string(),
        question: format!("Question {}", id),
        description: None,
        category: Some("general".to_string()),
        status: PollStatus::Active,
        start_date: None,
        end_date: None,
        options: votes
            .iter()
            .enumerate()
            .map(|(i, v)| PollOption {
                label: format!("Option {}", (b'A' + i as u8) as char),
                votes: *v,
            })
            .collect(),
        total_votes: votes.iter().sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_deserializes_camel_case() {
        let json = r#"{
            "id": "p1",
            "question": "Best editor?",
            "category": "tools",
            "status": "Upcoming",
            "startDate": "2026-01-05T10:00:00Z",
            "options": [{"label": "helix", "votes": 3}, {"label": "vim", "votes": 2}],
            "totalVotes": 5
        }"#;

        let poll: Poll = serde_json::from_str(json).unwrap();

        assert_eq!(poll.id, "p1");
        assert_eq!(poll.status, PollStatus::Upcoming);
        assert!(poll.start_date.is_some());
        assert!(poll.end_date.is_none());
        assert!(poll.description.is_none());
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.total_votes, 5);
    }

    #[test]
    fn test_negative_votes_rejected() {
        let json = r#"{"id":"x","question":"q","status":"Active","options":[{"label":"a","votes":-1}],"totalVotes":0}"#;
        assert!(serde_json::from_str::<Poll>(json).is_err());
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let poll = sample_poll("1", &[1]);
        let json = serde_json::to_string(&poll).unwrap();
        assert!(json.contains("\"totalVotes\":1"));
        assert!(!json.contains("description"));
        assert!(!json.contains("startDate"));
    }

    #[test]
    fn test_stats_from_poll_raises_short_total() {
        let mut poll = sample_poll("1", &[4, 6]);
        poll.total_votes = 3;
        let stats = Stats::from_poll(&poll);
        assert_eq!(stats.total_votes, 10);
        assert_eq!(stats.option_stats.len(), 2);
    }

    #[test]
    fn test_stats_deserializes_results_shape() {
        let json = r#"{"question":"q","status":"Inactive","totalVotes":7,
            "optionStats":[{"label":"yes","votes":7},{"label":"no","votes":0}]}"#;
        let stats: Stats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.status, PollStatus::Inactive);
        assert_eq!(stats.option_stats[0].votes, 7);
    }

    #[test]
    fn test_filters_match_and_query() {
        let poll = sample_poll("1", &[1]);
        assert!(PollFilters::default().matches(&poll));
        assert!(PollFilters::with_status(PollStatus::Active).matches(&poll));
        assert!(!PollFilters::with_status(PollStatus::Inactive).matches(&poll));

        let filters = PollFilters {
            status: None,
            category: Some("General".to_string()),
        };
        assert!(filters.matches(&poll));
        assert_eq!(filters.query_pairs(), vec![("category", "General".to_string())]);
        assert!(PollFilters::default().query_pairs().is_empty());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("ACTIVE".parse::<PollStatus>().unwrap(), PollStatus::Active);
        assert_eq!("closed".parse::<PollStatus>().unwrap(), PollStatus::Inactive);
        assert!("bogus".parse::<PollStatus>().is_err());
    }

    #[test]
    fn test_status_deserializes_any_case() {
        let json = r#"{"id":"x","question":"q","status":"active","options":[],"totalVotes":0}"#;
        let poll: Poll = serde_json::from_str(json).unwrap();
        assert_eq!(poll.status, PollStatus::Active);

        let status: PollStatus = serde_json::from_str("\"SCHEDULED\"").unwrap();
        assert_eq!(status, PollStatus::Upcoming);
        assert!(serde_json::from_str::<PollStatus>("\"bogus\"").is_err());

        // Serialization keeps the canonical spelling
        assert_eq!(serde_json::to_string(&PollStatus::Inactive).unwrap(), "\"Inactive\"");
    }
}
