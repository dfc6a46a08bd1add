//! Dashboard query: search, status buckets and record selection over the SOW list.

use serde::{Deserialize, Deserializer, Serialize};
use sow_storage::{Sow, SowStatus};
use std::time::Duration;
use uuid::Uuid;

/// How often a dashboard re-queries the SOW list.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Draft,
    Sent,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, status: SowStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Draft => status == SowStatus::Draft,
            StatusFilter::Sent => status == SowStatus::Sent,
            StatusFilter::Completed => status == SowStatus::Completed,
        }
    }
}

/// Query string of `GET /api/dashboard`. Forms submit untouched fields as
/// empty values (`?search=&status=&open=`), which read as "not set".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub status: StatusFilter,
    /// Record to open in the detail view
    #[serde(default, deserialize_with = "empty_as_none")]
    pub open: Option<Uuid>,
}

fn empty_as_default<'de, D>(deserializer: D) -> Result<StatusFilter, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(StatusFilter::default()),
        Some(s) => <StatusFilter as clap::ValueEnum>::from_str(s, true)
            .map_err(|_| serde::de::Error::unknown_variant(s, &["all", "draft", "sent", "completed"])),
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s).map(Some).map_err(serde::de::Error::custom),
    }
}

impl DashboardQuery {
    /// Case-insensitive substring match on client name, client email and
    /// project title (or the legacy `projectName`). A blank search matches everything.
    pub fn matches_search(&self, sow: &Sow) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };

        sow.client_name.to_lowercase().contains(&needle)
            || sow.client_email.to_lowercase().contains(&needle)
            || sow
                .data
                .display_title()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
    }

    pub fn matches(&self, sow: &Sow) -> bool {
        self.status.matches(sow.status) && self.matches_search(sow)
    }
}

/// Per-status totals over the unfiltered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub all: usize,
    pub draft: usize,
    pub sent: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn tally(sows: &[Sow]) -> Self {
        sows.iter().fold(Self::default(), |mut counts, sow| {
            counts.all += 1;
            match sow.status {
                SowStatus::Draft => counts.draft += 1,
                SowStatus::Sent => counts.sent += 1,
                SowStatus::Completed => counts.completed += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Matching records, newest first
    pub sows: Vec<Sow>,
    pub counts: StatusCounts,
    pub selected: Option<Sow>,
}

impl Dashboard {
    /// Apply `query` to `all`, which must already be ordered newest first.
    pub fn build(all: Vec<Sow>, query: &DashboardQuery) -> Self {
        let counts = StatusCounts::tally(&all);
        let selected = query
            .open
            .and_then(|id| all.iter().find(|sow| sow.id.0 == id).cloned());
        let sows = all.into_iter().filter(|sow| query.matches(sow)).collect();

        Self {
            sows,
            counts,
            selected,
        }
    }
}
