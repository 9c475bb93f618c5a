// Replay Keeper - Filter and search
// Computes the visible subset of a catalog. Pure: re-evaluated in full on every call.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::schema::{Replay, parse_tags};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// Record has at least one selected tag
    #[default]
    Any,
    /// Record has every selected tag
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordedFilter {
    #[default]
    All,
    Recorded,
    NotRecorded,
}

impl RecordedFilter {
    fn accepts(&self, recorded: bool) -> bool {
        match self {
            RecordedFilter::All => true,
            RecordedFilter::Recorded => recorded,
            RecordedFilter::NotRecorded => !recorded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFilter {
    pub search: String,
    pub tags: Vec<String>,
    pub tag_mode: TagMode,
    pub recorded: RecordedFilter,
}

impl ReplayFilter {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.tags.iter().all(|t| t.trim().is_empty())
            && self.recorded == RecordedFilter::All
    }

    /// True if the record passes search, tag and recorded predicates.
    pub fn matches(&self, replay: &Replay) -> bool {
        self.matches_search(replay) && self.matches_tags(replay) && self.recorded.accepts(replay.recorded)
    }

    fn matches_search(&self, replay: &Replay) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&replay.file_name, &replay.extended_desc, &replay.tags]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_tags(&self, replay: &Replay) -> bool {
        let wanted: Vec<String> = self.tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if wanted.is_empty() {
            return true;
        }

        let have: HashSet<String> = parse_tags(&replay.tags)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        match self.tag_mode {
            TagMode::Any => wanted.iter().any(|t| have.contains(t)),
            TagMode::All => wanted.iter().all(|t| have.contains(t)),
        }
    }
}

// ----- Sorting -----

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    /// Catalog insertion order
    #[default]
    Insertion,
    FileName,
    Timestamp,
    Ufc,
    Recorded,
    VideoLink,
    Description,
    DateAdded,
    Tags,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "insertion" | "id" => Ok(SortColumn::Insertion),
            "file_name" | "filename" | "name" => Ok(SortColumn::FileName),
            "timestamp" => Ok(SortColumn::Timestamp),
            "ufc" => Ok(SortColumn::Ufc),
            "recorded" => Ok(SortColumn::Recorded),
            "video_link" | "link" => Ok(SortColumn::VideoLink),
            "description" => Ok(SortColumn::Description),
            "date_added" | "added" => Ok(SortColumn::DateAdded),
            "tags" => Ok(SortColumn::Tags),
            other => Err(format!("unknown sort column '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(column: SortColumn, order: SortOrder) -> Self {
        Self { column, order }
    }

    fn compare(&self, a: &Replay, b: &Replay) -> Ordering {
        let ordering = match self.column {
            SortColumn::Insertion => a.id.cmp(&b.id),
            SortColumn::FileName => cmp_text(&a.file_name, &b.file_name),
            SortColumn::Timestamp => cmp_text(&a.timestamp, &b.timestamp),
            SortColumn::Ufc => cmp_text(&a.ufc, &b.ufc),
            SortColumn::Recorded => a.recorded.cmp(&b.recorded),
            SortColumn::VideoLink => cmp_text(&a.video_link, &b.video_link),
            SortColumn::Description => cmp_text(&a.extended_desc, &b.extended_desc),
            SortColumn::DateAdded => cmp_text(&a.date_added, &b.date_added),
            SortColumn::Tags => cmp_text(&a.tags, &b.tags),
        };
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Filtered and sorted view of `records`. Equal sort keys keep input order.
pub fn visible_replays(records: &[Replay], filter: &ReplayFilter, sort: &SortSpec) -> Vec<Replay> {
    let mut visible: Vec<Replay> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    // sort_by is stable
    visible.sort_by(|a, b| sort.compare(a, b));
    visible
}
