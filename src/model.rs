use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which fallback step produced a file's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateSource {
    CustomCreationDate,
    AddedDate,
    FileCreation,
}

impl DateSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomCreationDate => "撮影日時 (customCreationDate)",
            Self::AddedDate => "追加日時 (addedDate)",
            Self::FileCreation => "ファイル作成日時",
        }
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDate {
    pub date: DateTime<Local>,
    pub source: DateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanStatus {
    Ready,
    Unchanged,
    Unresolved,
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlanItem {
    pub original_name: String,
    pub target_name: Option<String>,
    pub resolved_date: Option<DateTime<Local>>,
    pub source: Option<DateSource>,
    pub status: PlanStatus,
    pub reason: Option<String>,
}

impl RenamePlanItem {
    /// True when executing this entry moves a file.
    pub fn needs_move(&self) -> bool {
        matches!(self.status, PlanStatus::Ready)
            && self
                .target_name
                .as_deref()
                .is_some_and(|target| target != self.original_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlan {
    pub items: Vec<RenamePlanItem>,
    pub total: usize,
    pub ready: usize,
    pub unchanged: usize,
    pub unresolved: usize,
    pub conflicts: usize,
}

impl RenamePlan {
    pub fn from_items(items: Vec<RenamePlanItem>) -> Self {
        let count = |status: PlanStatus| items.iter().filter(|item| item.status == status).count();
        Self {
            total: items.len(),
            ready: count(PlanStatus::Ready),
            unchanged: count(PlanStatus::Unchanged),
            unresolved: count(PlanStatus::Unresolved),
            conflicts: count(PlanStatus::Conflict),
            items,
        }
    }

    /// `(original, target)` pairs in input order. `None` marks an entry that
    /// will not be renamed: its date is unresolved or its target is taken.
    pub fn pairs(&self) -> Vec<(String, Option<String>)> {
        self.items
            .iter()
            .map(|item| {
                let target = match item.status {
                    PlanStatus::Unresolved | PlanStatus::Conflict => None,
                    PlanStatus::Ready | PlanStatus::Unchanged => item.target_name.clone(),
                };
                (item.original_name.clone(), target)
            })
            .collect()
    }

    pub fn entries(&self) -> Vec<FileEntry> {
        self.items.iter().map(FileEntry::from).collect()
    }
}

/// One directory entry as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub resolved_date: Option<DateTime<Local>>,
    pub planned_name: Option<String>,
}

impl From<&RenamePlanItem> for FileEntry {
    fn from(item: &RenamePlanItem) -> Self {
        Self {
            name: item.original_name.clone(),
            resolved_date: item.resolved_date,
            planned_name: if item.needs_move() {
                item.target_name.clone()
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecuteStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameExecuteDetail {
    pub original_name: String,
    pub target_name: Option<String>,
    pub status: ExecuteStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameExecuteResponse {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub details: Vec<RenameExecuteDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationProgressEvent {
    pub operation: String,
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub current_name: Option<String>,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenamerSettings {
    pub custom_creation_date_attribute: String,
    pub added_date_attribute: String,
    pub use_extended_attributes: bool,
    pub same_day_guard: bool,
    pub respect_existing_prefix: bool,
    pub include_hidden: bool,
}

impl Default for RenamerSettings {
    fn default() -> Self {
        Self {
            custom_creation_date_attribute: crate::attributes::CUSTOM_CREATION_DATE_ATTR
                .to_string(),
            added_date_attribute: crate::attributes::ADDED_DATE_ATTR.to_string(),
            use_extended_attributes: true,
            same_day_guard: true,
            respect_existing_prefix: false,
            include_hidden: false,
        }
    }
}
