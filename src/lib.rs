//! Date-prefix renaming of the files in one directory.
//!
//! Each file gets the date it was originally created, taken from the
//! `com.apple.assetsd.*` extended attributes when present and from the
//! filesystem creation time otherwise. Its name is then prefixed with that
//! date as `YYYYMMDD-`.

pub mod attributes;
pub mod bplist;
pub mod creation_date;
pub mod error;
pub mod file_collect;
pub mod fs_move;
pub mod logging;
pub mod model;
pub mod rename;
pub mod settings;
pub mod worker;

pub use crate::creation_date::{resolve_creation_date, FileMetadataSource, SystemMetadataSource};
pub use crate::error::{AppError, PlistError};
pub use crate::model::{
    DateSource, ExecuteStatus, FileEntry, OperationProgressEvent, PlanStatus,
    RenameExecuteDetail, RenameExecuteResponse, RenamePlan, RenamePlanItem, RenamerSettings,
    ResolvedDate,
};
pub use crate::worker::{spawn_analysis, spawn_rename, PhaseHandle};

use std::path::Path;

/// Lists `dir` and plans the rename of every file in it, reading real file metadata.
pub fn analyze_directory<FProgress>(
    dir: &Path,
    settings: &RenamerSettings,
    report_progress: FProgress,
) -> Result<RenamePlan, AppError>
where
    FProgress: FnMut(OperationProgressEvent),
{
    analyze_directory_with(dir, &SystemMetadataSource, settings, report_progress)
}

/// [`analyze_directory`] with an explicit metadata source.
pub fn analyze_directory_with<S, FProgress>(
    dir: &Path,
    source: &S,
    settings: &RenamerSettings,
    report_progress: FProgress,
) -> Result<RenamePlan, AppError>
where
    S: FileMetadataSource + ?Sized,
    FProgress: FnMut(OperationProgressEvent),
{
    crate::settings::validate_settings(settings)?;
    let file_names = file_collect::list_file_names(dir, settings.include_hidden)?;
    Ok(rename::preview(
        dir,
        &file_names,
        source,
        settings,
        report_progress,
    ))
}

/// Applies a plan produced by [`analyze_directory`] for the same `dir`.
pub fn rename_directory<FProgress>(
    dir: &Path,
    plan: &RenamePlan,
    report_progress: FProgress,
) -> Result<RenameExecuteResponse, AppError>
where
    FProgress: FnMut(OperationProgressEvent),
{
    if !dir.is_dir() {
        return Err(AppError::InvalidRequest(format!(
            "フォルダが存在しません: {}",
            dir.display()
        )));
    }
    Ok(rename::execute(dir, plan, report_progress))
}
