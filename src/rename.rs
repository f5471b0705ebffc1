use crate::creation_date::{resolve_creation_date, FileMetadataSource};
use crate::fs_move::move_without_replace;
use crate::model::{
    ExecuteStatus, OperationProgressEvent, PlanStatus, RenameExecuteDetail,
    RenameExecuteResponse, RenamePlan, RenamePlanItem, RenamerSettings, ResolvedDate,
};
use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// `chrono` format of the date prefix.
pub const DATE_PREFIX_FORMAT: &str = "%Y%m%d";

static DATE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8})-").expect("failed to compile date prefix regex"));

pub fn format_date_prefix(date: &DateTime<Local>) -> String {
    date.format(DATE_PREFIX_FORMAT).to_string()
}

/// Name `file_name` should carry once dated with `date`.
pub fn dated_file_name(file_name: &str, date: &DateTime<Local>) -> String {
    let prefix = format_date_prefix(date);
    if file_name.starts_with(&prefix) {
        file_name.to_string()
    } else {
        format!("{}-{}", prefix, file_name)
    }
}

/// True when `file_name` starts with a valid `YYYYMMDD-` date, whatever the date.
pub fn has_date_prefix(file_name: &str) -> bool {
    DATE_PREFIX_RE
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .is_some_and(|digits| NaiveDate::parse_from_str(digits.as_str(), DATE_PREFIX_FORMAT).is_ok())
}

/// Resolves every file in `dir` and plans its rename.
///
/// Names are sorted before use; one progress event is emitted per file.
pub fn preview<S, FProgress>(
    dir: &Path,
    file_names: &[String],
    source: &S,
    settings: &RenamerSettings,
    mut report_progress: FProgress,
) -> RenamePlan
where
    S: FileMetadataSource + ?Sized,
    FProgress: FnMut(OperationProgressEvent),
{
    let mut names = file_names.to_vec();
    names.sort();
    names.dedup();

    let total = names.len();
    let mut resolved: HashMap<String, Option<ResolvedDate>> = HashMap::with_capacity(total);
    let mut found = 0usize;
    for (index, name) in names.iter().enumerate() {
        let date = resolve_creation_date(source, &dir.join(name), settings);
        if date.is_some() {
            found += 1;
        }
        resolved.insert(name.clone(), date);
        report_progress(OperationProgressEvent {
            operation: "analyze".to_string(),
            processed: index + 1,
            total,
            succeeded: found,
            failed: 0,
            skipped: index + 1 - found,
            current_name: Some(name.clone()),
            done: false,
        });
    }

    let plan = build_plan(&names, |name| resolved.get(name).cloned().flatten(), settings);
    info!(
        "{}: {} 件中 {} 件リネーム予定 (変更なし {}, 日付不明 {}, 競合 {})",
        dir.display(),
        plan.total,
        plan.ready,
        plan.unchanged,
        plan.unresolved,
        plan.conflicts
    );

    report_progress(OperationProgressEvent {
        operation: "analyze".to_string(),
        processed: total,
        total,
        succeeded: found,
        failed: 0,
        skipped: total - found,
        current_name: None,
        done: true,
    });
    plan
}

/// Plans target names for `file_names`, kept in the given order.
///
/// The result depends only on the names and the dates `date_of` returns.
pub fn build_plan<FDate>(
    file_names: &[String],
    date_of: FDate,
    settings: &RenamerSettings,
) -> RenamePlan
where
    FDate: Fn(&str) -> Option<ResolvedDate>,
{
    let mut items: Vec<RenamePlanItem> = file_names
        .iter()
        .map(|name| plan_one(name, date_of(name), settings))
        .collect();
    mark_conflicts(file_names, &mut items);
    RenamePlan::from_items(items)
}

fn plan_one(name: &str, resolved: Option<ResolvedDate>, settings: &RenamerSettings) -> RenamePlanItem {
    let Some(resolved) = resolved else {
        return RenamePlanItem {
            original_name: name.to_string(),
            target_name: None,
            resolved_date: None,
            source: None,
            status: PlanStatus::Unresolved,
            reason: Some("日付を取得できません".to_string()),
        };
    };

    let keep_existing = settings.respect_existing_prefix && has_date_prefix(name);
    let target = if keep_existing {
        name.to_string()
    } else {
        dated_file_name(name, &resolved.date)
    };
    let (status, reason) = if target == name {
        (PlanStatus::Unchanged, "日付プレフィックス付与済み".to_string())
    } else {
        (PlanStatus::Ready, resolved.source.label().to_string())
    };

    RenamePlanItem {
        original_name: name.to_string(),
        target_name: Some(target),
        resolved_date: Some(resolved.date),
        source: Some(resolved.source),
        status,
        reason: Some(reason),
    }
}

/// Replays the batch in order over the set of occupied names; a rename into
/// a name still occupied at that point becomes a conflict and is not executed.
fn mark_conflicts(file_names: &[String], items: &mut [RenamePlanItem]) {
    let mut occupied: HashSet<String> = file_names.iter().cloned().collect();
    for item in items.iter_mut() {
        if item.status != PlanStatus::Ready {
            continue;
        }
        let Some(target) = item.target_name.clone() else {
            continue;
        };
        if occupied.contains(&target) {
            item.status = PlanStatus::Conflict;
            item.reason = Some(format!("リネーム先 `{}` は別のファイルが使用しています", target));
            continue;
        }
        occupied.remove(&item.original_name);
        occupied.insert(target);
    }
}

/// Applies `plan` inside `dir`, one entry at a time in plan order.
///
/// A failed move is recorded on its entry and the batch continues. Skipped
/// entries still advance the processed count.
pub fn execute<FProgress>(
    dir: &Path,
    plan: &RenamePlan,
    mut report_progress: FProgress,
) -> RenameExecuteResponse
where
    FProgress: FnMut(OperationProgressEvent),
{
    let total = plan.items.len();
    let mut details = Vec::with_capacity(total);
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    let mut processed = 0usize;

    for item in &plan.items {
        let detail = execute_one_rename(dir, item);
        processed += 1;
        match detail.status {
            ExecuteStatus::Succeeded => succeeded += 1,
            ExecuteStatus::Failed => failed += 1,
            ExecuteStatus::Skipped => skipped += 1,
        }
        let current_name = Some(detail.original_name.clone());
        details.push(detail);
        report_progress(OperationProgressEvent {
            operation: "rename".to_string(),
            processed,
            total,
            succeeded,
            failed,
            skipped,
            current_name,
            done: false,
        });
    }

    info!(
        "{}: リネーム完了 (成功 {}, 失敗 {}, スキップ {})",
        dir.display(),
        succeeded,
        failed,
        skipped
    );
    report_progress(OperationProgressEvent {
        operation: "rename".to_string(),
        processed,
        total,
        succeeded,
        failed,
        skipped,
        current_name: None,
        done: true,
    });

    RenameExecuteResponse {
        processed,
        succeeded,
        failed,
        skipped,
        details,
    }
}

fn execute_one_rename(dir: &Path, item: &RenamePlanItem) -> RenameExecuteDetail {
    let skipped = |reason: Option<String>| RenameExecuteDetail {
        original_name: item.original_name.clone(),
        target_name: item.target_name.clone(),
        status: ExecuteStatus::Skipped,
        reason,
    };

    if !item.needs_move() {
        return match item.status {
            PlanStatus::Ready | PlanStatus::Unchanged => skipped(Some("変更なし".to_string())),
            PlanStatus::Unresolved | PlanStatus::Conflict => skipped(item.reason.clone()),
        };
    }
    let Some(target) = item.target_name.as_deref() else {
        return skipped(Some("出力先が未定です".to_string()));
    };

    match move_without_replace(&dir.join(&item.original_name), &dir.join(target)) {
        Ok(()) => RenameExecuteDetail {
            original_name: item.original_name.clone(),
            target_name: Some(target.to_string()),
            status: ExecuteStatus::Succeeded,
            reason: None,
        },
        Err(error) => {
            warn!("{} -> {}: {}", item.original_name, target, error);
            RenameExecuteDetail {
                original_name: item.original_name.clone(),
                target_name: Some(target.to_string()),
                status: ExecuteStatus::Failed,
                reason: Some(error),
            }
        }
    }
}
