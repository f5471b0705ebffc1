//! Background execution of the analysis and rename phases.
//!
//! Each phase runs on its own thread and is the only writer of its progress
//! channel; the caller observes progress through the returned handle and
//! collects the phase result with [`PhaseHandle::join`]. A rename phase can
//! only be started from a finished analysis result, so the two never overlap.

use crate::creation_date::FileMetadataSource;
use crate::error::AppError;
use crate::model::{OperationProgressEvent, RenameExecuteResponse, RenamePlan, RenamerSettings};
use crate::rename;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

pub struct PhaseHandle<T> {
    progress: mpsc::Receiver<OperationProgressEvent>,
    latest: Option<OperationProgressEvent>,
    worker: JoinHandle<T>,
}

impl<T> PhaseHandle<T> {
    /// The "analysis/rename in progress" flag.
    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Drains progress events emitted since the last call.
    pub fn try_progress(&mut self) -> Vec<OperationProgressEvent> {
        let events: Vec<OperationProgressEvent> = self.progress.try_iter().collect();
        if let Some(last) = events.last() {
            self.latest = Some(last.clone());
        }
        events
    }

    /// Most recent event seen by [`try_progress`](Self::try_progress).
    pub fn latest_progress(&self) -> Option<&OperationProgressEvent> {
        self.latest.as_ref()
    }

    /// Blocks until the phase finishes and returns its result.
    pub fn join(self) -> Result<T, AppError> {
        self.worker
            .join()
            .map_err(|_| AppError::Worker("ワーカースレッドが異常終了しました".to_string()))
    }
}

fn spawn_phase<T, F>(name: &str, work: F) -> Result<PhaseHandle<T>, AppError>
where
    T: Send + 'static,
    F: FnOnce(mpsc::Sender<OperationProgressEvent>) -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let worker = thread::Builder::new()
        .name(format!("renamer-{}", name))
        .spawn(move || work(tx))
        .map_err(|e| AppError::Worker(format!("ワーカースレッドの起動に失敗: {}", e)))?;
    Ok(PhaseHandle {
        progress: rx,
        latest: None,
        worker,
    })
}

/// Resolves dates for `file_names` in `dir` and builds the rename plan.
pub fn spawn_analysis<S>(
    dir: PathBuf,
    file_names: Vec<String>,
    source: S,
    settings: RenamerSettings,
) -> Result<PhaseHandle<RenamePlan>, AppError>
where
    S: FileMetadataSource + Send + 'static,
{
    spawn_phase("analyze", move |tx| {
        rename::preview(&dir, &file_names, &source, &settings, |event| {
            let _ = tx.send(event);
        })
    })
}

/// Applies a finished plan in `dir`.
pub fn spawn_rename(
    dir: PathBuf,
    plan: RenamePlan,
) -> Result<PhaseHandle<RenameExecuteResponse>, AppError> {
    spawn_phase("rename", move |tx| {
        rename::execute(&dir, &plan, |event| {
            let _ = tx.send(event);
        })
    })
}
