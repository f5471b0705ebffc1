use crate::error::AppError;
use std::path::Path;
use walkdir::WalkDir;

/// Lists the regular files directly inside `dir`, sorted by name.
///
/// Sub-directories are not descended into. Dot-files are left out unless
/// `include_hidden` is set; names that are not valid UTF-8 are skipped.
pub fn list_file_names(dir: &Path, include_hidden: bool) -> Result<Vec<String>, AppError> {
    if !dir.is_dir() {
        return Err(AppError::InvalidRequest(format!(
            "フォルダが存在しません: {}",
            dir.display()
        )));
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| AppError::Io(format!("フォルダの走査に失敗しました: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            log::warn!("UTF-8 ではないファイル名をスキップしました: {:?}", entry.file_name());
            continue;
        };
        if !include_hidden && name.starts_with('.') {
            continue;
        }
        names.push(name.to_string());
    }
    names.sort();
    Ok(names)
}
