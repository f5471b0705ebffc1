use crate::error::AppError;
use crate::model::RenamerSettings;
use std::fs;
use std::path::Path;

pub fn load_settings(path: &Path) -> Result<RenamerSettings, AppError> {
    if !path.exists() {
        return Ok(RenamerSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| AppError::Settings(e.to_string()))?;
    let settings: RenamerSettings =
        serde_json::from_str(&content).map_err(|e| AppError::Settings(e.to_string()))?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &RenamerSettings) -> Result<(), AppError> {
    validate_settings(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::Settings(e.to_string()))?;
    }
    let body =
        serde_json::to_string_pretty(settings).map_err(|e| AppError::Settings(e.to_string()))?;
    fs::write(path, body).map_err(|e| AppError::Settings(e.to_string()))
}

pub fn validate_settings(settings: &RenamerSettings) -> Result<(), AppError> {
    let attributes = [
        &settings.custom_creation_date_attribute,
        &settings.added_date_attribute,
    ];
    if attributes.iter().any(|name| name.trim().is_empty()) {
        return Err(AppError::Settings(
            "拡張属性名を空にすることはできません".to_string(),
        ));
    }
    if attributes.iter().any(|name| name.contains('\0')) {
        return Err(AppError::Settings(
            "拡張属性名に NUL 文字は使用できません".to_string(),
        ));
    }
    Ok(())
}
