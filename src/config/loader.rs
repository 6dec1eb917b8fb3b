//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    Settings,
};

/// Name of the project-level configuration file.
pub const CONFIG_FILE_NAME: &str = ".next-i18n-autopilot.json";

/// プロジェクトから設定を読み込む
///
/// `.next-i18n-autopilot.json` ファイルを探して読み込む。
/// コメント付き JSON も受け付ける。
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub fn load_from_project(project_root: &Path) -> Result<Option<Settings>, ConfigError> {
    let config_path = project_root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let value = jsonc_parser::parse_to_serde_value(&content, &jsonc_parser::ParseOptions::default())
        .map_err(|e| ConfigError::ParseError(e.to_string()))?
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    let settings: Settings =
        serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(Some(settings))
}
