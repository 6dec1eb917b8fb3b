//! 設定の解決を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    Settings,
    loader,
};

/// コマンドラインから与えられる上書き値
///
/// `None` のフィールドは設定ファイル（またはデフォルト値）のまま。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub reference_locale: Option<String>,
    pub additional_locales: Option<Vec<String>>,
    pub locales_folder: Option<PathBuf>,
    pub model: Option<String>,
    pub concurrency: Option<usize>,
    /// `true` の場合のみ上書きする（設定ファイルの `dryRun` を打ち消さない）
    pub dry_run: bool,
}

impl SettingsOverrides {
    /// 上書き値を設定に適用する
    #[must_use]
    pub fn apply(self, mut settings: Settings) -> Settings {
        if let Some(reference_locale) = self.reference_locale {
            settings.reference_locale = reference_locale;
        }
        if let Some(additional_locales) = self.additional_locales {
            settings.additional_locales = additional_locales;
        }
        if let Some(locales_folder) = self.locales_folder {
            settings.locales_folder = locales_folder;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        settings.dry_run |= self.dry_run;
        settings
    }
}

/// 設定を解決する
///
/// 設定ファイル → コマンドライン上書き の順に適用し、最後にバリデーションする。
///
/// # Arguments
/// * `project_root` - プロジェクトのルートパス
/// * `overrides` - コマンドラインからの上書き値
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
/// - バリデーションエラー（すべての問題をまとめて返す）
pub fn resolve_settings(
    project_root: &Path,
    overrides: SettingsOverrides,
) -> Result<Settings, ConfigError> {
    tracing::debug!("Resolving settings for project: {:?}", project_root);

    let settings = loader::load_from_project(project_root)?.map_or_else(Settings::default, |s| {
        tracing::debug!("Loaded project settings: {:?}", s);
        s
    });
    let settings = overrides.apply(settings);

    settings.validate().map_err(ConfigError::ValidationErrors)?;
    tracing::debug!("Settings resolved: {:?}", settings);

    Ok(settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::CONFIG_FILE_NAME;

    /// 設定ファイルがない場合はデフォルト値
    #[rstest]
    fn test_resolve_without_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let settings = resolve_settings(temp_dir.path(), SettingsOverrides::default()).unwrap();

        assert_that!(settings, eq(&Settings::default()));
    }

    /// コマンドラインの値が設定ファイルより優先される
    #[rstest]
    fn test_overrides_win_over_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"{"referenceLocale": "es", "additionalLocales": ["en"], "model": "file-model", "concurrency": 4}"#,
        )
        .unwrap();
        let overrides = SettingsOverrides {
            additional_locales: Some(vec!["fr".to_string(), "de".to_string()]),
            concurrency: Some(20),
            dry_run: true,
            ..SettingsOverrides::default()
        };

        let settings = resolve_settings(temp_dir.path(), overrides).unwrap();

        assert_that!(settings.reference_locale, eq("es"));
        assert_that!(settings.additional_locales, elements_are![eq("fr"), eq("de")]);
        assert_that!(settings.model, eq("file-model"));
        assert_that!(settings.concurrency, eq(20));
        assert_that!(settings.dry_run, eq(true));
    }

    /// dry_run = false の上書きは設定ファイルの dryRun を打ち消さない
    #[rstest]
    fn test_dry_run_from_file_is_kept() {
        let settings = SettingsOverrides::default()
            .apply(Settings { dry_run: true, ..Settings::default() });

        assert_that!(settings.dry_run, eq(true));
    }

    /// 上書き後の設定もバリデーションされる
    #[rstest]
    fn test_invalid_override_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let overrides = SettingsOverrides {
            reference_locale: Some("en".to_string()),
            additional_locales: Some(vec!["en".to_string()]),
            concurrency: Some(0),
            ..SettingsOverrides::default()
        };

        let result = resolve_settings(temp_dir.path(), overrides);

        assert!(matches!(result, Err(ConfigError::ValidationErrors(ref errors)) if errors.len() == 2));
    }
}
