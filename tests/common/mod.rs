//! 統合テスト用の共通ヘルパー

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use std::fs;
use std::path::Path;

use next_i18n_autopilot::dictionary::Dictionary;
use serde_json::Value;

/// ユニットテストと同じスクリプト化トランスポート
///
/// `crate::ai` / `crate::config` を参照するので、テストクレートのルートで
/// `next_i18n_autopilot::{ai, config}` を取り込んでおくこと。
#[allow(dead_code, unreachable_pub)]
#[path = "../../src/test_utils.rs"]
mod scripted;

pub(crate) use scripted::{
    Reply,
    ScriptedTransport,
    batch_payload,
    client_for,
};

/// 翻訳先ロケールを取り出す（`... to "fr".`）
pub fn target_locale(prompt: &str) -> Option<&str> {
    prompt.split(" to \"").nth(1)?.split('"').next()
}

/// バッチ翻訳に `[locale] 原文` の形で応答する
pub fn echo_batch(prompt: &str) -> Option<String> {
    let payload = batch_payload(prompt)?;
    let locale = target_locale(prompt)?;
    let mut translated = Dictionary::from_json(&payload).ok()?;
    for (path, text) in translated.leaves() {
        translated.set_leaf(&path, format!("[{locale}] {text}"));
    }
    Some(translated.to_json().to_string())
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

pub fn read_json(root: &Path, relative: &str) -> Value {
    serde_json::from_str(&read(root, relative)).unwrap()
}

/// ディレクトリ以下の全ファイルを (相対パス, 内容) で返す
pub fn snapshot(root: &Path) -> Vec<(String, String)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let relative = path.strip_prefix(root).unwrap().display().to_string();
                files.push((relative, fs::read_to_string(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}
