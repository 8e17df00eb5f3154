//! Configuration
//!
//! JSON設定ファイルの読み込み

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::application::dto::upload_config::DEFAULT_VIDEO_TITLE;

/// 既定の設定ファイルパス
pub const DEFAULT_CONFIG_PATH: &str = "./.skelclock/config.json";
/// ローカルバックエンドの既定保存先
pub const DEFAULT_STORAGE_DIR: &str = "~/.skelclock/videos";

/// 使用するバックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// HTTP API
    #[default]
    Http,
    /// ローカルファイルシステム
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,

    /// HTTPバックエンドのベースURL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer トークン
    #[serde(default)]
    pub api_token: Option<String>,

    /// ローカルバックエンドの保存先（`~` 展開あり）
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// アップロード時の既定タイトル
    #[serde(default = "default_video_title")]
    pub video_title: String,
}

fn default_storage_dir() -> String {
    DEFAULT_STORAGE_DIR.to_string()
}

fn default_video_title() -> String {
    DEFAULT_VIDEO_TITLE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            base_url: None,
            api_token: None,
            storage_dir: default_storage_dir(),
            video_title: default_video_title(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の整合性を確認する
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendKind::Http {
            match self.base_url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => {}
                _ => anyhow::bail!("base_url is required when backend is \"http\""),
            }
        }
        if self.video_title.trim().is_empty() {
            anyhow::bail!("video_title must not be empty");
        }
        Ok(())
    }

    /// `~` を展開した保存先
    pub fn expanded_storage_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage_dir).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_http_config() {
        let file = write_config(
            r#"{
  "backend": "http",
  "base_url": "https://videos.example.com/api",
  "api_token": "secret"
}"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://videos.example.com/api")
        );
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.video_title, "Master Presentation");
    }

    #[test]
    fn test_load_local_config() {
        let file = write_config(
            r#"{"backend": "local", "storage_dir": "/tmp/videos", "video_title": "Lecture"}"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.expanded_storage_dir(), PathBuf::from("/tmp/videos"));
        assert_eq!(config.video_title, "Lecture");
    }

    #[test]
    fn test_http_requires_base_url() {
        let file = write_config(r#"{"backend": "http"}"#);

        let err = Config::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("base_url is required"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let file = write_config(r#"{"backend": "ftp"}"#);

        let err = Config::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/skelclock/config.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_storage_dir_tilde_expansion() {
        let config = Config {
            backend: BackendKind::Local,
            storage_dir: "~/videos".to_string(),
            ..Config::default()
        };

        let expanded = config.expanded_storage_dir();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("videos"));
    }
}
