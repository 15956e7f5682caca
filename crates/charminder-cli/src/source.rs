//! 输入来源解析：本地路径或 URL（下载到临时文件，随 Source 释放而删除）
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::info;
use url::Url;

/// 已解析的输入
#[derive(Debug)]
pub enum Source {
    Local(PathBuf),
    /// 临时文件在 drop 时删除，所有退出路径都会清理
    Downloaded(TempPath),
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Source::Local(p) => p.as_path(),
            Source::Downloaded(t) => &**t,
        }
    }
}

/// 仅 http / https 视为 URL
pub fn is_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// 下载 URL 内容到临时文件；保留原文件扩展名
pub fn download(raw: &str) -> Result<TempPath> {
    let url = Url::parse(raw).with_context(|| format!("invalid url: {raw}"))?;
    let suffix = url
        .path_segments()
        .and_then(|segments| segments.last())
        .and_then(|name| Path::new(name).extension())
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let response = reqwest::blocking::get(url.clone())
        .with_context(|| format!("request {url}"))?
        .error_for_status()
        .with_context(|| format!("download {url}"))?;
    let body = response.bytes().context("read response body")?;

    let mut file = tempfile::Builder::new()
        .prefix("charminder-")
        .suffix(&suffix)
        .tempfile()
        .context("create temp file")?;
    file.write_all(&body).context("write temp file")?;
    file.flush().context("flush temp file")?;
    info!(%url, bytes = body.len(), "downloaded");
    Ok(file.into_temp_path())
}
