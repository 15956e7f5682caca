//! 核心错误类型（校验内部使用，最终都会被折算为 file_error 问题项）
use std::path::PathBuf;

use thiserror::Error;

/// 文件访问与编码解析阶段的错误
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Error reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}
