//! 公共类型（对外暴露）：问题项与单文件校验结果
use std::fmt;

use serde::Serialize;

/// 问题类别（不带字段的判别值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    FileError,
    DetectionFailed,
    DecodeError,
    EncodeError,
    EncodingMismatch,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::FileError => "file_error",
            IssueKind::DetectionFailed => "detection_failed",
            IssueKind::DecodeError => "decode_error",
            IssueKind::EncodeError => "encode_error",
            IssueKind::EncodingMismatch => "encoding_mismatch",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个问题项（JSON 中以 `type` 字段区分）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Issue {
    /// 文件不存在、不可读等
    FileError { message: String },
    /// 检测器无法给出编码
    DetectionFailed { message: String },
    /// 检测编码与期望编码都无法解码
    DecodeError {
        encoding: String,
        position: usize,
        byte: u8,
        message: String,
    },
    /// 某个字符无法用期望编码表示（行列均从 1 开始，按字符计）
    EncodeError {
        character: char,
        unicode_name: String,
        unicode_codepoint: String,
        line: usize,
        column: usize,
        context: String,
    },
    /// 检测编码与期望编码不一致（仅警告）
    EncodingMismatch {
        detected: String,
        expected: String,
        confidence: f32,
        message: String,
    },
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Issue::FileError { .. } => IssueKind::FileError,
            Issue::DetectionFailed { .. } => IssueKind::DetectionFailed,
            Issue::DecodeError { .. } => IssueKind::DecodeError,
            Issue::EncodeError { .. } => IssueKind::EncodeError,
            Issue::EncodingMismatch { .. } => IssueKind::EncodingMismatch,
        }
    }

    /// 除 encoding_mismatch 外都算错误
    pub fn is_error(&self) -> bool {
        self.kind() != IssueKind::EncodingMismatch
    }
}

/// 单文件校验结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// 由问题列表构造；is_valid 当且仅当不存在错误类问题
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let is_valid = !issues.iter().any(Issue::is_error);
        Self { is_valid, issues }
    }

    pub(crate) fn single(issue: Issue) -> Self {
        Self::from_issues(vec![issue])
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| !i.is_error())
    }
}

/// JSON 报告中的单个元素
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry<'a> {
    pub file: &'a str,
    pub expected_encoding: &'a str,
    #[serde(flatten)]
    pub result: &'a ValidationResult,
}
