//! 校验选项与统计信息（模块）
use crate::types::ValidationResult;

/// 上下文窗口默认半径（字符数）
pub const DEFAULT_CONTEXT_RADIUS: usize = 10;

/// 校验选项
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// encode_error 上下文窗口半径：取问题字符前 radius 个到其后 radius-1 个字符
    pub context_radius: usize,
    /// 最大文件大小（字节）；超过则报告 file_error，不做解码
    pub max_file_size: Option<u64>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            context_radius: DEFAULT_CONTEXT_RADIUS,
            max_file_size: None,
        }
    }
}

/// 批量校验的统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckStats {
    pub files_checked: usize,
    pub files_invalid: usize,
    pub files_with_warnings: usize,
    pub issues_total: usize,
}

impl CheckStats {
    pub fn record(&mut self, result: &ValidationResult) {
        self.files_checked += 1;
        self.issues_total += result.issues.len();
        if !result.is_valid {
            self.files_invalid += 1;
        } else if result.has_warnings() {
            self.files_with_warnings += 1;
        }
    }
}
