//! 文本文件编码校验库
//!
//! 设计要点：
//! - 两阶段：先判断字节流能否解码为文本，再逐字符判断能否用期望编码表示，二者的错误分别归属。
//! - 编码检测通过 `EncodingDetector` 注入，默认实现基于 chardetng。
//! - 校验函数从不返回错误，所有失败都以问题项（Issue）形式出现在结果中。
//! - 输出格式（符号、文本、JSON）只在 report 模块处理。

mod check;
mod codec;
mod detect;
mod error;
mod options;
pub mod report;
mod types;

pub use check::{validate, validate_with};
pub use codec::{normalize_name, Codec, DecodeFailure};
pub use detect::{ChardetDetector, Detection, EncodingDetector, UNCERTAIN_CONFIDENCE};
pub use error::CheckError;
pub use options::{CheckStats, ValidateOptions, DEFAULT_CONTEXT_RADIUS};
pub use types::{Issue, IssueKind, ReportEntry, ValidationResult};
