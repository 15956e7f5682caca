//! 校验主流程：检测 → 解码（阶段一）→ 逐字符编码（阶段二）→ 不一致告警
//!
//! 所有失败都折算为问题项返回，不向调用方传播错误，也不输出任何内容。
use std::borrow::Cow;
use std::path::Path;

use tracing::debug;

use crate::codec::{normalize_name, Codec, DecodeFailure};
use crate::detect::{ChardetDetector, EncodingDetector};
use crate::error::CheckError;
use crate::options::ValidateOptions;
use crate::types::{Issue, ValidationResult};

/// 使用默认选项与默认检测器校验单个文件
pub fn validate(path: &Path, expected_encoding: &str) -> ValidationResult {
    validate_with(path, expected_encoding, &ValidateOptions::default(), &ChardetDetector)
}

/// 校验单个文件是否符合 `expected_encoding`
/// 顺序保证：decode_error / detection_failed / file_error 均单独短路返回；
/// encode_error 按文档顺序（行优先、列其次）排列，存在时不再做不一致检查。
pub fn validate_with(
    path: &Path,
    expected_encoding: &str,
    opts: &ValidateOptions,
    detector: &dyn EncodingDetector,
) -> ValidationResult {
    if !path.exists() {
        return ValidationResult::single(file_error(&CheckError::NotFound(path.to_path_buf())));
    }

    let bytes = match read_bytes(path, opts.max_file_size) {
        Ok(b) => b,
        Err(e) => return ValidationResult::single(file_error(&e)),
    };

    let Some(detection) = detector.detect(&bytes) else {
        return ValidationResult::single(Issue::DetectionFailed {
            message: "Could not detect file encoding".to_owned(),
        });
    };
    let detected = detection.encoding.to_lowercase();
    debug!(?path, detected = %detected, confidence = detection.confidence, "encoding detected");

    let expected_codec = match Codec::resolve(expected_encoding) {
        Ok(c) => c,
        Err(e) => return ValidationResult::single(file_error(&e)),
    };

    // 阶段一：字节流能否作为文本解码
    let content = match decode_content(&bytes, &detected, expected_codec) {
        Ok(text) => text,
        Err(failure) => {
            return ValidationResult::single(Issue::DecodeError {
                encoding: expected_encoding.to_owned(),
                position: failure.position,
                byte: failure.byte,
                message: format!("Cannot decode byte 0x{:02X} at position {}", failure.byte, failure.position),
            });
        }
    };

    // 阶段二：每个字符能否用期望编码表示
    let mut issues = find_unencodable(&content, expected_codec, opts.context_radius);
    if !issues.is_empty() {
        debug!(?path, count = issues.len(), "unencodable characters found");
        return ValidationResult::from_issues(issues);
    }

    if let Some(warning) = mismatch(&detected, expected_encoding, detection.confidence) {
        issues.push(warning);
    }
    ValidationResult::from_issues(issues)
}

fn file_error(err: &CheckError) -> Issue {
    Issue::FileError { message: err.to_string() }
}

fn read_bytes(path: &Path, max_file_size: Option<u64>) -> Result<Vec<u8>, CheckError> {
    if let Some(limit) = max_file_size {
        let size = std::fs::metadata(path)?.len();
        if size > limit {
            return Err(CheckError::TooLarge { size, limit });
        }
    }
    Ok(std::fs::read(path)?)
}

/// 先用检测到的编码解码，失败（或名称无法解析）时退回期望编码
fn decode_content<'a>(bytes: &'a [u8], detected: &str, expected: Codec) -> Result<Cow<'a, str>, DecodeFailure> {
    match Codec::resolve(detected) {
        Ok(codec) => match codec.decode(bytes) {
            Ok(text) => return Ok(text),
            Err(failure) => debug!(detected, position = failure.position, "decode with detected encoding failed, falling back"),
        },
        Err(e) => debug!(detected, error = %e, "detected encoding not usable, falling back"),
    }
    expected.decode(bytes)
}

/// 逐行逐字符检查可编码性
fn find_unencodable(content: &str, codec: Codec, radius: usize) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (line_idx, line) in split_lines(content).into_iter().enumerate() {
        if line.chars().all(|c| codec.can_encode(c)) {
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        for (col, &c) in chars.iter().enumerate() {
            if codec.can_encode(c) {
                continue;
            }
            let from = col.saturating_sub(radius);
            let to = col.saturating_add(radius).min(chars.len());
            issues.push(Issue::EncodeError {
                character: c,
                unicode_name: format!("{c:?}"),
                unicode_codepoint: format!("U+{:04X}", u32::from(c)),
                line: line_idx + 1,
                column: col + 1,
                context: chars[from..to].iter().collect(),
            });
        }
    }
    issues
}

/// 行边界字符（与通用 splitlines 语义一致）
fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// 按行边界切分，边界本身不计入行内容；`\r\n` 视为一个边界；末尾边界不产生空行
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();
    while let Some((idx, c)) = iter.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + c.len_utf8();
        if c == '\r' {
            if let Some(&(next_idx, '\n')) = iter.peek() {
                iter.next();
                start = next_idx + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// 编码名称的比较形式：能解析时取规范名，否则仅做归一化
fn comparable_name(name: &str) -> String {
    Codec::resolve(name)
        .map(|codec| codec.canonical_name())
        .unwrap_or_else(|_| normalize_name(name))
}

/// 检测编码与期望编码的规范名不同、且互不包含时给出告警
fn mismatch(detected: &str, expected: &str, confidence: f32) -> Option<Issue> {
    let d = comparable_name(detected);
    let e = comparable_name(expected);
    if d == e || d.contains(&e) || e.contains(&d) {
        return None;
    }
    Some(Issue::EncodingMismatch {
        detected: detected.to_owned(),
        expected: expected.to_owned(),
        confidence,
        message: format!("Detected encoding '{detected}' differs from expected '{expected}'"),
    })
}
