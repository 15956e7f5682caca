//! 报告输出：人类可读文本与 JSON
//!
//! 符号（✓ / ⚠ / ✗）只在这里出现，校验结果本身保持纯数据。
use std::io::{self, Write};

use crate::codec::normalize_name;
use crate::types::{Issue, ReportEntry, ValidationResult};

/// 状态符号集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub check: &'static str,
    pub warning: &'static str,
    pub cross: &'static str,
    pub bullet: &'static str,
}

impl Symbols {
    pub const UNICODE: Symbols = Symbols { check: "\u{2713}", warning: "\u{26a0}", cross: "\u{2717}", bullet: "\u{2022}" };
    pub const ASCII: Symbols = Symbols { check: "[OK]", warning: "[WARN]", cross: "[FAIL]", bullet: "*" };

    /// 依据 LC_ALL / LC_CTYPE / LANG 选择符号集
    pub fn from_env() -> Self {
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        Self::for_locale(locale.as_deref())
    }

    /// 未设置 locale 时默认 Unicode；设置了但不是 UTF-8 时退回 ASCII
    pub fn for_locale(locale: Option<&str>) -> Self {
        match locale {
            None => Self::UNICODE,
            Some(l) if normalize_name(l).contains("utf8") => Self::UNICODE,
            Some(_) => Self::ASCII,
        }
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Self::UNICODE
    }
}

/// 输出单个文件的文本报告，末尾以空行分隔
pub fn write_report(
    out: &mut dyn Write,
    identifier: &str,
    result: &ValidationResult,
    expected_encoding: &str,
    symbols: &Symbols,
) -> io::Result<()> {
    let bullet = symbols.bullet;
    if result.is_valid && result.issues.is_empty() {
        writeln!(out, "{} {identifier}: Valid {expected_encoding} encoding", symbols.check)?;
        writeln!(out)?;
        return Ok(());
    }

    if result.is_valid {
        writeln!(out, "{} {identifier}: Valid {expected_encoding} encoding (with warnings)", symbols.warning)?;
    } else {
        writeln!(out, "{} {identifier}: Invalid {expected_encoding} encoding", symbols.cross)?;
    }

    for issue in &result.issues {
        match issue {
            Issue::DecodeError { message, .. } => writeln!(out, "  {bullet} Decode error: {message}")?,
            Issue::EncodeError { character, unicode_codepoint, line, column, context, .. } => {
                writeln!(out, "  {bullet} Invalid character '{character}' ({unicode_codepoint}) at line {line}, column {column}")?;
                writeln!(out, "    Context: ...{context}...")?;
            }
            Issue::EncodingMismatch { detected, confidence, .. } => {
                writeln!(out, "  {bullet} Warning: Detected {detected} encoding (confidence: {:.2}%)", confidence * 100.0)?;
            }
            Issue::DetectionFailed { message } | Issue::FileError { message } => {
                writeln!(out, "  {bullet} Error: {message}")?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

/// 以 JSON 数组输出全部文件的结果
pub fn write_json(out: &mut dyn Write, entries: &[ReportEntry<'_>]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    writeln!(out, "{json}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(identifier: &str, issues: Vec<Issue>, expected: &str) -> String {
        let result = ValidationResult::from_issues(issues);
        let mut buf = Vec::new();
        write_report(&mut buf, identifier, &result, expected, &Symbols::UNICODE).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn valid_encoding_no_issues() {
        let out = render("test.txt", Vec::new(), "utf-8");
        assert_eq!(out, "\u{2713} test.txt: Valid utf-8 encoding\n\n");
    }

    #[test]
    fn valid_encoding_with_warnings() {
        let out = render(
            "test.txt",
            vec![Issue::EncodingMismatch {
                detected: "utf-8-sig".to_owned(),
                expected: "utf-8".to_owned(),
                confidence: 0.95,
                message: "Detected encoding differs".to_owned(),
            }],
            "utf-8",
        );
        assert!(out.contains("\u{26a0} test.txt: Valid utf-8 encoding (with warnings)"));
        assert!(out.contains("Warning: Detected utf-8-sig encoding (confidence: 95.00%)"));
        assert!(out.ends_with("\n\n"));
    }

    #[test]
    fn invalid_encoding_with_errors() {
        let out = render(
            "test.txt",
            vec![Issue::EncodeError {
                character: '\u{1f30d}',
                unicode_name: "'\u{1f30d}'".to_owned(),
                unicode_codepoint: "U+1F30D".to_owned(),
                line: 1,
                column: 7,
                context: "Hello \u{1f30d} world".to_owned(),
            }],
            "ascii",
        );
        assert!(out.contains("\u{2717} test.txt: Invalid ascii encoding"));
        assert!(out.contains("Invalid character '\u{1f30d}' (U+1F30D) at line 1, column 7"));
        assert!(out.contains("Context: ...Hello \u{1f30d} world..."));
    }

    #[test]
    fn decode_error_report() {
        let out = render(
            "test.txt",
            vec![Issue::DecodeError {
                encoding: "ascii".to_owned(),
                position: 5,
                byte: 0xff,
                message: "Cannot decode byte 0xFF at position 5".to_owned(),
            }],
            "ascii",
        );
        assert!(out.contains("Invalid ascii encoding"));
        assert!(out.contains("Decode error: Cannot decode byte 0xFF at position 5"));
    }

    #[test]
    fn detection_failed_and_file_errors() {
        let out = render(
            "test.txt",
            vec![Issue::DetectionFailed { message: "Could not detect file encoding".to_owned() }],
            "utf-8",
        );
        assert!(out.contains("Invalid utf-8 encoding"));
        assert!(out.contains("Error: Could not detect file encoding"));

        let out = render(
            "test.txt",
            vec![Issue::FileError { message: "Error reading file: Permission denied".to_owned() }],
            "utf-8",
        );
        assert!(out.contains("Error: Error reading file: Permission denied"));
    }

    #[test]
    fn ascii_symbols() {
        let result = ValidationResult::from_issues(Vec::new());
        let mut buf = Vec::new();
        write_report(&mut buf, "a", &result, "ascii", &Symbols::ASCII).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[OK] a: Valid ascii encoding\n\n");
    }

    #[test]
    fn locale_selects_symbols() {
        assert_eq!(Symbols::for_locale(None), Symbols::UNICODE);
        assert_eq!(Symbols::for_locale(Some("en_US.UTF-8")), Symbols::UNICODE);
        assert_eq!(Symbols::for_locale(Some("C.utf8")), Symbols::UNICODE);
        assert_eq!(Symbols::for_locale(Some("C")), Symbols::ASCII);
    }

    #[test]
    fn json_output() {
        let result = ValidationResult::from_issues(vec![Issue::FileError { message: "File not found: x".to_owned() }]);
        let entries = [ReportEntry { file: "x", expected_encoding: "utf-8", result: &result }];
        let mut buf = Vec::new();
        write_json(&mut buf, &entries).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v[0]["file"], "x");
        assert_eq!(v[0]["is_valid"], false);
        assert_eq!(v[0]["issues"][0]["type"], "file_error");
    }
}
