//! 编码检测（BOM 嗅探 + chardetng 统计猜测）
use chardetng::EncodingDetector as ChardetEngine;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use serde::Serialize;
use tracing::debug;

/// 检测结果：编码名称（小写）与置信度 [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub encoding: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(encoding: impl Into<String>, confidence: f32) -> Self {
        Self { encoding: encoding.into(), confidence: confidence.clamp(0.0, 1.0) }
    }
}

/// 编码检测能力；对任意字节（含二进制）都不得 panic，无法判断时返回 None
pub trait EncodingDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection>;
}

/// chardetng 未给出"确定"判断时使用的置信度
pub const UNCERTAIN_CONFIDENCE: f32 = 0.5;

/// 无 BOM 的 UTF-16 依靠 NUL 分布推断，置信度低于 BOM
pub const UTF16_HEURISTIC_CONFIDENCE: f32 = 0.8;

/// 默认检测器
/// 顺序：空输入 → BOM → 无 BOM 的 UTF-16 → 二进制判定 → 纯 ASCII → chardetng
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetDetector;

impl EncodingDetector for ChardetDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection> {
        if bytes.is_empty() {
            return Some(Detection::new("utf-8", 1.0));
        }

        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            debug!(encoding = encoding.name(), bom_len, "BOM detected");
            let name = if encoding == UTF_8 { "utf-8-sig".to_owned() } else { encoding.name().to_ascii_lowercase() };
            return Some(Detection::new(name, 1.0));
        }

        if let Some(encoding) = sniff_utf16_without_bom(bytes) {
            debug!(encoding = encoding.name(), "UTF-16 without BOM");
            return Some(Detection::new(encoding.name().to_ascii_lowercase(), UTF16_HEURISTIC_CONFIDENCE));
        }

        if is_probably_binary(bytes) {
            debug!(len = bytes.len(), "content looks binary, detection skipped");
            return None;
        }

        if bytes.is_ascii() {
            return Some(Detection::new("ascii", 1.0));
        }

        let mut engine = ChardetEngine::new();
        engine.feed(bytes, true);
        let (encoding, certain) = engine.guess_assess(None, true);
        let confidence = if certain { 1.0 } else { UNCERTAIN_CONFIDENCE };
        debug!(encoding = encoding.name(), certain, "chardetng guess");
        Some(Detection::new(encoding.name().to_ascii_lowercase(), confidence))
    }
}

/// 无 BOM 的 UTF-16 判定：
/// - 长度为偶数；
/// - 至少一半码元的高字节为 NUL，且另一侧字节几乎没有 NUL（≤ 10%）；
/// - 按对应字节序严格解码成功，且结果不含 U+0000。
fn sniff_utf16_without_bom(buf: &[u8]) -> Option<&'static Encoding> {
    if buf.len() < 2 || buf.len() % 2 != 0 {
        return None;
    }
    let units = buf.len() / 2;
    let even_nul = buf.iter().step_by(2).filter(|&&b| b == 0).count();
    let odd_nul = buf.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();

    let encoding = if odd_nul * 2 >= units && even_nul * 10 <= units {
        UTF_16LE
    } else if even_nul * 2 >= units && odd_nul * 10 <= units {
        UTF_16BE
    } else {
        return None;
    };

    let text = encoding.decode_without_bom_handling_and_without_replacement(buf)?;
    if text.contains('\0') {
        return None;
    }
    Some(encoding)
}

/// 判定缓冲区是否"明显是二进制"
/// - 含 NUL 字节即视为二进制；
/// - 合法 UTF-8 视为文本；
/// - 否则 C0 控制字节（不含 tab/LF/VT/FF/CR/ESC）与 DEL 占比超过 10% 视为二进制。
fn is_probably_binary(buf: &[u8]) -> bool {
    if buf.is_empty() { return false; }
    if buf.contains(&0) { return true; }
    if std::str::from_utf8(buf).is_ok() { return false; }
    let control = buf
        .iter()
        .filter(|&&b| matches!(b, 0x01..=0x08 | 0x0E..=0x1A | 0x1C..=0x1F | 0x7F))
        .count();
    control * 10 > buf.len()
}
