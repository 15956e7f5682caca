//! 编码解析：编码名称 → 严格解码 / 逐字符可编码判定
//!
//! - `ascii` 与 `latin-1` 自行实现：encoding_rs 遵循 WHATWG 标签表，
//!   会把 "ascii"、"iso-8859-1" 都映射到 windows-1252，语义不符。
//! - 其余名称交给 `encoding_rs::Encoding::for_label` 解析。
use std::borrow::Cow;

use encoding_rs::{DecoderResult, Encoding, UTF_8, WINDOWS_1252};

use crate::error::CheckError;

/// 归一化编码名称：小写，并去掉 `-` 与 `_`
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// 严格解码失败的位置：首个无法解码的字节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailure {
    /// 字节偏移（从 0 开始）
    pub position: usize,
    /// 该位置上的字节值
    pub byte: u8,
}

/// 已解析的编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// 7-bit ASCII
    Ascii,
    /// ISO-8859-1：字节值即码点
    Latin1,
    /// cp1252：WHATWG 的 windows-1252 去掉 5 个未定义位置
    Cp1252,
    /// encoding_rs 支持的编码（UTF-8、UTF-16、windows-125x、Shift_JIS、GBK ...）
    Whatwg(&'static Encoding),
}

impl Codec {
    /// 按名称解析编码，大小写与分隔符不敏感
    pub fn resolve(name: &str) -> Result<Self, CheckError> {
        let trimmed = name.trim();
        match normalize_name(trimmed).as_str() {
            "ascii" | "usascii" | "646" => return Ok(Codec::Ascii),
            "latin1" | "iso88591" | "l1" | "8859" | "cp819" => return Ok(Codec::Latin1),
            // BOM 在解码时统一剥离，utf-8-sig 与 utf-8 共用解码器
            "utf8sig" => return Ok(Codec::Whatwg(UTF_8)),
            _ => {}
        }
        Encoding::for_label(trimmed.as_bytes())
            .or_else(|| Encoding::for_label(trimmed.replace('_', "-").as_bytes()))
            .map(|encoding| if encoding == WINDOWS_1252 { Codec::Cp1252 } else { Codec::Whatwg(encoding) })
            .ok_or_else(|| CheckError::UnknownEncoding(trimmed.to_owned()))
    }

    /// 规范名（已归一化），同一编码的不同别名得到相同结果
    pub fn canonical_name(&self) -> String {
        match self {
            Codec::Ascii => "ascii".to_owned(),
            Codec::Latin1 => "latin1".to_owned(),
            Codec::Cp1252 => normalize_name(WINDOWS_1252.name()),
            Codec::Whatwg(encoding) => normalize_name(encoding.name()),
        }
    }

    /// 严格解码（不做替换）；失败时返回首个坏字节的位置
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, DecodeFailure> {
        match self {
            Codec::Ascii => {
                if let Some(position) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(DecodeFailure { position, byte: bytes[position] });
                }
                std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
                    let position = e.valid_up_to();
                    DecodeFailure { position, byte: bytes.get(position).copied().unwrap_or_default() }
                })
            }
            Codec::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
            Codec::Cp1252 => {
                if let Some(position) = bytes.iter().position(|b| CP1252_UNDEFINED.contains(b)) {
                    return Err(DecodeFailure { position, byte: bytes[position] });
                }
                decode_strict(WINDOWS_1252, bytes).map(Cow::Owned)
            }
            Codec::Whatwg(encoding) => decode_strict(*encoding, bytes).map(Cow::Owned),
        }
    }

    /// 单个字符能否在该编码下无损表示
    pub fn can_encode(&self, c: char) -> bool {
        match self {
            Codec::Ascii => c.is_ascii(),
            Codec::Latin1 => u32::from(c) <= 0xFF,
            Codec::Cp1252 => {
                let undefined = u8::try_from(u32::from(c)).is_ok_and(|b| CP1252_UNDEFINED.contains(&b));
                !undefined && encodes_without_loss(WINDOWS_1252, c)
            }
            Codec::Whatwg(encoding) => {
                // UTF-16 / replacement 的输出编码为 UTF-8，覆盖全部字符
                if encoding.output_encoding() == UTF_8 {
                    return true;
                }
                encodes_without_loss(encoding, c)
            }
        }
    }
}

/// cp1252 中未定义的字节（WHATWG 映射为同值 C1 控制字符，cp1252 拒绝）
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

fn encodes_without_loss(encoding: &'static Encoding, c: char) -> bool {
    let mut buf = [0u8; 4];
    let (_, _, unmappable) = encoding.encode(c.encode_utf8(&mut buf));
    !unmappable
}

/// 使用 encoding_rs 解码器逐段解码，遇到畸形序列立即停止
fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, DecodeFailure> {
    let mut decoder = encoding.new_decoder_with_bom_removal();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len());
    let mut out = String::with_capacity(capacity);
    let mut consumed = 0usize;

    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut out, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::OutputFull => {
                let more = decoder
                    .max_utf8_buffer_length_without_replacement(bytes.len() - consumed)
                    .unwrap_or(1024);
                out.reserve(more.max(16));
            }
            DecoderResult::Malformed(bad, after) => {
                // read 包含畸形序列本身以及其后已消费的字节
                let position = consumed
                    .saturating_sub(usize::from(after))
                    .saturating_sub(usize::from(bad));
                let byte = bytes.get(position).copied().unwrap_or_default();
                return Err(DecodeFailure { position, byte });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_separators_and_case() {
        assert_eq!(normalize_name("UTF-8"), "utf8");
        assert_eq!(normalize_name("utf8"), "utf8");
        assert_eq!(normalize_name("utf_8"), "utf8");
        assert_eq!(normalize_name("Shift_JIS"), "shiftjis");
    }

    #[test]
    fn ascii_and_latin1_are_not_windows_1252() {
        assert_eq!(Codec::resolve("ascii").unwrap(), Codec::Ascii);
        assert_eq!(Codec::resolve("US-ASCII").unwrap(), Codec::Ascii);
        assert_eq!(Codec::resolve("latin-1").unwrap(), Codec::Latin1);
        assert_eq!(Codec::resolve("ISO-8859-1").unwrap(), Codec::Latin1);
        assert_eq!(Codec::resolve("cp1252").unwrap(), Codec::Cp1252);
        assert_eq!(Codec::resolve("windows-1252").unwrap(), Codec::Cp1252);
    }

    #[test]
    fn resolves_underscore_and_sig_names() {
        assert_eq!(Codec::resolve("utf_8").unwrap(), Codec::Whatwg(UTF_8));
        assert_eq!(Codec::resolve("utf-8-sig").unwrap(), Codec::Whatwg(UTF_8));
        assert_eq!(Codec::resolve("shift_jis").unwrap(), Codec::Whatwg(encoding_rs::SHIFT_JIS));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = Codec::resolve("klingon-8").unwrap_err();
        assert_eq!(err.to_string(), "Unknown encoding: klingon-8");
    }

    #[test]
    fn ascii_decode_reports_first_high_byte() {
        let failure = Codec::Ascii.decode(b"Hello\xff world").unwrap_err();
        assert_eq!(failure, DecodeFailure { position: 5, byte: 0xff });
    }

    #[test]
    fn utf8_decode_reports_malformed_offset() {
        let failure = Codec::Whatwg(UTF_8).decode(b"ok \xc3\x28 tail").unwrap_err();
        assert_eq!(failure.position, 3);
        assert_eq!(failure.byte, 0xc3);
    }

    #[test]
    fn utf8_decode_strips_bom() {
        let text = Codec::Whatwg(UTF_8).decode(b"\xef\xbb\xbfabc").unwrap();
        assert_eq!(text, "abc");
    }

    #[test]
    fn cp1252_rejects_undefined_bytes() {
        assert_eq!(Codec::Cp1252.decode(b"5\x80 \x96").unwrap(), "5\u{20ac} \u{2013}");
        let failure = Codec::Cp1252.decode(b"ab\x8dc").unwrap_err();
        assert_eq!(failure, DecodeFailure { position: 2, byte: 0x8d });
    }

    #[test]
    fn aliases_share_a_canonical_name() {
        let name = |n: &str| Codec::resolve(n).unwrap().canonical_name();
        assert_eq!(name("cp1252"), name("windows-1252"));
        assert_eq!(name("sjis"), name("Shift_JIS"));
        assert_eq!(name("utf8"), name("UTF-8"));
        assert_eq!(name("latin-1"), name("iso-8859-1"));
        assert_ne!(name("ascii"), name("utf-8"));
        assert_ne!(name("cp1252"), name("latin-1"));
    }

    #[test]
    fn latin1_decodes_every_byte() {
        let text = Codec::Latin1.decode(&[0x63, 0x61, 0x66, 0xe9]).unwrap();
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn repertoire_checks() {
        assert!(Codec::Ascii.can_encode('a'));
        assert!(!Codec::Ascii.can_encode('\u{e9}'));
        assert!(Codec::Latin1.can_encode('\u{e9}'));
        assert!(!Codec::Latin1.can_encode('\u{20ac}'));

        let cp1252 = Codec::resolve("windows-1252").unwrap();
        assert!(cp1252.can_encode('\u{20ac}'));
        assert!(!cp1252.can_encode('\u{1f30d}'));

        assert!(!cp1252.can_encode('\u{81}'));
        assert!(!cp1252.can_encode('\u{9d}'));

        let sjis = Codec::resolve("shift_jis").unwrap();
        assert!(sjis.can_encode('\u{3042}'));

        assert!(Codec::Whatwg(UTF_8).can_encode('\u{1f30d}'));
        assert!(Codec::resolve("utf-16le").unwrap().can_encode('\u{1f30d}'));
    }
}
