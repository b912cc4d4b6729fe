//! ToUnicode CMap parsing
//!
//! Only the `bfchar` / `bfrange` sections are read; that covers the CMaps
//! emitted by common LaTeX and office toolchains, including CID fonts used for
//! CJK text.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static BFCHAR_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)beginbfchar(.*?)endbfchar").unwrap());

static BFRANGE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)beginbfrange(.*?)endbfrange").unwrap());

static RANGE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*(<[0-9A-Fa-f]*>|\[[^\]]*\])").unwrap()
});

static HEX_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([0-9A-Fa-f]*)>").unwrap());

/// Upper bound on codes expanded from a single bfrange entry
const MAX_RANGE_SPAN: u32 = 0xFFFF;

#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
    /// Source code width in bytes (1 or 2)
    code_len: usize,
}

impl ToUnicodeMap {
    pub fn parse(cmap: &str) -> Self {
        let mut map = HashMap::new();
        let mut code_len = 1;

        for section in BFCHAR_SECTION.captures_iter(cmap) {
            let tokens: Vec<&str> = HEX_TOKEN
                .captures_iter(&section[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();
            for pair in tokens.chunks(2) {
                let [src, dst] = pair else { continue };
                let Some(code) = parse_code(src) else { continue };
                code_len = code_len.max(src.len() / 2);
                map.insert(code, decode_utf16_hex(dst));
            }
        }

        for section in BFRANGE_SECTION.captures_iter(cmap) {
            for entry in RANGE_ENTRY.captures_iter(&section[1]) {
                let (Some(lo), Some(hi)) = (parse_code(&entry[1]), parse_code(&entry[2])) else {
                    continue;
                };
                if hi < lo || hi - lo > MAX_RANGE_SPAN {
                    continue;
                }
                code_len = code_len.max(entry[1].len() / 2);
                let target = &entry[3];

                if target.starts_with('[') {
                    let dsts = HEX_TOKEN
                        .captures_iter(target)
                        .filter_map(|c| c.get(1).map(|m| decode_utf16_hex(m.as_str())));
                    for (code, dst) in (lo..=hi).zip(dsts) {
                        map.insert(code, dst);
                    }
                } else {
                    let base = hex_to_units(target.trim_matches(|c| c == '<' || c == '>'));
                    for (offset, code) in (lo..=hi).enumerate() {
                        let mut units = base.clone();
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        map.insert(code, String::from_utf16_lossy(&units));
                    }
                }
            }
        }

        Self {
            map,
            code_len: code_len.clamp(1, 2),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn code_len(&self) -> usize {
        self.code_len
    }

    /// Map a raw string operand to text. Unmapped codes are dropped.
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .chunks(self.code_len)
            .filter_map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                self.map.get(&code).map(String::as_str)
            })
            .collect()
    }
}

fn parse_code(hex: &str) -> Option<u32> {
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn hex_to_units(hex: &str) -> Vec<u16> {
    hex.as_bytes()
        .chunks(4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u16::from_str_radix(s, 16).ok())
        .collect()
}

fn decode_utf16_hex(hex: &str) -> String {
    String::from_utf16_lossy(&hex_to_units(hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP: &str = r#"
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0010> <56FE>
endbfchar
2 beginbfrange
<0020> <0022> <0041>
<0030> <0031> [<8868> <5F0F>]
endbfrange
endcmap
"#;

    #[test]
    fn parses_bfchar_and_bfrange() {
        let map = ToUnicodeMap::parse(CMAP);
        assert_eq!(map.code_len(), 2);
        assert_eq!(map.decode(&[0x00, 0x10]), "图");
        assert_eq!(map.decode(&[0x00, 0x20, 0x00, 0x21, 0x00, 0x22]), "ABC");
        assert_eq!(map.decode(&[0x00, 0x30, 0x00, 0x31]), "表式");
        assert_eq!(map.decode(&[0x00, 0x03]), " ");
    }

    #[test]
    fn unmapped_codes_are_dropped() {
        let map = ToUnicodeMap::parse(CMAP);
        assert_eq!(map.decode(&[0x00, 0x10, 0x7F, 0x7F]), "图");
    }

    #[test]
    fn empty_cmap() {
        let map = ToUnicodeMap::parse("begincmap endcmap");
        assert!(map.is_empty());
        assert_eq!(map.code_len(), 1);
    }
}
