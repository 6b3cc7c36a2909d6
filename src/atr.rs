//! ATR matching (spec §4.1, §6).

/// The two ATRs recognized as STARCOS SPK 2.3 generic.
pub const STARCOS_ATRS: &[&str] = &[
    "3B B7 94 00 C0 24 31 FE 65 53 50 4B 32 33 90 00 B4",
    "3B B7 94 00 81 31 FE 65 53 50 4B 32 33 90 00 D1",
];

pub fn parse_hex_atr(s: &str) -> Vec<u8> {
    s.split_whitespace()
        .map(|byte| u8::from_str_radix(byte, 16).expect("static ATR table is well-formed hex"))
        .collect()
}

/// Returns `true` if `atr` matches one of the known STARCOS SPK 2.3
/// answer-to-reset strings.
pub fn match_card(atr: &[u8]) -> bool {
    STARCOS_ATRS.iter().any(|known| parse_hex_atr(known) == atr)
}
