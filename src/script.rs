//! Japanese script classification
//!
//! Decides which code points count as learning units and which tier
//! they belong to. Kana form the foundational tier; ideographs are
//! elevated material introduced from the frequency corpus.

use std::ops::RangeInclusive;

const HIRAGANA: RangeInclusive<u32> = 0x3041..=0x3096;
const KATAKANA: RangeInclusive<u32> = 0x30A1..=0x30F6;
const CJK_UNIFIED: RangeInclusive<u32> = 0x4E00..=0x9FFF;
const CJK_EXTENSION_A: RangeInclusive<u32> = 0x3400..=0x4DBF;

/// Script a single code point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hiragana,
    Katakana,
    Ideograph,
}

impl Script {
    /// Classify a character, returning `None` for anything that is not
    /// practiced (punctuation, latin, prolonged sound marks, ...)
    pub fn of(c: char) -> Option<Self> {
        let cp = c as u32;
        if HIRAGANA.contains(&cp) {
            Some(Script::Hiragana)
        } else if KATAKANA.contains(&cp) {
            Some(Script::Katakana)
        } else if CJK_UNIFIED.contains(&cp) || CJK_EXTENSION_A.contains(&cp) {
            Some(Script::Ideograph)
        } else {
            None
        }
    }

    pub fn is_kana(&self) -> bool {
        matches!(self, Script::Hiragana | Script::Katakana)
    }
}

/// Every hiragana followed by every katakana, in code point order.
///
/// This is the seed of the foundational tier and therefore also its
/// natural enumeration order.
pub fn kana_alphabet() -> impl Iterator<Item = String> {
    HIRAGANA
        .chain(KATAKANA)
        .filter_map(char::from_u32)
        .map(String::from)
}
