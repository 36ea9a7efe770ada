// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! String comparison rules per collation family

use std::cmp::Ordering;

use smallvec::SmallVec;

use super::{Collation, PadAttribute};

/// Comparison rule family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollatorKind {
    /// Byte comparison, trailing spaces significant
    Binary,
    /// Code point comparison, PAD SPACE
    Bin,
    /// Simple case and Latin accent folding, PAD SPACE
    GeneralCi,
    /// Case folding only, PAD SPACE
    CaseFoldCi,
    /// latin1_swedish_ci: like general_ci but Å Ä Ö sort after Z
    SwedishCi,
    /// Case and accent insensitive with expansions, PAD SPACE
    UnicodeCi,
    /// UCA 9.0 accent and case insensitive, NO PAD
    Uca0900AiCi,
    /// UCA 9.0 accent and case sensitive, NO PAD
    Uca0900AsCs,
    /// Code point comparison, NO PAD
    Uca0900Bin,
}

impl CollatorKind {
    pub(crate) fn pad(self) -> PadAttribute {
        match self {
            CollatorKind::Binary
            | CollatorKind::Uca0900AiCi
            | CollatorKind::Uca0900AsCs
            | CollatorKind::Uca0900Bin => PadAttribute::NoPad,
            _ => PadAttribute::PadSpace,
        }
    }
}

type Weights = SmallVec<[u32; 32]>;

/// Map an accented Latin letter to its base letter
fn strip_accent(c: char) -> char {
    match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ď' | 'Đ' => 'D',
        'ď' | 'đ' => 'd',
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'Ţ' | 'Ť' => 'T',
        'ţ' | 'ť' => 't',
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ý' | 'Ÿ' => 'Y',
        'ý' | 'ÿ' => 'y',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Simple one-to-one uppercase mapping
#[inline]
fn upper(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_uppercase();
    }
    let mut it = c.to_uppercase();
    match (it.next(), it.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

#[inline]
fn lower(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut it = c.to_lowercase();
    match (it.next(), it.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn swedish_weight(c: char) -> u32 {
    match upper(c) {
        'Å' => 'Z' as u32 + 1,
        'Ä' | 'Æ' => 'Z' as u32 + 2,
        'Ö' | 'Ø' => 'Z' as u32 + 3,
        'Ü' => 'Y' as u32,
        u => upper(strip_accent(u)) as u32,
    }
}

impl Collation {
    /// Primary weight of a single character, used by LIKE matching
    pub fn char_weight(&self, c: char) -> u32 {
        match self.kind {
            CollatorKind::Binary | CollatorKind::Bin | CollatorKind::Uca0900Bin => c as u32,
            CollatorKind::Uca0900AsCs => c as u32,
            CollatorKind::CaseFoldCi => upper(c) as u32,
            CollatorKind::SwedishCi => swedish_weight(c),
            CollatorKind::GeneralCi => {
                if c as u32 > 0xFFFF {
                    0xFFFD
                } else if c == 'ß' {
                    'S' as u32
                } else {
                    upper(strip_accent(c)) as u32
                }
            }
            CollatorKind::UnicodeCi | CollatorKind::Uca0900AiCi => {
                upper(strip_accent(c)) as u32
            }
        }
    }

    fn primary_weights(&self, s: &str) -> Weights {
        let mut out = Weights::new();
        for c in s.chars() {
            match self.kind {
                CollatorKind::UnicodeCi | CollatorKind::Uca0900AiCi | CollatorKind::Uca0900AsCs => {
                    match c {
                        'ß' => {
                            out.push('S' as u32);
                            out.push('S' as u32);
                        }
                        'Æ' | 'æ' => {
                            out.push('A' as u32);
                            out.push('E' as u32);
                        }
                        _ => out.push(upper(strip_accent(c)) as u32),
                    }
                }
                _ => out.push(self.char_weight(c)),
            }
        }
        out
    }

    fn trim_pad<'a>(&self, s: &'a str) -> &'a str {
        match self.pad() {
            PadAttribute::PadSpace => s.trim_end_matches(' '),
            PadAttribute::NoPad => s,
        }
    }

    /// Compare two strings under this collation
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let (a, b) = (self.trim_pad(a), self.trim_pad(b));
        match self.kind {
            CollatorKind::Binary | CollatorKind::Bin | CollatorKind::Uca0900Bin => {
                a.as_bytes().cmp(b.as_bytes())
            }
            CollatorKind::Uca0900AsCs => {
                let primary = self.primary_weights(a).cmp(&self.primary_weights(b));
                if primary != Ordering::Equal {
                    return primary;
                }
                // Secondary level: accents
                let sa = a.chars().map(|c| lower(c) as u32);
                let sb = b.chars().map(|c| lower(c) as u32);
                let secondary = sa.cmp(sb);
                if secondary != Ordering::Equal {
                    return secondary;
                }
                // Tertiary level: lowercase sorts before uppercase
                let ta = a.chars().map(|c| c.is_uppercase());
                let tb = b.chars().map(|c| c.is_uppercase());
                ta.cmp(tb)
            }
            _ => self.primary_weights(a).cmp(&self.primary_weights(b)),
        }
    }

    /// Equality under this collation
    #[inline]
    pub fn equals(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        self.compare(a, b) == Ordering::Equal
    }

    /// Binary key such that equal keys mean equal strings
    pub fn sort_key(&self, s: &str) -> Vec<u8> {
        let s = self.trim_pad(s);
        match self.kind {
            CollatorKind::Binary | CollatorKind::Bin | CollatorKind::Uca0900Bin => {
                s.as_bytes().to_vec()
            }
            CollatorKind::Uca0900AsCs => s.as_bytes().to_vec(),
            _ => {
                let mut key = Vec::with_capacity(s.len() * 3);
                for w in self.primary_weights(s) {
                    key.extend_from_slice(&w.to_be_bytes()[1..]);
                }
                key
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::collation::*;
    use std::cmp::Ordering;

    #[test]
    fn test_bin_pad_space() {
        assert!(UTF8MB4_BIN.equals("a", "a  "));
        assert!(!UTF8MB4_BIN.equals("a", "A"));
        assert_eq!(UTF8MB4_BIN.compare("B", "a"), Ordering::Less);
    }

    #[test]
    fn test_binary_no_pad() {
        assert!(!BINARY.equals("a", "a "));
    }

    #[test]
    fn test_general_ci() {
        assert!(UTF8MB4_GENERAL_CI.equals("abc", "ABC"));
        assert!(UTF8MB4_GENERAL_CI.equals("résumé", "RESUME"));
        assert!(UTF8MB4_GENERAL_CI.equals("a ", "A"));
        assert_eq!(UTF8MB4_GENERAL_CI.compare("a", "B"), Ordering::Less);
    }

    #[test]
    fn test_0900_ai_ci_no_pad() {
        assert!(UTF8MB4_0900_AI_CI.equals("Straße", "STRASSE"));
        assert!(!UTF8MB4_0900_AI_CI.equals("a", "a "));
    }

    #[test]
    fn test_0900_as_cs_levels() {
        assert!(!UTF8MB4_0900_AS_CS.equals("a", "A"));
        assert_eq!(UTF8MB4_0900_AS_CS.compare("a", "A"), Ordering::Less);
        assert_eq!(UTF8MB4_0900_AS_CS.compare("A", "b"), Ordering::Less);
        assert_ne!(UTF8MB4_0900_AS_CS.compare("e", "é"), Ordering::Equal);
    }

    #[test]
    fn test_swedish() {
        assert!(LATIN1_SWEDISH_CI.equals("abc", "ABC"));
        assert_eq!(LATIN1_SWEDISH_CI.compare("Å", "Z"), Ordering::Greater);
        assert!(LATIN1_SWEDISH_CI.equals("é", "E"));
    }

    #[test]
    fn test_sort_key_matches_equality() {
        let a = UTF8MB4_GENERAL_CI.sort_key("Hello ");
        let b = UTF8MB4_GENERAL_CI.sort_key("hello");
        assert_eq!(a, b);
    }
}
