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

//! Collation mixing
//!
//! When an operation combines several string operands, their collations
//! are unified by coercibility: the lowest coercibility wins, ties are
//! broken by charset containment, and an unresolvable tie is an
//! illegal mix of collations.

use std::fmt;

use log::debug;
use smallvec::SmallVec;

use super::{Charset, Collation, BINARY};
use crate::core::{Error, Result};

/// How strongly an operand's collation is bound. Lower wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Coercibility {
    /// `expr COLLATE name`
    Explicit = 0,
    /// Result of mixing two different collations of one charset
    None = 1,
    /// Column reference
    Implicit = 2,
    /// System constant such as `USER()`
    SysConst = 3,
    /// String literal
    Coercible = 4,
    /// Numeric or temporal value
    Numeric = 5,
    /// NULL
    Ignorable = 6,
}

impl Coercibility {
    /// Name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            Coercibility::Explicit => "EXPLICIT",
            Coercibility::None => "NONE",
            Coercibility::Implicit => "IMPLICIT",
            Coercibility::SysConst => "SYSCONST",
            Coercibility::Coercible => "COERCIBLE",
            Coercibility::Numeric => "NUMERIC",
            Coercibility::Ignorable => "IGNORABLE",
        }
    }

    /// Integer returned by `COERCIBILITY()`
    pub fn as_i64(self) -> i64 {
        self as u8 as i64
    }
}

/// Set of characters a value may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repertoire {
    Ascii,
    Unicode,
}

impl Repertoire {
    /// Repertoire of a literal
    pub fn of(s: &str) -> Repertoire {
        if s.is_ascii() {
            Repertoire::Ascii
        } else {
            Repertoire::Unicode
        }
    }
}

/// Collation attributes of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub collation: &'static Collation,
    pub coercibility: Coercibility,
    pub repertoire: Repertoire,
}

impl Derivation {
    pub fn new(
        collation: &'static Collation,
        coercibility: Coercibility,
        repertoire: Repertoire,
    ) -> Self {
        Self {
            collation,
            coercibility,
            repertoire,
        }
    }

    /// Derivation of a numeric or temporal operand
    pub fn numeric(collation: &'static Collation) -> Self {
        Self::new(collation, Coercibility::Numeric, Repertoire::Ascii)
    }

    /// Derivation of a NULL operand
    pub fn ignorable(collation: &'static Collation) -> Self {
        Self::new(collation, Coercibility::Ignorable, Repertoire::Ascii)
    }

    #[inline]
    pub fn charset(&self) -> Charset {
        self.collation.charset
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.collation.name, self.coercibility.name())
    }
}

fn mix_error(operands: &[Derivation], operation: &str) -> Error {
    Error::illegal_mix(
        operands
            .iter()
            .map(|d| (d.collation.name.to_string(), d.coercibility.name().to_string()))
            .collect(),
        operation,
    )
}

/// Pick the winner among operands tied at the minimum coercibility
fn pick_tied(tied: &[Derivation], min: Coercibility) -> Option<(&'static Collation, Coercibility)> {
    let first = tied[0].collation;
    if tied.iter().all(|d| d.collation == first) {
        return Some((first, min));
    }
    if tied.iter().any(|d| d.charset() == Charset::Binary) {
        return Some((&BINARY, min));
    }
    if min == Coercibility::Explicit {
        return None;
    }

    let mut charsets: SmallVec<[Charset; 4]> = tied.iter().map(|d| d.charset()).collect();
    charsets.sort();
    charsets.dedup();

    // A charset qualifies when every other tied operand converts into it
    let target = charsets
        .iter()
        .copied()
        .filter(|&cs| {
            tied.iter()
                .all(|d| cs.is_superset_of(d.charset()) || d.repertoire == Repertoire::Ascii)
        })
        .max_by_key(|&cs| {
            let covered = charsets.iter().filter(|&&o| cs.is_superset_of(o)).count();
            (covered, std::cmp::Reverse(cs))
        })?;

    let mut in_target = tied.iter().filter(|d| d.charset() == target).map(|d| d.collation);
    let chosen = in_target.next()?;
    if in_target.all(|c| c == chosen) {
        Some((chosen, min))
    } else {
        Some((target.bin_collation(), Coercibility::None))
    }
}

fn convertible(operand: &Derivation, winner: &'static Collation) -> bool {
    let (from, to) = (operand.charset(), winner.charset);
    to == Charset::Binary
        || from == to
        || to.is_superset_of(from)
        || operand.repertoire == Repertoire::Ascii
        || operand.coercibility >= Coercibility::SysConst
}

/// Unify the collations of `operands` for `operation`.
///
/// The result does not depend on operand order. A tie between two
/// different collations of the same charset resolves to that charset's
/// `_bin` collation with [`Coercibility::None`]; such a result is
/// rejected by [`resolve_for_comparison`].
pub fn resolve(operands: &[Derivation], operation: &str) -> Result<Derivation> {
    let relevant: SmallVec<[Derivation; 4]> = operands
        .iter()
        .copied()
        .filter(|d| d.coercibility != Coercibility::Ignorable)
        .collect();

    let repertoire = if operands.iter().any(|d| d.repertoire == Repertoire::Unicode) {
        Repertoire::Unicode
    } else {
        Repertoire::Ascii
    };

    let Some(min) = relevant.iter().map(|d| d.coercibility).min() else {
        let collation = operands.first().map(|d| d.collation).unwrap_or(&BINARY);
        return Ok(Derivation::new(collation, Coercibility::Ignorable, repertoire));
    };

    let tied: SmallVec<[Derivation; 4]> = relevant
        .iter()
        .copied()
        .filter(|d| d.coercibility == min)
        .collect();

    let (collation, coercibility) =
        pick_tied(&tied, min).ok_or_else(|| mix_error(&relevant, operation))?;

    if relevant
        .iter()
        .filter(|d| d.coercibility > min)
        .any(|d| !convertible(d, collation))
    {
        return Err(mix_error(&relevant, operation));
    }

    debug!(
        "collation for '{}' resolved to {} ({})",
        operation,
        collation.name,
        coercibility.name()
    );
    Ok(Derivation::new(collation, coercibility, repertoire))
}

/// Like [`resolve`], but comparisons cannot use a `NONE` derivation
pub fn resolve_for_comparison(operands: &[Derivation], operation: &str) -> Result<Derivation> {
    let result = resolve(operands, operation)?;
    if result.coercibility == Coercibility::None {
        let relevant: SmallVec<[Derivation; 4]> = operands
            .iter()
            .copied()
            .filter(|d| d.coercibility != Coercibility::Ignorable)
            .collect();
        return Err(mix_error(&relevant, operation));
    }
    Ok(result)
}
