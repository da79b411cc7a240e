//! Wildcard query parser

use super::{Atom, UNBOUNDED};
use crate::error::CompileError;

/// Tokenize a query into atoms. Positions in errors are code point offsets.
pub(super) fn parse(query: &str) -> Result<Vec<Atom>, CompileError> {
    let chars: Vec<char> = query.chars().collect();
    let mut atoms = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let (min, max) = match chars.get(i) {
                    Some('?') => {
                        i += 1;
                        (0, 1)
                    }
                    Some('*') => {
                        i += 1;
                        (0, UNBOUNDED)
                    }
                    Some('+') => {
                        i += 1;
                        (1, UNBOUNDED)
                    }
                    Some('{') => {
                        let open = i;
                        let (min, next) = bound(&chars, i + 1, ',', open)?;
                        let (max, next) = bound(&chars, next, '}', open)?;
                        if min > max {
                            return Err(CompileError::ReversedBounds { min, max });
                        }
                        i = next;
                        (min, max)
                    }
                    _ => (1, 1),
                };
                atoms.push(Atom::Any { min, max });
            }
            '\\' => {
                let c = chars.get(i + 1).copied().ok_or(CompileError::DanglingEscape)?;
                atoms.push(Atom::Literal(c));
                i += 2;
            }
            c => {
                atoms.push(Atom::Literal(c));
                i += 1;
            }
        }
    }
    Ok(atoms)
}

/// Read a non-empty decimal number terminated by `close`.
///
/// Returns the number and the position after `close`.
fn bound(chars: &[char], mut i: usize, close: char, open: usize) -> Result<(usize, usize), CompileError> {
    let mut value: usize = 0;
    let mut digits = 0;
    loop {
        match chars.get(i) {
            None => return Err(CompileError::UnterminatedQuantifier { pos: open }),
            Some(&c) if c.is_ascii_digit() => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(c as usize - '0' as usize))
                    .filter(|&v| v < UNBOUNDED)
                    .ok_or(CompileError::BoundOverflow { pos: i })?;
                digits += 1;
            }
            Some(&c) if c == close && digits > 0 => return Ok((value, i + 1)),
            Some(&c) => return Err(CompileError::InvalidQuantifier { pos: i, found: c }),
        }
        i += 1;
    }
}
