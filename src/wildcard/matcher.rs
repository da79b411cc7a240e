//! Wildcard matching
//!
//! Runs of `Any` atoms are matched non-greedily: the shortest repetition
//! for which the rest of the pattern matches wins.
//!
//! Matching is iterative. Literals and fixed-width runs are consumed in
//! place; each variable run pushes a backtrack frame onto a heap stack.
//! States `(atom, position)` whose every continuation failed are recorded
//! and never explored again, so a match costs at most O(atoms * len^2).

use std::collections::HashSet;

use super::{Atom, Wildcard, UNBOUNDED};

impl Wildcard {
    /// Check whether the whole token matches.
    pub fn matches(&self, token: &str) -> bool {
        if self.simple {
            return token == self.query;
        }
        let chars: Vec<char> = token.chars().collect();
        search(&self.atoms, &self.bounds, &chars)
    }

    /// Match a raw token; invalid UTF-8 is replaced before matching.
    pub fn matches_bytes(&self, token: &[u8]) -> bool {
        if self.simple {
            return token == self.query.as_bytes();
        }
        self.matches(&String::from_utf8_lossy(token))
    }

    /// Longest token (in code points) the pattern can match, or None if
    /// it contains an unbounded run. Finite sums saturate at
    /// `usize::MAX - 1`.
    pub fn max_match_length(&self) -> Option<usize> {
        match self.bounds.first() {
            Some(&(_, UNBOUNDED)) => None,
            Some(&(_, max)) => Some(max),
            None => Some(0),
        }
    }

    /// Literals shared by every match, up to the first wildcard atom
    pub fn literal_prefix(&self) -> String {
        self.atoms
            .iter()
            .map_while(|atom| match *atom {
                Atom::Literal(c) => Some(c),
                Atom::Any { .. } => None,
            })
            .collect()
    }
}

// ============================================================================
// Length Bounds
// ============================================================================

fn add_max(a: usize, b: usize) -> usize {
    if a == UNBOUNDED || b == UNBOUNDED {
        UNBOUNDED
    } else {
        a.saturating_add(b).min(UNBOUNDED - 1)
    }
}

/// `bounds[i]` is the (min, max) token length matched by `atoms[i..]`;
/// the last entry, for the empty suffix, is `(0, 0)`.
pub(super) fn suffix_bounds(atoms: &[Atom]) -> Vec<(usize, usize)> {
    let mut bounds: Vec<(usize, usize)> = vec![(0, 0); atoms.len() + 1];
    for (i, atom) in atoms.iter().enumerate().rev() {
        let (lo, hi) = bounds[i + 1];
        let (min, max) = match *atom {
            Atom::Literal(_) => (1, 1),
            Atom::Any { min, max } => (min, max),
        };
        bounds[i] = (lo.saturating_add(min), add_max(hi, max));
    }
    bounds
}

// ============================================================================
// Backtracking Search
// ============================================================================

/// Dense bitmap up to this many `(atom, position)` cells, hash set above
const DENSE_STATES: usize = 1 << 24;

/// States known not to reach a match
struct FailedStates {
    stride: usize,
    dense: bool,
    bits: Vec<u64>,
    sparse: HashSet<(usize, usize)>,
}

impl FailedStates {
    fn new(atoms: usize, token_len: usize) -> Self {
        let stride = token_len + 1;
        FailedStates {
            stride,
            dense: atoms.saturating_mul(stride) <= DENSE_STATES,
            bits: Vec::new(),
            sparse: HashSet::new(),
        }
    }

    fn contains(&self, qi: usize, ti: usize) -> bool {
        if self.dense {
            let cell = qi * self.stride + ti;
            self.bits
                .get(cell / 64)
                .is_some_and(|word| *word & (1u64 << (cell % 64)) != 0)
        } else {
            self.sparse.contains(&(qi, ti))
        }
    }

    fn insert(&mut self, qi: usize, ti: usize) {
        if self.dense {
            let cell = qi * self.stride + ti;
            if self.bits.len() <= cell / 64 {
                self.bits.resize(cell / 64 + 1, 0);
            }
            self.bits[cell / 64] |= 1u64 << (cell % 64);
        } else {
            self.sparse.insert((qi, ti));
        }
    }
}

/// Pending choice for a variable run: `atoms[qi]` starts at token
/// position `ti` and currently spans `n` characters.
#[derive(Debug, Clone, Copy)]
struct Frame {
    qi: usize,
    ti: usize,
    n: usize,
    max: usize,
}

enum Step {
    Matched,
    Failed,
    /// Variable run `atoms[qi]` reached at token position `ti`
    Branch { qi: usize, ti: usize, min: usize, max: usize },
}

/// Consume atoms from `qi` until the next variable run or the end.
fn advance(atoms: &[Atom], token: &[char], mut qi: usize, mut ti: usize) -> Step {
    while let Some(&atom) = atoms.get(qi) {
        match atom {
            Atom::Literal(c) => {
                if token.get(ti) != Some(&c) {
                    return Step::Failed;
                }
                ti += 1;
            }
            Atom::Any { min, max } if min == max => {
                if token.len() - ti < min {
                    return Step::Failed;
                }
                ti += min;
            }
            Atom::Any { min, max } => return Step::Branch { qi, ti, min, max },
        }
        qi += 1;
    }
    if ti == token.len() {
        Step::Matched
    } else {
        Step::Failed
    }
}

/// Widen the innermost run that still has room; exhausted frames are
/// recorded as failed and dropped.
fn backtrack(frames: &mut Vec<Frame>, failed: &mut FailedStates, len: usize) -> Option<Frame> {
    while let Some(top) = frames.last_mut() {
        if top.n < top.max && top.ti + top.n < len {
            top.n += 1;
            return Some(*top);
        }
        failed.insert(top.qi, top.ti);
        frames.pop();
    }
    None
}

fn search(atoms: &[Atom], bounds: &[(usize, usize)], token: &[char]) -> bool {
    let len = token.len();
    let mut frames: Vec<Frame> = Vec::new();
    let mut failed = FailedStates::new(atoms.len(), len);
    let mut step = advance(atoms, token, 0, 0);

    loop {
        step = match step {
            Step::Matched => return true,
            Step::Branch { qi, ti, min, max }
                if (bounds[qi].0..=bounds[qi].1).contains(&(len - ti))
                    && !failed.contains(qi, ti) =>
            {
                // Last atom: the bounds check above is exact
                if qi + 1 == atoms.len() {
                    return true;
                }
                frames.push(Frame { qi, ti, n: min, max });
                advance(atoms, token, qi + 1, ti + min)
            }
            Step::Branch { .. } | Step::Failed => {
                match backtrack(&mut frames, &mut failed, len) {
                    Some(frame) => advance(atoms, token, frame.qi + 1, frame.ti + frame.n),
                    None => return false,
                }
            }
        };
    }
}
