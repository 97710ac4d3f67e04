// Copyright 2025 John Brosnihan
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
//! Work partitioning for distributed ranks
//!
//! Items (bodies or body pairs) are split into contiguous ranges, one per
//! rank, in rank order. Every rank gets `total / parts` items and the last
//! rank also takes the remainder, so concatenating the ranges in rank
//! order always reproduces `0..total`.

use std::ops::Range;

/// Contiguous split of `0..total` into `parts` ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    total: usize,
    parts: usize,
}

impl Partition {
    /// Split `total` items over `parts` ranks
    ///
    /// # Panics
    ///
    /// Panics if `parts` is zero
    pub fn contiguous(total: usize, parts: usize) -> Self {
        assert!(parts > 0, "Partition needs at least one part");
        Partition { total, parts }
    }

    /// Number of items
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of ranges
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Items every rank gets before the remainder
    pub fn base(&self) -> usize {
        self.total / self.parts
    }

    /// Extra items carried by the last rank
    pub fn remainder(&self) -> usize {
        self.total % self.parts
    }

    /// Range of items owned by `part`
    pub fn range(&self, part: usize) -> Range<usize> {
        debug_assert!(part < self.parts);
        let start = part * self.base();
        let end = if part + 1 == self.parts {
            self.total
        } else {
            start + self.base()
        };
        start..end
    }

    /// Log a warning when the split is uneven
    pub fn warn_if_uneven(&self, items: &str) {
        if self.remainder() != 0 {
            tracing::warn!(
                total = self.total,
                ranks = self.parts,
                extra = self.remainder(),
                "{} do not divide evenly; the last rank takes the remainder",
                items
            );
        }
    }
}

/// Number of unordered pairs among `n` bodies
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Body pair `(a, b)` with `a > b` for linear pair index `k`
///
/// Pairs are numbered row by row through the lower triangle:
/// `(1,0), (2,0), (2,1), (3,0), ...`, so `k = a(a-1)/2 + b`.
pub fn decode_pair(k: usize) -> (usize, usize) {
    let mut a = ((1.0 + (1.0 + 8.0 * k as f64).sqrt()) / 2.0) as usize;
    // correct float rounding for very large k
    while a * (a - 1) / 2 > k {
        a -= 1;
    }
    while (a + 1) * a / 2 <= k {
        a += 1;
    }
    (a, k - a * (a - 1) / 2)
}

/// Iterator over the pairs whose linear indices fall in a range
#[derive(Debug, Clone)]
pub struct Pairs {
    a: usize,
    b: usize,
    remaining: usize,
}

impl Iterator for Pairs {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.remaining == 0 {
            return None;
        }
        let pair = (self.a, self.b);
        self.remaining -= 1;
        self.b += 1;
        if self.b == self.a {
            self.a += 1;
            self.b = 0;
        }
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Pairs {}

/// Pairs with linear indices in `range`, in index order
pub fn pairs(range: Range<usize>) -> Pairs {
    let (a, b) = if range.is_empty() { (1, 0) } else { decode_pair(range.start) };
    Pairs {
        a,
        b,
        remaining: range.len(),
    }
}
