//! Half-open character ranges.
//!
//! Every position in visor (suggestions, committed annotations, learning
//! records, the rendering window) is an [`Offset`]: a character range
//! `[begin, end)`.
//!
//! ```text
//! Text:   "Dies ist ein Testtext"
//!          0123456789...
//!
//!   [0,4)  "Dies"
//!   [3,8)  "s ist"     overlaps [0,4): 0 < 8 && 3 < 4
//!   [4,8)  " ist"      touches [0,4) but does NOT overlap it
//! ```
//!
//! Adjacent offsets never overlap. Equality is exact begin/end match, which
//! is what learning records use to identify a position.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A half-open character range `[begin, end)`.
///
/// The invariant `begin <= end` is checked at construction and on
/// deserialization, so every `Offset` in the system is well-formed.
///
/// Offsets order by `(begin, end)`, which lets them key ordered maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawOffset")]
pub struct Offset {
    begin: usize,
    end: usize,
}

#[derive(Deserialize)]
struct RawOffset {
    begin: usize,
    end: usize,
}

impl TryFrom<RawOffset> for Offset {
    type Error = Error;

    fn try_from(raw: RawOffset) -> Result<Self> {
        Offset::new(raw.begin, raw.end)
    }
}

impl Offset {
    /// Create an offset, rejecting `end < begin`.
    ///
    /// # Example
    /// ```
    /// use visor_core::Offset;
    ///
    /// let offset = Offset::new(5, 10).unwrap();
    /// assert_eq!(offset.len(), 5);
    /// assert!(Offset::new(10, 5).is_err());
    /// ```
    pub fn new(begin: usize, end: usize) -> Result<Self> {
        if end < begin {
            return Err(Error::InvalidOffset { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// An empty offset at `position`.
    #[must_use]
    pub const fn point(position: usize) -> Self {
        Self {
            begin: position,
            end: position,
        }
    }

    /// Start (inclusive).
    #[must_use]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// End (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }

    /// True if the offset covers no characters.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// `a.begin < b.end && b.begin < a.end`.
    ///
    /// Symmetric. Adjacent offsets (`[0,1)` and `[1,2)`) do not overlap. An
    /// empty offset overlaps a range that strictly contains its position
    /// (`[5,5)` overlaps `[0,10)`), but not a range it merely touches, and
    /// never another empty offset.
    #[must_use]
    pub const fn overlaps(&self, other: &Offset) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// True if `position` lies inside `[begin, end)`.
    #[must_use]
    pub const fn contains(&self, position: usize) -> bool {
        self.begin <= position && position < self.end
    }

    /// True if `other` lies completely inside this offset.
    #[must_use]
    pub const fn covers(&self, other: &Offset) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Smallest offset covering both.
    #[must_use]
    pub fn union(&self, other: &Offset) -> Offset {
        Offset {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }

    /// As a standard range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

impl TryFrom<Range<usize>> for Offset {
    type Error = Error;

    fn try_from(range: Range<usize>) -> Result<Self> {
        Offset::new(range.start, range.end)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.begin, self.end)
    }
}

// =============================================================================
// Tests
// =============================================================================
