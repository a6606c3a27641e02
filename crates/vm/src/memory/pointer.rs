//! Defines the [`Pointer`] type.

use std::fmt;

use groudon_felt::Felt;
use num_traits::ToPrimitive;

use crate::error::Error;

/// An address within the memory of the Cairo virtual machine.
///
/// Memory is split into *segments*, and a pointer is the pair of a segment
/// index and an offset into that segment. Segments with a negative index are
/// *temporary*: they are carved out during the run and folded back into the
/// positive index space by the final relocation pass.
///
/// # Invariants
///
/// The offset never leaves `[0, usize::MAX]`: every arithmetic helper is
/// checked and fails with [`Error::OffsetExceeded`] instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    /// The index of the segment this pointer lives in.
    ///
    /// This can be thought of as the provenance of the pointer. Negative
    /// indices denote temporary segments.
    pub segment: isize,
    /// The offset within the segment.
    pub offset: usize,
}

impl Pointer {
    /// Creates a new [`Pointer`] from a segment index and an offset.
    #[inline]
    pub const fn new(segment: isize, offset: usize) -> Self {
        Self { segment, offset }
    }

    /// Returns whether this pointer references a temporary segment.
    #[inline]
    pub const fn is_temporary(&self) -> bool {
        self.segment < 0
    }

    /// Moves the pointer forward by `rhs` cells.
    pub fn add_uint(self, rhs: usize) -> Result<Self, Error> {
        let offset = self
            .offset
            .checked_add(rhs)
            .ok_or(Error::OffsetExceeded(self))?;
        Ok(Self::new(self.segment, offset))
    }

    /// Moves the pointer backward by `rhs` cells.
    pub fn sub_uint(self, rhs: usize) -> Result<Self, Error> {
        let offset = self
            .offset
            .checked_sub(rhs)
            .ok_or(Error::OffsetExceeded(self))?;
        Ok(Self::new(self.segment, offset))
    }

    /// Moves the pointer by a signed amount of cells.
    pub fn add_int(self, rhs: isize) -> Result<Self, Error> {
        let offset = self
            .offset
            .checked_add_signed(rhs)
            .ok_or(Error::OffsetExceeded(self))?;
        Ok(Self::new(self.segment, offset))
    }

    /// Moves the pointer forward by a field element amount of cells.
    ///
    /// The field element must fit in a `usize` for the operation to make
    /// sense; anything larger fails with [`Error::OffsetExceeded`].
    pub fn add_felt(self, rhs: &Felt) -> Result<Self, Error> {
        let rhs = rhs.to_usize().ok_or(Error::OffsetExceeded(self))?;
        self.add_uint(rhs)
    }

    /// Returns the distance between `self` and `other`.
    ///
    /// Both pointers must reference the same segment, and `other` must not be
    /// past `self`.
    pub fn sub(self, other: Self) -> Result<usize, Error> {
        if self.segment != other.segment {
            return Err(Error::InvalidSub(self, other));
        }
        self.offset
            .checked_sub(other.offset)
            .ok_or(Error::OffsetExceeded(self))
    }
}

impl From<(isize, usize)> for Pointer {
    #[inline]
    fn from((segment, offset): (isize, usize)) -> Self {
        Self::new(segment, offset)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.offset)
    }
}
