//! Defines the [`Value`] type.

use std::fmt;

use groudon_felt::Felt;
use num_traits::ToPrimitive;

use crate::error::Error;

use super::Pointer;

/// A value that may be stored in a memory cell or used as an operand.
///
/// Every cell of the virtual machine's memory holds either a plain field
/// element or an address within some segment. Operand deduction and the
/// result logic of instructions are defined over this union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// A field element with no provenance information.
    Scalar(Felt),
    /// An address within a specific segment.
    Pointer(Pointer),
}

impl Value {
    /// Returns the inner field element, failing when the value is an address.
    pub fn into_felt(self) -> Result<Felt, Error> {
        match self {
            Self::Scalar(felt) => Ok(felt),
            Self::Pointer(pointer) => Err(Error::ExpectedInteger(pointer)),
        }
    }

    /// Returns the inner address, failing when the value is a field element.
    pub fn into_pointer(self) -> Result<Pointer, Error> {
        match self {
            Self::Pointer(pointer) => Ok(pointer),
            Self::Scalar(felt) => Err(Error::ExpectedRelocatable(felt)),
        }
    }

    /// The inner field element, if any.
    #[inline]
    pub const fn scalar(&self) -> Option<&Felt> {
        match self {
            Self::Scalar(felt) => Some(felt),
            Self::Pointer(_) => None,
        }
    }

    /// The inner address, if any.
    #[inline]
    pub const fn pointer(&self) -> Option<&Pointer> {
        match self {
            Self::Pointer(pointer) => Some(pointer),
            Self::Scalar(_) => None,
        }
    }

    /// Whether the value is the field element zero. Addresses are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Scalar(felt) => felt.is_zero(),
            Self::Pointer(_) => false,
        }
    }

    /// Adds two values.
    ///
    /// A scalar can be added to anything; adding two addresses is undefined
    /// and fails with [`Error::RelocatableAdd`].
    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(Self::Scalar(*a + *b)),
            (Self::Pointer(p), Self::Scalar(f)) | (Self::Scalar(f), Self::Pointer(p)) => {
                Ok(Self::Pointer(p.add_felt(f)?))
            }
            (Self::Pointer(_), Self::Pointer(_)) => Err(Error::RelocatableAdd),
        }
    }

    /// Subtracts two values.
    ///
    /// Subtracting two addresses of the same segment yields their distance as
    /// a scalar; subtracting an address from a scalar is undefined.
    pub fn sub(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(Self::Scalar(*a - *b)),
            (Self::Pointer(p), Self::Scalar(f)) => {
                let rhs = f.to_usize().ok_or(Error::OffsetExceeded(*p))?;
                Ok(Self::Pointer(p.sub_uint(rhs)?))
            }
            (Self::Pointer(a), Self::Pointer(b)) => Ok(Self::Scalar(Felt::from(a.sub(*b)?))),
            (Self::Scalar(_), Self::Pointer(p)) => Err(Error::ExpectedInteger(*p)),
        }
    }

    /// Multiplies two values. Only defined over scalars.
    pub fn mul(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(Self::Scalar(*a * *b)),
            _ => Err(Error::PureValue),
        }
    }

    /// Divides two values in the field. Only defined over scalars.
    pub fn div(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => {
                let quotient = a.div(b).map_err(|_| Error::DivisionByZero)?;
                Ok(Self::Scalar(quotient))
            }
            _ => Err(Error::PureValue),
        }
    }
}

impl From<Felt> for Value {
    #[inline]
    fn from(value: Felt) -> Self {
        Self::Scalar(value)
    }
}

impl From<Pointer> for Value {
    #[inline]
    fn from(value: Pointer) -> Self {
        Self::Pointer(value)
    }
}

impl From<u64> for Value {
    #[inline]
    fn from(value: u64) -> Self {
        Self::Scalar(Felt::from(value))
    }
}

impl PartialEq<Pointer> for Value {
    fn eq(&self, other: &Pointer) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Pointer(pointer) => pointer == other,
        }
    }
}

impl PartialEq<Felt> for Value {
    fn eq(&self, other: &Felt) -> bool {
        match self {
            Self::Scalar(felt) => felt == other,
            Self::Pointer(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(felt) => fmt::Display::fmt(felt, f),
            Self::Pointer(pointer) => fmt::Display::fmt(pointer, f),
        }
    }
}
