//! Arithmetic over the Starknet prime field.
//!
//! The field is `F_p` with `p = 2^251 + 17 * 2^192 + 1`. Every [`Felt`] is a
//! canonical representative in `[0, p)`; elements are kept internally in
//! Montgomery form (radix `2^256`) so that multiplication costs a single
//! Montgomery reduction, but nothing of that representation leaks through the
//! public API.
//!
//! # Canonicity
//!
//! Conversions from integers and byte strings reduce modulo `p`, so a [`Felt`]
//! can never hold a non-canonical value. Equality, ordering and serialization
//! are all defined over canonical representatives.

#![warn(missing_docs, missing_debug_implementations)]

mod limbs;

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, ToPrimitive, Zero};

use crate::limbs::Limbs;

/// The Starknet prime, `2^251 + 17 * 2^192 + 1`.
const MODULUS: Limbs = [1, 0, 0, 0x0800000000000011];

/// `(p - 1) / 2`, the exponent of the Euler criterion.
const HALF_MODULUS: Limbs = [0, 0, 0x8000000000000000, 0x0400000000000008];

/// `2^256 mod p`, i.e. the Montgomery form of one.
const R: Limbs = [
    0xffffffffffffffe1,
    0xffffffffffffffff,
    0xffffffffffffffff,
    0x07fffffffffffdf0,
];

/// `2^512 mod p`, used to convert into Montgomery form.
const R2: Limbs = [
    0xfffffd737e000401,
    0x00000001330fffff,
    0xffffffffff6f8000,
    0x07ffd4ab5e008810,
];

/// `-p^-1 mod 2^64`. Since `p = 1 mod 2^64` this is simply `2^64 - 1`.
const MU: u64 = u64::MAX;

/// The odd part of `p - 1`: `p - 1 = 2^192 * (2^59 + 17)`.
const SQRT_Q: Limbs = [0x0800000000000011, 0, 0, 0];

/// `(q + 1) / 2` for the odd part `q` above.
const SQRT_Q_PLUS_ONE_HALF: Limbs = [0x0400000000000009, 0, 0, 0];

/// The 2-adicity of `p - 1`.
const TWO_ADICITY: u32 = 192;

/// An error produced by a fallible field operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeltError {
    /// Attempted to divide by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The element is not a quadratic residue, so it has no square root.
    #[error("the field element has no square root")]
    SqrtNotExist,
    /// A hexadecimal string could not be parsed into a field element.
    #[error("invalid hexadecimal string: {0:?}")]
    InvalidHexString(String),
}

/// An element of the Starknet prime field.
///
/// The value is stored in Montgomery form; construct one with the `From`
/// conversions, [`Felt::from_hex`] or the byte-string constructors.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Felt(Limbs);

impl Felt {
    /// The additive identity.
    pub const ZERO: Felt = Felt([0; 4]);

    /// The multiplicative identity.
    pub const ONE: Felt = Felt(R);

    /// The number of significant bits of a canonical representative.
    pub const BITS: usize = 252;

    /// Parses a field element from a hexadecimal string, with or without a
    /// leading `0x`.
    ///
    /// Values of up to 64 hex digits are accepted and reduced modulo `p`.
    pub fn from_hex(s: &str) -> Result<Felt, FeltError> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

        if digits.is_empty() || digits.len() > 64 {
            return Err(FeltError::InvalidHexString(s.to_owned()));
        }

        let mut raw: Limbs = [0; 4];
        for (i, c) in digits.bytes().rev().enumerate() {
            let nibble = match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => return Err(FeltError::InvalidHexString(s.to_owned())),
            };
            raw[i / 16] |= (nibble as u64) << ((i % 16) * 4);
        }

        Ok(Felt::from_raw(raw))
    }

    /// Builds a field element from a 32-byte little-endian string, reducing
    /// modulo `p`.
    pub fn from_bytes_le(bytes: &[u8; 32]) -> Felt {
        let mut raw: Limbs = [0; 4];
        for (i, limb) in raw.iter_mut().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(buf);
        }
        Felt::from_raw(raw)
    }

    /// Builds a field element from a 32-byte big-endian string, reducing
    /// modulo `p`.
    pub fn from_bytes_be(bytes: &[u8; 32]) -> Felt {
        let mut le = *bytes;
        le.reverse();
        Felt::from_bytes_le(&le)
    }

    /// Returns the canonical representative as a 32-byte little-endian string.
    pub fn to_bytes_le(&self) -> [u8; 32] {
        let rep = self.representative();
        let mut out = [0u8; 32];
        for (i, limb) in rep.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    /// Returns the canonical representative as a 32-byte big-endian string.
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let mut out = self.to_bytes_le();
        out.reverse();
        out
    }

    /// Returns the canonical representative as little-endian 64-bit limbs.
    pub fn representative(&self) -> [u64; 4] {
        // Montgomery reduction of the raw limbs: multiplying by one converts
        // out of Montgomery form.
        mont_mul(&self.0, &[1, 0, 0, 0])
    }

    /// Returns the low 252 bits of the canonical representative, little-endian.
    pub fn to_bits_le(&self) -> [bool; Self::BITS] {
        let rep = self.representative();
        let mut out = [false; Self::BITS];
        for (i, bit) in out.iter_mut().enumerate() {
            *bit = limbs::bit(&rep, i);
        }
        out
    }

    /// Whether this is the additive identity.
    pub fn is_zero(&self) -> bool {
        limbs::is_zero(&self.0)
    }

    /// Whether this is the multiplicative identity.
    pub fn is_one(&self) -> bool {
        self.0 == R
    }

    /// `self * self`.
    pub fn square(&self) -> Felt {
        Felt(mont_mul(&self.0, &self.0))
    }

    /// Raises `self` to the power `exp`.
    pub fn pow(&self, exp: u128) -> Felt {
        self.pow_limbs(&[exp as u64, (exp >> 64) as u64, 0, 0])
    }

    /// Square-and-multiply over a 256-bit exponent.
    fn pow_limbs(&self, exp: &Limbs) -> Felt {
        let mut res = Felt::ONE;
        for i in (0..256).rev() {
            res = res.square();
            if limbs::bit(exp, i) {
                res = res * *self;
            }
        }
        res
    }

    /// The multiplicative inverse, or `None` for zero.
    ///
    /// Uses the binary extended GCD over the Montgomery representation, so no
    /// conversion round trip is paid. Not constant-time.
    pub fn inv(&self) -> Option<Felt> {
        if self.is_zero() {
            return None;
        }

        let one: Limbs = [1, 0, 0, 0];
        let mut u = self.0;
        let mut v = MODULUS;
        // Starting from R^2 instead of 1 makes the result land back in
        // Montgomery form: (a R)^-1 R^2 = a^-1 R (mod p).
        let mut b = Felt(R2);
        let mut c = Felt::ZERO;

        while u != one && v != one {
            while limbs::is_even(&u) {
                u = limbs::shr1(&u, false);
                if limbs::is_even(&b.0) {
                    b.0 = limbs::shr1(&b.0, false);
                } else {
                    let (sum, carry) = limbs::add(&b.0, &MODULUS);
                    b.0 = limbs::shr1(&sum, carry);
                }
            }
            while limbs::is_even(&v) {
                v = limbs::shr1(&v, false);
                if limbs::is_even(&c.0) {
                    c.0 = limbs::shr1(&c.0, false);
                } else {
                    let (sum, carry) = limbs::add(&c.0, &MODULUS);
                    c.0 = limbs::shr1(&sum, carry);
                }
            }
            if limbs::cmp(&v, &u) == Ordering::Less {
                u = limbs::sub(&u, &v).0;
                b = b - c;
            } else {
                v = limbs::sub(&v, &u).0;
                c = c - b;
            }
        }

        Some(if u == one { b } else { c })
    }

    /// `self / rhs`, failing with [`FeltError::DivisionByZero`] when `rhs` is
    /// zero.
    pub fn div(&self, rhs: &Felt) -> Result<Felt, FeltError> {
        let inv = rhs.inv().ok_or(FeltError::DivisionByZero)?;
        Ok(*self * inv)
    }

    /// The Legendre symbol: `1` for a nonzero quadratic residue, `-1` for a
    /// non-residue, `0` for zero.
    pub fn legendre(&self) -> i8 {
        if self.is_zero() {
            return 0;
        }
        if self.pow_limbs(&HALF_MODULUS) == Felt::ONE {
            1
        } else {
            -1
        }
    }

    /// A square root of `self`, or `None` when none exists.
    ///
    /// Tonelli-Shanks for `p - 1 = 2^192 * (2^59 + 17)`, with 3 as the
    /// quadratic non-residue. Of the two roots, the one with the smaller
    /// representative is returned.
    pub fn sqrt(&self) -> Option<Felt> {
        if self.is_zero() {
            return Some(Felt::ZERO);
        }
        if self.legendre() != 1 {
            return None;
        }

        let mut m = TWO_ADICITY;
        let mut c = Felt::from(3u64).pow_limbs(&SQRT_Q);
        let mut t = self.pow_limbs(&SQRT_Q);
        let mut r = self.pow_limbs(&SQRT_Q_PLUS_ONE_HALF);

        while t != Felt::ONE {
            let mut i = 0u32;
            let mut probe = t;
            while probe != Felt::ONE {
                probe = probe.square();
                i += 1;
            }

            let mut b = c;
            for _ in 0..m - i - 1 {
                b = b.square();
            }

            m = i;
            c = b.square();
            t = t * c;
            r = r * b;
        }

        Some(if r.is_lexographically_largest() { -r } else { r })
    }

    /// Whether the representative is larger than `(p - 1) / 2`, i.e. whether
    /// `self` is the "negative" of the pair `{x, -x}`.
    pub fn is_lexographically_largest(&self) -> bool {
        limbs::cmp(&self.representative(), &HALF_MODULUS) == Ordering::Greater
    }

    /// Converts raw (non-Montgomery) limbs, reducing modulo `p`.
    fn from_raw(raw: Limbs) -> Felt {
        Felt(mont_mul(&raw, &R2))
    }
}

/// CIOS Montgomery multiplication: computes `a * b * 2^-256 mod p`.
///
/// Inputs may be any 256-bit integers as long as one of them is below `p`;
/// the result is canonical.
fn mont_mul(a: &Limbs, b: &Limbs) -> Limbs {
    let mut t = [0u64; 6];

    for &bi in b.iter() {
        // t += a * bi
        let mut carry = 0u128;
        for j in 0..4 {
            let s = t[j] as u128 + a[j] as u128 * bi as u128 + carry;
            t[j] = s as u64;
            carry = s >> 64;
        }
        let s = t[4] as u128 + carry;
        t[4] = s as u64;
        t[5] = (s >> 64) as u64;

        // t += m * p, then shift one limb down. The low limb is annihilated
        // by construction of m.
        let m = t[0].wrapping_mul(MU);
        let s = t[0] as u128 + m as u128 * MODULUS[0] as u128;
        let mut carry = s >> 64;
        for j in 1..4 {
            let s = t[j] as u128 + m as u128 * MODULUS[j] as u128 + carry;
            t[j - 1] = s as u64;
            carry = s >> 64;
        }
        let s = t[4] as u128 + carry;
        t[3] = s as u64;
        t[4] = t[5] + (s >> 64) as u64;
        t[5] = 0;
    }

    let mut out = [t[0], t[1], t[2], t[3]];
    if t[4] != 0 || limbs::cmp(&out, &MODULUS) != Ordering::Less {
        out = limbs::sub(&out, &MODULUS).0;
    }
    out
}

impl Add for Felt {
    type Output = Felt;

    fn add(self, rhs: Felt) -> Felt {
        let (sum, carry) = limbs::add(&self.0, &rhs.0);
        if carry || limbs::cmp(&sum, &MODULUS) != Ordering::Less {
            Felt(limbs::sub(&sum, &MODULUS).0)
        } else {
            Felt(sum)
        }
    }
}

impl Sub for Felt {
    type Output = Felt;

    fn sub(self, rhs: Felt) -> Felt {
        let (diff, borrow) = limbs::sub(&self.0, &rhs.0);
        if borrow {
            Felt(limbs::add(&diff, &MODULUS).0)
        } else {
            Felt(diff)
        }
    }
}

impl Mul for Felt {
    type Output = Felt;

    fn mul(self, rhs: Felt) -> Felt {
        Felt(mont_mul(&self.0, &rhs.0))
    }
}

impl Neg for Felt {
    type Output = Felt;

    fn neg(self) -> Felt {
        Felt::ZERO - self
    }
}

impl AddAssign for Felt {
    fn add_assign(&mut self, rhs: Felt) {
        *self = *self + rhs;
    }
}

impl SubAssign for Felt {
    fn sub_assign(&mut self, rhs: Felt) {
        *self = *self - rhs;
    }
}

impl MulAssign for Felt {
    fn mul_assign(&mut self, rhs: Felt) {
        *self = *self * rhs;
    }
}

impl Zero for Felt {
    fn zero() -> Felt {
        Felt::ZERO
    }

    fn is_zero(&self) -> bool {
        Felt::is_zero(self)
    }
}

impl One for Felt {
    fn one() -> Felt {
        Felt::ONE
    }

    fn is_one(&self) -> bool {
        Felt::is_one(self)
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Felt {
                fn from(value: $t) -> Felt {
                    Felt::from_raw([value as u64, 0, 0, 0])
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<u128> for Felt {
    fn from(value: u128) -> Felt {
        Felt::from_raw([value as u64, (value >> 64) as u64, 0, 0])
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Felt {
                fn from(value: $t) -> Felt {
                    if value < 0 {
                        -Felt::from(value.unsigned_abs() as u128)
                    } else {
                        Felt::from(value as u128)
                    }
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64, i128, isize);

impl ToPrimitive for Felt {
    fn to_u64(&self) -> Option<u64> {
        let rep = self.representative();
        if rep[1] == 0 && rep[2] == 0 && rep[3] == 0 {
            Some(rep[0])
        } else {
            None
        }
    }

    fn to_i64(&self) -> Option<i64> {
        self.to_u64().and_then(|v| i64::try_from(v).ok())
    }

    fn to_u128(&self) -> Option<u128> {
        let rep = self.representative();
        if rep[2] == 0 && rep[3] == 0 {
            Some((rep[1] as u128) << 64 | rep[0] as u128)
        } else {
            None
        }
    }

    fn to_i128(&self) -> Option<i128> {
        self.to_u128().and_then(|v| i128::try_from(v).ok())
    }
}

impl PartialOrd for Felt {
    fn partial_cmp(&self, other: &Felt) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Felt {
    fn cmp(&self, other: &Felt) -> Ordering {
        limbs::cmp(&self.representative(), &other.representative())
    }
}

/// Writes the canonical representative as `0x`-prefixed lowercase hex.
fn write_hex(rep: &Limbs, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut seen_nonzero = false;
    f.write_str("0x")?;
    for limb in rep.iter().rev() {
        if seen_nonzero {
            write!(f, "{limb:016x}")?;
        } else if *limb != 0 {
            seen_nonzero = true;
            write!(f, "{limb:x}")?;
        }
    }
    if !seen_nonzero {
        f.write_str("0")?;
    }
    Ok(())
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(&self.representative(), f)
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(&self.representative(), f)
    }
}

impl fmt::LowerHex for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(&self.representative(), f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn felt(hex: &str) -> Felt {
        Felt::from_hex(hex).unwrap()
    }

    const MODULUS_MINUS_ONE: &str =
        "0x800000000000011000000000000000000000000000000000000000000000000";

    #[test]
    fn additive_wraparound() {
        assert_eq!(felt(MODULUS_MINUS_ONE) + Felt::ONE, Felt::ZERO);
        assert_eq!(Felt::ZERO - Felt::ONE, felt(MODULUS_MINUS_ONE));
        assert_eq!(-Felt::ONE, felt(MODULUS_MINUS_ONE));
    }

    #[test]
    fn multiplication_against_known_product() {
        // 7 * (1/10) = 7/10
        let seven_tenths = Felt::from(7u64).div(&Felt::from(10u64)).unwrap();
        assert_eq!(
            seven_tenths,
            felt("0x26666666666666b800000000000000000000000000000000000000000000001")
        );
        assert_eq!(seven_tenths * Felt::from(10u64), Felt::from(7u64));
    }

    #[test]
    fn inverse_of_ten_matches_reference_value() {
        let inv = Felt::from(10u64).inv().unwrap();
        assert_eq!(
            inv,
            felt("0x733333333333342800000000000000000000000000000000000000000000001")
        );
        assert_eq!(inv * Felt::from(10u64), Felt::ONE);
    }

    #[test]
    fn inverse_of_zero_is_absent() {
        assert_eq!(Felt::ZERO.inv(), None);
    }

    #[test]
    fn inverse_round_trips() {
        for v in [1u64, 2, 3, 0xdead_beef, u64::MAX] {
            let x = Felt::from(v);
            assert_eq!(x * x.inv().unwrap(), Felt::ONE, "inv({v})");
        }
        let big = felt(MODULUS_MINUS_ONE);
        assert_eq!(big * big.inv().unwrap(), Felt::ONE);
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(
            Felt::from(3u64).div(&Felt::ZERO),
            Err(FeltError::DivisionByZero)
        );
    }

    #[test]
    fn legendre_symbols() {
        assert_eq!(Felt::from(10u64).legendre(), 1);
        assert_eq!(Felt::from(135u64).legendre(), -1);
        assert_eq!(Felt::ZERO.legendre(), 0);
        // 3 is the non-residue used by the square root routine.
        assert_eq!(Felt::from(3u64).legendre(), -1);
    }

    #[test]
    fn sqrt_of_residue() {
        let root = Felt::from(10u64).sqrt().unwrap();
        assert_eq!(root.square(), Felt::from(10u64));
        assert_eq!(
            root,
            felt("0x2a8dc760299e9985e12d654f62727104f84f2ca55ce856be087099a0e6e76f1")
        );
        assert!(!root.is_lexographically_largest());
    }

    #[test]
    fn sqrt_of_non_residue_is_absent() {
        assert_eq!(Felt::from(135u64).sqrt(), None);
    }

    #[test]
    fn sqrt_of_square_returns_smaller_root() {
        for v in [2u64, 5, 1234, 0xffff_ffff] {
            let x = Felt::from(v);
            let root = x.square().sqrt().unwrap();
            assert!(root == x || root == -x, "sqrt({v}^2)");
            assert!(!root.is_lexographically_largest());
        }
        assert_eq!(Felt::ZERO.sqrt(), Some(Felt::ZERO));
    }

    #[test]
    fn pow_matches_repeated_multiplication() {
        let three = Felt::from(3u64);
        assert_eq!(three.pow(0), Felt::ONE);
        assert_eq!(three.pow(1), three);
        assert_eq!(three.pow(5), Felt::from(243u64));
        assert_eq!(three.pow(64), three.pow(32) * three.pow(32));
    }

    #[test]
    fn bytes_le_round_trip() {
        for x in [
            Felt::ZERO,
            Felt::ONE,
            Felt::from(0x1234_5678_9abc_def0u64),
            felt(MODULUS_MINUS_ONE),
        ] {
            assert_eq!(Felt::from_bytes_le(&x.to_bytes_le()), x);
            assert_eq!(Felt::from_bytes_be(&x.to_bytes_be()), x);
        }
    }

    #[test]
    fn bytes_endianness() {
        let x = Felt::from(0x0102u64);
        let le = x.to_bytes_le();
        assert_eq!(le[0], 0x02);
        assert_eq!(le[1], 0x01);
        let be = x.to_bytes_be();
        assert_eq!(be[31], 0x02);
        assert_eq!(be[30], 0x01);
    }

    #[test]
    fn from_bytes_reduces_modulo_p() {
        // 2^255 - 1 is above p and must wrap around.
        let mut bytes = [0xffu8; 32];
        bytes[31] = 0x7f;
        assert_eq!(
            Felt::from_bytes_le(&bytes),
            felt("0x7ffffffffffff00fffffffffffffffffffffffffffffffffffffffffffffff0")
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            Felt::from_hex("0xzzzz"),
            Err(FeltError::InvalidHexString(_))
        ));
        assert!(matches!(Felt::from_hex(""), Err(FeltError::InvalidHexString(_))));
        // 65 hex digits do not fit in 256 bits.
        let too_long = format!("0x1{}", "0".repeat(64));
        assert!(matches!(
            Felt::from_hex(&too_long),
            Err(FeltError::InvalidHexString(_))
        ));
    }

    #[test]
    fn from_hex_accepts_prefix_and_case() {
        assert_eq!(felt("ff"), Felt::from(255u64));
        assert_eq!(felt("0xFF"), Felt::from(255u64));
        assert_eq!(felt("0XaB"), Felt::from(0xabu64));
    }

    #[test]
    fn signed_conversions() {
        assert_eq!(Felt::from(-1i64), felt(MODULUS_MINUS_ONE));
        assert_eq!(Felt::from(-10i32) + Felt::from(10u64), Felt::ZERO);
    }

    #[test]
    fn primitive_conversions() {
        assert_eq!(Felt::from(42u64).to_u64(), Some(42));
        assert_eq!(Felt::from(u64::MAX).to_u64(), Some(u64::MAX));
        assert_eq!(
            (Felt::from(u64::MAX) + Felt::ONE).to_u64(),
            None,
            "2^64 does not fit"
        );
        assert_eq!((Felt::from(u64::MAX) + Felt::ONE).to_u128(), Some(1u128 << 64));
        assert_eq!(Felt::from(-1i64).to_u64(), None);
    }

    #[test]
    fn ordering_is_over_representatives() {
        assert!(Felt::ZERO < Felt::ONE);
        assert!(Felt::from(2u64) < felt(MODULUS_MINUS_ONE));
        // -1 is the largest representative.
        assert!(Felt::from(-1i64) > Felt::from(u64::MAX));
    }

    #[test]
    fn lexographically_largest_boundary() {
        let half = felt("0x400000000000008800000000000000000000000000000000000000000000000");
        assert!(!half.is_lexographically_largest());
        assert!((half + Felt::ONE).is_lexographically_largest());
        assert!(!Felt::ZERO.is_lexographically_largest());
    }

    #[test]
    fn bits_le() {
        let bits = Felt::from(0b1011u64).to_bits_le();
        assert!(bits[0] && bits[1] && !bits[2] && bits[3]);
        assert!(bits[4..].iter().all(|&b| !b));
        // The top bit of -1 is bit 251.
        assert!(Felt::from(-1i64).to_bits_le()[251]);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Felt::from(0u64).to_string(), "0x0");
        assert_eq!(Felt::from(26u64).to_string(), "0x1a");
        assert_eq!(
            felt(MODULUS_MINUS_ONE).to_string(),
            MODULUS_MINUS_ONE.to_owned()
        );
    }
}
