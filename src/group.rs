//! Symmetric bilinear group on top of BLS12-381.
//!
//! The protocol is defined over a symmetric pairing `e: G × G → GT`, while BLS12-381 only
//! provides the asymmetric `e: G1 × G2 → GT`. We close that gap by representing every element of
//! `G` as a pair `(g1^x, g2^x)` that shares its discrete logarithm `x`. Pairing the first half of
//! one element with the second half of another then gives `e(g1, g2)^{xy}`, which is symmetric
//! in its arguments.
//!
//! The pair invariant is kept by only producing [`Element`]s from the generator, from random
//! exponents, or from group operations on existing elements. There is no way to build an
//! [`Element`] from two unrelated points.
//!
//! The target group is [`Gt`] as provided by [`bls12_381_plus`], which uses additive notation:
//! what is written `a · b` in the protocol description is `a + b` here, `a / b` is `a - b`, and
//! `a^k` is `a * k`.
use std::{
    fmt::{self, Debug},
    ops::{Add, Mul, Neg, Sub},
};

use crate::error::{Error, Result};

use bls12_381_plus::{
    ff::Field, group::Group, pairing, G1Affine, G1Projective, G2Affine, G2Projective, Gt, Scalar,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Element of the target group.
pub type Target = Gt;

/// Whether [`pair`] is symmetric in its arguments.
///
/// The protocol is only correct over a symmetric pairing.
pub const fn is_symmetric() -> bool {
    true
}

/// An element of the symmetric source group.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "ElementRepr", into = "ElementRepr")]
pub struct Element {
    left: G1Projective,
    right: G2Projective,
}

#[derive(Serialize, Deserialize)]
struct ElementRepr(G1Affine, G2Affine);

impl From<Element> for ElementRepr {
    fn from(value: Element) -> Self {
        ElementRepr(value.left.into(), value.right.into())
    }
}

/// Decoding checks that both halves share their discrete logarithm.
impl TryFrom<ElementRepr> for Element {
    type Error = Error;

    fn try_from(value: ElementRepr) -> Result<Self> {
        if pairing(&value.0, &G2Affine::generator()) != pairing(&G1Affine::generator(), &value.1) {
            return Err(Error::MalformedElement);
        }
        Ok(Element {
            left: value.0.into(),
            right: value.1.into(),
        })
    }
}

impl Element {
    pub fn generator() -> Self {
        Element {
            left: <G1Projective as Group>::generator(),
            right: <G2Projective as Group>::generator(),
        }
    }

    pub fn identity() -> Self {
        Element {
            left: <G1Projective as Group>::identity(),
            right: <G2Projective as Group>::identity(),
        }
    }

    /// Samples a uniformly random element.
    pub fn random<R: Rng>(rng: R) -> Self {
        Self::generator() * Scalar::random(rng)
    }

    pub fn is_identity(&self) -> bool {
        bool::from(self.left.is_identity())
    }

    /// Compressed byte representation of the element.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(48 + 96);
        bytes.extend_from_slice(&G1Affine::from(self.left).to_compressed());
        bytes.extend_from_slice(&G2Affine::from(self.right).to_compressed());
        bytes
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element")
            .field(&hex::encode(&self.to_bytes()[..16]))
            .finish()
    }
}

impl Add for Element {
    type Output = Element;

    fn add(self, rhs: Element) -> Element {
        Element {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

impl Sub for Element {
    type Output = Element;

    fn sub(self, rhs: Element) -> Element {
        self + (-rhs)
    }
}

impl Neg for Element {
    type Output = Element;

    fn neg(self) -> Element {
        Element {
            left: -self.left,
            right: -self.right,
        }
    }
}

impl Mul<Scalar> for Element {
    type Output = Element;

    fn mul(self, rhs: Scalar) -> Element {
        Element {
            left: self.left * rhs,
            right: self.right * rhs,
        }
    }
}

impl Mul<&Scalar> for Element {
    type Output = Element;

    fn mul(self, rhs: &Scalar) -> Element {
        self * *rhs
    }
}

/// The symmetric pairing `e(a, b)`.
pub fn pair(a: &Element, b: &Element) -> Target {
    pairing(&G1Affine::from(a.left), &G2Affine::from(b.right))
}
