//! Single-use random scalars.
//!
//! All blinding exponents of the protocol (`k1`, `k2`, `k3`, the proxy's `r_p`, and the exponent
//! behind each delegation mask `Q`) are drawn as an [`Ephemeral`]. The type is neither [`Clone`]
//! nor [`Copy`] and its scalar can only be reached by consuming it, so one sampled value cannot
//! end up in two protocol runs.
use bls12_381_plus::{ff::Field, Scalar};
use rand::{CryptoRng, Rng};

use crate::group::Element;

pub struct Ephemeral(Scalar);

impl Ephemeral {
    /// Samples a fresh scalar from a cryptographically secure source.
    pub fn sample<R: Rng + CryptoRng>(rng: R) -> Self {
        Ephemeral(Scalar::random(rng))
    }

    /// Consumes the value, returning the scalar for its single use.
    pub fn take(self) -> Scalar {
        self.0
    }

    /// Consumes the value as the exponent of a fresh random element `g^x`.
    pub fn into_element(self) -> Element {
        Element::generator() * self.0
    }
}
