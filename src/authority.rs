//! Key issuing authorities.
//!
//! The protocol has two independent authorities that run the same algorithm on disjoint
//! parameters: the private key generator ([`Pkg`]) issues [`UserPrivateKey`]s for identities, and
//! the time server ([`TimeServer`]) issues [`TimeTrapDoor`]s for release times.
//!
//! An [`Authority`] owns its [`MasterSecret`]. The secret has no accessor and is not
//! serializable; the only things that leave the authority are the public [`DomainParams`] and the
//! keys produced by [`Authority::issue_key`].
use std::{
    fmt::{self, Debug},
    marker::PhantomData,
};

use bls12_381_plus::{ff::Field, Scalar};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    domain::{Domain, Pkg, TimeServer},
    ephemeral::Ephemeral,
    error::{Error, Result},
    group::{pair, Element, Target},
    identity::IdentityValue,
    ByteAccess,
};

/// Public parameters of one authority.
///
/// `g` and `h` are uniformly random, `g1 = g^msk`. The pairings `e(g, g)` and `e(g, h)` are
/// cached, as every encryption needs them.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
#[serde(try_from = "DomainParamsRepr", into = "DomainParamsRepr")]
pub struct DomainParams<D> {
    pub(crate) g: Element,
    pub(crate) g1: Element,
    pub(crate) h: Element,
    pub(crate) e_g_g: Target,
    pub(crate) e_g_h: Target,
    domain: PhantomData<D>,
}

#[derive(Serialize, Deserialize)]
struct DomainParamsRepr {
    g: Element,
    g1: Element,
    h: Element,
    e_g_g: Target,
    e_g_h: Target,
}

impl<D> From<DomainParams<D>> for DomainParamsRepr {
    fn from(value: DomainParams<D>) -> Self {
        DomainParamsRepr {
            g: value.g,
            g1: value.g1,
            h: value.h,
            e_g_g: value.e_g_g,
            e_g_h: value.e_g_h,
        }
    }
}

/// Decoding checks the cached pairings against the generators.
impl<D> TryFrom<DomainParamsRepr> for DomainParams<D> {
    type Error = Error;

    fn try_from(value: DomainParamsRepr) -> Result<Self> {
        if value.e_g_g != pair(&value.g, &value.g) || value.e_g_h != pair(&value.g, &value.h) {
            return Err(Error::MalformedElement);
        }
        Ok(DomainParams {
            g: value.g,
            g1: value.g1,
            h: value.h,
            e_g_g: value.e_g_g,
            e_g_h: value.e_g_h,
            domain: PhantomData,
        })
    }
}

impl<D> Clone for DomainParams<D> {
    fn clone(&self) -> Self {
        DomainParams {
            g: self.g,
            g1: self.g1,
            h: self.h,
            e_g_g: self.e_g_g,
            e_g_h: self.e_g_h,
            domain: PhantomData,
        }
    }
}

impl<D> PartialEq for DomainParams<D> {
    fn eq(&self, other: &Self) -> bool {
        self.g == other.g
            && self.g1 == other.g1
            && self.h == other.h
            && self.e_g_g == other.e_g_g
            && self.e_g_h == other.e_g_h
    }
}

impl<D> Eq for DomainParams<D> {}

impl<D> DomainParams<D> {
    /// Encrypts under the identity `id` of this domain with blinding exponent `k`.
    ///
    /// Returns `(g1^k · g^{-k·id}, e(g, g)^k, e(g, h)^{-k})`, the three parts of a Boneh-Boyen
    /// style encryption. `g^{k(msk - id)}` is computed without knowledge of `msk`.
    pub(crate) fn blind(&self, id: &Scalar, k: Scalar) -> (Element, Target, Target) {
        (
            (-self.g) * (k * id) + self.g1 * k,
            self.e_g_g * k,
            -(self.e_g_h * k),
        )
    }

    /// The generator `g` of this domain.
    pub fn generator(&self) -> &Element {
        &self.g
    }
}

impl<D: Domain> ByteAccess for DomainParams<D> {
    fn bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }
}

impl<D: Domain> Debug for DomainParams<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainParams")
            .field(&D::LABEL)
            .field(&self.fingerprint())
            .finish()
    }
}

/// The master secret of an authority.
///
/// Only reachable from inside [`Authority`].
pub struct MasterSecret<D> {
    msk: Scalar,
    domain: PhantomData<D>,
}

impl<D> Debug for MasterSecret<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// Key material issued for one identity: `{r, K}` with `K = (h - g^r)^{1/(msk - id)}`.
pub struct IdentityKey<D> {
    pub(crate) r: Scalar,
    pub(crate) k: Element,
    domain: PhantomData<D>,
}

impl<D> Clone for IdentityKey<D> {
    fn clone(&self) -> Self {
        IdentityKey {
            r: self.r,
            k: self.k,
            domain: PhantomData,
        }
    }
}

impl<D: Domain> Debug for IdentityKey<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityKey").field(&D::LABEL).finish()
    }
}

/// A user's private key, issued by the PKG.
pub type UserPrivateKey = IdentityKey<Pkg>;

/// A trapdoor for a release time, issued by the time server.
pub type TimeTrapDoor = IdentityKey<TimeServer>;

/// An authority of domain `D`, holding the master secret.
pub struct Authority<D> {
    secret: MasterSecret<D>,
    params: DomainParams<D>,
}

impl<D: Domain> Authority<D> {
    /// Sets up a fresh authority.
    ///
    /// Samples the master secret and the random generators `g` and `h`.
    pub fn setup<R: Rng + CryptoRng>(mut rng: R) -> Self {
        let msk = Scalar::random(&mut rng);
        let g = Element::random(&mut rng);
        let h = Element::random(&mut rng);
        let params = DomainParams {
            g,
            g1: g * msk,
            h,
            e_g_g: pair(&g, &g),
            e_g_h: pair(&g, &h),
            domain: PhantomData,
        };
        debug!(domain = D::LABEL, params = %params.fingerprint(), "authority set up");
        Authority {
            secret: MasterSecret {
                msk,
                domain: PhantomData,
            },
            params,
        }
    }

    /// The public parameters of this authority.
    pub fn params(&self) -> &DomainParams<D> {
        &self.params
    }

    /// Issues the key for the given identity.
    ///
    /// Fails with [`Error::DomainCollision`] if the identity value equals the master secret, as
    /// `msk - id` has no inverse in that case.
    ///
    /// Parameters:
    ///
    /// * `rng` - The randomness to use.
    /// * `identity` - The identity for which to issue the key.
    pub fn issue_key<R: Rng + CryptoRng>(
        &self,
        rng: R,
        identity: &IdentityValue<D>,
    ) -> Result<IdentityKey<D>> {
        let diff = self.secret.msk - identity.scalar();
        if diff == Scalar::from(0u32) {
            return Err(Error::DomainCollision);
        }
        let inv = Option::<Scalar>::from(diff.invert()).ok_or(Error::DomainCollision)?;

        let r = Ephemeral::sample(rng).take();
        let k = (self.params.h - self.params.g * r) * inv;
        debug!(domain = D::LABEL, ?identity, "issued identity key");
        Ok(IdentityKey {
            r,
            k,
            domain: PhantomData,
        })
    }
}

impl<D: Domain> Debug for Authority<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authority")
            .field("secret", &self.secret)
            .field("params", &self.params)
            .finish()
    }
}

/// Public parameters of both authorities.
///
/// This is what encryptors, proxies and delegatees need to run the protocol.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SystemParams {
    pub pkg: DomainParams<Pkg>,
    pub ts: DomainParams<TimeServer>,
}

impl SystemParams {
    pub fn new(pkg: &Authority<Pkg>, ts: &Authority<TimeServer>) -> Self {
        SystemParams {
            pkg: pkg.params().clone(),
            ts: ts.params().clone(),
        }
    }
}

impl ByteAccess for SystemParams {
    fn bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }
}
