//! Identity values and the mapping from application identities to them.
//!
//! An [`IdentityValue`] is the field element that stands in for an identity string (an e-mail
//! address for the PKG, a release time for the time server). Values are tagged with their
//! [`Domain`], and the hash that produces them is separated by domain as well, so the same string
//! maps to unrelated values under the two authorities.
use std::{
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use bls12_381_plus::Scalar;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::{
    domain::Domain,
    error::{Error, Result},
};

/// Length of the byte form of an [`IdentityValue`].
pub const IDENTITY_BYTES: usize = 33;

/// Field-element image of an identity, owned by the authority domain `D`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "D: Domain")]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct IdentityValue<D> {
    value: Scalar,
    domain: PhantomData<D>,
}

impl<D: Domain> IdentityValue<D> {
    fn from_scalar(value: Scalar) -> Self {
        IdentityValue {
            value,
            domain: PhantomData,
        }
    }

    /// Hashes an identity to its value in domain `D`.
    ///
    /// The identity is fed through its [`Hash`] implementation, so this agrees with
    /// [`HashMapper`] for every input.
    pub fn derive<I: Hash + ?Sized>(identity: &I) -> Self {
        let mut hasher = Sha3Hasher::for_domain::<D>();
        identity.hash(&mut hasher);
        Self::from_scalar(hasher.hash_to_scalar())
    }

    /// Hashes an identity string to its value in domain `D`.
    pub fn derive_str(identity: &str) -> Self {
        Self::derive(identity)
    }

    /// Parses the byte form produced by [`IdentityValue::to_bytes`].
    ///
    /// Fails with [`Error::CrossDomainMisuse`] if the value was issued for the other domain.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != IDENTITY_BYTES {
            return Err(Error::MalformedIdentity);
        }
        if bytes[0] != D::TAG {
            return Err(Error::CrossDomainMisuse);
        }
        let mut repr = [0; 32];
        repr.copy_from_slice(&bytes[1..]);
        Option::from(Scalar::from_le_bytes(&repr))
            .map(Self::from_scalar)
            .ok_or(Error::MalformedIdentity)
    }

    /// Domain tag followed by the little-endian scalar.
    pub fn to_bytes(&self) -> [u8; IDENTITY_BYTES] {
        let mut bytes = [0; IDENTITY_BYTES];
        bytes[0] = D::TAG;
        bytes[1..].copy_from_slice(&self.value.to_le_bytes());
        bytes
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.value
    }
}

impl<D> Clone for IdentityValue<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for IdentityValue<D> {}

impl<D> PartialEq for IdentityValue<D> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<D> Eq for IdentityValue<D> {}

impl<D: Domain> Debug for IdentityValue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityValue")
            .field(&D::LABEL)
            .field(&hex::encode(&self.value.to_le_bytes()[..8]))
            .finish()
    }
}

impl<D: Domain> TryFrom<Vec<u8>> for IdentityValue<D> {
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        Self::from_bytes(&value)
    }
}

impl<D: Domain> From<IdentityValue<D>> for Vec<u8> {
    fn from(value: IdentityValue<D>) -> Self {
        value.to_bytes().to_vec()
    }
}

/// A trait to mark objects that can map from an application-specific identity to an identity
/// value of one authority domain.
///
/// A mapper can be implemented multiple times for a single struct, thereby providing multiple
/// (equivalent) ways to map.
pub trait Mapper<F, D: Domain> {
    fn map_identity(&self, input: F) -> Result<IdentityValue<D>>;
}

/// [`Mapper`] is automatically implemented for functions and closures that match the signature of
/// [`Mapper::map_identity`].
impl<X, D: Domain, F: Fn(X) -> Result<IdentityValue<D>>> Mapper<X, D> for F {
    fn map_identity(&self, input: X) -> Result<IdentityValue<D>> {
        self(input)
    }
}

struct Sha3Hasher(Sha3_256);

impl Sha3Hasher {
    fn for_domain<D: Domain>() -> Self {
        let mut hasher = Sha3Hasher(Sha3_256::new());
        hasher.write(D::LABEL.as_bytes());
        hasher.write(&[0]);
        hasher
    }

    fn hash_to_scalar(self) -> Scalar {
        let mut bytes = [0; 48];
        bytes[..32].copy_from_slice(&self.0.finalize());
        Scalar::from_okm(&bytes)
    }
}

impl Hasher for Sha3Hasher {
    fn finish(&self) -> u64 {
        let digest = self.0.clone().finalize();
        let mut head = [0; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
}

/// A [`Mapper`] that works for all types implementing [`std::hash::Hash`].
///
/// This mapper feeds the hash implementation of the input into a SHA3-256 instance that is
/// prefixed with the domain label, and reduces the digest to a scalar. Useful for release times
/// that are represented by structured types rather than strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HashMapper;

impl HashMapper {
    /// Create a new [`HashMapper`].
    pub fn new() -> HashMapper {
        HashMapper
    }
}

impl<I: Hash, D: Domain> Mapper<I, D> for HashMapper {
    fn map_identity(&self, input: I) -> Result<IdentityValue<D>> {
        Ok(IdentityValue::derive(&input))
    }
}
