//! Delegation of decryption rights.
//!
//! The sender hands a [`DelegationKey`] `rk` to the proxy and keeps the matching
//! [`BridgeValue`] `X`. Both come out of the same [`rk_gen`] call as one [`Delegation`], and the
//! token for the delegatee is produced from that same value with [`Delegation::rj_gen`]. There is
//! no way to pair an `rk` with the `X` of a different call.
use std::fmt::{self, Debug};

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    authority::{DomainParams, UserPrivateKey},
    domain::Pkg,
    encrypt::Ciphertext,
    ephemeral::Ephemeral,
    group::{pair, Element, Target},
    identity::IdentityValue,
    ByteAccess,
};

/// The delegation key `rk = Q^r · K`, handed to the proxy.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DelegationKey(pub(crate) Element);

impl ByteAccess for DelegationKey {
    fn bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }
}

impl Debug for DelegationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DelegationKey")
            .field(&self.fingerprint())
            .finish()
    }
}

/// The bridge value `X = e(C3, Q^r)`, linking a delegation to one ciphertext.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BridgeValue(pub(crate) Target);

impl ByteAccess for BridgeValue {
    fn bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

impl Debug for BridgeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BridgeValue")
            .field(&self.fingerprint())
            .finish()
    }
}

/// The token `Rj = {u, v, w}` for one delegatee, an encryption of the bridge value under the
/// delegatee's identity.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DelegateeToken {
    pub(crate) u: Element,
    pub(crate) v: Target,
    pub(crate) w: Target,
}

impl ByteAccess for DelegateeToken {
    fn bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }
}

impl Debug for DelegateeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DelegateeToken")
            .field(&self.fingerprint())
            .finish()
    }
}

/// The output of one [`rk_gen`] call.
///
/// Not [`Clone`], a delegation is tied to the mask it was drawn with.
#[derive(Debug)]
pub struct Delegation {
    key: DelegationKey,
    bridge: BridgeValue,
}

impl Delegation {
    /// The key for the proxy.
    pub fn key(&self) -> &DelegationKey {
        &self.key
    }

    /// The bridge value retained by the sender.
    pub fn bridge(&self) -> &BridgeValue {
        &self.bridge
    }

    /// Generates the token that lets `delegatee` recover the bridge value.
    ///
    /// Parameters:
    ///
    /// * `rng` - The randomness to use.
    /// * `params` - The PKG's public parameters.
    /// * `delegatee` - The identity that shall be able to decrypt.
    pub fn rj_gen<R: Rng + CryptoRng>(
        &self,
        rng: R,
        params: &DomainParams<Pkg>,
        delegatee: &IdentityValue<Pkg>,
    ) -> DelegateeToken {
        let k3 = Ephemeral::sample(rng).take();
        let (u, v, mask) = params.blind(delegatee.scalar(), k3);
        debug!(?delegatee, key = ?self.key, "generated delegatee token");
        DelegateeToken {
            u,
            v,
            w: mask + self.bridge.0,
        }
    }
}

/// Generates a delegation for `ciphertext` from the sender's private key.
///
/// Each call draws a fresh mask `Q`, so two delegations of the same ciphertext are unrelated.
///
/// Parameters:
///
/// * `rng` - The randomness to use.
/// * `sender_key` - The private key of the sender that produced `ciphertext`.
/// * `ciphertext` - The ciphertext to delegate.
pub fn rk_gen<R: Rng + CryptoRng>(
    rng: R,
    sender_key: &UserPrivateKey,
    ciphertext: &Ciphertext,
) -> Delegation {
    let mask = Ephemeral::sample(rng).into_element() * sender_key.r;
    let delegation = Delegation {
        key: DelegationKey(mask + sender_key.k),
        bridge: BridgeValue(pair(&ciphertext.c3, &mask)),
    };
    debug!(ciphertext = ?ciphertext, key = ?delegation.key, "generated delegation");
    delegation
}
