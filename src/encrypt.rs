//! Encryption bound to a sender identity and a release time.
//!
//! A ciphertext consists of two independently randomized Boneh-Boyen style encryptions, one
//! under the time server's parameters for the release time (`C1`, `C2`) and one under the PKG's
//! parameters for the sender (`C3`, `C4`). Both blinding factors mask the plaintext in `C5`, so
//! both the sender's key (or a delegation of it) and the time trapdoor are needed to unmask it.
//! `C6 = g^{vk}` commits to the session tag.
use std::fmt::{self, Debug};

use bls12_381_plus::Scalar;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::debug;

use crate::{
    authority::{SystemParams, UserPrivateKey},
    domain::{Pkg, TimeServer},
    ephemeral::Ephemeral,
    group::{Element, Target},
    identity::IdentityValue,
    ByteAccess,
};

/// Field representation of a one-time verification key, `vk` in the protocol.
///
/// The base construction uses [`SessionTag::unbound`], for which `C6` is the identity and every
/// session-dependent term vanishes. The hardened construction derives the tag from a one-time
/// signature key, see [`crate::cca`].
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct SessionTag(pub(crate) Scalar);

impl SessionTag {
    /// The tag of the unhardened construction.
    pub fn unbound() -> Self {
        SessionTag(Scalar::from(0u32))
    }

    pub fn is_unbound(&self) -> bool {
        self.0 == Scalar::from(0u32)
    }
}

/// Ciphertext `{C1, ..., C6}`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub(crate) c1: Element,
    pub(crate) c2: Target,
    pub(crate) c3: Element,
    pub(crate) c4: Target,
    pub(crate) c5: Target,
    pub(crate) c6: Element,
}

impl Ciphertext {
    /// SHA3-256 over the serialized components.
    ///
    /// A [`ReCiphertext`][crate::proxy::ReCiphertext] produced from this ciphertext has the same
    /// digest.
    pub fn digest(&self) -> [u8; 32] {
        Sha3_256::digest(self.bytes()).into()
    }

    /// The commitment `C6` to the session tag.
    pub fn commitment(&self) -> &Element {
        &self.c6
    }
}

impl ByteAccess for Ciphertext {
    fn bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }
}

impl Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ciphertext")
            .field(&self.fingerprint())
            .finish()
    }
}

/// Encrypts `plaintext` for the sender `sender`, released at `release`.
///
/// `sender_key` must be the key issued to `sender`; the ciphertext is bound to its blinding
/// factor `r`.
///
/// Parameters:
///
/// * `rng` - The randomness to use.
/// * `params` - Public parameters of both authorities.
/// * `sender` - The sender's identity value.
/// * `sender_key` - The sender's private key.
/// * `release` - The release time's identity value.
/// * `tag` - The session tag to commit to in `C6`.
/// * `plaintext` - The message.
pub fn encrypt<R: Rng + CryptoRng>(
    mut rng: R,
    params: &SystemParams,
    sender: &IdentityValue<Pkg>,
    sender_key: &UserPrivateKey,
    release: &IdentityValue<TimeServer>,
    tag: &SessionTag,
    plaintext: &Target,
) -> Ciphertext {
    let k1 = Ephemeral::sample(&mut rng).take();
    let k2 = Ephemeral::sample(&mut rng).take();

    let (c1, c2, ts_mask) = params.ts.blind(release.scalar(), k1);
    let (c3, e_g_g_k2, pkg_mask) = params.pkg.blind(sender.scalar(), k2);

    let ciphertext = Ciphertext {
        c1,
        c2,
        c3,
        c4: e_g_g_k2 * sender_key.r,
        c5: plaintext + ts_mask + pkg_mask,
        c6: params.pkg.g * tag.0,
    };
    debug!(?sender, ?release, ciphertext = %ciphertext.fingerprint(), "encrypted");
    ciphertext
}
