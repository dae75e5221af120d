//! The proxy's re-encryption.
//!
//! The proxy holds no private key. It re-blinds the delegation key with a fresh exponent `r_p`,
//! binds it to the session tag, and folds it into the ciphertext through the cross term
//! `C32 = e(C3, RK1)`. `r_p` only lives for the duration of [`re_encrypt`].
use std::fmt::{self, Debug};

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    authority::DomainParams,
    delegate::DelegationKey,
    domain::Pkg,
    encrypt::{Ciphertext, SessionTag},
    ephemeral::Ephemeral,
    group::{pair, Element, Target},
    ByteAccess,
};

/// Re-encrypted ciphertext: the original `C1..C6`, `RK2 = g^{r_p}` and `C32`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReCiphertext {
    pub(crate) inner: Ciphertext,
    pub(crate) rk2: Element,
    pub(crate) c32: Target,
}

impl ReCiphertext {
    /// The digest of the copied `C1..C6`, equal to the original ciphertext's digest.
    pub fn digest(&self) -> [u8; 32] {
        self.inner.digest()
    }

    /// The copied original ciphertext.
    pub fn original(&self) -> &Ciphertext {
        &self.inner
    }
}

impl ByteAccess for ReCiphertext {
    fn bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }
}

impl Debug for ReCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReCiphertext")
            .field(&self.fingerprint())
            .finish()
    }
}

/// Re-encrypts `ciphertext` with the delegation key `key`.
///
/// `tag` must be the session tag committed to in the ciphertext's `C6`; otherwise the delegatee
/// recovers a wrong plaintext.
///
/// Parameters:
///
/// * `rng` - The randomness to use.
/// * `params` - The PKG's public parameters.
/// * `ciphertext` - The ciphertext to transform.
/// * `key` - The delegation key from the sender.
/// * `tag` - The session tag.
pub fn re_encrypt<R: Rng + CryptoRng>(
    rng: R,
    params: &DomainParams<Pkg>,
    ciphertext: &Ciphertext,
    key: &DelegationKey,
    tag: &SessionTag,
) -> ReCiphertext {
    let r_p = Ephemeral::sample(rng).take();
    let rk1 = params.g * (r_p + tag.0) + key.0;
    let transformed = ReCiphertext {
        inner: ciphertext.clone(),
        rk2: params.g * r_p,
        c32: pair(&ciphertext.c3, &rk1),
    };
    debug!(ciphertext = ?ciphertext, ?key, "re-encrypted");
    transformed
}
