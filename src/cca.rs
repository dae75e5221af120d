//! Chosen-ciphertext hardening.
//!
//! Every hardened encryption generates a fresh one-time signature key pair and commits to its
//! verification key through `C6 = g^{vk}`. The sender later signs the delegation request
//! `(ciphertext digest, rk, vk)` with that key, exactly once. The proxy checks the signature
//! before re-encrypting, and the delegatee checks it again before decrypting. A check recomputes
//! the verification key from the signature and compares it against both the claimed tag and the
//! commitment in the ciphertext; any difference rejects the delegation with
//! [`Error::TamperedDelegation`].
use bls12_381_plus::Scalar;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_384};
use tracing::{debug, warn};

use crate::{
    authority::{DomainParams, SystemParams, TimeTrapDoor, UserPrivateKey},
    decrypt,
    delegate::{BridgeValue, Delegation, DelegationKey},
    domain::{Pkg, TimeServer},
    encrypt::{self, Ciphertext, SessionTag},
    error::{Error, Result},
    group::{Element, Target},
    identity::IdentityValue,
    ots::{self, OtsPublicKey, OtsSecretKey, OtsSignature},
    proxy::{self, ReCiphertext},
    ByteAccess,
};

impl SessionTag {
    /// Maps a one-time verification key into the scalar field.
    pub fn from_public_key(public_key: &OtsPublicKey) -> Self {
        let mut hasher = Sha3_384::new();
        hasher.update(b"ibtrpre/session-tag");
        hasher.update(public_key.as_bytes());
        let mut okm = [0; 48];
        okm.copy_from_slice(&hasher.finalize());
        SessionTag(Scalar::from_okm(&okm))
    }
}

/// The sender's side of a hardened encryption, holding the one-time signing key.
///
/// Consumed by [`SenderSession::authorize`], so each session signs one delegation.
#[derive(Debug)]
pub struct SenderSession {
    secret: OtsSecretKey,
    tag: SessionTag,
}

impl SenderSession {
    pub fn tag(&self) -> &SessionTag {
        &self.tag
    }

    /// Signs the delegation of `ciphertext`.
    pub fn authorize(self, ciphertext: &Ciphertext, delegation: &Delegation) -> SignedDelegation {
        let key = *delegation.key();
        let message = delegation_message(&ciphertext.digest(), &key, &self.tag);
        debug!(?ciphertext, ?key, "authorized delegation");
        SignedDelegation {
            key,
            tag: self.tag,
            signature: self.secret.sign(&message),
        }
    }
}

/// A delegation key together with the sender's one-time signature over it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SignedDelegation {
    pub(crate) key: DelegationKey,
    pub(crate) tag: SessionTag,
    pub(crate) signature: OtsSignature,
}

impl SignedDelegation {
    pub fn key(&self) -> &DelegationKey {
        &self.key
    }

    pub fn tag(&self) -> &SessionTag {
        &self.tag
    }

    /// Checks the signature against the ciphertext with the given digest and commitment.
    fn verify(&self, params: &DomainParams<Pkg>, digest: &[u8; 32], commitment: &Element) -> Result<()> {
        let message = delegation_message(digest, &self.key, &self.tag);
        let recovered = self
            .signature
            .recover_public_key(&message)
            .map(|public_key| SessionTag::from_public_key(&public_key));
        match recovered {
            Some(tag) if tag == self.tag && params.g * tag.0 == *commitment => Ok(()),
            _ => {
                warn!(key = ?self.key, "rejected delegation");
                Err(Error::TamperedDelegation)
            }
        }
    }
}

impl ByteAccess for SignedDelegation {
    fn bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }
}

fn delegation_message(digest: &[u8; 32], key: &DelegationKey, tag: &SessionTag) -> Vec<u8> {
    let mut message = Vec::with_capacity(32 + 144 + 32);
    message.extend_from_slice(digest);
    message.extend_from_slice(&key.bytes());
    message.extend_from_slice(&tag.0.to_le_bytes());
    message
}

/// Hardened encryption.
///
/// Returns the ciphertext, committed to a fresh one-time key, and the session needed to
/// authorize its delegation.
pub fn encrypt<R: Rng + CryptoRng>(
    mut rng: R,
    params: &SystemParams,
    sender: &IdentityValue<Pkg>,
    sender_key: &UserPrivateKey,
    release: &IdentityValue<TimeServer>,
    plaintext: &Target,
) -> (Ciphertext, SenderSession) {
    let (public_key, secret) = ots::keygen(&mut rng);
    let tag = SessionTag::from_public_key(&public_key);
    let ciphertext = encrypt::encrypt(
        &mut rng, params, sender, sender_key, release, &tag, plaintext,
    );
    (ciphertext, SenderSession { secret, tag })
}

/// The proxy's re-encryption, accepting only a correctly signed delegation.
pub fn re_encrypt<R: Rng + CryptoRng>(
    rng: R,
    params: &DomainParams<Pkg>,
    ciphertext: &Ciphertext,
    signed: &SignedDelegation,
) -> Result<ReCiphertext> {
    signed.verify(params, &ciphertext.digest(), &ciphertext.c6)?;
    Ok(proxy::re_encrypt(
        rng,
        params,
        ciphertext,
        &signed.key,
        &signed.tag,
    ))
}

/// The delegatee's second decryption step, accepting only a correctly signed delegation.
pub fn dec2(
    params: &DomainParams<Pkg>,
    reciphertext: &ReCiphertext,
    signed: &SignedDelegation,
    trapdoor: &TimeTrapDoor,
    bridge: &BridgeValue,
) -> Result<Target> {
    signed.verify(params, &reciphertext.digest(), &reciphertext.inner.c6)?;
    Ok(decrypt::dec2(reciphertext, trapdoor, bridge))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{authority::Authority, decrypt::dec1, delegate::rk_gen};

    use bls12_381_plus::{ff::Field, group::Group};

    struct Flow {
        params: SystemParams,
        bob_key: UserPrivateKey,
        trapdoor: TimeTrapDoor,
        message: Target,
        ciphertext: Ciphertext,
        delegation: Delegation,
        signed: SignedDelegation,
    }

    fn flow() -> Flow {
        let mut rng = rand::thread_rng();
        let pkg = Authority::<Pkg>::setup(&mut rng);
        let ts = Authority::<TimeServer>::setup(&mut rng);
        let params = SystemParams::new(&pkg, &ts);
        let alice = IdentityValue::derive_str("sender.alice@gmail.com");
        let bob = IdentityValue::derive_str("bob@example.org");
        let time = IdentityValue::derive_str("2025-5-5 12:00:00");
        let alice_key = pkg.issue_key(&mut rng, &alice).unwrap();
        let bob_key = pkg.issue_key(&mut rng, &bob).unwrap();
        let trapdoor = ts.issue_key(&mut rng, &time).unwrap();
        let message = Target::random(&mut rng);
        let (ciphertext, session) = encrypt(&mut rng, &params, &alice, &alice_key, &time, &message);
        let delegation = rk_gen(&mut rng, &alice_key, &ciphertext);
        let signed = session.authorize(&ciphertext, &delegation);
        Flow {
            params,
            bob_key,
            trapdoor,
            message,
            ciphertext,
            delegation,
            signed,
        }
    }

    #[test]
    fn hardened_delegation_decrypts() {
        let mut rng = rand::thread_rng();
        let f = flow();
        let bob = IdentityValue::derive_str("bob@example.org");
        let token = f.delegation.rj_gen(&mut rng, &f.params.pkg, &bob);
        let rct = re_encrypt(&mut rng, &f.params.pkg, &f.ciphertext, &f.signed).unwrap();
        let bridge = dec1(&f.bob_key, &token);
        let plaintext = dec2(&f.params.pkg, &rct, &f.signed, &f.trapdoor, &bridge).unwrap();
        assert_eq!(plaintext, f.message);
        assert!(!f.ciphertext.commitment().is_identity());
    }

    #[test]
    fn tampered_key_is_rejected() {
        let mut rng = rand::thread_rng();
        let mut f = flow();
        f.signed.key = DelegationKey(f.signed.key.0 + Element::random(&mut rng));
        assert!(matches!(
            re_encrypt(&mut rng, &f.params.pkg, &f.ciphertext, &f.signed),
            Err(Error::TamperedDelegation)
        ));
    }

    #[test]
    fn tampered_tag_is_rejected() {
        let mut rng = rand::thread_rng();
        let mut f = flow();
        f.signed.tag = SessionTag(Scalar::random(&mut rng));
        assert!(matches!(
            re_encrypt(&mut rng, &f.params.pkg, &f.ciphertext, &f.signed),
            Err(Error::TamperedDelegation)
        ));
    }

    #[test]
    fn resigned_delegation_is_rejected() {
        // A fresh one-time key cannot match the commitment in C6.
        let mut rng = rand::thread_rng();
        let mut f = flow();
        let (public_key, secret) = ots::keygen(&mut rng);
        let tag = SessionTag::from_public_key(&public_key);
        let key = DelegationKey(Element::random(&mut rng));
        let message = delegation_message(&f.ciphertext.digest(), &key, &tag);
        f.signed = SignedDelegation {
            key,
            tag,
            signature: secret.sign(&message),
        };
        assert!(matches!(
            re_encrypt(&mut rng, &f.params.pkg, &f.ciphertext, &f.signed),
            Err(Error::TamperedDelegation)
        ));
    }

    #[test]
    fn delegation_is_bound_to_its_ciphertext() {
        let mut rng = rand::thread_rng();
        let f = flow();
        let alice = IdentityValue::derive_str("sender.alice@gmail.com");
        let time = IdentityValue::derive_str("2025-5-5 12:00:00");
        let pkg = Authority::<Pkg>::setup(&mut rng);
        let alice_key = pkg.issue_key(&mut rng, &alice).unwrap();
        let params = SystemParams {
            pkg: pkg.params().clone(),
            ts: f.params.ts.clone(),
        };
        let (other, _) = encrypt(&mut rng, &params, &alice, &alice_key, &time, &f.message);
        assert!(matches!(
            re_encrypt(&mut rng, &params.pkg, &other, &f.signed),
            Err(Error::TamperedDelegation)
        ));
    }

    #[test]
    fn delegatee_rejects_tampered_reciphertext() {
        let mut rng = rand::thread_rng();
        let f = flow();
        let bob = IdentityValue::derive_str("bob@example.org");
        let token = f.delegation.rj_gen(&mut rng, &f.params.pkg, &bob);
        let mut rct = re_encrypt(&mut rng, &f.params.pkg, &f.ciphertext, &f.signed).unwrap();
        let bridge = dec1(&f.bob_key, &token);

        rct.inner.c5 = rct.inner.c5 + Target::generator();
        assert!(matches!(
            dec2(&f.params.pkg, &rct, &f.signed, &f.trapdoor, &bridge),
            Err(Error::TamperedDelegation)
        ));
    }

    #[test]
    fn session_tag_matches_commitment() {
        let f = flow();
        assert_eq!(
            f.ciphertext.commitment(),
            &(f.params.pkg.g * f.signed.tag().0)
        );
        assert!(!f.signed.tag().is_unbound());
    }
}
