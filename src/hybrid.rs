//! High-level wrapper around the protocol operations.
//!
//! Usually, people don't communicate by sending each other target group elements. Therefore, we
//! provide this opinionated and easier-to-use wrapper over the raw protocol.
//!
//! The main struct is [`HybridPre`], which wraps the [`SystemParams`] to provide high-level
//! operations. The main differences include:
//!
//! * Payloads are byte sequences. A random target group element is encrypted with the protocol,
//!   and keys for AES (counter mode) and for a SHA3-based MAC are derived from it.
//! * Decryption is authenticated. If a party ends up with the wrong element (wrong delegatee key,
//!   wrong trapdoor, a bridge value from another delegation), the MAC check fails with
//!   [`Error::CorrectnessMismatch`] instead of handing back garbage.
//! * Identities are mapped through a [`Mapper`], which makes it easier to specify identities at
//!   the call-site. The same mapper is used for sender identities and release times.
//! * All ciphertexts are hardened, see [`crate::cca`]. Each sealed payload can therefore be
//!   delegated once.
//! * The methods in this module are restricted to [`CryptoRng`] random generators to enforce the
//!   use of cryptographically secure algorithms.
use aes::cipher::{KeyIvInit, StreamCipher};
use bls12_381_plus::group::Group;
use rand::{CryptoRng, Rng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::{
    authority::{SystemParams, TimeTrapDoor, UserPrivateKey},
    cca::{self, SenderSession, SignedDelegation},
    decrypt::{dec1, sender_decrypt},
    delegate::{rk_gen, DelegateeToken},
    domain::{Pkg, TimeServer},
    encrypt::Ciphertext,
    error::{Error, Result},
    group::Target,
    identity::{HashMapper, IdentityValue, Mapper},
    proxy::ReCiphertext,
};

type AesCtr = ctr::Ctr64LE<aes::Aes128>;
static IV: [u8; 16] = [0; 16];

#[derive(Serialize, Deserialize)]
struct Envelope<H> {
    header: H,
    body: Vec<u8>,
    tag: [u8; 32],
}

impl<H: Serialize + DeserializeOwned> Envelope<H> {
    fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Serialization failed")
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|_| Error::MalformedCiphertext)
    }
}

struct PayloadKeys {
    cipher: [u8; 16],
    mac: [u8; 32],
}

impl PayloadKeys {
    fn derive(element: &Target) -> Self {
        let bytes = element.to_bytes();
        let mut cipher = [0; 16];
        let digest = Sha3_256::new_with_prefix(b"ibtrpre/aes")
            .chain_update(bytes)
            .finalize();
        cipher.copy_from_slice(&digest[..16]);
        let mac = Sha3_256::new_with_prefix(b"ibtrpre/mac")
            .chain_update(bytes)
            .finalize()
            .into();
        PayloadKeys { cipher, mac }
    }

    fn tag(&self, digest: &[u8; 32], body: &[u8]) -> [u8; 32] {
        Sha3_256::new_with_prefix(self.mac)
            .chain_update(digest)
            .chain_update(body)
            .finalize()
            .into()
    }

    fn apply(&self, buffer: &mut [u8]) {
        let mut cipher = AesCtr::new(&self.cipher.into(), &IV.into());
        cipher.apply_keystream(buffer);
    }

    fn open(&self, digest: &[u8; 32], mut body: Vec<u8>, tag: &[u8; 32]) -> Result<Vec<u8>> {
        let expected = self.tag(digest, &body);
        if !bool::from(expected.as_slice().ct_eq(tag.as_slice())) {
            return Err(Error::CorrectnessMismatch);
        }
        self.apply(&mut body);
        Ok(body)
    }
}

/// High-level implementation of the protocol.
///
/// This struct keeps the [`SystemParams`] and a [`Mapper`] around, so that callers deal in
/// application identities and byte payloads.
///
/// For more information, see the [module-level][self] documentation.
#[derive(Clone, Debug)]
pub struct HybridPre<M> {
    params: SystemParams,
    mapper: M,
}

impl HybridPre<HashMapper> {
    /// Create a new [`HybridPre`] using the [`HashMapper`] mapper.
    pub fn new(params: SystemParams) -> HybridPre<HashMapper> {
        Self::new_with_mapper(params, HashMapper)
    }
}

impl<M> HybridPre<M> {
    /// Create a new [`HybridPre`] with the given [`Mapper`].
    pub fn new_with_mapper(params: SystemParams, mapper: M) -> HybridPre<M> {
        Self { params, mapper }
    }

    pub fn params(&self) -> &SystemParams {
        &self.params
    }

    /// Encrypt the given byte sequence, released at `release`.
    ///
    /// Returns the sealed payload and the session that can later authorize its delegation.
    ///
    /// Parameters:
    ///
    /// * `rng` - The randomness to use.
    /// * `sender` - The identity of the sender.
    /// * `sender_key` - The private key of the sender.
    /// * `release` - The release time.
    /// * `payload` - Payload to encrypt.
    pub fn seal<I, T, R: Rng + CryptoRng>(
        &self,
        mut rng: R,
        sender: I,
        sender_key: &UserPrivateKey,
        release: T,
        payload: &[u8],
    ) -> Result<(Vec<u8>, SenderSession)>
    where
        M: Mapper<I, Pkg> + Mapper<T, TimeServer>,
    {
        let sender: IdentityValue<Pkg> = self.mapper.map_identity(sender)?;
        let release: IdentityValue<TimeServer> = self.mapper.map_identity(release)?;
        let element = Target::random(&mut rng);
        let (header, session) = cca::encrypt(
            &mut rng,
            &self.params,
            &sender,
            sender_key,
            &release,
            &element,
        );

        let keys = PayloadKeys::derive(&element);
        let mut body = Vec::from(payload);
        keys.apply(&mut body);
        let tag = keys.tag(&header.digest(), &body);
        let envelope = Envelope { header, body, tag };
        Ok((envelope.to_bytes(), session))
    }

    /// Decrypt a sealed payload as its sender, once the release time has passed.
    ///
    /// Parameters:
    ///
    /// * `sender_key` - The private key of the sender.
    /// * `trapdoor` - The time trapdoor of the release time.
    /// * `sealed` - The sealed payload, as returned by [`HybridPre::seal`].
    pub fn open(
        &self,
        sender_key: &UserPrivateKey,
        trapdoor: &TimeTrapDoor,
        sealed: &[u8],
    ) -> Result<Vec<u8>> {
        let envelope = Envelope::<Ciphertext>::from_bytes(sealed)?;
        let element = sender_decrypt(&envelope.header, sender_key, trapdoor);
        PayloadKeys::derive(&element).open(&envelope.header.digest(), envelope.body, &envelope.tag)
    }

    /// Delegate a sealed payload to `delegatee`.
    ///
    /// Returns the signed delegation for the proxy and the token for the delegatee.
    ///
    /// Parameters:
    ///
    /// * `rng` - The randomness to use.
    /// * `session` - The session returned when sealing the payload.
    /// * `sender_key` - The private key of the sender.
    /// * `sealed` - The sealed payload.
    /// * `delegatee` - The identity that shall be able to decrypt.
    pub fn delegate<I, R: Rng + CryptoRng>(
        &self,
        mut rng: R,
        session: SenderSession,
        sender_key: &UserPrivateKey,
        sealed: &[u8],
        delegatee: I,
    ) -> Result<(SignedDelegation, DelegateeToken)>
    where
        M: Mapper<I, Pkg>,
    {
        let delegatee: IdentityValue<Pkg> = self.mapper.map_identity(delegatee)?;
        let envelope = Envelope::<Ciphertext>::from_bytes(sealed)?;
        let delegation = rk_gen(&mut rng, sender_key, &envelope.header);
        let token = delegation.rj_gen(&mut rng, &self.params.pkg, &delegatee);
        Ok((session.authorize(&envelope.header, &delegation), token))
    }

    /// Re-encrypt a sealed payload on the proxy.
    ///
    /// Fails with [`Error::TamperedDelegation`] if the delegation was not signed for this payload.
    pub fn re_encrypt<R: Rng + CryptoRng>(
        &self,
        rng: R,
        sealed: &[u8],
        signed: &SignedDelegation,
    ) -> Result<Vec<u8>> {
        let envelope = Envelope::<Ciphertext>::from_bytes(sealed)?;
        let header = cca::re_encrypt(rng, &self.params.pkg, &envelope.header, signed)?;
        debug!(?header, "re-encrypted sealed payload");
        Ok(Envelope {
            header,
            body: envelope.body,
            tag: envelope.tag,
        }
        .to_bytes())
    }

    /// Decrypt a re-encrypted payload as the delegatee.
    ///
    /// Parameters:
    ///
    /// * `key` - The private key of the delegatee.
    /// * `token` - The delegatee token from the sender.
    /// * `trapdoor` - The time trapdoor of the release time.
    /// * `signed` - The signed delegation the proxy used.
    /// * `resealed` - The payload, as returned by [`HybridPre::re_encrypt`].
    pub fn open_delegated(
        &self,
        key: &UserPrivateKey,
        token: &DelegateeToken,
        trapdoor: &TimeTrapDoor,
        signed: &SignedDelegation,
        resealed: &[u8],
    ) -> Result<Vec<u8>> {
        let envelope = Envelope::<ReCiphertext>::from_bytes(resealed)?;
        let bridge = dec1(key, token);
        let element = cca::dec2(&self.params.pkg, &envelope.header, signed, trapdoor, &bridge)?;
        PayloadKeys::derive(&element).open(&envelope.header.digest(), envelope.body, &envelope.tag)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::authority::Authority;

    struct World {
        pre: HybridPre<HashMapper>,
        alice_key: UserPrivateKey,
        bob_key: UserPrivateKey,
        carol_key: UserPrivateKey,
        trapdoor: TimeTrapDoor,
        early_trapdoor: TimeTrapDoor,
    }

    const ALICE: &str = "sender.alice@gmail.com";
    const BOB: &str = "bob@example.org";
    const CAROL: &str = "carol@example.org";
    const RELEASE: &str = "2025-5-5 12:00:00";
    const EARLY: &str = "2025-5-4 12:00:00";

    fn world() -> World {
        let mut rng = rand::thread_rng();
        let pkg = Authority::<Pkg>::setup(&mut rng);
        let ts = Authority::<TimeServer>::setup(&mut rng);
        let pre = HybridPre::new(SystemParams::new(&pkg, &ts));
        let mapper = HashMapper::new();
        let issue = |name: &str, rng: &mut rand::rngs::ThreadRng| {
            let id: IdentityValue<Pkg> = mapper.map_identity(name).unwrap();
            pkg.issue_key(rng, &id).unwrap()
        };
        let alice_key = issue(ALICE, &mut rng);
        let bob_key = issue(BOB, &mut rng);
        let carol_key = issue(CAROL, &mut rng);
        let release: IdentityValue<TimeServer> = mapper.map_identity(RELEASE).unwrap();
        let early: IdentityValue<TimeServer> = mapper.map_identity(EARLY).unwrap();
        World {
            pre,
            alice_key,
            bob_key,
            carol_key,
            trapdoor: ts.issue_key(&mut rng, &release).unwrap(),
            early_trapdoor: ts.issue_key(&mut rng, &early).unwrap(),
        }
    }

    #[test]
    fn test_seal_open() {
        let mut rng = rand::thread_rng();
        let w = world();
        let message = b"Hello, world!";
        let (sealed, _) = w
            .pre
            .seal(&mut rng, ALICE, &w.alice_key, RELEASE, message)
            .unwrap();
        let opened = w.pre.open(&w.alice_key, &w.trapdoor, &sealed).unwrap();
        assert_eq!(message.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_open_before_release() {
        let mut rng = rand::thread_rng();
        let w = world();
        let (sealed, _) = w
            .pre
            .seal(&mut rng, ALICE, &w.alice_key, RELEASE, b"Hello, world!")
            .unwrap();
        assert!(matches!(
            w.pre.open(&w.alice_key, &w.early_trapdoor, &sealed),
            Err(Error::CorrectnessMismatch)
        ));
    }

    #[test]
    fn test_delegated_open() {
        let mut rng = rand::thread_rng();
        let w = world();
        let message = b"Hello, Bob!";
        let (sealed, session) = w
            .pre
            .seal(&mut rng, ALICE, &w.alice_key, RELEASE, message)
            .unwrap();
        let (signed, token) = w
            .pre
            .delegate(&mut rng, session, &w.alice_key, &sealed, BOB)
            .unwrap();
        let resealed = w.pre.re_encrypt(&mut rng, &sealed, &signed).unwrap();
        let opened = w
            .pre
            .open_delegated(&w.bob_key, &token, &w.trapdoor, &signed, &resealed)
            .unwrap();
        assert_eq!(message.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_wrong_delegatee() {
        let mut rng = rand::thread_rng();
        let w = world();
        let (sealed, session) = w
            .pre
            .seal(&mut rng, ALICE, &w.alice_key, RELEASE, b"Hello, Bob!")
            .unwrap();
        let (signed, token) = w
            .pre
            .delegate(&mut rng, session, &w.alice_key, &sealed, BOB)
            .unwrap();
        let resealed = w.pre.re_encrypt(&mut rng, &sealed, &signed).unwrap();
        assert!(matches!(
            w.pre
                .open_delegated(&w.carol_key, &token, &w.trapdoor, &signed, &resealed),
            Err(Error::CorrectnessMismatch)
        ));
        assert!(matches!(
            w.pre
                .open_delegated(&w.bob_key, &token, &w.early_trapdoor, &signed, &resealed),
            Err(Error::CorrectnessMismatch)
        ));
    }

    #[test]
    fn test_tampered_delegation() {
        let mut rng = rand::thread_rng();
        let w = world();
        let (sealed, session) = w
            .pre
            .seal(&mut rng, ALICE, &w.alice_key, RELEASE, b"Hello, Bob!")
            .unwrap();
        let (mut signed, _) = w
            .pre
            .delegate(&mut rng, session, &w.alice_key, &sealed, BOB)
            .unwrap();
        signed.key = crate::delegate::DelegationKey(signed.key.0 + signed.key.0);
        assert!(matches!(
            w.pre.re_encrypt(&mut rng, &sealed, &signed),
            Err(Error::TamperedDelegation)
        ));
    }

    #[test]
    fn test_keys_from_derived_identities() {
        let mut rng = rand::thread_rng();
        let pkg = Authority::<Pkg>::setup(&mut rng);
        let ts = Authority::<TimeServer>::setup(&mut rng);
        let pre = HybridPre::new(SystemParams::new(&pkg, &ts));
        let alice_key = pkg
            .issue_key(&mut rng, &IdentityValue::derive_str("alice@example.org"))
            .unwrap();
        let trapdoor = ts
            .issue_key(&mut rng, &IdentityValue::derive_str(RELEASE))
            .unwrap();
        let (sealed, _) = pre
            .seal(&mut rng, "alice@example.org", &alice_key, RELEASE, b"Hello, world!")
            .unwrap();
        let opened = pre.open(&alice_key, &trapdoor, &sealed).unwrap();
        assert_eq!(b"Hello, world!".as_slice(), opened.as_slice());
    }

    #[test]
    fn test_malformed() {
        let w = world();
        assert!(matches!(
            w.pre.open(&w.alice_key, &w.trapdoor, b"not a ciphertext"),
            Err(Error::MalformedCiphertext)
        ));
    }

    #[test]
    fn test_tampered_body() {
        let mut rng = rand::thread_rng();
        let w = world();
        let (sealed, _) = w
            .pre
            .seal(&mut rng, ALICE, &w.alice_key, RELEASE, b"Hello, world!")
            .unwrap();
        let mut envelope = Envelope::<Ciphertext>::from_bytes(&sealed).unwrap();
        envelope.body[0] ^= 1;
        assert!(matches!(
            w.pre.open(&w.alice_key, &w.trapdoor, &envelope.to_bytes()),
            Err(Error::CorrectnessMismatch)
        ));
    }
}
