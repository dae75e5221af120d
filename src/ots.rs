//! Winternitz one-time signatures over SHA3-256.
//!
//! Used to bind delegation material to the session that produced a ciphertext. The scheme has
//! the property the protocol needs: the public key can be recomputed from a signature and the
//! signed message, and a different message recomputes to a different key.
//!
//! Parameters are `n = 32` bytes and `w = 16`, giving 64 message digits and 3 checksum digits.
//! Chain steps are tweaked with a per-key public seed, the chain index and the step index.
use std::fmt::{self, Debug};

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Hash output length in bytes.
pub const N: usize = 32;
/// Winternitz parameter.
pub const W: u8 = 16;
const MESSAGE_DIGITS: usize = 2 * N;
const CHECKSUM_DIGITS: usize = 3;
/// Number of hash chains per key.
pub const CHAINS: usize = MESSAGE_DIGITS + CHECKSUM_DIGITS;

type Block = [u8; N];

/// Compressed public key.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OtsPublicKey(pub(crate) Block);

impl OtsPublicKey {
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }
}

impl Debug for OtsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OtsPublicKey")
            .field(&hex::encode(&self.0[..16]))
            .finish()
    }
}

/// Secret key. Signing consumes it.
pub struct OtsSecretKey {
    seed: Block,
    public_seed: Block,
}

impl Debug for OtsSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtsSecretKey(..)")
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct OtsSignature {
    public_seed: Block,
    chains: Vec<Block>,
}

fn chain(public_seed: &Block, index: usize, start: u8, steps: u8, mut value: Block) -> Block {
    for step in start..start + steps {
        let mut hasher = Sha3_256::new();
        hasher.update(b"ibtrpre/ots/chain");
        hasher.update(public_seed);
        hasher.update((index as u16).to_be_bytes());
        hasher.update([step]);
        hasher.update(value);
        value = hasher.finalize().into();
    }
    value
}

fn compress(public_seed: &Block, ends: &[Block]) -> OtsPublicKey {
    let mut hasher = Sha3_256::new();
    hasher.update(b"ibtrpre/ots/pk");
    hasher.update(public_seed);
    for end in ends {
        hasher.update(end);
    }
    OtsPublicKey(hasher.finalize().into())
}

/// Splits the message digest into base-`w` digits and appends the checksum digits.
fn digits(message: &[u8]) -> [u8; CHAINS] {
    let digest = Sha3_256::digest(message);
    let mut digits = [0; CHAINS];
    for (i, byte) in digest.iter().enumerate() {
        digits[2 * i] = byte >> 4;
        digits[2 * i + 1] = byte & 0x0f;
    }
    let checksum: u16 = digits[..MESSAGE_DIGITS]
        .iter()
        .map(|d| u16::from(W - 1 - d))
        .sum();
    digits[MESSAGE_DIGITS] = ((checksum >> 8) & 0x0f) as u8;
    digits[MESSAGE_DIGITS + 1] = ((checksum >> 4) & 0x0f) as u8;
    digits[MESSAGE_DIGITS + 2] = (checksum & 0x0f) as u8;
    digits
}

impl OtsSecretKey {
    fn chain_start(&self, index: usize) -> Block {
        let mut hasher = Sha3_256::new();
        hasher.update(b"ibtrpre/ots/sk");
        hasher.update(self.seed);
        hasher.update((index as u16).to_be_bytes());
        hasher.finalize().into()
    }

    fn public_key(&self) -> OtsPublicKey {
        let ends: Vec<Block> = (0..CHAINS)
            .map(|i| chain(&self.public_seed, i, 0, W - 1, self.chain_start(i)))
            .collect();
        compress(&self.public_seed, &ends)
    }

    /// Signs `message`, using up the key.
    pub fn sign(self, message: &[u8]) -> OtsSignature {
        let chains = digits(message)
            .iter()
            .enumerate()
            .map(|(i, &d)| chain(&self.public_seed, i, 0, d, self.chain_start(i)))
            .collect();
        OtsSignature {
            public_seed: self.public_seed,
            chains,
        }
    }
}

impl OtsSignature {
    /// Recomputes the public key that signed `message`.
    ///
    /// Returns `None` if the signature does not have the right shape. A signature over a
    /// different message yields a different key.
    pub fn recover_public_key(&self, message: &[u8]) -> Option<OtsPublicKey> {
        if self.chains.len() != CHAINS {
            return None;
        }
        let ends: Vec<Block> = digits(message)
            .iter()
            .zip(&self.chains)
            .enumerate()
            .map(|(i, (&d, value))| chain(&self.public_seed, i, d, W - 1 - d, *value))
            .collect();
        Some(compress(&self.public_seed, &ends))
    }
}

/// Generates a fresh key pair.
pub fn keygen<R: Rng + CryptoRng>(mut rng: R) -> (OtsPublicKey, OtsSecretKey) {
    let secret = OtsSecretKey {
        seed: rng.gen(),
        public_seed: rng.gen(),
    };
    (secret.public_key(), secret)
}
