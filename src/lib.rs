//! Implementation of Identity-Based Timed-Release Proxy Re-Encryption (IB-TR-PRE).
//!
//! # ⚠️ Warning: Cryptographic Hazmat ☣️
//!
//! This crate is made for playing around with timed-release proxy re-encryption and for
//! prototyping of applications and protocols using it. It has *not* been audited, it is *not*
//! battle tested, and *nobody* claims it to be secure.
//!
//! Use it at **your own risk** and if you know what you are doing!
//!
//! # Introduction
//!
//! In IB-TR-PRE, a sender encrypts data under its own identity and a release time. Two
//! independent authorities are involved: a private key generator (PKG) issues keys for user
//! identities, and a time server publishes a trapdoor for each release time once that time has
//! come. Nobody can decrypt before the trapdoor is published, not even the sender.
//!
//! The sender can later delegate a ciphertext to another identity. It hands a delegation key to a
//! semi-trusted proxy, which transforms the ciphertext without learning anything about the
//! plaintext, and a token to the delegatee. The delegatee combines token, transformed ciphertext,
//! its own key and the time trapdoor to recover the plaintext.
//!
//! # Crate Structure
//!
//! The protocol operations work directly on group elements:
//!
//! * [`authority`] contains key generation for both authorities, as [`authority::Authority`].
//! * [`encrypt`], [`delegate`], [`proxy`] and [`decrypt`] contain the operations of the sender,
//!   the proxy and the delegatee.
//! * [`cca`] wraps those operations with one-time signatures ([`ots`]), so that the proxy and the
//!   delegatee reject delegations that were not made for the ciphertext at hand.
//!
//! To aid in using those algorithms, a higher-level wrapper is provided in the [`hybrid`]
//! submodule, mainly in the [`hybrid::HybridPre`] struct. This allows you to deal with bytes
//! instead of group elements.
//!
//! Identities are domain-separated by type: an [`identity::IdentityValue<Pkg>`][identity::IdentityValue]
//! can never be used where a release time is expected. The bridge between application identities
//! and [`identity::IdentityValue`] is provided by [`identity::Mapper`].
//!
//! The algorithms in this crate are implemented on top of
//! [`bls_12_381_plus`](https://crates.io/crates/bls12_381_plus). The protocol is defined over a
//! symmetric pairing, which [`group`] emulates on the asymmetric BLS12-381 curve.
pub mod authority;
pub mod cca;
pub mod decrypt;
pub mod delegate;
pub mod domain;
pub mod encrypt;
pub mod ephemeral;
pub mod error;
pub mod group;
pub mod hybrid;
pub mod identity;
pub mod ots;
pub mod proxy;

pub use domain::{Pkg, TimeServer};
pub use identity::Mapper;

/// A trait to provide byte-level access to objects.
pub trait ByteAccess {
    /// Provides access to the bytes.
    ///
    /// Unlike [`AsRef`], there are no statements made about the performance of this operation.
    /// This operation will allocate a fresh vector, and the byte representation may or may not
    /// have to be computed first.
    fn bytes(&self) -> Vec<u8>;

    /// Provide a short fingerprint of the bytes.
    ///
    /// This can be used to "summarize" long keys when displaying them, to still provide
    /// distinguishing features but to not print out the whole key.
    ///
    /// By default, this method uses the first 16 bytes of the [`ByteAccess::bytes`]
    /// representation, and formats them as a hex string.
    fn fingerprint(&self) -> String {
        hex::encode(&self.bytes()[..16])
    }
}
