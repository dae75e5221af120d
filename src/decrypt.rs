//! Decryption by the sender and by a delegatee.
//!
//! The sender decrypts directly with its own key and the time trapdoor. A delegatee first
//! recovers the bridge value from its token ([`dec1`]) and then strips the proxy's cross term off
//! the re-encrypted ciphertext ([`dec2`]).
//!
//! None of these operations can tell whether they were given the right keys; a mismatch shows up
//! as a wrong plaintext. The [`hybrid`][crate::hybrid] layer turns that into an explicit
//! [`Error::CorrectnessMismatch`][crate::error::Error::CorrectnessMismatch].
use crate::{
    authority::{TimeTrapDoor, UserPrivateKey},
    delegate::{BridgeValue, DelegateeToken},
    encrypt::Ciphertext,
    group::{pair, Target},
    proxy::ReCiphertext,
};

/// `e(C1, K_t) · C2^{r_t}`, the time server's share of the unmasking.
fn time_layer(ciphertext: &Ciphertext, trapdoor: &TimeTrapDoor) -> Target {
    pair(&ciphertext.c1, &trapdoor.k) + ciphertext.c2 * trapdoor.r
}

/// Decrypts a ciphertext with the sender's own key.
pub fn sender_decrypt(
    ciphertext: &Ciphertext,
    key: &UserPrivateKey,
    trapdoor: &TimeTrapDoor,
) -> Target {
    time_layer(ciphertext, trapdoor)
        + pair(&ciphertext.c3, &key.k)
        + ciphertext.c4
        + ciphertext.c5
}

/// Recovers the bridge value from a delegatee token.
///
/// Only yields the value from the matching [`rk_gen`][crate::delegate::rk_gen] call if `key`
/// belongs to the identity the token was generated for.
pub fn dec1(key: &UserPrivateKey, token: &DelegateeToken) -> BridgeValue {
    BridgeValue(pair(&token.u, &key.k) + token.v * key.r + token.w)
}

/// Decrypts a re-encrypted ciphertext with the recovered bridge value.
pub fn dec2(reciphertext: &ReCiphertext, trapdoor: &TimeTrapDoor, bridge: &BridgeValue) -> Target {
    let inner = &reciphertext.inner;
    time_layer(inner, trapdoor) + reciphertext.c32 + inner.c4 + inner.c5
        - bridge.0
        - pair(&inner.c3, &(inner.c6 + reciphertext.rk2))
}
