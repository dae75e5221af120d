use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The identity value collides with the authority's master secret")]
    DomainCollision,
    #[error("The supplied material belongs to the other authority domain")]
    CrossDomainMisuse,
    #[error("The delegation signature does not match the ciphertext commitment")]
    TamperedDelegation,
    #[error("The recovered plaintext failed authentication")]
    CorrectnessMismatch,
    #[error("The supplied identity value was malformed")]
    MalformedIdentity,
    #[error("The supplied group element was malformed")]
    MalformedElement,
    #[error("The supplied ciphertext was malformed")]
    MalformedCiphertext,
}

pub type Result<V, E=Error> = std::result::Result<V, E>;
