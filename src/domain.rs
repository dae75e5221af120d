//! Marker types for the two independent authorities.
//!
//! Every key, parameter set and identity value in this crate is tagged with the authority that
//! issued it. Mixing material across authorities therefore fails to type-check.
use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// An authority domain.
pub trait Domain: sealed::Sealed + Debug + Clone + Copy + PartialEq + Eq + Send + Sync + 'static {
    /// Human readable label, also used to separate identity hashes between domains.
    const LABEL: &'static str;
    /// Tag byte written in front of serialized identity values.
    const TAG: u8;
}

/// The private key generator, issuing user private keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pkg;

impl sealed::Sealed for Pkg {}

impl Domain for Pkg {
    const LABEL: &'static str = "ibtrpre/pkg";
    const TAG: u8 = 0x01;
}

/// The time server, issuing trapdoors for release times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeServer;

impl sealed::Sealed for TimeServer {}

impl Domain for TimeServer {
    const LABEL: &'static str = "ibtrpre/time-server";
    const TAG: u8 = 0x02;
}
