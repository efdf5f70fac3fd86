pub mod fingerprint;
pub mod xxhash;

pub use fingerprint::{Fingerprint, FingerprintMode, Fingerprinter};
