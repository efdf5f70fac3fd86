use super::xxhash;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Marker written into profiles generated by the setup wizard.
pub const DEFAULT_MARKER: &str = "# Universal Development Environment";

static UNREADABLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Equality key used to group candidate files believed to hold the same content.
///
/// Only equality matters. `Unreadable` values are unique per call so a file
/// that could not be read never groups with anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    Content {
        len: u64,
        hash: u64,
    },
    Signature {
        len: usize,
        first: Option<char>,
        last: Option<char>,
        marker: bool,
    },
    Unreadable(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// XxHash64 over the full file bytes.
    #[default]
    Content,
    /// Length, first/last character and marker presence. Cheap but two
    /// different files can collide.
    Signature,
}

#[derive(Debug, Clone)]
pub struct Fingerprinter {
    mode: FingerprintMode,
    marker: String,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(FingerprintMode::Content)
    }
}

impl Fingerprinter {
    pub fn new(mode: FingerprintMode) -> Self {
        Self {
            mode,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn mode(&self) -> FingerprintMode {
        self.mode
    }

    pub fn fingerprint(&self, path: &Path) -> Fingerprint {
        let result = match self.mode {
            FingerprintMode::Content => {
                xxhash::hash_file(path).map(|(len, hash)| Fingerprint::Content { len, hash })
            }
            FingerprintMode::Signature => fs::read(path).map(|bytes| {
                let text = String::from_utf8_lossy(&bytes);
                signature_of(&text, &self.marker)
            }),
        };

        match result {
            Ok(fp) => {
                trace!("Fingerprint for {}: {:?}", path.display(), fp);
                fp
            }
            Err(e) => {
                debug!("Could not read {} for fingerprinting: {}", path.display(), e);
                unreadable()
            }
        }
    }
}

fn signature_of(text: &str, marker: &str) -> Fingerprint {
    let len = text.chars().count();
    Fingerprint::Signature {
        len,
        first: text.chars().next(),
        last: if len > 1 { text.chars().last() } else { None },
        marker: !marker.is_empty() && text.contains(marker),
    }
}

fn unreadable() -> Fingerprint {
    Fingerprint::Unreadable(UNREADABLE_COUNTER.fetch_add(1, Ordering::Relaxed))
}
