//! Git-compatible object hashing using SHA-1 or SHA-256.

use crate::error::{Error, Result};
use crate::identifier::Identifier;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    /// SHA-1 with 160-bit output (native git object ids).
    Sha1,
    /// SHA-256 with 256-bit output.
    Sha256,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha1, HashAlgorithm::Sha256];

    /// Returns the string representation of the algorithm (for config files).
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }

    /// Digest size in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    /// Length of the lower-case hex encoding of a digest.
    pub fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// The algorithm whose hex digests are `len` characters long, if any.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|algo| algo.hex_len() == len)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Hash exactly `length` bytes from `reader` as a git blob object.
///
/// The digest covers `"blob <length>\0"` followed by the content, which is
/// what `git hash-object` computes for a regular file. Fails with
/// [`Error::LengthMismatch`] if the reader yields fewer than `length` bytes or
/// still has data after `length` bytes were consumed.
pub fn hash_object<R: Read>(reader: R, length: u64, algorithm: HashAlgorithm) -> Result<Identifier> {
    match algorithm {
        HashAlgorithm::Sha1 => digest_object::<Sha1, R>(reader, length),
        HashAlgorithm::Sha256 => digest_object::<Sha256, R>(reader, length),
    }
}

/// Hash an in-memory buffer as a git blob object.
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> Identifier {
    match algorithm {
        HashAlgorithm::Sha1 => digest_bytes::<Sha1>(data),
        HashAlgorithm::Sha256 => digest_bytes::<Sha256>(data),
    }
}

/// Hash a file as a git blob object, using its size on disk as the length.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<Identifier> {
    let file = std::fs::File::open(path)?;
    let length = file.metadata()?.len();
    hash_object(file, length, algorithm)
}

fn object_header(length: u64) -> String {
    format!("blob {}\0", length)
}

fn digest_bytes<D: Digest>(data: &[u8]) -> Identifier {
    let mut hasher = D::new();
    hasher.update(object_header(data.len() as u64));
    hasher.update(data);
    Identifier::from_digest(&hasher.finalize())
}

fn digest_object<D: Digest + Write, R: Read>(mut reader: R, length: u64) -> Result<Identifier> {
    let mut hasher = D::new();
    hasher.update(object_header(length));

    let copied = io::copy(&mut (&mut reader).take(length), &mut hasher)?;
    if copied != length {
        return Err(Error::length_mismatch(length, copied));
    }

    // One more byte must not be available.
    if read_probe(&mut reader)? {
        return Err(Error::length_mismatch(length, length + 1));
    }

    let identifier = Identifier::from_digest(&hasher.finalize());
    tracing::trace!(%identifier, length, "hashed object");
    Ok(identifier)
}

/// Try to read a single byte, returning whether one was available.
fn read_probe<R: Read>(reader: &mut R) -> io::Result<bool> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
