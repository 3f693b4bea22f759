//! # GitBOM Core
//!
//! Deterministic, content-addressed identifiers for artifacts and their
//! dependency graphs.
//!
//! Every input is hashed exactly as git hashes a blob object. An artifact's
//! direct dependencies form an [`ArtifactTree`]; the tree's canonical text is
//! hashed again to give the artifact's bill-of-materials identity, and trees
//! nest by attaching that identity to a reference in another tree.
//!
//! ## Features
//!
//! - Git-compatible blob hashing under SHA-1 or SHA-256
//! - Insertion-order-independent canonical serialization
//! - SHA-256 bill-of-materials identities and SHA-1 git-compatible refs
//! - A content-addressed on-disk store for serialized trees
//! - Symlink-following filesystem walking
//!
//! ## Example
//!
//! ```no_run
//! use gitbom_core::{ArtifactTree, HashAlgorithm, NestedBom, Store};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Describe the inputs of a build
//! let mut inputs = ArtifactTree::new();
//! inputs.add_path(Path::new("./src"), HashAlgorithm::Sha1)?;
//!
//! // The output artifact depends on that tree
//! let mut artifact = ArtifactTree::new();
//! artifact.add_reference(b"binary contents", Some(NestedBom::Tree(&inputs)), HashAlgorithm::Sha1);
//!
//! // Persist both trees
//! let store = Store::open_or_init("./.bom", HashAlgorithm::Sha1)?;
//! store.put_tree(&inputs)?;
//! let id = store.put_tree(&artifact)?;
//! println!("{}", id);
//! # Ok(())
//! # }
//! ```

mod error;
mod hash;
mod identifier;
mod shared;
mod store;
mod tree;
mod walk;

pub use error::{Error, Result};
pub use hash::{HashAlgorithm, hash_bytes, hash_file, hash_object};
pub use identifier::Identifier;
pub use shared::SharedArtifactTree;
pub use store::Store;
pub use tree::{ArtifactTree, BOM_ALGORITHM, GIT_ALGORITHM, NestedBom, Reference};
