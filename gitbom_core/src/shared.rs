//! Lock-guarded artifact tree for concurrent builders.

use crate::error::Result;
use crate::hash::HashAlgorithm;
use crate::identifier::Identifier;
use crate::tree::{ArtifactTree, NestedBom, Reference};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::io::Read;

/// An [`ArtifactTree`] that can be grown and read from several threads.
///
/// Every operation holds one lock for its whole duration, so readers never
/// see a half-applied addition. A streamed addition keeps the lock while it
/// reads its content.
#[derive(Debug, Default)]
pub struct SharedArtifactTree {
    inner: Mutex<ArtifactTree>,
}

impl SharedArtifactTree {
    /// Create an empty shared tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`ArtifactTree::add_reference`].
    pub fn add_reference(
        &self,
        content: &[u8],
        bom: Option<NestedBom<'_>>,
        algorithm: HashAlgorithm,
    ) -> Reference {
        self.inner.lock().add_reference(content, bom, algorithm)
    }

    /// See [`ArtifactTree::add_reference_from_reader`].
    pub fn add_reference_from_reader<R: Read>(
        &self,
        reader: R,
        bom: Option<Identifier>,
        length: u64,
        algorithm: HashAlgorithm,
    ) -> Result<Reference> {
        self.inner
            .lock()
            .add_reference_from_reader(reader, bom, length, algorithm)
    }

    /// Copy of the current references.
    pub fn references(&self) -> BTreeSet<Reference> {
        self.inner.lock().references().clone()
    }

    /// Copy of the current tree.
    pub fn snapshot(&self) -> ArtifactTree {
        self.inner.lock().clone()
    }

    pub fn serialize(&self) -> String {
        self.inner.lock().serialize()
    }

    pub fn identity(&self) -> Identifier {
        self.inner.lock().identity()
    }

    pub fn identity_with(&self, algorithm: HashAlgorithm) -> Identifier {
        self.inner.lock().identity_with(algorithm)
    }

    pub fn git_compat_ref(&self) -> Identifier {
        self.inner.lock().git_compat_ref()
    }

    pub fn git_compat_ref_with(&self, algorithm: HashAlgorithm) -> Identifier {
        self.inner.lock().git_compat_ref_with(algorithm)
    }

    /// Consume the wrapper and return the tree.
    pub fn into_inner(self) -> ArtifactTree {
        self.inner.into_inner()
    }
}

impl From<ArtifactTree> for SharedArtifactTree {
    fn from(tree: ArtifactTree) -> Self {
        Self {
            inner: Mutex::new(tree),
        }
    }
}
