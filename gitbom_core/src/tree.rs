//! Artifact trees: canonical reference sets and their identities.
//!
//! An [`ArtifactTree`] records the direct dependencies of an artifact as a set
//! of [`Reference`]s. Its canonical serialization is one line per reference:
//!
//! ```text
//! blob <blob-id>[ bom <tree-id>]\n
//! ```
//!
//! with lines in ascending order, so the text (and every hash of it) depends
//! only on the set of references, never on the order they were added in.

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use crate::identifier::Identifier;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Algorithm for bill-of-materials identities, including nested `bom` ids.
pub const BOM_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Algorithm for git-compatible references.
pub const GIT_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha1;

/// One direct dependency of an artifact tree.
///
/// The derived ordering (blob id, then absent-before-present bom id) sorts
/// references exactly like their serialized lines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Reference {
    blob_hash: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    bom: Option<Identifier>,
}

impl Reference {
    /// Create a reference to a blob, optionally attached to a nested tree.
    pub fn new(blob_hash: Identifier, bom: Option<Identifier>) -> Self {
        Self { blob_hash, bom }
    }

    /// Object hash of the referenced content.
    pub fn blob_hash(&self) -> &Identifier {
        &self.blob_hash
    }

    /// Identity of the tree this reference depends on, if any.
    pub fn bom(&self) -> Option<&Identifier> {
        self.bom.as_ref()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob {}", self.blob_hash)?;
        if let Some(bom) = &self.bom {
            write!(f, " bom {}", bom)?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = Error;

    /// Parse a single serialized line, without its trailing newline.
    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split(' ');
        match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some("blob"), Some(blob), None, None, None) => {
                Ok(Reference::new(Identifier::parse(blob)?, None))
            }
            (Some("blob"), Some(blob), Some("bom"), Some(bom), None) => Ok(Reference::new(
                Identifier::parse(blob)?,
                Some(Identifier::parse(bom)?),
            )),
            _ => Err(Error::invalid_tree_entry(format!(
                "Malformed line: {:?}",
                line
            ))),
        }
    }
}

/// The nested bill of materials attached to a reference.
#[derive(Debug, Clone)]
pub enum NestedBom<'a> {
    /// Use the tree's [`ArtifactTree::identity`], computed at insertion time.
    Tree(&'a ArtifactTree),
    /// Use this identifier verbatim.
    Identifier(Identifier),
}

impl NestedBom<'_> {
    /// The identifier to record in the reference.
    pub fn resolve(self) -> Identifier {
        match self {
            NestedBom::Tree(tree) => tree.identity(),
            NestedBom::Identifier(id) => id,
        }
    }
}

impl<'a> From<&'a ArtifactTree> for NestedBom<'a> {
    fn from(tree: &'a ArtifactTree) -> Self {
        NestedBom::Tree(tree)
    }
}

impl From<Identifier> for NestedBom<'_> {
    fn from(id: Identifier) -> Self {
        NestedBom::Identifier(id)
    }
}

/// A canonically ordered, deduplicated set of references.
///
/// Trees only grow. Every read (`serialize`, `identity`, `git_compat_ref`) is a
/// pure function of the current reference set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactTree {
    references: BTreeSet<Reference>,
}

impl ArtifactTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `content` and add a reference to it.
    ///
    /// A nested tree contributes its [`identity`](Self::identity) (SHA-256),
    /// never its git-compatible ref; pass an explicit identifier to attach
    /// anything else. Re-adding an equal reference is a no-op.
    pub fn add_reference(
        &mut self,
        content: &[u8],
        bom: Option<NestedBom<'_>>,
        algorithm: HashAlgorithm,
    ) -> Reference {
        let reference = Reference::new(
            hash::hash_bytes(content, algorithm),
            bom.map(NestedBom::resolve),
        );
        self.insert(reference.clone());
        reference
    }

    /// Stream exactly `length` bytes from `reader` and add a reference to them.
    ///
    /// `bom` is attached verbatim. On a short or long read the tree is left
    /// unchanged and [`Error::LengthMismatch`] is returned.
    pub fn add_reference_from_reader<R: Read>(
        &mut self,
        reader: R,
        bom: Option<Identifier>,
        length: u64,
        algorithm: HashAlgorithm,
    ) -> Result<Reference> {
        let reference = Reference::new(hash::hash_object(reader, length, algorithm)?, bom);
        self.insert(reference.clone());
        Ok(reference)
    }

    fn insert(&mut self, reference: Reference) {
        if self.references.insert(reference) {
            tracing::trace!(references = self.references.len(), "added reference");
        }
    }

    /// Add every reference of `other`.
    pub(crate) fn merge(&mut self, other: ArtifactTree) {
        self.references.extend(other.references);
    }

    /// The current references, in canonical order.
    pub fn references(&self) -> &BTreeSet<Reference> {
        &self.references
    }

    /// Number of distinct references.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Whether the tree has no references.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Canonical text form. Empty for an empty tree.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Bill-of-materials identity (SHA-256).
    pub fn identity(&self) -> Identifier {
        self.identity_with(BOM_ALGORITHM)
    }

    /// Object hash of the canonical serialization under `algorithm`.
    pub fn identity_with(&self, algorithm: HashAlgorithm) -> Identifier {
        hash::hash_bytes(self.serialize().as_bytes(), algorithm)
    }

    /// Git-compatible reference (SHA-1), the id git would give the
    /// serialization as a blob.
    pub fn git_compat_ref(&self) -> Identifier {
        self.git_compat_ref_with(GIT_ALGORITHM)
    }

    /// Same computation as [`identity_with`](Self::identity_with).
    pub fn git_compat_ref_with(&self, algorithm: HashAlgorithm) -> Identifier {
        self.identity_with(algorithm)
    }

    /// Parse a serialized tree.
    ///
    /// Every line must be newline-terminated and well formed. Lines may come
    /// in any order and duplicates collapse, so the result re-serializes
    /// canonically.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tree = Self::new();
        if text.is_empty() {
            return Ok(tree);
        }

        let body = text
            .strip_suffix('\n')
            .ok_or_else(|| Error::invalid_tree_entry("Missing trailing newline"))?;

        for line in body.split('\n') {
            tree.references.insert(line.parse()?);
        }

        Ok(tree)
    }
}

impl fmt::Display for ArtifactTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reference in &self.references {
            writeln!(f, "{}", reference)?;
        }
        Ok(())
    }
}

impl FromStr for ArtifactTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HELLO_WORLD_TREE: &str = "blob 04fea06420ca60892f73becee3614f6d023a4b7f\n\
                                    blob b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0\n";

    fn add_str(tree: &mut ArtifactTree, s: &str) {
        tree.add_reference_from_reader(
            Cursor::new(s.as_bytes()),
            None,
            s.len() as u64,
            HashAlgorithm::Sha1,
        )
        .unwrap();
    }

    fn hello_world() -> ArtifactTree {
        let mut tree = ArtifactTree::new();
        add_str(&mut tree, "hello");
        add_str(&mut tree, "world");
        tree
    }

    #[test]
    fn test_flat_workflow() {
        let tree = hello_world();
        assert_eq!(tree.serialize(), HELLO_WORLD_TREE);
        assert_eq!(
            tree.git_compat_ref().as_str(),
            "dc0be356e8c2ba26e66448d97db76ad050206574"
        );
        assert_eq!(
            tree.identity().as_str(),
            "588ed637c6073a58e79f4fc63a85158eafed022a2b791f7765c28a3c3d1797d6"
        );
    }

    #[test]
    fn test_insertion_order_independent() {
        let mut reversed = ArtifactTree::new();
        add_str(&mut reversed, "world");
        add_str(&mut reversed, "hello");

        assert_eq!(reversed.serialize(), HELLO_WORLD_TREE);
        assert_eq!(reversed, hello_world());
        assert_eq!(reversed.identity(), hello_world().identity());
    }

    #[test]
    fn test_nested_workflow() {
        let gb = hello_world();
        let mut gb2 = ArtifactTree::new();

        gb2.add_reference(b"hello2", Some(NestedBom::Tree(&gb)), HashAlgorithm::Sha1);
        gb2.add_reference(b"independent", None, HashAlgorithm::Sha1);
        assert_eq!(
            gb2.serialize(),
            "blob 23294b0610492cf55c1c4835216f20d376a287dd bom 588ed637c6073a58e79f4fc63a85158eafed022a2b791f7765c28a3c3d1797d6\n\
             blob be78cc5602c5457f144a67e574b8f98b9dc2a1a0\n"
        );

        let opaque =
            Identifier::parse("a87d2b20b13568a5530ec6a59dacfdda8ee3cd1e3d63c9d13da26d27e3447812")
                .unwrap();
        gb2.add_reference(b"opaque", Some(opaque.into()), HashAlgorithm::Sha256);
        assert_eq!(
            gb2.serialize(),
            "blob 23294b0610492cf55c1c4835216f20d376a287dd bom 588ed637c6073a58e79f4fc63a85158eafed022a2b791f7765c28a3c3d1797d6\n\
             blob be78cc5602c5457f144a67e574b8f98b9dc2a1a0\n\
             blob dcf17826ff7a346e6b09704314fb5ef4c9fcceb85c2936b45cab13bc7167991a bom a87d2b20b13568a5530ec6a59dacfdda8ee3cd1e3d63c9d13da26d27e3447812\n"
        );
        assert_eq!(
            gb2.identity().as_str(),
            "7ef8fba8d888bfa5c9048df305721ee1e7e9b9438f2f2a343fc7345de855e44a"
        );
        assert_eq!(
            gb2.git_compat_ref().as_str(),
            "d9837be69ef5263064fd79658b888de60d64db44"
        );
    }

    #[test]
    fn test_nested_tree_uses_identity_not_git_ref() {
        let gb = hello_world();
        let mut gb2 = ArtifactTree::new();
        let reference = gb2.add_reference(b"hello2", Some((&gb).into()), HashAlgorithm::Sha1);

        assert_eq!(reference.bom(), Some(&gb.identity()));
        assert_ne!(reference.bom(), Some(&gb.git_compat_ref()));
    }

    #[test]
    fn test_stream_bom_attached_verbatim() {
        let bom = hello_world().git_compat_ref();
        let mut tree = ArtifactTree::new();
        let reference = tree
            .add_reference_from_reader(
                Cursor::new(b"hello2"),
                Some(bom.clone()),
                6,
                HashAlgorithm::Sha1,
            )
            .unwrap();

        assert_eq!(reference.bom(), Some(&bom));
        assert_eq!(
            tree.serialize(),
            "blob 23294b0610492cf55c1c4835216f20d376a287dd bom dc0be356e8c2ba26e66448d97db76ad050206574\n"
        );
    }

    #[test]
    fn test_duplicate_reference_idempotent() {
        let mut tree = hello_world();
        add_str(&mut tree, "hello");
        tree.add_reference(b"world", None, HashAlgorithm::Sha1);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.serialize(), HELLO_WORLD_TREE);
    }

    #[test]
    fn test_same_blob_different_bom_kept() {
        let nested = hello_world();
        let mut tree = ArtifactTree::new();
        tree.add_reference(b"hello", None, HashAlgorithm::Sha1);
        tree.add_reference(b"hello", Some((&nested).into()), HashAlgorithm::Sha1);

        assert_eq!(tree.len(), 2);
        let serialized = tree.serialize();
        let lines: Vec<&str> = serialized.lines().collect();
        assert_eq!(lines[0], "blob b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert!(lines[1].starts_with("blob b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0 bom "));
    }

    #[test]
    fn test_reads_are_idempotent() {
        let tree = hello_world();
        assert_eq!(tree.serialize(), tree.serialize());
        assert_eq!(tree.identity(), tree.identity());
        assert_eq!(tree.git_compat_ref(), tree.git_compat_ref());
    }

    #[test]
    fn test_empty_tree() {
        let tree = ArtifactTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.serialize(), "");
        // Object hash of zero-length content
        assert_eq!(
            tree.identity().as_str(),
            "473a0f4c3be8a93681a267e3b1e9a7dcda1185436fe141f7749120a303721813"
        );
        assert_eq!(
            tree.git_compat_ref().as_str(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
    }

    #[test]
    fn test_explicit_algorithms() {
        let tree = hello_world();
        assert_eq!(tree.identity_with(HashAlgorithm::Sha1), tree.git_compat_ref());
        assert_eq!(tree.git_compat_ref_with(HashAlgorithm::Sha256), tree.identity());
    }

    #[test]
    fn test_failed_stream_leaves_tree_unchanged() {
        let mut tree = hello_world();

        let short = tree.add_reference_from_reader(
            Cursor::new(b"hello world"),
            None,
            12,
            HashAlgorithm::Sha1,
        );
        assert!(matches!(short, Err(Error::LengthMismatch { .. })));

        let long = tree.add_reference_from_reader(
            Cursor::new(b"hello world"),
            None,
            10,
            HashAlgorithm::Sha1,
        );
        assert!(matches!(long, Err(Error::LengthMismatch { .. })));

        assert_eq!(tree.serialize(), HELLO_WORLD_TREE);
    }

    #[test]
    fn test_mixed_length_ordering() {
        let short = "ab".repeat(20);
        let long = format!("{}{}", short, "00".repeat(12));
        let mut tree = ArtifactTree::new();
        tree.insert(Reference::new(Identifier::parse(&long).unwrap(), None));
        tree.insert(Reference::new(
            Identifier::parse(&short).unwrap(),
            Some(Identifier::parse(&long).unwrap()),
        ));
        tree.insert(Reference::new(Identifier::parse(&short).unwrap(), None));

        let serialized = tree.serialize();
        let lines: Vec<&str> = serialized.lines().collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
        assert_eq!(lines[0], format!("blob {}", short));
    }

    #[test]
    fn test_parse_roundtrip() {
        let text = "blob 23294b0610492cf55c1c4835216f20d376a287dd bom 588ed637c6073a58e79f4fc63a85158eafed022a2b791f7765c28a3c3d1797d6\n\
                    blob be78cc5602c5457f144a67e574b8f98b9dc2a1a0\n";
        let tree: ArtifactTree = text.parse().unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.serialize(), text);

        assert!(ArtifactTree::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_canonicalizes() {
        let text = "blob b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0\n\
                    blob 04fea06420ca60892f73becee3614f6d023a4b7f\n\
                    blob b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0\n";
        let tree = ArtifactTree::parse(text).unwrap();
        assert_eq!(tree.serialize(), HELLO_WORLD_TREE);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let id = "04fea06420ca60892f73becee3614f6d023a4b7f";

        // Missing trailing newline
        assert!(ArtifactTree::parse(&format!("blob {}", id)).is_err());
        // Blank line
        assert!(ArtifactTree::parse(&format!("blob {}\n\n", id)).is_err());
        // Wrong keyword
        assert!(ArtifactTree::parse(&format!("tree {}\n", id)).is_err());
        // Dangling bom
        assert!(ArtifactTree::parse(&format!("blob {} bom\n", id)).is_err());
        // Trailing field
        assert!(ArtifactTree::parse(&format!("blob {} bom {} x\n", id, id)).is_err());
        // Double space
        assert!(ArtifactTree::parse(&format!("blob  {}\n", id)).is_err());
        // Bad identifier
        assert!(matches!(
            ArtifactTree::parse(&format!("blob {}\n", id.to_uppercase())),
            Err(Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_reference_serialize_json() {
        let reference = Reference::new(
            Identifier::parse("04fea06420ca60892f73becee3614f6d023a4b7f").unwrap(),
            None,
        );
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "blob_hash": "04fea06420ca60892f73becee3614f6d023a4b7f" })
        );
    }

    // Property-based tests
    use proptest::prelude::*;

    fn arb_identifier() -> impl Strategy<Value = Identifier> {
        "[0-9a-f]{40}|[0-9a-f]{64}".prop_map(|s| Identifier::parse(&s).unwrap())
    }

    fn arb_reference() -> impl Strategy<Value = Reference> {
        (arb_identifier(), prop::option::of(arb_identifier()))
            .prop_map(|(blob, bom)| Reference::new(blob, bom))
    }

    fn tree_of(references: &[Reference]) -> ArtifactTree {
        let mut tree = ArtifactTree::new();
        for reference in references {
            tree.insert(reference.clone());
        }
        tree
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Serialization is independent of insertion order
        #[test]
        fn prop_order_independent(
            contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16)
        ) {
            let mut forward = ArtifactTree::new();
            for content in &contents {
                forward.add_reference(content, None, HashAlgorithm::Sha1);
            }

            let mut backward = ArtifactTree::new();
            for content in contents.iter().rev() {
                backward.add_reference(content, None, HashAlgorithm::Sha1);
            }

            prop_assert_eq!(forward.serialize(), backward.serialize());
            prop_assert_eq!(forward.identity(), backward.identity());
        }

        /// Serialized lines are sorted and unique
        #[test]
        fn prop_lines_sorted(references in prop::collection::vec(arb_reference(), 0..32)) {
            let serialized = tree_of(&references).serialize();
            let lines: Vec<&str> = serialized.lines().collect();
            let mut expected = lines.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(lines, expected);
        }

        /// parse is the inverse of serialize
        #[test]
        fn prop_parse_roundtrip(references in prop::collection::vec(arb_reference(), 0..32)) {
            let tree = tree_of(&references);
            let parsed = ArtifactTree::parse(&tree.serialize())?;
            prop_assert_eq!(parsed, tree);
        }

        /// Re-adding existing references changes nothing
        #[test]
        fn prop_readd_idempotent(references in prop::collection::vec(arb_reference(), 1..16)) {
            let mut tree = tree_of(&references);
            let before = tree.identity();
            for reference in &references {
                tree.insert(reference.clone());
            }
            prop_assert_eq!(tree.identity(), before);
        }
    }
}
