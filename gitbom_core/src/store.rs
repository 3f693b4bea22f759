//! Store management and object I/O.
//!
//! Artifact trees are persisted as their canonical serialization, named by
//! their bill-of-materials identity:
//!
//! ```text
//! <root>/config
//! <root>/object/<first 2 hex chars>/<remaining hex chars>
//! ```

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::identifier::Identifier;
use crate::tree::ArtifactTree;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: &str = "1";

/// A content-addressed store of serialized artifact trees.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    algorithm: HashAlgorithm,
}

impl Store {
    /// Initialize a new store at the given path.
    ///
    /// Creates the directory structure:
    /// - `object/` for storing serialized trees
    /// - `config` file with version and blob hashing algorithm
    pub fn init<P: AsRef<Path>>(root: P, algorithm: HashAlgorithm) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("object"))?;

        let config_content = format!("version={}\nalgo={}\n", CONFIG_VERSION, algorithm);
        fs::write(root.join("config"), config_content)?;

        tracing::debug!(root = %root.display(), %algorithm, "initialized store");
        Ok(Self { root, algorithm })
    }

    /// Open an existing store at the given path.
    ///
    /// Validates the store structure and reads the configuration.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let algorithm = Self::parse_config(&root, &config_content)?;

        if !root.join("object").is_dir() {
            return Err(Error::invalid_store(&root, "object directory missing"));
        }

        Ok(Self { root, algorithm })
    }

    /// Open the store if it has a config file, otherwise initialize it.
    pub fn open_or_init<P: AsRef<Path>>(root: P, algorithm: HashAlgorithm) -> Result<Self> {
        if root.as_ref().join("config").exists() {
            Self::open(root)
        } else {
            Self::init(root, algorithm)
        }
    }

    /// Parse the config file to extract the algorithm.
    fn parse_config(root: &Path, content: &str) -> Result<HashAlgorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some(CONFIG_VERSION) {
            return Err(Error::invalid_store(
                root,
                format!("unsupported config version: {:?}", version),
            ));
        }

        let algo_str = algo.ok_or_else(|| Error::invalid_store(root, "missing algo in config"))?;
        HashAlgorithm::parse(algo_str)
    }

    /// Get the path to an object file given its identifier.
    ///
    /// Returns: `object/{prefix}/{suffix}`
    pub fn object_path(&self, id: &Identifier) -> PathBuf {
        self.root
            .join("object")
            .join(id.prefix())
            .join(id.suffix())
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Algorithm used to hash blobs added through this store.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether an object with this identifier is stored.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.object_path(id).is_file()
    }

    /// Store a tree under its identity and return the identity.
    ///
    /// Objects already present are not rewritten.
    pub fn put_tree(&self, tree: &ArtifactTree) -> Result<Identifier> {
        let payload = tree.serialize();
        let id = tree.identity();

        if self.contains(&id) {
            tracing::debug!(%id, "object already stored");
            return Ok(id);
        }

        self.write_object_atomic(&id, payload.as_bytes())?;
        tracing::debug!(%id, references = tree.len(), "stored tree");
        Ok(id)
    }

    /// Retrieve a tree by identifier.
    ///
    /// The stored text must hash back to `id` under `id`'s own algorithm.
    pub fn get_tree(&self, id: &Identifier) -> Result<ArtifactTree> {
        let obj_path = self.object_path(id);

        if !obj_path.exists() {
            return Err(Error::object_not_found(id.as_str()));
        }

        let content = fs::read(&obj_path)?;
        let text = String::from_utf8(content)
            .map_err(|e| Error::corrupted_object(&obj_path, format!("Invalid UTF-8: {}", e)))?;

        let tree = ArtifactTree::parse(&text)
            .map_err(|e| Error::corrupted_object(&obj_path, e.to_string()))?;

        let computed = tree.identity_with(id.algorithm());
        if computed != *id {
            return Err(Error::corrupted_object(
                &obj_path,
                format!("Identity mismatch: expected {}, got {}", id, computed),
            ));
        }

        Ok(tree)
    }

    /// Write an object atomically using tempfile.
    fn write_object_atomic(&self, id: &Identifier, payload: &[u8]) -> Result<()> {
        let obj_path = self.object_path(id);
        let obj_dir = obj_path
            .parent()
            .ok_or_else(|| Error::invalid_store(&self.root, "object path has no parent"))?;

        fs::create_dir_all(obj_dir)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(obj_dir)?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;
        temp_file.persist(&obj_path)?;

        Ok(())
    }
}
