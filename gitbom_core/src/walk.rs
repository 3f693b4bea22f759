//! Filesystem walking: adding files and directory trees to an artifact tree.

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::identifier::Identifier;
use crate::tree::{ArtifactTree, Reference};
use std::fs;
use std::path::Path;

impl ArtifactTree {
    /// Add a single file, streamed with its on-disk size as the declared length.
    ///
    /// A file that changes size while being read fails with
    /// [`Error::LengthMismatch`].
    pub fn add_file(
        &mut self,
        path: &Path,
        bom: Option<Identifier>,
        algorithm: HashAlgorithm,
    ) -> Result<Reference> {
        let file = fs::File::open(path)?;
        let length = file.metadata()?.len();
        let reference = self.add_reference_from_reader(file, bom, length, algorithm)?;
        tracing::debug!(path = %path.display(), length, blob = %reference.blob_hash(), "added file");
        Ok(reference)
    }

    /// Add every regular file under `path`, following symlinks.
    ///
    /// Hidden files are included and no ignore files are consulted. Returns the
    /// number of files read. If any entry fails, nothing is added.
    pub fn add_path(&mut self, path: &Path, algorithm: HashAlgorithm) -> Result<usize> {
        if !path.exists() {
            return Err(Error::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Path does not exist: {}", path.display()),
                ),
            });
        }

        let walker = ignore::WalkBuilder::new(path)
            .standard_filters(false) // Include hidden and ignored files
            .follow_links(true)
            .build();

        let mut scratch = ArtifactTree::new();
        let mut files = 0;

        for entry in walker {
            let entry = entry?;
            let entry_path = entry.path();

            // Follows symlinks
            let metadata = fs::metadata(entry_path)?;
            if metadata.is_file() {
                scratch.add_file(entry_path, None, algorithm)?;
                files += 1;
            }
        }

        tracing::debug!(path = %path.display(), files, "walked path");
        self.merge(scratch);
        Ok(files)
    }
}
