use crate::config;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// An uploaded file parked on disk while the pipeline strips metadata and
/// re-reads it for rendition passes. The uuid prefix keeps concurrent
/// uploads of identically named files apart.
///
/// Deletion happens on drop, so the file is cleaned up on success and on
/// every failure path alike.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn create(filename: &str, data: &[u8]) -> std::io::Result<Self> {
        let scratch_dir = config::scratch_dir();
        std::fs::create_dir_all(scratch_dir)?;

        let path = scratch_dir.join(format!("{}_{filename}", Uuid::new_v4()));
        std::fs::write(&path, data)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Replaces the file contents in place, e.g. after a metadata strip.
    pub fn overwrite(&self, data: &[u8]) -> std::io::Result<()> {
        std::fs::write(&self.path, data)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove scratch file {}: {err}", self.path.display());
        }
    }
}

/// Clears out leftover scratch files from a previous run.
pub fn purge_scratch_files() -> std::io::Result<()> {
    let scratch_dir = config::scratch_dir();
    if !scratch_dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(scratch_dir)? {
        std::fs::remove_file(entry?.path())?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn scratch_file_removed_on_drop() {
        let scratch = ScratchFile::create("fox.png", b"not really a png").unwrap();
        let path = scratch.path().to_owned();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("_fox.png"));
        assert_eq!(scratch.read().unwrap(), b"not really a png");
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    #[serial]
    fn purge_clears_leftovers() {
        let leftover = config::scratch_dir().join("leftover_fox.png");
        std::fs::create_dir_all(config::scratch_dir()).unwrap();
        std::fs::write(&leftover, b"orphaned upload").unwrap();

        purge_scratch_files().unwrap();
        assert!(!leftover.exists());
    }
}
