//! Final ASiC-E packaging.
//!
//! The gateway holds the signed container without the data files (it only
//! ever saw their digests). The merger writes the gateway's bytes to disk as
//! the base archive and appends the caller's original files to it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SigaError};
use crate::types::ContainerId;

/// File extension of the final archive
pub const ARCHIVE_EXTENSION: &str = "asice";

/// A local file to be added to the final archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Entry name inside the archive
    pub name: String,
    /// Location of the original bytes
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Directory holding the first source file, used when no output directory
/// is configured.
pub fn first_file_directory(files: &[SourceFile]) -> Result<PathBuf> {
    let first = files.first().ok_or_else(|| {
        SigaError::InvalidParameter("at least one source file is required".to_string())
    })?;
    Ok(match first.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    })
}

/// Builds `<output_dir>/<containerId>.asice` from gateway bytes and local files
#[derive(Debug, Clone)]
pub struct ArchiveMerger {
    output_dir: PathBuf,
}

impl ArchiveMerger {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the archive for `container_id` is written to.
    ///
    /// The id must be a single file name component so the archive cannot
    /// land outside the output directory.
    pub fn archive_path(&self, container_id: &ContainerId) -> Result<PathBuf> {
        let id = container_id.as_str();
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0'])
        {
            return Err(SigaError::InvalidResponse(format!(
                "container id {:?} is not usable as an archive file name",
                id
            )));
        }
        Ok(self
            .output_dir
            .join(format!("{}.{}", id, ARCHIVE_EXTENSION)))
    }

    /// Write the base archive and add every source file to it.
    ///
    /// On any failure the partially written archive is removed.
    pub fn merge(
        &self,
        container_id: &ContainerId,
        base_archive: &[u8],
        files: &[SourceFile],
    ) -> Result<PathBuf> {
        let archive_path = self.archive_path(container_id)?;

        fs::write(&archive_path, base_archive)?;
        debug!(path = %archive_path.display(), bytes = base_archive.len(), "Base archive written");

        if let Err(e) = Self::append_files(&archive_path, files) {
            warn!(path = %archive_path.display(), error = %e, "Merge failed, discarding archive");
            fs::remove_file(&archive_path).ok();
            return Err(e);
        }

        info!(
            container_id = %container_id,
            path = %archive_path.display(),
            files = files.len(),
            "Signed archive assembled"
        );
        Ok(archive_path)
    }

    fn append_files(archive_path: &Path, files: &[SourceFile]) -> Result<()> {
        let file = OpenOptions::new().read(true).write(true).open(archive_path)?;
        let mut writer = ZipWriter::new_append(file)?;

        for source in files {
            let bytes = fs::read(&source.path)?;
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(source.name.as_str(), options)?;
            writer.write_all(&bytes)?;
        }

        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn base_archive() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = || SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("mimetype", stored()).unwrap();
        writer
            .write_all(b"application/vnd.etsi.asic-e+zip")
            .unwrap();
        writer
            .start_file("META-INF/signatures0.xml", stored())
            .unwrap();
        writer.write_all(b"<XAdESSignatures/>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            entries.push((file.name().to_string(), contents));
        }
        entries
    }

    #[test]
    fn test_merge_adds_local_files() {
        let dir = TempDir::new().unwrap();
        let path_a = dir.path().join("a.txt");
        let path_b = dir.path().join("b.txt");
        fs::write(&path_a, b"alpha").unwrap();
        fs::write(&path_b, b"bravo").unwrap();

        let merger = ArchiveMerger::new(dir.path());
        let id = ContainerId::new("container-1");
        let files = vec![
            SourceFile::new("a.txt", &path_a),
            SourceFile::new("b.txt", &path_b),
        ];

        let out = merger.merge(&id, &base_archive(), &files).unwrap();
        assert_eq!(out, dir.path().join("container-1.asice"));

        let entries = read_entries(&out);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["mimetype", "META-INF/signatures0.xml", "a.txt", "b.txt"]
        );
        assert_eq!(entries[2].1, b"alpha");
        assert_eq!(entries[3].1, b"bravo");
    }

    #[test]
    fn test_missing_source_discards_archive() {
        let dir = TempDir::new().unwrap();
        let merger = ArchiveMerger::new(dir.path());
        let id = ContainerId::new("broken");
        let files = vec![SourceFile::new("gone.txt", dir.path().join("gone.txt"))];

        let err = merger.merge(&id, &base_archive(), &files).unwrap_err();
        assert!(matches!(err, SigaError::Io(_)));
        assert!(!merger.archive_path(&id).unwrap().exists());
    }

    #[test]
    fn test_invalid_base_archive_fails() {
        let dir = TempDir::new().unwrap();
        let path_a = dir.path().join("a.txt");
        fs::write(&path_a, b"alpha").unwrap();

        let merger = ArchiveMerger::new(dir.path());
        let id = ContainerId::new("garbage");
        let err = merger
            .merge(&id, b"not a zip", &[SourceFile::new("a.txt", &path_a)])
            .unwrap_err();
        assert!(matches!(err, SigaError::Zip(_)));
        assert!(!merger.archive_path(&id).unwrap().exists());
    }

    #[test]
    fn test_missing_output_dir_fails_before_merge() {
        let dir = TempDir::new().unwrap();
        let merger = ArchiveMerger::new(dir.path().join("nope"));
        let err = merger
            .merge(&ContainerId::new("x"), &base_archive(), &[])
            .unwrap_err();
        assert!(matches!(err, SigaError::Io(_)));
    }

    #[test]
    fn test_container_id_cannot_escape_output_dir() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");
        fs::create_dir(&out).unwrap();
        let path_a = root.path().join("a.txt");
        fs::write(&path_a, b"alpha").unwrap();

        let merger = ArchiveMerger::new(&out);
        let files = vec![SourceFile::new("a.txt", &path_a)];

        for bad in ["../escaped", "nested/id", "..", ".", "", "win\\id", "nul\0id"] {
            let err = merger
                .merge(&ContainerId::new(bad), &base_archive(), &files)
                .unwrap_err();
            assert!(matches!(err, SigaError::InvalidResponse(_)), "{:?}", bad);
        }

        assert!(!root.path().join("escaped.asice").exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_first_file_directory() {
        let files = vec![
            SourceFile::new("a.txt", "/data/in/a.txt"),
            SourceFile::new("b.txt", "/elsewhere/b.txt"),
        ];
        assert_eq!(first_file_directory(&files).unwrap(), PathBuf::from("/data/in"));

        let bare = vec![SourceFile::new("a.txt", "a.txt")];
        assert_eq!(first_file_directory(&bare).unwrap(), PathBuf::from("."));

        assert!(matches!(
            first_file_directory(&[]),
            Err(SigaError::InvalidParameter(_))
        ));
    }
}
