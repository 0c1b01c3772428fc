//! Gzip-compressed tar extraction into resource directories.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// Extracts a `.tar.gz` stream into `dest`, creating it if needed.
///
/// Entries whose paths would escape `dest` are skipped. Returns the number of
/// entries written.
///
/// # Errors
///
/// Returns [`Error::Extraction`] if the stream is not a valid gzip/tar
/// archive or an entry cannot be written.
pub fn extract_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<usize> {
    let extraction = |source| Error::Extraction {
        path: dest.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dest).map_err(extraction)?;

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive.set_overwrite(true);
    archive.set_preserve_mtime(true);

    let mut count = 0;
    for entry in archive.entries().map_err(extraction)? {
        let mut entry = entry.map_err(extraction)?;
        if entry.unpack_in(dest).map_err(extraction)? {
            count += 1;
        } else {
            tracing::warn!(
                dest = %dest.display(),
                path = ?entry.path().ok(),
                "Skipping archive entry outside of destination"
            );
        }
    }

    tracing::debug!(dest = %dest.display(), entries = count, "Extracted archive");
    Ok(count)
}

/// Extracts an in-memory archive on the blocking thread pool.
///
/// # Errors
///
/// See [`extract_tar_gz`].
pub async fn extract_tar_gz_async(bytes: Vec<u8>, dest: PathBuf) -> Result<usize> {
    let target = dest.clone();
    tokio::task::spawn_blocking(move || extract_tar_gz(bytes.as_slice(), &target))
        .await
        .map_err(|e| Error::Extraction {
            path: dest,
            source: std::io::Error::other(e),
        })?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    pub(crate) fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_extract_creates_files() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = tar_gz(&[("data.txt", "hello"), ("nested/more.txt", "world")]);

        let count = extract_tar_gz(bytes.as_slice(), &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(std::fs::read_to_string(dest.join("data.txt")).unwrap(), "hello");
        assert_eq!(
            std::fs::read_to_string(dest.join("nested/more.txt")).unwrap(),
            "world"
        );
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let err = extract_tar_gz(&b"definitely not gzip"[..], temp.path()).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[tokio::test]
    async fn test_extract_async() {
        let temp = TempDir::new().unwrap();
        let bytes = tar_gz(&[("a.bin", "1")]);
        let count = extract_tar_gz_async(bytes, temp.path().to_path_buf())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(temp.path().join("a.bin").exists());
    }
}
