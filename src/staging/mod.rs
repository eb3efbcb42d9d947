//! Chunked model staging
//!
//! Splits a large model file into numbered chunks small enough for hosts
//! with per-file upload limits, and reassembles them. A JSON manifest
//! (`model_parts.info`) next to the chunks records the layout and a SHA-256
//! digest of the original bytes so a reassembled file can be verified.

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the manifest written next to the chunks
pub const MANIFEST_FILE_NAME: &str = "model_parts.info";

/// Default chunk size: 80 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 80 * 1024 * 1024;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Layout of a split file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkManifest {
    /// File name (no directory) of the original blob
    pub original_filename: String,
    /// Number of chunk files
    pub total_parts: usize,
    /// Size of the original blob in bytes
    pub total_size: u64,
    /// Size of every chunk but the last
    pub chunk_size: u64,
    /// Hex SHA-256 of the original blob
    pub sha256: String,
}

impl ChunkManifest {
    /// Chunk file names in concatenation order
    pub fn chunk_names(&self) -> Vec<String> {
        (1..=self.total_parts)
            .map(|i| chunk_file_name(&self.original_filename, i))
            .collect()
    }

    /// Read the manifest from `dir`
    pub fn read(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(MANIFEST_FILE_NAME);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PricingError::ConfigError(format!(
                "manifest {} not found, cannot reconstruct",
                path.display()
            )),
            _ => PricingError::IoError(e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the manifest into `dir`
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(MANIFEST_FILE_NAME);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// `<original>.partNN`, 1-based, at least two digits
pub fn chunk_file_name(original: &str, index: usize) -> String {
    format!("{}.part{:02}", original, index)
}

/// Whether `dir` holds a chunk manifest
pub fn has_manifest(dir: impl AsRef<Path>) -> bool {
    dir.as_ref().join(MANIFEST_FILE_NAME).is_file()
}

/// Split `path` into chunks of `chunk_size` bytes written to `out_dir`,
/// followed by the manifest. An empty file yields zero chunks.
pub fn split_file(path: impl AsRef<Path>, out_dir: impl AsRef<Path>, chunk_size: u64) -> Result<ChunkManifest> {
    let path = path.as_ref();
    let out_dir = out_dir.as_ref();

    if chunk_size == 0 {
        return Err(PricingError::ConfigError("chunk size must be positive".to_string()));
    }

    let original_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PricingError::ConfigError(format!("invalid model path: {}", path.display())))?
        .to_string();

    let file = File::open(path)?;
    let total_size = file.metadata()?.len();
    let total_parts = total_size.div_ceil(chunk_size) as usize;

    info!(
        file = %path.display(),
        size_mb = total_size as f64 / (1024.0 * 1024.0),
        parts = total_parts,
        "Splitting model file"
    );

    fs::create_dir_all(out_dir)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    for index in 1..=total_parts {
        let name = chunk_file_name(&original_filename, index);
        let mut writer = BufWriter::new(File::create(out_dir.join(&name))?);
        let written = copy_hashing(&mut (&mut reader).take(chunk_size), &mut writer, &mut hasher)?;
        writer.flush()?;
        debug!(chunk = %name, bytes = written, "Wrote chunk");
    }

    let manifest = ChunkManifest {
        original_filename,
        total_parts,
        total_size,
        chunk_size,
        sha256: hex::encode(hasher.finalize()),
    };
    manifest.write(out_dir)?;

    info!(parts = total_parts, dir = %out_dir.display(), "Split complete");
    Ok(manifest)
}

/// Reassemble the file described by the manifest in `dir`.
///
/// Refuses before writing anything when a chunk is missing. The output is
/// built in a temporary file and only renamed into place once its size and
/// digest match the manifest.
pub fn reconstruct(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let manifest = ChunkManifest::read(dir)?;
    let names = manifest.chunk_names();

    let missing: Vec<String> = names
        .iter()
        .filter(|name| !dir.join(name).is_file())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PricingError::MissingChunks(missing));
    }

    info!(file = %manifest.original_filename, parts = manifest.total_parts, "Reconstructing model file");

    let target = dir.join(&manifest.original_filename);
    let tmp_path = dir.join(format!("{}.partial", manifest.original_filename));

    let result = assemble(dir, &names, &tmp_path).and_then(|(size, digest)| {
        if size != manifest.total_size {
            return Err(PricingError::IntegrityError(format!(
                "reassembled {} bytes, manifest says {}",
                size, manifest.total_size
            )));
        }
        if digest != manifest.sha256 {
            return Err(PricingError::IntegrityError(format!(
                "sha256 mismatch: got {}, manifest says {}",
                digest, manifest.sha256
            )));
        }
        Ok(())
    });

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, &target)?;
    info!(file = %target.display(), "Reconstruction complete");
    Ok(target)
}

fn assemble(dir: &Path, names: &[String], out: &Path) -> Result<(u64, String)> {
    let mut writer = BufWriter::new(File::create(out)?);
    let mut hasher = Sha256::new();
    let mut total = 0u64;

    for name in names {
        let mut reader = BufReader::new(File::open(dir.join(name))?);
        total += copy_hashing(&mut reader, &mut writer, &mut hasher)?;
        debug!(chunk = %name, "Added chunk");
    }
    writer.flush()?;

    Ok((total, hex::encode(hasher.finalize())))
}

fn copy_hashing<R: Read, W: Write>(reader: &mut R, writer: &mut W, hasher: &mut Sha256) -> Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name("model.bin", 1), "model.bin.part01");
        assert_eq!(chunk_file_name("model.bin", 12), "model.bin.part12");
        assert_eq!(chunk_file_name("model.bin", 100), "model.bin.part100");
    }

    #[test]
    fn test_split_and_reconstruct() {
        let dir = tempfile::tempdir().unwrap();
        let data = blob(2500);
        let source = dir.path().join("model.bin");
        fs::write(&source, &data).unwrap();

        let parts = dir.path().join("parts");
        let manifest = split_file(&source, &parts, 1000).unwrap();
        assert_eq!(manifest.total_parts, 3);
        assert_eq!(manifest.total_size, 2500);
        assert_eq!(fs::read(parts.join("model.bin.part03")).unwrap().len(), 500);

        let rebuilt = reconstruct(&parts).unwrap();
        assert_eq!(rebuilt, parts.join("model.bin"));
        assert_eq!(fs::read(rebuilt).unwrap(), data);
    }

    #[test]
    fn test_exact_multiple_of_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("model.bin");
        fs::write(&source, blob(2000)).unwrap();

        let manifest = split_file(&source, dir.path().join("out"), 1000).unwrap();
        assert_eq!(manifest.total_parts, 2);
    }

    #[test]
    fn test_empty_file_has_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.bin");
        fs::write(&source, b"").unwrap();

        let out = dir.path().join("out");
        let manifest = split_file(&source, &out, 1000).unwrap();
        assert_eq!(manifest.total_parts, 0);
        assert!(manifest.chunk_names().is_empty());

        let rebuilt = reconstruct(&out).unwrap();
        assert!(fs::read(rebuilt).unwrap().is_empty());
    }

    #[test]
    fn test_missing_chunk_refused() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("model.bin");
        fs::write(&source, blob(3000)).unwrap();

        let out = dir.path().join("out");
        split_file(&source, &out, 1000).unwrap();
        fs::remove_file(out.join("model.bin.part02")).unwrap();

        match reconstruct(&out) {
            Err(PricingError::MissingChunks(missing)) => assert_eq!(missing, vec!["model.bin.part02"]),
            other => panic!("expected MissingChunks, got {:?}", other),
        }
        assert!(!out.join("model.bin").exists());
    }

    #[test]
    fn test_corrupted_chunk_detected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("model.bin");
        fs::write(&source, blob(1500)).unwrap();

        let out = dir.path().join("out");
        split_file(&source, &out, 1000).unwrap();
        fs::write(out.join("model.bin.part01"), vec![0u8; 1000]).unwrap();

        assert!(matches!(reconstruct(&out), Err(PricingError::IntegrityError(_))));
        assert!(!out.join("model.bin").exists());
        assert!(!out.join("model.bin.partial").exists());
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_manifest(dir.path()));
        assert!(reconstruct(dir.path()).is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("model.bin");
        fs::write(&source, blob(10)).unwrap();
        assert!(matches!(split_file(&source, dir.path(), 0), Err(PricingError::ConfigError(_))));
    }
}
