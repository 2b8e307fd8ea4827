// src/output/writer.rs
// =============================================================================
// Persists the bodies of found resources and the final success list.
//
// Each found Resource is streamed to <scan dir>/<sanitized URL>. Writes go
// to a temporary ".part" file first and are renamed into place, so two
// workers handling the same (duplicated) entry never leave a mixed file.
//
// File systems cap a name at 255 bytes, so long URLs are cut down to a
// prefix plus a short SHA-256 of the full URL.
// =============================================================================

use crate::error::ScanError;
use crate::resource::Resource;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::BufWriter;
use tracing::{debug, info};

/// Where consumers hand found resources
#[async_trait]
pub trait ResourceWriter: Send + Sync {
    /// Consumes the body of `resource`, returning where it was stored
    async fn write(&self, resource: &mut Resource) -> Result<PathBuf, ScanError>;
}

pub struct FileWriter {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl FileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ResourceWriter for FileWriter {
    async fn write(&self, resource: &mut Resource) -> Result<PathBuf, ScanError> {
        let file_name = file_name_for(&resource.name);
        let target = self.dir.join(&file_name);
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        let partial = self.dir.join(format!(".{}.{}.part", file_name, n));

        let file = fs::File::create(&partial).await?;
        let mut writer = BufWriter::new(file);
        let written = match resource.body.copy_to(&mut writer).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        drop(writer);
        fs::rename(&partial, &target).await?;

        info!("File written: {} ({} bytes)", file_name, written);
        Ok(target)
    }
}

/// Longest name handed to the file system; leaves room for the ".part" suffix
pub const MAX_FILE_NAME: usize = 200;

// Hex characters of the URL digest appended to shortened names
const DIGEST_CHARS: usize = 16;

/// Builds a flat file name from a URL.
///
/// Example: "http://example.com/admin" -> "http___example.com_admin"
///
/// Names longer than MAX_FILE_NAME bytes become
/// "<prefix>_<first 16 hex chars of sha256(url)>".
pub fn file_name_for(url: &str) -> String {
    let name: String = url
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | '?' | '*' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if name.len() <= MAX_FILE_NAME {
        return name;
    }

    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let mut cut = MAX_FILE_NAME - DIGEST_CHARS - 1;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &name[..cut], &digest[..DIGEST_CHARS])
}

/// Creates the output directory tree; an existing directory is fine
pub async fn prepare_output_dir(dir: &Path) -> Result<(), ScanError> {
    fs::create_dir_all(dir).await?;
    debug!("Output directory ready: {}", dir.display());
    Ok(())
}

/// Writes one URL per line
pub async fn write_success_list(path: &Path, urls: &[String]) -> Result<(), ScanError> {
    let mut contents = urls.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    fs::write(path, contents).await?;
    Ok(())
}
