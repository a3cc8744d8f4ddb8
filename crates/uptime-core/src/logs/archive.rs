//! Log stream I/O: append, list, compress, decompress, truncate.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::LogError;
use crate::key::{is_valid_key, is_valid_stream_id};

/// File suffix of an active, appendable stream.
pub const ACTIVE_SUFFIX: &str = ".log";
/// File suffix of a compressed, base64-wrapped archive.
pub const ARCHIVED_SUFFIX: &str = ".gz.b64";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A directory of log streams.
///
/// Holds no in-memory state besides the directory path, so any number of
/// workers may share one directory; appends rely on `O_APPEND` and archive
/// publication on a no-replace hard link.
#[derive(Debug, Clone)]
pub struct LogArchive {
    dir: PathBuf,
}

impl LogArchive {
    /// Open the archive rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, LogError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;
        debug!(dir = %dir.display(), "Log archive opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn active_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{ACTIVE_SUFFIX}"))
    }

    fn archived_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{ARCHIVED_SUFFIX}"))
    }

    /// Hidden, never listed, unique per call within this process.
    fn temp_path(&self, id: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{id}.{}.{n}.tmp", std::process::id()))
    }

    /// Append `line` plus a newline to the active stream `id`, creating it
    /// if it does not exist.
    ///
    /// The line and its terminator go out in a single append write, so
    /// concurrent appenders never interleave partial lines.
    pub async fn append(&self, id: &str, line: &str) -> Result<(), LogError> {
        check_stream_id(id)?;
        let path = self.active_path(id);

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        file.write_all(record.as_bytes())
            .await
            .map_err(|e| io_error(&path, e))?;
        file.flush().await.map_err(|e| io_error(&path, e))?;
        Ok(())
    }

    /// List stream ids, sorted and deduplicated.
    ///
    /// With `include_compressed`, ids that only exist as archives are
    /// included as well.
    pub async fn list(&self, include_compressed: bool) -> Result<Vec<String>, LogError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let mut ids = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let id = match name.strip_suffix(ACTIVE_SUFFIX) {
                Some(id) => Some(id),
                None if include_compressed => name.strip_suffix(ARCHIVED_SUFFIX),
                None => None,
            };
            if let Some(id) = id.filter(|id| is_valid_key(id)) {
                ids.insert(id.to_string());
            }
        }
        Ok(ids.into_iter().collect())
    }

    /// Read the full content of the active stream `id`.
    pub async fn read_active(&self, id: &str) -> Result<String, LogError> {
        check_stream_id(id)?;
        let path = self.active_path(id);
        fs::read_to_string(&path)
            .await
            .map_err(|e| missing_or_io(id, &path, e))
    }

    /// Gzip the active stream `source_id` into a new archive `dest_id`.
    ///
    /// The destination must not exist yet. The encoded archive is written
    /// to a hidden temporary and hard-linked into place, so `dest_id` is
    /// either absent or complete and an existing archive is never
    /// replaced. The source is left untouched; pair with
    /// [`LogArchive::truncate`] to reclaim space.
    pub async fn compress(&self, source_id: &str, dest_id: &str) -> Result<(), LogError> {
        check_stream_id(source_id)?;
        check_id(dest_id)?;

        let source = self.active_path(source_id);
        let content = fs::read(&source)
            .await
            .map_err(|e| missing_or_io(source_id, &source, e))?;
        if content.is_empty() {
            return Err(LogError::Empty(source_id.to_string()));
        }
        // Archives decompress to text; refuse what could not come back out.
        if let Err(e) = std::str::from_utf8(&content) {
            return Err(LogError::NotUtf8 {
                id: source_id.to_string(),
                reason: e.to_string(),
            });
        }

        let dest = self.archived_path(dest_id);
        if fs::try_exists(&dest).await.map_err(|e| io_error(&dest, e))? {
            return Err(LogError::AlreadyExists(dest_id.to_string()));
        }

        let bytes = content.len();
        let encoded = tokio::task::spawn_blocking(move || gzip_base64(&content))
            .await
            .map_err(std::io::Error::other)
            .and_then(|r| r)
            .map_err(|e| io_error(&source, e))?;

        let tmp = self.temp_path(dest_id);
        let published = async {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp)
                .await
                .map_err(|e| io_error(&tmp, e))?;
            file.write_all(encoded.as_bytes())
                .await
                .map_err(|e| io_error(&tmp, e))?;
            file.sync_all().await.map_err(|e| io_error(&tmp, e))?;
            drop(file);

            fs::hard_link(&tmp, &dest).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    LogError::AlreadyExists(dest_id.to_string())
                } else {
                    io_error(&dest, e)
                }
            })
        }
        .await;

        match fs::remove_file(&tmp).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!(archive = dest_id, error = %e, "Failed to remove archive temporary");
            }
            _ => {}
        }
        published?;

        info!(
            source = source_id,
            archive = dest_id,
            bytes,
            "Log compressed"
        );
        Ok(())
    }

    /// Decode and decompress the archive `id` back into its original text.
    pub async fn decompress(&self, id: &str) -> Result<String, LogError> {
        check_id(id)?;
        let path = self.archived_path(id);
        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| missing_or_io(id, &path, e))?;

        let decoded = tokio::task::spawn_blocking(move || gunzip_base64(&text))
            .await
            .map_err(|e| io_error(&path, std::io::Error::other(e)))?;
        decoded.map_err(|reason| LogError::Corrupt {
            id: id.to_string(),
            reason,
        })
    }

    /// Reset the active stream `id` to zero length without removing it.
    pub async fn truncate(&self, id: &str) -> Result<(), LogError> {
        check_stream_id(id)?;
        let path = self.active_path(id);
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .await
            .map_err(|e| missing_or_io(id, &path, e))?;
        file.set_len(0).await.map_err(|e| io_error(&path, e))?;
        debug!(log = id, "Log truncated");
        Ok(())
    }
}

fn gzip_base64(content: &[u8]) -> std::io::Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

fn gunzip_base64(text: &str) -> Result<String, String> {
    let compressed = STANDARD
        .decode(text.trim())
        .map_err(|e| format!("base64: {e}"))?;
    let mut out = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut out)
        .map_err(|e| format!("gzip: {e}"))?;
    Ok(out)
}

/// Active streams are capped shorter than archives so rotation can stamp
/// them.
fn check_stream_id(id: &str) -> Result<(), LogError> {
    if is_valid_stream_id(id) {
        Ok(())
    } else {
        Err(LogError::InvalidId(id.to_string()))
    }
}

fn check_id(id: &str) -> Result<(), LogError> {
    if is_valid_key(id) {
        Ok(())
    } else {
        Err(LogError::InvalidId(id.to_string()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LogError {
    LogError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn missing_or_io(id: &str, path: &Path, source: std::io::Error) -> LogError {
    if source.kind() == std::io::ErrorKind::NotFound {
        LogError::NotFound(id.to_string())
    } else {
        io_error(path, source)
    }
}
