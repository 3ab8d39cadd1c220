//! Download cache for raw messages and attachments
//!
//! Directory structure:
//! ```text
//! <support dir>/
//!   temp/
//!     eml/
//!       6629f1c2e1a2.eml           # raw message
//!       6629f1c2e1a2.html          # rendered copy (see render_html)
//!     attachments/
//!       6629f1c2e1a2/
//!         report.pdf
//! ```
//!
//! A file that exists at its target path is a cache hit and is returned
//! without touching the network. Bodies are streamed into a hidden `.part`
//! sibling and renamed into place once complete.

mod render;

pub use render::render_html;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::read::DecoderReader;
use log::{debug, info};

use crate::cancel::CancelToken;
use crate::error::{MailboxError, Result};
use crate::mailtm::Download;
use crate::models::{AttachmentRequest, TransferEncoding};

const CHUNK_SIZE: usize = 64 * 1024;

/// Path-addressed download cache
pub struct Downloader {
    root: PathBuf,
    /// One lock per target path currently being fetched
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Downloader {
    /// Create a cache rooted at the support directory
    pub fn new(support_dir: impl AsRef<Path>) -> Self {
        Self {
            root: support_dir.as_ref().to_path_buf(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache path for a raw message, derived from the message id embedded in
    /// its download reference (`/messages/{id}/download`)
    pub fn raw_message_path(&self, download_url: &str) -> Result<PathBuf> {
        let id = download_url
            .split('/')
            .nth(2)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MailboxError::InvalidReference(download_url.to_string()))?;

        let file_name = sanitize_component(&format!("{}.eml", id))
            .ok_or_else(|| MailboxError::InvalidReference(download_url.to_string()))?;

        Ok(self.root.join("temp").join("eml").join(file_name))
    }

    /// Cache path for an attachment: `temp/attachments/{message id}/{filename}`
    pub fn attachment_path(&self, request: &AttachmentRequest) -> Result<PathBuf> {
        let dir = sanitize_component(request.message_id.as_str())
            .ok_or_else(|| MailboxError::InvalidReference(request.message_id.to_string()))?;
        let file_name = sanitize_component(&request.filename)
            .ok_or_else(|| MailboxError::InvalidReference(request.filename.clone()))?;

        Ok(self
            .root
            .join("temp")
            .join("attachments")
            .join(dir)
            .join(file_name))
    }

    /// Ensure `path` holds the downloaded body, calling `open` only on a cache
    /// miss. Concurrent calls for the same path run one after another, so the
    /// later ones see the cached file.
    pub fn fetch<F>(
        &self,
        path: PathBuf,
        encoding: &TransferEncoding,
        cancel: &CancelToken,
        open: F,
    ) -> Result<PathBuf>
    where
        F: FnOnce() -> Result<Download>,
    {
        let slot = self.slot(&path);
        let result = {
            let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
            self.fetch_locked(&path, encoding, cancel, open)
        };
        self.release(&path);
        result.map(|()| path)
    }

    fn fetch_locked<F>(
        &self,
        path: &Path,
        encoding: &TransferEncoding,
        cancel: &CancelToken,
        open: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Result<Download>,
    {
        if path.exists() {
            debug!("Download cache hit: {}", path.display());
            return Ok(());
        }

        cancel.check()?;

        let parent = path
            .parent()
            .ok_or_else(|| MailboxError::InvalidReference(path.display().to_string()))?;
        fs::create_dir_all(parent).map_err(|e| MailboxError::file_system(parent, e))?;

        let download = open()?;
        let reader = decoded_reader(download, encoding);

        let partial = partial_path(path);
        if let Err(e) = write_stream(reader, &partial, cancel) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }

        fs::rename(&partial, path).map_err(|e| MailboxError::file_system(path, e))?;
        info!("Downloaded {}", path.display());
        Ok(())
    }

    fn slot(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.entry(path.to_path_buf()).or_default().clone()
    }

    /// Drop the path lock once no other caller is waiting on it
    fn release(&self, path: &Path) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // The map and the releasing caller hold one reference each
        if in_flight
            .get(path)
            .is_some_and(|slot| Arc::strong_count(slot) <= 2)
        {
            in_flight.remove(path);
        }
    }
}

/// Base64 bodies served as text are decoded; everything else is written as-is.
fn decoded_reader(download: Download, encoding: &TransferEncoding) -> Box<dyn Read> {
    let served_as_text = download
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/"));

    if *encoding == TransferEncoding::Base64 && served_as_text {
        debug!("Decoding base64 attachment body");
        Box::new(DecoderReader::new(
            SkipWhitespace {
                inner: download.reader,
            },
            &STANDARD,
        ))
    } else {
        download.reader
    }
}

fn write_stream(mut reader: Box<dyn Read>, path: &Path, cancel: &CancelToken) -> Result<()> {
    let mut file = File::create(path).map_err(|e| MailboxError::file_system(path, e))?;
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        cancel.check()?;
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(path, e)),
        };
        file.write_all(&buf[..n])
            .map_err(|e| MailboxError::file_system(path, e))?;
    }

    file.sync_all().map_err(|e| MailboxError::file_system(path, e))
}

/// Classify a failed body read: timeouts and bad encodings get their own kinds
fn read_error(path: &Path, e: io::Error) -> MailboxError {
    match e.kind() {
        io::ErrorKind::TimedOut => return MailboxError::Timeout,
        io::ErrorKind::InvalidData => {
            return MailboxError::BodyDecode {
                path: path.to_path_buf(),
                source: e,
            };
        }
        _ => {}
    }

    // ureq reports its own failures through the reader wrapped in io::Error
    match e.downcast::<ureq::Error>() {
        Ok(err) => MailboxError::from(err),
        Err(e) => MailboxError::Network(ureq::Error::Io(e)),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.part", name))
}

/// Reduce a server-provided name to a single safe path component
fn sanitize_component(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}

/// Drops ASCII whitespace (line breaks in MIME base64) from a byte stream
struct SkipWhitespace<R> {
    inner: R,
}

impl<R: Read> Read for SkipWhitespace<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }

            let mut kept = 0;
            for i in 0..n {
                if !buf[i].is_ascii_whitespace() {
                    buf[kept] = buf[i];
                    kept += 1;
                }
            }

            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}
