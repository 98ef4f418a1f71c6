//! Lazy walking of tar streams copied out of a container.
//!
//! The copy-archive engine operation hands back a plain tar byte stream.
//! [`ResultArchive`] walks it forward-only: each yielded entry borrows the
//! outer stream and exposes a [`Read`] view bounded to that entry's
//! payload, so the archive never has to fit in memory.

use std::io::Read;

use crate::error::{ReportError, Result};

/// A tar archive read lazily from a byte stream.
///
/// Entries can only be consumed once and in stream order; restarting
/// requires recreating the underlying stream.
pub struct ResultArchive<R: Read> {
    inner: tar::Archive<R>,
}

impl<R: Read> ResultArchive<R> {
    /// Wraps a tar byte stream.
    pub fn new(stream: R) -> Self {
        Self {
            inner: tar::Archive::new(stream),
        }
    }

    /// Returns the forward-only entry iterator.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ArchiveFormat`] if the stream does not begin
    /// with a readable tar header.
    pub fn entries(&mut self) -> Result<Entries<'_, R>> {
        let inner = self
            .inner
            .entries()
            .map_err(|source| ReportError::ArchiveFormat { source })?;
        Ok(Entries { inner })
    }
}

/// Iterator over the entries of a [`ResultArchive`].
///
/// Terminates cleanly at the archive's end-of-stream marker; a stream
/// truncated mid-entry yields [`ReportError::ArchiveFormat`] instead of a
/// silent short entry.
pub struct Entries<'a, R: Read> {
    inner: tar::Entries<'a, R>,
}

impl<'a, R: Read> Iterator for Entries<'a, R> {
    type Item = Result<ArchiveEntry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.next()?;
        Some(
            next.map(|inner| ArchiveEntry { inner })
                .map_err(|source| ReportError::ArchiveFormat { source }),
        )
    }
}

/// One named record within an archive stream.
pub struct ArchiveEntry<'a, R: Read> {
    inner: tar::Entry<'a, R>,
}

impl<R: Read> ArchiveEntry<'_, R> {
    /// Relative path of the entry inside the archive.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ArchiveFormat`] if the header's path bytes
    /// cannot be decoded.
    pub fn path(&self) -> Result<String> {
        self.inner
            .path()
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|source| ReportError::ArchiveFormat { source })
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.inner.header().entry_type().is_dir()
    }
}

impl<R: Read> Read for ArchiveEntry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}
