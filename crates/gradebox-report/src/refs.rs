//! Reading Git branch-ref files out of single-entry archive streams.

use std::io::Read;

use gradebox_common::constants::COMMIT_HASH_LENGTH;

use crate::error::{ReportError, Result};

/// Reads the commit hash from a single-entry archive holding a branch-ref
/// file (a full hex commit hash followed by a newline).
///
/// # Errors
///
/// - [`ReportError::ReferenceNotFound`] if the archive has no entries.
/// - [`ReportError::ArchiveFormat`] on a malformed archive stream.
/// - [`ReportError::MalformedReference`] if the trimmed content is not a
///   full lowercase-or-uppercase hex commit hash.
pub fn read_commit_ref<R: Read>(stream: R) -> Result<String> {
    let mut archive = tar::Archive::new(stream);
    let mut entries = archive
        .entries()
        .map_err(|source| ReportError::ArchiveFormat { source })?;

    let mut entry = entries
        .next()
        .ok_or(ReportError::ReferenceNotFound)?
        .map_err(|source| ReportError::ArchiveFormat { source })?;

    let mut raw = Vec::new();
    let _ = entry
        .read_to_end(&mut raw)
        .map_err(|source| ReportError::ArchiveFormat { source })?;

    let text = std::str::from_utf8(&raw).map_err(|_| ReportError::MalformedReference {
        value: String::from_utf8_lossy(&raw).into_owned(),
    })?;

    let hash = text.trim_end_matches(['\n', '\r']);
    if hash.len() != COMMIT_HASH_LENGTH || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ReportError::MalformedReference {
            value: hash.to_string(),
        });
    }

    Ok(hash.to_string())
}
