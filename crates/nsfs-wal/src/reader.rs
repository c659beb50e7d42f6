//! Newline-framed record reader for sealed segments.

use std::path::Path;

use tracing::warn;

use crate::error::{WalError, WalResult};

/// Read every record of a segment, exactly once, in file order.
///
/// A partial trailing record (no terminating newline; a writer died
/// mid-append) is reported as a corruption warning and skipped. Callers
/// are expected to already hold the segment's advisory lock through
/// [`crate::WalFile::process_inactive`].
///
/// # Errors
///
/// [`WalError::Io`] when the segment cannot be read;
/// [`WalError::InvalidRecord`] when the content is not UTF-8.
pub async fn read_records(path: &Path) -> WalResult<Vec<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| WalError::io(path, e))?;
    let content = String::from_utf8(bytes).map_err(|e| WalError::InvalidRecord {
        reason: format!("segment {} is not UTF-8: {e}", path.display()),
    })?;

    let mut records: Vec<String> = Vec::new();
    let mut rest = content.as_str();
    while let Some(pos) = rest.find('\n') {
        let (record, tail) = rest.split_at(pos);
        if record.is_empty() {
            warn!(segment = %path.display(), "empty record in segment, skipping");
        } else {
            records.push(record.to_owned());
        }
        rest = &tail[1..];
    }

    if !rest.is_empty() {
        warn!(
            segment = %path.display(),
            tail_len = rest.len(),
            "partial trailing record without newline, skipping"
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_fixture(content: &[u8]) -> WalResult<Vec<String>> {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let path = dir.path().join("seg.log");
        std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
        read_records(&path).await
    }

    #[tokio::test]
    async fn test_should_read_records_in_order() {
        let records = read_fixture(b"/a\n/b\n/c\n")
            .await
            .unwrap_or_else(|e| panic!("read: {e}"));
        assert_eq!(records, vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_should_skip_partial_trailing_record() {
        let records = read_fixture(b"/a\n/b\n/half-writ")
            .await
            .unwrap_or_else(|e| panic!("read: {e}"));
        assert_eq!(records, vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_should_skip_empty_lines() {
        let records = read_fixture(b"/a\n\n/b\n")
            .await
            .unwrap_or_else(|e| panic!("read: {e}"));
        assert_eq!(records, vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_should_handle_empty_segment() {
        let records = read_fixture(b"").await.unwrap_or_else(|e| panic!("read: {e}"));
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_non_utf8_segment() {
        let err = read_fixture(&[0xFF, 0xFE, b'\n']).await;
        assert!(matches!(err, Err(WalError::InvalidRecord { .. })));
    }

    #[tokio::test]
    async fn test_should_fail_on_missing_segment() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let err = read_records(&dir.path().join("ghost.log")).await;
        assert!(matches!(err, Err(WalError::Io { .. })));
    }
}
