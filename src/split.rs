//! Page splitting for uploaded source artifacts.
//!
//! The pipeline only needs two operations from a source format: the true page
//! count and the bytes of a single page. `BundleSplitter` implements those for
//! the scan-bundle container produced by the upload tooling; other formats can
//! plug in behind the same trait.

use thiserror::Error;

/// Magic bytes identifying a scan bundle.
const BUNDLE_MAGIC: &[u8; 4] = b"FSB1";

/// Errors raised while reading a source artifact.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The artifact does not start with the expected container magic.
    #[error("Source artifact is not a scan bundle")]
    UnrecognizedFormat,
    /// The artifact ended before the declared page data.
    #[error("Source artifact is truncated")]
    Truncated,
    /// A page outside `1..=total` was requested.
    #[error("Page {page} out of range (bundle has {total} pages)")]
    PageOutOfRange {
        /// Requested page number.
        page: u32,
        /// Number of pages declared by the bundle.
        total: u32,
    },
}

/// Interface implemented by source-format readers.
pub trait PageSplitter: Send + Sync {
    /// Determine the true page count of the artifact.
    fn page_count(&self, bytes: &[u8]) -> Result<u32, SplitError>;

    /// Extract the standalone artifact for one 1-indexed page.
    fn extract_page(&self, bytes: &[u8], page_number: u32) -> Result<Vec<u8>, SplitError>;
}

/// Reader for the scan-bundle container: magic, big-endian page count, then
/// length-prefixed page payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundleSplitter;

impl BundleSplitter {
    /// Create a bundle reader.
    pub fn new() -> Self {
        Self
    }

    fn payloads(bytes: &[u8]) -> Result<Vec<&[u8]>, SplitError> {
        if bytes.len() < 8 || &bytes[0..4] != BUNDLE_MAGIC {
            return Err(SplitError::UnrecognizedFormat);
        }
        let count = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let mut pages = Vec::with_capacity(count);
        let mut offset = 8;
        for _ in 0..count {
            if bytes.len() < offset + 4 {
                return Err(SplitError::Truncated);
            }
            let len = u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]) as usize;
            offset += 4;
            if bytes.len() < offset + len {
                return Err(SplitError::Truncated);
            }
            pages.push(&bytes[offset..offset + len]);
            offset += len;
        }
        Ok(pages)
    }
}

impl PageSplitter for BundleSplitter {
    fn page_count(&self, bytes: &[u8]) -> Result<u32, SplitError> {
        Ok(Self::payloads(bytes)?.len() as u32)
    }

    fn extract_page(&self, bytes: &[u8], page_number: u32) -> Result<Vec<u8>, SplitError> {
        let pages = Self::payloads(bytes)?;
        let total = pages.len() as u32;
        if page_number == 0 || page_number > total {
            return Err(SplitError::PageOutOfRange {
                page: page_number,
                total,
            });
        }
        Ok(pages[(page_number - 1) as usize].to_vec())
    }
}

/// Assemble page payloads into a scan bundle.
///
/// Used by upload tooling and tests; the pipeline itself only reads bundles.
pub fn encode_bundle(pages: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + pages.iter().map(|p| p.len() + 4).sum::<usize>());
    out.extend_from_slice(BUNDLE_MAGIC);
    out.extend_from_slice(&(pages.len() as u32).to_be_bytes());
    for page in pages {
        out.extend_from_slice(&(page.len() as u32).to_be_bytes());
        out.extend_from_slice(page);
    }
    out
}
