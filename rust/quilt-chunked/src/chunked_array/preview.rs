use std::fmt;

use quilt_buffer::{Buffer, TailPlan};
use quilt_common::Result;

use super::ChunkedArray;

/// Number of elements shown before the preview is cut off.
const PREVIEW_LEN: usize = 7;

impl ChunkedArray {
    /// Collects the first `limit` elements without normalizing any chunk.
    fn leading_elements(&self, limit: usize) -> Result<Option<Buffer>> {
        let mut parts = Vec::new();
        let mut remaining = limit;
        for slot in &self.chunks {
            if remaining == 0 {
                break;
            }
            let chunk = slot.view()?;
            let take = chunk.len().min(remaining);
            if take == 0 {
                continue;
            }
            let plan = TailPlan::identity(chunk.inner_shape());
            parts.push(chunk.slice_rows(0..take, false, &plan));
            remaining -= take;
        }
        if parts.is_empty() {
            return Ok(None);
        }
        Buffer::concat(&parts).map(Some)
    }
}

/// Renders up to seven elements, `[1 2 3]`; longer arrays end with `...`.
impl fmt::Display for ChunkedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leading = match self.leading_elements(PREVIEW_LEN) {
            Ok(leading) => leading,
            Err(err) => return write!(f, "[<{err}>]"),
        };
        let Some(leading) = leading else {
            return f.write_str("[]");
        };
        let rendered = leading.to_string();
        if self.len() <= PREVIEW_LEN {
            return f.write_str(&rendered);
        }
        // Reopen the closing bracket of the outermost level.
        let body = rendered.strip_suffix(']').unwrap_or(&rendered);
        write!(f, "{body} ...]")
    }
}
