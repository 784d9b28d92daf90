//! Thumbnail rendering seam.
//!
//! The engine never rasterises pages itself. A front end that wants previews
//! implements [`PageRenderer`] and asks the collection for thumbnails through
//! [`PageCollection::request_thumbnail`](crate::PageCollection::request_thumbnail).
//! The merge path never calls a renderer.

use serde::{Deserialize, Serialize};

use crate::collection::SourceDocument;
use crate::error::Result;

/// A rendered preview of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Media type of `data`, e.g. `image/png`.
    pub media_type: String,
    /// Encoded image.
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Produces thumbnails for pages of a source document.
pub trait PageRenderer {
    /// Render page `page_number` (1-based) of `document`.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn request_thumbnail(&self, document: &SourceDocument, page_number: u32) -> Result<Thumbnail>;
}
