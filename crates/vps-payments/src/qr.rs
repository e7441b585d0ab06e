//! QR Rendering Fallback
//!
//! Used when the gateway hands back a raw payment string instead of a
//! hosted image.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped the way `encodeURIComponent` escapes them
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds image URLs from a third-party QR renderer
#[derive(Clone, Debug)]
pub struct QrRenderer {
    base_url: String,
    size: u32,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL, 500)
    }
}

impl QrRenderer {
    pub const DEFAULT_BASE_URL: &'static str = "https://quickchart.io/qr";

    pub fn new(base_url: impl Into<String>, size: u32) -> Self {
        Self {
            base_url: base_url.into(),
            size,
        }
    }

    /// PNG image URL encoding `payload`
    pub fn image_url(&self, payload: &str) -> String {
        format!(
            "{}?text={}&size={}&format=png",
            self.base_url,
            utf8_percent_encode(payload, URI_COMPONENT),
            self.size
        )
    }
}
