//! Binary → `data:` URL encoding for inline previews.

use crate::format::Format;
use base64::{Engine as _, engine::general_purpose};

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn to_data_url(format: Format, bytes: &[u8]) -> String {
    let b64 = general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", format.mime_type(), b64)
}

/// Split a data URL back into its format and decoded bytes.
///
/// Returns `None` for anything that is not a base64 data URL of a supported
/// image type.
pub fn from_data_url(url: &str) -> Option<(Format, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let format = Format::from_mime(mime).ok()?;
    let bytes = general_purpose::STANDARD.decode(payload).ok()?;
    Some((format, bytes))
}
