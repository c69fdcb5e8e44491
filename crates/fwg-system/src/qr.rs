//! Terminal QR codes for client configurations.

use fwg_core::{FwgError, Result};
use qrcode::render::unicode;
use qrcode::{EcLevel, QrCode};

/// Renders `content` as a QR code drawn with Unicode half blocks.
///
/// Colours are inverted for dark terminal backgrounds.
pub fn render_terminal(content: &str) -> Result<String> {
    let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::L)
        .map_err(|e| FwgError::external("qrcode", e.to_string()))?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}
