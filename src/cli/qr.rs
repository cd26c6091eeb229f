//! Terminal rendering of the enrollment QR code.

use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;

use crate::errors::{CredVaultError, Result};

/// Render `data` as a QR code made of half-block characters.
///
/// Colors are inverted so the code scans on dark terminal themes.
pub fn render(data: &str) -> Result<String> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| CredVaultError::CommandFailed(format!("QR encoding failed: {e}")))?;

    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}
