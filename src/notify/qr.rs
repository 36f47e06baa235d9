use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use qrcode::render::svg;
use qrcode::QrCode;
use tracing::error;

use crate::notify::QrGenerator;

/// Renders the QR as an SVG and wraps it in a data URL, so the email can
/// embed it without hosting an image anywhere.
pub struct SvgQrGenerator;

impl QrGenerator for SvgQrGenerator {
    fn generate(&self, text: &str) -> String {
        let code = match QrCode::new(text.as_bytes()) {
            Ok(code) => code,
            Err(err) => {
                // Cannot happen for invoice-number payloads; degrade to an
                // empty URL rather than failing the ticket.
                error!(error = %err, "failed to encode QR payload");
                return String::new();
            }
        };
        let image = code
            .render::<svg::Color>()
            .min_dimensions(240, 240)
            .build();
        format!("data:image/svg+xml;base64,{}", BASE64.encode(image))
    }
}
