//! QR code rendering.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

use wa_gateway_core::{Error, Result};

/// Prefix of every rendered image.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Render `challenge` as a PNG and return it as a data URL.
pub fn render_data_url(challenge: &str) -> Result<String> {
    let code = QrCode::new(challenge.as_bytes()).map_err(|e| Error::QrRender(e.to_string()))?;
    let image = code.render::<Luma<u8>>().min_dimensions(200, 200).build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| Error::QrRender(e.to_string()))?;

    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Decode a data URL produced by [`render_data_url`] back into PNG bytes.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let encoded = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| Error::QrRender("not a PNG data URL".to_string()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::QrRender(e.to_string()))
}
