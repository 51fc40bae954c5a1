use std::io::Cursor;

use anyhow::Context;

use crate::{core::Surface, error::EditorResult};

/// Encode a rendered surface as PNG bytes.
///
/// Always lossless and at the surface's full resolution; no downsampling or
/// quality negotiation. Naming/saving the file is the caller's concern.
pub fn encode_png(surface: &Surface) -> EditorResult<Vec<u8>> {
    let mut straight = surface.data().to_vec();
    unpremultiply_rgba8_in_place(&mut straight);

    let img = image::RgbaImage::from_raw(surface.width(), surface.height(), straight)
        .context("surface byte length does not match its dimensions")?;

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode surface as png")?;
    Ok(out)
}

/// Inverse of the decode-side premultiply, rounding to nearest.
fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u32 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u32 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u32 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite_cpu;

    #[test]
    fn png_roundtrip_preserves_dimensions_and_pixels() {
        let mut surface = Surface::transparent(3, 2).unwrap();
        composite_cpu::fill_in_place(surface.data_mut(), [0x11, 0x22, 0x33, 255]).unwrap();

        let bytes = encode_png(&surface).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [0x11, 0x22, 0x33, 255]);
    }

    #[test]
    fn transparency_survives_export() {
        let surface = Surface::transparent(2, 2).unwrap();
        let bytes = encode_png(&surface).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert!(decoded.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn semitransparent_pixels_are_unpremultiplied() {
        let mut surface = Surface::transparent(1, 1).unwrap();
        // Premul 50% white: straight color should come back as ~255.
        surface.data_mut().copy_from_slice(&[128, 128, 128, 128]);

        let bytes = encode_png(&surface).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let px = decoded.get_pixel(0, 0).0;
        assert_eq!(px[3], 128);
        assert_eq!(px[0], 255);
    }
}
