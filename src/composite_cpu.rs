use crate::error::{EditorError, EditorResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over blend of two premultiplied RGBA8 pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Blend `src` over `dst` pixel-for-pixel. Buffers must be the same size.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> EditorResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(EditorError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Overwrite every pixel of `dst` with `px`.
pub fn fill_in_place(dst: &mut [u8], px: PremulRgba8) -> EditorResult<()> {
    if !dst.len().is_multiple_of(4) {
        return Err(EditorError::validation(
            "fill_in_place expects an rgba8 buffer",
        ));
    }
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
    Ok(())
}

/// Draw `src` over `dst` with a cover fit: scaled uniformly by
/// `max(dst_w/src_w, dst_h/src_h)` and centered, so it fully covers the
/// destination and any overflow is cropped.
///
/// Sampling is nearest-neighbor on pixel centers, which keeps the result
/// exactly reproducible.
pub fn blit_cover(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
) -> EditorResult<()> {
    if dst.len() != dst_w as usize * dst_h as usize * 4 {
        return Err(EditorError::validation("blit_cover dst byte length mismatch"));
    }
    if src.len() != src_w as usize * src_h as usize * 4 {
        return Err(EditorError::validation("blit_cover src byte length mismatch"));
    }
    if src_w == 0 || src_h == 0 {
        return Err(EditorError::validation(
            "blit_cover src dimensions must be non-zero",
        ));
    }

    let scale = (f64::from(dst_w) / f64::from(src_w)).max(f64::from(dst_h) / f64::from(src_h));
    let off_x = f64::from(dst_w) / 2.0 - f64::from(src_w) * scale / 2.0;
    let off_y = f64::from(dst_h) / 2.0 - f64::from(src_h) * scale / 2.0;

    for y in 0..dst_h {
        let sy = (((f64::from(y) + 0.5) - off_y) / scale).floor();
        let sy = (sy as i64).clamp(0, i64::from(src_h) - 1) as usize;
        for x in 0..dst_w {
            let sx = (((f64::from(x) + 0.5) - off_x) / scale).floor();
            let sx = (sx as i64).clamp(0, i64::from(src_w) - 1) as usize;

            let si = (sy * src_w as usize + sx) * 4;
            let di = (y as usize * dst_w as usize + x as usize) * 4;
            let out = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [src[si], src[si + 1], src[si + 2], src[si + 3]],
            );
            dst[di..di + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
