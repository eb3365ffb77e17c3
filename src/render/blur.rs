use crate::foundation::error::{SceneryError, SceneryResult};

/// Gaussian-blur a premultiplied RGBA8 buffer.
///
/// `blur` follows the canvas `shadowBlur` convention: sigma is half of it. Pixels outside the
/// buffer count as transparent, so the result fades out at the edges.
pub fn blur_premul(src: &[u8], width: u32, height: u32, blur: f64) -> SceneryResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| SceneryError::surface("blur buffer size overflow"))?;
    if src.len() != len {
        return Err(SceneryError::surface("blur buffer does not match width*height*4"));
    }
    let sigma = blur / 2.0;
    if !sigma.is_finite() || sigma < 0.5 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(sigma);
    let mut tmp = vec![0u8; len];
    let mut out = vec![0u8; len];
    pass(src, &mut tmp, width as usize, height as usize, &kernel, true);
    pass(&tmp, &mut out, width as usize, height as usize, &kernel, false);
    Ok(out)
}

/// Padding needed around a shape so its blurred edge is not cut off.
pub fn blur_extent(blur: f64) -> f64 {
    if blur.is_finite() && blur > 0.0 {
        (1.5 * blur).ceil()
    } else {
        0.0
    }
}

/// Normalized weights in 16.16 fixed point, radius `ceil(3 * sigma)`.
fn kernel_q16(sigma: f64) -> Vec<u32> {
    let radius = (3.0 * sigma).ceil() as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round() as u32)
        .collect();
    let total: i64 = q.iter().map(|&v| i64::from(v)).sum();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + (65536 - total)).clamp(0, 65536) as u32;
    q
}

fn pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32], horizontal: bool) {
    let radius = (k.len() / 2) as isize;
    let (along, across) = if horizontal { (w, h) } else { (h, w) };
    for line in 0..across {
        for pos in 0..along {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let s = pos as isize + ki as isize - radius;
                if s < 0 || s >= along as isize {
                    continue;
                }
                let (x, y) = if horizontal {
                    (s as usize, line)
                } else {
                    (line, s as usize)
                };
                let idx = (y * w + x) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let (x, y) = if horizontal { (pos, line) } else { (line, pos) };
            let idx = (y * w + x) * 4;
            for c in 0..4 {
                dst[idx + c] = ((acc[c] + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
