/// Linear RGBA color as uploaded to the vertex stream.
pub type Rgba = [f32; 4];

/// Six-segment hue ramp. `h` wraps into `[0, 1)`, so negative or large inputs are safe.
pub fn hue(h: f64) -> Rgba {
    let wrapped = h.rem_euclid(1.0);
    let scaled = if wrapped.is_finite() { wrapped * 6.0 } else { 0.0 };
    let sextant = scaled.floor();
    let f = (scaled - sextant) as f32;
    let (r, g, b) = match sextant as u32 % 6 {
        0 => (1.0, f, 0.0),
        1 => (1.0 - f, 1.0, 0.0),
        2 => (0.0, 1.0, f),
        3 => (0.0, 1.0 - f, 1.0),
        4 => (f, 0.0, 1.0),
        _ => (1.0, 0.0, 1.0 - f),
    };
    [r, g, b, 1.0]
}
