//! Color helpers for shape strokes.
//!
//! Each new shape gets a random, saturated color when drawing starts. Colors
//! are kept as `#rrggbb` strings since the renderer treats them as opaque.

use rand::Rng;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple (0.0-1.0 per channel) as `#rrggbb`.
pub fn rgb_to_hex(r: f32, g: f32, b: f32) -> String {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", to_byte(r), to_byte(g), to_byte(b))
}

/// Color for the given hue with the fixed stroke saturation/brightness.
pub fn color_for_hue(hue: f32) -> String {
    let (r, g, b) = hsv_to_rgb(hue.rem_euclid(360.0), 0.75, 0.9);
    rgb_to_hex(r, g, b)
}

/// Pick a random stroke color.
pub fn random_color() -> String {
    let hue = rand::thread_rng().gen_range(0.0..360.0);
    color_for_hue(hue)
}
