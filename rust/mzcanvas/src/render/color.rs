use std::sync::Arc;
use tracing::warn;

use crate::errors::CanvasError;

pub const DEFAULT_COLOR_CYCLE: &[&str] = &[
    "steelblue",
    "blueviolet",
    "lightseagreen",
    "midnightblue",
    "limegreen",
    "goldenrod",
    "firebrick",
    "crimson",
];

/// Hands out palette colors in order, wrapping around.
///
/// The palette itself is shared and never mutated, each canvas only owns
/// its position in it.
#[derive(Debug, Clone)]
pub struct ColorCycle {
    palette: Arc<[String]>,
    index: usize,
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR_CYCLE.iter().map(|c| c.to_string()).collect())
    }
}

impl ColorCycle {
    pub fn new(palette: Arc<[String]>) -> Self {
        Self { palette, index: 0 }
    }

    pub fn next_color(&mut self) -> String {
        if self.palette.is_empty() {
            return DEFAULT_COLOR_CYCLE[0].to_string();
        }
        let color = self.palette[self.index % self.palette.len()].clone();
        self.index += 1;
        color
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

const DARKER: f64 = 0.7;

fn named(name: &str) -> Option<(u8, u8, u8)> {
    let rgb = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "purple" => (128, 0, 128),
        "grey" | "gray" => (128, 128, 128),
        "steelblue" => (70, 130, 180),
        "blueviolet" => (138, 43, 226),
        "lightseagreen" => (32, 178, 170),
        "midnightblue" => (25, 25, 112),
        "limegreen" => (50, 205, 50),
        "goldenrod" => (218, 165, 32),
        "firebrick" => (178, 34, 34),
        "crimson" => (220, 20, 60),
        _ => return None,
    };
    Some(rgb)
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Accepts the named palette colors, `#rgb`, `#rrggbb` and `rgb(r, g, b)`.
    pub fn parse(color: &str) -> Result<Self, CanvasError> {
        let color = color.trim();
        let err = || CanvasError::Color(color.to_string());
        if let Some((r, g, b)) = named(&color.to_ascii_lowercase()) {
            return Ok(Self::new(r as f64, g as f64, b as f64));
        }
        if let Some(hex) = color.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(err());
            }
            let channel = |s: &str| u8::from_str_radix(s, 16).map(f64::from).map_err(|_| err());
            return match hex.len() {
                6 => Ok(Self::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
                3 => {
                    let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17.0);
                    Ok(Self::new(short(0)?, short(1)?, short(2)?))
                }
                _ => Err(err()),
            };
        }
        if let Some(body) = color.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
            let channels: Vec<f64> = body
                .split(',')
                .map(|s| s.trim().parse::<f64>().map_err(|_| err()))
                .collect::<Result<_, _>>()?;
            if let [r, g, b] = channels[..] {
                return Ok(Self::new(r, g, b));
            }
        }
        Err(err())
    }

    pub fn brighter(&self, k: f64) -> Self {
        let factor = (1.0 / DARKER).powf(k);
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn darker(&self, k: f64) -> Self {
        let factor = DARKER.powf(k);
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_css(&self) -> String {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        format!("rgb({}, {}, {})", channel(self.r), channel(self.g), channel(self.b))
    }
}

/// Contrasting color for overlays drawn on top of a series colored `base`.
/// Dark colors get brightened, light ones darkened.
pub fn pattern_color(base: &str) -> String {
    let rgb = Rgb::parse(base).unwrap_or_else(|e| {
        warn!("{}, falling back to black", e);
        Rgb::BLACK
    });
    let brightness = (rgb.r + rgb.g + rgb.b) / (125.0 * 3.0);
    if brightness < 0.5 {
        rgb.brighter(2.0).to_css()
    } else {
        rgb.darker(1.0).to_css()
    }
}

/// Piecewise linear interpolation over evenly spaced color stops.
fn interpolate_stops(stops: &[(f64, f64, f64)], t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let segments = (stops.len() - 1) as f64;
    let position = t * segments;
    let i = (position.floor() as usize).min(stops.len() - 2);
    let local = position - i as f64;
    let (a, b) = (stops[i], stops[i + 1]);
    Rgb::new(
        a.0 + (b.0 - a.0) * local,
        a.1 + (b.1 - a.1) * local,
        a.2 + (b.2 - a.2) * local,
    )
}

const COOL: &[(f64, f64, f64)] = &[
    (110.0, 64.0, 170.0),
    (72.0, 110.0, 225.0),
    (37.0, 173.0, 211.0),
    (43.0, 227.0, 150.0),
    (175.0, 240.0, 91.0),
];

const CIVIDIS: &[(f64, f64, f64)] = &[
    (0.0, 34.0, 78.0),
    (65.0, 77.0, 108.0),
    (124.0, 123.0, 120.0),
    (188.0, 175.0, 111.0),
    (254.0, 232.0, 56.0),
];

/// Purple to green ramp for `t` in `[0, 1]`.
pub fn cool(t: f64) -> String {
    interpolate_stops(COOL, t).to_css()
}

/// Blue to yellow ramp for `t` in `[0, 1]`.
pub fn cividis(t: f64) -> String {
    interpolate_stops(CIVIDIS, t).to_css()
}

/// Position of an intensity on a square-root color ramp capped at `max`.
pub fn sqrt_ramp_position(intensity: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    intensity.max(0.0).sqrt() / max.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_cycle_repeats_after_len() {
        let mut cycle = ColorCycle::default();
        let first: Vec<String> = (0..cycle.len()).map(|_| cycle.next_color()).collect();
        assert_eq!(first[0], "steelblue");
        // Test: The palette length + 1th call returns the first color again
        assert_eq!(cycle.next_color(), first[0]);
        cycle.reset();
        assert_eq!(cycle.next_color(), first[0]);
        assert_eq!(cycle.next_color(), first[1]);
    }

    #[test]
    fn test_cycles_share_palette_but_not_position() {
        let mut a = ColorCycle::default();
        let mut b = a.clone();
        a.next_color();
        assert_eq!(b.next_color(), "steelblue");
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(Rgb::parse("steelblue").unwrap(), Rgb::new(70.0, 130.0, 180.0));
        assert_eq!(Rgb::parse("#ff0080").unwrap(), Rgb::new(255.0, 0.0, 128.0));
        assert_eq!(Rgb::parse("#f00").unwrap(), Rgb::new(255.0, 0.0, 0.0));
        assert_eq!(Rgb::parse("rgb(1, 2, 3)").unwrap(), Rgb::new(1.0, 2.0, 3.0));
        assert!(Rgb::parse("not-a-color").is_err());
    }

    #[test]
    fn test_pattern_color_contrasts() {
        // Test: Dark colors are brightened, light colors darkened
        assert_eq!(pattern_color("midnightblue"), "rgb(51, 51, 229)");
        assert_eq!(pattern_color("firebrick"), "rgb(125, 24, 24)");
    }

    #[test]
    fn test_ramps_hit_endpoints() {
        assert_eq!(cool(0.0), "rgb(110, 64, 170)");
        assert_eq!(cool(1.0), "rgb(175, 240, 91)");
        assert_eq!(cividis(2.0), "rgb(254, 232, 56)");
        assert_eq!(sqrt_ramp_position(25.0, 100.0), 0.5);
    }
}
