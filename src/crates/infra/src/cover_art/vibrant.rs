use application::error::AppError;
use application::strategy::PaletteExtractor;
use domain::color::{ColorHex, Rgb};
use image::RgbaImage;

use super::quantize::{quantize, Swatch};

const MAX_COLORS: usize = 64;
const MIN_ALPHA: u8 = 125;
const WHITE_THRESHOLD: u8 = 250;

const TARGET_DARK_LUMA: f64 = 0.26;
const WEIGHT_SATURATION: f64 = 3.0;
const WEIGHT_LUMA: f64 = 6.5;
const WEIGHT_POPULATION: f64 = 0.5;

/// 色板槽位的目标区间
struct Target {
    min_luma: f64,
    target_luma: f64,
    max_luma: f64,
    min_saturation: f64,
    target_saturation: f64,
    max_saturation: f64,
}

const VIBRANT: Target = Target {
    min_luma: 0.3,
    target_luma: 0.5,
    max_luma: 0.7,
    min_saturation: 0.35,
    target_saturation: 1.0,
    max_saturation: 1.0,
};

const DARK_VIBRANT: Target = Target {
    min_luma: 0.0,
    target_luma: TARGET_DARK_LUMA,
    max_luma: 0.45,
    min_saturation: 0.35,
    target_saturation: 1.0,
    max_saturation: 1.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsl {
    h: f64,
    s: f64,
    l: f64,
}

fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    Hsl { h: h / 6.0, s, l }
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    if hsl.s == 0.0 {
        let v = to_u8(hsl.l);
        return Rgb::new(v, v, v);
    }
    let q = if hsl.l < 0.5 {
        hsl.l * (1.0 + hsl.s)
    } else {
        hsl.l + hsl.s - hsl.l * hsl.s
    };
    let p = 2.0 * hsl.l - q;
    Rgb::new(
        to_u8(hue_to_channel(p, q, hsl.h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, hsl.h)),
        to_u8(hue_to_channel(p, q, hsl.h - 1.0 / 3.0)),
    )
}

fn score(hsl: Hsl, target: &Target, population: u32, max_population: u32) -> f64 {
    let saturation = 1.0 - (hsl.s - target.target_saturation).abs();
    let luma = 1.0 - (hsl.l - target.target_luma).abs();
    let population = f64::from(population) / f64::from(max_population.max(1));
    (saturation * WEIGHT_SATURATION + luma * WEIGHT_LUMA + population * WEIGHT_POPULATION)
        / (WEIGHT_SATURATION + WEIGHT_LUMA + WEIGHT_POPULATION)
}

/// 在目标区间内得分最高的代表色，分数相同时取先出现的
fn find_swatch(
    swatches: &[Swatch],
    target: &Target,
    max_population: u32,
    exclude: Option<usize>,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, swatch) in swatches.iter().enumerate() {
        if exclude == Some(i) {
            continue;
        }
        let hsl = rgb_to_hsl(swatch.rgb);
        let in_range = (target.min_saturation..=target.max_saturation).contains(&hsl.s)
            && (target.min_luma..=target.max_luma).contains(&hsl.l);
        if !in_range {
            continue;
        }
        let value = score(hsl, target, swatch.population, max_population);
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

/// 选出 dark vibrant 颜色
///
/// vibrant 槽位先选，dark vibrant 不能复用同一个代表色。
/// 没有合适的暗色时，用 vibrant 的色相与饱和度配上目标暗度推出一个。
pub fn select_dark_vibrant(swatches: &[Swatch]) -> Option<Rgb> {
    let max_population = swatches.iter().map(|s| s.population).max()?;
    let vibrant = find_swatch(swatches, &VIBRANT, max_population, None);

    if let Some(i) = find_swatch(swatches, &DARK_VIBRANT, max_population, vibrant) {
        return Some(swatches[i].rgb);
    }

    vibrant.map(|i| {
        let hsl = rgb_to_hsl(swatches[i].rgb);
        hsl_to_rgb(Hsl {
            l: TARGET_DARK_LUMA,
            ..hsl
        })
    })
}

// 透明与接近纯白的像素不参与统计
fn sample_pixels(image: &RgbaImage) -> Vec<Rgb> {
    image
        .pixels()
        .filter(|p| p[3] >= MIN_ALPHA)
        .filter(|p| !(p[0] > WHITE_THRESHOLD && p[1] > WHITE_THRESHOLD && p[2] > WHITE_THRESHOLD))
        .map(|p| Rgb::new(p[0], p[1], p[2]))
        .collect()
}

/// 基于 MMCQ 量化的 vibrant 色板提取
pub struct VibrantPaletteExtractor {
    /// 图片缩放后的最长边
    max_dimension: u32,
}

impl VibrantPaletteExtractor {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl PaletteExtractor for VibrantPaletteExtractor {
    fn dark_vibrant(&self, data: &[u8]) -> Result<Option<ColorHex>, AppError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| AppError::Artwork(format!("Failed to decode image: {}", e)))?;

        let decoded = if decoded.width() > self.max_dimension || decoded.height() > self.max_dimension {
            decoded.thumbnail(self.max_dimension, self.max_dimension)
        } else {
            decoded
        };

        let pixels = sample_pixels(&decoded.to_rgba8());
        let swatches = quantize(&pixels, MAX_COLORS);
        log::debug!(
            "Quantized {} pixels into {} swatches",
            pixels.len(),
            swatches.len()
        );

        Ok(select_dark_vibrant(&swatches).map(|rgb| rgb.to_hex()))
    }
}
