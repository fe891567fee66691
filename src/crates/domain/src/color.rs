use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// 颜色相关错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    #[error("invalid color hex: {0}")]
    InvalidHex(String),
    #[error("candidate palette is empty")]
    EmptyPalette,
}

/// RGB 三元组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 与另一个颜色的欧氏距离
    pub fn distance(&self, other: &Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// 输出小写的 `#rrggbb`
    pub fn to_hex(&self) -> ColorHex {
        ColorHex(format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b))
    }
}

/// 颜色值对象
///
/// 形如 `#RGB` 或 `#RRGGBB` 的十六进制颜色（大小写不敏感）。
/// 保留原始写法，调色板成员按调用方提供的原样返回。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorHex(String);

impl ColorHex {
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| ColorError::InvalidHex(value.to_string()))?;
        let valid_len = digits.len() == 3 || digits.len() == 6;
        if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 转换为 RGB，三位写法按位展开（`#abc` == `#aabbcc`）
    pub fn to_rgb(&self) -> Rgb {
        let digits = &self.0[1..];
        // parse 已保证只含十六进制字符
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        if digits.len() == 3 {
            let expand = |i: usize| {
                let d = &digits[i..i + 1];
                channel(&format!("{d}{d}"))
            };
            Rgb::new(expand(0), expand(1), expand(2))
        } else {
            Rgb::new(
                channel(&digits[0..2]),
                channel(&digits[2..4]),
                channel(&digits[4..6]),
            )
        }
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ColorHex {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ColorHex> for String {
    fn from(color: ColorHex) -> Self {
        color.0
    }
}

/// 在候选调色板中查找与目标颜色 RGB 欧氏距离最近的颜色
///
/// 距离相同时取输入顺序中靠前的候选（严格小于才替换）。
/// 空调色板属于调用方错误，返回 `ColorError::EmptyPalette`。
pub fn nearest(target: &ColorHex, candidates: &[ColorHex]) -> Result<ColorHex, ColorError> {
    let target_rgb = target.to_rgb();
    let mut best: Option<(&ColorHex, f64)> = None;

    for candidate in candidates {
        let distance = target_rgb.distance(&candidate.to_rgb());
        match best {
            Some((_, min)) if distance >= min => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.map(|(color, _)| color.clone())
        .ok_or(ColorError::EmptyPalette)
}
