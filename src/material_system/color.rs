use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// RGBA 颜色，分量约定在 [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    /// 全零，颜色缓冲区的初始值
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// 从属性切片读取颜色，不足 4 个分量时返回 None
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [r, g, b, a, ..] => Some(Self::new(*r, *g, *b, *a)),
            _ => None,
        }
    }

    /// 所有分量非负（且不是 NaN）才视为可绘制
    pub fn is_valid(&self) -> bool {
        self.r >= 0.0 && self.g >= 0.0 && self.b >= 0.0 && self.a >= 0.0
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// 打包为 0xRRGGBBAA
    pub fn to_packed(&self) -> u32 {
        let [r, g, b, a] = self.to_rgba8();
        u32::from_be_bytes([r, g, b, a])
    }

    pub fn from_packed(packed: u32) -> Self {
        let [r, g, b, a] = packed.to_be_bytes();
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// 获取面的基础颜色
///
/// `colorize` 为 false 时返回默认灰色；否则以面索引为种子生成伪随机颜色，
/// 同一索引结果固定。
pub fn get_face_color(face_index: usize, colorize: bool) -> Color {
    if !colorize {
        return Color::rgb(0.7, 0.7, 0.7);
    }
    let mut rng = StdRng::seed_from_u64(face_index as u64);
    Color::rgb(
        0.3 + rng.random::<f32>() * 0.4,
        0.3 + rng.random::<f32>() * 0.4,
        0.3 + rng.random::<f32>() * 0.4,
    )
}

impl Add for Color {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self::new(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl Sub for Color {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        Self::new(self.r - o.r, self.g - o.g, self.b - o.b, self.a - o.a)
    }
}

impl Mul<f32> for Color {
    type Output = Self;

    fn mul(self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

/// 分量相乘（调制）
impl Mul for Color {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        Self::new(self.r * o.r, self.g * o.g, self.b * o.b, self.a * o.a)
    }
}

impl Div<f32> for Color {
    type Output = Self;

    fn div(self, s: f32) -> Self {
        Self::new(self.r / s, self.g / s, self.b / s, self.a / s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Color({:.5}, {:.5}, {:.5}, {:.5})",
            self.r, self.g, self.b, self.a
        )
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// RGB 三元组，alpha 补 1
impl From<[f32; 3]> for Color {
    fn from(v: [f32; 3]) -> Self {
        Self::rgb(v[0], v[1], v[2])
    }
}
