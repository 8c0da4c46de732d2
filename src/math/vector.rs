use super::MathError;
use std::fmt;
use std::ops::{Add, Div, Index, Mul, Neg, Sub};

/// 为 Vector2/3/4 生成共享的分量运算
macro_rules! impl_vector {
    ($name:ident, $dim:expr, $($field:ident => $idx:expr),+) => {
        impl $name {
            pub const ZERO: Self = Self { $($field: 0.0),+ };
            pub const ONE: Self = Self { $($field: 1.0),+ };
            /// 分量个数
            pub const DIM: usize = $dim;

            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }

            /// 所有分量取同一个值
            pub const fn splat(value: f32) -> Self {
                Self { $($field: value),+ }
            }

            pub fn dot(self, other: Self) -> f32 {
                0.0 $(+ self.$field * other.$field)+
            }

            pub fn sqr_magnitude(self) -> f32 {
                self.dot(self)
            }

            pub fn magnitude(self) -> f32 {
                self.sqr_magnitude().sqrt()
            }

            /// 返回归一化副本，零向量返回错误
            pub fn normalized(self) -> Result<Self, MathError> {
                let mag = self.magnitude();
                if mag == 0.0 || !mag.is_finite() {
                    return Err(MathError::ZeroLengthVector);
                }
                let inv = 1.0 / mag;
                Ok(Self { $($field: self.$field * inv),+ })
            }

            /// 原地归一化，失败时保持原值不变
            pub fn normalize(&mut self) -> Result<(), MathError> {
                *self = self.normalized()?;
                Ok(())
            }

            /// 两个向量之间的夹角（度）
            pub fn angle(from: Self, to: Self) -> Result<f32, MathError> {
                let denom = from.magnitude() * to.magnitude();
                if denom == 0.0 || !denom.is_finite() {
                    return Err(MathError::ZeroLengthVector);
                }
                let cos_theta = (from.dot(to) / denom).clamp(-1.0, 1.0);
                Ok(cos_theta.acos().to_degrees())
            }

            pub fn lerp(self, other: Self, t: f32) -> Self {
                self + (other - self) * t
            }

            /// 光栅化：每个分量向下取整
            pub fn rasterized(self) -> Self {
                Self { $($field: self.$field.floor()),+ }
            }

            pub fn get(&self, index: usize) -> Option<f32> {
                match index {
                    $($idx => Some(self.$field),)+
                    _ => None,
                }
            }

            /// 按名称访问分量，不区分大小写（"x"、"Y"...）
            pub fn component(&self, name: &str) -> Option<f32> {
                $(
                    if name.eq_ignore_ascii_case(stringify!($field)) {
                        return Some(self.$field);
                    }
                )+
                None
            }

            pub fn to_array(self) -> [f32; $dim] {
                [$(self.$field),+]
            }
        }

        impl From<[f32; $dim]> for $name {
            fn from(values: [f32; $dim]) -> Self {
                Self { $($field: values[$idx]),+ }
            }
        }

        impl Index<usize> for $name {
            type Output = f32;

            fn index(&self, index: usize) -> &f32 {
                match index {
                    $($idx => &self.$field,)+
                    _ => panic!("{} 分量索引越界: {}", stringify!($name), index),
                }
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                Self { $($field: self.$field + other.$field),+ }
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                Self { $($field: self.$field - other.$field),+ }
            }
        }

        impl Mul<f32> for $name {
            type Output = Self;

            fn mul(self, s: f32) -> Self {
                Self { $($field: self.$field * s),+ }
            }
        }

        impl Mul<$name> for f32 {
            type Output = $name;

            fn mul(self, v: $name) -> $name {
                v * self
            }
        }

        impl Div<f32> for $name {
            type Output = Self;

            fn div(self, s: f32) -> Self {
                Self { $($field: self.$field / s),+ }
            }
        }

        impl Neg for $name {
            type Output = Self;

            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 齐次坐标向量，裁剪空间位置使用 w 分量做透视除法
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl_vector!(Vector2, 2, x => 0, y => 1);
impl_vector!(Vector3, 3, x => 0, y => 1, z => 2);
impl_vector!(Vector4, 4, x => 0, y => 1, z => 2, w => 3);

impl Vector2 {
    /// 二维叉积（z 分量），符号表示绕序
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn extend(self, z: f32) -> Vector3 {
        Vector3::new(self.x, self.y, z)
    }
}

impl Vector3 {
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const DOWN: Self = Self::new(0.0, -1.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);
    pub const BACK: Self = Self::new(0.0, 0.0, -1.0);
    pub const LEFT: Self = Self::new(-1.0, 0.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn extend(self, w: f32) -> Vector4 {
        Vector4::new(self.x, self.y, self.z, w)
    }

    pub fn truncate(self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// 分量逐个相乘
    pub fn component_mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }
}

impl Vector4 {
    pub fn truncate(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector2({:.5}, {:.5})", self.x, self.y)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3({:.5}, {:.5}, {:.5})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vector4({:.5}, {:.5}, {:.5}, {:.5})",
            self.x, self.y, self.z, self.w
        )
    }
}

// ===== 与 nalgebra 互转 =====

impl From<Vector3> for nalgebra::Vector3<f32> {
    fn from(v: Vector3) -> Self {
        nalgebra::Vector3::new(v.x, v.y, v.z)
    }
}

impl From<nalgebra::Vector3<f32>> for Vector3 {
    fn from(v: nalgebra::Vector3<f32>) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vector4> for nalgebra::Vector4<f32> {
    fn from(v: Vector4) -> Self {
        nalgebra::Vector4::new(v.x, v.y, v.z, v.w)
    }
}

impl From<nalgebra::Vector4<f32>> for Vector4 {
    fn from(v: nalgebra::Vector4<f32>) -> Self {
        Vector4::new(v.x, v.y, v.z, v.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn normalize_yields_unit_parallel_vector() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let v = Vector3::new(
                rng.random_range(-100.0..100.0),
                rng.random_range(-100.0..100.0),
                rng.random_range(-100.0..100.0),
            );
            if v.magnitude() < 1e-3 {
                continue;
            }
            let n = v.normalized().unwrap();
            assert!(approx(n.magnitude(), 1.0));
            // 平行：叉积为零且同向
            assert!(n.cross(v).magnitude() < 1e-3);
            assert!(n.dot(v) > 0.0);
        }
    }

    #[test]
    fn normalize_zero_vector_fails() {
        assert_eq!(Vector2::ZERO.normalized(), Err(MathError::ZeroLengthVector));
        assert_eq!(Vector3::ZERO.normalized(), Err(MathError::ZeroLengthVector));
        let mut v = Vector4::ZERO;
        assert!(v.normalize().is_err());
        assert_eq!(v, Vector4::ZERO);
    }

    #[test]
    fn normalize_in_place() {
        let mut v = Vector2::new(3.0, 4.0);
        v.normalize().unwrap();
        assert!(approx(v.x, 0.6));
        assert!(approx(v.y, 0.8));
    }

    #[test]
    fn component_access_by_index_and_name() {
        let v = Vector4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[3], 4.0);
        assert_eq!(v.get(4), None);
        assert_eq!(v.component("z"), Some(3.0));
        assert_eq!(v.component("W"), Some(4.0));
        assert_eq!(v.component("q"), None);
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let v = Vector2::new(1.0, 2.0);
        let _ = v[2];
    }

    #[test]
    fn cross_products() {
        assert_eq!(Vector3::RIGHT.cross(Vector3::UP), Vector3::FORWARD);
        assert_eq!(Vector2::new(1.0, 0.0).cross(Vector2::new(0.0, 1.0)), 1.0);
        assert_eq!(Vector2::new(0.0, 1.0).cross(Vector2::new(1.0, 0.0)), -1.0);
    }

    #[test]
    fn angle_between_axes() {
        let a = Vector3::angle(Vector3::RIGHT, Vector3::UP).unwrap();
        assert!(approx(a, 90.0));
        assert!(Vector3::angle(Vector3::ZERO, Vector3::UP).is_err());
    }

    #[test]
    fn rasterized_floors_components() {
        let v = Vector3::new(1.7, -0.2, 2.0).rasterized();
        assert_eq!(v, Vector3::new(1.0, -1.0, 2.0));
    }

    #[test]
    fn arithmetic_is_component_wise() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vector3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vector3::splat(3.0));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(b / 2.0, Vector3::new(2.0, 2.5, 3.0));
        assert_eq!(-a, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(a.lerp(b, 0.5), Vector3::new(2.5, 3.5, 4.5));
    }

    #[test]
    fn display_matches_fixed_precision() {
        assert_eq!(Vector2::new(1.0, 2.5).to_string(), "Vector2(1.00000, 2.50000)");
    }
}
