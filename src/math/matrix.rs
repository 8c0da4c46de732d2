use super::vector::{Vector2, Vector3, Vector4};
use log::debug;
use std::fmt;
use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// 行列式绝对值低于该阈值时视为奇异矩阵
pub const SINGULAR_EPSILON: f32 = 1e-5;

/// 为 N×N 行主序矩阵生成共享实现
macro_rules! impl_matrix {
    ($name:ident, $n:expr, $vec:ident) => {
        impl $name {
            pub const ZERO: Self = Self { m: [0.0; $n * $n] };
            pub const IDENTITY: Self = {
                let mut m = [0.0; $n * $n];
                let mut i = 0;
                while i < $n {
                    m[i * $n + i] = 1.0;
                    i += 1;
                }
                Self { m }
            };

            /// 从行主序的扁平数组构造
            pub const fn from_row_major(m: [f32; $n * $n]) -> Self {
                Self { m }
            }

            /// 对角线全为 `value` 的矩阵
            pub fn from_diagonal(value: f32) -> Self {
                Self::IDENTITY * value
            }

            pub fn from_rows(rows: [$vec; $n]) -> Self {
                let mut m = [0.0; $n * $n];
                for (r, row) in rows.iter().enumerate() {
                    for c in 0..$n {
                        m[r * $n + c] = row[c];
                    }
                }
                Self { m }
            }

            #[inline]
            pub fn get(&self, row: usize, col: usize) -> f32 {
                self.m[row * $n + col]
            }

            #[inline]
            pub fn set(&mut self, row: usize, col: usize, value: f32) {
                self.m[row * $n + col] = value;
            }

            pub fn row(&self, row: usize) -> $vec {
                let mut values = [0.0; $n];
                values.copy_from_slice(&self.m[row * $n..(row + 1) * $n]);
                $vec::from(values)
            }

            pub fn col(&self, col: usize) -> $vec {
                let mut values = [0.0; $n];
                for (r, value) in values.iter_mut().enumerate() {
                    *value = self.m[r * $n + col];
                }
                $vec::from(values)
            }

            pub fn as_slice(&self) -> &[f32] {
                &self.m
            }

            pub fn transpose(&self) -> Self {
                let mut out = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        out.m[c * $n + r] = self.m[r * $n + c];
                    }
                }
                out
            }

            /// 求逆。奇异矩阵（|det| ≤ SINGULAR_EPSILON）返回单位矩阵，
            /// 此时结果不具备数学意义，仅用于让管线继续运行。
            pub fn invert(&self) -> Self {
                self.try_inverse().unwrap_or_else(|| {
                    debug!("{} 奇异，求逆退化为单位矩阵", stringify!($name));
                    Self::IDENTITY
                })
            }

            pub fn is_invertible(&self) -> bool {
                self.determinant().abs() > SINGULAR_EPSILON
            }

            pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
                self.m
                    .iter()
                    .zip(other.m.iter())
                    .all(|(a, b)| (a - b).abs() <= eps)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::IDENTITY
            }
        }

        impl Index<usize> for $name {
            type Output = f32;

            fn index(&self, index: usize) -> &f32 {
                &self.m[index]
            }
        }

        impl IndexMut<usize> for $name {
            fn index_mut(&mut self, index: usize) -> &mut f32 {
                &mut self.m[index]
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                let mut out = self;
                for (a, b) in out.m.iter_mut().zip(other.m.iter()) {
                    *a += b;
                }
                out
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                let mut out = self;
                for (a, b) in out.m.iter_mut().zip(other.m.iter()) {
                    *a -= b;
                }
                out
            }
        }

        impl Mul<f32> for $name {
            type Output = Self;

            fn mul(self, s: f32) -> Self {
                let mut out = self;
                out.m.iter_mut().for_each(|v| *v *= s);
                out
            }
        }

        impl Mul for $name {
            type Output = Self;

            fn mul(self, other: Self) -> Self {
                let mut out = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        let mut sum = 0.0;
                        for k in 0..$n {
                            sum += self.m[r * $n + k] * other.m[k * $n + c];
                        }
                        out.m[r * $n + c] = sum;
                    }
                }
                out
            }
        }

        impl Mul<$vec> for $name {
            type Output = $vec;

            fn mul(self, v: $vec) -> $vec {
                let mut values = [0.0; $n];
                for (r, value) in values.iter_mut().enumerate() {
                    *value = self.row(r).dot(v);
                }
                $vec::from(values)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}[", stringify!($name))?;
                for r in 0..$n {
                    if r > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[")?;
                    for c in 0..$n {
                        if c > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.m[r * $n + c])?;
                    }
                    write!(f, "]")?;
                }
                write!(f, "]")
            }
        }
    };
}

/// 2×2 行主序矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix2x2 {
    m: [f32; 4],
}

/// 3×3 行主序矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3x3 {
    m: [f32; 9],
}

/// 4×4 行主序矩阵，列向量约定：`M * v`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4x4 {
    m: [f32; 16],
}

impl_matrix!(Matrix2x2, 2, Vector2);
impl_matrix!(Matrix3x3, 3, Vector3);
impl_matrix!(Matrix4x4, 4, Vector4);

impl Matrix2x2 {
    pub const fn new(m00: f32, m01: f32, m10: f32, m11: f32) -> Self {
        Self {
            m: [m00, m01, m10, m11],
        }
    }

    pub fn determinant(&self) -> f32 {
        self.m[0] * self.m[3] - self.m[1] * self.m[2]
    }

    pub fn try_inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() <= SINGULAR_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self::new(
            self.m[3] * inv_det,
            -self.m[1] * inv_det,
            -self.m[2] * inv_det,
            self.m[0] * inv_det,
        ))
    }
}

impl Matrix3x3 {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        m00: f32,
        m01: f32,
        m02: f32,
        m10: f32,
        m11: f32,
        m12: f32,
        m20: f32,
        m21: f32,
        m22: f32,
    ) -> Self {
        Self {
            m: [m00, m01, m02, m10, m11, m12, m20, m21, m22],
        }
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// 伴随矩阵除以行列式
    pub fn try_inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() <= SINGULAR_EPSILON {
            return None;
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        Some(Self::new(
            (m[4] * m[8] - m[5] * m[7]) * inv_det,
            (m[2] * m[7] - m[1] * m[8]) * inv_det,
            (m[1] * m[5] - m[2] * m[4]) * inv_det,
            (m[5] * m[6] - m[3] * m[8]) * inv_det,
            (m[0] * m[8] - m[2] * m[6]) * inv_det,
            (m[2] * m[3] - m[0] * m[5]) * inv_det,
            (m[3] * m[7] - m[4] * m[6]) * inv_det,
            (m[1] * m[6] - m[0] * m[7]) * inv_det,
            (m[0] * m[4] - m[1] * m[3]) * inv_det,
        ))
    }

    /// 嵌入到 4×4 齐次矩阵的左上角
    pub fn to_homogeneous(&self) -> Matrix4x4 {
        let m = &self.m;
        Matrix4x4::new(
            m[0], m[1], m[2], 0.0, //
            m[3], m[4], m[5], 0.0, //
            m[6], m[7], m[8], 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

impl Matrix4x4 {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        m00: f32,
        m01: f32,
        m02: f32,
        m03: f32,
        m10: f32,
        m11: f32,
        m12: f32,
        m13: f32,
        m20: f32,
        m21: f32,
        m22: f32,
        m23: f32,
        m30: f32,
        m31: f32,
        m32: f32,
        m33: f32,
    ) -> Self {
        Self {
            m: [
                m00, m01, m02, m03, m10, m11, m12, m13, m20, m21, m22, m23, m30, m31, m32, m33,
            ],
        }
    }

    /// 左上角 3×3 子矩阵（旋转/缩放部分）
    pub fn upper_left(&self) -> Matrix3x3 {
        let m = &self.m;
        Matrix3x3::new(m[0], m[1], m[2], m[4], m[5], m[6], m[8], m[9], m[10])
    }

    pub fn translation(&self) -> Vector3 {
        Vector3::new(self.m[3], self.m[7], self.m[11])
    }

    /// 最后一行恰好为 [0, 0, 0, 1]
    pub fn is_affine(&self) -> bool {
        self.m[12] == 0.0 && self.m[13] == 0.0 && self.m[14] == 0.0 && self.m[15] == 1.0
    }

    pub fn determinant(&self) -> f32 {
        let (s, c) = self.sub_determinants();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// 仿射矩阵走快速路径，其余走完整的余子式展开
    pub fn try_inverse(&self) -> Option<Self> {
        if self.is_affine() {
            self.try_inverse_affine()
        } else {
            self.try_inverse_general()
        }
    }

    /// 仿射快速路径：inv([R t; 0 1]) = [R⁻¹ -R⁻¹t; 0 1]
    fn try_inverse_affine(&self) -> Option<Self> {
        let inv_r = self.upper_left().try_inverse()?;
        let t = inv_r * self.translation();
        let mut out = inv_r.to_homogeneous();
        out.m[3] = -t.x;
        out.m[7] = -t.y;
        out.m[11] = -t.z;
        Some(out)
    }

    fn try_inverse_general(&self) -> Option<Self> {
        let (s, c) = self.sub_determinants();
        let det = s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1]
            + s[5] * c[0];
        if det.abs() <= SINGULAR_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = &self.m;

        Some(Self::new(
            (a[5] * c[5] - a[6] * c[4] + a[7] * c[3]) * inv_det,
            (-a[1] * c[5] + a[2] * c[4] - a[3] * c[3]) * inv_det,
            (a[13] * s[5] - a[14] * s[4] + a[15] * s[3]) * inv_det,
            (-a[9] * s[5] + a[10] * s[4] - a[11] * s[3]) * inv_det,
            (-a[4] * c[5] + a[6] * c[2] - a[7] * c[1]) * inv_det,
            (a[0] * c[5] - a[2] * c[2] + a[3] * c[1]) * inv_det,
            (-a[12] * s[5] + a[14] * s[2] - a[15] * s[1]) * inv_det,
            (a[8] * s[5] - a[10] * s[2] + a[11] * s[1]) * inv_det,
            (a[4] * c[4] - a[5] * c[2] + a[7] * c[0]) * inv_det,
            (-a[0] * c[4] + a[1] * c[2] - a[3] * c[0]) * inv_det,
            (a[12] * s[4] - a[13] * s[2] + a[15] * s[0]) * inv_det,
            (-a[8] * s[4] + a[9] * s[2] - a[11] * s[0]) * inv_det,
            (-a[4] * c[3] + a[5] * c[1] - a[6] * c[0]) * inv_det,
            (a[0] * c[3] - a[1] * c[1] + a[2] * c[0]) * inv_det,
            (-a[12] * s[3] + a[13] * s[1] - a[14] * s[0]) * inv_det,
            (a[8] * s[3] - a[9] * s[1] + a[10] * s[0]) * inv_det,
        ))
    }

    /// 上两行与下两行的 2×2 子式，供行列式和余子式共用
    fn sub_determinants(&self) -> ([f32; 6], [f32; 6]) {
        let a = &self.m;
        let s = [
            a[0] * a[5] - a[4] * a[1],
            a[0] * a[6] - a[4] * a[2],
            a[0] * a[7] - a[4] * a[3],
            a[1] * a[6] - a[5] * a[2],
            a[1] * a[7] - a[5] * a[3],
            a[2] * a[7] - a[6] * a[3],
        ];
        let c = [
            a[8] * a[13] - a[12] * a[9],
            a[8] * a[14] - a[12] * a[10],
            a[8] * a[15] - a[12] * a[11],
            a[9] * a[14] - a[13] * a[10],
            a[9] * a[15] - a[13] * a[11],
            a[10] * a[15] - a[14] * a[11],
        ];
        (s, c)
    }

    /// 变换点（w = 1），结果做齐次除法
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        let v = *self * p.extend(1.0);
        if v.w != 0.0 && v.w != 1.0 {
            v.truncate() / v.w
        } else {
            v.truncate()
        }
    }

    /// 变换方向（w = 0），忽略平移
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        (*self * v.extend(0.0)).truncate()
    }
}

impl From<Matrix4x4> for nalgebra::Matrix4<f32> {
    fn from(m: Matrix4x4) -> Self {
        nalgebra::Matrix4::from_row_slice(&m.m)
    }
}

impl From<nalgebra::Matrix4<f32>> for Matrix4x4 {
    fn from(m: nalgebra::Matrix4<f32>) -> Self {
        let mut out = Matrix4x4::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[r * 4 + c] = m[(r, c)];
            }
        }
        out
    }
}

impl From<Matrix3x3> for nalgebra::Matrix3<f32> {
    fn from(m: Matrix3x3) -> Self {
        nalgebra::Matrix3::from_row_slice(&m.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// 对角占优的随机矩阵，保证条件数良好
    fn random_matrix4(rng: &mut impl Rng) -> Matrix4x4 {
        let mut m = Matrix4x4::from_diagonal(40.0);
        for i in 0..16 {
            m[i] += rng.random_range(-10.0..10.0);
        }
        m
    }

    #[test]
    fn identity_constants() {
        assert_eq!(Matrix2x2::IDENTITY.to_string(), "Matrix2x2[[1, 0], [0, 1]]");
        assert_eq!(
            Matrix3x3::IDENTITY.to_string(),
            "Matrix3x3[[1, 0, 0], [0, 1, 0], [0, 0, 1]]"
        );
        assert_eq!(Matrix4x4::default(), Matrix4x4::IDENTITY);
        assert_eq!(Matrix3x3::from_diagonal(5.0).get(1, 1), 5.0);
    }

    #[test]
    fn add_sub_mul_2x2() {
        let m1 = Matrix2x2::new(1.0, 2.0, 3.0, 4.0);
        let m2 = Matrix2x2::new(5.0, 6.0, 7.0, 8.0);
        assert_eq!((m1 + m2).to_string(), "Matrix2x2[[6, 8], [10, 12]]");
        assert_eq!((m2 - m1).to_string(), "Matrix2x2[[4, 4], [4, 4]]");
        assert_eq!((m1 * m2).to_string(), "Matrix2x2[[19, 22], [43, 50]]");
        assert_eq!(m1.transpose().to_string(), "Matrix2x2[[1, 3], [2, 4]]");
    }

    #[test]
    fn mul_3x3() {
        let m1 = Matrix3x3::from_row_major([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let m2 = Matrix3x3::from_row_major([5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0]);
        assert_eq!(
            (m1 * m2).to_string(),
            "Matrix3x3[[54, 60, 66], [126, 141, 156], [198, 222, 246]]"
        );
        assert_eq!(
            m1.transpose().to_string(),
            "Matrix3x3[[1, 4, 7], [2, 5, 8], [3, 6, 9]]"
        );
        assert_eq!(m1.determinant(), 0.0);
    }

    #[test]
    fn matrix_vector_product() {
        let m = Matrix3x3::from_row_major([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(m * Vector3::new(1.0, 0.0, -1.0), Vector3::new(-2.0, -2.0, -2.0));

        let mut t = Matrix4x4::IDENTITY;
        t.set(0, 3, 5.0);
        assert_eq!(t.transform_point(Vector3::ZERO), Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(t.transform_vector(Vector3::RIGHT), Vector3::RIGHT);
    }

    #[test]
    fn invert_twice_returns_original() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let m = random_matrix4(&mut rng);
            let back = m.invert().invert();
            assert!(back.approx_eq(&m, 1e-2), "{} vs {}", back, m);
            assert!((m * m.invert()).approx_eq(&Matrix4x4::IDENTITY, 1e-4));
        }
    }

    #[test]
    fn inverse_matches_nalgebra() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let m = random_matrix4(&mut rng);
            let reference: nalgebra::Matrix4<f32> = m.into();
            let Some(expected) = reference.try_inverse() else {
                continue;
            };
            let expected = Matrix4x4::from(expected);
            assert!(m.invert().approx_eq(&expected, 1e-5));
            let det = reference.determinant();
            assert!((m.determinant() - det).abs() <= det.abs() * 1e-4);
        }
    }

    #[test]
    fn affine_fast_path_agrees_with_general_inverse() {
        let m = Matrix4x4::new(
            0.0, -2.0, 0.0, 3.0, //
            2.0, 0.0, 0.0, -1.0, //
            0.0, 0.0, 4.0, 7.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        assert!(m.is_affine());
        let fast = m.try_inverse_affine().unwrap();
        let general = m.try_inverse_general().unwrap();
        assert!(fast.approx_eq(&general, 1e-6));
        assert!((m * fast).approx_eq(&Matrix4x4::IDENTITY, 1e-6));
    }

    #[test]
    fn singular_matrix_inverts_to_identity() {
        let singular = Matrix4x4::from_row_major([1.0; 16]);
        assert_eq!(singular.invert(), Matrix4x4::IDENTITY);
        assert!(singular.try_inverse().is_none());

        let tiny = Matrix3x3::from_diagonal(1e-3);
        assert!(tiny.determinant().abs() < SINGULAR_EPSILON);
        assert_eq!(tiny.invert(), Matrix3x3::IDENTITY);

        assert_eq!(Matrix2x2::ZERO.invert(), Matrix2x2::IDENTITY);
    }

    #[test]
    fn determinant_equal_to_epsilon_is_singular() {
        let eps = SINGULAR_EPSILON;
        let m2 = Matrix2x2::new(eps, 0.0, 0.0, 1.0);
        assert_eq!(m2.determinant(), eps);
        assert!(!m2.is_invertible());
        assert_eq!(m2.invert(), Matrix2x2::IDENTITY);

        let m3 = Matrix3x3::from_row_major([eps, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(m3.try_inverse().is_none());

        // 非仿射，走余子式展开
        let mut m4 = Matrix4x4::IDENTITY;
        m4.m[15] = eps;
        assert!(m4.try_inverse().is_none());
        assert_eq!(m4.invert(), Matrix4x4::IDENTITY);

        // 仿射快速路径
        let mut affine = Matrix4x4::IDENTITY;
        affine.m[0] = eps;
        assert!(affine.try_inverse().is_none());
    }

    #[test]
    fn invert_2x2_and_3x3() {
        let m = Matrix2x2::new(4.0, 7.0, 2.0, 6.0);
        assert!((m * m.invert()).approx_eq(&Matrix2x2::IDENTITY, 1e-6));

        let m = Matrix3x3::from_row_major([2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 1.0]);
        assert!((m * m.invert()).approx_eq(&Matrix3x3::IDENTITY, 1e-5));
        assert!(m.invert().invert().approx_eq(&m, 1e-5));
    }
}
