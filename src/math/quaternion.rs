use super::MathError;
use super::matrix::{Matrix3x3, Matrix4x4};
use super::vector::Vector3;
use std::fmt;
use std::ops::Mul;

/// 点积超过该值时 slerp 退化为线性插值
const SLERP_LINEAR_THRESHOLD: f32 = 1.0 - 1e-6;

/// 单位四元数 (x, y, z, w)
///
/// 所有构造路径都会重新归一化，因此共轭即为逆。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// 构造并归一化；零长度或非有限输入退化为单位四元数
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        let mag = (x * x + y * y + z * z + w * w).sqrt();
        if mag == 0.0 || !mag.is_finite() {
            return Self::IDENTITY;
        }
        let inv = 1.0 / mag;
        Self {
            x: x * inv,
            y: y * inv,
            z: z * inv,
            w: w * inv,
        }
    }

    /// 由绕 X、Y、Z 轴的角度（度）构造，合成顺序为 Rz·Ry·Rx
    pub fn from_euler_angles(x_deg: f32, y_deg: f32, z_deg: f32) -> Self {
        let (sx, cx) = (x_deg.to_radians() * 0.5).sin_cos();
        let (sy, cy) = (y_deg.to_radians() * 0.5).sin_cos();
        let (sz, cz) = (z_deg.to_radians() * 0.5).sin_cos();

        Self::new(
            sx * cy * cz - cx * sy * sz,
            cx * sy * cz + sx * cy * sz,
            cx * cy * sz - sx * sy * cz,
            cx * cy * cz + sx * sy * sz,
        )
    }

    pub fn from_euler(euler: Vector3) -> Self {
        Self::from_euler_angles(euler.x, euler.y, euler.z)
    }

    /// 绕任意轴旋转 `angle_deg` 度
    pub fn from_axis_angle(axis: Vector3, angle_deg: f32) -> Result<Self, MathError> {
        let axis = axis.normalized()?;
        let (s, c) = (angle_deg.to_radians() * 0.5).sin_cos();
        Ok(Self::new(axis.x * s, axis.y * s, axis.z * s, c))
    }

    /// 提取欧拉角（度），与 [`Quaternion::from_euler_angles`] 互逆
    pub fn euler_angles(&self) -> Vector3 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let rx = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let ry = (2.0 * (w * y - x * z)).clamp(-1.0, 1.0).asin();
        let rz = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        Vector3::new(rx.to_degrees(), ry.to_degrees(), rz.to_degrees())
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn w(&self) -> f32 {
        self.w
    }

    pub fn magnitude(&self) -> f32 {
        Self::dot(*self, *self).sqrt()
    }

    pub fn dot(a: Self, b: Self) -> f32 {
        a.x * b.x + a.y * b.y + a.z * b.z + a.w * b.w
    }

    pub fn conjugate(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// 单位四元数的逆等于共轭
    pub fn inverse(&self) -> Self {
        self.conjugate()
    }

    /// 球面线性插值，走最短弧
    pub fn slerp(a: Self, b: Self, t: f32) -> Self {
        let mut cos_theta = Self::dot(a, b);
        let sign = if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            -1.0
        } else {
            1.0
        };

        let (c1, mut c2) = if cos_theta >= SLERP_LINEAR_THRESHOLD {
            (1.0 - t, t)
        } else {
            let theta = cos_theta.acos();
            let inv_sin_theta = 1.0 / theta.sin();
            (
                (theta - t * theta).sin() * inv_sin_theta,
                (t * theta).sin() * inv_sin_theta,
            )
        };
        c2 *= sign;

        Self::new(
            a.x * c1 + b.x * c2,
            a.y * c1 + b.y * c2,
            a.z * c1 + b.z * c2,
            a.w * c1 + b.w * c2,
        )
    }

    /// 分量线性插值后归一化
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let c1 = 1.0 - t;
        Self::new(
            a.x * c1 + b.x * t,
            a.y * c1 + b.y * t,
            a.z * c1 + b.z * t,
            a.w * c1 + b.w * t,
        )
    }

    /// 两个朝向之间的夹角（度）
    pub fn angle(a: Self, b: Self) -> f32 {
        let cos_theta = Self::dot(a, b).abs().min(1.0);
        2.0 * cos_theta.acos().to_degrees()
    }

    pub fn to_matrix3(&self) -> Matrix3x3 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        Matrix3x3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        )
    }

    /// 等价的 4×4 旋转矩阵
    pub fn to_matrix4(&self) -> Matrix4x4 {
        self.to_matrix3().to_homogeneous()
    }

    fn vector_part(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton 积：先应用 `other`，再应用 `self`
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, other: Quaternion) -> Quaternion {
        let v1 = self.vector_part();
        let v2 = other.vector_part();
        let w = self.w * other.w - v1.dot(v2);
        let v = v1.cross(v2) + v2 * self.w + v1 * other.w;
        Quaternion::new(v.x, v.y, v.z, w)
    }
}

/// 用四元数旋转向量
impl Mul<Vector3> for Quaternion {
    type Output = Vector3;

    fn mul(self, v: Vector3) -> Vector3 {
        let u = self.vector_part();
        let s = self.w;
        u * (2.0 * u.dot(v)) + v * (s * s - u.dot(u)) + u.cross(v) * (2.0 * s)
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion({:.5}, {:.5}, {:.5}, {:.5})",
            self.x, self.y, self.z, self.w
        )
    }
}

impl From<Quaternion> for nalgebra::UnitQuaternion<f32> {
    fn from(q: Quaternion) -> Self {
        nalgebra::UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z))
    }
}
