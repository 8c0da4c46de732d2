use super::matrix::{Matrix3x3, Matrix4x4};
use super::vector::Vector3;

/// 万向节锁判定阈值
const GIMBAL_EPSILON: f32 = 1e-6;

/// 欧拉角（度）转旋转矩阵
///
/// `euler.x` 为航向角 heading（绕Y），`euler.y` 为俯仰角 pitch（绕X），
/// `euler.z` 为滚转角 roll（绕Z）。
pub fn euler_to_matrix(euler: Vector3) -> Matrix3x3 {
    let (sh, ch) = euler.x.to_radians().sin_cos();
    let (sp, cp) = euler.y.to_radians().sin_cos();
    let (sr, cr) = euler.z.to_radians().sin_cos();

    Matrix3x3::new(
        cr * ch - sr * sp * sh,
        -sr * cp,
        cr * sh + sr * sp * ch,
        sr * ch + cr * sp * sh,
        cr * cp,
        sr * sh - cr * sp * ch,
        -cp * sh,
        sp,
        cp * ch,
    )
}

/// 旋转矩阵转欧拉角（度），与 [`euler_to_matrix`] 互逆
///
/// pitch 为 ±90° 时航向与滚转耦合，此时约定 heading = 0。
pub fn matrix_to_euler(m: &Matrix3x3) -> Vector3 {
    let pitch = m.get(2, 1).clamp(-1.0, 1.0).asin();

    if m.get(0, 1).abs() < GIMBAL_EPSILON && m.get(1, 1).abs() < GIMBAL_EPSILON {
        let roll = m.get(1, 0).atan2(m.get(0, 0));
        return Vector3::new(0.0, pitch.to_degrees(), roll.to_degrees());
    }

    let heading = (-m.get(2, 0)).atan2(m.get(2, 2));
    let roll = (-m.get(0, 1)).atan2(m.get(1, 1));
    Vector3::new(heading.to_degrees(), pitch.to_degrees(), roll.to_degrees())
}

/// 从 4×4 矩阵的旋转部分提取欧拉角
pub fn matrix4_to_euler(m: &Matrix4x4) -> Vector3 {
    matrix_to_euler(&m.upper_left())
}
