// math/mod.rs
// 向量、矩阵、四元数等线性代数基础类型
pub mod euler;
pub mod matrix;
pub mod quaternion;
pub mod vector;

use thiserror::Error;

pub use euler::{euler_to_matrix, matrix_to_euler, matrix4_to_euler};
pub use matrix::{Matrix2x2, Matrix3x3, Matrix4x4, SINGULAR_EPSILON};
pub use quaternion::Quaternion;
pub use vector::{Vector2, Vector3, Vector4};

/// 数学运算中不可恢复的数值错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("无法归一化零长度向量")]
    ZeroLengthVector,
}
