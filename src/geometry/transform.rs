use crate::math::{MathError, Matrix4x4, Quaternion, Vector3};
use std::fmt;

/// 物体的位置/旋转/缩放，局部到世界矩阵按需惰性重算
///
/// 所有修改都会置脏标记；`local_to_world_matrix` 仅在脏时重新计算 T·R·S。
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vector3,
    rotation: Quaternion,
    scale: Vector3,
    local_to_world: Matrix4x4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vector3::ZERO, Quaternion::IDENTITY, Vector3::ONE)
    }
}

impl Transform {
    pub fn new(position: Vector3, rotation: Quaternion, scale: Vector3) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_to_world: Matrix4x4::IDENTITY,
            dirty: true,
        }
    }

    /// 以欧拉角（度）描述旋转
    pub fn from_euler(position: Vector3, euler_deg: Vector3, scale: Vector3) -> Self {
        Self::new(position, Quaternion::from_euler(euler_deg), scale)
    }

    /// 局部到世界矩阵：先缩放，再旋转，最后平移
    pub fn local_to_world_matrix(&mut self) -> &Matrix4x4 {
        if self.dirty {
            let translation = TransformFactory::translation(self.position);
            let scale = TransformFactory::scaling_nonuniform(self.scale);
            self.local_to_world = translation * self.rotation.to_matrix4() * scale;
            self.dirty = false;
        }
        &self.local_to_world
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn translate(&mut self, delta: Vector3) {
        self.position = self.position + delta;
        self.dirty = true;
    }

    /// 在局部空间中叠加一次欧拉角旋转（度）
    pub fn rotate(&mut self, x_deg: f32, y_deg: f32, z_deg: f32) {
        self.rotation = self.rotation * Quaternion::from_euler_angles(x_deg, y_deg, z_deg);
        self.dirty = true;
    }

    /// 绕局部轴旋转；零长度轴返回错误且不修改状态
    pub fn rotate_axis(&mut self, axis: Vector3, angle_deg: f32) -> Result<(), MathError> {
        let delta = Quaternion::from_axis_angle(axis, angle_deg)?;
        self.rotation = self.rotation * delta;
        self.dirty = true;
        Ok(())
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.dirty = true;
    }

    pub fn rotation(&self) -> Quaternion {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// 当前旋转的欧拉角（度）
    pub fn euler_angles(&self) -> Vector3 {
        self.rotation.euler_angles()
    }

    pub fn set_euler_angles(&mut self, euler_deg: Vector3) {
        self.set_rotation(Quaternion::from_euler(euler_deg));
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn forward(&self) -> Vector3 {
        self.rotation * Vector3::FORWARD
    }

    pub fn right(&self) -> Vector3 {
        self.rotation * Vector3::RIGHT
    }

    pub fn up(&self) -> Vector3 {
        self.rotation * Vector3::UP
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.euler_angles();
        write!(
            f,
            "Transform(Pos({:.5}, {:.5}, {:.5}), Rot({:.5}, {:.5}, {:.5}), Scale({:.5}, {:.5}, {:.5}))",
            self.position.x,
            self.position.y,
            self.position.z,
            e.x,
            e.y,
            e.z,
            self.scale.x,
            self.scale.y,
            self.scale.z
        )
    }
}

/// 变换矩阵工厂，提供创建各种变换矩阵的静态方法
pub struct TransformFactory;

impl TransformFactory {
    /// 创建绕任意轴旋转的变换矩阵
    pub fn rotation(axis: Vector3, angle_deg: f32) -> Result<Matrix4x4, MathError> {
        Ok(Quaternion::from_axis_angle(axis, angle_deg)?.to_matrix4())
    }

    pub fn rotation_x(angle_deg: f32) -> Matrix4x4 {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Matrix4x4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, -s, 0.0, //
            0.0, s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_y(angle_deg: f32) -> Matrix4x4 {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Matrix4x4::new(
            c, 0.0, s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_z(angle_deg: f32) -> Matrix4x4 {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Matrix4x4::new(
            c, -s, 0.0, 0.0, //
            s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 创建平移矩阵
    pub fn translation(t: Vector3) -> Matrix4x4 {
        Matrix4x4::new(
            1.0, 0.0, 0.0, t.x, //
            0.0, 1.0, 0.0, t.y, //
            0.0, 0.0, 1.0, t.z, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 创建均匀缩放矩阵
    pub fn scaling(scale: f32) -> Matrix4x4 {
        Self::scaling_nonuniform(Vector3::splat(scale))
    }

    /// 创建非均匀缩放矩阵
    pub fn scaling_nonuniform(s: Vector3) -> Matrix4x4 {
        Matrix4x4::new(
            s.x, 0.0, 0.0, 0.0, //
            0.0, s.y, 0.0, 0.0, //
            0.0, 0.0, s.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 右手系视图矩阵 (lookAt)
    pub fn look_at_rh(eye: Vector3, target: Vector3, up: Vector3) -> Result<Matrix4x4, MathError> {
        let f = (target - eye).normalized()?;
        let s = f.cross(up).normalized()?;
        let u = s.cross(f);
        Ok(Matrix4x4::new(
            s.x,
            s.y,
            s.z,
            -s.dot(eye),
            u.x,
            u.y,
            u.z,
            -u.dot(eye),
            -f.x,
            -f.y,
            -f.z,
            f.dot(eye),
            0.0,
            0.0,
            0.0,
            1.0,
        ))
    }

    /// 创建透视投影矩阵（OpenGL 约定，NDC z ∈ [-1, 1]）
    pub fn perspective(aspect_ratio: f32, fov_y_deg: f32, near: f32, far: f32) -> Matrix4x4 {
        let f = 1.0 / (fov_y_deg.to_radians() * 0.5).tan();
        let range = near - far;
        Matrix4x4::new(
            f / aspect_ratio,
            0.0,
            0.0,
            0.0,
            0.0,
            f,
            0.0,
            0.0,
            0.0,
            0.0,
            (far + near) / range,
            2.0 * far * near / range,
            0.0,
            0.0,
            -1.0,
            0.0,
        )
    }

    /// 创建正交投影矩阵
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Matrix4x4 {
        let rl = right - left;
        let tb = top - bottom;
        let fn_ = far - near;
        Matrix4x4::new(
            2.0 / rl,
            0.0,
            0.0,
            -(right + left) / rl,
            0.0,
            2.0 / tb,
            0.0,
            -(top + bottom) / tb,
            0.0,
            0.0,
            -2.0 / fn_,
            -(far + near) / fn_,
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vector3, b: Vector3) {
        assert!((a - b).magnitude() < 1e-4, "{} vs {}", a, b);
    }

    #[test]
    fn matrix_is_cached_until_mutated() {
        let mut tf = Transform::from_euler(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(10.0, 20.0, 30.0),
            Vector3::splat(2.0),
        );
        assert!(tf.is_dirty());

        let first: *const Matrix4x4 = tf.local_to_world_matrix();
        let first_value = *tf.local_to_world_matrix();
        assert!(!tf.is_dirty());
        let second: *const Matrix4x4 = tf.local_to_world_matrix();
        assert!(std::ptr::eq(first, second));
        assert_eq!(*tf.local_to_world_matrix(), first_value);

        tf.translate(Vector3::RIGHT);
        assert!(tf.is_dirty());
        assert_ne!(*tf.local_to_world_matrix(), first_value);
    }

    #[test]
    fn every_setter_marks_dirty() {
        let mut tf = Transform::default();
        let mutations: Vec<Box<dyn Fn(&mut Transform)>> = vec![
            Box::new(|t| t.set_position(Vector3::ONE)),
            Box::new(|t| t.set_scale(Vector3::splat(3.0))),
            Box::new(|t| t.set_rotation(Quaternion::from_euler_angles(0.0, 45.0, 0.0))),
            Box::new(|t| t.set_euler_angles(Vector3::new(5.0, 0.0, 0.0))),
            Box::new(|t| t.rotate(0.0, 0.0, 15.0)),
            Box::new(|t| t.rotate_axis(Vector3::UP, 30.0).unwrap()),
        ];
        for mutate in &mutations {
            tf.local_to_world_matrix();
            assert!(!tf.is_dirty());
            mutate(&mut tf);
            assert!(tf.is_dirty());
        }
    }

    #[test]
    fn applies_scale_then_rotation_then_translation() {
        let mut tf = Transform::new(
            Vector3::new(10.0, 0.0, 0.0),
            Quaternion::from_axis_angle(Vector3::FORWARD, 90.0).unwrap(),
            Vector3::splat(2.0),
        );
        let p = tf.local_to_world_matrix().transform_point(Vector3::RIGHT);
        assert_vec_close(p, Vector3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn direction_vectors_follow_rotation() {
        let mut tf = Transform::default();
        assert_vec_close(tf.forward(), Vector3::FORWARD);
        tf.rotate_axis(Vector3::UP, 90.0).unwrap();
        assert_vec_close(tf.forward(), Vector3::RIGHT);
        assert_vec_close(tf.up(), Vector3::UP);
        assert_vec_close(tf.right(), Vector3::BACK);
        assert!(tf.rotate_axis(Vector3::ZERO, 10.0).is_err());
    }

    #[test]
    fn factory_rotations_agree_with_quaternions() {
        let v = Vector3::new(0.2, 0.7, -1.1);
        let q = Quaternion::from_euler_angles(20.0, 35.0, 50.0);
        let m = TransformFactory::rotation_z(50.0)
            * TransformFactory::rotation_y(35.0)
            * TransformFactory::rotation_x(20.0);
        assert_vec_close(m.transform_vector(v), q * v);
    }

    #[test]
    fn look_at_and_projection_match_nalgebra() {
        let eye = Vector3::new(1.0, 2.0, 5.0);
        let target = Vector3::new(0.0, 0.5, 0.0);
        let view = TransformFactory::look_at_rh(eye, target, Vector3::UP).unwrap();
        let reference = nalgebra::Matrix4::<f32>::look_at_rh(
            &nalgebra::Point3::new(1.0, 2.0, 5.0),
            &nalgebra::Point3::new(0.0, 0.5, 0.0),
            &nalgebra::Vector3::y(),
        );
        assert!(view.approx_eq(&Matrix4x4::from(reference), 1e-5));

        let proj = TransformFactory::perspective(1.5, 60.0, 0.1, 100.0);
        let reference = nalgebra::Matrix4::<f32>::new_perspective(1.5, 60f32.to_radians(), 0.1, 100.0);
        assert!(proj.approx_eq(&Matrix4x4::from(reference), 1e-4));

        let ortho = TransformFactory::orthographic(-2.0, 2.0, -1.0, 1.0, 0.1, 10.0);
        let reference = nalgebra::Matrix4::<f32>::new_orthographic(-2.0, 2.0, -1.0, 1.0, 0.1, 10.0);
        assert!(ortho.approx_eq(&Matrix4x4::from(reference), 1e-5));
    }
}
