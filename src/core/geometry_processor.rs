use crate::core::error::RenderError;
use crate::core::vertex::VertexAttributes;
use crate::material_system::shader::VertexShader;
use crate::math::{Vector3, Vector4};
use rayon::prelude::*;

/// w 绝对值低于该值时不做透视除法
const W_EPSILON: f32 = 1e-8;

/// 几何处理器：顶点着色、透视除法、屏幕映射
pub struct GeometryProcessor;

impl GeometryProcessor {
    /// 对所有顶点执行几何阶段
    ///
    /// 输出属性包的前 4 个分量为 (screen_x, screen_y, screen_z, clip_w)，
    /// 其余属性为顶点着色器的原样输出。着色器输出长度必须等于 `stride`。
    pub fn process(
        vertices: &[VertexAttributes],
        shader: &dyn VertexShader,
        stride: usize,
        width: usize,
        height: usize,
        parallel: bool,
    ) -> Result<Vec<VertexAttributes>, RenderError> {
        let (w, h) = (width as f32, height as f32);
        let stage = |input: &VertexAttributes| Self::process_vertex(input, shader, stride, w, h);

        if parallel {
            vertices.par_iter().map(stage).collect()
        } else {
            vertices.iter().map(stage).collect()
        }
    }

    fn process_vertex(
        input: &VertexAttributes,
        shader: &dyn VertexShader,
        stride: usize,
        width: f32,
        height: f32,
    ) -> Result<VertexAttributes, RenderError> {
        let mut out = shader.main(input);
        if out.len() != stride {
            return Err(RenderError::AttributeMismatch {
                expected: stride,
                actual: out.len(),
            });
        }

        let clip = out.position();
        let screen = Self::ndc_to_screen(Self::clip_to_ndc(clip), width, height);
        out.set_position(screen.extend(clip.w));
        Ok(out)
    }

    /// 将裁剪空间坐标转换为NDC坐标（透视除法）
    pub fn clip_to_ndc(clip: Vector4) -> Vector3 {
        if clip.w.abs() > W_EPSILON {
            clip.truncate() / clip.w
        } else {
            Vector3::ZERO // 避免除以零
        }
    }

    /// NDC [-1, 1] 映射到像素坐标，y 轴向上，z 原样保留
    pub fn ndc_to_screen(ndc: Vector3, width: f32, height: f32) -> Vector3 {
        Vector3::new(
            (ndc.x + 1.0) * width * 0.5,
            (ndc.y + 1.0) * height * 0.5,
            ndc.z,
        )
    }
}
