use crate::core::error::RenderError;
use crate::geometry::transform::Transform;
use crate::material_system::color::{Color, get_face_color};
use crate::math::Vector3;
use log::debug;

/// 场景中的一个带顶点颜色的三角形网格
///
/// 位置保存在模型空间；生成顶点缓冲区时乘上 `transform` 的世界矩阵，
/// 世界坐标缓存到变换再次被修改为止。
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// 对象名称
    pub name: Option<String>,
    /// 对象在世界空间中的变换
    pub transform: Transform,
    positions: Vec<Vector3>,
    colors: Vec<Color>,
    indices: Vec<u32>,
    world_positions: Vec<Vector3>,
}

impl SceneObject {
    /// 每个顶点一个颜色，索引每 3 个构成一个三角形
    pub fn new(
        positions: Vec<Vector3>,
        colors: Vec<Color>,
        indices: Vec<u32>,
    ) -> Result<Self, RenderError> {
        if colors.len() != positions.len() {
            return Err(RenderError::AttributeMismatch {
                expected: positions.len(),
                actual: colors.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(RenderError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(RenderError::IndexOutOfRange {
                index: index as usize,
                vertex_count: positions.len(),
            });
        }

        Ok(Self {
            name: None,
            transform: Transform::default(),
            positions,
            colors,
            indices,
            world_positions: Vec::new(),
        })
    }

    /// 没有顶点颜色时按面着色：每个面展开为独立的三个顶点
    pub fn with_face_colors(
        positions: &[Vector3],
        indices: &[u32],
        colorize: bool,
    ) -> Result<Self, RenderError> {
        if indices.len() % 3 != 0 {
            return Err(RenderError::IndexCount(indices.len()));
        }

        let mut face_positions = Vec::with_capacity(indices.len());
        let mut face_colors = Vec::with_capacity(indices.len());
        for (face, tri) in indices.chunks_exact(3).enumerate() {
            let color = get_face_color(face, colorize);
            for &i in tri {
                let p = positions
                    .get(i as usize)
                    .ok_or(RenderError::IndexOutOfRange {
                        index: i as usize,
                        vertex_count: positions.len(),
                    })?;
                face_positions.push(*p);
                face_colors.push(color);
            }
        }

        let face_indices = (0..face_positions.len() as u32).collect();
        Self::new(face_positions, face_colors, face_indices)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn positions(&self) -> &[Vector3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 世界空间顶点位置；变换未修改时直接返回缓存
    pub fn world_positions(&mut self) -> &[Vector3] {
        if self.transform.is_dirty() || self.world_positions.len() != self.positions.len() {
            let matrix = *self.transform.local_to_world_matrix();
            self.world_positions = self
                .positions
                .iter()
                .map(|&p| matrix.transform_point(p))
                .collect();
            debug!(
                "重新计算对象 {} 的世界坐标 ({} 个顶点)",
                self.name.as_deref().unwrap_or("<未命名>"),
                self.positions.len()
            );
        }
        &self.world_positions
    }

    /// 以 `[x, y, z, 1, r, g, b, a]` 布局追加世界空间顶点数据
    pub fn append_vertex_data(&mut self, out: &mut Vec<f32>) {
        self.world_positions();
        for (p, c) in self.world_positions.iter().zip(&self.colors) {
            out.extend_from_slice(&[p.x, p.y, p.z, 1.0, c.r, c.g, c.b, c.a]);
        }
    }

    /// 世界空间的扁平顶点缓冲区
    pub fn vertex_buffer(&mut self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.positions.len() * 8);
        self.append_vertex_data(&mut out);
        out
    }
}
