use crate::core::error::RenderError;
use crate::math::Vector4;
use std::ops::{Index, IndexMut};

/// 位置属性固定占用前 4 个分量 (x, y, z, w)
pub const POSITION_COMPONENTS: usize = 4;

/// 顶点属性布局：每个属性的分量个数，例如 `[4, 4]` 表示位置 + RGBA 颜色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLayout {
    components: Vec<usize>,
    offsets: Vec<usize>,
    stride: usize,
}

impl AttributeLayout {
    /// 首个属性必须是 4 分量位置，且任何属性都不能为 0 分量
    pub fn new(components: &[usize]) -> Result<Self, RenderError> {
        match components.first() {
            None => {
                return Err(RenderError::InvalidLayout("布局为空".to_string()));
            }
            Some(&n) if n != POSITION_COMPONENTS => {
                return Err(RenderError::InvalidLayout(format!(
                    "位置属性需要 {} 个分量，实际为 {}",
                    POSITION_COMPONENTS, n
                )));
            }
            _ => {}
        }
        if let Some(i) = components.iter().position(|&n| n == 0) {
            return Err(RenderError::InvalidLayout(format!(
                "第 {} 个属性分量数为 0",
                i
            )));
        }

        let mut offsets = Vec::with_capacity(components.len());
        let mut stride = 0;
        for &n in components {
            offsets.push(stride);
            stride += n;
        }

        Ok(Self {
            components: components.to_vec(),
            offsets,
            stride,
        })
    }

    /// 位置 + RGBA 颜色，最常见的布局
    pub fn position_color() -> Self {
        Self {
            components: vec![4, 4],
            offsets: vec![0, 4],
            stride: 8,
        }
    }

    /// 每个顶点占用的标量个数
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn attribute_count(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[usize] {
        &self.components
    }

    pub fn offset(&self, attribute: usize) -> Option<usize> {
        self.offsets.get(attribute).copied()
    }

    /// 把扁平顶点缓冲区切分为逐顶点属性
    pub fn split_vertices(&self, vertex_buffer: &[f32]) -> Result<Vec<VertexAttributes>, RenderError> {
        if vertex_buffer.len() % self.stride != 0 {
            return Err(RenderError::VertexBufferLength {
                len: vertex_buffer.len(),
                stride: self.stride,
            });
        }
        Ok(vertex_buffer
            .chunks_exact(self.stride)
            .map(VertexAttributes::from_slice)
            .collect())
    }
}

/// 单个顶点（或像素）的扁平属性包，约定为 `[x, y, z, w, attr0, attr1, ...]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexAttributes {
    values: Vec<f32>,
}

impl VertexAttributes {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn from_slice(values: &[f32]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }

    /// 位置与额外属性拼接
    pub fn with_position(position: Vector4, extra: &[f32]) -> Self {
        let mut values = Vec::with_capacity(POSITION_COMPONENTS + extra.len());
        values.extend_from_slice(&position.to_array());
        values.extend_from_slice(extra);
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// 按布局取第 `attribute` 个属性的分量切片
    pub fn attribute(&self, layout: &AttributeLayout, attribute: usize) -> Option<&[f32]> {
        let offset = layout.offset(attribute)?;
        let n = layout.components().get(attribute).copied()?;
        self.values.get(offset..offset + n)
    }

    /// 前 4 个分量；不足时缺失分量补 0
    pub fn position(&self) -> Vector4 {
        let mut p = [0.0; POSITION_COMPONENTS];
        for (dst, src) in p.iter_mut().zip(self.values.iter()) {
            *dst = *src;
        }
        Vector4::from(p)
    }

    pub fn set_position(&mut self, position: Vector4) {
        if self.values.len() < POSITION_COMPONENTS {
            self.values.resize(POSITION_COMPONENTS, 0.0);
        }
        self.values[..POSITION_COMPONENTS].copy_from_slice(&position.to_array());
    }

    pub fn x(&self) -> f32 {
        self.values.first().copied().unwrap_or(0.0)
    }

    pub fn y(&self) -> f32 {
        self.values.get(1).copied().unwrap_or(0.0)
    }

    /// 逐分量线性插值，两者长度须一致
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(a, b)| a + (b - a) * t)
                .collect(),
        }
    }
}

impl Index<usize> for VertexAttributes {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.values[index]
    }
}

impl IndexMut<usize> for VertexAttributes {
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.values[index]
    }
}

impl From<Vec<f32>> for VertexAttributes {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_and_stride() {
        let layout = AttributeLayout::new(&[4, 4, 2]).unwrap();
        assert_eq!(layout.stride(), 10);
        assert_eq!(layout.offset(1), Some(4));
        assert_eq!(layout.offset(2), Some(8));
        assert_eq!(layout.offset(3), None);
        assert_eq!(AttributeLayout::new(&[4, 4]).unwrap(), AttributeLayout::position_color());
    }

    #[test]
    fn layout_rejects_malformed_descriptors() {
        assert!(matches!(AttributeLayout::new(&[]), Err(RenderError::InvalidLayout(_))));
        assert!(matches!(AttributeLayout::new(&[3, 4]), Err(RenderError::InvalidLayout(_))));
        assert!(matches!(AttributeLayout::new(&[4, 0]), Err(RenderError::InvalidLayout(_))));
    }

    #[test]
    fn split_requires_whole_vertices() {
        let layout = AttributeLayout::position_color();
        let vertices = layout.split_vertices(&[0.0; 16]).unwrap();
        assert_eq!(vertices.len(), 2);
        assert_eq!(
            layout.split_vertices(&[0.0; 12]),
            Err(RenderError::VertexBufferLength { len: 12, stride: 8 })
        );
    }

    #[test]
    fn attribute_slicing_and_position() {
        let layout = AttributeLayout::position_color();
        let v = VertexAttributes::with_position(
            Vector4::new(1.0, 2.0, 3.0, 1.0),
            &[0.1, 0.2, 0.3, 0.4],
        );
        assert_eq!(v.attribute(&layout, 1), Some(&[0.1, 0.2, 0.3, 0.4][..]));
        assert_eq!(v.position(), Vector4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(v[5], 0.2);

        let mut short = VertexAttributes::new(vec![5.0]);
        assert_eq!(short.position(), Vector4::new(5.0, 0.0, 0.0, 0.0));
        short.set_position(Vector4::ONE);
        assert_eq!(short.len(), 4);
    }

    #[test]
    fn lerp_interpolates_every_component() {
        let a = VertexAttributes::new(vec![0.0, 10.0, 1.0]);
        let b = VertexAttributes::new(vec![10.0, 20.0, 0.0]);
        assert_eq!(a.lerp(&b, 0.5).values(), &[5.0, 15.0, 0.5]);
    }
}
