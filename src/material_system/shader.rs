use crate::core::vertex::VertexAttributes;
use crate::material_system::color::Color;
use crate::math::Matrix4x4;

/// 顶点着色器：输入一个顶点的属性包，输出同布局的属性包
///
/// 输出的前 4 个分量被解释为裁剪空间齐次坐标 (x, y, z, w)。
pub trait VertexShader: Send + Sync {
    fn main(&self, input: &VertexAttributes) -> VertexAttributes;
}

/// 像素着色器：输入插值后的属性包，输出一个颜色
///
/// 输入的前两个分量是像素的整数屏幕坐标。
pub trait PixelShader: Send + Sync {
    fn main(&self, input: &VertexAttributes) -> Color;
}

impl<F> VertexShader for F
where
    F: Fn(&VertexAttributes) -> VertexAttributes + Send + Sync,
{
    fn main(&self, input: &VertexAttributes) -> VertexAttributes {
        self(input)
    }
}

impl<F> PixelShader for F
where
    F: Fn(&VertexAttributes) -> Color + Send + Sync,
{
    fn main(&self, input: &VertexAttributes) -> Color {
        self(input)
    }
}

/// 原样输出，顶点数据已在裁剪空间
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughVertexShader;

impl VertexShader for PassthroughVertexShader {
    fn main(&self, input: &VertexAttributes) -> VertexAttributes {
        input.clone()
    }
}

/// 用模型-视图-投影矩阵变换位置，其余属性透传
#[derive(Debug, Clone, Copy)]
pub struct MvpVertexShader {
    pub mvp: Matrix4x4,
}

impl MvpVertexShader {
    pub fn new(mvp: Matrix4x4) -> Self {
        Self { mvp }
    }
}

impl VertexShader for MvpVertexShader {
    fn main(&self, input: &VertexAttributes) -> VertexAttributes {
        let mut out = input.clone();
        out.set_position(self.mvp * input.position());
        out
    }
}

/// 从指定偏移读取 RGBA 颜色属性
#[derive(Debug, Clone, Copy)]
pub struct AttributeColorPixelShader {
    pub offset: usize,
}

impl Default for AttributeColorPixelShader {
    fn default() -> Self {
        // 紧跟在位置之后
        Self { offset: 4 }
    }
}

impl PixelShader for AttributeColorPixelShader {
    fn main(&self, input: &VertexAttributes) -> Color {
        input
            .values()
            .get(self.offset..)
            .and_then(Color::from_slice)
            // 负分量让缓冲区丢弃该像素
            .unwrap_or(Color::new(-1.0, -1.0, -1.0, -1.0))
    }
}

/// 纯色填充
#[derive(Debug, Clone, Copy)]
pub struct SolidColorPixelShader(pub Color);

impl PixelShader for SolidColorPixelShader {
    fn main(&self, _input: &VertexAttributes) -> Color {
        self.0
    }
}
