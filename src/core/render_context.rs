use crate::core::buffer_store::{BufferHandle, BufferStore};
use crate::core::error::RenderError;
use crate::core::frame_buffer::{BufferMode, ColorBuffer};
use crate::core::geometry_processor::GeometryProcessor;
use crate::core::parallel_rasterizer::ParallelRasterizer;
use crate::core::rasterizer::line::{ClipRect, Line2d, clip_line, rasterize_line};
use crate::core::rasterizer::triangle::Triangle;
use crate::core::rasterizer::triangle2d::Triangle2d;
use crate::core::vertex::AttributeLayout;
use crate::material_system::color::Color;
use crate::material_system::shader::{
    AttributeColorPixelShader, PassthroughVertexShader, PixelShader, VertexShader,
};
use log::{debug, warn};
use std::time::Instant;

/// 一次绘制调用的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    pub triangles: usize,
    pub pixels: usize,
}

/// 渲染管线的编排者：持有颜色缓冲区与着色器绑定
///
/// 新建时绑定透传顶点着色器和读取颜色属性的像素着色器。
pub struct RenderContext {
    color_buffer: ColorBuffer,
    vertex_shader: Option<Box<dyn VertexShader>>,
    pixel_shader: Option<Box<dyn PixelShader>>,
    use_multithreading: bool,
}

impl RenderContext {
    pub fn new(width: usize, height: usize, mode: BufferMode) -> Self {
        Self {
            color_buffer: ColorBuffer::new(width, height, mode),
            vertex_shader: Some(Box::new(PassthroughVertexShader)),
            pixel_shader: Some(Box::new(AttributeColorPixelShader::default())),
            use_multithreading: false,
        }
    }

    pub fn width(&self) -> usize {
        self.color_buffer.width()
    }

    pub fn height(&self) -> usize {
        self.color_buffer.height()
    }

    pub fn color_buffer(&self) -> &ColorBuffer {
        &self.color_buffer
    }

    pub fn set_multithreading(&mut self, enabled: bool) {
        self.use_multithreading = enabled;
    }

    pub fn use_multithreading(&self) -> bool {
        self.use_multithreading
    }

    pub fn bind_vertex_shader(&mut self, shader: impl VertexShader + 'static) {
        self.vertex_shader = Some(Box::new(shader));
    }

    pub fn bind_pixel_shader(&mut self, shader: impl PixelShader + 'static) {
        self.pixel_shader = Some(Box::new(shader));
    }

    /// 解除绑定，返回原来的着色器
    pub fn unbind_vertex_shader(&mut self) -> Option<Box<dyn VertexShader>> {
        self.vertex_shader.take()
    }

    pub fn unbind_pixel_shader(&mut self) -> Option<Box<dyn PixelShader>> {
        self.pixel_shader.take()
    }

    /// 用当前绑定的着色器绘制索引三角形
    pub fn draw(
        &mut self,
        vertex_buffer: &[f32],
        index_buffer: &[u32],
        layout: &AttributeLayout,
    ) -> Result<DrawStats, RenderError> {
        let Some(vertex_shader) = self.vertex_shader.as_deref() else {
            warn!("绘制调用被忽略: 未绑定顶点着色器");
            return Err(RenderError::MissingVertexShader);
        };
        let Some(pixel_shader) = self.pixel_shader.as_deref() else {
            warn!("绘制调用被忽略: 未绑定像素着色器");
            return Err(RenderError::MissingPixelShader);
        };

        execute_draw(
            &mut self.color_buffer,
            self.use_multithreading,
            vertex_buffer,
            index_buffer,
            layout,
            vertex_shader,
            pixel_shader,
        )
    }

    /// 用显式给出的着色器绘制，不改变当前绑定
    pub fn draw_with(
        &mut self,
        vertex_buffer: &[f32],
        index_buffer: &[u32],
        layout: &AttributeLayout,
        vertex_shader: &dyn VertexShader,
        pixel_shader: &dyn PixelShader,
    ) -> Result<DrawStats, RenderError> {
        execute_draw(
            &mut self.color_buffer,
            self.use_multithreading,
            vertex_buffer,
            index_buffer,
            layout,
            vertex_shader,
            pixel_shader,
        )
    }

    /// 从缓冲区仓库按句柄读取顶点与索引后绘制
    pub fn draw_buffers(
        &mut self,
        store: &BufferStore,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
        layout: &AttributeLayout,
    ) -> Result<DrawStats, RenderError> {
        let vertices = store.vertex_data(vertex_buffer)?;
        let indices = store.index_data(index_buffer)?;
        self.draw(vertices, indices, layout)
    }

    /// 裁剪到视口后画线，端点颜色线性插值；完全在视口外时返回 false
    pub fn draw_line(&mut self, line: Line2d, color1: Color, color2: Color) -> bool {
        let rect = ClipRect::viewport(self.width(), self.height());
        let Some(clipped) = clip_line(line, &rect) else {
            debug!("线段 {} 完全位于视口之外，已丢弃", line);
            return false;
        };

        let buffer = &mut self.color_buffer;
        rasterize_line(clipped, color1, color2, |x, y, color| {
            buffer.draw_pixel(x, y, color);
        });
        true
    }

    /// 写入单个像素；越界或颜色无效时返回 false
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Color) -> bool {
        self.color_buffer.draw_pixel(x, y, color)
    }

    /// 立即模式填充二维三角形，逐行调用 `draw_line`
    pub fn draw_triangle_2d(&mut self, triangle: &Triangle2d) {
        triangle.scanlines(|line, c1, c2| {
            self.draw_line(line, c1, c2);
        });
    }

    /// 清空当前写入的缓冲区
    pub fn clear(&mut self, color: Color) {
        self.color_buffer.clear(color);
    }
}

/// 校验、几何阶段、光栅化与合并；任何结构错误都在写缓冲区之前返回
fn execute_draw(
    color_buffer: &mut ColorBuffer,
    use_multithreading: bool,
    vertex_buffer: &[f32],
    index_buffer: &[u32],
    layout: &AttributeLayout,
    vertex_shader: &dyn VertexShader,
    pixel_shader: &dyn PixelShader,
) -> Result<DrawStats, RenderError> {
    let start_time = Instant::now();

    if index_buffer.len() % 3 != 0 {
        return Err(RenderError::IndexCount(index_buffer.len()));
    }
    let vertices = layout.split_vertices(vertex_buffer)?;
    if let Some(&index) = index_buffer
        .iter()
        .find(|&&index| index as usize >= vertices.len())
    {
        return Err(RenderError::IndexOutOfRange {
            index: index as usize,
            vertex_count: vertices.len(),
        });
    }

    let (width, height) = (color_buffer.width(), color_buffer.height());
    let screen_vertices = GeometryProcessor::process(
        &vertices,
        vertex_shader,
        layout.stride(),
        width,
        height,
        use_multithreading,
    )?;

    let mut triangles = index_buffer
        .chunks_exact(3)
        .map(|tri| {
            Triangle::new(
                screen_vertices[tri[0] as usize].clone(),
                screen_vertices[tri[1] as usize].clone(),
                screen_vertices[tri[2] as usize].clone(),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    ParallelRasterizer::rasterize_triangles(
        &mut triangles,
        pixel_shader,
        width,
        height,
        use_multithreading,
    )?;

    let pixels = ParallelRasterizer::merge(&mut triangles, color_buffer);
    color_buffer.swap();

    let stats = DrawStats {
        triangles: triangles.len(),
        pixels,
    };
    debug!(
        "绘制完成: {} 个三角形, {} 个像素, 耗时 {:?}",
        stats.triangles,
        stats.pixels,
        start_time.elapsed()
    );
    Ok(stats)
}
