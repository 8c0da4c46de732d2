use crate::core::error::RenderError;
use crate::core::frame_buffer::ColorBuffer;
use crate::core::rasterizer::line::ClipRect;
use crate::core::rasterizer::triangle::Triangle;
use crate::material_system::shader::PixelShader;
use rayon::prelude::*;

/// 少于该数量的三角形不值得分发到线程池
const MIN_PARALLEL_TRIANGLES: usize = 2;

/// 光栅化阶段：逐三角形扫描、着色，再按顺序合并到颜色缓冲区
pub struct ParallelRasterizer;

impl ParallelRasterizer {
    /// 光栅化并着色所有三角形
    ///
    /// 完全位于视口之外的三角形被跳过，保持 Unrasterized 状态，合并时不产生像素。
    pub fn rasterize_triangles(
        triangles: &mut [Triangle],
        shader: &dyn PixelShader,
        width: usize,
        height: usize,
        use_multithreading: bool,
    ) -> Result<(), RenderError> {
        if triangles.is_empty() {
            return Ok(());
        }

        let viewport = ClipRect::viewport(width, height);
        let process = |triangle: &mut Triangle| -> Result<(), RenderError> {
            if Self::is_offscreen(triangle, width, height) {
                return Ok(());
            }
            triangle.rasterize(viewport);
            triangle.pixel_shading(shader)
        };

        match Self::choose_strategy(triangles.len(), use_multithreading) {
            RenderStrategy::Serial => triangles.iter_mut().try_for_each(process),
            RenderStrategy::TriangleParallel => triangles.par_iter_mut().try_for_each(process),
        }
    }

    /// 按三角形顺序写入像素，后写覆盖先写；返回实际写入的像素数
    pub fn merge(triangles: &mut [Triangle], buffer: &mut ColorBuffer) -> usize {
        let mut written = 0;
        for triangle in triangles.iter_mut() {
            for pixel in triangle.take_pixels() {
                if buffer.draw_pixel(pixel.x, pixel.y, pixel.color) {
                    written += 1;
                }
            }
        }
        written
    }

    fn choose_strategy(triangle_count: usize, use_multithreading: bool) -> RenderStrategy {
        if use_multithreading && triangle_count >= MIN_PARALLEL_TRIANGLES {
            RenderStrategy::TriangleParallel
        } else {
            RenderStrategy::Serial
        }
    }

    /// 屏幕空间包围盒与 [0, width]×[0, height] 不相交，或坐标不是有限值
    fn is_offscreen(triangle: &Triangle, width: usize, height: usize) -> bool {
        let [v0, v1, v2] = triangle.vertices();
        if [v0, v1, v2]
            .iter()
            .any(|v| !v.x().is_finite() || !v.y().is_finite())
        {
            return true;
        }
        let min_x = v0.x().min(v1.x()).min(v2.x());
        let max_x = v0.x().max(v1.x()).max(v2.x());
        let min_y = v0.y().min(v1.y()).min(v2.y());
        let max_y = v0.y().max(v1.y()).max(v2.y());

        max_x < 0.0 || max_y < 0.0 || min_x > width as f32 + 1.0 || min_y > height as f32 + 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderStrategy {
    Serial,
    TriangleParallel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_buffer::BufferMode;
    use crate::core::rasterizer::triangle::TriangleStage;
    use crate::core::vertex::VertexAttributes;
    use crate::material_system::color::Color;
    use crate::material_system::shader::AttributeColorPixelShader;

    fn vertex(x: f32, y: f32, color: Color) -> VertexAttributes {
        VertexAttributes::new(vec![x, y, 0.0, 1.0, color.r, color.g, color.b, color.a])
    }

    fn triangles() -> Vec<Triangle> {
        let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];
        (0..16)
            .map(|i| {
                let o = (i % 8) as f32 * 4.0;
                let c = colors[i % colors.len()];
                Triangle::new(
                    vertex(o, o, c),
                    vertex(o + 20.0, o + 2.0, c),
                    vertex(o + 5.0, o + 25.0, c),
                )
                .unwrap()
            })
            .collect()
    }

    fn render(parallel: bool) -> Vec<u32> {
        let mut tris = triangles();
        let mut buffer = ColorBuffer::new(64, 64, BufferMode::Single);
        ParallelRasterizer::rasterize_triangles(
            &mut tris,
            &AttributeColorPixelShader::default(),
            64,
            64,
            parallel,
        )
        .unwrap();
        ParallelRasterizer::merge(&mut tris, &mut buffer);
        buffer.front().to_vec()
    }

    #[test]
    fn parallel_matches_serial_draw_order() {
        assert_eq!(render(false), render(true));
    }

    #[test]
    fn offscreen_triangles_are_skipped() {
        let mut tris = vec![
            Triangle::new(
                vertex(-100.0, -100.0, Color::RED),
                vertex(-50.0, -100.0, Color::RED),
                vertex(-50.0, -20.0, Color::RED),
            )
            .unwrap(),
        ];
        ParallelRasterizer::rasterize_triangles(
            &mut tris,
            &AttributeColorPixelShader::default(),
            10,
            10,
            false,
        )
        .unwrap();
        assert_eq!(tris[0].stage(), TriangleStage::Unrasterized);

        let mut buffer = ColorBuffer::new(10, 10, BufferMode::Single);
        assert_eq!(ParallelRasterizer::merge(&mut tris, &mut buffer), 0);
    }

    #[test]
    fn strategy_selection() {
        assert_eq!(
            ParallelRasterizer::choose_strategy(1, true),
            RenderStrategy::Serial
        );
        assert_eq!(
            ParallelRasterizer::choose_strategy(100, false),
            RenderStrategy::Serial
        );
        assert_eq!(
            ParallelRasterizer::choose_strategy(100, true),
            RenderStrategy::TriangleParallel
        );
    }
}
