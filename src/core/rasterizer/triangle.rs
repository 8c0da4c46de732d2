use crate::core::error::RenderError;
use crate::core::rasterizer::line::ClipRect;
use crate::core::vertex::{POSITION_COMPONENTS, VertexAttributes};
use crate::material_system::color::Color;
use crate::material_system::shader::PixelShader;

/// 屏幕坐标取整前的容差，吸收视口映射带来的浮点误差（如 9.9999994 → 10）
pub const SNAP_EPSILON: f32 = 1e-3;

/// 着色后的像素
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedPixel {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// 三角形的生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleStage {
    Unrasterized,
    Rasterized,
    Shaded,
}

/// 单个属性在屏幕空间中的常量梯度 (∂/∂x, ∂/∂y)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gradient {
    pub dx: f32,
    pub dy: f32,
}

/// 扫描线的左右两个端点；某一侧未被任何边覆盖时为 None
type ScanLine = [Option<VertexAttributes>; 2];

/// 已完成屏幕映射的三角形，负责扫描缓冲区构建与像素着色
#[derive(Debug, Clone)]
pub struct Triangle {
    vertices: [VertexAttributes; 3],
    gradients: Vec<Gradient>,
    /// 第一条扫描线的 y
    min_y: i32,
    scan_buffer: Vec<ScanLine>,
    /// 扫描行与像素跨度都裁剪到该矩形内
    viewport: ClipRect,
    pixels: Vec<ShadedPixel>,
    stage: TriangleStage,
}

fn snap(value: f32) -> f32 {
    (value + SNAP_EPSILON).floor()
}

impl Triangle {
    /// 三个顶点必须具有相同的属性个数，且至少包含 4 分量位置
    pub fn new(
        v1: VertexAttributes,
        v2: VertexAttributes,
        v3: VertexAttributes,
    ) -> Result<Self, RenderError> {
        let expected = v1.len();
        if expected < POSITION_COMPONENTS {
            return Err(RenderError::AttributeMismatch {
                expected: POSITION_COMPONENTS,
                actual: expected,
            });
        }
        for v in [&v2, &v3] {
            if v.len() != expected {
                return Err(RenderError::AttributeMismatch {
                    expected,
                    actual: v.len(),
                });
            }
        }

        Ok(Self {
            vertices: [v1, v2, v3],
            gradients: Vec::new(),
            min_y: 0,
            scan_buffer: Vec::new(),
            viewport: ClipRect::viewport(0, 0),
            pixels: Vec::new(),
            stage: TriangleStage::Unrasterized,
        })
    }

    pub fn stage(&self) -> TriangleStage {
        self.stage
    }

    /// 光栅化后按 y 升序排列
    pub fn vertices(&self) -> &[VertexAttributes; 3] {
        &self.vertices
    }

    pub fn gradients(&self) -> &[Gradient] {
        &self.gradients
    }

    pub fn pixels(&self) -> &[ShadedPixel] {
        &self.pixels
    }

    pub fn take_pixels(&mut self) -> Vec<ShadedPixel> {
        std::mem::take(&mut self.pixels)
    }

    /// 扫描线个数
    pub fn scanline_count(&self) -> usize {
        self.scan_buffer.len()
    }

    /// 顶点取整、按 y 排序、计算属性梯度并填充扫描缓冲区
    ///
    /// 梯度按完整三角形计算，扫描行只保留落在 `viewport` 内的部分。
    /// 屏幕坐标非有限值的三角形得到空的扫描缓冲区。
    pub fn rasterize(&mut self, viewport: ClipRect) {
        self.viewport = viewport;
        self.pixels.clear();
        self.scan_buffer.clear();
        self.stage = TriangleStage::Rasterized;

        if self
            .vertices
            .iter()
            .any(|v| !v[0].is_finite() || !v[1].is_finite())
        {
            self.gradients.clear();
            return;
        }

        for v in self.vertices.iter_mut() {
            v[0] = snap(v[0]);
            v[1] = snap(v[1]);
        }
        self.vertices.sort_by(|a, b| a[1].total_cmp(&b[1]));

        let [v1, v2, v3] = &self.vertices;
        let (x1, y1) = (v1[0], v1[1]);
        let (x2, y2) = (v2[0], v2[1]);
        let (x3, y3) = (v3[0], v3[1]);

        let top = y1.max(viewport.min_y as f32);
        let bottom = y3.min(viewport.max_y as f32);
        if bottom < top {
            return;
        }
        self.min_y = top as i32;
        let rows = (bottom - top) as usize + 1;
        self.scan_buffer = vec![[None, None]; rows];

        let denom = (x2 - x3) * (y1 - y3) - (x1 - x3) * (y2 - y3);
        if denom == 0.0 && y1 == y3 {
            self.rasterize_flat();
            return;
        }

        self.gradients = if denom == 0.0 {
            // 共线但非水平：只保留沿 y 的梯度
            let dy = y3 - y1;
            (0..v1.len())
                .map(|k| Gradient {
                    dx: 0.0,
                    dy: (v3[k] - v1[k]) / dy,
                })
                .collect()
        } else {
            let inv = 1.0 / denom;
            (0..v1.len())
                .map(|k| {
                    let (a1, a2, a3) = (v1[k], v2[k], v3[k]);
                    Gradient {
                        dx: ((a2 - a3) * (y1 - y3) - (a1 - a3) * (y2 - y3)) * inv,
                        dy: -((a2 - a3) * (x1 - x3) - (a1 - a3) * (x2 - x3)) * inv,
                    }
                })
                .collect()
        };

        // (v3 - v1) × (v2 - v1) 的符号决定长边落在哪一侧
        let cross = (x3 - x1) * (y2 - y1) - (y3 - y1) * (x2 - x1);
        let handedness = if cross < 0.0 { 0 } else { 1 };

        self.walk_edge(0, 2, handedness);
        self.walk_edge(0, 1, 1 - handedness);
        self.walk_edge(1, 2, 1 - handedness);
    }

    /// 三个顶点在同一扫描线上：按 x 排序后只填一行
    fn rasterize_flat(&mut self) {
        self.vertices.sort_by(|a, b| a[0].total_cmp(&b[0]));
        let [v1, _, v3] = &self.vertices;
        let span = v3[0] - v1[0];

        self.gradients = (0..v1.len())
            .map(|k| Gradient {
                dx: if span == 0.0 {
                    0.0
                } else {
                    (v3[k] - v1[k]) / span
                },
                dy: 0.0,
            })
            .collect();

        self.scan_buffer[0] = [Some(v1.clone()), Some(v3.clone())];
    }

    /// 沿一条边逐行步进，把端点属性写入扫描缓冲区的 `side` 槽
    ///
    /// 只访问扫描缓冲区覆盖的行；已有的槽位原地覆写。
    fn walk_edge(&mut self, from: usize, to: usize, side: usize) {
        let Self {
            vertices,
            gradients,
            min_y,
            scan_buffer,
            ..
        } = self;
        let lo = &vertices[from];
        let hi = &vertices[to];
        let len_y = hi[1] - lo[1];
        if len_y == 0.0 || scan_buffer.is_empty() {
            return;
        }

        let slope = (hi[0] - lo[0]) / len_y;
        let last_row = *min_y as f32 + (scan_buffer.len() - 1) as f32;
        let first = lo[1].max(*min_y as f32);
        let last = hi[1].min(last_row);
        if last < first {
            return;
        }

        for y in first as i32..=last as i32 {
            let fi = y as f32 - lo[1];
            let slot = &mut scan_buffer[(y - *min_y) as usize][side];
            let target = slot.get_or_insert_with(|| VertexAttributes::new(vec![0.0; lo.len()]));
            let values = target.values_mut().iter_mut().zip(lo.values());
            for ((dst, a), g) in values.zip(gradients.iter()) {
                *dst = a + (g.dy + g.dx * slope) * fi;
            }
            target[0] = (lo[0] + slope * fi).floor();
            target[1] = y as f32;
        }
    }

    /// 逐扫描线插值属性并调用像素着色器，跨度裁剪到视口的 x 范围
    pub fn pixel_shading(&mut self, shader: &dyn PixelShader) -> Result<(), RenderError> {
        if self.stage == TriangleStage::Unrasterized {
            return Err(RenderError::NotRasterized);
        }

        let mut pixels = Vec::new();
        for line in &self.scan_buffer {
            let [Some(left), Some(right)] = line else {
                continue;
            };
            let (left, right) = if right[0] < left[0] {
                (right, left)
            } else {
                (left, right)
            };

            let y = left[1] as i32;
            let (left_x, right_x) = (left[0], right[0]);
            let span = right_x - left_x;
            let first = left_x.max(self.viewport.min_x as f32);
            let last = right_x.min(self.viewport.max_x as f32);
            if last < first {
                continue;
            }

            // t 相对完整跨度计算，裁剪不改变插值结果
            for x in first as i32..=last as i32 {
                let t = if span == 0.0 { 0.0 } else { (x as f32 - left_x) / span };
                let mut attributes = left.lerp(right, t);
                attributes[0] = x as f32;
                attributes[1] = y as f32;
                let color = shader.main(&attributes);
                pixels.push(ShadedPixel { x, y, color });
            }
        }

        self.pixels = pixels;
        self.stage = TriangleStage::Shaded;
        Ok(())
    }
}
