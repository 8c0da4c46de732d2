use super::line::Line2d;
use crate::material_system::color::Color;
use crate::math::Vector2;
use std::fmt;

/// 立即模式的二维三角形，每个顶点带一个颜色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle2d {
    pub v1: Vector2,
    pub v2: Vector2,
    pub v3: Vector2,
    pub c1: Color,
    pub c2: Color,
    pub c3: Color,
}

impl Triangle2d {
    pub fn new(v1: Vector2, v2: Vector2, v3: Vector2, c1: Color, c2: Color, c3: Color) -> Self {
        Self {
            v1,
            v2,
            v3,
            c1,
            c2,
            c3,
        }
    }

    /// 单色三角形
    pub fn solid(v1: Vector2, v2: Vector2, v3: Vector2, color: Color) -> Self {
        Self::new(v1, v2, v3, color, color, color)
    }

    /// 重心坐标；退化三角形返回 None
    pub fn barycentric(&self, p: Vector2) -> Option<(f32, f32, f32)> {
        let (a, b, c) = (self.v1, self.v2, self.v3);
        let t = (a.y - c.y) * (b.x - c.x) + (b.y - c.y) * (c.x - a.x);
        if t == 0.0 {
            return None;
        }
        let b1 = ((p.y - c.y) * (b.x - c.x) + (b.y - c.y) * (c.x - p.x)) / t;
        let b2 = ((p.y - a.y) * (c.x - a.x) + (c.y - a.y) * (a.x - p.x)) / t;
        let b3 = ((p.y - b.y) * (a.x - b.x) + (a.y - b.y) * (b.x - p.x)) / t;
        Some((b1, b2, b3))
    }

    /// 按重心坐标混合三个顶点颜色
    pub fn pixel_color(&self, p: Vector2) -> Option<Color> {
        self.barycentric(p)
            .map(|(b1, b2, b3)| self.c1 * b1 + self.c2 * b2 + self.c3 * b3)
    }

    /// 顶点（及其颜色）按 y 升序
    pub fn sorted_by_y(&self) -> [(Vector2, Color); 3] {
        let mut v = [(self.v1, self.c1), (self.v2, self.c2), (self.v3, self.c3)];
        v.sort_by(|a, b| a.0.y.total_cmp(&b.0.y));
        v
    }

    /// 平顶/平底拆分后逐行输出水平线段及其两端颜色
    pub fn scanlines<F>(&self, mut span: F)
    where
        F: FnMut(Line2d, Color, Color),
    {
        let [(v1, c1), (v2, c2), (v3, c3)] = self.sorted_by_y();
        let (v1, v2, v3) = (v1.rasterized(), v2.rasterized(), v3.rasterized());

        if v1.y == v3.y {
            // 三点共水平线，退化为一条线段
            let mut row = [(v1, c1), (v2, c2), (v3, c3)];
            row.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
            let (left, right) = (row[0], row[2]);
            span(
                Line2d::new(left.0.x as i32, left.0.y as i32, right.0.x as i32, right.0.y as i32),
                left.1,
                right.1,
            );
            return;
        }

        if v2.y == v3.y {
            fill_flat((v1, c1), (v2, c2), (v3, c3), &mut span);
        } else if v1.y == v2.y {
            fill_flat((v3, c3), (v1, c1), (v2, c2), &mut span);
        } else {
            let x4 = (v1.x + (v2.y - v1.y) * (v3.x - v1.x) / (v3.y - v1.y)).floor();
            let v4 = Vector2::new(x4, v2.y);
            let c4 = Triangle2d::new(v1, v2, v3, c1, c2, c3)
                .pixel_color(v4)
                .unwrap_or(c2);
            fill_flat((v1, c1), (v2, c2), (v4, c4), &mut span);
            // 分割行已由上半部分画过
            fill_flat_excluding_base((v3, c3), (v2, c2), (v4, c4), &mut span);
        }
    }
}

/// 从顶点 `apex` 逐行走到水平边 `a`-`b`（含两端）
fn fill_flat<F>(apex: (Vector2, Color), a: (Vector2, Color), b: (Vector2, Color), span: &mut F)
where
    F: FnMut(Line2d, Color, Color),
{
    walk_flat(apex, a, b, true, span);
}

fn fill_flat_excluding_base<F>(
    apex: (Vector2, Color),
    a: (Vector2, Color),
    b: (Vector2, Color),
    span: &mut F,
) where
    F: FnMut(Line2d, Color, Color),
{
    walk_flat(apex, a, b, false, span);
}

fn walk_flat<F>(
    apex: (Vector2, Color),
    a: (Vector2, Color),
    b: (Vector2, Color),
    include_base: bool,
    span: &mut F,
) where
    F: FnMut(Line2d, Color, Color),
{
    let (pa, ca) = apex;
    let dy = a.0.y - pa.y;
    let steps = dy.abs() as i32;
    let dir = dy.signum() as i32;
    let last = if include_base { steps } else { steps - 1 };

    for k in 0..=last {
        let t = k as f32 / steps as f32;
        let x1 = pa.x + (a.0.x - pa.x) * t;
        let x2 = pa.x + (b.0.x - pa.x) * t;
        let y = pa.y as i32 + dir * k;
        span(
            Line2d::new(x1.floor() as i32, y, x2.floor() as i32, y),
            ca.lerp(a.1, t),
            ca.lerp(b.1, t),
        );
    }
}

impl fmt::Display for Triangle2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Triangle2d(v1({}, {} | {}), v2({}, {} | {}), v3({}, {} | {}))",
            self.v1.x, self.v1.y, self.c1, self.v2.x, self.v2.y, self.c2, self.v3.x, self.v3.y, self.c3
        )
    }
}
