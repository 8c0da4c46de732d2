use crate::material_system::color::Color;
use std::fmt;

// Cohen–Sutherland 区域码
pub const INSIDE: u8 = 0;
pub const LEFT: u8 = 1;
pub const TOP: u8 = 1 << 1;
pub const RIGHT: u8 = 1 << 2;
pub const BOTTOM: u8 = 1 << 3;

/// 整数端点的二维线段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line2d {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Line2d {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn reversed(self) -> Self {
        Self::new(self.x2, self.y2, self.x1, self.y1)
    }
}

impl fmt::Display for Line2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line2d(start ({}, {}), end ({}, {}))",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

/// 裁剪矩形，边界包含在内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ClipRect {
    /// [0, 0] → [width, height]
    pub fn viewport(width: usize, height: usize) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: width as i32,
            max_y: height as i32,
        }
    }

    pub fn outcode(&self, x: i32, y: i32) -> u8 {
        let mut code = INSIDE;
        if x < self.min_x {
            code |= LEFT;
        } else if x > self.max_x {
            code |= RIGHT;
        }
        if y < self.min_y {
            code |= BOTTOM;
        } else if y > self.max_y {
            code |= TOP;
        }
        code
    }
}

/// Cohen–Sutherland 线段裁剪，完全在外时返回 None
pub fn clip_line(line: Line2d, rect: &ClipRect) -> Option<Line2d> {
    let Line2d {
        mut x1,
        mut y1,
        mut x2,
        mut y2,
    } = line;
    let mut code1 = rect.outcode(x1, y1);
    let mut code2 = rect.outcode(x2, y2);

    loop {
        if code1 | code2 == INSIDE {
            return Some(Line2d::new(x1, y1, x2, y2));
        }
        if code1 & code2 != 0 {
            return None;
        }

        let code = if code1 != INSIDE { code1 } else { code2 };
        let (fx1, fy1, fx2, fy2) = (x1 as f32, y1 as f32, x2 as f32, y2 as f32);
        // 交点截断为整数
        let (x, y) = if code & TOP != 0 {
            let y = rect.max_y as f32;
            (fx1 + (fx2 - fx1) * (y - fy1) / (fy2 - fy1), y)
        } else if code & BOTTOM != 0 {
            let y = rect.min_y as f32;
            (fx1 + (fx2 - fx1) * (y - fy1) / (fy2 - fy1), y)
        } else if code & LEFT != 0 {
            let x = rect.min_x as f32;
            (x, fy1 + (fy2 - fy1) * (x - fx1) / (fx2 - fx1))
        } else {
            let x = rect.max_x as f32;
            (x, fy1 + (fy2 - fy1) * (x - fx1) / (fx2 - fx1))
        };

        if code == code1 {
            x1 = x as i32;
            y1 = y as i32;
            code1 = rect.outcode(x1, y1);
        } else {
            x2 = x as i32;
            y2 = y as i32;
            code2 = rect.outcode(x2, y2);
        }
    }
}

/// 沿主轴做 Bresenham 步进，端点颜色按主轴进度线性插值
///
/// 每个像素通过 `plot` 输出，不做越界检查。
pub fn rasterize_line<F>(line: Line2d, color1: Color, color2: Color, mut plot: F)
where
    F: FnMut(i32, i32, Color),
{
    if line.x1 == line.x2 && line.y1 == line.y2 {
        plot(line.x1, line.y1, color1);
        return;
    }

    let dx = (line.x2 - line.x1).abs();
    let dy = (line.y2 - line.y1).abs();
    let x_major = dx >= dy;

    // 沿主轴正方向行走，端点与颜色一起交换
    let reverse = if x_major { line.x2 < line.x1 } else { line.y2 < line.y1 };
    let (line, c_start, c_end) = if reverse {
        (line.reversed(), color2, color1)
    } else {
        (line, color1, color2)
    };
    let (start, end) = ((line.x1, line.y1), (line.x2, line.y2));

    let (major, minor) = if x_major { (dx, dy) } else { (dy, dx) };
    let minor_step = if x_major {
        (end.1 - start.1).signum()
    } else {
        (end.0 - start.0).signum()
    };
    let span = major as f32;
    let uniform = c_start == c_end;

    let mut rem = 0;
    let mut minor_pos = if x_major { start.1 } else { start.0 };
    let major_start = if x_major { start.0 } else { start.1 };

    for i in 0..=major {
        let color = if uniform {
            c_start
        } else {
            c_start.lerp(c_end, i as f32 / span)
        };
        let major_pos = major_start + i;
        if x_major {
            plot(major_pos, minor_pos, color);
        } else {
            plot(minor_pos, major_pos, color);
        }

        rem += minor;
        if rem >= major {
            rem -= major;
            minor_pos += minor_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(line: Line2d, c1: Color, c2: Color) -> Vec<(i32, i32, Color)> {
        let mut pixels = Vec::new();
        rasterize_line(line, c1, c2, |x, y, c| pixels.push((x, y, c)));
        pixels
    }

    #[test]
    fn inside_segment_is_unchanged() {
        let rect = ClipRect::viewport(100, 100);
        let line = Line2d::new(5, 5, 95, 40);
        assert_eq!(clip_line(line, &rect), Some(line));
        let edge = Line2d::new(0, 0, 100, 100);
        assert_eq!(clip_line(edge, &rect), Some(edge));
    }

    #[test]
    fn outside_segment_is_rejected() {
        let rect = ClipRect::viewport(100, 100);
        assert_eq!(clip_line(Line2d::new(-10, 5, -1, 50), &rect), None);
        assert_eq!(clip_line(Line2d::new(10, 101, 90, 150), &rect), None);
        assert_eq!(clip_line(Line2d::new(120, -5, 140, -20), &rect), None);
    }

    #[test]
    fn crossing_one_edge_clips_that_endpoint() {
        let rect = ClipRect::viewport(100, 100);
        assert_eq!(
            clip_line(Line2d::new(50, 50, 150, 50), &rect),
            Some(Line2d::new(50, 50, 100, 50))
        );
        assert_eq!(
            clip_line(Line2d::new(-50, 0, 50, 100), &rect),
            Some(Line2d::new(0, 50, 50, 100))
        );
        assert_eq!(
            clip_line(Line2d::new(20, 20, 20, -30), &rect),
            Some(Line2d::new(20, 20, 20, 0))
        );
    }

    #[test]
    fn crossing_two_edges_clips_both_ends() {
        let rect = ClipRect::viewport(10, 10);
        assert_eq!(
            clip_line(Line2d::new(-5, 5, 15, 5), &rect),
            Some(Line2d::new(0, 5, 10, 5))
        );
    }

    #[test]
    fn outcodes() {
        let rect = ClipRect::viewport(10, 10);
        assert_eq!(rect.outcode(5, 5), INSIDE);
        assert_eq!(rect.outcode(-1, 11), LEFT | TOP);
        assert_eq!(rect.outcode(11, -1), RIGHT | BOTTOM);
    }

    #[test]
    fn gradient_midpoint_is_gray() {
        let pixels = collect(Line2d::new(0, 0, 10, 0), Color::WHITE, Color::BLACK);
        assert_eq!(pixels.len(), 11);
        let (x, y, mid) = pixels[5];
        assert_eq!((x, y), (5, 0));
        assert_eq!(mid.to_rgba8(), [128, 128, 128, 255]);
        assert_eq!(pixels[0].2, Color::WHITE);
        assert_eq!(pixels[10].2, Color::BLACK);
    }

    #[test]
    fn reversed_line_keeps_endpoint_colors() {
        let pixels = collect(Line2d::new(10, 3, 0, 0), Color::RED, Color::BLUE);
        let at = |px: i32| pixels.iter().find(|(x, _, _)| *x == px).map(|p| (p.1, p.2));
        assert_eq!(at(10), Some((3, Color::RED)));
        assert_eq!(at(0), Some((0, Color::BLUE)));
    }

    #[test]
    fn steep_line_walks_y_and_reaches_endpoint() {
        let pixels = collect(Line2d::new(2, 0, 5, 9), Color::GREEN, Color::GREEN);
        assert_eq!(pixels.len(), 10);
        assert_eq!((pixels[0].0, pixels[0].1), (2, 0));
        assert_eq!((pixels[9].0, pixels[9].1), (5, 9));
        assert!(pixels.windows(2).all(|w| w[1].1 == w[0].1 + 1));
        assert!(pixels.iter().all(|p| p.2 == Color::GREEN));
    }

    #[test]
    fn degenerate_line_is_single_pixel() {
        let pixels = collect(Line2d::new(4, 4, 4, 4), Color::RED, Color::BLUE);
        assert_eq!(pixels, vec![(4, 4, Color::RED)]);
    }
}
