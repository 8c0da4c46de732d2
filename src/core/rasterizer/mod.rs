//! # 光栅化模块
//!
//! 扫描缓冲区三角形光栅化、Cohen–Sutherland 线段裁剪与绘制、立即模式二维三角形填充

pub mod line;
pub mod triangle;
pub mod triangle2d;

pub use line::{ClipRect, Line2d, clip_line, rasterize_line};
pub use triangle::{Gradient, ShadedPixel, Triangle, TriangleStage};
pub use triangle2d::Triangle2d;
