//! # soft_rasterizer
//!
//! 纯 CPU 的软件光栅化管线：顶点着色、透视除法与视口映射、
//! 扫描缓冲区三角形光栅化、像素着色，以及 Cohen–Sutherland 线段裁剪与绘制。

pub mod core;
pub mod geometry;
pub mod io;
pub mod material_system;
pub mod math;
pub mod scene;
pub mod utils;

pub use crate::core::error::RenderError;
pub use crate::core::frame_buffer::{BufferMode, ColorBuffer};
pub use crate::core::render_context::{DrawStats, RenderContext};
pub use crate::core::vertex::{AttributeLayout, VertexAttributes};
pub use crate::material_system::{Color, PixelShader, VertexShader};
