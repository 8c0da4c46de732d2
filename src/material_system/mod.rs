// material_system/mod.rs
// 颜色与着色器接口
pub mod color;
pub mod shader;

pub use color::Color;
pub use shader::{PixelShader, VertexShader};
