// geometry/mod.rs
// 导出几何变换相关模块
pub mod transform;
