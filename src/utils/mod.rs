// utils/mod.rs
// 导出工具函数相关模块
pub mod save_utils;
