use crate::core::frame_buffer::ColorBuffer;
use crate::core::render_context::RenderContext;
use crate::io::render_settings::RenderSettings;
use image::ColorType;
use log::info;
use std::path::Path;

/// 保存 RGBA 图像数据到 PNG 文件，必要时创建父目录
///
/// # 参数
/// * `path` - 输出文件路径
/// * `data` - RGBA 数据，逐行排列，最上面一行在前
/// * `width` - 图像宽度（像素列数）
/// * `height` - 图像高度（像素行数）
pub fn save_image(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("创建输出目录 {} 失败: {}", parent.display(), e))?;
    }
    image::save_buffer(path, data, width, height, ColorType::Rgba8)
        .map_err(|e| format!("保存图像到 {} 时出错: {}", path.display(), e))?;
    info!("图像已保存到 {}", path.display());
    Ok(())
}

/// 导出颜色缓冲区中已完成的一帧
///
/// 图像尺寸为 (width+1)×(height+1)，包含右/上边界像素。
pub fn save_color_buffer(buffer: &ColorBuffer, path: &Path) -> Result<(), String> {
    save_image(
        path,
        &buffer.to_rgba8(),
        buffer.row_len() as u32,
        buffer.row_count() as u32,
    )
}

/// 按渲染设置中的输出路径保存渲染结果
pub fn save_render_with_settings(
    ctx: &RenderContext,
    settings: &RenderSettings,
) -> Result<(), String> {
    save_color_buffer(ctx.color_buffer(), &settings.output_path())
}
