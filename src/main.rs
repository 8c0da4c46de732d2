use anyhow::{Context, Result, anyhow};
use log::info;
use soft_rasterizer::core::render_context::RenderContext;
use soft_rasterizer::io::simple_cli::SimpleCli;
use soft_rasterizer::scene::Scene;
use soft_rasterizer::utils::save_utils::save_render_with_settings;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let settings = SimpleCli::process().map_err(|e| anyhow!(e))?;
    info!(
        "视口 {}x{}, 投影 {}, {} 个对象, {} 条线段",
        settings.width,
        settings.height,
        settings.projection,
        settings.objects.len(),
        settings.lines.len()
    );

    let mut scene = Scene::from_settings(&settings)
        .map_err(|e| anyhow!(e))
        .context("构建场景失败")?;

    let mut ctx = RenderContext::new(settings.width, settings.height, settings.buffer_mode());
    ctx.set_multithreading(settings.use_multithreading);

    let start_time = Instant::now();
    let stats = scene.render(&mut ctx).context("渲染失败")?;
    info!(
        "渲染完成: {} 个三角形, {} 个像素, 耗时 {:?}",
        stats.triangles,
        stats.pixels,
        start_time.elapsed()
    );

    save_render_with_settings(&ctx, &settings)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("保存 {} 失败", settings.output_path().display()))?;

    Ok(())
}
