use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::RenderSettings;
use clap::Parser;
use log::info;
use std::path::Path;

/// 极简CLI：配置文件 + 少量覆盖项
#[derive(Parser, Debug)]
#[command(name = "soft-rasterizer")]
#[command(about = "TOML驱动的软件光栅化渲染器")]
pub struct SimpleCli {
    /// 配置文件路径（TOML格式）
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 使用示例配置（写出到 example_config.toml 后加载）
    #[arg(long)]
    pub use_example_config: bool,

    /// 输出 PNG 路径，覆盖配置中的 [output]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// 覆盖视口宽度
    #[arg(long)]
    pub width: Option<usize>,

    /// 覆盖视口高度
    #[arg(long)]
    pub height: Option<usize>,
}

const EXAMPLE_CONFIG_PATH: &str = "example_config.toml";

impl SimpleCli {
    /// 解析命令行并返回最终的渲染设置
    pub fn process() -> Result<RenderSettings, String> {
        Self::parse().into_settings()
    }

    pub fn into_settings(self) -> Result<RenderSettings, String> {
        let mut settings = if self.use_example_config {
            TomlConfigLoader::create_example_config(EXAMPLE_CONFIG_PATH)?;
            info!("已创建示例配置: {}", EXAMPLE_CONFIG_PATH);
            TomlConfigLoader::load_from_file(EXAMPLE_CONFIG_PATH)
                .map_err(|e| format!("加载示例配置失败: {}", e))?
        } else if let Some(config_path) = &self.config {
            info!("加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("配置文件加载失败: {}", e))?
        } else {
            info!("使用默认设置");
            RenderSettings::default()
        };

        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(output) = &self.output {
            Self::apply_output_path(&mut settings, Path::new(output));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// `dir/name.png` 拆成输出目录与基础名称
    fn apply_output_path(settings: &mut RenderSettings, path: &Path) {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            settings.output = stem.to_string();
        }
        settings.output_dir = match path.parent().and_then(|p| p.to_str()) {
            Some(dir) if !dir.is_empty() => dir.to_string(),
            _ => ".".to_string(),
        };
    }
}
