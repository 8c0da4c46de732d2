use crate::io::render_settings::{LineSettings, ObjectSettings, RenderSettings};
use log::warn;
use serde::Serialize;
use std::path::Path;
use toml::Value;

/// TOML配置管理器 - 统一处理所有配置的读写
pub struct TomlConfigLoader;

/// `[[object]]` / `[[line]]` 数组的序列化载体
#[derive(Serialize)]
struct SceneEntries {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    object: Vec<ObjectSettings>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    line: Vec<LineSettings>,
}

impl TomlConfigLoader {
    /// 从TOML文件加载完整配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败: {}", e))?;

        Self::load_from_content(&content)
    }

    /// 从TOML内容字符串加载配置
    pub fn load_from_content(content: &str) -> Result<RenderSettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("解析TOML失败: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings)?;
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    /// 生成示例配置文件：一个渐变三角形、一个旋转的方块和几条线段
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        Self::save_to_file(&Self::example_settings(), path)
            .map_err(|e| format!("创建示例配置失败: {}", e))
    }

    /// 示例场景，像素坐标系
    pub fn example_settings() -> RenderSettings {
        let triangle = ObjectSettings {
            name: Some("gradient_triangle".to_string()),
            vertices: vec![[40.0, 40.0, 0.0], [360.0, 40.0, 0.0], [200.0, 340.0, 0.0]],
            colors: vec![
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
            ],
            indices: vec![0, 1, 2],
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        };
        let square = ObjectSettings {
            name: Some("square".to_string()),
            vertices: vec![
                [-40.0, -40.0, 0.0],
                [40.0, -40.0, 0.0],
                [40.0, 40.0, 0.0],
                [-40.0, 40.0, 0.0],
            ],
            colors: Vec::new(),
            indices: vec![0, 1, 2, 0, 2, 3],
            position: [300.0, 300.0, 0.0],
            rotation: [0.0, 0.0, 30.0],
            scale: [1.0; 3],
        };
        let lines = (0..4)
            .map(|i| LineSettings {
                from: [0, i * 10],
                to: [400, 400 - i * 10],
                color_from: [1.0, 1.0, 1.0, 1.0],
                color_to: [0.0, 0.0, 0.0, 1.0],
            })
            .collect();

        RenderSettings {
            colorize: true,
            background_color: "0.1,0.1,0.1".to_string(),
            objects: vec![triangle, square],
            lines,
            ..Default::default()
        }
    }

    // ===== TOML -> RenderSettings 转换 =====

    fn parse_toml_to_settings(toml: Value) -> Result<RenderSettings, String> {
        let mut settings = RenderSettings::default();

        // [output] 部分
        if let Some(output) = toml.get("output").and_then(|v| v.as_table()) {
            Self::parse_output_section(&mut settings, output)?;
        }

        // [render] 部分
        if let Some(render) = toml.get("render").and_then(|v| v.as_table()) {
            Self::parse_render_section(&mut settings, render)?;
        }

        // [camera] 部分
        if let Some(camera) = toml.get("camera").and_then(|v| v.as_table()) {
            Self::parse_camera_section(&mut settings, camera)?;
        }

        // [[object]] 与 [[line]] 数组
        settings.objects = Self::parse_array(&toml, "object")?;
        settings.lines = Self::parse_array(&toml, "line")?;

        Ok(settings)
    }

    // ===== 各个section的解析方法 =====

    fn parse_output_section(
        settings: &mut RenderSettings,
        output: &toml::Table,
    ) -> Result<(), String> {
        if let Some(name) = output.get("name").and_then(|v| v.as_str()) {
            settings.output = name.to_string();
        }
        if let Some(dir) = output.get("dir").and_then(|v| v.as_str()) {
            settings.output_dir = dir.to_string();
        }
        Ok(())
    }

    fn parse_render_section(
        settings: &mut RenderSettings,
        render: &toml::Table,
    ) -> Result<(), String> {
        if let Some(width) = render.get("width").and_then(|v| v.as_integer()) {
            settings.width = Self::positive_size("width", width, settings.width);
        }
        if let Some(height) = render.get("height").and_then(|v| v.as_integer()) {
            settings.height = Self::positive_size("height", height, settings.height);
        }
        if let Some(projection) = render.get("projection").and_then(|v| v.as_str()) {
            match projection {
                "pixel" | "orthographic" | "perspective" => {
                    settings.projection = projection.to_string();
                }
                other => return Err(format!("不支持的投影类型: {}", other)),
            }
        }
        if let Some(double) = render.get("double_buffering").and_then(|v| v.as_bool()) {
            settings.use_double_buffering = double;
        }
        if let Some(threads) = render.get("use_multithreading").and_then(|v| v.as_bool()) {
            settings.use_multithreading = threads;
        }
        if let Some(colorize) = render.get("colorize").and_then(|v| v.as_bool()) {
            settings.colorize = colorize;
        }
        if let Some(background) = render.get("background_color").and_then(|v| v.as_str()) {
            settings.background_color = background.to_string();
        }
        Ok(())
    }

    fn parse_camera_section(
        settings: &mut RenderSettings,
        camera: &toml::Table,
    ) -> Result<(), String> {
        if let Some(from) = camera.get("from").and_then(|v| v.as_str()) {
            settings.camera_from = from.to_string();
        }
        if let Some(at) = camera.get("at").and_then(|v| v.as_str()) {
            settings.camera_at = at.to_string();
        }
        if let Some(up) = camera.get("up").and_then(|v| v.as_str()) {
            settings.camera_up = up.to_string();
        }
        if let Some(fov) = camera.get("fov").and_then(Self::as_f32) {
            settings.camera_fov = fov;
        }
        if let Some(near) = camera.get("near").and_then(Self::as_f32) {
            settings.camera_near = near;
        }
        if let Some(far) = camera.get("far").and_then(Self::as_f32) {
            settings.camera_far = far;
        }
        Ok(())
    }

    fn parse_array<T: serde::de::DeserializeOwned>(
        toml: &Value,
        key: &str,
    ) -> Result<Vec<T>, String> {
        let Some(entries) = toml.get(key) else {
            return Ok(Vec::new());
        };
        let array = entries
            .as_array()
            .ok_or_else(|| format!("[[{}]] 必须是表数组", key))?;

        array
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .clone()
                    .try_into::<T>()
                    .map_err(|e| format!("第 {} 个 [[{}]] 无效: {}", i + 1, key, e))
            })
            .collect()
    }

    /// 整数也按浮点数接受
    fn as_f32(value: &Value) -> Option<f32> {
        value
            .as_float()
            .or_else(|| value.as_integer().map(|i| i as f64))
            .map(|f| f as f32)
    }

    fn positive_size(key: &str, value: i64, fallback: usize) -> usize {
        if value > 0 {
            value as usize
        } else {
            warn!("无效的 {} 值 {}, 使用默认值 {}", key, value, fallback);
            fallback
        }
    }

    // ===== RenderSettings -> TOML 转换 =====

    fn settings_to_toml(settings: &RenderSettings) -> Result<String, String> {
        let mut content = String::new();

        // 文件头注释
        content.push_str("# 软件光栅化渲染器配置文件\n");
        content.push_str("# projection = \"pixel\" 时对象坐标即像素坐标\n\n");

        // [output] 部分
        content.push_str("[output]\n");
        content.push_str(&format!("name = \"{}\"\n", settings.output));
        content.push_str(&format!("dir = \"{}\"\n", settings.output_dir));
        content.push('\n');

        // [render] 部分
        content.push_str("[render]\n");
        content.push_str(&format!("width = {}\n", settings.width));
        content.push_str(&format!("height = {}\n", settings.height));
        content.push_str(&format!("projection = \"{}\"\n", settings.projection));
        content.push_str(&format!(
            "double_buffering = {}\n",
            settings.use_double_buffering
        ));
        content.push_str(&format!(
            "use_multithreading = {}\n",
            settings.use_multithreading
        ));
        content.push_str(&format!("colorize = {}\n", settings.colorize));
        content.push_str(&format!(
            "background_color = \"{}\"\n",
            settings.background_color
        ));
        content.push('\n');

        // [camera] 部分
        content.push_str("[camera]\n");
        content.push_str(&format!("from = \"{}\"\n", settings.camera_from));
        content.push_str(&format!("at = \"{}\"\n", settings.camera_at));
        content.push_str(&format!("up = \"{}\"\n", settings.camera_up));
        content.push_str(&format!("fov = {:?}\n", settings.camera_fov));
        content.push_str(&format!("near = {:?}\n", settings.camera_near));
        content.push_str(&format!("far = {:?}\n", settings.camera_far));

        // 场景内容
        let entries = SceneEntries {
            object: settings.objects.clone(),
            line: settings.lines.clone(),
        };
        let scene = toml::to_string(&entries).map_err(|e| format!("序列化场景失败: {}", e))?;
        if !scene.is_empty() {
            content.push('\n');
            content.push_str(&scene);
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_arrays() {
        let settings = TomlConfigLoader::load_from_content(
            r#"
            [output]
            name = "frame"
            dir = "out"

            [render]
            width = 64
            height = 32
            projection = "perspective"
            double_buffering = true
            background_color = "0.5,0.5,0.5"

            [camera]
            fov = 60

            [[object]]
            vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            indices = [0, 1, 2]
            rotation = [0.0, 0.0, 90.0]

            [[line]]
            from = [0, 0]
            to = [10, 0]
            color_to = [0.0, 0.0, 0.0, 1.0]
            "#,
        )
        .unwrap();

        assert_eq!(settings.output, "frame");
        assert_eq!(settings.output_dir, "out");
        assert_eq!((settings.width, settings.height), (64, 32));
        assert!(settings.is_perspective());
        assert!(settings.use_double_buffering);
        assert_eq!(settings.camera_fov, 60.0);

        assert_eq!(settings.objects.len(), 1);
        assert_eq!(settings.objects[0].rotation, [0.0, 0.0, 90.0]);
        assert_eq!(settings.objects[0].scale, [1.0, 1.0, 1.0]);
        assert!(settings.objects[0].colors.is_empty());

        assert_eq!(settings.lines.len(), 1);
        assert_eq!(settings.lines[0].color_from, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(settings.lines[0].color_to, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(TomlConfigLoader::load_from_content("[render\nwidth = 1").is_err());
        assert!(
            TomlConfigLoader::load_from_content("[render]\nprojection = \"fisheye\"").is_err()
        );
        assert!(TomlConfigLoader::load_from_content("[[object]]\nvertices = 3").is_err());
    }

    #[test]
    fn non_positive_size_falls_back_to_default() {
        let settings = TomlConfigLoader::load_from_content("[render]\nwidth = -5").unwrap();
        assert_eq!(settings.width, RenderSettings::default().width);
    }

    #[test]
    fn example_settings_round_trip_through_toml() {
        let settings = TomlConfigLoader::example_settings();
        let content = TomlConfigLoader::settings_to_toml(&settings).unwrap();
        let parsed = TomlConfigLoader::load_from_content(&content).unwrap();
        assert_eq!(parsed, settings);
        assert!(parsed.validate().is_ok());
    }
}
