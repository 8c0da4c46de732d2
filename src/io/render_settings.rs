use crate::core::frame_buffer::BufferMode;
use crate::material_system::color::Color;
use crate::math::Vector3;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 场景中的一个三角形网格（`[[object]]`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 模型空间顶点位置
    pub vertices: Vec<[f32; 3]>,
    /// 每个顶点的 RGBA 颜色；为空时按面着色
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    #[serde(default)]
    pub position: [f32; 3],
    /// 欧拉角（度）
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

/// 屏幕空间线段（`[[line]]`），端点为像素坐标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSettings {
    pub from: [i32; 2],
    pub to: [i32; 2],
    #[serde(default = "white")]
    pub color_from: [f32; 4],
    #[serde(default = "white")]
    pub color_to: [f32; 4],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn white() -> [f32; 4] {
    Color::WHITE.to_array()
}

/// 所有可通过 TOML 配置的渲染参数
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    // ===== 输出 =====
    /// 输出文件的基础名称（不含扩展名）
    pub output: String,
    /// 输出图像的目录
    pub output_dir: String,

    // ===== 渲染基础设置 =====
    /// 视口宽度，颜色缓冲区实际为 width+1 列
    pub width: usize,
    /// 视口高度
    pub height: usize,
    /// 投影类型："pixel"、"orthographic" 或 "perspective"
    pub projection: String,
    /// 启用前后台双缓冲
    pub use_double_buffering: bool,
    /// 启用多线程光栅化
    pub use_multithreading: bool,
    /// 没有顶点颜色的对象使用伪随机面颜色而非灰色
    pub colorize: bool,
    /// 背景颜色，格式为 "r,g,b"
    pub background_color: String,

    // ===== 相机参数 =====
    /// 相机位置，格式为 "x,y,z"
    pub camera_from: String,
    /// 相机目标，格式为 "x,y,z"
    pub camera_at: String,
    /// 相机上方向，格式为 "x,y,z"
    pub camera_up: String,
    /// 垂直视场角（度，仅透视投影）
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,

    // ===== 场景内容 =====
    pub objects: Vec<ObjectSettings>,
    pub lines: Vec<LineSettings>,
}

/// 解析逗号分隔的三个浮点数
pub fn parse_vec3(s: &str) -> Result<Vector3, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("需要3个逗号分隔的值".to_string());
    }
    let mut values = [0.0f32; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("无效数字 '{}': {}", part, e))?;
    }
    Ok(Vector3::from(values))
}

/// "r,g,b" 解析为不透明颜色
pub fn parse_color(s: &str) -> Result<Color, String> {
    let v = parse_vec3(s)?;
    let color = Color::rgb(v.x, v.y, v.z);
    if !color.is_valid() {
        return Err(format!("颜色分量不能为负: '{}'", s));
    }
    Ok(color)
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            output: "render".to_string(),
            output_dir: "output".to_string(),

            width: 400,
            height: 400,
            projection: "pixel".to_string(),
            use_double_buffering: false,
            use_multithreading: true,
            colorize: false,
            background_color: "0,0,0".to_string(),

            camera_from: "0,0,3".to_string(),
            camera_at: "0,0,0".to_string(),
            camera_up: "0,1,0".to_string(),
            camera_fov: 45.0,
            camera_near: 0.1,
            camera_far: 100.0,

            objects: Vec::new(),
            lines: Vec::new(),
        }
    }
}

impl RenderSettings {
    /// 背景颜色（按需解析，失败时为黑色）
    pub fn get_background_color(&self) -> Color {
        parse_color(&self.background_color).unwrap_or(Color::BLACK)
    }

    pub fn buffer_mode(&self) -> BufferMode {
        if self.use_double_buffering {
            BufferMode::Double
        } else {
            BufferMode::Single
        }
    }

    /// 判断是否使用透视投影
    pub fn is_perspective(&self) -> bool {
        self.projection == "perspective"
    }

    /// `output_dir/output.png`
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir).join(format!("{}.png", self.output))
    }

    /// 验证渲染参数
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("错误: 图像宽度和高度必须大于0".to_string());
        }

        if self.output_dir.trim().is_empty() {
            return Err("错误: 输出目录不能为空".to_string());
        }

        if self.output.trim().is_empty() {
            return Err("错误: 输出文件名不能为空".to_string());
        }

        if !matches!(
            self.projection.as_str(),
            "pixel" | "orthographic" | "perspective"
        ) {
            return Err(format!("错误: 不支持的投影类型 '{}'", self.projection));
        }

        parse_color(&self.background_color).map_err(|e| format!("错误: 背景颜色格式不正确: {}", e))?;

        // 验证相机参数
        if parse_vec3(&self.camera_from).is_err() {
            return Err("错误: 相机位置格式不正确，应为 x,y,z 格式".to_string());
        }

        if parse_vec3(&self.camera_at).is_err() {
            return Err("错误: 相机目标格式不正确，应为 x,y,z 格式".to_string());
        }

        if parse_vec3(&self.camera_up).is_err() {
            return Err("错误: 相机上方向格式不正确，应为 x,y,z 格式".to_string());
        }

        if self.is_perspective() && !(self.camera_fov > 0.0 && self.camera_fov < 180.0) {
            return Err(format!("错误: 视场角 {} 超出 (0, 180)", self.camera_fov));
        }

        if self.camera_near == self.camera_far {
            return Err("错误: 近平面与远平面不能重合".to_string());
        }

        for (i, object) in self.objects.iter().enumerate() {
            if !object.colors.is_empty() && object.colors.len() != object.vertices.len() {
                return Err(format!(
                    "错误: 第 {} 个对象有 {} 个顶点但有 {} 个颜色",
                    i,
                    object.vertices.len(),
                    object.colors.len()
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vectors_and_colors() {
        assert_eq!(parse_vec3(" 1, 2.5 ,-3"), Ok(Vector3::new(1.0, 2.5, -3.0)));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,a,2").is_err());

        assert_eq!(parse_color("1,0,0"), Ok(Color::RED));
        assert!(parse_color("-1,0,0").is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.buffer_mode(), BufferMode::Single);
        assert_eq!(settings.get_background_color(), Color::BLACK);
        assert_eq!(settings.output_path(), PathBuf::from("output/render.png"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut settings = RenderSettings {
            width: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        settings.width = 10;
        settings.projection = "fisheye".to_string();
        assert!(settings.validate().is_err());

        settings.projection = "pixel".to_string();
        settings.objects.push(ObjectSettings {
            name: None,
            vertices: vec![[0.0; 3]; 3],
            colors: vec![[1.0; 4]; 2],
            indices: vec![0, 1, 2],
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
        });
        assert!(settings.validate().is_err());
    }
}
