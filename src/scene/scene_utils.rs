use crate::core::error::RenderError;
use crate::core::rasterizer::line::Line2d;
use crate::core::render_context::{DrawStats, RenderContext};
use crate::core::vertex::AttributeLayout;
use crate::geometry::transform::{Transform, TransformFactory};
use crate::io::render_settings::{LineSettings, ObjectSettings, RenderSettings, parse_vec3};
use crate::material_system::color::Color;
use crate::material_system::shader::{AttributeColorPixelShader, MvpVertexShader};
use crate::math::{Matrix4x4, Vector3};
use crate::scene::scene_object::SceneObject;
use log::debug;

/// 屏幕空间线段及其端点颜色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLine {
    pub line: Line2d,
    pub color_from: Color,
    pub color_to: Color,
}

impl From<&LineSettings> for SceneLine {
    fn from(s: &LineSettings) -> Self {
        Self {
            line: Line2d::new(s.from[0], s.from[1], s.to[0], s.to[1]),
            color_from: Color::from(s.color_from),
            color_to: Color::from(s.color_to),
        }
    }
}

/// 表示一个场景：三角形网格、屏幕空间线段和相机矩阵
#[derive(Debug, Clone)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lines: Vec<SceneLine>,
    pub view: Matrix4x4,
    pub projection: Matrix4x4,
    pub background: Color,
}

impl Scene {
    pub fn new(view: Matrix4x4, projection: Matrix4x4) -> Self {
        Self {
            objects: Vec::new(),
            lines: Vec::new(),
            view,
            projection,
            background: Color::BLACK,
        }
    }

    /// 对象坐标直接是像素坐标的场景
    pub fn pixel_space(width: usize, height: usize) -> Self {
        Self::new(
            Matrix4x4::IDENTITY,
            TransformFactory::orthographic(0.0, width as f32, 0.0, height as f32, -1.0, 1.0),
        )
    }

    /// 从渲染设置创建完整场景
    pub fn from_settings(settings: &RenderSettings) -> Result<Self, String> {
        let (view, projection) = Self::setup_camera_from_settings(settings)?;
        let mut scene = Self::new(view, projection);
        scene.background = settings.get_background_color();

        for (i, object) in settings.objects.iter().enumerate() {
            let scene_object = Self::build_object(object, settings.colorize)
                .map_err(|e| format!("第 {} 个对象无效: {}", i + 1, e))?;
            scene.add_object(scene_object);
        }
        scene.lines = settings.lines.iter().map(SceneLine::from).collect();

        Ok(scene)
    }

    fn build_object(object: &ObjectSettings, colorize: bool) -> Result<SceneObject, RenderError> {
        let positions: Vec<Vector3> = object.vertices.iter().map(|&v| Vector3::from(v)).collect();
        let scene_object = if object.colors.is_empty() {
            SceneObject::with_face_colors(&positions, &object.indices, colorize)?
        } else {
            let colors = object.colors.iter().map(|&c| Color::from(c)).collect();
            SceneObject::new(positions, colors, object.indices.clone())?
        };

        let transform = Transform::from_euler(
            Vector3::from(object.position),
            Vector3::from(object.rotation),
            Vector3::from(object.scale),
        );
        let scene_object = scene_object.with_transform(transform);
        Ok(match &object.name {
            Some(name) => scene_object.with_name(name),
            None => scene_object,
        })
    }

    /// 根据渲染设置计算视图矩阵与投影矩阵
    pub fn setup_camera_from_settings(
        settings: &RenderSettings,
    ) -> Result<(Matrix4x4, Matrix4x4), String> {
        let (width, height) = (settings.width as f32, settings.height as f32);
        if settings.projection == "pixel" {
            let scene = Self::pixel_space(settings.width, settings.height);
            return Ok((scene.view, scene.projection));
        }

        let aspect_ratio = width / height;
        let camera_from =
            parse_vec3(&settings.camera_from).map_err(|e| format!("无效的相机位置格式: {}", e))?;
        let camera_at =
            parse_vec3(&settings.camera_at).map_err(|e| format!("无效的相机目标格式: {}", e))?;
        let camera_up =
            parse_vec3(&settings.camera_up).map_err(|e| format!("无效的相机上方向格式: {}", e))?;
        let view = TransformFactory::look_at_rh(camera_from, camera_at, camera_up)
            .map_err(|e| format!("无效的相机朝向: {}", e))?;

        let (near, far) = (settings.camera_near, settings.camera_far);
        let projection = match settings.projection.as_str() {
            "perspective" => {
                TransformFactory::perspective(aspect_ratio, settings.camera_fov, near, far)
            }
            "orthographic" => {
                let half_h = 2.0;
                let half_w = half_h * aspect_ratio;
                TransformFactory::orthographic(-half_w, half_w, -half_h, half_h, near, far)
            }
            other => return Err(format!("不支持的投影类型: {}", other)),
        };

        Ok((view, projection))
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn add_line(&mut self, line: Line2d, color_from: Color, color_to: Color) {
        self.lines.push(SceneLine {
            line,
            color_from,
            color_to,
        });
    }

    /// 把所有对象合并为一组顶点/索引缓冲区
    pub fn build_buffers(&mut self) -> (Vec<f32>, Vec<u32>) {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let stride = AttributeLayout::position_color().stride();
        for object in &mut self.objects {
            let base = (vertices.len() / stride) as u32;
            object.append_vertex_data(&mut vertices);
            indices.extend(object.indices().iter().map(|&i| i + base));
        }
        (vertices, indices)
    }

    /// 渲染一帧：清屏、画线，再用一次绘制调用画出所有对象
    ///
    /// 线段先写入，与三角形重叠处被三角形覆盖；整帧只翻转一次缓冲区。
    pub fn render(&mut self, ctx: &mut RenderContext) -> Result<DrawStats, RenderError> {
        ctx.clear(self.background);

        for line in &self.lines {
            ctx.draw_line(line.line, line.color_from, line.color_to);
        }

        let (vertices, indices) = self.build_buffers();
        let shader = MvpVertexShader::new(self.projection * self.view);
        let stats = ctx.draw_with(
            &vertices,
            &indices,
            &AttributeLayout::position_color(),
            &shader,
            &AttributeColorPixelShader::default(),
        )?;

        debug!(
            "场景渲染: {} 个对象, {} 条线段",
            self.objects.len(),
            self.lines.len()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_buffer::BufferMode;

    fn settings_with(objects: Vec<ObjectSettings>) -> RenderSettings {
        RenderSettings {
            width: 100,
            height: 100,
            objects,
            ..Default::default()
        }
    }

    fn triangle_settings(position: [f32; 3]) -> ObjectSettings {
        ObjectSettings {
            name: Some("tri".to_string()),
            vertices: vec![[10.0, 10.0, 0.0], [10.0, 50.0, 0.0], [50.0, 50.0, 0.0]],
            colors: vec![[1.0, 0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
            position,
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }

    #[test]
    fn pixel_space_scene_renders_at_pixel_coordinates() {
        let mut scene = Scene::from_settings(&settings_with(vec![triangle_settings([0.0; 3])])).unwrap();
        let mut ctx = RenderContext::new(100, 100, BufferMode::Single);
        let stats = scene.render(&mut ctx).unwrap();
        assert_eq!(stats.triangles, 1);

        let red = Color::RED.to_packed();
        assert_eq!(ctx.color_buffer().pixel(20, 40), Some(red));
        assert_eq!(ctx.color_buffer().pixel(40, 20), Some(Color::BLACK.to_packed()));
    }

    #[test]
    fn object_transform_moves_the_mesh() {
        let mut scene =
            Scene::from_settings(&settings_with(vec![triangle_settings([30.0, 0.0, 0.0])])).unwrap();
        let mut ctx = RenderContext::new(100, 100, BufferMode::Single);
        scene.render(&mut ctx).unwrap();
        let red = Color::RED.to_packed();
        assert_eq!(ctx.color_buffer().pixel(20, 40), Some(Color::BLACK.to_packed()));
        assert_eq!(ctx.color_buffer().pixel(50, 40), Some(red));
    }

    #[test]
    fn merged_buffers_offset_indices() {
        let mut scene = Scene::from_settings(&settings_with(vec![
            triangle_settings([0.0; 3]),
            triangle_settings([5.0, 0.0, 0.0]),
        ]))
        .unwrap();
        let (vertices, indices) = scene.build_buffers();
        assert_eq!(vertices.len(), 6 * 8);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(vertices[3 * 8], 15.0);
    }

    #[test]
    fn invalid_object_reports_its_position() {
        let mut bad = triangle_settings([0.0; 3]);
        bad.indices = vec![0, 1, 7];
        let err = Scene::from_settings(&settings_with(vec![bad])).unwrap_err();
        assert!(err.contains("第 1 个对象"));
    }

    #[test]
    fn perspective_camera_builds_matrices() {
        let settings = RenderSettings {
            projection: "perspective".to_string(),
            ..Default::default()
        };
        let (view, projection) = Scene::setup_camera_from_settings(&settings).unwrap();
        // 相机在 z = 3 看向原点，原点落在视口中心
        let clip = projection * view * crate::math::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn lines_are_drawn_before_triangles() {
        let mut scene = Scene::pixel_space(100, 100);
        scene.add_line(Line2d::new(0, 30, 100, 30), Color::GREEN, Color::GREEN);
        scene.add_object(
            SceneObject::new(
                vec![
                    Vector3::new(10.0, 10.0, 0.0),
                    Vector3::new(10.0, 50.0, 0.0),
                    Vector3::new(50.0, 50.0, 0.0),
                ],
                vec![Color::RED; 3],
                vec![0, 1, 2],
            )
            .unwrap(),
        );
        let mut ctx = RenderContext::new(100, 100, BufferMode::Double);
        scene.render(&mut ctx).unwrap();

        let buffer = ctx.color_buffer();
        assert_eq!(buffer.pixel(20, 30), Some(Color::RED.to_packed()));
        assert_eq!(buffer.pixel(80, 30), Some(Color::GREEN.to_packed()));
    }
}
