pub mod scene_object;
pub mod scene_utils;

pub use scene_object::SceneObject;
pub use scene_utils::{Scene, SceneLine};
