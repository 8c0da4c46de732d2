pub mod buffer_store;
pub mod error;
pub mod frame_buffer;
pub mod geometry_processor;
pub mod parallel_rasterizer;
pub mod rasterizer;
pub mod render_context;
pub mod vertex;
