use thiserror::Error;

/// 绘制调用中的结构性错误，出现时整个调用中止且不修改颜色缓冲区
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("索引数量 {0} 不是 3 的倍数")]
    IndexCount(usize),

    #[error("索引 {index} 超出顶点数量 {vertex_count}")]
    IndexOutOfRange { index: usize, vertex_count: usize },

    #[error("顶点缓冲区长度 {len} 不是步长 {stride} 的整数倍")]
    VertexBufferLength { len: usize, stride: usize },

    #[error("无效的属性布局: {0}")]
    InvalidLayout(String),

    #[error("顶点着色器输出 {actual} 个分量，布局要求 {expected} 个")]
    AttributeMismatch { expected: usize, actual: usize },

    #[error("未绑定顶点着色器")]
    MissingVertexShader,

    #[error("未绑定像素着色器")]
    MissingPixelShader,

    #[error("缓冲区句柄无效或已销毁: {0}")]
    InvalidHandle(String),

    #[error("三角形尚未光栅化，不能执行像素着色")]
    NotRasterized,
}
