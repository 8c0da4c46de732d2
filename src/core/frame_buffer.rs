use crate::material_system::color::Color;
use log::debug;

/// 单缓冲或前后台双缓冲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferMode {
    #[default]
    Single,
    Double,
}

/// 颜色缓冲区，存储打包后的 RGBA (0xRRGGBBAA)
///
/// 网格尺寸为 (width+1)×(height+1)，包含右/上边界像素。行主序，
/// 索引 `y * (width + 1) + x`，y = 0 为最底行。
pub struct ColorBuffer {
    width: usize,
    height: usize,
    mode: BufferMode,
    buffers: Vec<Vec<u32>>,
    /// 当前写入的缓冲区下标
    active: usize,
}

impl ColorBuffer {
    pub fn new(width: usize, height: usize, mode: BufferMode) -> Self {
        let cells = (width + 1) * (height + 1);
        let count = match mode {
            BufferMode::Single => 1,
            BufferMode::Double => 2,
        };
        ColorBuffer {
            width,
            height,
            mode,
            buffers: (0..count).map(|_| vec![0; cells]).collect(),
            active: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    /// 每行的像素个数
    pub fn row_len(&self) -> usize {
        self.width + 1
    }

    pub fn row_count(&self) -> usize {
        self.height + 1
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize > self.width || y as usize > self.height {
            return None;
        }
        Some(y as usize * self.row_len() + x as usize)
    }

    /// 写入当前缓冲区；越界坐标或无效颜色被静默丢弃
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !color.is_valid() {
            return false;
        }
        self.set_packed(x, y, color.to_packed())
    }

    pub fn set_packed(&mut self, x: i32, y: i32, packed: u32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.buffers[self.active][i] = packed;
                true
            }
            None => false,
        }
    }

    /// 用指定颜色填充当前写入的缓冲区
    pub fn clear(&mut self, color: Color) {
        let packed = color.to_packed();
        self.buffers[self.active].fill(packed);
    }

    /// 一次绘制调用结束后翻转前后台；单缓冲时无操作
    pub fn swap(&mut self) {
        if self.mode == BufferMode::Double {
            self.active = 1 - self.active;
            debug!("颜色缓冲区翻转，当前写入缓冲区 {}", self.active);
        }
    }

    /// 已完成的一帧：双缓冲时为非写入缓冲区，单缓冲时即唯一缓冲区
    pub fn front(&self) -> &[u32] {
        match self.mode {
            BufferMode::Single => &self.buffers[0],
            BufferMode::Double => &self.buffers[1 - self.active],
        }
    }

    /// 正在写入的缓冲区
    pub fn back(&self) -> &[u32] {
        &self.buffers[self.active]
    }

    /// 读取已完成帧中的一个像素
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.front()[i])
    }

    /// 读取正在写入的缓冲区中的一个像素
    pub fn back_pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.back()[i])
    }

    /// 已完成帧按行导出为 RGBA8 字节，最上面一行在前
    pub fn to_rgba8(&self) -> Vec<u8> {
        let row_len = self.row_len();
        let front = self.front();
        let mut bytes = Vec::with_capacity(front.len() * 4);
        for row in front.chunks_exact(row_len).rev() {
            for packed in row {
                bytes.extend_from_slice(&packed.to_be_bytes());
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_includes_boundary_pixels() {
        let mut buffer = ColorBuffer::new(4, 3, BufferMode::Single);
        assert_eq!(buffer.front().len(), 5 * 4);
        assert!(buffer.draw_pixel(4, 3, Color::RED));
        assert_eq!(buffer.pixel(4, 3), Some(Color::RED.to_packed()));
        assert_eq!(buffer.front()[3 * 5 + 4], Color::RED.to_packed());
    }

    #[test]
    fn out_of_range_and_invalid_writes_are_dropped() {
        let mut buffer = ColorBuffer::new(4, 4, BufferMode::Single);
        assert!(!buffer.draw_pixel(-1, 0, Color::RED));
        assert!(!buffer.draw_pixel(5, 0, Color::RED));
        assert!(!buffer.draw_pixel(0, 5, Color::RED));
        assert!(!buffer.draw_pixel(1, 1, Color::new(-0.5, 0.0, 0.0, 1.0)));
        assert!(buffer.front().iter().all(|&p| p == 0));
        assert_eq!(buffer.pixel(9, 9), None);
    }

    #[test]
    fn double_buffer_exposes_completed_frame() {
        let mut buffer = ColorBuffer::new(2, 2, BufferMode::Double);
        buffer.draw_pixel(1, 1, Color::GREEN);
        assert_eq!(buffer.pixel(1, 1), Some(0));
        assert_eq!(buffer.back_pixel(1, 1), Some(Color::GREEN.to_packed()));

        buffer.swap();
        assert_eq!(buffer.pixel(1, 1), Some(Color::GREEN.to_packed()));
        assert_eq!(buffer.back_pixel(1, 1), Some(0));

        buffer.clear(Color::WHITE);
        assert_eq!(buffer.pixel(0, 0), Some(0));
        buffer.swap();
        assert_eq!(buffer.pixel(0, 0), Some(Color::WHITE.to_packed()));
    }

    #[test]
    fn single_buffer_swap_is_noop() {
        let mut buffer = ColorBuffer::new(2, 2, BufferMode::Single);
        buffer.draw_pixel(0, 0, Color::BLUE);
        buffer.swap();
        assert_eq!(buffer.pixel(0, 0), Some(Color::BLUE.to_packed()));
    }

    #[test]
    fn rgba_export_is_top_row_first() {
        let mut buffer = ColorBuffer::new(1, 1, BufferMode::Single);
        buffer.draw_pixel(0, 1, Color::RED);
        let bytes = buffer.to_rgba8();
        assert_eq!(bytes.len(), 2 * 2 * 4);
        assert_eq!(&bytes[0..4], &[255, 0, 0, 255]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
    }
}
