use crate::core::error::RenderError;
use log::debug;
use std::fmt;

/// 缓冲区句柄：槽位下标 + 代数，槽位复用后旧句柄自动失效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    index: u32,
    generation: u32,
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// 缓冲区内容
#[derive(Debug, Clone, PartialEq)]
pub enum BufferData {
    /// 扁平顶点属性
    Vertex(Vec<f32>),
    /// 三角形索引，每 3 个一组
    Index(Vec<u32>),
}

struct Slot {
    generation: u32,
    data: Option<BufferData>,
}

/// 顶点/索引缓冲区的代际竞技场
#[derive(Default)]
pub struct BufferStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, data: BufferData) -> BufferHandle {
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.data = Some(data);
                BufferHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                BufferHandle {
                    index,
                    generation: 0,
                }
            }
        };
        debug!("创建缓冲区 {}", handle);
        handle
    }

    pub fn create_vertex(&mut self, vertices: Vec<f32>) -> BufferHandle {
        self.create(BufferData::Vertex(vertices))
    }

    pub fn create_index(&mut self, indices: Vec<u32>) -> BufferHandle {
        self.create(BufferData::Index(indices))
    }

    fn slot(&self, handle: BufferHandle) -> Result<&BufferData, RenderError> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.data.as_ref())
            .ok_or_else(|| RenderError::InvalidHandle(handle.to_string()))
    }

    pub fn get(&self, handle: BufferHandle) -> Result<&BufferData, RenderError> {
        self.slot(handle)
    }

    /// 替换已有缓冲区的内容
    pub fn write(&mut self, handle: BufferHandle, data: BufferData) -> Result<(), RenderError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.data.is_some())
            .ok_or_else(|| RenderError::InvalidHandle(handle.to_string()))?;
        slot.data = Some(data);
        Ok(())
    }

    pub fn vertex_data(&self, handle: BufferHandle) -> Result<&[f32], RenderError> {
        match self.slot(handle)? {
            BufferData::Vertex(v) => Ok(v),
            BufferData::Index(_) => Err(RenderError::InvalidHandle(format!(
                "{} 是索引缓冲区",
                handle
            ))),
        }
    }

    pub fn index_data(&self, handle: BufferHandle) -> Result<&[u32], RenderError> {
        match self.slot(handle)? {
            BufferData::Index(i) => Ok(i),
            BufferData::Vertex(_) => Err(RenderError::InvalidHandle(format!(
                "{} 是顶点缓冲区",
                handle
            ))),
        }
    }

    /// 销毁并返回缓冲区内容，槽位代数加一后放回空闲表
    pub fn destroy(&mut self, handle: BufferHandle) -> Result<BufferData, RenderError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or_else(|| RenderError::InvalidHandle(handle.to_string()))?;
        let data = slot
            .data
            .take()
            .ok_or_else(|| RenderError::InvalidHandle(handle.to_string()))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        debug!("销毁缓冲区 {}", handle);
        Ok(data)
    }

    /// 存活的缓冲区个数
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
