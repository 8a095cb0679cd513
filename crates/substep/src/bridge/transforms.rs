use bytemuck::{Pod, Zeroable};

use crate::components::entity::Entity;

/// Published pose of one entity, laid out for zero-copy readers.
/// 4 x 4 bytes = 16 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TransformRecord {
    /// Raw `EntityId`.
    pub entity: u32,
    pub x: f32,
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
}

impl TransformRecord {
    pub const STRIDE_BYTES: usize = 16;

    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            entity: entity.id.0,
            x: entity.pos.x,
            y: entity.pos.y,
            rotation: entity.rotation,
        }
    }
}

/// Flat export of published transforms, rebuilt after each frame.
pub struct TransformBuffer {
    records: Vec<TransformRecord>,
}

impl TransformBuffer {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Replace the contents with one record per active, simulated entity.
    pub fn rebuild<'a>(&mut self, entities: impl Iterator<Item = &'a Entity>) {
        self.records.clear();
        self.records.extend(
            entities
                .filter(|e| e.active && e.is_simulated())
                .map(TransformRecord::from_entity),
        );
    }

    pub fn records(&self) -> &[TransformRecord] {
        &self.records
    }

    /// Raw bytes of all records, `len() * STRIDE_BYTES` long.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for TransformBuffer {
    fn default() -> Self {
        Self::new()
    }
}
