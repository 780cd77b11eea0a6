use dxfface_core::primitive::PrimitiveKind;

/// 指向某个类型化列表中一条图元的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityIndexEntry {
    pub kind: PrimitiveKind,
    pub position: usize,
}

/// 按文件顺序记录组内已接受的图元，供线框装配按原始顺序回放。
#[derive(Debug, Default, Clone)]
pub struct EntityIndex {
    entries: Vec<EntityIndexEntry>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: PrimitiveKind, position: usize) -> EntityIndexEntry {
        let entry = EntityIndexEntry { kind, position };
        self.entries.push(entry);
        entry
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityIndexEntry> {
        self.entries.iter()
    }

    pub fn count_of(&self, kind: PrimitiveKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
}
