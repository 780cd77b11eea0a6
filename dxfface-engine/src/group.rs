//! 单个重建组的累积状态。
//!
//! 每组新建一个 `GroupState`，组结束时整体移交给线框装配器，
//! 不存在跨组残留的字段。

use dxfface_core::primitive::{Arc, Circle, Line, Polyline, Primitive, PrimitiveKind, Spline};

use crate::index::{EntityIndex, EntityIndexEntry};

/// 图元加入组时的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted(EntityIndexEntry),
    Degenerate,
    Duplicate,
}

/// 按索引取回的图元引用。
#[derive(Debug, Clone, Copy)]
pub enum PrimitiveRef<'a> {
    Line(&'a Line),
    Circle(&'a Circle),
    Arc(&'a Arc),
    Polyline(&'a Polyline),
    Spline(&'a Spline),
}

#[derive(Debug, Default)]
pub struct GroupState {
    lines: Vec<Line>,
    circles: Vec<Circle>,
    arcs: Vec<Arc>,
    polylines: Vec<Polyline>,
    splines: Vec<Spline>,
    index: EntityIndex,
}

impl GroupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接受非退化、且与同类已有图元不相等的图元，并登记到实体索引。
    pub fn accept(&mut self, primitive: Primitive) -> Acceptance {
        if primitive.is_degenerate() {
            return Acceptance::Degenerate;
        }
        let kind = primitive.kind();
        let position = match primitive {
            Primitive::Line(line) => push_unique(&mut self.lines, line),
            Primitive::Circle(circle) => push_unique(&mut self.circles, circle),
            Primitive::Arc(arc) => push_unique(&mut self.arcs, arc),
            Primitive::Polyline(polyline) => push_unique(&mut self.polylines, polyline),
            Primitive::Spline(spline) => push_unique(&mut self.splines, spline),
        };
        match position {
            Some(position) => Acceptance::Accepted(self.index.push(kind, position)),
            None => Acceptance::Duplicate,
        }
    }

    pub fn get(&self, entry: EntityIndexEntry) -> Option<PrimitiveRef<'_>> {
        let position = entry.position;
        match entry.kind {
            PrimitiveKind::Line => self.lines.get(position).map(PrimitiveRef::Line),
            PrimitiveKind::Circle => self.circles.get(position).map(PrimitiveRef::Circle),
            PrimitiveKind::Arc => self.arcs.get(position).map(PrimitiveRef::Arc),
            PrimitiveKind::Polyline => self.polylines.get(position).map(PrimitiveRef::Polyline),
            PrimitiveKind::Spline => self.splines.get(position).map(PrimitiveRef::Spline),
        }
    }

    #[inline]
    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn splines(&self) -> &[Spline] {
        &self.splines
    }
}

// 线性扫描去重：单组图元数量通常在数百到数千之间。
fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> Option<usize> {
    if list.contains(&item) {
        return None;
    }
    list.push(item);
    Some(list.len() - 1)
}
