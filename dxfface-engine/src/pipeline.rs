//! 单次转换的重建流水线。
//!
//! 状态：空闲（`group` 为 `None`）→ 收集（首个被接受的图元创建 `GroupState`）
//! → 组结束时装配并清空 → 空闲。`finish` 会先冲刷仍在收集的组。

use dxfface_core::kernel::ShapeBuilder;
use dxfface_core::primitive::Primitive;
use dxfface_core::shape::Compound;
use tracing::{debug, info};

use crate::assembler::WireAssembler;
use crate::builder::{CompoundBuilder, build_face};
use crate::group::{Acceptance, GroupState};
use crate::stats::ConversionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Collecting,
}

pub struct ReconstructionPipeline<'k, K: ShapeBuilder + ?Sized> {
    kernel: &'k K,
    group: Option<GroupState>,
    compound: CompoundBuilder,
    stats: ConversionStats,
}

impl<'k, K: ShapeBuilder + ?Sized> ReconstructionPipeline<'k, K> {
    pub fn new(kernel: &'k K) -> Self {
        Self {
            kernel,
            group: None,
            compound: CompoundBuilder::new(),
            stats: ConversionStats::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.group.is_some() {
            PipelineState::Collecting
        } else {
            PipelineState::Idle
        }
    }

    /// 退化或重复的图元直接丢弃，只计数。
    pub fn push(&mut self, primitive: Primitive) -> Acceptance {
        let kind = primitive.kind();
        let mut group = self.group.take().unwrap_or_default();
        let acceptance = group.accept(primitive);
        match acceptance {
            Acceptance::Accepted(entry) => {
                self.stats.primitives_accepted += 1;
                debug!(kind = %kind, position = entry.position, "图元已加入当前组");
            }
            Acceptance::Degenerate => {
                self.stats.degenerate_skipped += 1;
                debug!(kind = %kind, "跳过退化图元");
            }
            Acceptance::Duplicate => {
                self.stats.duplicates_skipped += 1;
                debug!(kind = %kind, "跳过重复图元");
            }
        }
        if !group.is_empty() {
            self.group = Some(group);
        }
        acceptance
    }

    /// 组结束标记。空闲状态下为空操作。
    pub fn end_group(&mut self) {
        let Some(group) = self.group.take() else {
            return;
        };
        let primitives = group.len();
        let assembled = WireAssembler::new(self.kernel).assemble(group);
        self.stats.rejected_edges += assembled.rejected_edges;
        if assembled.open_chain {
            self.stats.open_chains += 1;
        }
        self.stats.groups_completed += 1;

        if let Some(face) = build_face(self.kernel, assembled.loops) {
            self.compound.add_face(face);
            self.stats.faces += 1;
        }
        debug!(
            primitives,
            faces = self.compound.face_count(),
            "重建组已完成"
        );
    }

    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }

    /// 供解析层记录不支持或格式错误的实体。
    pub fn stats_mut(&mut self) -> &mut ConversionStats {
        &mut self.stats
    }

    pub fn finish(mut self) -> (Compound, ConversionStats) {
        self.end_group();
        let stats = self.stats;
        let compound = self.compound.finish(self.kernel);
        info!(
            faces = stats.faces,
            groups = stats.groups_completed,
            accepted = stats.primitives_accepted,
            skipped = stats.skipped(),
            "重建完成"
        );
        (compound, stats)
    }
}
