use std::io::{self, Write};
use std::path::Path;

use dxfface_config::ConversionConfig;
use dxfface_core::geometry::Bounds2D;
use dxfface_core::shape::{Compound, FaceIssue};
use dxfface_engine::stats::ConversionStats;
use serde::Serialize;

/// 单个面的检查结果。
#[derive(Debug, Clone, Serialize)]
pub struct FaceReport {
    pub index: usize,
    pub outer_edges: usize,
    pub holes: usize,
    pub bounds: Bounds2D,
    pub issues: Vec<FaceIssue>,
}

impl FaceReport {
    /// 按配置决定是否运行 `Face::check`。
    pub fn collect(compound: &Compound, config: &ConversionConfig) -> Vec<FaceReport> {
        compound
            .faces()
            .iter()
            .enumerate()
            .map(|(index, face)| FaceReport {
                index,
                outer_edges: face.outer().len(),
                holes: face.holes().len(),
                bounds: face.bounds(),
                issues: if config.validate_faces {
                    face.check(config.tolerance)
                } else {
                    Vec::new()
                },
            })
            .collect()
    }
}

pub fn write_summary(
    out: &mut impl Write,
    input: &Path,
    compound: &Compound,
    stats: &ConversionStats,
    reports: &[FaceReport],
) -> io::Result<()> {
    writeln!(out, "文件: {}", input.display())?;
    writeln!(
        out,
        "面数: {}（内环 {}）",
        compound.len(),
        compound.hole_count()
    )?;
    if let Some(bounds) = compound.bounds() {
        writeln!(out, "范围: {}", format_bounds(&bounds))?;
    }
    for report in reports {
        writeln!(
            out,
            "面 #{}: 外环 {} 条边，内环 {}，范围 {}",
            report.index,
            report.outer_edges,
            report.holes,
            format_bounds(&report.bounds)
        )?;
        for issue in &report.issues {
            writeln!(out, "  问题: {issue}")?;
        }
    }
    writeln!(
        out,
        "统计: 接受 {}，退化 {}，重复 {}，不支持 {}，无效 {}，拒绝边 {}，未闭合 {}",
        stats.primitives_accepted,
        stats.degenerate_skipped,
        stats.duplicates_skipped,
        stats.unsupported_skipped,
        stats.malformed_skipped,
        stats.rejected_edges,
        stats.open_chains
    )?;
    if stats.truncated {
        writeln!(out, "警告: 文件数据损坏，读取提前结束")?;
    }
    Ok(())
}

fn format_bounds(bounds: &Bounds2D) -> String {
    let (min, max) = (bounds.min(), bounds.max());
    format!(
        "({:.3}, {:.3}) - ({:.3}, {:.3})",
        min.x(),
        min.y(),
        max.x(),
        max.y()
    )
}
