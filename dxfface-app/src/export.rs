use std::fs;
use std::path::{Path, PathBuf};

use dxfface_core::shape::Compound;
use dxfface_engine::stats::ConversionStats;
use serde::Serialize;
use thiserror::Error;

use crate::summary::FaceReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("序列化复合体失败: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("写入文件 {path:?} 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 导出的 JSON 文档：源文件、复合体、转换统计与面检查结果。
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub source: String,
    pub compound: &'a Compound,
    pub stats: &'a ConversionStats,
    pub reports: &'a [FaceReport],
}

impl<'a> ExportDocument<'a> {
    pub fn new(
        source: &Path,
        compound: &'a Compound,
        stats: &'a ConversionStats,
        reports: &'a [FaceReport],
    ) -> Self {
        Self {
            source: source.display().to_string(),
            compound,
            stats,
            reports,
        }
    }
}

pub fn write_json(path: &Path, document: &ExportDocument<'_>, pretty: bool) -> Result<(), ExportError> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    fs::write(path, json).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfface_config::ConversionConfig;
    use dxfface_core::geometry::Point2;
    use dxfface_core::kernel::{PlanarKernel, ShapeBuilder};
    use serde_json::Value;
    use std::f64::consts::TAU;

    fn disc() -> Compound {
        let kernel = PlanarKernel::new();
        let edge = kernel
            .make_edge_from_arc(Point2::new(1.0, 2.0), 3.0, 0.0, TAU)
            .expect("circle");
        let wire = kernel.make_wire_from_edges(vec![edge]).expect("wire");
        let face = kernel
            .make_face_from_wire_with_holes(wire, Vec::new())
            .expect("face");
        kernel.make_compound_from_faces(vec![face])
    }

    #[test]
    fn writes_compound_and_stats() {
        let compound = disc();
        let stats = ConversionStats {
            faces: 1,
            groups_completed: 1,
            ..ConversionStats::default()
        };
        let reports = FaceReport::collect(&compound, &ConversionConfig::default());
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("disc.json");

        let document = ExportDocument::new(Path::new("disc.dxf"), &compound, &stats, &reports);
        write_json(&path, &document, false).expect("write json");

        let value: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(value["source"], "disc.dxf");
        assert_eq!(value["stats"]["faces"], 1);
        let edge = &value["compound"]["faces"][0]["outer"]["edges"][0];
        assert_eq!(edge["kind"], "arc");
        assert_eq!(edge["radius"], 3.0);
        assert_eq!(edge["center"], serde_json::json!([1.0, 2.0]));
        assert_eq!(value["reports"][0]["issues"], serde_json::json!([]));
    }

    #[test]
    fn unwritable_path_is_reported() {
        let compound = disc();
        let stats = ConversionStats::default();
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("out.json");
        let document = ExportDocument::new(Path::new("disc.dxf"), &compound, &stats, &[]);
        assert!(matches!(
            write_json(&path, &document, true),
            Err(ExportError::Write { .. })
        ));
    }
}
