use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use dxfface_core::shape::{Compound, Edge, Wire};
use dxfface_engine::stats::ConversionStats;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldenCompound {
    faces: Vec<GoldenFace>,
    stats: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenFace {
    outer: GoldenWire,
    holes: Vec<GoldenWire>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenWire {
    orientation: String,
    closed: bool,
    edges: Vec<String>,
}

impl GoldenCompound {
    fn from_compound(compound: &Compound, stats: &ConversionStats) -> Self {
        Self {
            faces: compound
                .faces()
                .iter()
                .map(|face| GoldenFace {
                    outer: GoldenWire::from_wire(face.outer()),
                    holes: face.holes().iter().map(GoldenWire::from_wire).collect(),
                })
                .collect(),
            stats: serde_json::to_value(stats).expect("序列化统计信息失败"),
        }
    }
}

impl GoldenWire {
    fn from_wire(wire: &Wire) -> Self {
        Self {
            orientation: format!("{:?}", wire.orientation()),
            closed: wire.is_closed(1e-7),
            edges: wire.edges().iter().map(edge_to_string).collect(),
        }
    }
}

// 浮点数统一保留 6 位小数，避免快照受末位舍入影响。
fn edge_to_string(edge: &Edge) -> String {
    match *edge {
        Edge::Segment { start, end } => format!(
            "segment ({:.6}, {:.6}) -> ({:.6}, {:.6})",
            start.x(),
            start.y(),
            end.x(),
            end.y()
        ),
        Edge::Arc {
            center,
            radius,
            start_angle,
            sweep,
        } => format!(
            "arc center ({:.6}, {:.6}) radius {:.6} start {:.6} sweep {:.6}",
            center.x(),
            center.y(),
            radius,
            start_angle,
            sweep
        ),
    }
}

pub fn assert_golden(name: &str, compound: &Compound, stats: &ConversionStats) {
    let snapshot = GoldenCompound::from_compound(compound, stats);
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenCompound = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if expected != snapshot {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前转换结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}
