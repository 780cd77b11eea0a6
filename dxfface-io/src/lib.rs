use std::fs;
use std::path::{Path, PathBuf};

use dxfface_core::kernel::{PlanarKernel, ShapeBuilder};
use dxfface_core::shape::Compound;
use dxfface_engine::pipeline::ReconstructionPipeline;
use dxfface_engine::stats::ConversionStats;
use thiserror::Error;
use tracing::{debug, info, warn};

mod parser;
mod reader;

use parser::{DxfParser, ParseEvent};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 从文件重建复合体的统一入口。
pub trait CompoundLoader {
    fn load(&self, path: &Path) -> Result<Compound, IoError>;
}

/// DXF 到平面带孔面的转换器。
///
/// `convert` 只在文件无法打开或读取时失败；几何问题记录为警告并反映在
/// [`ConversionStats`] 中。成功转换后可通过 `compound` 取得结果。
pub struct DxfConverter<K: ShapeBuilder = PlanarKernel> {
    kernel: K,
    compound: Option<Compound>,
    stats: ConversionStats,
}

impl DxfConverter {
    pub fn new() -> Self {
        Self::with_kernel(PlanarKernel::new())
    }
}

impl Default for DxfConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ShapeBuilder> DxfConverter<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            compound: None,
            stats: ConversionStats::default(),
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn convert(&mut self, path: &Path) -> Result<&Compound, IoError> {
        self.compound = None;
        self.stats = ConversionStats::default();
        let source = read_source(path)?;
        info!(path = %path.display(), "开始转换 DXF");
        Ok(self.convert_source(&source))
    }

    /// 对内存中的 DXF 文本执行同样的转换流程。
    pub fn convert_source(&mut self, source: &str) -> &Compound {
        let (compound, stats) = reconstruct(&self.kernel, source);
        self.stats = stats;
        self.compound.insert(compound)
    }

    /// 最近一次成功转换的结果。
    pub fn compound(&self) -> Option<&Compound> {
        self.compound.as_ref()
    }

    pub fn into_compound(self) -> Option<Compound> {
        self.compound
    }

    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }
}

impl<K: ShapeBuilder> CompoundLoader for DxfConverter<K> {
    fn load(&self, path: &Path) -> Result<Compound, IoError> {
        let source = read_source(path)?;
        let (compound, _) = reconstruct(&self.kernel, &source);
        Ok(compound)
    }
}

fn read_source(path: &Path) -> Result<String, IoError> {
    let bytes = fs::read(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn reconstruct<K: ShapeBuilder + ?Sized>(kernel: &K, source: &str) -> (Compound, ConversionStats) {
    let mut pipeline = ReconstructionPipeline::new(kernel);
    let mut parser = DxfParser::new(source);
    loop {
        match parser.next_event() {
            Ok(Some(ParseEvent::Primitive(primitive))) => {
                pipeline.push(primitive);
            }
            Ok(Some(ParseEvent::EndOfGroup)) => pipeline.end_group(),
            Ok(Some(ParseEvent::Unsupported(entity))) => {
                debug!(entity = %entity, "跳过不参与重建的实体");
                pipeline.stats_mut().unsupported_skipped += 1;
            }
            Ok(Some(ParseEvent::Malformed {
                kind,
                line,
                message,
            })) => {
                warn!(kind = %kind, line, error = %message, "实体数据无效，已跳过");
                pipeline.stats_mut().malformed_skipped += 1;
            }
            Ok(None) => break,
            Err(err) => {
                warn!(
                    line = parser.line_number(),
                    error = %err,
                    "DXF 数据损坏，停止读取并保留已重建的结果"
                );
                pipeline.stats_mut().truncated = true;
                break;
            }
        }
    }
    pipeline.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_is_none_before_conversion() {
        let converter = DxfConverter::new();
        assert!(converter.compound().is_none());
        assert_eq!(converter.stats(), &ConversionStats::default());
    }

    #[test]
    fn missing_file_fails_without_compound() {
        let mut converter = DxfConverter::new();
        converter.convert_source("0\nCIRCLE\n10\n0\n20\n0\n40\n1\n0\nEOF\n");
        assert!(converter.compound().is_some());

        let err = converter
            .convert(Path::new("/nonexistent/definitely-missing.dxf"))
            .expect_err("missing file must fail");
        assert!(matches!(err, IoError::ReadError { .. }));
        assert!(converter.compound().is_none());
    }

    #[test]
    fn truncated_stream_keeps_built_groups() {
        let mut converter = DxfConverter::new();
        let compound = converter.convert_source(
            "0\nCIRCLE\n10\n0\n20\n0\n40\n1\n0\nENDSEC\n0\nCIRCLE\n10\n",
        );
        assert_eq!(compound.len(), 1);
        assert!(converter.stats().truncated);
        assert_eq!(converter.stats().groups_completed, 1);
    }
}
