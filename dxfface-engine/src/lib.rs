pub mod assembler;
pub mod builder;
pub mod group;
pub mod index;
pub mod pipeline;

pub mod stats {
    use serde::Serialize;

    /// 一次转换过程的计数汇总，便于日志与导出。
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct ConversionStats {
        pub groups_completed: usize,
        pub faces: usize,
        pub primitives_accepted: usize,
        pub degenerate_skipped: usize,
        pub duplicates_skipped: usize,
        pub unsupported_skipped: usize,
        pub malformed_skipped: usize,
        pub rejected_edges: usize,
        pub open_chains: usize,
        /// 读取因组码/值行损坏而提前停止。
        pub truncated: bool,
    }

    impl ConversionStats {
        /// 被丢弃的图元总数（退化、重复、不支持、格式错误）。
        pub fn skipped(&self) -> usize {
            self.degenerate_skipped
                + self.duplicates_skipped
                + self.unsupported_skipped
                + self.malformed_skipped
        }

        /// 是否存在需要调用方关注的几何问题。
        pub fn has_warnings(&self) -> bool {
            self.malformed_skipped > 0 || self.rejected_edges > 0 || self.open_chains > 0 || self.truncated
        }
    }

}
