//! 线框装配：按实体索引的文件顺序回放一个组，产出外环与内环。
//!
//! 直线、多段线、圆弧与样条共用同一条正在构造的链；圆各自成为独立的闭环。
//! 内核报告的构边或连边失败只记录警告，装配继续使用已加入的边。

use std::f64::consts::TAU;

use dxfface_core::geometry::Point2;
use dxfface_core::kernel::{KernelError, ShapeBuilder, WireBuilder, spline_parameter_range};
use dxfface_core::primitive::{Arc, Circle, Polyline, Spline};
use dxfface_core::shape::{Orientation, Wire};
use tracing::{debug, warn};

use crate::group::{GroupState, PrimitiveRef};

/// 内环是否需要反向。
///
/// 每个内环都与外环绕向相反，不只是第一个。外环绕向可判定时按几何结果决定；
/// 外环退化（面积为零）或内环本身退化时退回到圆弧标志：主链因圆弧整体反向后
/// 内环保持逆时针构造方向，否则翻转。更换规则只需替换此函数。
pub fn inner_loop_needs_reversal(outer: Orientation, hole: Orientation, chain_reversed: bool) -> bool {
    let target = outer.opposite();
    if target == Orientation::Degenerate || hole == Orientation::Degenerate {
        return !chain_reversed;
    }
    hole != target
}

/// 一个组装配后的结果。`loops[0]` 为外环，其余为内环。
#[derive(Debug, Default)]
pub struct AssembledGroup {
    pub loops: Vec<Wire>,
    pub rejected_edges: usize,
    /// 主链存在但未闭合。
    pub open_chain: bool,
    pub chain_reversed: bool,
}

impl AssembledGroup {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

pub struct WireAssembler<'k, K: ShapeBuilder + ?Sized> {
    kernel: &'k K,
}

// 单个组装配期间的可变状态。
struct ChainState {
    chain: WireBuilder,
    needs_reversal: bool,
    circles: Vec<Wire>,
    rejected_edges: usize,
}

impl<'k, K: ShapeBuilder + ?Sized> WireAssembler<'k, K> {
    pub fn new(kernel: &'k K) -> Self {
        Self { kernel }
    }

    /// 消费组状态。空组返回空结果。
    pub fn assemble(&self, group: GroupState) -> AssembledGroup {
        if group.is_empty() {
            return AssembledGroup::default();
        }

        let mut state = ChainState {
            chain: self.kernel.wire_builder(),
            needs_reversal: false,
            circles: Vec::new(),
            rejected_edges: 0,
        };

        for entry in group.index().iter() {
            match group.get(*entry) {
                Some(PrimitiveRef::Line(line)) => {
                    self.append_segment(&mut state, line.start, line.end);
                }
                Some(PrimitiveRef::Polyline(polyline)) => self.append_polyline(&mut state, polyline),
                Some(PrimitiveRef::Arc(arc)) => self.append_arc(&mut state, arc),
                Some(PrimitiveRef::Spline(spline)) => self.append_spline(&mut state, spline),
                Some(PrimitiveRef::Circle(circle)) => self.append_circle(&mut state, circle),
                None => {
                    warn!(kind = %entry.kind, position = entry.position, "实体索引指向不存在的图元");
                }
            }
        }

        self.finalize(state)
    }

    fn finalize(&self, state: ChainState) -> AssembledGroup {
        let ChainState {
            chain,
            needs_reversal,
            circles,
            rejected_edges,
        } = state;
        let tolerance = self.kernel.tolerance();
        let mut loops = Vec::with_capacity(circles.len() + 1);
        let mut open_chain = false;
        let mut chain_reversed = false;

        if !chain.is_empty() {
            match chain.finish() {
                Ok(wire) => {
                    if !wire.is_closed(tolerance) {
                        open_chain = true;
                        warn!(
                            edges = wire.len(),
                            "主链未闭合，生成的外环可能无效"
                        );
                    }
                    let wire = if needs_reversal {
                        chain_reversed = true;
                        wire.reversed()
                    } else {
                        wire
                    };
                    loops.push(wire);
                }
                Err(err) => warn!(error = %err, "主链无法生成线框"),
            }
        }

        let mut outer_orientation = loops.first().map(Wire::orientation);
        for circle in circles {
            let Some(outer) = outer_orientation else {
                outer_orientation = Some(circle.orientation());
                loops.push(circle);
                continue;
            };
            if inner_loop_needs_reversal(outer, circle.orientation(), chain_reversed) {
                loops.push(circle.reversed());
            } else {
                loops.push(circle);
            }
        }

        debug!(
            loops = loops.len(),
            rejected_edges,
            chain_reversed,
            "组线框装配完成"
        );
        AssembledGroup {
            loops,
            rejected_edges,
            open_chain,
            chain_reversed,
        }
    }

    fn append_segment(&self, state: &mut ChainState, start: Point2, end: Point2) -> bool {
        let result = self
            .kernel
            .make_edge_from_points(start, end)
            .and_then(|edge| state.chain.add(edge));
        self.record(state, result)
    }

    fn append_polyline(&self, state: &mut ChainState, polyline: &Polyline) {
        for (start, end) in polyline.cyclic_segments() {
            self.append_segment(state, start, end);
        }
    }

    fn append_arc(&self, state: &mut ChainState, arc: &Arc) {
        let result = self
            .kernel
            .make_edge_from_arc(
                arc.center,
                arc.radius,
                arc.start_angle_radians(),
                arc.end_angle_radians(),
            )
            .and_then(|edge| state.chain.add(edge));
        if self.record(state, result) {
            state.needs_reversal = true;
        }
    }

    fn append_spline(&self, state: &mut ChainState, spline: &Spline) {
        let samples = match self.sample_spline(spline) {
            Ok(samples) => samples,
            Err(err) => {
                warn!(degree = spline.degree, error = %err, "样条求值失败，已跳过");
                state.rejected_edges += 1;
                return;
            }
        };
        debug!(samples = samples.len(), "样条按折线近似");
        for pair in samples.windows(2) {
            self.append_segment(state, pair[0], pair[1]);
        }
    }

    fn append_circle(&self, state: &mut ChainState, circle: &Circle) {
        let wire = self
            .kernel
            .make_edge_from_arc(circle.center, circle.radius, 0.0, TAU)
            .and_then(|edge| self.kernel.make_wire_from_edges(vec![edge]));
        match wire {
            Ok(wire) => state.circles.push(wire),
            Err(err) => {
                warn!(radius = circle.radius, error = %err, "圆无法生成闭环");
                state.rejected_edges += 1;
            }
        }
    }

    /// 在参数域上均匀取 `控制点数 + 2` 个参数求值，去掉相邻重合的采样点。
    fn sample_spline(&self, spline: &Spline) -> Result<Vec<Point2>, KernelError> {
        let degree = usize::try_from(spline.degree)
            .map_err(|_| KernelError::InvalidSpline(format!("阶数 {} 无效", spline.degree)))?;
        let (u_min, u_max) =
            spline_parameter_range(degree, &spline.knots, spline.control_points.len())?;
        let count = spline.sample_count();
        let tolerance = self.kernel.tolerance();

        let mut samples: Vec<Point2> = Vec::with_capacity(count);
        for i in 0..count {
            let u = u_min + (u_max - u_min) * (i as f64 / (count - 1) as f64);
            let point =
                self.kernel
                    .evaluate_bspline(degree, &spline.knots, &spline.control_points, u)?;
            if samples.last().is_some_and(|last| last.is_near(point, tolerance)) {
                continue;
            }
            samples.push(point);
        }
        Ok(samples)
    }

    fn record(&self, state: &mut ChainState, result: Result<(), KernelError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                state.rejected_edges += 1;
                warn!(error = %err, edges = state.chain.len(), "边无法加入线框，继续使用已有的边");
                false
            }
        }
    }
}
