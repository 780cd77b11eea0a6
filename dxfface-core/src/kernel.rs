//! 几何内核接口：重建流程只通过 `ShapeBuilder` 构造边、线框、面与复合体。
//!
//! `PlanarKernel` 是进程内的默认实现，只覆盖 XY 平面上的直线、圆弧与
//! 非有理 B 样条求值。

use std::f64::consts::TAU;

use thiserror::Error;

use crate::geometry::Point2;
use crate::precision::{COMPUTATIONAL, CONFUSION};
use crate::shape::{Compound, Edge, Face, Wire};

#[derive(Debug, Error, PartialEq)]
pub enum KernelError {
    #[error("退化边：起点与终点重合 ({x}, {y})")]
    DegenerateEdge { x: f64, y: f64 },
    #[error("圆弧半径无效：{0}")]
    InvalidRadius(f64),
    #[error("边与当前线框不相连（边起点 ({x}, {y})）")]
    DisconnectedEdge { x: f64, y: f64 },
    #[error("线框为空")]
    EmptyWire,
    #[error("样条无效：{0}")]
    InvalidSpline(String),
}

/// 重建流程依赖的最小内核接口。
pub trait ShapeBuilder {
    /// 点重合判定使用的距离容差。
    fn tolerance(&self) -> f64;

    fn make_edge_from_points(&self, start: Point2, end: Point2) -> Result<Edge, KernelError>;

    /// 逆时针圆弧；角度单位为弧度，`0..2π` 表示整圆。
    fn make_edge_from_arc(
        &self,
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Edge, KernelError>;

    fn wire_builder(&self) -> WireBuilder {
        WireBuilder::new(self.tolerance())
    }

    fn make_wire_from_edges(&self, edges: Vec<Edge>) -> Result<Wire, KernelError> {
        let mut builder = self.wire_builder();
        for edge in edges {
            builder.add(edge)?;
        }
        builder.finish()
    }

    fn make_face_from_wire_with_holes(
        &self,
        outer: Wire,
        holes: Vec<Wire>,
    ) -> Result<Face, KernelError> {
        if outer.is_empty() {
            return Err(KernelError::EmptyWire);
        }
        Ok(Face::new(outer, holes))
    }

    fn make_compound_from_faces(&self, faces: Vec<Face>) -> Compound {
        Compound::from_faces(faces)
    }

    /// 在参数 `u` 处对非有理 B 样条求值（de Boor 算法）。
    fn evaluate_bspline(
        &self,
        degree: usize,
        knots: &[f64],
        control_points: &[Point2],
        u: f64,
    ) -> Result<Point2, KernelError> {
        evaluate_bspline(degree, knots, control_points, u)
    }
}

/// 默认的平面内核。
#[derive(Debug, Clone, Copy)]
pub struct PlanarKernel {
    tolerance: f64,
}

impl PlanarKernel {
    pub fn new() -> Self {
        Self {
            tolerance: CONFUSION,
        }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            CONFUSION
        };
        Self { tolerance }
    }
}

impl Default for PlanarKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeBuilder for PlanarKernel {
    fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn make_edge_from_points(&self, start: Point2, end: Point2) -> Result<Edge, KernelError> {
        if start.is_near(end, self.tolerance) {
            return Err(KernelError::DegenerateEdge {
                x: start.x(),
                y: start.y(),
            });
        }
        Ok(Edge::Segment { start, end })
    }

    fn make_edge_from_arc(
        &self,
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Edge, KernelError> {
        if !(radius.is_finite() && radius > self.tolerance) {
            return Err(KernelError::InvalidRadius(radius));
        }
        let mut sweep = (end_angle - start_angle) % TAU;
        if sweep <= COMPUTATIONAL {
            sweep += TAU;
        }
        Ok(Edge::Arc {
            center,
            radius,
            start_angle,
            sweep,
        })
    }
}

/// 增量式线框构造器。
///
/// 第一条边总是被接受；之后的边必须与链的末端或起点共享顶点，
/// 必要时自动反向。无法连接的边返回 `DisconnectedEdge` 且不会被加入。
#[derive(Debug, Clone)]
pub struct WireBuilder {
    tolerance: f64,
    edges: Vec<Edge>,
}

impl WireBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            edges: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn add(&mut self, edge: Edge) -> Result<(), KernelError> {
        let (Some(head), Some(tail)) = (
            self.edges.first().map(Edge::start),
            self.edges.last().map(Edge::end),
        ) else {
            self.edges.push(edge);
            return Ok(());
        };

        let tol = self.tolerance;
        if edge.start().is_near(tail, tol) {
            self.edges.push(edge);
        } else if edge.end().is_near(tail, tol) {
            self.edges.push(edge.reversed());
        } else if edge.end().is_near(head, tol) {
            self.edges.insert(0, edge);
        } else if edge.start().is_near(head, tol) {
            self.edges.insert(0, edge.reversed());
        } else {
            let start = edge.start();
            return Err(KernelError::DisconnectedEdge {
                x: start.x(),
                y: start.y(),
            });
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => last.end().is_near(first.start(), self.tolerance),
            _ => false,
        }
    }

    pub fn finish(self) -> Result<Wire, KernelError> {
        if self.edges.is_empty() {
            return Err(KernelError::EmptyWire);
        }
        Ok(Wire::new(self.edges))
    }
}

/// 样条参数域 `[U[p], U[n + 1]]`。
pub fn spline_parameter_range(
    degree: usize,
    knots: &[f64],
    control_point_count: usize,
) -> Result<(f64, f64), KernelError> {
    validate_spline(degree, knots, control_point_count)?;
    Ok((knots[degree], knots[control_point_count]))
}

pub fn evaluate_bspline(
    degree: usize,
    knots: &[f64],
    control_points: &[Point2],
    u: f64,
) -> Result<Point2, KernelError> {
    let (u_min, u_max) = spline_parameter_range(degree, knots, control_points.len())?;
    if !u.is_finite() {
        return Err(KernelError::InvalidSpline(format!("参数 {u} 不是有限数")));
    }
    if control_points
        .iter()
        .any(|point| !point.x().is_finite() || !point.y().is_finite())
    {
        return Err(KernelError::InvalidSpline("控制点含非有限坐标".to_string()));
    }
    let u = u.clamp(u_min, u_max);
    let span = find_span(degree, knots, control_points.len() - 1, u);

    let mut points: Vec<_> = (0..=degree)
        .map(|j| control_points[span - degree + j].as_vec2())
        .collect();
    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let left = knots[span - degree + j];
            let right = knots[span + 1 + j - r];
            let denominator = right - left;
            let alpha = if denominator.abs() <= COMPUTATIONAL {
                0.0
            } else {
                (u - left) / denominator
            };
            points[j] = points[j - 1] * (1.0 - alpha) + points[j] * alpha;
        }
    }
    Ok(Point2::from_vec(points[degree]))
}

fn validate_spline(
    degree: usize,
    knots: &[f64],
    control_point_count: usize,
) -> Result<(), KernelError> {
    if degree == 0 {
        return Err(KernelError::InvalidSpline("阶数必须至少为 1".to_string()));
    }
    if control_point_count <= degree {
        return Err(KernelError::InvalidSpline(format!(
            "{degree} 阶样条至少需要 {} 个控制点，实际 {control_point_count}",
            degree + 1
        )));
    }
    let expected = control_point_count + degree + 1;
    if knots.len() != expected {
        return Err(KernelError::InvalidSpline(format!(
            "节点数量应为 {expected}，实际 {}",
            knots.len()
        )));
    }
    if knots.iter().any(|knot| !knot.is_finite()) {
        return Err(KernelError::InvalidSpline("节点序列含非有限值".to_string()));
    }
    if knots.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(KernelError::InvalidSpline("节点序列不是非递减的".to_string()));
    }
    if knots[control_point_count] - knots[degree] <= COMPUTATIONAL {
        return Err(KernelError::InvalidSpline("参数域为空".to_string()));
    }
    Ok(())
}

/// 返回满足 `U[k] <= u < U[k + 1]` 的节点区间下标，`u` 位于域末端时取最后一个非空区间。
fn find_span(degree: usize, knots: &[f64], last: usize, u: f64) -> usize {
    if u >= knots[last + 1] {
        let mut span = last;
        while span > degree && knots[span] >= knots[last + 1] {
            span -= 1;
        }
        return span;
    }
    if u <= knots[degree] {
        let mut span = degree;
        while span < last && knots[span + 1] <= u {
            span += 1;
        }
        return span;
    }
    let mut low = degree;
    let mut high = last + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Orientation;
    use std::f64::consts::FRAC_PI_2;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn segment_edges_reject_coincident_points() {
        let kernel = PlanarKernel::new();
        assert!(kernel.make_edge_from_points(p(0.0, 0.0), p(1.0, 0.0)).is_ok());
        assert_eq!(
            kernel.make_edge_from_points(p(1.0, 1.0), p(1.0, 1.0)),
            Err(KernelError::DegenerateEdge { x: 1.0, y: 1.0 })
        );
    }

    #[test]
    fn arc_edges_sweep_counter_clockwise() {
        let kernel = PlanarKernel::new();
        let quarter = kernel
            .make_edge_from_arc(p(0.0, 0.0), 1.0, 0.0, FRAC_PI_2)
            .expect("quarter arc");
        match quarter {
            Edge::Arc {
                start_angle, sweep, ..
            } => {
                assert!(start_angle.abs() < 1e-12);
                assert!((sweep - FRAC_PI_2).abs() < 1e-12);
            }
            other => panic!("expected arc, got {other:?}"),
        }

        // 终止角小于起始角时仍逆时针绕行。
        let wrap = kernel
            .make_edge_from_arc(p(0.0, 0.0), 1.0, 270f64.to_radians(), 90f64.to_radians())
            .expect("wrapping arc");
        assert!(wrap.is_counter_clockwise());
        assert!(wrap.end().is_near(p(0.0, 1.0), 1e-9));

        let full = kernel
            .make_edge_from_arc(p(0.0, 0.0), 2.0, 0.0, TAU)
            .expect("full circle");
        assert!(full.is_closed(1e-9));

        assert_eq!(
            kernel.make_edge_from_arc(p(0.0, 0.0), 0.0, 0.0, 1.0),
            Err(KernelError::InvalidRadius(0.0))
        );
    }

    #[test]
    fn wire_builder_connects_reversed_and_prepended_edges() {
        let kernel = PlanarKernel::new();
        let mut builder = kernel.wire_builder();
        let e = |a: Point2, b: Point2| kernel.make_edge_from_points(a, b).expect("edge");

        builder.add(e(p(1.0, 0.0), p(1.0, 1.0))).expect("first");
        // 反向给出的边，末端与链尾相接
        builder.add(e(p(0.0, 1.0), p(1.0, 1.0))).expect("reversed");
        // 与链首相接的边
        builder.add(e(p(0.0, 0.0), p(1.0, 0.0))).expect("prepended");
        assert!(!builder.is_closed());
        builder.add(e(p(0.0, 1.0), p(0.0, 0.0))).expect("closing");
        assert!(builder.is_closed());

        let wire = builder.finish().expect("wire");
        assert_eq!(wire.len(), 4);
        assert!(wire.is_closed(1e-9));
        assert_eq!(wire.orientation(), Orientation::CounterClockwise);
    }

    #[test]
    fn wire_builder_rejects_disconnected_edge() {
        let kernel = PlanarKernel::new();
        let mut builder = kernel.wire_builder();
        builder
            .add(Edge::Segment {
                start: p(0.0, 0.0),
                end: p(1.0, 0.0),
            })
            .expect("first");
        let result = builder.add(Edge::Segment {
            start: p(5.0, 5.0),
            end: p(6.0, 5.0),
        });
        assert_eq!(result, Err(KernelError::DisconnectedEdge { x: 5.0, y: 5.0 }));
        assert_eq!(builder.len(), 1);
        assert_eq!(
            WireBuilder::new(CONFUSION).finish(),
            Err(KernelError::EmptyWire)
        );
    }

    #[test]
    fn face_requires_outer_loop() {
        let kernel = PlanarKernel::new();
        assert_eq!(
            kernel.make_face_from_wire_with_holes(Wire::default(), Vec::new()),
            Err(KernelError::EmptyWire)
        );
    }

    #[test]
    fn linear_bspline_interpolates_control_polygon() {
        let control = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0)];
        let knots = [0.0, 0.0, 0.5, 1.0, 1.0];
        let start = evaluate_bspline(1, &knots, &control, 0.0).expect("start");
        let middle = evaluate_bspline(1, &knots, &control, 0.5).expect("middle");
        let quarter = evaluate_bspline(1, &knots, &control, 0.25).expect("quarter");
        let end = evaluate_bspline(1, &knots, &control, 1.0).expect("end");
        assert!(start.is_near(p(0.0, 0.0), 1e-12));
        assert!(quarter.is_near(p(1.0, 0.0), 1e-12));
        assert!(middle.is_near(p(2.0, 0.0), 1e-12));
        assert!(end.is_near(p(2.0, 2.0), 1e-12));
    }

    #[test]
    fn clamped_quadratic_bspline_matches_bezier() {
        // 单段二次夹紧样条等价于二次 Bézier 曲线。
        let control = [p(0.0, 0.0), p(1.0, 2.0), p(2.0, 0.0)];
        let knots = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mid = evaluate_bspline(2, &knots, &control, 0.5).expect("mid");
        assert!(mid.is_near(p(1.0, 1.0), 1e-12));
        let (u0, u1) = spline_parameter_range(2, &knots, 3).expect("range");
        assert_eq!((u0, u1), (0.0, 1.0));
    }

    #[test]
    fn non_finite_spline_input_is_rejected() {
        let control = [p(0.0, 0.0), p(1.0, 1.0)];
        let nan_knots = [f64::NAN, f64::NAN, 1.0, 1.0];
        assert!(matches!(
            spline_parameter_range(1, &nan_knots, 2),
            Err(KernelError::InvalidSpline(_))
        ));
        assert!(matches!(
            evaluate_bspline(1, &nan_knots, &control, 0.5),
            Err(KernelError::InvalidSpline(_))
        ));
        assert!(matches!(
            evaluate_bspline(1, &[0.0, 0.0, f64::INFINITY, f64::INFINITY], &control, 0.5),
            Err(KernelError::InvalidSpline(_))
        ));

        let knots = [0.0, 0.0, 1.0, 1.0];
        assert!(matches!(
            evaluate_bspline(1, &knots, &[p(0.0, 0.0), p(f64::NAN, 1.0)], 0.5),
            Err(KernelError::InvalidSpline(_))
        ));
        assert!(matches!(
            evaluate_bspline(1, &knots, &control, f64::NAN),
            Err(KernelError::InvalidSpline(_))
        ));
    }

    #[test]
    fn invalid_knot_vectors_are_reported() {
        let control = [p(0.0, 0.0), p(1.0, 0.0)];
        assert!(matches!(
            evaluate_bspline(1, &[0.0, 1.0], &control, 0.5),
            Err(KernelError::InvalidSpline(_))
        ));
        assert!(matches!(
            evaluate_bspline(0, &[0.0, 1.0, 2.0], &control, 0.5),
            Err(KernelError::InvalidSpline(_))
        ));
        assert!(matches!(
            evaluate_bspline(1, &[0.0, 0.0, 0.0, 0.0], &control, 0.0),
            Err(KernelError::InvalidSpline(_))
        ));
    }
}
