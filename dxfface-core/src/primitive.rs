//! DXF 解析得到的二维图元记录。
//!
//! 每个记录在解析完成后即不可变；`PartialEq` 用于组内去重，
//! `is_degenerate` 用于丢弃无法构成边的图元。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Line,
    Circle,
    Arc,
    Polyline,
    Spline,
}

impl PrimitiveKind {
    /// DXF 中对应的实体关键字（组码 0 的值）。
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Line => "LINE",
            PrimitiveKind::Circle => "CIRCLE",
            PrimitiveKind::Arc => "ARC",
            PrimitiveKind::Polyline => "POLYLINE",
            PrimitiveKind::Spline => "SPLINE",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "LINE" => Some(PrimitiveKind::Line),
            "CIRCLE" => Some(PrimitiveKind::Circle),
            "ARC" => Some(PrimitiveKind::Arc),
            "POLYLINE" => Some(PrimitiveKind::Polyline),
            "SPLINE" => Some(PrimitiveKind::Spline),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    #[inline]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 起点与终点完全相同的线段长度为零。
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    #[inline]
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.radius.is_finite() && self.radius > 0.0)
    }
}

/// 圆弧记录。角度保持 DXF 原始单位（度），构边时再换算为弧度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Arc {
    #[inline]
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    #[inline]
    pub fn start_angle_radians(&self) -> f64 {
        self.start_angle.to_radians()
    }

    #[inline]
    pub fn end_angle_radians(&self) -> f64 {
        self.end_angle.to_radians()
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        Circle::new(self.center, self.radius).is_degenerate() || self.start_angle == self.end_angle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point2,
}

impl Vertex {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Vertex>,
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加顶点；与已有顶点完全重合时忽略并返回 `false`。
    pub fn push_vertex(&mut self, vertex: Vertex) -> bool {
        if self.vertices.contains(&vertex) {
            return false;
        }
        self.vertices.push(vertex);
        true
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 2
    }

    /// 首尾相接的线段序列：顶点 i 连向顶点 (i + 1) mod n。
    pub fn cyclic_segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let count = self.vertices.len();
        (0..count).map(move |i| {
            (
                self.vertices[i].position,
                self.vertices[(i + 1) % count].position,
            )
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    pub degree: i32,
    pub knot_count: i32,
    pub control_point_count: i32,
    pub fit_point_count: i32,
    pub normal: Vector3,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point2>,
    pub fit_points: Vec<Point2>,
}

impl Spline {
    /// 没有节点或控制点的样条无法求值。
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.knots.is_empty() || self.control_points.is_empty()
    }

    /// 法向未指定（全零）或与 Z 轴平行时视为位于工作平面内。
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.normal.is_zero() || self.normal.is_along_z()
    }

    /// 折线近似使用的采样点数量。
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.control_points.len() + 2
    }

    /// 清空几何数据，使记录成为退化样条。
    pub fn clear_geometry(&mut self) {
        self.knot_count = 0;
        self.control_point_count = 0;
        self.fit_point_count = 0;
        self.knots.clear();
        self.control_points.clear();
        self.fit_points.clear();
    }
}

/// 解析器产出的任意图元。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Line(Line),
    Circle(Circle),
    Arc(Arc),
    Polyline(Polyline),
    Spline(Spline),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Line(_) => PrimitiveKind::Line,
            Primitive::Circle(_) => PrimitiveKind::Circle,
            Primitive::Arc(_) => PrimitiveKind::Arc,
            Primitive::Polyline(_) => PrimitiveKind::Polyline,
            Primitive::Spline(_) => PrimitiveKind::Spline,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        match self {
            Primitive::Line(line) => line.is_degenerate(),
            Primitive::Circle(circle) => circle.is_degenerate(),
            Primitive::Arc(arc) => arc.is_degenerate(),
            Primitive::Polyline(polyline) => polyline.is_degenerate(),
            Primitive::Spline(spline) => spline.is_degenerate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn line_equality_and_degeneracy() {
        let a = Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let b = Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let reversed = Line::new(Point2::new(1.0, 0.0), Point2::new(0.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, reversed);
        assert!(!a.is_degenerate());
        assert!(Line::new(Point2::new(2.0, 2.0), Point2::new(2.0, 2.0)).is_degenerate());
    }

    #[test]
    fn circle_and_arc_degeneracy() {
        assert!(Circle::new(Point2::new(0.0, 0.0), 0.0).is_degenerate());
        assert!(Circle::new(Point2::new(0.0, 0.0), f64::NAN).is_degenerate());
        assert!(!Circle::new(Point2::new(0.0, 0.0), 1.5).is_degenerate());

        let arc = Arc::new(Point2::new(0.0, 0.0), 1.0, 0.0, 90.0);
        assert!(!arc.is_degenerate());
        assert!((arc.end_angle_radians() - FRAC_PI_2).abs() < 1e-12);
        assert!(Arc::new(Point2::new(0.0, 0.0), 1.0, 45.0, 45.0).is_degenerate());
        assert!(Arc::new(Point2::new(0.0, 0.0), 0.0, 0.0, 90.0).is_degenerate());
    }

    #[test]
    fn polyline_skips_repeated_vertices() {
        let mut polyline = Polyline::new();
        assert!(polyline.push_vertex(Vertex::new(0.0, 0.0)));
        assert!(polyline.is_degenerate());
        assert!(polyline.push_vertex(Vertex::new(1.0, 0.0)));
        assert!(!polyline.push_vertex(Vertex::new(0.0, 0.0)));
        assert!(polyline.push_vertex(Vertex::new(1.0, 1.0)));
        assert_eq!(polyline.vertices.len(), 3);

        let segments: Vec<_> = polyline.cyclic_segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2], (Point2::new(1.0, 1.0), Point2::new(0.0, 0.0)));
    }

    #[test]
    fn spline_degeneracy_and_planarity() {
        let mut spline = Spline {
            degree: 1,
            knot_count: 4,
            control_point_count: 2,
            knots: vec![0.0, 0.0, 1.0, 1.0],
            control_points: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            ..Spline::default()
        };
        assert!(!spline.is_degenerate());
        assert!(spline.is_planar());
        assert_eq!(spline.sample_count(), 4);

        spline.normal = Vector3::new(1.0, 0.0, 0.0);
        assert!(!spline.is_planar());

        spline.clear_geometry();
        assert!(spline.is_degenerate());
    }

    #[test]
    fn keywords_round_trip_through_kind() {
        for kind in [
            PrimitiveKind::Line,
            PrimitiveKind::Circle,
            PrimitiveKind::Arc,
            PrimitiveKind::Polyline,
            PrimitiveKind::Spline,
        ] {
            assert_eq!(PrimitiveKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_keyword("ELLIPSE"), None);
    }
}
