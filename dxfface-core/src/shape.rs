//! 平面拓扑：边、线框（环）、带孔面与复合体。

use std::f64::consts::TAU;
use std::fmt;

use serde::Serialize;

use crate::geometry::{Bounds2D, Point2};
use crate::precision::{ARC_SAMPLES_PER_TURN, COMPUTATIONAL};

/// 有向边。圆弧以起始角与带符号扫掠角表示，正值为逆时针。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edge {
    Segment {
        start: Point2,
        end: Point2,
    },
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
}

impl Edge {
    pub fn start(&self) -> Point2 {
        match *self {
            Edge::Segment { start, .. } => start,
            Edge::Arc {
                center,
                radius,
                start_angle,
                ..
            } => Point2::on_circle(center, radius, start_angle),
        }
    }

    pub fn end(&self) -> Point2 {
        match *self {
            Edge::Segment { end, .. } => end,
            Edge::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Point2::on_circle(center, radius, start_angle + sweep),
        }
    }

    /// 圆弧终止角（弧度），直线段返回 `None`。
    pub fn end_angle(&self) -> Option<f64> {
        match *self {
            Edge::Segment { .. } => None,
            Edge::Arc {
                start_angle, sweep, ..
            } => Some(start_angle + sweep),
        }
    }

    pub fn is_counter_clockwise(&self) -> bool {
        matches!(*self, Edge::Arc { sweep, .. } if sweep > 0.0)
    }

    /// 反向遍历的同一条边。
    pub fn reversed(&self) -> Edge {
        match *self {
            Edge::Segment { start, end } => Edge::Segment {
                start: end,
                end: start,
            },
            Edge::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Edge::Arc {
                center,
                radius,
                start_angle: start_angle + sweep,
                sweep: -sweep,
            },
        }
    }

    /// 首尾重合的边（整圆）自身即构成闭环。
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match *self {
            Edge::Segment { .. } => false,
            Edge::Arc { .. } => self.start().is_near(self.end(), tolerance),
        }
    }

    /// 沿边方向的折线近似，包含起点与终点。
    pub fn sample(&self) -> Vec<Point2> {
        match *self {
            Edge::Segment { start, end } => vec![start, end],
            Edge::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                let steps = ((sweep.abs() / TAU) * ARC_SAMPLES_PER_TURN as f64)
                    .ceil()
                    .max(1.0) as usize;
                (0..=steps)
                    .map(|i| {
                        let angle = start_angle + sweep * (i as f64 / steps as f64);
                        Point2::on_circle(center, radius, angle)
                    })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Degenerate,
}

impl Orientation {
    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::CounterClockwise => Orientation::Clockwise,
            Orientation::Clockwise => Orientation::CounterClockwise,
            Orientation::Degenerate => Orientation::Degenerate,
        }
    }
}

/// 首尾相接的有序边序列。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Wire {
    edges: Vec<Edge>,
}

impl Wire {
    /// 直接以边序列构造；连通性由调用方（通常是 `WireBuilder`）保证。
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn start(&self) -> Option<Point2> {
        self.edges.first().map(Edge::start)
    }

    pub fn end(&self) -> Option<Point2> {
        self.edges.last().map(Edge::end)
    }

    /// 相邻边首尾相接，且最后一条边回到第一条边的起点。
    pub fn is_closed(&self, tolerance: f64) -> bool {
        let (Some(start), Some(end)) = (self.start(), self.end()) else {
            return false;
        };
        let connected = self
            .edges
            .windows(2)
            .all(|pair| pair[0].end().is_near(pair[1].start(), tolerance));
        connected && end.is_near(start, tolerance)
    }

    /// 反转整条线框：边的顺序与每条边的方向同时翻转。
    pub fn reversed(self) -> Wire {
        Wire {
            edges: self.edges.iter().rev().map(Edge::reversed).collect(),
        }
    }

    /// 有向面积（鞋带公式，圆弧按折线近似），逆时针为正。
    pub fn signed_area(&self) -> f64 {
        let mut ring: Vec<Point2> = Vec::new();
        for edge in &self.edges {
            let samples = edge.sample();
            ring.extend_from_slice(&samples[..samples.len() - 1]);
        }
        if ring.len() < 3 {
            return 0.0;
        }
        let doubled: f64 = ring
            .iter()
            .zip(ring.iter().cycle().skip(1))
            .map(|(a, b)| a.x() * b.y() - b.x() * a.y())
            .sum();
        doubled * 0.5
    }

    pub fn orientation(&self) -> Orientation {
        let area = self.signed_area();
        if area > COMPUTATIONAL {
            Orientation::CounterClockwise
        } else if area < -COMPUTATIONAL {
            Orientation::Clockwise
        } else {
            Orientation::Degenerate
        }
    }

    pub fn bounds(&self) -> Bounds2D {
        let mut bounds = Bounds2D::empty();
        for edge in &self.edges {
            for point in edge.sample() {
                bounds.include_point(point);
            }
        }
        bounds
    }
}

/// 面检查发现的问题；仅用于报告，不阻止面的构造。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum FaceIssue {
    OpenOuterLoop,
    DegenerateOuterLoop,
    OpenHole { index: usize },
    HoleWindingMatchesOuter { index: usize },
}

impl fmt::Display for FaceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceIssue::OpenOuterLoop => write!(f, "外环未闭合"),
            FaceIssue::DegenerateOuterLoop => write!(f, "外环面积为零"),
            FaceIssue::OpenHole { index } => write!(f, "内环 #{index} 未闭合"),
            FaceIssue::HoleWindingMatchesOuter { index } => {
                write!(f, "内环 #{index} 与外环绕向相同")
            }
        }
    }
}

/// 平面带孔面：一个外环加若干内环，内环绕向应与外环相反。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Face {
    outer: Wire,
    holes: Vec<Wire>,
}

impl Face {
    pub fn new(outer: Wire, holes: Vec<Wire>) -> Self {
        Self { outer, holes }
    }

    #[inline]
    pub fn outer(&self) -> &Wire {
        &self.outer
    }

    #[inline]
    pub fn holes(&self) -> &[Wire] {
        &self.holes
    }

    pub fn bounds(&self) -> Bounds2D {
        self.outer.bounds()
    }

    pub fn check(&self, tolerance: f64) -> Vec<FaceIssue> {
        let mut issues = Vec::new();
        if !self.outer.is_closed(tolerance) {
            issues.push(FaceIssue::OpenOuterLoop);
        }
        let outer_orientation = self.outer.orientation();
        if outer_orientation == Orientation::Degenerate {
            issues.push(FaceIssue::DegenerateOuterLoop);
        }
        for (index, hole) in self.holes.iter().enumerate() {
            if !hole.is_closed(tolerance) {
                issues.push(FaceIssue::OpenHole { index });
            }
            if outer_orientation != Orientation::Degenerate
                && hole.orientation() == outer_orientation
            {
                issues.push(FaceIssue::HoleWindingMatchesOuter { index });
            }
        }
        issues
    }
}

/// 转换结果的根容器，构造后不再修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Compound {
    faces: Vec<Face>,
}

impl Compound {
    pub fn from_faces(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn hole_count(&self) -> usize {
        self.faces.iter().map(|face| face.holes().len()).sum()
    }

    pub fn bounds(&self) -> Option<Bounds2D> {
        let mut bounds = Bounds2D::empty();
        for face in &self.faces {
            bounds.include_bounds(&face.bounds());
        }
        if bounds.is_empty() { None } else { Some(bounds) }
    }
}
