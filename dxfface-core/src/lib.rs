pub mod kernel;
pub mod precision;
pub mod primitive;
pub mod shape;

pub mod geometry {
    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，所有重建都在 XY 工作平面内完成。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        /// 圆上一点：`center + radius * (cos θ, sin θ)`。
        #[inline]
        pub fn on_circle(center: Point2, radius: f64, angle: f64) -> Self {
            Self(center.0 + DVec2::new(angle.cos(), angle.sin()) * radius)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        /// 判断两点在给定容差内是否重合。
        #[inline]
        pub fn is_near(self, other: Point2, tolerance: f64) -> bool {
            self.0.distance_squared(other.0) <= tolerance * tolerance
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        /// 二维叉积（z 分量），正值表示逆时针。
        #[inline]
        pub fn cross(self, other: Vector2) -> f64 {
            self.0.perp_dot(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 三维向量，目前只用于 SPLINE 的拉伸方向（组码 210/220/230）。
    #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector3(pub DVec3);

    impl Vector3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        /// 全零向量在 DXF 中代表“未指定”。
        #[inline]
        pub fn is_zero(self) -> bool {
            self.0 == DVec3::ZERO
        }

        /// 是否与工作平面法向（Z 轴）平行。
        #[inline]
        pub fn is_along_z(self) -> bool {
            self.0.x == 0.0 && self.0.y == 0.0
        }
    }

    impl From<DVec3> for Vector3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于估算面与复合体范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bounds_grow_with_points() {
            let mut bounds = Bounds2D::empty();
            assert!(bounds.is_empty());
            bounds.include_point(Point2::new(1.0, 2.0));
            bounds.include_point(Point2::new(-3.0, 5.0));
            assert!(!bounds.is_empty());
            assert!((bounds.min().x() + 3.0).abs() < 1e-12);
            assert!((bounds.max().y() - 5.0).abs() < 1e-12);
            assert!((bounds.width() - 4.0).abs() < 1e-12);
            assert!((bounds.height() - 3.0).abs() < 1e-12);
        }

        #[test]
        fn points_on_circle_and_proximity() {
            let center = Point2::new(1.0, 1.0);
            let p = Point2::on_circle(center, 2.0, std::f64::consts::FRAC_PI_2);
            assert!(p.is_near(Point2::new(1.0, 3.0), 1e-12));
            assert!(!p.is_near(Point2::new(1.0, 3.1), 1e-3));
            assert!((center.distance(p) - 2.0).abs() < 1e-12);
        }

        #[test]
        fn normal_alignment() {
            assert!(Vector3::default().is_zero());
            assert!(Vector3::new(0.0, 0.0, -1.0).is_along_z());
            assert!(!Vector3::new(0.0, 1.0, 0.0).is_along_z());
        }
    }
}
