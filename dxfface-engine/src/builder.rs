use dxfface_core::kernel::ShapeBuilder;
use dxfface_core::shape::{Compound, Face, Wire};
use tracing::{debug, warn};

/// 第一条环为外环，其余按顺序作为内环。没有环时不产生面。
pub fn build_face<K: ShapeBuilder + ?Sized>(kernel: &K, loops: Vec<Wire>) -> Option<Face> {
    let mut loops = loops.into_iter();
    let outer = loops.next()?;
    let holes: Vec<Wire> = loops.collect();
    let hole_count = holes.len();
    match kernel.make_face_from_wire_with_holes(outer, holes) {
        Ok(face) => {
            debug!(holes = hole_count, "已生成带孔面");
            Some(face)
        }
        Err(err) => {
            warn!(error = %err, "无法由线框生成面");
            None
        }
    }
}

/// 按组完成顺序累积面，结束时一次性交出复合体。
#[derive(Debug, Default)]
pub struct CompoundBuilder {
    faces: Vec<Face>,
}

impl CompoundBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn finish<K: ShapeBuilder + ?Sized>(self, kernel: &K) -> Compound {
        kernel.make_compound_from_faces(self.faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfface_core::geometry::Point2;
    use dxfface_core::kernel::PlanarKernel;

    fn square(kernel: &PlanarKernel, offset: f64) -> Wire {
        let corners = [
            Point2::new(offset, 0.0),
            Point2::new(offset + 1.0, 0.0),
            Point2::new(offset + 1.0, 1.0),
            Point2::new(offset, 1.0),
        ];
        let edges = (0..4)
            .map(|i| {
                kernel
                    .make_edge_from_points(corners[i], corners[(i + 1) % 4])
                    .expect("edge")
            })
            .collect();
        kernel.make_wire_from_edges(edges).expect("wire")
    }

    #[test]
    fn no_loops_means_no_face() {
        let kernel = PlanarKernel::new();
        assert!(build_face(&kernel, Vec::new()).is_none());
    }

    #[test]
    fn first_loop_is_outer_and_rest_are_holes() {
        let kernel = PlanarKernel::new();
        let outer = square(&kernel, 0.0);
        let hole_a = square(&kernel, 10.0).reversed();
        let hole_b = square(&kernel, 20.0).reversed();
        let face = build_face(&kernel, vec![outer.clone(), hole_a.clone(), hole_b.clone()])
            .expect("face");
        assert_eq!(face.outer(), &outer);
        assert_eq!(face.holes(), &[hole_a, hole_b]);
    }

    #[test]
    fn empty_outer_wire_is_dropped() {
        let kernel = PlanarKernel::new();
        assert!(build_face(&kernel, vec![Wire::default()]).is_none());
    }

    #[test]
    fn compound_keeps_face_order() {
        let kernel = PlanarKernel::new();
        let mut builder = CompoundBuilder::new();
        for offset in [0.0, 5.0] {
            let face = build_face(&kernel, vec![square(&kernel, offset)]).expect("face");
            builder.add_face(face);
        }
        assert_eq!(builder.face_count(), 2);
        let compound = builder.finish(&kernel);
        assert_eq!(compound.len(), 2);
        assert_eq!(compound.faces()[1].outer().start(), Some(Point2::new(5.0, 0.0)));
    }
}
