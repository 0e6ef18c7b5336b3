//! Face segments between active elements.
//!
//! Every face is a maximal straight segment along which exactly one pair of
//! active elements meets (or one element meets the domain boundary). With
//! hanging nodes a large element side is split into as many faces as it has
//! small neighbours.
//!
//! Faces are found exactly in integer dyadic coordinates: with N = 2^L for
//! the deepest level L, every element side is an integer interval on a
//! *carrier* line, either a base edge or an interior grid line of a base
//! element. Sides on the "minus" side of a carrier are intersected with the
//! sides on its "plus" side.

use std::collections::BTreeMap;

use super::adaptive::AdaptiveMesh;
use super::boundary_markers::BoundaryMarker;
use super::cell::CellId;
use super::mesh2d::{ElementFace, Mesh2D};
use crate::polynomial::gauss_legendre;
use crate::types::{ElementIndex, FaceIndex};

/// A straight segment shared by one or two active elements.
#[derive(Clone, Debug)]
pub struct Face {
    /// Element the normal points out of
    pub minus: ElementIndex,
    /// Side (0-3) of the minus element containing the face
    pub minus_side: u8,
    /// Element on the other side, `None` on the boundary
    pub plus: Option<ElementIndex>,
    /// Face endpoints in the minus element's reference coordinates
    pub minus_ref: [(f64, f64); 2],
    /// Face endpoints in the plus element's reference coordinates
    /// (equal to `minus_ref` on the boundary)
    pub plus_ref: [(f64, f64); 2],
    /// Physical endpoints
    pub endpoints: [(f64, f64); 2],
    /// Unit normal pointing from minus to plus
    pub normal: (f64, f64),
    /// Physical length
    pub length: f64,
    /// Marker of the base edge for boundary faces
    pub marker: Option<BoundaryMarker>,
}

/// Gauss points of a face seen from both adjacent elements.
#[derive(Clone, Debug, Default)]
pub struct FaceQuadrature {
    /// Reference coordinates in the minus element
    pub minus_points: Vec<(f64, f64)>,
    /// Reference coordinates in the plus element
    pub plus_points: Vec<(f64, f64)>,
    /// Physical coordinates
    pub physical: Vec<(f64, f64)>,
    /// Weights scaled to the physical length
    pub weights: Vec<f64>,
}

impl FaceQuadrature {
    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the rule has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Face {
    /// Whether the face lies on the domain boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.plus.is_none()
    }

    /// Physical midpoint.
    pub fn midpoint(&self) -> (f64, f64) {
        let [a, b] = self.endpoints;
        (0.5 * (a.0 + b.0), 0.5 * (a.1 + b.1))
    }

    /// The element across the face from `e`.
    pub fn neighbor_of(&self, e: ElementIndex) -> Option<ElementIndex> {
        if self.minus == e {
            self.plus
        } else {
            Some(self.minus)
        }
    }

    /// Unit normal pointing out of element `e`.
    pub fn normal_from(&self, e: ElementIndex) -> (f64, f64) {
        if self.minus == e {
            self.normal
        } else {
            (-self.normal.0, -self.normal.1)
        }
    }

    /// Map a 1D Gauss rule on [-1, 1] onto the face.
    pub fn quadrature(&self, nodes: &[f64], weights: &[f64]) -> FaceQuadrature {
        let lerp = |ends: &[(f64, f64); 2], lambda: f64| {
            (
                ends[0].0 + lambda * (ends[1].0 - ends[0].0),
                ends[0].1 + lambda * (ends[1].1 - ends[0].1),
            )
        };
        let mut rule = FaceQuadrature {
            minus_points: Vec::with_capacity(nodes.len()),
            plus_points: Vec::with_capacity(nodes.len()),
            physical: Vec::with_capacity(nodes.len()),
            weights: Vec::with_capacity(nodes.len()),
        };
        for (&r, &w) in nodes.iter().zip(weights) {
            let lambda = 0.5 * (r + 1.0);
            rule.minus_points.push(lerp(&self.minus_ref, lambda));
            rule.plus_points.push(lerp(&self.plus_ref, lambda));
            rule.physical.push(lerp(&self.endpoints, lambda));
            rule.weights.push(0.5 * w * self.length);
        }
        rule
    }

    /// Face quadrature with `n_points` Gauss-Legendre points.
    pub fn gauss_quadrature(&self, n_points: usize) -> FaceQuadrature {
        let (nodes, weights) = gauss_legendre(n_points);
        self.quadrature(&nodes, &weights)
    }
}

/// All faces of an adaptive mesh with element-to-face adjacency.
#[derive(Clone, Debug)]
pub struct FaceSet {
    faces: Vec<Face>,
    element_faces: Vec<Vec<FaceIndex>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Carrier {
    /// Base edge, parametrized from its lower vertex index to the higher
    BaseEdge(usize),
    /// Grid line s = coord (vertical) or t = coord inside a base element
    Interior { base: u32, vertical: bool, coord: u64 },
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    lo: u64,
    hi: u64,
    element: ElementIndex,
    side: u8,
    orientation: i8,
}

#[derive(Default)]
struct CarrierSides {
    minus: Vec<Segment>,
    plus: Vec<Segment>,
}

impl FaceSet {
    /// Find all faces of the mesh.
    pub fn new(mesh: &AdaptiveMesh) -> Self {
        let base = mesh.base();
        let n = 1u64 << mesh.max_level();
        let mut carriers: BTreeMap<Carrier, CarrierSides> = BTreeMap::new();

        for e in mesh.elements() {
            let cell = mesh.cell(e);
            let scale = 1u64 << (mesh.max_level() - cell.level);
            let (s0, t0) = (cell.ix as u64 * scale, cell.iy as u64 * scale);
            let (s1, t1) = (s0 + scale, t0 + scale);
            let b = cell.base;

            // (side, on base boundary, interior line, range, minus side of the line)
            let sides = [
                (0u8, t0 == 0, false, t0, (s0, s1), false),
                (1, s1 == n, true, s1, (t0, t1), true),
                (2, t1 == n, false, t1, (s0, s1), true),
                (3, s0 == 0, true, s0, (t0, t1), false),
            ];
            for (side, on_base_edge, vertical, coord, (lo, hi), is_minus) in sides {
                if on_base_edge {
                    let k = b as usize;
                    let f = side as usize;
                    let edge_id = base.element_edges[k][f];
                    let orientation = base.edge_orientation[k][f];
                    let (lo, hi) = if orientation > 0 { (lo, hi) } else { (n - hi, n - lo) };
                    let segment = Segment { lo, hi, element: e, side, orientation };
                    let entry = carriers.entry(Carrier::BaseEdge(edge_id)).or_default();
                    if base.edges[edge_id].left == ElementFace::new(k, f) {
                        entry.minus.push(segment);
                    } else {
                        entry.plus.push(segment);
                    }
                } else {
                    let segment = Segment { lo, hi, element: e, side, orientation: 1 };
                    let entry = carriers
                        .entry(Carrier::Interior { base: b, vertical, coord })
                        .or_default();
                    if is_minus {
                        entry.minus.push(segment);
                    } else {
                        entry.plus.push(segment);
                    }
                }
            }
        }

        let mut faces = Vec::new();
        for (carrier, mut sides) in carriers {
            sides.minus.sort_unstable_by_key(|s| s.lo);
            sides.plus.sort_unstable_by_key(|s| s.lo);

            if sides.plus.is_empty() {
                let marker = match carrier {
                    Carrier::BaseEdge(edge_id) => base.edges[edge_id].marker,
                    Carrier::Interior { .. } => None,
                };
                for m in &sides.minus {
                    faces.push(build_face(mesh, carrier, n, m, None, m.lo, m.hi, marker));
                }
                continue;
            }

            let (mut i, mut j) = (0, 0);
            while i < sides.minus.len() && j < sides.plus.len() {
                let (m, p) = (&sides.minus[i], &sides.plus[j]);
                let lo = m.lo.max(p.lo);
                let hi = m.hi.min(p.hi);
                if hi > lo {
                    faces.push(build_face(mesh, carrier, n, m, Some(p), lo, hi, None));
                }
                match m.hi.cmp(&p.hi) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        i += 1;
                        j += 1;
                    }
                }
            }
        }

        let mut element_faces = vec![Vec::with_capacity(4); mesh.n_elements()];
        for (f, face) in faces.iter().enumerate() {
            element_faces[face.minus.get()].push(FaceIndex::new(f));
            if let Some(plus) = face.plus {
                element_faces[plus.get()].push(FaceIndex::new(f));
            }
        }

        Self { faces, element_faces }
    }

    /// Number of faces.
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// All faces.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// A single face.
    #[inline]
    pub fn face(&self, f: FaceIndex) -> &Face {
        &self.faces[f.get()]
    }

    /// Faces of an element.
    #[inline]
    pub fn element_faces(&self, e: ElementIndex) -> &[FaceIndex] {
        &self.element_faces[e.get()]
    }

    /// Distinct face neighbours of an element.
    pub fn neighbors(&self, e: ElementIndex) -> Vec<ElementIndex> {
        let mut out: Vec<_> = self
            .element_faces(e)
            .iter()
            .filter_map(|&f| self.face(f).neighbor_of(e))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// All elements containing a physical point, found by walking face
    /// neighbours from an element that contains it.
    pub fn elements_at_point(&self, mesh: &AdaptiveMesh, start: ElementIndex, point: (f64, f64)) -> Vec<ElementIndex> {
        const TOL: f64 = 1e-9;
        let mut found = vec![start];
        let mut stack = vec![start];
        while let Some(e) = stack.pop() {
            for nb in self.neighbors(e) {
                if found.contains(&nb) {
                    continue;
                }
                if mesh.geometry(nb).contains_point(point.0, point.1, TOL) {
                    found.push(nb);
                    stack.push(nb);
                }
            }
        }
        found.sort_unstable();
        found
    }
}

/// Base parameter coordinates of carrier position `x`, seen from a segment.
fn carrier_to_parametric(carrier: Carrier, segment: &Segment, x: u64, n: u64) -> (f64, f64) {
    let nf = n as f64;
    match carrier {
        Carrier::Interior { vertical: true, coord, .. } => (coord as f64 / nf, x as f64 / nf),
        Carrier::Interior { vertical: false, coord, .. } => (x as f64 / nf, coord as f64 / nf),
        Carrier::BaseEdge(_) => {
            let p = (if segment.orientation > 0 { x } else { n - x }) as f64 / nf;
            match segment.side {
                0 => (p, 0.0),
                1 => (1.0, p),
                2 => (p, 1.0),
                _ => (0.0, p),
            }
        }
    }
}

/// Outward unit normal of a side of a base element.
fn side_normal(base: &Mesh2D, k: usize, side: u8) -> (f64, f64) {
    let (_, e1, e2) = base.element_frame(k);
    let unit = |v: (f64, f64)| {
        let len = (v.0 * v.0 + v.1 * v.1).sqrt();
        (v.0 / len, v.1 / len)
    };
    match side {
        0 => unit((e1.1, -e1.0)),
        1 => unit((e2.1, -e2.0)),
        2 => unit((-e1.1, e1.0)),
        _ => unit((-e2.1, e2.0)),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_face(
    mesh: &AdaptiveMesh,
    carrier: Carrier,
    n: u64,
    minus: &Segment,
    plus: Option<&Segment>,
    lo: u64,
    hi: u64,
    marker: Option<BoundaryMarker>,
) -> Face {
    let base = mesh.base();
    let reference = |segment: &Segment, x: u64| {
        let cell: CellId = mesh.cell(segment.element);
        let (s, t) = carrier_to_parametric(carrier, segment, x, n);
        cell.parametric_to_reference(s, t)
    };

    let minus_cell = mesh.cell(minus.element);
    let k = minus_cell.base as usize;
    let endpoints = [lo, hi].map(|x| {
        let (s, t) = carrier_to_parametric(carrier, minus, x, n);
        base.parametric_to_physical(k, s, t)
    });
    let minus_ref = [reference(minus, lo), reference(minus, hi)];
    let plus_ref = match plus {
        Some(p) => [reference(p, lo), reference(p, hi)],
        None => minus_ref,
    };
    let length = ((endpoints[1].0 - endpoints[0].0).powi(2) + (endpoints[1].1 - endpoints[0].1).powi(2)).sqrt();

    Face {
        minus: minus.element,
        minus_side: minus.side,
        plus: plus.map(|p| p.element),
        minus_ref,
        plus_ref,
        endpoints,
        normal: side_normal(base, k, minus.side),
        length,
        marker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sides() -> [BoundaryMarker; 4] {
        [1, 2, 3, 4].map(BoundaryMarker::new)
    }

    fn perimeter(mesh: &AdaptiveMesh, e: ElementIndex) -> f64 {
        let c = mesh.geometry(e).corners();
        (0..4)
            .map(|i| {
                let (a, b) = (c[i], c[(i + 1) % 4]);
                ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
            })
            .sum()
    }

    fn check_perimeters(mesh: &AdaptiveMesh, faces: &FaceSet) {
        for e in mesh.elements() {
            let total: f64 = faces.element_faces(e).iter().map(|&f| faces.face(f).length).sum();
            assert!((total - perimeter(mesh, e)).abs() < 1e-12, "element {e}");
        }
    }

    #[test]
    fn test_conforming_face_count() {
        let mesh = AdaptiveMesh::new(Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, sides()).unwrap());
        let faces = FaceSet::new(&mesh);
        assert_eq!(faces.n_faces(), 12);
        assert_eq!(faces.faces().iter().filter(|f| f.is_boundary()).count(), 8);
        check_perimeters(&mesh, &faces);
    }

    #[test]
    fn test_hanging_node_faces() {
        let mut mesh = AdaptiveMesh::new(Mesh2D::uniform_rectangle_with_sides(0.0, 2.0, 0.0, 1.0, 2, 1, sides()).unwrap());
        // Split the left element; its right side now meets the right element twice
        mesh.refine_element(ElementIndex::new(0));
        let faces = FaceSet::new(&mesh);
        check_perimeters(&mesh, &faces);

        let big = mesh.locate(1, 0.5, 0.5).unwrap();
        let shared: Vec<_> = faces
            .element_faces(big)
            .iter()
            .map(|&f| faces.face(f))
            .filter(|f| !f.is_boundary())
            .collect();
        assert_eq!(shared.len(), 2);
        for face in shared {
            assert!((face.length - 0.5).abs() < 1e-14);
            assert!((face.normal.0 - 1.0).abs() < 1e-14);
            assert_eq!(face.plus, Some(big));
        }
    }

    #[test]
    fn test_reference_points_match_physically() {
        let mut mesh = AdaptiveMesh::new(Mesh2D::forward_facing_step(1, sides()).unwrap());
        mesh.refine_element(ElementIndex::new(10));
        mesh.refine_element(ElementIndex::new(3));
        let faces = FaceSet::new(&mesh);
        check_perimeters(&mesh, &faces);

        for face in faces.faces() {
            let rule = face.gauss_quadrature(3);
            let gm = mesh.geometry(face.minus);
            for q in 0..rule.len() {
                let x = gm.to_physical(rule.minus_points[q].0, rule.minus_points[q].1);
                assert!((x.0 - rule.physical[q].0).abs() < 1e-12);
                assert!((x.1 - rule.physical[q].1).abs() < 1e-12);
                if let Some(plus) = face.plus {
                    let y = mesh.geometry(plus).to_physical(rule.plus_points[q].0, rule.plus_points[q].1);
                    assert!((x.0 - y.0).abs() < 1e-12 && (x.1 - y.1).abs() < 1e-12);
                }
            }
            let weight_sum: f64 = rule.weights.iter().sum();
            assert!((weight_sum - face.length).abs() < 1e-12);
        }
    }

    #[test]
    fn test_boundary_markers_and_normals() {
        let mesh = AdaptiveMesh::new(Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 1, 1, sides()).unwrap());
        let faces = FaceSet::new(&mesh);
        for face in faces.faces() {
            let (mx, my) = face.midpoint();
            // Normal points away from the center
            assert!(face.normal.0 * (mx - 0.5) + face.normal.1 * (my - 0.5) > 0.0);
            let expected = match face.minus_side {
                0 => 1,
                1 => 2,
                2 => 3,
                _ => 4,
            };
            assert_eq!(face.marker, Some(BoundaryMarker::new(expected)));
        }
    }

    #[test]
    fn test_elements_at_point() {
        let mut mesh = AdaptiveMesh::new(Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, sides()).unwrap());
        mesh.refine_element(ElementIndex::new(0));
        let faces = FaceSet::new(&mesh);
        let start = mesh.locate(3, 0.1, 0.1).unwrap();
        let around = faces.elements_at_point(&mesh, start, (0.5, 0.5));
        // one small child of the refined element plus the three coarse ones
        assert_eq!(around.len(), 4);
    }
}
