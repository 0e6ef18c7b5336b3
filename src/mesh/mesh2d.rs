//! 2D base mesh of parallelogram elements.
//!
//! Besides vertices and counter-clockwise element quadruples the mesh keeps
//! an edge table linking each edge to the one or two element faces on it,
//! with a boundary marker on every boundary edge.
//!
//! Elements must be parallelograms so that the map from the parameter square
//! (s, t) ∈ [0, 1]² is affine:
//! ```text
//! x(s, t) = v0 + s (v1 - v0) + t (v3 - v0)
//! ```
//! Every refinement level inherits this affine structure.
//!
//! Faces are numbered counter-clockwise:
//! - Face 0 (bottom): from vertex 0 to vertex 1   (t = 0)
//! - Face 1 (right):  from vertex 1 to vertex 2   (s = 1)
//! - Face 2 (top):    from vertex 2 to vertex 3   (t = 1)
//! - Face 3 (left):   from vertex 3 to vertex 0   (s = 0)

use std::collections::HashMap;

use super::boundary_markers::BoundaryMarker;
use crate::error::{EulerError, Result};

/// Relative tolerance for the parallelogram check.
const AFFINE_TOLERANCE: f64 = 1e-10;

/// One face of a base element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementFace {
    pub element: usize,
    /// 0 bottom, 1 right, 2 top, 3 left
    pub face: usize,
}

impl ElementFace {
    pub fn new(element: usize, face: usize) -> Self {
        Self { element, face }
    }
}

/// An edge of the base mesh and the element faces lying on it.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Sorted vertex pair
    pub vertices: (usize, usize),
    /// First element found on the edge
    pub left: ElementFace,
    /// The other element, absent on the boundary
    pub right: Option<ElementFace>,
    /// Set exactly for boundary edges
    pub marker: Option<BoundaryMarker>,
}

impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.right.is_none()
    }
}

/// 2D base mesh of parallelogram elements.
#[derive(Clone, Debug)]
pub struct Mesh2D {
    pub vertices: Vec<(f64, f64)>,

    /// Counter-clockwise vertex quadruples
    pub elements: Vec<[usize; 4]>,

    pub edges: Vec<Edge>,

    /// `element_edges[k][f]` is the edge under face f of element k
    pub element_edges: Vec<[usize; 4]>,

    /// +1 if the face parameter (s on faces 0/2, t on faces 1/3) increases
    /// from the edge's first vertex towards its second one, -1 otherwise.
    pub edge_orientation: Vec<[i8; 4]>,

    pub n_elements: usize,
    pub n_edges: usize,
    pub n_boundary_edges: usize,
    pub n_vertices: usize,

    /// Elements around each vertex
    pub vertex_to_elements: Vec<Vec<usize>>,
}

/// Vertices at the low and high end of each face's parameter range.
const FACE_PARAM_VERTICES: [(usize, usize); 4] = [(0, 1), (1, 2), (3, 2), (0, 3)];

impl Mesh2D {
    /// Build a mesh from vertices, elements and boundary markers.
    ///
    /// # Arguments
    /// * `vertices` - Vertex coordinates
    /// * `elements` - Counter-clockwise vertex quadruples, each a parallelogram
    /// * `boundary` - (vertex a, vertex b, marker) for every boundary edge
    ///
    /// # Errors
    /// Returns `EulerError::InvalidMesh` for out-of-range vertices,
    /// clockwise or non-parallelogram elements, edges shared by more than two
    /// elements, boundary edges without a marker and markers on interior edges.
    pub fn new(
        vertices: Vec<(f64, f64)>,
        elements: Vec<[usize; 4]>,
        boundary: &[(usize, usize, BoundaryMarker)],
    ) -> Result<Self> {
        let n_vertices = vertices.len();
        let n_elements = elements.len();
        if n_elements == 0 {
            return Err(EulerError::InvalidMesh("mesh has no elements".into()));
        }

        for (k, elem) in elements.iter().enumerate() {
            if let Some(&v) = elem.iter().find(|&&v| v >= n_vertices) {
                return Err(EulerError::InvalidMesh(format!(
                    "element {k} references vertex {v}, mesh has {n_vertices}"
                )));
            }
            validate_parallelogram(k, elem.map(|v| vertices[v]))?;
        }

        let mut markers: HashMap<(usize, usize), BoundaryMarker> = HashMap::with_capacity(boundary.len());
        for &(a, b, marker) in boundary {
            markers.insert((a.min(b), a.max(b)), marker);
        }

        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        let mut element_edges = vec![[0usize; 4]; n_elements];
        let mut edge_orientation = vec![[1i8; 4]; n_elements];

        for (k, elem) in elements.iter().enumerate() {
            for face in 0..4 {
                let a = elem[face];
                let b = elem[(face + 1) % 4];
                let key = (a.min(b), a.max(b));
                let element_face = ElementFace::new(k, face);

                let edge_idx = match edge_lookup.get(&key) {
                    Some(&idx) => {
                        let edge = &mut edges[idx];
                        if edge.right.is_some() {
                            return Err(EulerError::InvalidMesh(format!(
                                "edge ({}, {}) is shared by more than two elements",
                                key.0, key.1
                            )));
                        }
                        edge.right = Some(element_face);
                        idx
                    }
                    None => {
                        let idx = edges.len();
                        edges.push(Edge {
                            vertices: key,
                            left: element_face,
                            right: None,
                            marker: None,
                        });
                        edge_lookup.insert(key, idx);
                        idx
                    }
                };

                element_edges[k][face] = edge_idx;
                let (low, _) = FACE_PARAM_VERTICES[face];
                edge_orientation[k][face] = if elem[low] == key.0 { 1 } else { -1 };
            }
        }

        let mut n_boundary_edges = 0;
        for edge in edges.iter_mut() {
            let marker = markers.remove(&edge.vertices);
            if edge.is_boundary() {
                n_boundary_edges += 1;
                match marker {
                    Some(m) => edge.marker = Some(m),
                    None => {
                        return Err(EulerError::InvalidMesh(format!(
                            "boundary edge ({}, {}) has no marker",
                            edge.vertices.0, edge.vertices.1
                        )))
                    }
                }
            } else if marker.is_some() {
                return Err(EulerError::InvalidMesh(format!(
                    "marker given for interior edge ({}, {})",
                    edge.vertices.0, edge.vertices.1
                )));
            }
        }
        if let Some((&(a, b), _)) = markers.iter().next() {
            return Err(EulerError::InvalidMesh(format!(
                "marker given for non-existent edge ({a}, {b})"
            )));
        }

        let vertex_to_elements = Self::build_vertex_to_elements(&elements, n_vertices);
        let n_edges = edges.len();

        Ok(Self {
            vertices,
            elements,
            edges,
            element_edges,
            edge_orientation,
            n_elements,
            n_edges,
            n_boundary_edges,
            n_vertices,
            vertex_to_elements,
        })
    }

    /// Build a tensor grid mesh with some cells removed.
    ///
    /// # Arguments
    /// * `xs` - Ascending x coordinates of the grid lines
    /// * `ys` - Ascending y coordinates of the grid lines
    /// * `keep` - Whether cell (i, j) belongs to the domain
    /// * `marker` - Marker of a boundary edge given its midpoint and outward normal
    pub fn structured<K, M>(xs: &[f64], ys: &[f64], keep: K, marker: M) -> Result<Self>
    where
        K: Fn(usize, usize) -> bool,
        M: Fn((f64, f64), (f64, f64)) -> BoundaryMarker,
    {
        if xs.len() < 2 || ys.len() < 2 {
            return Err(EulerError::InvalidMesh(
                "need at least one element in each direction".into(),
            ));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) || ys.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EulerError::InvalidMesh("grid lines must be strictly ascending".into()));
        }

        let nx = xs.len() - 1;
        let ny = ys.len() - 1;
        let kept = |i: isize, j: isize| -> bool {
            i >= 0 && j >= 0 && (i as usize) < nx && (j as usize) < ny && keep(i as usize, j as usize)
        };

        let mut vertex_ids: HashMap<(usize, usize), usize> = HashMap::new();
        let mut vertices = Vec::new();
        let mut vertex = |i: usize, j: usize, vertices: &mut Vec<(f64, f64)>| -> usize {
            *vertex_ids.entry((i, j)).or_insert_with(|| {
                vertices.push((xs[i], ys[j]));
                vertices.len() - 1
            })
        };

        let mut elements = Vec::new();
        let mut boundary = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                if !keep(i, j) {
                    continue;
                }
                let v0 = vertex(i, j, &mut vertices);
                let v1 = vertex(i + 1, j, &mut vertices);
                let v2 = vertex(i + 1, j + 1, &mut vertices);
                let v3 = vertex(i, j + 1, &mut vertices);
                elements.push([v0, v1, v2, v3]);

                let (ii, jj) = (i as isize, j as isize);
                let xm = 0.5 * (xs[i] + xs[i + 1]);
                let ym = 0.5 * (ys[j] + ys[j + 1]);
                if !kept(ii, jj - 1) {
                    boundary.push((v0, v1, marker((xm, ys[j]), (0.0, -1.0))));
                }
                if !kept(ii + 1, jj) {
                    boundary.push((v1, v2, marker((xs[i + 1], ym), (1.0, 0.0))));
                }
                if !kept(ii, jj + 1) {
                    boundary.push((v2, v3, marker((xm, ys[j + 1]), (0.0, 1.0))));
                }
                if !kept(ii - 1, jj) {
                    boundary.push((v3, v0, marker((xs[i], ym), (-1.0, 0.0))));
                }
            }
        }

        Self::new(vertices, elements, &boundary)
    }

    /// Create a uniform rectangular mesh with different markers on each side.
    ///
    /// # Arguments
    /// * `x0`, `x1`, `y0`, `y1` - Extent of the rectangle
    /// * `nx`, `ny` - Elements along x and y
    /// * `markers` - boundary markers for [south, east, north, west] sides
    pub fn uniform_rectangle_with_sides(
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        nx: usize,
        ny: usize,
        markers: [BoundaryMarker; 4],
    ) -> Result<Self> {
        if nx == 0 || ny == 0 || x1 <= x0 || y1 <= y0 {
            return Err(EulerError::InvalidMesh(format!(
                "invalid rectangle [{x0}, {x1}] x [{y0}, {y1}] with {nx} x {ny} elements"
            )));
        }
        let xs = uniform_lines(x0, x1, nx);
        let ys = uniform_lines(y0, y1, ny);
        let [south, east, north, west] = markers;
        Self::structured(&xs, &ys, |_, _| true, |_, normal| {
            if normal.1 < -0.5 {
                south
            } else if normal.0 > 0.5 {
                east
            } else if normal.1 > 0.5 {
                north
            } else {
                west
            }
        })
    }

    /// Forward facing step: channel [0, 3] × [0, 1] with the step
    /// [0.6, 3] × [0, 0.2] removed.
    ///
    /// # Arguments
    /// * `refinement` - Elements per 0.2 length units (1 gives 63 elements)
    /// * `markers` - [bottom wall incl. step, outlet, top wall, inlet]
    pub fn forward_facing_step(refinement: usize, markers: [BoundaryMarker; 4]) -> Result<Self> {
        if refinement == 0 {
            return Err(EulerError::InvalidMesh("refinement must be positive".into()));
        }
        let n_unit = 5 * refinement;
        let xs = uniform_lines(0.0, 3.0, 3 * n_unit);
        let ys = uniform_lines(0.0, 1.0, n_unit);
        let step_i = 3 * refinement;
        let step_j = refinement;
        let [bottom, outlet, top, inlet] = markers;
        Self::structured(
            &xs,
            &ys,
            |i, j| !(i >= step_i && j < step_j),
            |mid, normal| {
                if normal.1 > 0.5 {
                    top
                } else if normal.0 > 0.5 && mid.0 > 3.0 - 1e-12 {
                    outlet
                } else if normal.0 < -0.5 && mid.0 < 1e-12 {
                    inlet
                } else {
                    bottom
                }
            },
        )
    }

    /// Channel [0, 3] × [0, 1] with a rectangular bump [1, 2] × [0, 0.1] on
    /// the bottom wall.
    ///
    /// # Arguments
    /// * `refinement` - Multiplier of the 12 × 4 base resolution
    /// * `markers` - [inlet, outlet, bottom wall incl. bump, top wall]
    pub fn channel_with_bump(refinement: usize, markers: [BoundaryMarker; 4]) -> Result<Self> {
        if refinement == 0 {
            return Err(EulerError::InvalidMesh("refinement must be positive".into()));
        }
        let xs = uniform_lines(0.0, 3.0, 12 * refinement);
        let mut ys = vec![0.0];
        ys.extend(uniform_lines(0.1, 1.0, 3 * refinement));
        let bump = (4 * refinement)..(8 * refinement);
        let [inlet, outlet, bottom, top] = markers;
        Self::structured(
            &xs,
            &ys,
            |i, j| !(j == 0 && bump.contains(&i)),
            |mid, normal| {
                if normal.1 > 0.5 && mid.1 > 1.0 - 1e-12 {
                    top
                } else if normal.0 > 0.5 && mid.0 > 3.0 - 1e-12 {
                    outlet
                } else if normal.0 < -0.5 && mid.0 < 1e-12 {
                    inlet
                } else {
                    bottom
                }
            },
        )
    }

    /// Corner coordinates of element `k`, counter-clockwise.
    pub fn element_vertices(&self, k: usize) -> [(f64, f64); 4] {
        self.elements[k].map(|v| self.vertices[v])
    }

    /// Affine frame of an element: origin v0 and edge vectors e1 = v1 - v0,
    /// e2 = v3 - v0.
    pub fn element_frame(&self, k: usize) -> ((f64, f64), (f64, f64), (f64, f64)) {
        let [v0, v1, _, v3] = self.element_vertices(k);
        (v0, (v1.0 - v0.0, v1.1 - v0.1), (v3.0 - v0.0, v3.1 - v0.1))
    }

    /// Map parameter coordinates (s, t) ∈ [0, 1]² to physical coordinates.
    pub fn parametric_to_physical(&self, k: usize, s: f64, t: f64) -> (f64, f64) {
        let (origin, e1, e2) = self.element_frame(k);
        (
            origin.0 + s * e1.0 + t * e2.0,
            origin.1 + s * e1.1 + t * e2.1,
        )
    }

    /// The element face on the other side of `face`, `None` on the boundary.
    pub fn neighbor(&self, element: usize, face: usize) -> Option<ElementFace> {
        let edge = &self.edges[self.element_edges[element][face]];

        if edge.left.element == element && edge.left.face == face {
            edge.right
        } else {
            Some(edge.left)
        }
    }

    pub fn is_boundary_face(&self, element: usize, face: usize) -> bool {
        self.edges[self.element_edges[element][face]].is_boundary()
    }

    /// Get the boundary marker for a face, if it's a boundary face.
    pub fn marker(&self, element: usize, face: usize) -> Option<BoundaryMarker> {
        self.edges[self.element_edges[element][face]].marker
    }

    /// All distinct boundary markers in ascending order.
    pub fn markers(&self) -> Vec<BoundaryMarker> {
        let mut markers: Vec<_> = self.edges.iter().filter_map(|e| e.marker).collect();
        markers.sort_unstable();
        markers.dedup();
        markers
    }

    /// Get the diameter of a specific element (longer diagonal).
    pub fn element_diameter(&self, k: usize) -> f64 {
        let [v0, v1, v2, v3] = self.element_vertices(k);
        let d02 = ((v2.0 - v0.0).powi(2) + (v2.1 - v0.1).powi(2)).sqrt();
        let d13 = ((v3.0 - v1.0).powi(2) + (v3.1 - v1.1).powi(2)).sqrt();
        d02.max(d13)
    }

    /// Elements that have `vertex` as a corner.
    #[inline]
    pub fn elements_at_vertex(&self, vertex: usize) -> &[usize] {
        &self.vertex_to_elements[vertex]
    }

    fn build_vertex_to_elements(elements: &[[usize; 4]], n_vertices: usize) -> Vec<Vec<usize>> {
        let mut v2e = vec![Vec::with_capacity(4); n_vertices];
        for (elem_idx, elem) in elements.iter().enumerate() {
            for &vertex in elem {
                v2e[vertex].push(elem_idx);
            }
        }
        v2e
    }
}

/// Check counter-clockwise orientation and the parallelogram property.
fn validate_parallelogram(k: usize, verts: [(f64, f64); 4]) -> Result<()> {
    let [v0, v1, v2, v3] = verts;
    let e1 = (v1.0 - v0.0, v1.1 - v0.1);
    let e2 = (v3.0 - v0.0, v3.1 - v0.1);
    let cross = e1.0 * e2.1 - e1.1 * e2.0;
    if cross <= 0.0 {
        return Err(EulerError::InvalidMesh(format!(
            "element {k} is degenerate or not counter-clockwise"
        )));
    }
    let scale = (e1.0.abs() + e1.1.abs() + e2.0.abs() + e2.1.abs()).max(f64::MIN_POSITIVE);
    let gap_x = v0.0 + v2.0 - v1.0 - v3.0;
    let gap_y = v0.1 + v2.1 - v1.1 - v3.1;
    if gap_x.abs() + gap_y.abs() > AFFINE_TOLERANCE * scale {
        return Err(EulerError::InvalidMesh(format!("element {k} is not a parallelogram")));
    }
    Ok(())
}

fn uniform_lines(a: f64, b: f64, n: usize) -> Vec<f64> {
    let h = (b - a) / n as f64;
    let mut lines: Vec<f64> = (0..n).map(|i| a + i as f64 * h).collect();
    lines.push(b);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sides() -> [BoundaryMarker; 4] {
        [1, 2, 3, 4].map(BoundaryMarker::new)
    }

    #[test]
    fn test_uniform_rectangle_dimensions() {
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 3, 2, sides()).unwrap();

        assert_eq!(mesh.n_elements, 6);
        assert_eq!(mesh.n_vertices, 12);
        // 3 × 3 horizontal + 4 × 2 vertical
        assert_eq!(mesh.n_edges, 17);
        assert_eq!(mesh.n_boundary_edges, 10);
    }

    #[test]
    fn test_side_markers() {
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 2.0, 0.0, 1.0, 2, 2, sides()).unwrap();
        // Element 0 is bottom-left
        assert_eq!(mesh.marker(0, 0), Some(BoundaryMarker::new(1)));
        assert_eq!(mesh.marker(0, 3), Some(BoundaryMarker::new(4)));
        assert_eq!(mesh.marker(0, 1), None);
        // Element 3 is top-right
        assert_eq!(mesh.marker(3, 1), Some(BoundaryMarker::new(2)));
        assert_eq!(mesh.marker(3, 2), Some(BoundaryMarker::new(3)));
        assert_eq!(mesh.markers().len(), 4);
    }

    #[test]
    fn test_neighbor_connectivity() {
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 2, sides()).unwrap();

        assert!(mesh.is_boundary_face(0, 0));
        assert!(!mesh.is_boundary_face(0, 1));
        assert!(!mesh.is_boundary_face(0, 2));
        assert!(mesh.is_boundary_face(0, 3));

        let right = mesh.neighbor(0, 1).unwrap();
        assert_eq!(right, ElementFace::new(1, 3));
        let top = mesh.neighbor(0, 2).unwrap();
        assert_eq!(top, ElementFace::new(2, 0));
    }

    #[test]
    fn test_edge_orientation_of_shared_edge() {
        let mesh = Mesh2D::uniform_rectangle_with_sides(0.0, 1.0, 0.0, 1.0, 2, 1, sides()).unwrap();
        // Shared vertical edge: right face of element 0, left face of element 1.
        // Both parametrize it by t from bottom to top.
        assert_eq!(mesh.element_edges[0][1], mesh.element_edges[1][3]);
        assert_eq!(mesh.edge_orientation[0][1], mesh.edge_orientation[1][3]);
    }

    #[test]
    fn test_forward_facing_step() {
        let markers = sides();
        let mesh = Mesh2D::forward_facing_step(1, markers).unwrap();
        assert_eq!(mesh.n_elements, 63);

        let mut counts: HashMap<BoundaryMarker, f64> = HashMap::new();
        for edge in mesh.edges.iter().filter(|e| e.is_boundary()) {
            let (a, b) = (mesh.vertices[edge.vertices.0], mesh.vertices[edge.vertices.1]);
            let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
            *counts.entry(edge.marker.unwrap()).or_default() += len;
        }
        // bottom 0.6 + step face 0.2 + step top 2.4
        assert!((counts[&markers[0]] - 3.2).abs() < 1e-12);
        assert!((counts[&markers[1]] - 0.8).abs() < 1e-12);
        assert!((counts[&markers[2]] - 3.0).abs() < 1e-12);
        assert!((counts[&markers[3]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_channel_with_bump() {
        let mesh = Mesh2D::channel_with_bump(1, sides()).unwrap();
        // 12 × 4 grid minus 4 bump cells
        assert_eq!(mesh.n_elements, 44);
    }

    #[test]
    fn test_rejects_clockwise_element() {
        let vertices = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let m = BoundaryMarker::new(1);
        let boundary = [(0, 1, m), (1, 2, m), (2, 3, m), (3, 0, m)];
        let err = Mesh2D::new(vertices, vec![[0, 3, 2, 1]], &boundary).unwrap_err();
        assert!(matches!(err, EulerError::InvalidMesh(_)));
    }

    #[test]
    fn test_rejects_non_parallelogram() {
        let vertices = vec![(0.0, 0.0), (1.0, 0.0), (1.2, 1.0), (0.0, 1.0)];
        let m = BoundaryMarker::new(1);
        let boundary = [(0, 1, m), (1, 2, m), (2, 3, m), (3, 0, m)];
        assert!(Mesh2D::new(vertices, vec![[0, 1, 2, 3]], &boundary).is_err());
    }

    #[test]
    fn test_rejects_unmarked_boundary() {
        let vertices = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let m = BoundaryMarker::new(1);
        let boundary = [(0, 1, m), (1, 2, m), (2, 3, m)];
        assert!(Mesh2D::new(vertices, vec![[0, 1, 2, 3]], &boundary).is_err());
    }

    #[test]
    fn test_parametric_map() {
        let vertices = vec![(0.0, 0.0), (2.0, 0.0), (3.0, 1.0), (1.0, 1.0)];
        let m = BoundaryMarker::new(1);
        let boundary = [(0, 1, m), (1, 2, m), (2, 3, m), (3, 0, m)];
        let mesh = Mesh2D::new(vertices, vec![[0, 1, 2, 3]], &boundary).unwrap();
        let (x, y) = mesh.parametric_to_physical(0, 1.0, 1.0);
        assert!((x - 3.0).abs() < 1e-14 && (y - 1.0).abs() < 1e-14);
        let (x, y) = mesh.parametric_to_physical(0, 0.5, 0.5);
        assert!((x - 1.5).abs() < 1e-14 && (y - 0.5).abs() < 1e-14);
    }
}
