use crate::math::Point3;

/// A triangulated surface mesh: a flat list of vertices and the
/// triangles indexing into it.
///
/// This is the geometric payload a [`Surface`](crate::model::SurfaceData)
/// may carry, and the unit of exchange for the standalone surface
/// formats (`.ts`, `.og_tsf3d`). It knows nothing about the structural
/// model it may be attached to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangulatedSurface {
    name: String,
    points: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
}

impl TriangulatedSurface {
    /// Creates a new, empty surface mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the display name of the mesh.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name of the mesh.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends a vertex and returns its index.
    pub fn create_point(&mut self, point: Point3) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    /// Appends a triangle referencing three existing vertices.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if a vertex index is out of range; codecs
    /// validate indices before calling this.
    pub fn create_triangle(&mut self, triangle: [usize; 3]) -> usize {
        debug_assert!(triangle.iter().all(|&v| v < self.points.len()));
        self.triangles.push(triangle);
        self.triangles.len() - 1
    }

    /// Number of vertices.
    #[must_use]
    pub fn nb_vertices(&self) -> usize {
        self.points.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn nb_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the vertex at `index`.
    #[must_use]
    pub fn point(&self, index: usize) -> &Point3 {
        &self.points[index]
    }

    /// Iterates over all vertices in insertion order.
    pub fn points(&self) -> impl Iterator<Item = &Point3> {
        self.points.iter()
    }

    /// Returns the triangle at `index`.
    #[must_use]
    pub fn triangle(&self, index: usize) -> [usize; 3] {
        self.triangles[index]
    }

    /// Iterates over all triangles in insertion order.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.triangles.iter().copied()
    }

    /// Returns `true` if the mesh has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quad() -> TriangulatedSurface {
        let mut mesh = TriangulatedSurface::new();
        mesh.create_point(Point3::new(0.0, 0.0, 0.0));
        mesh.create_point(Point3::new(1.0, 0.0, 0.0));
        mesh.create_point(Point3::new(1.0, 1.0, 0.0));
        mesh.create_point(Point3::new(0.0, 1.0, 0.0));
        mesh.create_triangle([0, 1, 2]);
        mesh.create_triangle([0, 2, 3]);
        mesh
    }

    #[test]
    fn counts() {
        let mesh = quad();
        assert_eq!(mesh.nb_vertices(), 4);
        assert_eq!(mesh.nb_triangles(), 2);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mesh = quad();
        let xs: Vec<f64> = mesh.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(mesh.triangle(1), [0, 2, 3]);
    }
}
