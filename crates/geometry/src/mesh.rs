use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex layout shared by every builder and uploaded as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        });
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Bounds of all vertex positions, `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from_array(v.position));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Aabb { min, max })
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from_array(v.position) + offset).to_array();
        }
    }

    /// Move the mesh so its bounding box is centred on the origin.
    /// Returns the offset that was applied.
    pub fn center(&mut self) -> Vec3 {
        let Some(bounds) = self.bounding_box() else {
            return Vec3::ZERO;
        };
        let offset = -bounds.center();
        self.translate(offset);
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        let mut mesh = MeshData::new();
        let a = mesh.push_vertex(Vec3::new(1.0, 1.0, 1.0), Vec3::Z, Vec2::ZERO);
        let b = mesh.push_vertex(Vec3::new(3.0, 1.0, 1.0), Vec3::Z, Vec2::X);
        let c = mesh.push_vertex(Vec3::new(1.0, 5.0, 2.0), Vec3::Z, Vec2::Y);
        mesh.push_triangle(a, b, c);
        mesh
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let mut mesh = MeshData::new();
        assert!(mesh.bounding_box().is_none());
        assert_eq!(mesh.center(), Vec3::ZERO);
        assert!(mesh.is_empty());
    }

    #[test]
    fn bounding_box_covers_all_vertices() {
        let bounds = triangle().bounding_box().unwrap();
        assert_eq!(bounds.min, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 5.0, 2.0));
        assert_eq!(bounds.size(), Vec3::new(2.0, 4.0, 1.0));
    }

    #[test]
    fn center_moves_bounds_to_origin() {
        let mut mesh = triangle();
        let offset = mesh.center();
        assert_eq!(offset, Vec3::new(-2.0, -3.0, -1.5));
        let bounds = mesh.bounding_box().unwrap();
        assert!(bounds.center().length() < 1e-6);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
