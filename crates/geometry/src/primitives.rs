use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::mesh::MeshData;
use crate::{GeometryError, require_positive, require_segments};

/// Parametric solids for buttons, overlays and decoration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box centred on the origin.
    Box { width: f32, height: f32, depth: f32 },
    /// Rectangle in the XY plane facing +Z.
    Plane { width: f32, height: f32 },
    /// Ring around the Z axis. `radius` is measured to the tube centre.
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
}

pub fn build_primitive(primitive: &Primitive) -> Result<MeshData, GeometryError> {
    match *primitive {
        Primitive::Box {
            width,
            height,
            depth,
        } => {
            require_positive("width", width)?;
            require_positive("height", height)?;
            require_positive("depth", depth)?;
            Ok(box_mesh(Vec3::new(width, height, depth) * 0.5))
        }
        Primitive::Plane { width, height } => {
            require_positive("width", width)?;
            require_positive("height", height)?;
            Ok(plane_mesh(width * 0.5, height * 0.5))
        }
        Primitive::Torus {
            radius,
            tube,
            radial_segments,
            tubular_segments,
        } => {
            require_positive("radius", radius)?;
            require_positive("tube", tube)?;
            require_segments("radial_segments", 3, radial_segments)?;
            require_segments("tubular_segments", 3, tubular_segments)?;
            Ok(torus_mesh(radius, tube, radial_segments, tubular_segments))
        }
    }
}

/// Four vertices per face so every face keeps a flat normal.
fn box_mesh(half: Vec3) -> MeshData {
    // (normal, u axis, v axis) per face; u x v == normal
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut mesh = MeshData::with_capacity(24, 36);
    for (normal, u, v) in faces {
        let corner = |su: f32, sv: f32| (normal + u * su + v * sv) * half;
        let a = mesh.push_vertex(corner(-1.0, -1.0), normal, Vec2::new(0.0, 1.0));
        let b = mesh.push_vertex(corner(1.0, -1.0), normal, Vec2::new(1.0, 1.0));
        let c = mesh.push_vertex(corner(1.0, 1.0), normal, Vec2::new(1.0, 0.0));
        let d = mesh.push_vertex(corner(-1.0, 1.0), normal, Vec2::new(0.0, 0.0));
        mesh.push_triangle(a, b, c);
        mesh.push_triangle(c, d, a);
    }
    mesh
}

fn plane_mesh(hw: f32, hh: f32) -> MeshData {
    let mut mesh = MeshData::with_capacity(4, 6);
    let a = mesh.push_vertex(Vec3::new(-hw, -hh, 0.0), Vec3::Z, Vec2::new(0.0, 1.0));
    let b = mesh.push_vertex(Vec3::new(hw, -hh, 0.0), Vec3::Z, Vec2::new(1.0, 1.0));
    let c = mesh.push_vertex(Vec3::new(hw, hh, 0.0), Vec3::Z, Vec2::new(1.0, 0.0));
    let d = mesh.push_vertex(Vec3::new(-hw, hh, 0.0), Vec3::Z, Vec2::new(0.0, 0.0));
    mesh.push_triangle(a, b, c);
    mesh.push_triangle(c, d, a);
    mesh
}

fn torus_mesh(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshData {
    let ring = tubular_segments + 1;
    let mut mesh = MeshData::with_capacity(
        (ring * (radial_segments + 1)) as usize,
        (radial_segments * tubular_segments * 6) as usize,
    );

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let uv = Vec2::new(
                i as f32 / tubular_segments as f32,
                j as f32 / radial_segments as f32,
            );
            mesh.push_vertex(position, (position - center).normalize(), uv);
        }
    }

    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = ring * j + i - 1;
            let b = ring * (j - 1) + i - 1;
            let c = ring * (j - 1) + i;
            let d = ring * j + i;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &MeshData, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from_array(mesh.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn button_box_has_requested_extent() {
        let mesh = build_primitive(&Primitive::Box {
            width: 0.1,
            height: 0.8,
            depth: 0.15,
        })
        .unwrap();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let size = mesh.bounding_box().unwrap().size();
        assert!((size - Vec3::new(0.1, 0.8, 0.15)).length() < 1e-6);
    }

    #[test]
    fn box_faces_wind_outward() {
        let mesh = build_primitive(&Primitive::Box {
            width: 1.0,
            height: 2.0,
            depth: 3.0,
        })
        .unwrap();
        for tri in mesh.indices.chunks(3) {
            let stored = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            assert!(face_normal(&mesh, tri).dot(stored) > 0.0);
        }
    }

    #[test]
    fn plane_faces_positive_z() {
        let mesh = build_primitive(&Primitive::Plane {
            width: 4.9,
            height: 10.1,
        })
        .unwrap();
        for tri in mesh.indices.chunks(3) {
            assert!(face_normal(&mesh, tri).z > 0.0);
        }
        let size = mesh.bounding_box().unwrap().size();
        assert!((size.x - 4.9).abs() < 1e-6 && (size.y - 10.1).abs() < 1e-6);
    }

    #[test]
    fn torus_vertex_and_index_counts() {
        let mesh = build_primitive(&Primitive::Torus {
            radius: 0.6,
            tube: 0.2,
            radial_segments: 16,
            tubular_segments: 100,
        })
        .unwrap();
        assert_eq!(mesh.vertices.len(), 17 * 101);
        assert_eq!(mesh.triangle_count(), 16 * 100 * 2);
        let size = mesh.bounding_box().unwrap().size();
        assert!((size.x - 1.6).abs() < 1e-3);
        assert!((size.z - 0.4).abs() < 1e-3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(build_primitive(&Primitive::Plane { width: 0.0, height: 1.0 }).is_err());
        assert!(
            build_primitive(&Primitive::Torus {
                radius: 1.0,
                tube: 0.1,
                radial_segments: 2,
                tubular_segments: 10,
            })
            .is_err()
        );
    }
}
