use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use crate::mesh::MeshData;
use crate::{GeometryError, require_non_negative, require_positive, require_segments};

/// Points closer than this are merged when the contour is sampled.
const MERGE_EPSILON: f32 = 1e-6;

/// Bevelled extrusion of a rounded rectangle, e.g. a phone case.
///
/// The contour is four straight edges joined by quarter-round corners, each
/// corner approximated by a quadratic Bézier curve whose control point is the
/// sharp corner of the enclosing rectangle. The contour is swept along +Z by
/// `depth`; the bevel grows the outline by `bevel_size` over `bevel_thickness`
/// on both faces, following a quarter-circle profile. A zero `bevel_size`
/// and `bevel_thickness` gives straight sides; a bevel with only one of them
/// set, or with no segments, is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedPanel {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub depth: f32,
    pub bevel_size: f32,
    pub bevel_thickness: f32,
    pub bevel_segments: u32,
    pub curve_segments: u32,
}

impl RoundedPanel {
    pub const DEFAULT_BEVEL_SEGMENTS: u32 = 4;
    pub const DEFAULT_CURVE_SEGMENTS: u32 = 12;

    /// Bevel thickness defaults to `bevel_size`.
    pub fn new(width: f32, height: f32, corner_radius: f32, depth: f32, bevel_size: f32) -> Self {
        Self {
            width,
            height,
            corner_radius,
            depth,
            bevel_size,
            bevel_thickness: bevel_size,
            bevel_segments: Self::DEFAULT_BEVEL_SEGMENTS,
            curve_segments: Self::DEFAULT_CURVE_SEGMENTS,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        require_positive("width", self.width)?;
        require_positive("height", self.height)?;
        require_positive("depth", self.depth)?;
        require_non_negative("corner_radius", self.corner_radius)?;
        require_non_negative("bevel_size", self.bevel_size)?;
        require_non_negative("bevel_thickness", self.bevel_thickness)?;
        require_segments("curve_segments", 1, self.curve_segments)?;
        let bevel_requested = self.bevel_size > 0.0 || self.bevel_thickness > 0.0;
        let bevel_complete =
            self.bevel_size > 0.0 && self.bevel_thickness > 0.0 && self.bevel_segments > 0;
        if bevel_requested && !bevel_complete {
            return Err(GeometryError::IncompleteBevel {
                size: self.bevel_size,
                thickness: self.bevel_thickness,
                segments: self.bevel_segments,
            });
        }
        let limit = self.width.min(self.height) * 0.5;
        if self.corner_radius >= limit {
            return Err(GeometryError::CornerRadiusTooLarge {
                radius: self.corner_radius,
                limit,
            });
        }
        Ok(())
    }

    /// Sampled outline, counter-clockwise, without a repeated closing point.
    pub fn contour(&self) -> Result<Vec<Vec2>, GeometryError> {
        self.validate()?;
        let (w, h, r) = (self.width, self.height, self.corner_radius);
        let x = -w / 2.0;
        let y = -h / 2.0;

        let mut path = ContourPath::new(self.curve_segments);
        path.move_to(Vec2::new(x + r, y + h));
        path.line_to(Vec2::new(x + w - r, y + h));
        path.quadratic_to(Vec2::new(x + w, y + h), Vec2::new(x + w, y + h - r));
        path.line_to(Vec2::new(x + w, y + r));
        path.quadratic_to(Vec2::new(x + w, y), Vec2::new(x + w - r, y));
        path.line_to(Vec2::new(x + r, y));
        path.quadratic_to(Vec2::new(x, y), Vec2::new(x, y + r));
        path.line_to(Vec2::new(x, y + h - r));
        path.quadratic_to(Vec2::new(x, y + h), Vec2::new(x + r, y + h));

        let mut points = path.finish();
        if signed_area(&points) < 0.0 {
            points.reverse();
        }
        Ok(points)
    }

    /// Extrude, bevel and centre the panel.
    pub fn build(&self) -> Result<MeshData, GeometryError> {
        let contour = self.contour()?;
        let miters = miter_vectors(&contour);
        let layers = self.layers();

        let rings: Vec<Vec<Vec3>> = layers
            .iter()
            .map(|&(z, offset)| {
                contour
                    .iter()
                    .zip(&miters)
                    .map(|(p, m)| (*p + *m * offset).extend(z))
                    .collect()
            })
            .collect();

        let n = contour.len();
        let quads = n * (rings.len() - 1);
        let mut mesh = MeshData::with_capacity(quads * 4 + 2 * (n + 1), quads * 6 + 6 * n);

        push_cap(&mut mesh, &rings[0], -Vec3::Z, self.width, self.height);
        push_cap(&mut mesh, &rings[rings.len() - 1], Vec3::Z, self.width, self.height);

        let last_layer = (rings.len() - 1) as f32;
        for (layer, pair) in rings.windows(2).enumerate() {
            let (lower, upper) = (&pair[0], &pair[1]);
            let v0 = layer as f32 / last_layer;
            let v1 = (layer + 1) as f32 / last_layer;
            for i in 0..n {
                let j = (i + 1) % n;
                let (a, b, c, d) = (lower[i], lower[j], upper[j], upper[i]);
                let normal = quad_normal(a, b, c, d);
                let u0 = i as f32 / n as f32;
                let u1 = (i + 1) as f32 / n as f32;
                let ia = mesh.push_vertex(a, normal, Vec2::new(u0, v0));
                let ib = mesh.push_vertex(b, normal, Vec2::new(u1, v0));
                let ic = mesh.push_vertex(c, normal, Vec2::new(u1, v1));
                let id = mesh.push_vertex(d, normal, Vec2::new(u0, v1));
                mesh.push_triangle(ia, ib, ic);
                mesh.push_triangle(ia, ic, id);
            }
        }

        mesh.center();
        tracing::debug!(
            vertices = mesh.vertices.len(),
            triangles = mesh.triangle_count(),
            "built rounded panel"
        );
        Ok(mesh)
    }

    /// `(z, outline offset)` for every ring from the front face to the back face.
    fn layers(&self) -> Vec<(f32, f32)> {
        let bevelled = self.bevel_segments > 0 && self.bevel_size > 0.0;
        if !bevelled {
            return vec![(0.0, 0.0), (self.depth, 0.0)];
        }
        let segments = self.bevel_segments;
        let profile = |b: u32| {
            let t = b as f32 / segments as f32;
            let angle = t * FRAC_PI_2;
            (self.bevel_thickness * angle.cos(), self.bevel_size * angle.sin())
        };

        let mut layers = Vec::with_capacity(2 * segments as usize + 2);
        for b in 0..segments {
            let (dz, offset) = profile(b);
            layers.push((-dz, offset));
        }
        layers.push((0.0, self.bevel_size));
        layers.push((self.depth, self.bevel_size));
        for b in (0..segments).rev() {
            let (dz, offset) = profile(b);
            layers.push((self.depth + dz, offset));
        }
        layers
    }
}

/// Convenience form with default bevel thickness and segment counts.
pub fn build_rounded_panel(
    width: f32,
    height: f32,
    corner_radius: f32,
    depth: f32,
    bevel_size: f32,
) -> Result<MeshData, GeometryError> {
    RoundedPanel::new(width, height, corner_radius, depth, bevel_size).build()
}

struct ContourPath {
    points: Vec<Vec2>,
    curve_segments: u32,
}

impl ContourPath {
    fn new(curve_segments: u32) -> Self {
        Self {
            points: Vec::new(),
            curve_segments,
        }
    }

    fn push(&mut self, p: Vec2) {
        match self.points.last() {
            Some(last) if last.distance(p) <= MERGE_EPSILON => {}
            _ => self.points.push(p),
        }
    }

    fn move_to(&mut self, p: Vec2) {
        self.push(p);
    }

    fn line_to(&mut self, p: Vec2) {
        self.push(p);
    }

    fn quadratic_to(&mut self, control: Vec2, end: Vec2) {
        let start = self.points.last().copied().unwrap_or(end);
        for i in 1..=self.curve_segments {
            let t = i as f32 / self.curve_segments as f32;
            let s = 1.0 - t;
            self.push(start * (s * s) + control * (2.0 * s * t) + end * (t * t));
        }
    }

    fn finish(mut self) -> Vec<Vec2> {
        if self.points.len() > 1 {
            let first = self.points[0];
            if self.points[self.points.len() - 1].distance(first) <= MERGE_EPSILON {
                self.points.pop();
            }
        }
        self.points
    }
}

fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

/// Outward offset direction per contour point, scaled so that moving by
/// `offset` along it keeps both adjacent edges `offset` away from the original.
fn miter_vectors(contour: &[Vec2]) -> Vec<Vec2> {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let curr = contour[i];
            let next = contour[(i + 1) % n];
            let n1 = outward_normal(curr - prev);
            let n2 = outward_normal(next - curr);
            let bisector = n1 + n2;
            if bisector.length_squared() < 1e-12 {
                return n1;
            }
            let bisector = bisector.normalize();
            bisector / bisector.dot(n1).max(1e-3)
        })
        .collect()
}

/// Right-hand normal, which points outward for a counter-clockwise contour.
fn outward_normal(edge: Vec2) -> Vec2 {
    Vec2::new(edge.y, -edge.x).normalize_or_zero()
}

fn quad_normal(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Vec3 {
    let n = (c - a).cross(d - b);
    if n.length_squared() < 1e-14 { Vec3::Z } else { n.normalize() }
}

/// Triangle fan around the ring centroid. The ring is convex.
fn push_cap(mesh: &mut MeshData, ring: &[Vec3], normal: Vec3, width: f32, height: f32) {
    let planar_uv = |p: Vec3| Vec2::new(p.x / width + 0.5, p.y / height + 0.5);
    let centroid = ring.iter().copied().sum::<Vec3>() / ring.len() as f32;
    let center = mesh.push_vertex(centroid, normal, planar_uv(centroid));
    let first = mesh.vertices.len() as u32;
    for p in ring {
        mesh.push_vertex(*p, normal, planar_uv(*p));
    }
    let n = ring.len() as u32;
    let faces_positive_z = normal.z > 0.0;
    for i in 0..n {
        let a = first + i;
        let b = first + (i + 1) % n;
        if faces_positive_z {
            mesh.push_triangle(center, a, b);
        } else {
            mesh.push_triangle(center, b, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_case() -> MeshData {
        build_rounded_panel(5.2, 10.5, 0.6, 0.5, 0.05).unwrap()
    }

    #[test]
    fn phone_case_is_centered() {
        let bounds = phone_case().bounding_box().unwrap();
        assert!(bounds.center().length() < 1e-4, "center {:?}", bounds.center());
    }

    #[test]
    fn bevel_grows_outline_and_depth() {
        let size = phone_case().bounding_box().unwrap().size();
        assert!((size.x - 5.3).abs() < 1e-3, "width {}", size.x);
        assert!((size.y - 10.6).abs() < 1e-3, "height {}", size.y);
        assert!((size.z - 0.6).abs() < 1e-4, "depth {}", size.z);
    }

    #[test]
    fn construction_is_deterministic() {
        assert_eq!(phone_case(), phone_case());
    }

    #[test]
    fn normals_are_unit_and_indices_in_range() {
        let mesh = phone_case();
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
        for v in &mesh.vertices {
            let len = Vec3::from_array(v.normal).length();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn contour_is_counter_clockwise_and_open() {
        let panel = RoundedPanel::new(5.2, 10.5, 0.6, 0.5, 0.05);
        let contour = panel.contour().unwrap();
        assert!(signed_area(&contour) > 0.0);
        assert!(contour[0].distance(contour[contour.len() - 1]) > MERGE_EPSILON);
        // start + 4 line ends + 12 samples per corner, minus the closing sample
        assert_eq!(contour.len(), 4 * 12 + 4);
    }

    #[test]
    fn side_walls_face_outward() {
        let mesh = phone_case();
        for tri in mesh.indices.chunks(3) {
            let v = &mesh.vertices[tri[0] as usize];
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            if n.z.abs() < 0.5 {
                assert!(p.truncate().dot(n.truncate()) > 0.0);
            }
        }
    }

    #[test]
    fn rejects_oversized_corner_radius() {
        let err = build_rounded_panel(5.2, 10.5, 2.6, 0.5, 0.05).unwrap_err();
        assert!(matches!(err, GeometryError::CornerRadiusTooLarge { .. }));
        assert!(build_rounded_panel(5.2, 10.5, 3.0, 0.5, 0.05).is_err());
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(build_rounded_panel(0.0, 10.5, 0.6, 0.5, 0.05).is_err());
        assert!(build_rounded_panel(5.2, 10.5, 0.6, -1.0, 0.05).is_err());
        assert!(build_rounded_panel(5.2, 10.5, -0.1, 0.5, 0.05).is_err());
        assert!(build_rounded_panel(5.2, f32::INFINITY, 0.6, 0.5, 0.05).is_err());
    }

    #[test]
    fn square_corners_and_no_bevel_give_a_box() {
        let mesh = build_rounded_panel(2.0, 4.0, 0.0, 1.0, 0.0).unwrap();
        let size = mesh.bounding_box().unwrap().size();
        assert!((size - Vec3::new(2.0, 4.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn cap_winding_matches_cap_normal() {
        let mesh = phone_case();
        let mut caps = 0;
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let n = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            let face = (b - a).cross(c - a);
            let at_cap_center = a.truncate().length() < 1e-3;
            if at_cap_center && n.z.abs() > 0.99 && face.length() > 1e-8 {
                caps += 1;
                assert!(face.dot(n) > 0.0, "cap triangle wound against its normal");
            }
        }
        assert!(caps > 0);
    }

    #[test]
    fn bevel_without_segments_is_rejected() {
        let mut panel = RoundedPanel::new(5.2, 10.5, 0.6, 0.5, 0.05);
        panel.bevel_segments = 0;
        assert!(matches!(
            panel.build(),
            Err(GeometryError::IncompleteBevel { segments: 0, .. })
        ));

        let mut half = RoundedPanel::new(5.2, 10.5, 0.6, 0.5, 0.05);
        half.bevel_thickness = 0.0;
        assert!(matches!(half.validate(), Err(GeometryError::IncompleteBevel { .. })));

        let mut flat = RoundedPanel::new(5.2, 10.5, 0.6, 0.5, 0.0);
        flat.bevel_segments = 0;
        assert!(flat.build().is_ok());
    }
}
