use glam::Mat4;
use showcase_common::{Color, Transform};
use showcase_geometry::MeshData;

use crate::camera::PerspectiveCamera;
use crate::light::Light;
use crate::material::Material;

/// Index of a node inside its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Index of a shared mesh in the geometry pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(usize);

/// Index of a shared material in the material pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl GeometryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A drawable instance referencing pooled geometry and material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub cast_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshInstance),
    Light(Light),
    Camera(PerspectiveCamera),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Exponential-squared distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    /// Fraction of the fog color mixed in at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        1.0 - (-d * d).exp()
    }
}

/// Arena-backed node tree with pooled geometry and materials.
///
/// Nodes are only ever appended, so ids stay valid until [`SceneGraph::release`].
/// Children are visited in insertion order.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    geometries: Vec<MeshData>,
    materials: Vec<Material>,
    pub fog: Option<Fog>,
    released: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// An empty graph holding only the root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".into(),
                transform: Transform::default(),
                kind: NodeKind::Group,
                parent: None,
                children: Vec::new(),
            }],
            geometries: Vec::new(),
            materials: Vec::new(),
            fog: None,
            released: false,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_geometry(&mut self, mesh: MeshData) -> GeometryId {
        self.geometries.push(mesh);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Append a node under `parent`. Returns `None` when `parent` does not exist.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> Option<NodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            transform,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    pub fn add_group(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Option<NodeId> {
        self.add_node(parent, name, NodeKind::Group, transform)
    }

    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        instance: MeshInstance,
        transform: Transform,
    ) -> Option<NodeId> {
        if instance.geometry.0 >= self.geometries.len() || instance.material.0 >= self.materials.len()
        {
            return None;
        }
        self.add_node(parent, name, NodeKind::Mesh(instance), transform)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(id.0).map(|n| &mut n.transform)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&MeshData> {
        self.geometries.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &MeshData)> {
        self.geometries
            .iter()
            .enumerate()
            .map(|(i, g)| (GeometryId(i), g))
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Ids of every node named `name`, in creation order.
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.name == name)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Model-to-world matrix of `id`, composing every ancestor.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id.0)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    /// Depth-first, pre-order walk from the root with each node's world matrix.
    pub fn traverse(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![(NodeId(0), Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();
            out.push((id, world));
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out
    }

    /// Every mesh node with its world matrix, in traversal order.
    pub fn mesh_instances(&self) -> Vec<(NodeId, MeshInstance, Mat4)> {
        self.traverse()
            .into_iter()
            .filter_map(|(id, world)| match &self.nodes[id.0].kind {
                NodeKind::Mesh(instance) => Some((id, *instance, world)),
                _ => None,
            })
            .collect()
    }

    /// Every light with its world position, in traversal order.
    pub fn lights(&self) -> Vec<(&Light, Mat4)> {
        self.traverse()
            .into_iter()
            .filter_map(|(id, world)| match &self.nodes[id.0].kind {
                NodeKind::Light(light) => Some((light, world)),
                _ => None,
            })
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Drop every node, mesh and material. Returns `false` if already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            geometries = self.geometries.len(),
            materials = self.materials.len(),
            "releasing scene graph"
        );
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
        self.geometries.clear();
        self.materials.clear();
        self.fog = None;
        self.released = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use showcase_geometry::{Primitive, build_primitive};

    fn quad_graph() -> (SceneGraph, MeshInstance) {
        let mut graph = SceneGraph::new();
        let geometry = graph.add_geometry(
            build_primitive(&Primitive::Plane {
                width: 1.0,
                height: 1.0,
            })
            .unwrap(),
        );
        let material = graph.add_material(Material::unlit("quad", Color::WHITE));
        let instance = MeshInstance {
            geometry,
            material,
            cast_shadow: false,
        };
        (graph, instance)
    }

    #[test]
    fn world_matrix_composes_ancestors() {
        let (mut graph, quad) = quad_graph();
        let root = graph.root();
        let group = graph
            .add_group(root, "group", Transform::from_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let leaf = graph
            .add_mesh(group, "leaf", quad, Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        let world = graph.world_matrix(leaf).unwrap();
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn traversal_is_preorder_in_insertion_order() {
        let (mut graph, quad) = quad_graph();
        let root = graph.root();
        let a = graph.add_group(root, "a", Transform::default()).unwrap();
        let a1 = graph.add_mesh(a, "a1", quad, Transform::default()).unwrap();
        let b = graph.add_mesh(root, "b", quad, Transform::default()).unwrap();
        let order: Vec<NodeId> = graph.traverse().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![root, a, a1, b]);
        assert_eq!(graph.mesh_instances().len(), 2);
    }

    #[test]
    fn shared_geometry_is_stored_once() {
        let (mut graph, quad) = quad_graph();
        let root = graph.root();
        for i in 0..3 {
            graph.add_mesh(root, format!("copy{i}"), quad, Transform::default());
        }
        assert_eq!(graph.geometry_count(), 1);
        assert_eq!(graph.find_by_name("copy2").len(), 1);
    }

    #[test]
    fn dangling_references_are_refused() {
        let (mut graph, quad) = quad_graph();
        let missing = NodeId(99);
        assert!(graph.add_group(missing, "x", Transform::default()).is_none());
        let bad = MeshInstance {
            material: MaterialId(7),
            ..quad
        };
        assert!(graph.add_mesh(graph.root(), "x", bad, Transform::default()).is_none());
    }

    #[test]
    fn release_happens_once() {
        let (mut graph, quad) = quad_graph();
        graph.add_mesh(graph.root(), "m", quad, Transform::default());
        assert!(graph.release());
        assert!(!graph.release());
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.geometry_count(), 0);
        assert!(graph.mesh_instances().is_empty());
    }

    #[test]
    fn fog_grows_with_distance() {
        let fog = Fog {
            color: Color::BLACK,
            density: 0.005,
        };
        assert_eq!(fog.factor(0.0), 0.0);
        assert!(fog.factor(18.0) < fog.factor(100.0));
        assert!(fog.factor(100.0) < 1.0);
    }
}
