//! Scene graph nodes
//!
//! A loaded model becomes a [`SceneGraph`]: an arena of [`Node`]s with a
//! single group root. Traversal is depth-first pre-order, which is also the
//! order used to break ties between equidistant picks.

use cgmath::{Matrix4, SquareMatrix};

use super::mesh::{Mesh, MeshId};
use crate::config::LightSpec;

/// Index of a node inside its [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node is
#[derive(Debug)]
pub enum NodeKind {
    /// Paintable and hit-testable geometry
    Mesh(Mesh),
    /// Pure transform node grouping its children
    Group,
    Light(LightSpec),
    /// Anything else the source format carries (cameras, empties with extras)
    Other,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Mesh(_) => "Mesh",
            NodeKind::Group => "Group",
            NodeKind::Light(_) => "Light",
            NodeKind::Other => "Other",
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    /// Transform relative to the parent node
    pub transform: Matrix4<f32>,
    /// Set once at load time for nodes that react to hovering
    pub interactive: bool,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Matrix4::identity(),
            interactive: false,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Current emphasis color, `None` for nodes that cannot be painted
    pub fn emissive(&self) -> Option<[f32; 3]> {
        self.as_mesh().map(|mesh| mesh.material.emissive)
    }

    /// Sets the emphasis color; returns true if anything changed
    pub fn set_emissive(&mut self, color: [f32; 3]) -> bool {
        match self.as_mesh_mut() {
            Some(mesh) if mesh.material.emissive != color => {
                mesh.material.emissive = color;
                true
            }
            _ => false,
        }
    }
}

/// Arena-backed node hierarchy of one loaded model
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SceneGraph {
    /// Creates a graph holding only an empty group root
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::group(root_name)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Attaches `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Visits every node in depth-first pre-order with its world transform
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &Node, &Matrix4<f32>),
    {
        let mut stack = vec![(self.root, Matrix4::identity())];
        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform;
            visit(id, node, &world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// World transform of a single node
    pub fn world_transform(&self, id: NodeId) -> Matrix4<f32> {
        let mut world = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id.0)) {
            world = node.transform * world;
            current = node.parent;
        }
        world
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.traverse(|id, node, _| {
            if found.is_none() && node.name == name {
                found = Some(id);
            }
        });
        found
    }

    /// Ids of every mesh in the graph
    pub fn mesh_ids(&self) -> Vec<MeshId> {
        self.nodes
            .iter()
            .filter_map(|node| node.as_mesh().map(Mesh::id))
            .collect()
    }

    /// True when at least one mesh has a triangle to draw
    pub fn has_geometry(&self) -> bool {
        self.nodes
            .iter()
            .filter_map(Node::as_mesh)
            .any(|mesh| mesh.index_count() >= 3)
    }

    /// Scales the root uniformly, on top of its current transform
    pub fn set_root_scale(&mut self, scale: f32) {
        let root = &mut self.nodes[self.root.0];
        root.transform = Matrix4::from_scale(scale) * root.transform;
    }

    /// Renames mesh nodes labelled `raw` (ASCII case-insensitive) to
    /// `canonical`; returns how many were renamed
    pub fn rename_meshes(&mut self, raw: &str, canonical: &str) -> usize {
        let mut renamed = 0;
        for node in self.nodes.iter_mut() {
            if node.as_mesh().is_some() && node.name.eq_ignore_ascii_case(raw) {
                node.name = canonical.to_string();
                renamed += 1;
            }
        }
        renamed
    }

    /// Flags every mesh whose name contains `marker` as interactive;
    /// returns how many were flagged
    pub fn flag_interactive(&mut self, marker: &str) -> usize {
        let mut flagged = 0;
        for node in self.nodes.iter_mut() {
            node.interactive = node.as_mesh().is_some() && node.name.contains(marker);
            if node.interactive {
                flagged += 1;
            }
        }
        flagged
    }

    /// Logs the type and name of every node at debug level
    pub fn log_nodes(&self) {
        self.traverse(|_, node, _| {
            log::debug!("Type: {}, Name: {}", node.kind.label(), node.name);
        });
    }
}
