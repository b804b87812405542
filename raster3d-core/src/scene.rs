//! Scene graph: a tree of nodes carrying local transforms, meshes and materials
//!
//! Nodes own their children and their material. Meshes are shared through
//! `Arc` so many nodes can draw the same geometry. The tree must be acyclic;
//! ownership makes a cycle impossible to build.

use std::fmt;
use std::sync::Arc;

use crate::geometry::Mesh;
use crate::material::{FlatColorMaterial, Material};
use crate::transform::Transform;

/// Per-frame update hook attached to a node.
///
/// Runs before the node's global transform is computed, so it may move the
/// node itself or any of its descendants for the current frame.
pub trait Behavior: Send {
    fn update(&mut self, transform: &mut Transform, children: &mut [Node], delta: f64);
}

impl<F> Behavior for F
where
    F: FnMut(&mut Transform, &mut [Node], f64) + Send,
{
    fn update(&mut self, transform: &mut Transform, children: &mut [Node], delta: f64) {
        self(transform, children, delta)
    }
}

pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub mesh: Option<Arc<Mesh>>,
    pub material: Box<dyn Material>,
    pub children: Vec<Node>,
    behavior: Option<Box<dyn Behavior>>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            name: None,
            transform: Transform::identity(),
            mesh: None,
            material: Box::new(FlatColorMaterial::default()),
            children: Vec::new(),
            behavior: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_material(mut self, material: impl Material + 'static) -> Self {
        self.material = Box::new(material);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Run this node's update hook, if any
    pub fn update(&mut self, delta: f64) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.update(&mut self.transform, &mut self.children, delta);
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// Depth-first pre-order walk yielding each node with its global transform.
    ///
    /// The iterator is lazy and reads the tree as it is when each node is
    /// reached; calling `traverse` again reflects any mutation in between.
    pub fn traverse(&self) -> Traverse<'_> {
        self.traverse_from(Transform::identity())
    }

    /// Like [`traverse`](Self::traverse), seeded with a parent transform
    pub fn traverse_from(&self, parent: Transform) -> Traverse<'_> {
        Traverse {
            stack: vec![(self, parent)],
        }
    }

    /// The frame-loop walk: for each node in pre-order, run its update hook,
    /// compute its global transform, then hand both to `visit`.
    pub fn update_and_visit<F>(&mut self, parent: &Transform, delta: f64, visit: &mut F)
    where
        F: FnMut(&Node, &Transform),
    {
        self.update(delta);
        let global = parent.compose(&self.transform);
        visit(self, &global);
        for child in &mut self.children {
            child.update_and_visit(&global, delta, &mut *visit);
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("mesh", &self.mesh.as_ref().map(|m| m.triangle_count()))
            .field("material", &self.material)
            .field("children", &self.children)
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}

/// Iterator returned by [`Node::traverse`]
pub struct Traverse<'a> {
    /// Nodes still to visit, paired with their parent's global transform
    stack: Vec<(&'a Node, Transform)>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (&'a Node, Transform);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, parent) = self.stack.pop()?;
        let global = parent.compose(&node.transform);
        // Reverse so the first child is popped next
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, global)));
        Some((node, global))
    }
}
