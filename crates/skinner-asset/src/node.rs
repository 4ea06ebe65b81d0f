use glam::{Mat4, Quat, Vec3};
use log::trace;

use crate::error::HierarchyError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl DecomposedTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl From<NodeTransform> for Mat4 {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => matrix,
            NodeTransform::Decomposed(decomposed) => decomposed.matrix(),
        }
    }
}

impl From<NodeTransform> for DecomposedTransform {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
                DecomposedTransform {
                    translation,
                    rotation,
                    scale,
                }
            }
            NodeTransform::Decomposed(decomposed) => decomposed,
        }
    }
}

/// A node as it appears in the source file, before the tree is linked.
#[derive(Debug, Clone, Default)]
pub struct NodeRecord {
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Node {
    index: usize,
    name: Option<String>,
    transform: DecomposedTransform,
    local: Mat4,
    global: Mat4,
    children: Vec<usize>,
    parent: Option<usize>,
    inverse_bind: Mat4,
    is_joint: bool,
}

impl Node {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Local translation, rotation and scale. Written by animation
    /// channels; takes effect on the next [`SceneGraph::update_hierarchy`].
    pub fn transform(&self) -> &DecomposedTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut DecomposedTransform {
        &mut self.transform
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.local
    }

    pub fn global_matrix(&self) -> Mat4 {
        self.global
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Identity unless the node is a joint of the skin.
    pub fn inverse_bind(&self) -> Mat4 {
        self.inverse_bind
    }

    pub fn is_joint(&self) -> bool {
        self.is_joint
    }

    pub(crate) fn mark_joint(&mut self, inverse_bind: Mat4) {
        self.is_joint = true;
        self.inverse_bind = inverse_bind;
    }
}

/// Node tree stored as an arena. Node `i` is source record `i`; skins and
/// animation channels address nodes by that index.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

impl SceneGraph {
    /// Link `records` into a tree.
    ///
    /// Fails when a child index is out of range, a node has more than one
    /// parent, or some nodes form a cycle. Any node that no other node lists
    /// as a child is a root; several roots are fine.
    pub fn build(records: Vec<NodeRecord>) -> Result<Self, HierarchyError> {
        let count = records.len();
        let mut parents: Vec<Option<usize>> = vec![None; count];
        for (index, record) in records.iter().enumerate() {
            for &child in &record.children {
                if child >= count {
                    return Err(HierarchyError::ChildOutOfRange {
                        parent: index,
                        child,
                        count,
                    });
                }
                if child == index {
                    return Err(HierarchyError::Cycle { node: index });
                }
                if let Some(first) = parents[child] {
                    return Err(HierarchyError::MultipleParents {
                        child,
                        first,
                        second: index,
                    });
                }
                parents[child] = Some(index);
            }
        }
        let roots: Vec<usize> = (0..count).filter(|index| parents[*index].is_none()).collect();

        // Every node has at most one parent now, so anything unreachable
        // from the roots hangs off a cycle.
        let mut visited = vec![false; count];
        let mut stack = roots.clone();
        while let Some(index) = stack.pop() {
            if visited[index] {
                return Err(HierarchyError::Cycle { node: index });
            }
            visited[index] = true;
            stack.extend_from_slice(&records[index].children);
        }
        if let Some(node) = visited.iter().position(|visited| !visited) {
            return Err(HierarchyError::Cycle { node });
        }

        let nodes = records
            .into_iter()
            .zip(parents)
            .enumerate()
            .map(|(index, (record, parent))| {
                let transform: DecomposedTransform = record.transform.into();
                Node {
                    index,
                    name: record.name,
                    transform,
                    local: transform.matrix(),
                    global: Mat4::IDENTITY,
                    children: record.children,
                    parent,
                    inverse_bind: Mat4::IDENTITY,
                    is_joint: false,
                }
            })
            .collect();

        let mut graph = Self { nodes, roots };
        graph.update_hierarchy();
        Ok(graph)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
    }

    /// Rebuild local matrices from translation/rotation/scale, then walk
    /// down from every root setting `global = parent_global * local`.
    ///
    /// Parents are always visited before their children and every node
    /// exactly once.
    pub fn update_hierarchy(&mut self) {
        for node in &mut self.nodes {
            node.local = node.transform.matrix();
        }

        let mut stack: Vec<(usize, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|root| (*root, Mat4::IDENTITY))
            .collect();
        let mut visited = 0;
        while let Some((index, parent_global)) = stack.pop() {
            let node = &mut self.nodes[index];
            node.global = parent_global * node.local;
            let global = node.global;
            stack.extend(node.children.iter().rev().map(|child| (*child, global)));
            visited += 1;
        }
        trace!("Updated {} node transforms", visited);
    }
}
