use glam::Mat4;
use log::warn;

use crate::{
    error::{Diagnostic, SkinError},
    node::SceneGraph,
};

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: Option<String>,
    /// Bone index to node index.
    pub joints: Vec<usize>,
    /// Aligned with `joints`.
    pub inverse_bind_matrices: Vec<Mat4>,
}

impl Skin {
    /// Mark every joint node in `graph` and hand it its inverse-bind matrix.
    ///
    /// Missing matrices default to identity. Joints that refer to missing
    /// nodes stay in the bone list, so bone indices keep matching the
    /// vertex data, but export as identity.
    pub fn resolve(
        graph: &mut SceneGraph,
        name: Option<String>,
        joints: Vec<usize>,
        inverse_bind_matrices: Option<Vec<Mat4>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut matrices = inverse_bind_matrices.unwrap_or_default();
        if !matrices.is_empty() && matrices.len() != joints.len() {
            let error = SkinError::InverseBindCount {
                joints: joints.len(),
                matrices: matrices.len(),
            };
            warn!("{}", error);
            diagnostics.push(error.into());
        }
        matrices.resize(joints.len(), Mat4::IDENTITY);

        for (joint, (node, inverse_bind)) in joints.iter().zip(&matrices).enumerate() {
            match graph.node_mut(*node) {
                Some(node) => node.mark_joint(*inverse_bind),
                None => {
                    let error = SkinError::JointOutOfRange {
                        joint,
                        node: *node,
                    };
                    warn!("{}", error);
                    diagnostics.push(error.into());
                }
            }
        }

        Self {
            name,
            joints,
            inverse_bind_matrices: matrices,
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
