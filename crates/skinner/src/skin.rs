use glam::Mat4;
use log::trace;
use skinner_asset::{node::SceneGraph, skin::Skin};

/// Length of the bone palette the skinning shader declares.
pub const MAX_JOINTS: usize = 100;

/// Bone palette for the current pose.
///
/// Entry `i` is `global * inverse_bind` of joint `i`. Joints past
/// [`MAX_JOINTS`] are dropped; unused entries, joints pointing at missing
/// nodes and models without a skin all yield identity.
pub fn joint_matrices(graph: &SceneGraph, skin: Option<&Skin>) -> [Mat4; MAX_JOINTS] {
    let mut matrices = [Mat4::IDENTITY; MAX_JOINTS];
    let Some(skin) = skin else {
        return matrices;
    };
    if skin.len() > MAX_JOINTS {
        trace!(
            "Skin has {} joints, exporting the first {}",
            skin.len(),
            MAX_JOINTS
        );
    }

    for (matrix, joint) in matrices.iter_mut().zip(&skin.joints) {
        if let Some(node) = graph.node(*joint) {
            *matrix = node.global_matrix() * node.inverse_bind();
        }
    }
    matrices
}
