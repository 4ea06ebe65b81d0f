use std::{collections::BTreeMap, sync::Arc};

use crate::{
    animation::AnimationAsset, error::Diagnostic, mesh::MeshAsset, node::SceneGraph, skin::Skin,
    texture::TextureAsset,
};

/// Everything a skinned model needs, decoded and validated, with no GPU
/// resources attached yet.
#[derive(Debug, Default)]
pub struct ModelAsset {
    pub graph: SceneGraph,
    pub skin: Option<Skin>,
    pub meshes: Vec<MeshAsset>,
    pub animations: Vec<AnimationAsset>,
    /// Keyed by source image index; primitives sharing an image share one entry.
    pub textures: BTreeMap<usize, Arc<TextureAsset>>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSummary {
    pub name: Option<String>,
    pub duration: f32,
    pub channels: usize,
}

impl ModelAsset {
    pub fn node_names(&self) -> Vec<Option<&str>> {
        self.graph.nodes().iter().map(|node| node.name()).collect()
    }

    /// Names of the skin's joints in bone order.
    pub fn joint_names(&self) -> Vec<Option<&str>> {
        let Some(skin) = &self.skin else {
            return Vec::new();
        };
        skin.joints
            .iter()
            .map(|joint| self.graph.node(*joint).and_then(|node| node.name()))
            .collect()
    }

    pub fn animation_summaries(&self) -> Vec<AnimationSummary> {
        self.animations
            .iter()
            .map(|animation| AnimationSummary {
                name: animation.name.clone(),
                duration: animation.duration,
                channels: animation.channels.len(),
            })
            .collect()
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.primitives.len()).sum()
    }
}
