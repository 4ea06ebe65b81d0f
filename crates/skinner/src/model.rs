use std::{collections::HashMap, path::Path, sync::Arc};

use glam::Mat4;
use log::{info, warn};
use skinner_asset::{
    error::{Diagnostic, LoadError},
    loader::{
        gltf::{load_glb_from_buffer, load_glb_from_path},
        AssetLoadParams,
    },
    node::SceneGraph,
    scene::ModelAsset,
    skin::Skin,
};

use crate::{
    animation::Animator,
    backend::{RenderBackend, ShaderUniforms},
    mesh::Mesh,
    skin::{joint_matrices, MAX_JOINTS},
};

/// A loaded skinned model with its GPU resources and playback state.
///
/// Owned by the thread driving the render loop; call [`Model::update`]
/// once per frame, then [`Model::draw`].
pub struct Model<B: RenderBackend> {
    graph: SceneGraph,
    skin: Option<Skin>,
    meshes: Vec<Mesh<B>>,
    animator: Animator,
    textures: HashMap<usize, Arc<B::Texture>>,
    params: AssetLoadParams,
    diagnostics: Vec<Diagnostic>,
}

impl<B: RenderBackend> Model<B> {
    pub fn from_path<P: AsRef<Path>>(
        backend: &mut B,
        path: P,
        params: AssetLoadParams,
    ) -> Result<Self, LoadError> {
        let asset = load_glb_from_path(path, &params)?;
        Ok(Self::from_asset(backend, asset, params))
    }

    pub fn from_slice(
        backend: &mut B,
        buffer: &[u8],
        params: AssetLoadParams,
    ) -> Result<Self, LoadError> {
        let asset = load_glb_from_buffer(buffer, &params)?;
        Ok(Self::from_asset(backend, asset, params))
    }

    /// Upload textures once per source image, then every mesh, and pose
    /// the model at the start of the active animation.
    pub fn from_asset(backend: &mut B, asset: ModelAsset, params: AssetLoadParams) -> Self {
        let ModelAsset {
            graph,
            skin,
            meshes,
            animations,
            textures,
            diagnostics,
        } = asset;

        let textures: HashMap<usize, Arc<B::Texture>> = textures
            .into_iter()
            .map(|(image, texture)| {
                let (width, height) = texture.size;
                let handle = backend.create_texture(&texture.pixels, width, height);
                (image, Arc::new(handle))
            })
            .collect();
        let meshes = meshes
            .iter()
            .map(|mesh| Mesh::upload(backend, mesh, &textures))
            .collect();

        if let Some(skin) = &skin {
            if skin.len() > MAX_JOINTS {
                warn!(
                    "Skin has {} joints, only the first {} are exported",
                    skin.len(),
                    MAX_JOINTS
                );
            }
        }
        if !diagnostics.is_empty() {
            info!("Model loaded with {} recoverable problems", diagnostics.len());
        }

        let animator = Animator::new(animations, params.active_animation);
        let mut model = Self {
            graph,
            skin,
            meshes,
            animator,
            textures,
            params,
            diagnostics,
        };
        model.animator.apply(&mut model.graph);
        model.graph.update_hierarchy();
        model
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn skin(&self) -> Option<&Skin> {
        self.skin.as_ref()
    }

    pub fn meshes(&self) -> &[Mesh<B>] {
        &self.meshes
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    /// Texture handles keyed by source image index.
    pub fn textures(&self) -> &HashMap<usize, Arc<B::Texture>> {
        &self.textures
    }

    pub fn params(&self) -> &AssetLoadParams {
        &self.params
    }

    /// Problems the load recovered from.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Advance playback by `elapsed` seconds and pose the node tree.
    pub fn update(&mut self, elapsed: f32) {
        self.animator.update(elapsed, &mut self.graph);
    }

    /// Recompute global matrices after editing node transforms by hand.
    pub fn update_hierarchy(&mut self) {
        self.graph.update_hierarchy();
    }

    pub fn joint_matrices(&self) -> [Mat4; MAX_JOINTS] {
        joint_matrices(&self.graph, self.skin.as_ref())
    }

    /// Upload the bone palette and draw every mesh.
    pub fn draw(&self, backend: &mut B)
    where
        B: ShaderUniforms,
    {
        backend.set_uniform_mat4_array(&self.params.bone_matrices_uniform, &self.joint_matrices());
        for mesh in &self.meshes {
            mesh.draw(backend, &self.params.has_texture_uniform);
        }
    }
}
