use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;
use skinner_asset::{mesh::MeshAsset, primitive::PrimitiveAssetMode};

use crate::backend::{DrawCall, RenderBackend, ShaderUniforms};

pub struct Primitive<B: RenderBackend> {
    mode: PrimitiveAssetMode,
    vertex_buffer: B::Buffer,
    index_buffer: Option<B::Buffer>,
    count: usize,
    texture: Option<Arc<B::Texture>>,
}

impl<B: RenderBackend> Primitive<B> {
    /// Indices to draw, or vertices when there is no index buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mode(&self) -> PrimitiveAssetMode {
        self.mode
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn texture(&self) -> Option<&Arc<B::Texture>> {
        self.texture.as_ref()
    }
}

/// A mesh whose primitives live in GPU buffers.
pub struct Mesh<B: RenderBackend> {
    name: Option<String>,
    primitives: Vec<Primitive<B>>,
}

impl<B: RenderBackend> fmt::Debug for Mesh<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("primitives", &self.primitives.len())
            .finish()
    }
}

impl<B: RenderBackend> Mesh<B> {
    /// Create the buffers for every primitive of `asset`. Textures are
    /// looked up by source image index in `textures`; primitives whose
    /// image is absent there draw untextured.
    pub fn upload(
        backend: &mut B,
        asset: &MeshAsset,
        textures: &HashMap<usize, Arc<B::Texture>>,
    ) -> Self {
        let primitives = asset
            .primitives
            .iter()
            .map(|primitive| Primitive {
                mode: primitive.mode,
                vertex_buffer: backend.create_vertex_buffer(primitive.vertex_bytes()),
                index_buffer: primitive
                    .index_bytes()
                    .map(|indices| backend.create_index_buffer(indices)),
                count: primitive.draw_count(),
                texture: primitive
                    .texture
                    .and_then(|image| textures.get(&image))
                    .cloned(),
            })
            .collect::<Vec<_>>();
        debug!(
            "Uploaded mesh {:?} with {} primitives",
            asset.name,
            primitives.len()
        );
        Self {
            name: asset.name.clone(),
            primitives,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn primitives(&self) -> &[Primitive<B>] {
        &self.primitives
    }

    /// Draw every primitive, toggling `has_texture_uniform` to match.
    pub fn draw(&self, backend: &mut B, has_texture_uniform: &str)
    where
        B: ShaderUniforms,
    {
        for primitive in &self.primitives {
            let texture = primitive.texture.as_deref();
            backend.set_uniform_int(has_texture_uniform, i32::from(texture.is_some()));
            backend.draw(DrawCall {
                mode: primitive.mode,
                vertex_buffer: &primitive.vertex_buffer,
                index_buffer: primitive.index_buffer.as_ref(),
                count: primitive.count,
                texture,
            });
        }
    }
}
