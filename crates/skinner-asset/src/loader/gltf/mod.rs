use std::{
    collections::{BTreeMap, BTreeSet},
    fs, io,
    path::Path,
    sync::Arc,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    json::{
        accessor::{Accessor, GenericComponentType},
        animation::{Channel, Interpolation as GltfInterpolation, Property},
        buffer::View,
        mesh::{Mode, Primitive, Semantic},
        validation::Checked,
        Animation, Index, Root,
    },
    Gltf,
};
use log::{debug, info, warn};

use crate::{
    accessor::{self, chunk_vec, AccessorLayout, AccessorOutput},
    animation::{AnimationAsset, AnimationChannel, ChannelValues, Interpolation},
    error::{AccessorError, AnimationError, Diagnostic, LoadError, PrimitiveError, TextureError},
    mesh::MeshAsset,
    node::{DecomposedTransform, NodeRecord, NodeTransform, SceneGraph},
    primitive::{fit_indices, PrimitiveAsset, PrimitiveAssetMode, PrimitiveAttributes},
    scene::ModelAsset,
    skin::Skin,
    texture::{decode_texture, TextureAsset},
};

use super::AssetLoadParams;

/// Index of the buffer a GLB stores in its binary chunk.
const BIN_BUFFER: usize = 0;

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Reads a document that skipped `gltf` validation, so every index is
/// looked up with [`Root::get`] and may be dangling.
struct GltfDocumentLoader<'a> {
    root: &'a Root,
    blob: &'a [u8],
    params: &'a AssetLoadParams,
    texture_cache: BTreeMap<usize, Arc<TextureAsset>>,
    failed_images: BTreeSet<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> GltfDocumentLoader<'a> {
    fn new(root: &'a Root, blob: &'a [u8], params: &'a AssetLoadParams) -> Self {
        Self {
            root,
            blob,
            params,
            texture_cache: BTreeMap::new(),
            failed_images: BTreeSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Byte range of `view` inside the binary chunk.
    fn view_range(&self, index: Index<View>) -> Result<(&'a View, usize, usize), AccessorError> {
        let root = self.root;
        let view = root.get(index).ok_or(AccessorError::Dangling {
            kind: "buffer view",
            index: index.value(),
        })?;
        let buffer = view.buffer.value();
        let external = root
            .get(view.buffer)
            .ok_or(AccessorError::Dangling {
                kind: "buffer",
                index: buffer,
            })?
            .uri
            .is_some();
        if external || buffer != BIN_BUFFER {
            return Err(AccessorError::ExternalBuffer(buffer));
        }
        let offset = to_usize(view.byte_offset.map_or(0, |offset| offset.0));
        Ok((view, offset, to_usize(view.byte_length.0)))
    }

    fn read_accessor<T: AccessorOutput>(
        &self,
        accessor: &Accessor,
        components: usize,
    ) -> Result<Vec<T>, AccessorError> {
        if accessor.sparse.is_some() {
            return Err(AccessorError::Sparse);
        }
        let Checked::Valid(kind) = accessor.type_ else {
            return Err(AccessorError::Invalid("type"));
        };
        let actual = kind.multiplicity();
        if actual != components {
            return Err(AccessorError::Dimensions {
                expected: components,
                actual,
            });
        }
        let Checked::Valid(GenericComponentType(component_type)) = accessor.component_type else {
            return Err(AccessorError::Invalid("componentType"));
        };

        // Without a view the data is all zeroes, which callers fill in
        // themselves up to the size they need
        let view = accessor.buffer_view.ok_or(AccessorError::NoBufferView)?;
        let (view, view_offset, view_length) = self.view_range(view)?;
        let accessor_offset = to_usize(accessor.byte_offset.map_or(0, |offset| offset.0));

        let layout = AccessorLayout {
            offset: view_offset.saturating_add(accessor_offset),
            length: view_length.saturating_sub(accessor_offset),
            stride: view.byte_stride.map(|stride| stride.0),
            count: to_usize(accessor.count.0),
            component_type: component_type.as_gl_enum(),
            components,
            normalized: accessor.normalized,
        };
        accessor::read(self.blob, &layout)
    }

    /// Read an accessor, recording a diagnostic on failure.
    fn try_read<T: AccessorOutput>(
        &mut self,
        index: Index<Accessor>,
        usage: &'static str,
        components: usize,
    ) -> Option<Vec<T>> {
        let result = match self.root.get(index) {
            Some(accessor) => self.read_accessor(accessor, components),
            None => Err(AccessorError::Dangling {
                kind: "accessor",
                index: index.value(),
            }),
        };
        match result {
            Ok(data) => Some(data),
            Err(error) => {
                warn!("Accessor #{} ({}): {}", index.value(), usage, error);
                self.diagnostics.push(Diagnostic::Accessor {
                    index: index.value(),
                    usage,
                    error,
                });
                None
            }
        }
    }

    fn load_nodes(&self) -> Vec<NodeRecord> {
        self.root
            .nodes
            .iter()
            .map(|node| {
                let transform = match node.matrix {
                    Some(matrix) => NodeTransform::Matrix(Mat4::from_cols_array(&matrix)),
                    None => NodeTransform::Decomposed(DecomposedTransform {
                        translation: node.translation.map_or(Vec3::ZERO, Vec3::from_array),
                        rotation: node
                            .rotation
                            .map_or(Quat::IDENTITY, |rotation| Quat::from_array(rotation.0)),
                        scale: node.scale.map_or(Vec3::ONE, Vec3::from_array),
                    }),
                };
                NodeRecord {
                    name: node.name.clone(),
                    transform,
                    children: node.children.iter().flatten().map(Index::value).collect(),
                }
            })
            .collect()
    }

    fn load_skin(&mut self, graph: &mut SceneGraph) -> Option<Skin> {
        let root = self.root;
        let skin = root.skins.first()?;
        if root.skins.len() > 1 {
            info!("Using skin #0, ignoring {} more", root.skins.len() - 1);
        }

        let joints = skin.joints.iter().map(Index::value).collect();
        let inverse_bind_matrices = skin
            .inverse_bind_matrices
            .and_then(|index| self.try_read::<f32>(index, "inverse bind matrices", 16))
            .map(|data| data.chunks_exact(16).map(Mat4::from_cols_slice).collect());
        Some(Skin::resolve(
            graph,
            skin.name.clone(),
            joints,
            inverse_bind_matrices,
            &mut self.diagnostics,
        ))
    }

    fn load_texture(&mut self, image: usize) -> Result<Arc<TextureAsset>, TextureError> {
        if let Some(texture) = self.texture_cache.get(&image) {
            return Ok(texture.clone());
        }

        let root = self.root;
        let Some(source) = root.images.get(image) else {
            return Err(TextureError::NoSource);
        };
        let view = match (source.buffer_view, &source.uri) {
            (Some(view), _) => view,
            (None, Some(uri)) => return Err(TextureError::ExternalImage(uri.clone())),
            (None, None) => return Err(TextureError::NoSource),
        };
        let (_, offset, length) = self.view_range(view).map_err(|error| match error {
            AccessorError::ExternalBuffer(buffer) => match root.buffers.get(buffer) {
                Some(gltf::json::Buffer { uri: Some(uri), .. }) => {
                    TextureError::ExternalImage(uri.clone())
                }
                _ => TextureError::ExternalImage(format!("buffer #{}", buffer)),
            },
            _ => TextureError::OutOfBounds { view: view.value() },
        })?;
        let blob = self.blob;
        let data = offset
            .checked_add(length)
            .and_then(|end| blob.get(offset..end))
            .ok_or(TextureError::OutOfBounds { view: view.value() })?;

        let mime = source.mime_type.as_ref().map(|mime| mime.0.as_str());
        let texture = Arc::new(decode_texture(image, data, mime)?);
        self.texture_cache.insert(image, texture.clone());
        Ok(texture)
    }

    /// Follow material, base color texture and image down to the image
    /// index. `None` when a link is missing or the image cannot be decoded.
    fn load_primitive_texture(&mut self, primitive: &Primitive) -> Option<usize> {
        let root = self.root;
        let info = root
            .get(primitive.material?)?
            .pbr_metallic_roughness
            .base_color_texture
            .as_ref()?;
        let Some(texture) = root.get(info.index) else {
            debug!("Base color texture #{} does not exist", info.index.value());
            return None;
        };
        let index = texture.source.value();
        if !self.params.load_textures {
            return Some(index);
        }
        if self.failed_images.contains(&index) {
            return None;
        }

        match self.load_texture(index) {
            Ok(_) => Some(index),
            Err(error) => {
                warn!("Image #{} left untextured: {}", index, error);
                self.failed_images.insert(index);
                self.diagnostics
                    .push(Diagnostic::Texture { image: index, error });
                None
            }
        }
    }

    fn read_attribute<T: AccessorOutput, const N: usize>(
        &mut self,
        primitive: &Primitive,
        semantic: Semantic,
        usage: &'static str,
    ) -> Option<Vec<[T; N]>> {
        let index = *primitive.attributes.get(&Checked::Valid(semantic))?;
        self.try_read::<T>(index, usage, N)
            .map(|data| chunk_vec::<T, N>(&data))
    }

    fn load_primitive(
        &mut self,
        mesh: usize,
        index: usize,
        primitive: &Primitive,
    ) -> Result<PrimitiveAsset, PrimitiveError> {
        // unreadable positions leave nothing to draw
        let position = self
            .read_attribute::<f32, 3>(primitive, Semantic::Positions, "POSITION")
            .filter(|position| !position.is_empty())
            .ok_or(PrimitiveError::MissingGeometry {
                mesh,
                primitive: index,
            })?;
        let attributes = PrimitiveAttributes {
            position,
            normal: self.read_attribute(primitive, Semantic::Normals, "NORMAL"),
            tex_coord: self.read_attribute(primitive, Semantic::TexCoords(0), "TEXCOORD_0"),
            joints: self.read_attribute(primitive, Semantic::Joints(0), "JOINTS_0"),
            weights: self.read_attribute(primitive, Semantic::Weights(0), "WEIGHTS_0"),
        };

        let expected = attributes.vertex_count();
        for (attribute, actual) in attributes.mismatched() {
            let error = PrimitiveError::AttributeCount {
                mesh,
                primitive: index,
                attribute,
                expected,
                actual,
            };
            warn!("{}", error);
            self.diagnostics.push(error.into());
        }

        let mode = match primitive.mode {
            Checked::Valid(Mode::Points) => PrimitiveAssetMode::Points,
            Checked::Valid(Mode::Lines) => PrimitiveAssetMode::LineList,
            Checked::Valid(Mode::LineLoop) => PrimitiveAssetMode::LineLoop,
            Checked::Valid(Mode::LineStrip) => PrimitiveAssetMode::LineStrip,
            Checked::Valid(Mode::Triangles) => PrimitiveAssetMode::TriangleList,
            Checked::Valid(Mode::TriangleStrip) => PrimitiveAssetMode::TriangleStrip,
            Checked::Valid(Mode::TriangleFan) => PrimitiveAssetMode::TriangleFan,
            Checked::Invalid => {
                warn!(
                    "Primitive #{} of mesh #{} has an invalid mode, drawing triangles",
                    index, mesh
                );
                PrimitiveAssetMode::TriangleList
            }
        };
        if mode != PrimitiveAssetMode::TriangleList {
            debug!(
                "Primitive #{} of mesh #{} uses mode {:?}",
                index, mesh, mode
            );
        }

        // unreadable indices fall back to drawing the vertices in order
        let mut indices = primitive
            .indices
            .and_then(|accessor| self.try_read::<u32>(accessor, "indices", 1));
        if let Some(indices) = &mut indices {
            let invalid = fit_indices(indices, expected, mode);
            if invalid > 0 {
                let error = PrimitiveError::IndexOutOfRange {
                    mesh,
                    primitive: index,
                    invalid,
                    vertices: expected,
                };
                warn!("{}", error);
                self.diagnostics.push(error.into());
            }
        }

        let texture = self.load_primitive_texture(primitive);
        PrimitiveAsset::new(mesh, index, attributes, indices, texture, mode)
    }

    fn load_meshes(&mut self) -> Vec<MeshAsset> {
        let root = self.root;
        root.meshes
            .iter()
            .enumerate()
            .map(|(mesh_index, mesh)| {
                let mut primitives = Vec::new();
                for (index, primitive) in mesh.primitives.iter().enumerate() {
                    match self.load_primitive(mesh_index, index, primitive) {
                        Ok(primitive) => primitives.push(primitive),
                        Err(error) => {
                            warn!("Skipping primitive: {}", error);
                            self.diagnostics.push(error.into());
                        }
                    }
                }
                MeshAsset {
                    name: mesh.name.clone(),
                    primitives,
                }
            })
            .collect()
    }

    fn read_keys<const N: usize>(
        &mut self,
        output: Index<Accessor>,
    ) -> Result<Vec<[f32; N]>, AnimationError> {
        self.try_read::<f32>(output, "animation output", N)
            .map(|data| chunk_vec::<f32, N>(&data))
            .ok_or(AnimationError::Unreadable)
    }

    fn load_channel(
        &mut self,
        animation: &Animation,
        channel: &Channel,
    ) -> Result<AnimationChannel, AnimationError> {
        let target = channel.target.node.value();
        if target >= self.root.nodes.len() {
            return Err(AnimationError::TargetOutOfRange(target));
        }
        let sampler = animation
            .samplers
            .get(channel.sampler.value())
            .ok_or(AnimationError::MissingSampler(channel.sampler.value()))?;
        let interpolation = match sampler.interpolation {
            Checked::Valid(GltfInterpolation::Step) => Interpolation::Step,
            Checked::Valid(GltfInterpolation::CubicSpline) => Interpolation::CubicSpline,
            // linear is the glTF default
            Checked::Valid(GltfInterpolation::Linear) | Checked::Invalid => Interpolation::Linear,
        };

        let values = match channel.target.path {
            Checked::Valid(Property::Translation) => ChannelValues::Translation(
                self.read_keys::<3>(sampler.output)?
                    .into_iter()
                    .map(Vec3::from_array)
                    .collect(),
            ),
            Checked::Valid(Property::Scale) => ChannelValues::Scale(
                self.read_keys::<3>(sampler.output)?
                    .into_iter()
                    .map(Vec3::from_array)
                    .collect(),
            ),
            Checked::Valid(Property::Rotation) => ChannelValues::Rotation(
                self.read_keys::<4>(sampler.output)?
                    .into_iter()
                    .map(Quat::from_array)
                    .collect(),
            ),
            Checked::Valid(Property::MorphTargetWeights) => {
                return Err(AnimationError::MorphTargetWeights)
            }
            Checked::Invalid => return Err(AnimationError::UnknownPath),
        };
        let times = self
            .try_read::<f32>(sampler.input, "animation input", 1)
            .ok_or(AnimationError::Unreadable)?;

        AnimationChannel::new(target, interpolation, times, values)
    }

    fn load_animation(&mut self, index: usize, animation: &Animation) -> AnimationAsset {
        let mut channels = Vec::new();
        for (channel_index, channel) in animation.channels.iter().enumerate() {
            match self.load_channel(animation, channel) {
                Ok(channel) => channels.push(channel),
                Err(error) => {
                    warn!(
                        "Dropping channel #{} of animation #{}: {}",
                        channel_index, index, error
                    );
                    self.diagnostics.push(Diagnostic::Animation {
                        animation: index,
                        channel: channel_index,
                        error,
                    });
                }
            }
        }
        AnimationAsset::new(animation.name.clone(), channels)
    }

    fn load(mut self) -> Result<ModelAsset, LoadError> {
        let mut graph = SceneGraph::build(self.load_nodes())?;
        let skin = self.load_skin(&mut graph);
        let meshes = self.load_meshes();
        let root = self.root;
        let animations: Vec<_> = root
            .animations
            .iter()
            .enumerate()
            .map(|(index, animation)| self.load_animation(index, animation))
            .collect();

        info!(
            "Loaded {} nodes, {} meshes, {} animations with {} diagnostics",
            graph.len(),
            meshes.len(),
            animations.len(),
            self.diagnostics.len()
        );
        Ok(ModelAsset {
            graph,
            skin,
            meshes,
            animations,
            textures: self.texture_cache,
            diagnostics: self.diagnostics,
        })
    }
}

/// Load a GLB file from a slice.
///
/// The document is not validated as a whole: dangling indices and damaged
/// data degrade the result and are reported in [`ModelAsset::diagnostics`].
/// Only the embedded binary chunk is read; data behind external URIs is
/// treated as missing.
pub fn load_glb_from_buffer(
    buffer: &[u8],
    params: &AssetLoadParams,
) -> Result<ModelAsset, LoadError> {
    let gltf = Gltf::from_slice_without_validation(buffer)?;
    let blob = gltf.blob.as_deref().unwrap_or_default();
    GltfDocumentLoader::new(gltf.document.as_json(), blob, params).load()
}

/// Read a whole GLB file and load it.
pub fn load_glb_from_path<P: AsRef<Path>>(
    path: P,
    params: &AssetLoadParams,
) -> Result<ModelAsset, LoadError> {
    let path = path.as_ref();
    let buffer = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::FileNotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    debug!("Read {} bytes from {}", buffer.len(), path.display());
    load_glb_from_buffer(&buffer, params)
}
