/// GLB loader with `gltf` crate.
pub mod gltf;

#[derive(Debug, Clone)]
pub struct AssetLoadParams {
    /// Animation played by default. Falls back to the first one when out
    /// of range.
    pub active_animation: usize,
    /// Decode embedded images. Primitives keep their image reference
    /// either way.
    pub load_textures: bool,
    pub bone_matrices_uniform: String,
    pub has_texture_uniform: String,
}

impl Default for AssetLoadParams {
    fn default() -> Self {
        Self {
            active_animation: 0,
            load_textures: true,
            bone_matrices_uniform: String::from("u_bone_matrices"),
            has_texture_uniform: String::from("u_has_texture"),
        }
    }
}
