use glam::Mat4;
use skinner_asset::primitive::PrimitiveAssetMode;

/// GPU resource creation and drawing, implemented by the host renderer.
///
/// Handles are owned by the model and released when it is dropped.
pub trait RenderBackend {
    type Buffer;
    type Texture;

    /// `data` holds interleaved [`SkinVertex`](skinner_asset::primitive::SkinVertex)
    /// records.
    fn create_vertex_buffer(&mut self, data: &[u8]) -> Self::Buffer;
    /// `data` holds `u32` indices.
    fn create_index_buffer(&mut self, data: &[u8]) -> Self::Buffer;
    /// `pixels` is tightly packed RGBA8.
    fn create_texture(&mut self, pixels: &[u8], width: u32, height: u32) -> Self::Texture;
    fn draw(&mut self, call: DrawCall<'_, Self>);
}

pub struct DrawCall<'a, B: RenderBackend + ?Sized> {
    /// Topology the vertices or indices describe.
    pub mode: PrimitiveAssetMode,
    pub vertex_buffer: &'a B::Buffer,
    /// `None` draws `count` vertices in sequence.
    pub index_buffer: Option<&'a B::Buffer>,
    pub count: usize,
    pub texture: Option<&'a B::Texture>,
}

/// Uniform upload on the bound skinning shader.
pub trait ShaderUniforms {
    fn set_uniform_mat4_array(&mut self, name: &str, matrices: &[Mat4]);
    fn set_uniform_int(&mut self, name: &str, value: i32);
}
