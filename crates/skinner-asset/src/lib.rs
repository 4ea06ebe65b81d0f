//! Skeletal mesh assets.
//!
//! Loads a GLB file into a [`scene::ModelAsset`]: the node tree, the skin
//! binding joints to inverse-bind matrices, meshes as interleaved
//! [`primitive::SkinVertex`] records, keyframe animations and decoded
//! textures. Nothing in here touches the GPU.
//!
//! Damaged attribute data, images or channels degrade the result and are
//! listed in [`scene::ModelAsset::diagnostics`]. Only unreadable input and a
//! malformed node hierarchy fail the load.
pub mod accessor;
pub mod animation;
pub mod error;
/// Model loaders
pub mod loader;
pub mod mesh;
pub mod node;
pub mod primitive;
pub mod scene;
pub mod skin;
pub mod texture;
