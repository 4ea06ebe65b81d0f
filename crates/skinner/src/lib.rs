//! Skinned model runtime.
//!
//! Turns a [`skinner_asset::scene::ModelAsset`] into a [`model::Model`]
//! whose meshes live on a [`backend::RenderBackend`], plays its animation
//! and produces the bone palette for GPU skinning every frame.
pub mod animation;
pub mod backend;
pub mod mesh;
pub mod model;
pub mod skin;

pub use skinner_asset as asset;
