use std::{io, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// Failure to read typed data out of a binary blob.
///
/// Never fatal: the loader treats the affected data as absent and records
/// a [`Diagnostic`]. Attributes are then zero-filled to the vertex count.
#[derive(Debug, Error)]
pub enum AccessorError {
    #[error("{length} bytes at offset {offset} out of bounds ({available} bytes available)")]
    Decode {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("unsupported component type {0}")]
    UnsupportedComponentType(u32),
    #[error("invalid {0}")]
    Invalid(&'static str),
    #[error("{kind} #{index} does not exist")]
    Dangling { kind: &'static str, index: usize },
    #[error("accessor has no buffer view")]
    NoBufferView,
    #[error("expected {expected} components per element, but got {actual}")]
    Dimensions { expected: usize, actual: usize },
    #[error("buffer #{0} is stored outside of the binary chunk")]
    ExternalBuffer(usize),
    #[error("sparse accessors are not supported")]
    Sparse,
}

/// Structural damage in the node tree. Fatal to the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("node #{parent} lists child #{child}, but only {count} nodes exist")]
    ChildOutOfRange {
        parent: usize,
        child: usize,
        count: usize,
    },
    #[error("node #{child} is listed as a child of both #{first} and #{second}")]
    MultipleParents {
        child: usize,
        first: usize,
        second: usize,
    },
    #[error("node #{node} is part of a cycle")]
    Cycle { node: usize },
}

#[derive(Debug, Error)]
pub enum PrimitiveError {
    #[error("primitive #{primitive} of mesh #{mesh} has no positions")]
    MissingGeometry { mesh: usize, primitive: usize },
    #[error(
        "primitive #{primitive} of mesh #{mesh}: {attribute} has {actual} elements, expected {expected}"
    )]
    AttributeCount {
        mesh: usize,
        primitive: usize,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(
        "primitive #{primitive} of mesh #{mesh}: {invalid} indices past the last of {vertices} vertices"
    )]
    IndexOutOfRange {
        mesh: usize,
        primitive: usize,
        invalid: usize,
        vertices: usize,
    },
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("image is stored outside of the binary chunk: {0}")]
    ExternalImage(String),
    #[error("image has neither a buffer view nor a URI")]
    NoSource,
    #[error("image data out of bounds of buffer view #{view}")]
    OutOfBounds { view: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] ImageError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkinError {
    #[error("joint #{joint} refers to missing node #{node}")]
    JointOutOfRange { joint: usize, node: usize },
    #[error("skin has {joints} joints but {matrices} inverse bind matrices")]
    InverseBindCount { joints: usize, matrices: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnimationError {
    #[error("channel has no keyframes")]
    Empty,
    #[error("channel has {times} key times but {values} values")]
    KeyCount { times: usize, values: usize },
    #[error("channel targets missing node #{0}")]
    TargetOutOfRange(usize),
    #[error("sampler #{0} does not exist")]
    MissingSampler(usize),
    #[error("unknown target path")]
    UnknownPath,
    #[error("morph target weight channels are not supported")]
    MorphTargetWeights,
    #[error("keyframe data could not be read")]
    Unreadable,
}

/// A recoverable problem met while loading. The load went on with a
/// degraded result.
#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error("accessor #{index} ({usage}): {error}")]
    Accessor {
        index: usize,
        usage: &'static str,
        error: AccessorError,
    },
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
    #[error("image #{image}: {error}")]
    Texture { image: usize, error: TextureError },
    #[error(transparent)]
    Skin(#[from] SkinError),
    #[error("animation #{animation} channel #{channel}: {error}")]
    Animation {
        animation: usize,
        channel: usize,
        error: AnimationError,
    },
}

/// Errors that abort a load. No partial model is produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file {} not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    #[error("malformed node hierarchy: {0}")]
    MalformedHierarchy(#[from] HierarchyError),
}
