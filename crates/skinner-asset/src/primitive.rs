use bytemuck::{Pod, Zeroable};

use crate::error::PrimitiveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveAssetMode {
    Points,
    LineList,
    LineLoop,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// One interleaved vertex as the skinning shader reads it.
///
/// Joint indices are integers stored as `f32`, since the buffer holds
/// floats only. Field order and stride are fixed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SkinVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub joint_index: [f32; 4],
    pub joint_weight: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttributeKind {
    Float,
    /// Integer values written as floats, read back with a cast.
    FloatEncodedInteger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: usize,
    pub kind: VertexAttributeKind,
}

impl SkinVertex {
    pub const FLOATS: usize = 16;
    pub const STRIDE: usize = Self::FLOATS * std::mem::size_of::<f32>();

    pub const ATTRIBUTES: [VertexAttribute; 5] = [
        VertexAttribute {
            location: 0,
            components: 3,
            offset: 0,
            kind: VertexAttributeKind::Float,
        },
        VertexAttribute {
            location: 1,
            components: 3,
            offset: 12,
            kind: VertexAttributeKind::Float,
        },
        VertexAttribute {
            location: 2,
            components: 2,
            offset: 24,
            kind: VertexAttributeKind::Float,
        },
        VertexAttribute {
            location: 3,
            components: 4,
            offset: 32,
            kind: VertexAttributeKind::FloatEncodedInteger,
        },
        VertexAttribute {
            location: 4,
            components: 4,
            offset: 48,
            kind: VertexAttributeKind::Float,
        },
    ];
}

pub type Position = Vec<[f32; 3]>;
pub type Normal = Vec<[f32; 3]>;
pub type TexCoord = Vec<[f32; 2]>;
pub type Joints = Vec<[u32; 4]>;
pub type Weights = Vec<[f32; 4]>;

/// Per-attribute arrays of one primitive, before interleaving.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveAttributes {
    pub position: Position,
    pub normal: Option<Normal>,
    pub tex_coord: Option<TexCoord>,
    pub joints: Option<Joints>,
    pub weights: Option<Weights>,
}

fn fit<T: Copy + Default>(data: Option<Vec<T>>, count: usize) -> Vec<T> {
    let mut data = data.unwrap_or_default();
    data.resize(count, T::default());
    data
}

impl PrimitiveAttributes {
    pub fn vertex_count(&self) -> usize {
        self.position.len()
    }

    /// Attributes present with a different element count than the
    /// positions, as `(name, actual)` pairs.
    pub fn mismatched(&self) -> Vec<(&'static str, usize)> {
        let count = self.vertex_count();
        [
            ("NORMAL", self.normal.as_ref().map(Vec::len)),
            ("TEXCOORD_0", self.tex_coord.as_ref().map(Vec::len)),
            ("JOINTS_0", self.joints.as_ref().map(Vec::len)),
            ("WEIGHTS_0", self.weights.as_ref().map(Vec::len)),
        ]
        .into_iter()
        .filter_map(|(name, len)| len.filter(|len| *len != count).map(|len| (name, len)))
        .collect()
    }

    /// Interleave into [`SkinVertex`] records. Missing attributes are zero
    /// and every attribute is cut or padded to the position count.
    pub fn interleave(self) -> Vec<SkinVertex> {
        let count = self.vertex_count();
        let normal = fit(self.normal, count);
        let tex_coord = fit(self.tex_coord, count);
        let joints = fit(self.joints, count);
        let weights = fit(self.weights, count);

        self.position
            .into_iter()
            .zip(normal)
            .zip(tex_coord)
            .zip(joints)
            .zip(weights)
            .map(
                |((((position, normal), tex_coords), joints), joint_weight)| SkinVertex {
                    position,
                    normal,
                    tex_coords,
                    joint_index: joints.map(|joint| joint as f32),
                    joint_weight,
                },
            )
            .collect()
    }
}

/// Make every index address an existing vertex.
///
/// Triangle lists lose each triangle that reaches past `vertex_count`; other
/// topologies clamp such indices to the last vertex. Returns how many
/// indices were out of range.
pub fn fit_indices(
    indices: &mut Vec<u32>,
    vertex_count: usize,
    mode: PrimitiveAssetMode,
) -> usize {
    let in_range = |index: u32| (index as usize) < vertex_count;
    let invalid = indices.iter().filter(|index| !in_range(**index)).count();
    if invalid == 0 {
        return 0;
    }

    if mode == PrimitiveAssetMode::TriangleList {
        *indices = indices
            .chunks(3)
            .filter(|triangle| triangle.iter().all(|index| in_range(*index)))
            .flatten()
            .copied()
            .collect();
    } else {
        let last = vertex_count.saturating_sub(1) as u32;
        for index in indices.iter_mut().filter(|index| !in_range(**index)) {
            *index = last;
        }
    }
    invalid
}

/// CPU side of one drawable primitive.
#[derive(Debug, Clone)]
pub struct PrimitiveAsset {
    pub vertices: Vec<SkinVertex>,
    pub indices: Option<Vec<u32>>,
    /// Source image index of the base color texture.
    pub texture: Option<usize>,
    pub mode: PrimitiveAssetMode,
}

impl PrimitiveAsset {
    pub fn new(
        mesh: usize,
        primitive: usize,
        attributes: PrimitiveAttributes,
        indices: Option<Vec<u32>>,
        texture: Option<usize>,
        mode: PrimitiveAssetMode,
    ) -> Result<Self, PrimitiveError> {
        if attributes.position.is_empty() {
            return Err(PrimitiveError::MissingGeometry { mesh, primitive });
        }
        Ok(Self {
            vertices: attributes.interleave(),
            indices,
            texture,
            mode,
        })
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> Option<&[u8]> {
        self.indices.as_deref().map(bytemuck::cast_slice)
    }

    /// Index count for indexed drawing, else the number of vertex records
    /// (buffer floats over [`SkinVertex::FLOATS`]) drawn in sequence.
    pub fn draw_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.vertices.len(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout_is_fixed() {
        assert_eq!(std::mem::size_of::<SkinVertex>(), SkinVertex::STRIDE);
        assert_eq!(SkinVertex::STRIDE, 64);

        let vertex = SkinVertex {
            position: [1.0, 2.0, 3.0],
            normal: [4.0, 5.0, 6.0],
            tex_coords: [7.0, 8.0],
            joint_index: [9.0, 10.0, 11.0, 12.0],
            joint_weight: [13.0, 14.0, 15.0, 16.0],
        };
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        let expected: Vec<f32> = (1..=16).map(|value| value as f32).collect();
        assert_eq!(floats, expected.as_slice());

        for attribute in SkinVertex::ATTRIBUTES {
            let first = attribute.offset / 4;
            assert_eq!(floats[first], first as f32 + 1.0);
        }
        assert_eq!(
            SkinVertex::ATTRIBUTES[3].kind,
            VertexAttributeKind::FloatEncodedInteger
        );
    }

    #[test]
    fn missing_attributes_are_zero_filled() {
        let attributes = PrimitiveAttributes {
            position: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            ..Default::default()
        };
        let vertices = attributes.interleave();
        assert_eq!(vertices.len(), 3);
        for vertex in &vertices {
            assert_eq!(vertex.normal, [0.0; 3]);
            assert_eq!(vertex.tex_coords, [0.0; 2]);
            assert_eq!(vertex.joint_index, [0.0; 4]);
            assert_eq!(vertex.joint_weight, [0.0; 4]);
        }
    }

    #[test]
    fn mismatched_attributes_fit_position_count() {
        let attributes = PrimitiveAttributes {
            position: vec![[0.0; 3]; 2],
            tex_coord: Some(vec![[0.5, 0.5]; 3]),
            joints: Some(vec![[3, 1, 0, 0]]),
            ..Default::default()
        };
        assert_eq!(attributes.mismatched(), vec![("TEXCOORD_0", 3), ("JOINTS_0", 1)]);
        let vertices = attributes.interleave();
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].joint_index, [3.0, 1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].joint_index, [0.0; 4]);
        assert_eq!(vertices[1].tex_coords, [0.5, 0.5]);
    }

    #[test]
    fn empty_positions_are_missing_geometry() {
        let result = PrimitiveAsset::new(
            2,
            1,
            PrimitiveAttributes::default(),
            None,
            None,
            PrimitiveAssetMode::TriangleList,
        );
        assert!(matches!(
            result,
            Err(PrimitiveError::MissingGeometry {
                mesh: 2,
                primitive: 1
            })
        ));
    }

    #[test]
    fn draw_count_falls_back_to_vertices() {
        let attributes = PrimitiveAttributes {
            position: vec![[0.0; 3]; 6],
            ..Default::default()
        };
        let primitive = PrimitiveAsset::new(
            0,
            0,
            attributes.clone(),
            None,
            None,
            PrimitiveAssetMode::TriangleList,
        )
        .unwrap();
        assert_eq!(primitive.draw_count(), 6);
        assert_eq!(primitive.vertex_bytes().len(), 6 * 64);
        assert!(primitive.index_bytes().is_none());

        let indexed = PrimitiveAsset::new(
            0,
            0,
            attributes,
            Some(vec![0, 1, 2]),
            None,
            PrimitiveAssetMode::TriangleList,
        )
        .unwrap();
        assert_eq!(indexed.draw_count(), 3);
        assert_eq!(indexed.index_bytes().map(<[u8]>::len), Some(12));
    }

    #[test]
    fn out_of_range_indices_are_fitted() {
        let mut triangles = vec![0, 1, 2, 2, 1, 9, 0, 2, 1];
        assert_eq!(fit_indices(&mut triangles, 3, PrimitiveAssetMode::TriangleList), 1);
        assert_eq!(triangles, vec![0, 1, 2, 0, 2, 1]);

        let mut strip = vec![0, 7, 1, 2];
        assert_eq!(fit_indices(&mut strip, 3, PrimitiveAssetMode::TriangleStrip), 1);
        assert_eq!(strip, vec![0, 2, 1, 2]);

        let mut valid = vec![0, 1, 2];
        assert_eq!(fit_indices(&mut valid, 3, PrimitiveAssetMode::TriangleList), 0);
        assert_eq!(valid, vec![0, 1, 2]);
    }
}
