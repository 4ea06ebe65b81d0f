use super::primitive::PrimitiveAsset;

#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub name: Option<String>,
    /// Primitives without geometry are already dropped.
    pub primitives: Vec<PrimitiveAsset>,
}

impl MeshAsset {
    pub fn vertex_count(&self) -> usize {
        self.primitives
            .iter()
            .map(|primitive| primitive.vertices.len())
            .sum()
    }
}
