//! In-memory GLB files for tests.
#![allow(dead_code)]

use serde_json::{json, Map, Value};

pub const FLOAT: u32 = 5126;
pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_INT: u32 = 5125;
pub const BYTE: u32 = 5120;

fn components(kind: &str) -> usize {
    match kind {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        "MAT4" => 16,
        _ => panic!("unknown accessor type {kind}"),
    }
}

#[derive(Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    external_buffers: Vec<Value>,
}

impl GlbBuilder {
    pub fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.buffer_views.len() - 1
    }

    /// Add a view over a buffer stored next to the GLB, which never
    /// gets read. Buffer 0 is the binary chunk, so these start at 1.
    pub fn external_view(&mut self, uri: &str, byte_length: usize) -> usize {
        self.external_buffers.push(json!({ "uri": uri, "byteLength": byte_length }));
        self.buffer_views.push(json!({
            "buffer": self.external_buffers.len(),
            "byteLength": byte_length,
        }));
        self.buffer_views.len() - 1
    }

    /// Add an accessor as written, without filling anything in.
    pub fn accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub fn floats(&mut self, data: &[f32], kind: &str) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|value| value.to_le_bytes()).collect();
        let view = self.view(&bytes);
        let width = components(kind);
        let mut min = vec![f32::MAX; width];
        let mut max = vec![f32::MIN; width];
        for element in data.chunks_exact(width) {
            for (index, value) in element.iter().enumerate() {
                min[index] = min[index].min(*value);
                max[index] = max[index].max(*value);
            }
        }
        self.accessor(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": data.len() / width,
            "type": kind,
            "min": min,
            "max": max,
        }))
    }

    pub fn shorts(&mut self, data: &[u16], kind: &str) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|value| value.to_le_bytes()).collect();
        self.integers(&bytes, UNSIGNED_SHORT, data.len() / components(kind), kind, false)
    }

    pub fn bytes(&mut self, data: &[u8], kind: &str, normalized: bool) -> usize {
        self.integers(data, UNSIGNED_BYTE, data.len() / components(kind), kind, normalized)
    }

    pub fn integers(
        &mut self,
        bytes: &[u8],
        component_type: u32,
        count: usize,
        kind: &str,
        normalized: bool,
    ) -> usize {
        let view = self.view(bytes);
        self.accessor(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": kind,
            "normalized": normalized,
        }))
    }

    /// Wrap `document` (without `asset`, `buffers`, `bufferViews` and
    /// `accessors`) and the collected binary data into a GLB file.
    pub fn finish(self, document: Value) -> Vec<u8> {
        let mut root: Map<String, Value> = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        root.insert("asset".into(), json!({ "version": "2.0" }));
        let mut buffers = vec![json!({ "byteLength": self.bin.len().max(1) })];
        buffers.extend(self.external_buffers);
        root.insert("buffers".into(), Value::Array(buffers));
        root.insert("bufferViews".into(), Value::Array(self.buffer_views));
        root.insert("accessors".into(), Value::Array(self.accessors));

        let mut json = serde_json::to_vec(&Value::Object(root)).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = self.bin;
        if bin.is_empty() {
            bin.push(0);
        }
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }
}

/// Two-bone skinned triangle with one animation.
///
/// Nodes: 0 "Armature" (children 1, 3), 1 "Hip" at y=1 (child 2), 2 "Spine"
/// at y=1 relative to the hip, 3 "Body" carrying mesh 0 and skin 0.
/// Animation 0 "Wave" moves the hip from x=0 to x=2 over one second and
/// turns the spine 180 degrees about Y.
pub fn skinned_triangle() -> Vec<u8> {
    let mut builder = GlbBuilder::default();
    let positions = builder.floats(
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0],
        "VEC3",
    );
    let normals = builder.floats(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0], "VEC3");
    let joints = builder.shorts(&[0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0], "VEC4");
    let weights = builder.floats(
        &[
            1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
        ],
        "VEC4",
    );
    let indices = builder.shorts(&[0, 1, 2], "SCALAR");
    #[rustfmt::skip]
    let inverse_bind = builder.floats(
        &[
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 1.0,
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -2.0, 0.0, 1.0,
        ],
        "MAT4",
    );
    let times = builder.floats(&[0.0, 1.0], "SCALAR");
    let translations = builder.floats(&[0.0, 1.0, 0.0, 2.0, 1.0, 0.0], "VEC3");
    let rotations = builder.floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0], "VEC4");

    builder.finish(json!({
        "nodes": [
            { "name": "Armature", "children": [1, 3] },
            { "name": "Hip", "translation": [0.0, 1.0, 0.0], "children": [2] },
            { "name": "Spine", "translation": [0.0, 1.0, 0.0] },
            { "name": "Body", "mesh": 0, "skin": 0 },
        ],
        "scenes": [{ "nodes": [0] }],
        "scene": 0,
        "meshes": [{
            "name": "Triangle",
            "primitives": [{
                "attributes": {
                    "POSITION": positions,
                    "NORMAL": normals,
                    "JOINTS_0": joints,
                    "WEIGHTS_0": weights,
                },
                "indices": indices,
            }],
        }],
        "skins": [{ "name": "Rig", "joints": [1, 2], "inverseBindMatrices": inverse_bind }],
        "animations": [{
            "name": "Wave",
            "samplers": [
                { "input": times, "output": translations, "interpolation": "LINEAR" },
                { "input": times, "output": rotations, "interpolation": "LINEAR" },
            ],
            "channels": [
                { "sampler": 0, "target": { "node": 1, "path": "translation" } },
                { "sampler": 1, "target": { "node": 2, "path": "rotation" } },
            ],
        }],
    }))
}
