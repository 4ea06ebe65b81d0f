//! Typed reads out of a binary blob.
//!
//! An [`AccessorLayout`] describes where a run of elements sits inside a
//! blob and how its components are encoded. [`read`] turns it into a flat,
//! row-major `Vec` of `count * components` values, upconverted to the
//! requested output type.

use crate::error::AccessorError;

/// Component encodings found in binary chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    U8,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub const GL_UNSIGNED_BYTE: u32 = 5121;
    pub const GL_UNSIGNED_SHORT: u32 = 5123;
    pub const GL_UNSIGNED_INT: u32 = 5125;
    pub const GL_FLOAT: u32 = 5126;

    pub fn from_code(code: u32) -> Result<Self, AccessorError> {
        match code {
            Self::GL_UNSIGNED_BYTE => Ok(Self::U8),
            Self::GL_UNSIGNED_SHORT => Ok(Self::U16),
            Self::GL_UNSIGNED_INT => Ok(Self::U32),
            Self::GL_FLOAT => Ok(Self::F32),
            code => Err(AccessorError::UnsupportedComponentType(code)),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::U8 => Self::GL_UNSIGNED_BYTE,
            Self::U16 => Self::GL_UNSIGNED_SHORT,
            Self::U32 => Self::GL_UNSIGNED_INT,
            Self::F32 => Self::GL_FLOAT,
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorLayout {
    /// Byte offset of the first element inside the blob.
    pub offset: usize,
    /// Bytes available from `offset` on.
    pub length: usize,
    /// Distance between two elements. `None` means tightly packed.
    pub stride: Option<usize>,
    pub count: usize,
    /// Raw component type tag, see [`ComponentType::from_code`].
    pub component_type: u32,
    pub components: usize,
    /// Integer components map onto `[0, 1]` when read as floats.
    pub normalized: bool,
}

impl AccessorLayout {
    pub fn values(&self) -> usize {
        self.count * self.components
    }
}

/// Numeric types an accessor can be read into.
pub trait AccessorOutput: Copy + Default {
    fn from_u8(value: u8, normalized: bool) -> Self;
    fn from_u16(value: u16, normalized: bool) -> Self;
    fn from_u32(value: u32, normalized: bool) -> Self;
    fn from_f32(value: f32) -> Self;
}

impl AccessorOutput for f32 {
    #[inline]
    fn from_u8(value: u8, normalized: bool) -> Self {
        if normalized {
            value as f32 / u8::MAX as f32
        } else {
            value as f32
        }
    }

    #[inline]
    fn from_u16(value: u16, normalized: bool) -> Self {
        if normalized {
            value as f32 / u16::MAX as f32
        } else {
            value as f32
        }
    }

    #[inline]
    fn from_u32(value: u32, normalized: bool) -> Self {
        if normalized {
            value as f32 / u32::MAX as f32
        } else {
            value as f32
        }
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

impl AccessorOutput for u32 {
    #[inline]
    fn from_u8(value: u8, _normalized: bool) -> Self {
        value as u32
    }

    #[inline]
    fn from_u16(value: u16, _normalized: bool) -> Self {
        value as u32
    }

    #[inline]
    fn from_u32(value: u32, _normalized: bool) -> Self {
        value
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value as u32
    }
}

/// Read `layout.count * layout.components` values out of `blob`.
pub fn read<T: AccessorOutput>(blob: &[u8], layout: &AccessorLayout) -> Result<Vec<T>, AccessorError> {
    let component_type = ComponentType::from_code(layout.component_type)?;
    if layout.count == 0 || layout.components == 0 {
        return Ok(Vec::new());
    }

    let component_size = component_type.size();
    let item_length = component_size * layout.components;
    let stride = layout
        .stride
        .filter(|stride| *stride >= item_length)
        .unwrap_or(item_length);
    // counts come straight from the file, so the span may not even fit a usize
    let span = stride
        .checked_mul(layout.count - 1)
        .and_then(|bytes| bytes.checked_add(item_length))
        .unwrap_or(usize::MAX);

    let out_of_bounds = AccessorError::Decode {
        offset: layout.offset,
        length: span,
        available: blob.len().saturating_sub(layout.offset).min(layout.length),
    };
    if span > layout.length {
        return Err(out_of_bounds);
    }
    let Some(data) = layout
        .offset
        .checked_add(span)
        .and_then(|end| blob.get(layout.offset..end))
    else {
        return Err(out_of_bounds);
    };

    let mut result = Vec::with_capacity(layout.values());
    for item in data.chunks(stride) {
        for bytes in item[..item_length].chunks_exact(component_size) {
            let value = match component_type {
                ComponentType::U8 => T::from_u8(bytes[0], layout.normalized),
                ComponentType::U16 => {
                    T::from_u16(u16::from_le_bytes([bytes[0], bytes[1]]), layout.normalized)
                }
                ComponentType::U32 => T::from_u32(
                    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
                    layout.normalized,
                ),
                ComponentType::F32 => {
                    T::from_f32(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                }
            };
            result.push(value);
        }
    }
    Ok(result)
}

/// Group a flat slice into fixed-size elements. A trailing partial element
/// is dropped.
#[inline]
pub fn chunk_vec<T: Copy, const N: usize>(data: &[T]) -> Vec<[T; N]> {
    data.chunks_exact(N)
        .map(|chunk| std::array::from_fn(|index| chunk[index]))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn layout(component_type: ComponentType, count: usize, components: usize) -> AccessorLayout {
        AccessorLayout {
            offset: 0,
            length: usize::MAX,
            stride: None,
            count,
            component_type: component_type.code(),
            components,
            normalized: false,
        }
    }

    #[test]
    fn read_f32_vec3() {
        let values = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let blob: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let result: Vec<f32> = read(&blob, &layout(ComponentType::F32, 2, 3)).unwrap();
        assert_eq!(result, values);
        assert_eq!(chunk_vec::<f32, 3>(&result), vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn integer_types_widen() {
        let blob = [1u8, 2, 3, 4];
        let bytes: Vec<u32> = read(&blob, &layout(ComponentType::U8, 1, 4)).unwrap();
        assert_eq!(bytes, [1, 2, 3, 4]);

        let blob: Vec<u8> = [7u16, 300].iter().flat_map(|v| v.to_le_bytes()).collect();
        let shorts: Vec<u32> = read(&blob, &layout(ComponentType::U16, 2, 1)).unwrap();
        assert_eq!(shorts, [7, 300]);

        let blob: Vec<u8> = [70000u32].iter().flat_map(|v| v.to_le_bytes()).collect();
        let ints: Vec<f32> = read(&blob, &layout(ComponentType::U32, 1, 1)).unwrap();
        assert_eq!(ints, [70000.0]);
    }

    #[test]
    fn normalized_integers_map_to_unit_range() {
        let blob = [0u8, 255];
        let mut layout = layout(ComponentType::U8, 1, 2);
        layout.normalized = true;
        let values: Vec<f32> = read(&blob, &layout).unwrap();
        assert_eq!(values, [0.0, 1.0]);
    }

    #[test]
    fn honours_offset_and_stride() {
        // two u16 pairs, each followed by two bytes of padding, after a 2 byte header
        let blob = [0xff, 0xff, 1, 0, 2, 0, 0xee, 0xee, 3, 0, 4, 0, 0xee, 0xee];
        let layout = AccessorLayout {
            offset: 2,
            length: 12,
            stride: Some(6),
            ..layout(ComponentType::U16, 2, 2)
        };
        let values: Vec<u32> = read(&blob, &layout).unwrap();
        assert_eq!(values, [1, 2, 3, 4]);
    }

    #[test]
    fn out_of_range_is_decode_error() {
        let blob = [0u8; 8];
        let result = read::<f32>(&blob, &layout(ComponentType::F32, 3, 1));
        assert!(matches!(
            result,
            Err(AccessorError::Decode {
                offset: 0,
                length: 12,
                available: 8
            })
        ));

        let mut short = layout(ComponentType::F32, 2, 1);
        short.length = 4;
        assert!(matches!(
            read::<f32>(&blob, &short),
            Err(AccessorError::Decode { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let mut layout = layout(ComponentType::F32, 1, 1);
        layout.component_type = 5122;
        assert!(matches!(
            read::<f32>(&[0; 4], &layout),
            Err(AccessorError::UnsupportedComponentType(5122))
        ));
    }

    #[test]
    fn huge_count_is_decode_error() {
        let blob = [0u8; 4];
        let mut layout = layout(ComponentType::F32, usize::MAX / 2, 3);
        layout.length = 4;
        assert!(matches!(
            read::<f32>(&blob, &layout),
            Err(AccessorError::Decode { length: usize::MAX, available: 4, .. })
        ));
    }
}
