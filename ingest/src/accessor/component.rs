//! Single-component reads from packed little-endian bytes.

use crate::document::ComponentType;

#[inline]
fn bytes2(data: &[u8], offset: usize) -> [u8; 2] {
    [data[offset], data[offset + 1]]
}

#[inline]
fn bytes4(data: &[u8], offset: usize) -> [u8; 4] {
    [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
}

/// Reads one component as a float.
///
/// Normalized signed types clamp at -1 so that the most negative value does
/// not fall below the range. `U32` and `F32` ignore `normalized`.
///
/// The caller guarantees `offset + ty.size() <= data.len()`.
#[inline]
pub fn read_float(data: &[u8], offset: usize, ty: ComponentType, normalized: bool) -> f32 {
    match ty {
        ComponentType::I8 => {
            let v = data[offset] as i8 as f32;
            if normalized { (v / 127.0).max(-1.0) } else { v }
        }
        ComponentType::U8 => {
            let v = data[offset] as f32;
            if normalized { v / 255.0 } else { v }
        }
        ComponentType::I16 => {
            let v = i16::from_le_bytes(bytes2(data, offset)) as f32;
            if normalized { (v / 32767.0).max(-1.0) } else { v }
        }
        ComponentType::U16 => {
            let v = u16::from_le_bytes(bytes2(data, offset)) as f32;
            if normalized { v / 65535.0 } else { v }
        }
        ComponentType::U32 => u32::from_le_bytes(bytes4(data, offset)) as f32,
        ComponentType::F32 => f32::from_le_bytes(bytes4(data, offset)),
    }
}

/// Reads one component as an integer.
///
/// `I8` and `I16` are sign-extended, unsigned types zero-extended (`U32`
/// wraps into `i32`), and `F32` truncates toward zero.
///
/// The caller guarantees `offset + ty.size() <= data.len()`.
#[inline]
pub fn read_int(data: &[u8], offset: usize, ty: ComponentType) -> i32 {
    match ty {
        ComponentType::I8 => data[offset] as i8 as i32,
        ComponentType::U8 => data[offset] as i32,
        ComponentType::I16 => i16::from_le_bytes(bytes2(data, offset)) as i32,
        ComponentType::U16 => u16::from_le_bytes(bytes2(data, offset)) as i32,
        ComponentType::U32 => u32::from_le_bytes(bytes4(data, offset)) as i32,
        ComponentType::F32 => f32::from_le_bytes(bytes4(data, offset)) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_normalized() {
        let data = [0u8, 127, 255];
        let values: Vec<f32> = (0..3)
            .map(|i| read_float(&data, i, ComponentType::U8, true))
            .collect();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 0.498_039_2).abs() < 1e-6);
        assert_eq!(values[2], 1.0);
    }

    #[test]
    fn test_i16_normalized_clamps() {
        let data = (-32768i16).to_le_bytes();
        assert_eq!(read_float(&data, 0, ComponentType::I16, true), -1.0);
        let data = 32767i16.to_le_bytes();
        assert_eq!(read_float(&data, 0, ComponentType::I16, true), 1.0);
    }

    #[test]
    fn test_i8_normalized_clamps() {
        let data = [0x80u8, 0x7F];
        assert_eq!(read_float(&data, 0, ComponentType::I8, true), -1.0);
        assert_eq!(read_float(&data, 1, ComponentType::I8, true), 1.0);
    }

    #[test]
    fn test_unnormalized_integers_cast() {
        let data = [0xFEu8];
        assert_eq!(read_float(&data, 0, ComponentType::I8, false), -2.0);
        assert_eq!(read_float(&data, 0, ComponentType::U8, false), 254.0);
        let data = 65535u16.to_le_bytes();
        assert_eq!(read_float(&data, 0, ComponentType::U16, false), 65535.0);
    }

    #[test]
    fn test_u32_ignores_normalized() {
        let data = 7u32.to_le_bytes();
        assert_eq!(read_float(&data, 0, ComponentType::U32, true), 7.0);
    }

    #[test]
    fn test_f32_raw() {
        let data = 1.25f32.to_le_bytes();
        assert_eq!(read_float(&data, 0, ComponentType::F32, true), 1.25);
    }

    #[test]
    fn test_read_int() {
        assert_eq!(read_int(&[0xFF], 0, ComponentType::I8), -1);
        assert_eq!(read_int(&[0xFF], 0, ComponentType::U8), 255);
        assert_eq!(read_int(&(-300i16).to_le_bytes(), 0, ComponentType::I16), -300);
        assert_eq!(read_int(&60000u16.to_le_bytes(), 0, ComponentType::U16), 60000);
        assert_eq!(read_int(&u32::MAX.to_le_bytes(), 0, ComponentType::U32), -1);
        assert_eq!(read_int(&(-2.9f32).to_le_bytes(), 0, ComponentType::F32), -2);
        assert_eq!(read_int(&2.9f32.to_le_bytes(), 0, ComponentType::F32), 2);
    }

    #[test]
    fn test_offset_reads() {
        let data = [0u8, 0, 0x34, 0x12];
        assert_eq!(read_int(&data, 2, ComponentType::U16), 0x1234);
    }
}
