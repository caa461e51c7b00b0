//! Element types for primr buffers
//!
//! Every primr buffer is a tightly packed sequence of 32-bit elements.
//! `DType` names the three element types baseline WebGPU storage buffers
//! can carry, and provides the WGSL name mappings the shader generators
//! use. Radix-sort keys are always `U32`; callers sorting signed or
//! floating-point keys remap them to order-preserving bits first.

use std::fmt;

/// A 32-bit element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit unsigned integer
    U32,
    /// 32-bit signed integer
    I32,
    /// 32-bit IEEE 754 float
    F32,
}

impl DType {
    /// Size of one element in bytes. Always 4.
    #[inline]
    pub const fn size_bytes(self) -> usize {
        4
    }

    /// The WGSL scalar type name for this dtype.
    pub(crate) const fn wgsl_type(self) -> &'static str {
        match self {
            DType::U32 => "u32",
            DType::I32 => "i32",
            DType::F32 => "f32",
        }
    }

    /// Entry-point and module name suffix for this dtype.
    pub(crate) const fn suffix(self) -> &'static str {
        match self {
            DType::U32 => "u32",
            DType::I32 => "i32",
            DType::F32 => "f32",
        }
    }

    /// WGSL literal for the additive identity of this dtype.
    pub(crate) const fn zero_literal(self) -> &'static str {
        match self {
            DType::U32 => "0u",
            DType::I32 => "0",
            DType::F32 => "0.0",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgsl_mapping() {
        assert_eq!(DType::U32.wgsl_type(), "u32");
        assert_eq!(DType::I32.wgsl_type(), "i32");
        assert_eq!(DType::F32.wgsl_type(), "f32");
        assert_eq!(DType::F32.zero_literal(), "0.0");
    }

    #[test]
    fn test_size() {
        for dtype in [DType::U32, DType::I32, DType::F32] {
            assert_eq!(dtype.size_bytes(), 4);
        }
    }
}
