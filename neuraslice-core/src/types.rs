use std::fmt;

/// Defines the possible data types for Tensor elements.
///
/// `F16` is the compressed storage precision used for GPU images; host
/// buffers may hold it too but the CPU kernels only compute in `F32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating-point type.
    F32,
    /// 16-bit IEEE half-precision floating-point type.
    F16,
}

/// Integer code for `F32` in an operator definition's `"T"` argument.
pub const DT_FLOAT: i64 = 1;
/// Integer code for `F16` in an operator definition's `"T"` argument.
pub const DT_HALF: i64 = 19;

impl DType {
    /// Size of one element in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            DType::F32 => std::mem::size_of::<f32>(),
            DType::F16 => std::mem::size_of::<half::f16>(),
        }
    }

    /// Code carried by the `"T"` operator argument.
    pub fn to_arg_code(self) -> i64 {
        match self {
            DType::F32 => DT_FLOAT,
            DType::F16 => DT_HALF,
        }
    }

    pub fn from_arg_code(code: i64) -> Option<DType> {
        match code {
            DT_FLOAT => Some(DType::F32),
            DT_HALF => Some(DType::F16),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
        };
        write!(f, "{}", s)
    }
}
