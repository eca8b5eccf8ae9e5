use crate::error::NeuraSliceError;

/// Calculates the strides for a given shape.
/// Strides represent the number of elements to skip in the flattened data array
/// to move one step along each dimension.
///
/// Example:
/// shape = [2, 3] -> strides = [3, 1]
/// shape = [2, 2, 2] -> strides = [4, 2, 1]
pub fn calculate_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }
    let rank = shape.len();
    let mut strides = vec![1; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Checks that `shape` is `[batch, height, width, channels]` with a nonzero volume
/// and returns that volume.
pub fn validate_shape(shape: &[usize]) -> Result<usize, NeuraSliceError> {
    if shape.len() != 4 {
        return Err(NeuraSliceError::InvalidShape {
            shape: shape.to_vec(),
            reason: format!("expected rank 4 [batch, height, width, channels], got rank {}", shape.len()),
        });
    }
    if let Some(axis) = shape.iter().position(|&d| d == 0) {
        return Err(NeuraSliceError::InvalidShape {
            shape: shape.to_vec(),
            reason: format!("dimension {} is zero, tensor would have no elements", axis),
        });
    }
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| NeuraSliceError::InvalidShape {
            shape: shape.to_vec(),
            reason: "volume overflows usize".to_string(),
        })
}

/// Converts logical coordinates into a flat Buffer-layout offset,
/// i.e. `((b*H + h)*W + w)*C + c` for NHWC.
pub fn coord_to_offset(coords: &[usize], shape: &[usize]) -> Result<usize, NeuraSliceError> {
    if coords.len() != shape.len() || coords.iter().zip(shape).any(|(&i, &d)| i >= d) {
        return Err(NeuraSliceError::IndexOutOfBounds {
            index: coords.to_vec(),
            shape: shape.to_vec(),
        });
    }
    Ok(coords.iter().zip(shape).fold(0, |acc, (&i, &d)| acc * d + i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_strides() {
        assert_eq!(calculate_strides(&[2, 3]), vec![3, 1]);
        assert_eq!(calculate_strides(&[3, 13, 17, 8]), vec![13 * 17 * 8, 17 * 8, 8, 1]);
        assert!(calculate_strides(&[]).is_empty());
    }

    #[test]
    fn test_validate_shape() {
        assert_eq!(validate_shape(&[3, 13, 17, 8]), Ok(3 * 13 * 17 * 8));
        assert!(matches!(validate_shape(&[3, 0, 17, 8]), Err(NeuraSliceError::InvalidShape { .. })));
        assert!(matches!(validate_shape(&[3, 17, 8]), Err(NeuraSliceError::InvalidShape { .. })));
    }

    #[test]
    fn test_validate_shape_volume_overflow() {
        let half_bits = usize::BITS / 2 + 1;
        let shape = [1usize << half_bits, 1 << half_bits, 1, 1];
        assert_eq!(
            validate_shape(&shape),
            Err(NeuraSliceError::InvalidShape {
                shape: shape.to_vec(),
                reason: "volume overflows usize".to_string(),
            })
        );
        assert!(matches!(validate_shape(&[usize::MAX, 2, 1, 1]), Err(NeuraSliceError::InvalidShape { .. })));
    }

    #[test]
    fn test_coord_to_offset_matches_nhwc_formula() {
        let shape = [3, 13, 17, 8];
        let (b, h, w, c) = (2, 5, 11, 6);
        let expected = ((b * 13 + h) * 17 + w) * 8 + c;
        assert_eq!(coord_to_offset(&[b, h, w, c], &shape), Ok(expected));
        let strides = calculate_strides(&shape);
        let via_strides: usize = [b, h, w, c].iter().zip(&strides).map(|(i, s)| i * s).sum();
        assert_eq!(via_strides, expected);
    }

    #[test]
    fn test_coord_to_offset_out_of_bounds() {
        assert!(matches!(
            coord_to_offset(&[0, 0, 0, 8], &[1, 1, 1, 8]),
            Err(NeuraSliceError::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            coord_to_offset(&[0, 0, 0], &[1, 1, 1, 8]),
            Err(NeuraSliceError::IndexOutOfBounds { .. })
        ));
    }
}
