//! Property tests for the broadcast index mapper

use proptest::prelude::*;
use spmm_core::bcast::{contiguous_strides, BcastInfo};

/// Operand shape pair where every axis of each operand is 1 or the output extent
fn shape_pair() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    prop::collection::vec((1usize..5, 0u8..3), 1..4).prop_map(|axes| {
        let pair: (Vec<usize>, Vec<usize>) = axes
            .into_iter()
            .map(|(extent, mode)| match mode {
                0 => (extent, extent),
                1 => (1, extent),
                _ => (extent, 1),
            })
            .unzip();
        pair
    })
}

proptest! {
    #[test]
    fn fast_paths_agree_with_general_path((lhs, rhs) in shape_pair()) {
        let info = BcastInfo::from_feature_shapes(&lhs, &rhs).unwrap();
        for idx in 0..info.out_len() {
            prop_assert_eq!(info.unravel_ravel(idx), info.unravel_ravel_general(idx));
        }
    }

    #[test]
    fn offsets_stay_inside_operands((lhs, rhs) in shape_pair()) {
        let info = BcastInfo::from_feature_shapes(&lhs, &rhs).unwrap();
        for (l, r) in info.offset_table() {
            prop_assert!(l < info.lhs_len());
            prop_assert!(r < info.rhs_len());
        }
    }

    #[test]
    fn mapping_matches_coordinate_clamp((lhs, rhs) in shape_pair()) {
        let info = BcastInfo::from_feature_shapes(&lhs, &rhs).unwrap();
        let lhs_stride = contiguous_strides(info.lhs_shape());
        for idx in 0..info.out_len() {
            let mut expected = 0;
            for d in 0..info.ndim() {
                let coord = (idx / info.out_stride()[d]) % info.out_shape()[d];
                expected += coord.min(info.lhs_shape()[d] - 1) * lhs_stride[d];
            }
            prop_assert_eq!(info.unravel_ravel(idx).0, expected);
        }
    }
}

#[test]
fn equal_shapes_are_identity() {
    let info = BcastInfo::from_feature_shapes(&[2, 3], &[2, 3]).unwrap();
    assert!(!info.is_broadcast());
    for idx in 0..info.out_len() {
        assert_eq!(info.unravel_ravel(idx), (idx, idx));
    }
}
