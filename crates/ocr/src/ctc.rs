//! Greedy (best path) CTC decoding

use crate::tokenizer::Tokenizer;
use ndarray::ArrayView2;

/// Arg-max class per time step of a `[T, K]` score matrix
///
/// Ties go to the lowest class index. A row with no classes yields class 0.
#[must_use]
pub fn best_path(logits: ArrayView2<'_, f32>) -> Vec<usize> {
    logits
        .rows()
        .into_iter()
        .map(|row| {
            let mut best_index = 0;
            let mut best_value = match row.get(0) {
                Some(&v) => v,
                None => return 0,
            };
            for (k, &v) in row.iter().enumerate().skip(1) {
                if v > best_value {
                    best_value = v;
                    best_index = k;
                }
            }
            best_index
        })
        .collect()
}

/// Decode a `[T, K]` score matrix into text with greedy CTC collapsing
#[must_use]
pub fn greedy_decode(logits: ArrayView2<'_, f32>, tokenizer: &Tokenizer) -> String {
    tokenizer.decode_ctc(&best_path(logits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{BLANK_ID, PAD_ID};
    use ndarray::Array2;

    /// One-hot style scores for the given class sequence
    fn scores(ids: &[usize], num_classes: usize) -> Array2<f32> {
        let mut logits = Array2::from_elem((ids.len(), num_classes), -5.0);
        for (t, &k) in ids.iter().enumerate() {
            logits[[t, k]] = 3.0;
        }
        logits
    }

    fn abc() -> Tokenizer {
        Tokenizer::from_json_str(r#"{"A": 0, "B": 1, "C": 2}"#, "<unk>").unwrap()
    }

    #[test]
    fn test_best_path_picks_max() {
        let logits = Array2::from_shape_vec(
            (3, 4),
            vec![
                0.1, 0.9, 0.0, 0.0, //
                -1.0, -2.0, -0.5, -3.0, //
                0.0, 0.0, 0.0, 7.5,
            ],
        )
        .unwrap();
        assert_eq!(best_path(logits.view()), vec![1, 2, 3]);
    }

    #[test]
    fn test_best_path_ties_go_to_lowest_index() {
        let logits = Array2::from_shape_vec((2, 3), vec![1.0, 1.0, 1.0, 0.0, 2.0, 2.0]).unwrap();
        assert_eq!(best_path(logits.view()), vec![0, 1]);
    }

    #[test]
    fn test_best_path_empty_inputs() {
        assert!(best_path(Array2::<f32>::zeros((0, 5)).view()).is_empty());
        assert_eq!(best_path(Array2::<f32>::zeros((2, 0)).view()), vec![0, 0]);
    }

    #[test]
    fn test_greedy_decode_collapses_runs() {
        // A=2, B=3, C=4, <unk>=5
        let tok = abc();
        let logits = scores(&[BLANK_ID, 2, 2, 2, BLANK_ID, 4, 4, BLANK_ID], tok.num_classes());
        assert_eq!(greedy_decode(logits.view(), &tok), "AC");
    }

    #[test]
    fn test_greedy_decode_repeated_letter_needs_separator() {
        let tok = abc();
        let doubled = scores(&[3, 3, PAD_ID, 3, 2], tok.num_classes());
        assert_eq!(greedy_decode(doubled.view(), &tok), "BBA");
    }

    #[test]
    fn test_greedy_decode_skips_unknown() {
        let tok = abc();
        let logits = scores(&[5, 2, 5, 5, 3], tok.num_classes());
        assert_eq!(greedy_decode(logits.view(), &tok), "AB");
    }

    #[test]
    fn test_greedy_decode_all_blank() {
        let tok = abc();
        let logits = scores(&[BLANK_ID; 10], tok.num_classes());
        assert_eq!(greedy_decode(logits.view(), &tok), "");
    }

    #[test]
    fn test_greedy_decode_on_non_contiguous_view() {
        let tok = abc();
        let logits = scores(&[2, 9, 3, 9, 4], 10);
        // every other time step: 2, 3, 4
        let strided = logits.slice(ndarray::s![..;2, ..]);
        assert_eq!(greedy_decode(strided, &tok), "ABC");
    }
}
