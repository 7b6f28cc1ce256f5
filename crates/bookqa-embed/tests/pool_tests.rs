use bookqa_embed::masked_mean_l2;
use candle_core::{DType, Device, Tensor};

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // Batch of two sequences, hidden dim 2. The second sequence has one padded token.
    let h = Tensor::from_slice(
        &[3.0f32, 4.0, 3.0, 4.0,   // seq 0: both tokens live
          0.0, 2.0, 100.0, 100.0], // seq 1: second token is padding
        (2, 2, 2),
        &dev,
    )
    .unwrap();
    let mask = Tensor::from_slice(&[1u32, 1, 1, 0], (2, 2), &dev).unwrap();
    let out: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();

    let expected = [[0.6f32, 0.8], [0.0, 1.0]];
    for (row, want) in out.iter().zip(expected) {
        for (a, b) in row.iter().zip(want) {
            assert!((a - b).abs() < 1e-5, "a={a} b={b}");
        }
    }
}

#[test]
fn masked_mean_l2_rejects_mismatched_mask() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((1, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((1, 2), DType::U32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}
