// Test intent: overlap-add convolution agrees with the direct sum and is
// bilinear.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use specframe::convolve::convolve_into;
use specframe::{convolve, SpectralError, StridedMut};

fn direct(signal: &[f64], ir: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; signal.len() + ir.len() - 1];
    for (i, s) in signal.iter().enumerate() {
        for (j, h) in ir.iter().enumerate() {
            out[i + j] += s * h;
        }
    }
    out
}

fn random(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[test]
fn long_signal_short_filter() {
    let mut rng = StdRng::seed_from_u64(21);
    let signal = random(&mut rng, 5000);
    let ir = random(&mut rng, 31);
    let fast = convolve(&signal, &ir).unwrap();
    let slow = direct(&signal, &ir);
    assert_eq!(fast.len(), 5030);
    for (a, b) in fast.iter().zip(&slow) {
        assert!((a - b).abs() < 1e-10);
    }
}

#[test]
fn single_sample_inputs() {
    assert_eq!(convolve(&[3.0], &[2.0]).unwrap().len(), 1);
    assert!((convolve(&[3.0], &[2.0]).unwrap()[0] - 6.0).abs() < 1e-12);
    let shifted = convolve(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).unwrap();
    let expected = [0.0, 0.0, 1.0, 2.0, 3.0];
    for (a, b) in shifted.iter().zip(&expected) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn destination_is_overwritten_not_accumulated() {
    let signal = [1.0, 2.0];
    let ir = [1.0, 1.0];
    let mut dst = vec![100.0; 3];
    convolve_into(&signal, &ir, &mut dst).unwrap();
    for (a, b) in dst.iter().zip(&[1.0, 3.0, 2.0]) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn strided_destination() {
    let mut out = vec![-1.0; 10];
    let dst = StridedMut::with_stride(&mut out, 0, 5, 2).unwrap();
    convolve_into(&[1.0, 2.0, 3.0], &[1.0, -1.0, 0.5], dst).unwrap();
    let expected = direct(&[1.0, 2.0, 3.0], &[1.0, -1.0, 0.5]);
    for (i, e) in expected.iter().enumerate() {
        assert!((out[2 * i] - e).abs() < 1e-12);
        assert_eq!(out[2 * i + 1], -1.0);
    }
}

#[test]
fn size_errors() {
    let mut dst = vec![0.0; 4];
    assert!(matches!(
        convolve_into(&[1.0, 2.0], &[1.0], &mut dst),
        Err(SpectralError::InvalidArgument(_))
    ));
    assert!(convolve(&[] as &[f64], &[] as &[f64]).is_err());
}

proptest! {
    #[test]
    fn length_and_bilinearity(
        s1 in proptest::collection::vec(-10.0f64..10.0, 1..200),
        seed in any::<u64>(),
        ir_len in 1usize..40,
        a in -3.0f64..3.0,
        b in -3.0f64..3.0,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let s2 = random(&mut rng, s1.len());
        let ir = random(&mut rng, ir_len);
        let mixed: Vec<f64> = s1.iter().zip(&s2).map(|(x, y)| a * x + b * y).collect();

        let lhs = convolve(&mixed, &ir).unwrap();
        let c1 = convolve(&s1, &ir).unwrap();
        let c2 = convolve(&s2, &ir).unwrap();
        prop_assert_eq!(lhs.len(), s1.len() + ir_len - 1);
        for ((l, x), y) in lhs.iter().zip(&c1).zip(&c2) {
            prop_assert!((l - (a * x + b * y)).abs() < 1e-9);
        }
    }
}
