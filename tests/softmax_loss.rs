use rand::{rngs::StdRng, Rng, SeedableRng};
use softmax_linear::{
    evaluate, grad_check_sparse, numerical_gradient, softmax_loss_naive, softmax_loss_vectorized,
    GradCheckConfig, Matrix, SoftmaxError, Strategy,
};
use softmax_linear::loss::softmax::row_softmax;

fn random_problem(seed: u64, n: usize, d: usize, c: usize) -> (Matrix, Matrix, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Matrix::gaussian(n, d, 1.0, &mut rng);
    let w = Matrix::gaussian(d, c, 0.5, &mut rng);
    let y = (0..n).map(|_| rng.gen_range(0..c)).collect();
    (w, x, y)
}

fn assert_close(a: f64, b: f64, rel: f64) {
    let scale = a.abs().max(b.abs()).max(1.0);
    assert!((a - b).abs() <= rel * scale, "{a} vs {b}");
}

#[test]
fn identity_batch_matches_hand_computed_values() {
    let x = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    let w = Matrix::zeros(2, 3);
    let y = [0, 1];

    let third = 1.0 / 3.0;
    let expected_grad = Matrix::from_data(vec![
        vec![-third, third / 2.0, third / 2.0],
        vec![third / 2.0, -third, third / 2.0],
    ])
    .unwrap();

    for strategy in Strategy::ALL {
        let out = evaluate(&w, &x, &y, 0.0, strategy).unwrap();
        assert_close(out.loss, 3f64.ln(), 1e-12);
        assert!((out.loss - 1.0986).abs() < 1e-4);
        assert!(out.grad.sub(&expected_grad).unwrap().max_abs() < 1e-12);
    }
}

#[test]
fn strategies_agree_on_random_problems() {
    for seed in 0..5 {
        let (w, x, y) = random_problem(seed, 40, 12, 7);
        for reg in [0.0, 0.3] {
            let naive = softmax_loss_naive(&w, &x, &y, reg).unwrap();
            let batched = softmax_loss_vectorized(&w, &x, &y, reg).unwrap();

            assert_close(naive.loss, batched.loss, 1e-7);
            assert_eq!(naive.grad.shape(), w.shape());
            assert_eq!(batched.grad.shape(), w.shape());
            let scale = batched.grad.max_abs().max(1.0);
            assert!(naive.grad.sub(&batched.grad).unwrap().max_abs() <= 1e-7 * scale);
        }
    }
}

#[test]
fn analytic_gradient_matches_finite_differences() {
    let (w, x, y) = random_problem(11, 8, 5, 4);

    for strategy in Strategy::ALL {
        for reg in [0.0, 0.1] {
            let analytic = evaluate(&w, &x, &y, reg, strategy).unwrap().grad;
            let numerical = numerical_gradient(
                |m| Ok(evaluate(m, &x, &y, reg, strategy)?.loss),
                &w,
                1e-5,
            )
            .unwrap();
            assert!(
                analytic.sub(&numerical).unwrap().max_abs() < 1e-7,
                "{} reg {reg}",
                strategy.name()
            );
        }
    }
}

#[test]
fn sparse_gradient_check_passes_for_both_strategies() {
    let (w, x, y) = random_problem(21, 30, 10, 5);
    let config = GradCheckConfig { num_checks: 20, tolerance: 1e-5, ..GradCheckConfig::default() };
    let mut rng = StdRng::seed_from_u64(99);

    for strategy in Strategy::ALL {
        let analytic = evaluate(&w, &x, &y, 0.05, strategy).unwrap().grad;
        let report = grad_check_sparse(
            |m| Ok(evaluate(m, &x, &y, 0.05, strategy)?.loss),
            &w,
            &analytic,
            &config,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.samples.len(), 20);
        assert!(report.passed(), "{}: {}", strategy.name(), report.max_rel_error);
    }
}

#[test]
fn shifting_every_score_of_a_row_leaves_the_loss_unchanged() {
    let (w, x, y) = random_problem(3, 10, 4, 6);

    // A constant-one feature whose weight row is constant adds the same
    // offset to every class score of every example.
    let x_aug = Matrix::filled_with(x.rows, x.cols + 1, |i, k| if k < x.cols { x.get(i, k) } else { 1.0 });
    let w_aug = Matrix::filled_with(w.rows + 1, w.cols, |k, j| if k < w.rows { w.get(k, j) } else { 250.0 });

    for strategy in Strategy::ALL {
        let base = evaluate(&w, &x, &y, 0.0, strategy).unwrap().loss;
        let shifted = evaluate(&w_aug, &x_aug, &y, 0.0, strategy).unwrap().loss;
        assert_close(base, shifted, 1e-10);
    }

    let scores = x.matmul(&w).unwrap();
    let probs = row_softmax(&scores);
    let shifted = row_softmax(&scores.map(|s| s - 1e3));
    assert!(probs.sub(&shifted).unwrap().max_abs() < 1e-12);
}

#[test]
fn loss_is_non_negative() {
    for seed in 0..10 {
        let (w, x, y) = random_problem(100 + seed, 15, 6, 3);
        for strategy in Strategy::ALL {
            for reg in [0.0, 1e-3, 2.0] {
                assert!(evaluate(&w, &x, &y, reg, strategy).unwrap().loss >= 0.0);
            }
        }
    }
}

#[test]
fn zero_weights_reduce_loss_to_log_class_count() {
    let (_, x, y) = random_problem(4, 12, 5, 10);
    let w = Matrix::zeros(5, 10);

    for strategy in Strategy::ALL {
        for reg in [0.0, 7.5] {
            let out = evaluate(&w, &x, &y, reg, strategy).unwrap();
            assert_close(out.loss, 10f64.ln(), 1e-12);
        }
    }
}

#[test]
fn mismatched_feature_dimension_is_rejected() {
    let x = Matrix::zeros(2, 3);
    let w = Matrix::zeros(2, 3);

    for strategy in Strategy::ALL {
        assert_eq!(
            evaluate(&w, &x, &[0, 1], 0.0, strategy),
            Err(SoftmaxError::ShapeMismatch {
                what: "data columns vs weight rows",
                got: 3,
                expected: 2,
            })
        );
    }
}

#[test]
fn deserialized_matrix_with_missing_rows_is_rejected() {
    let x: Matrix = serde_json::from_str(r#"{"rows":2,"cols":2,"data":[[1.0,0.0]]}"#).unwrap();
    let w = Matrix::zeros(2, 3);

    for strategy in Strategy::ALL {
        assert!(matches!(
            evaluate(&w, &x, &[0, 1], 0.0, strategy),
            Err(SoftmaxError::ShapeMismatch { .. })
        ));
    }
}

#[test]
fn weights_with_short_rows_are_rejected() {
    let x = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    let w: Matrix =
        serde_json::from_str(r#"{"rows":2,"cols":3,"data":[[0.0,0.0],[0.0,0.0]]}"#).unwrap();

    for strategy in Strategy::ALL {
        assert_eq!(
            evaluate(&w, &x, &[0, 2], 0.0, strategy),
            Err(SoftmaxError::ShapeMismatch { what: "row length", got: 2, expected: 3 })
        );
    }
}

#[test]
fn label_equal_to_class_count_is_rejected() {
    let x = Matrix::zeros(2, 2);
    let w = Matrix::zeros(2, 3);

    for strategy in Strategy::ALL {
        assert_eq!(
            evaluate(&w, &x, &[0, 3], 0.0, strategy),
            Err(SoftmaxError::LabelOutOfRange { index: 1, label: 3, classes: 3 })
        );
    }
}

#[test]
fn result_serializes_with_loss_and_gradient() {
    let x = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    let out = evaluate(&Matrix::zeros(2, 3), &x, &[0, 1], 0.0, Strategy::Batched).unwrap();

    let json = serde_json::to_value(&out).unwrap();
    assert!(json["loss"].as_f64().is_some());
    assert_eq!(json["grad"]["rows"], 2);
    assert_eq!(json["grad"]["cols"], 3);
}
