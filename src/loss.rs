use burn::{nn::loss::Reduction, prelude::*};

/// Negative log-likelihood of the target classes.
///
/// The model already outputs log-probabilities, so unlike a cross entropy over
/// logits no softmax is applied here.
///
/// # Shapes
///
/// - log_probs: `[batch_size, num_classes]`
/// - targets: `[batch_size]`
/// - output: `[1]`
pub fn nll_loss<B: Backend>(
    log_probs: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    reduction: Reduction,
) -> Tensor<B, 1> {
    let [batch_size, _] = log_probs.dims();

    let picked = log_probs
        .gather(1, targets.reshape([batch_size, 1]))
        .reshape([batch_size])
        .neg();

    match reduction {
        Reduction::Sum => picked.sum(),
        _ => picked.mean(),
    }
}

/// Index of the highest score of each row.
///
/// # Shapes
///
/// - scores: `[batch_size, num_classes]`
/// - output: `[batch_size]`
pub fn predicted_classes<B: Backend>(scores: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    let [batch_size, _] = scores.dims();
    scores.argmax(1).reshape([batch_size])
}

/// Number of rows whose highest score is the target class.
pub fn num_correct<B: Backend>(scores: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let correct = predicted_classes(scores)
        .equal(targets)
        .int()
        .sum()
        .into_scalar();

    correct.elem::<i64>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;
    use burn::tensor::{activation::log_softmax, ops::FloatElem, Tolerance};
    type FT = FloatElem<TestBackend>;

    #[test]
    fn nll_picks_target_log_probability() {
        let device = Default::default();
        let log_probs = Tensor::<TestBackend, 2>::from_floats(
            [[-0.5, -1.0, -2.0], [-3.0, -0.25, -1.5]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([2, 1], &device);

        let mean = nll_loss(log_probs.clone(), targets.clone(), Reduction::Mean);
        let sum = nll_loss(log_probs, targets, Reduction::Sum);

        mean.into_data()
            .assert_approx_eq::<FT>(&TensorData::from([1.125]), Tolerance::default());
        sum.into_data()
            .assert_approx_eq::<FT>(&TensorData::from([2.25]), Tolerance::default());
    }

    #[test]
    fn nll_of_log_softmax_matches_cross_entropy() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0, 3.0]], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0], &device);

        let loss = nll_loss(log_softmax(logits, 1), targets, Reduction::Mean);

        // -log(e^1 / (e^1 + e^2 + e^3))
        loss.into_data()
            .assert_approx_eq::<FT>(&TensorData::from([2.407_606]), Tolerance::default());
    }

    #[test]
    fn argmax_is_invariant_under_monotonic_rescaling() {
        let device = Default::default();
        let log_probs = log_softmax(
            Tensor::<TestBackend, 2>::from_floats(
                [[0.1, 2.0, -1.0, 0.5], [3.0, -2.0, 1.0, 2.5], [-1.0, -1.0, 4.0, 0.0]],
                &device,
            ),
            1,
        );
        let expected = predicted_classes(log_probs.clone())
            .into_data()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(expected, vec![1, 0, 2]);

        for (scale, shift) in [(2.0, 0.0), (0.1, 5.0), (7.5, -3.0)] {
            let rescaled = log_probs.clone() * scale + shift;
            let actual = predicted_classes(rescaled).into_data().to_vec::<i64>().unwrap();
            assert_eq!(actual, expected);
        }

        let exponentiated = predicted_classes(log_probs.exp())
            .into_data()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(exponentiated, expected);
    }

    #[test]
    fn counts_correct_predictions() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_floats(
            [[0.9, 0.1], [0.2, 0.8], [0.6, 0.4]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 1], &device);

        assert_eq!(num_correct(scores, targets), 2);
    }
}
