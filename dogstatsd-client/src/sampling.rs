use rand::Rng;

/// Decides whether a metric submitted at the given sample rate should be sent.
///
/// A single uniform draw is taken from `[0, 1)`, and the metric is kept unless the draw is greater than `rate`. Callers
/// only consult this for rates below 1.0, as anything at or above it is always sent.
pub(crate) fn should_send<R>(rng: &mut R, rate: f64) -> bool
where
    R: Rng + ?Sized,
{
    rng.random::<f64>() <= rate
}
