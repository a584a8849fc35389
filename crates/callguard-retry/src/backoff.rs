use std::time::Duration;

/// Abstraction for computing retry intervals.
///
/// This trait allows for flexible backoff strategies including fixed delays,
/// exponential backoff, randomized backoff, and custom implementations.
pub trait IntervalFunction: Send + Sync {
    /// Computes the delay before the next retry attempt.
    ///
    /// # Arguments
    /// * `retry` - The retry number (0-indexed, so the first retry is 0)
    fn next_interval(&self, retry: usize) -> Duration;
}

/// Fixed interval backoff - returns the same duration for every retry.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    /// Creates a new fixed interval backoff.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for FixedInterval {
    /// 1000 ms between attempts.
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _retry: usize) -> Duration {
        self.duration
    }
}

/// Exponential backoff with configurable multiplier.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates a new exponential backoff with default multiplier of 2.0.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    /// Sets the multiplier for exponential growth.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum interval to cap exponential growth.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    fn base_interval(&self, retry: usize) -> Duration {
        exponential(self.initial_interval, self.multiplier, retry, self.max_interval)
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, retry: usize) -> Duration {
        self.base_interval(retry)
    }
}

/// Exponential backoff with randomization so that callers failing together
/// do not retry together.
#[derive(Debug, Clone)]
pub struct ExponentialRandomBackoff {
    inner: ExponentialBackoff,
    randomization_factor: f64,
}

impl ExponentialRandomBackoff {
    /// Creates a new exponential random backoff.
    ///
    /// A `randomization_factor` of 0.5 spreads each interval between 50% and
    /// 150% of the exponential value. The factor is clamped to `0.0..=1.0`;
    /// NaN disables randomization.
    pub fn new(initial_interval: Duration, randomization_factor: f64) -> Self {
        let randomization_factor = if randomization_factor.is_nan() {
            0.0
        } else {
            randomization_factor.clamp(0.0, 1.0)
        };
        Self {
            inner: ExponentialBackoff::new(initial_interval),
            randomization_factor,
        }
    }

    /// Sets the multiplier for exponential growth.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.inner = self.inner.multiplier(multiplier);
        self
    }

    /// Sets the maximum interval to cap exponential growth, applied before
    /// randomization.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.inner = self.inner.max_interval(max_interval);
        self
    }

    fn randomize(&self, duration: Duration) -> Duration {
        use rand::Rng;

        let secs = duration.as_secs_f64();
        let delta = secs * self.randomization_factor;
        if delta <= 0.0 {
            return duration;
        }
        let randomized = rand::rng().random_range((secs - delta)..=(secs + delta));
        // The upper half of the range may overshoot a saturated interval.
        Duration::try_from_secs_f64(randomized.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl IntervalFunction for ExponentialRandomBackoff {
    fn next_interval(&self, retry: usize) -> Duration {
        self.randomize(self.inner.base_interval(retry))
    }
}

/// Function-based interval implementation.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Creates a new function-based interval.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, retry: usize) -> Duration {
        (self.f)(retry)
    }
}

impl<F> std::fmt::Debug for FnInterval<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnInterval").finish_non_exhaustive()
    }
}

fn exponential(
    initial: Duration,
    multiplier: f64,
    retry: usize,
    max: Option<Duration>,
) -> Duration {
    let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
    let secs = initial.as_secs_f64() * multiplier.powi(exponent);
    let interval = if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    };

    match max {
        Some(max) => interval.min(max),
        None => interval,
    }
}
