//! Ratio-based circuit breaker over a count-based sliding window
//!
//! The breaker records the outcome of the last `sliding_window_size` calls.
//! Once at least `minimum_calls` outcomes are buffered and the failure ratio
//! reaches `failure_rate_threshold`, it opens and rejects calls until
//! `open_timeout` has elapsed. The next admission (or state query) after the
//! cooldown moves it to half-open, where `half_open_trial_calls` probes decide
//! whether it closes again or re-opens.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::time::{Clock, SystemClock};

//==============================================================================
// Error Types
//==============================================================================

/// Invalid resilience policy values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally and outcomes are buffered in the window
    Closed,
    /// Calls are rejected until the cooldown elapses
    Open,
    /// A bounded number of trial calls probe for recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

//==============================================================================
// Configuration
//==============================================================================

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failure ratio in `(0, 1]` at or above which the circuit opens
    pub failure_rate_threshold: f64,
    /// Number of most recent outcomes kept in the window
    pub sliding_window_size: usize,
    /// Outcomes required in the window before the ratio is evaluated
    pub minimum_calls: usize,
    /// How long the circuit stays open before allowing trial calls
    pub open_timeout: Duration,
    /// Consecutive trial successes needed to close from half-open
    pub half_open_trial_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            sliding_window_size: 20,
            minimum_calls: 10,
            open_timeout: Duration::from_secs(30),
            half_open_trial_calls: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 1.0) {
            return Err(ConfigError::invalid(format!(
                "failure_rate_threshold must be in (0, 1], got {}",
                self.failure_rate_threshold
            )));
        }

        if self.sliding_window_size == 0 {
            return Err(ConfigError::invalid("sliding_window_size must be greater than 0"));
        }

        if self.minimum_calls == 0 {
            return Err(ConfigError::invalid("minimum_calls must be greater than 0"));
        }

        if self.minimum_calls > self.sliding_window_size {
            return Err(ConfigError::invalid(format!(
                "minimum_calls ({}) cannot exceed sliding_window_size ({})",
                self.minimum_calls, self.sliding_window_size
            )));
        }

        if self.half_open_trial_calls == 0 {
            return Err(ConfigError::invalid("half_open_trial_calls must be greater than 0"));
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.config.failure_rate_threshold = threshold;
        self
    }

    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.config.sliding_window_size = size;
        self
    }

    pub fn minimum_calls(mut self, calls: usize) -> Self {
        self.config.minimum_calls = calls;
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = timeout;
        self
    }

    pub fn half_open_trial_calls(mut self, calls: u32) -> Self {
        self.config.half_open_trial_calls = calls;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//==============================================================================
// Metrics
//==============================================================================

/// Point-in-time view of the breaker for monitoring
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    /// Outcomes currently held in the window
    pub buffered_calls: usize,
    /// Failures currently held in the window
    pub failed_calls: usize,
    /// `failed_calls / buffered_calls`, 0.0 when the window is empty
    pub failure_rate: f64,
    /// Calls admitted since creation or the last `reset`
    pub permitted_calls: u64,
    /// Calls refused since creation or the last `reset`
    pub rejected_calls: u64,
    /// Consecutive successful trials in the current half-open period
    pub half_open_successes: u32,
    pub state_changed_at: Instant,
}

//==============================================================================
// Circuit Breaker
//==============================================================================

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// `true` marks a failed call
    window: VecDeque<bool>,
    failures: usize,
    opened_at: Option<Instant>,
    state_changed_at: Instant,
    half_open_in_flight: u32,
    half_open_successes: u32,
    /// Bumped on every transition so stale permits can be recognised
    generation: u64,
}

impl Inner {
    fn new(now: Instant) -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::new(),
            failures: 0,
            opened_at: None,
            state_changed_at: now,
            half_open_in_flight: 0,
            half_open_successes: 0,
            generation: 0,
        }
    }

    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.failures as f64 / self.window.len() as f64
        }
    }

    fn transition(&mut self, to: CircuitState, now: Instant) {
        self.state = to;
        self.state_changed_at = now;
        self.generation += 1;
        self.window.clear();
        self.failures = 0;
        self.half_open_in_flight = 0;
        self.half_open_successes = 0;
        self.opened_at = (to == CircuitState::Open).then_some(now);
    }
}

/// Circuit breaker guarding a single dependency
///
/// All bookkeeping happens under a short, non-async critical section, so the
/// breaker can be shared freely between tasks behind an `Arc`.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use catalog_common::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
/// use catalog_common::time::MockClock;
///
/// let config = CircuitBreakerConfig::builder()
///     .failure_rate_threshold(0.5)
///     .sliding_window_size(4)
///     .minimum_calls(2)
///     .open_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// let clock = MockClock::new();
/// let breaker = CircuitBreaker::with_clock(config, clock.clone()).unwrap();
///
/// breaker.try_acquire().unwrap().record_failure();
/// breaker.try_acquire().unwrap().record_failure();
/// assert_eq!(breaker.state(), CircuitState::Open);
/// assert!(breaker.try_acquire().is_none());
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(breaker.state(), CircuitState::HalfOpen);
/// ```
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    permitted_calls: AtomicU64,
    rejected_calls: AtomicU64,
    clock: C,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.inner.lock().state)
            .finish()
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a new circuit breaker using the system clock
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a circuit breaker with a custom clock (useful for testing)
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;
        let now = clock.now();
        Ok(Self {
            config,
            inner: Mutex::new(Inner::new(now)),
            permitted_calls: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
            clock,
        })
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask for permission to perform one call
    ///
    /// Returns `None` while open, or while half-open with every trial slot
    /// taken. The returned permit should be resolved with
    /// [`CallPermit::record_success`] or [`CallPermit::record_failure`].
    pub fn try_acquire(&self) -> Option<CallPermit<'_, C>> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);

        let trial = match inner.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                drop(inner);
                self.rejected_calls.fetch_add(1, Ordering::Relaxed);
                debug!("Circuit breaker rejecting call while open");
                return None;
            }
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight >= self.config.half_open_trial_calls {
                    drop(inner);
                    self.rejected_calls.fetch_add(1, Ordering::Relaxed);
                    debug!("Circuit breaker rejecting call, all trial slots taken");
                    return None;
                }
                inner.half_open_in_flight += 1;
                true
            }
        };

        let generation = inner.generation;
        drop(inner);
        self.permitted_calls.fetch_add(1, Ordering::Relaxed);
        Some(CallPermit { breaker: self, generation, trial, resolved: false })
    }

    /// Whether a call would currently be admitted. Does not reserve a slot.
    pub fn is_call_permitted(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                inner.half_open_in_flight < self.config.half_open_trial_calls
            }
        }
    }

    /// Record a successful call made without a permit
    pub fn record_success(&self) {
        self.on_outcome(false, None);
    }

    /// Record a failed call made without a permit
    pub fn record_failure(&self) {
        self.on_outcome(true, None);
    }

    /// Current state, applying the open to half-open transition if due
    pub fn state(&self) -> CircuitState {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);
        inner.state
    }

    /// Force the circuit open, restarting the cooldown
    pub fn transition_to_open(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let from = inner.state;
        inner.transition(CircuitState::Open, now);
        info!(%from, to = %CircuitState::Open, "Circuit breaker forced open");
    }

    /// Force the circuit closed with an empty window
    pub fn transition_to_closed(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let from = inner.state;
        inner.transition(CircuitState::Closed, now);
        info!(%from, to = %CircuitState::Closed, "Circuit breaker forced closed");
    }

    /// Return to the initial closed state and zero all counters
    pub fn reset(&self) {
        let now = self.clock.now();
        *self.inner.lock() = Inner::new(now);
        self.permitted_calls.store(0, Ordering::Relaxed);
        self.rejected_calls.store(0, Ordering::Relaxed);
        info!("Circuit breaker reset");
    }

    /// Snapshot of the breaker state and counters
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);
        CircuitBreakerMetrics {
            state: inner.state,
            buffered_calls: inner.window.len(),
            failed_calls: inner.failures,
            failure_rate: inner.failure_rate(),
            permitted_calls: self.permitted_calls.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
            half_open_successes: inner.half_open_successes,
            state_changed_at: inner.state_changed_at,
        }
    }

    fn maybe_half_open(&self, inner: &mut Inner, now: Instant) {
        if inner.state != CircuitState::Open {
            return;
        }
        let opened_at = inner.opened_at.unwrap_or(inner.state_changed_at);
        if now.saturating_duration_since(opened_at) >= self.config.open_timeout {
            inner.transition(CircuitState::HalfOpen, now);
            info!(from = %CircuitState::Open, to = %CircuitState::HalfOpen, "Circuit breaker cooldown elapsed");
        }
    }

    /// `permit` carries the admission generation and whether it held a trial slot
    fn on_outcome(&self, failed: bool, permit: Option<(u64, bool)>) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let stale = permit.is_some_and(|(generation, _)| generation != inner.generation);
        if let Some((_, true)) = permit {
            if !stale {
                inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
            }
        }

        match inner.state {
            CircuitState::Closed => {
                // A trial admitted before a forced close carries no signal for the new window.
                if stale && permit.is_some_and(|(_, trial)| trial) {
                    return;
                }
                inner.window.push_back(failed);
                if failed {
                    inner.failures += 1;
                }
                if inner.window.len() > self.config.sliding_window_size {
                    if let Some(true) = inner.window.pop_front() {
                        inner.failures -= 1;
                    }
                }

                let rate = inner.failure_rate();
                if inner.window.len() >= self.config.minimum_calls
                    && rate >= self.config.failure_rate_threshold
                {
                    let buffered = inner.window.len();
                    inner.transition(CircuitState::Open, now);
                    warn!(
                        failure_rate = rate,
                        buffered_calls = buffered,
                        from = %CircuitState::Closed,
                        to = %CircuitState::Open,
                        "Circuit breaker opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                if stale {
                    return;
                }
                if failed {
                    inner.transition(CircuitState::Open, now);
                    warn!(from = %CircuitState::HalfOpen, to = %CircuitState::Open, "Circuit breaker trial call failed");
                } else {
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.config.half_open_trial_calls {
                        let successes = inner.half_open_successes;
                        inner.transition(CircuitState::Closed, now);
                        info!(
                            successes,
                            from = %CircuitState::HalfOpen,
                            to = %CircuitState::Closed,
                            "Circuit breaker closed"
                        );
                    }
                }
            }
            CircuitState::Open => {
                debug!(failed, "Ignoring outcome recorded while circuit is open");
            }
        }
    }

    fn release_unresolved(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }
}

/// Admission granted by [`CircuitBreaker::try_acquire`]
///
/// Dropping the permit without recording an outcome (for example when the
/// calling future is cancelled) frees its trial slot without affecting the
/// window.
#[must_use = "record the call outcome on the permit"]
pub struct CallPermit<'a, C: Clock = SystemClock> {
    breaker: &'a CircuitBreaker<C>,
    generation: u64,
    trial: bool,
    resolved: bool,
}

impl<C: Clock> CallPermit<'_, C> {
    /// Whether this permit occupies a half-open trial slot
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) {
        self.resolved = true;
        self.breaker.on_outcome(false, Some((self.generation, self.trial)));
    }

    pub fn record_failure(mut self) {
        self.resolved = true;
        self.breaker.on_outcome(true, Some((self.generation, self.trial)));
    }
}

impl<C: Clock> Drop for CallPermit<'_, C> {
    fn drop(&mut self) {
        if !self.resolved && self.trial {
            self.breaker.release_unresolved(self.generation);
        }
    }
}

impl<C: Clock> fmt::Debug for CallPermit<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallPermit").field("trial", &self.trial).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockClock;

    fn breaker(clock: &MockClock) -> CircuitBreaker<MockClock> {
        let config = CircuitBreakerConfig::builder()
            .failure_rate_threshold(0.5)
            .sliding_window_size(4)
            .minimum_calls(4)
            .open_timeout(Duration::from_secs(30))
            .half_open_trial_calls(2)
            .build()
            .unwrap();
        CircuitBreaker::with_clock(config, clock.clone()).unwrap()
    }

    fn trip(breaker: &CircuitBreaker<MockClock>) {
        for _ in 0..4 {
            breaker.try_acquire().unwrap().record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_config_validation() {
        assert!(CircuitBreakerConfig::default().validate().is_ok());
        assert!(CircuitBreakerConfig::builder().failure_rate_threshold(0.0).build().is_err());
        assert!(CircuitBreakerConfig::builder().failure_rate_threshold(1.5).build().is_err());
        assert!(CircuitBreakerConfig::builder().failure_rate_threshold(1.0).build().is_ok());
        assert!(CircuitBreakerConfig::builder().sliding_window_size(0).build().is_err());
        assert!(CircuitBreakerConfig::builder()
            .sliding_window_size(5)
            .minimum_calls(6)
            .build()
            .is_err());
        assert!(CircuitBreakerConfig::builder().half_open_trial_calls(0).build().is_err());
    }

    #[test]
    fn test_stays_closed_below_minimum_calls() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);

        for _ in 0..3 {
            breaker.try_acquire().unwrap().record_failure();
        }

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().failed_calls, 3);
    }

    #[test]
    fn test_opens_when_ratio_meets_threshold() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);

        breaker.try_acquire().unwrap().record_success();
        breaker.try_acquire().unwrap().record_success();
        breaker.try_acquire().unwrap().record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.try_acquire().unwrap().record_failure();

        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_window_slides() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);

        // F S S S -> 25%, then S pushes the failure out
        breaker.record_failure();
        for _ in 0..4 {
            breaker.record_success();
        }

        let metrics = breaker.metrics();
        assert_eq!(metrics.buffered_calls, 4);
        assert_eq!(metrics.failed_calls, 0);
        assert_eq!(metrics.state, CircuitState::Closed);
    }

    #[test]
    fn test_open_rejects_until_cooldown() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);
        trip(&breaker);

        clock.advance(Duration::from_secs(29));
        assert!(breaker.try_acquire().is_none());
        assert_eq!(breaker.metrics().rejected_calls, 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);
        trip(&breaker);
        clock.advance(Duration::from_secs(30));

        let permit = breaker.try_acquire().unwrap();
        assert!(permit.is_trial());
        permit.record_failure();

        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_none());
    }

    #[test]
    fn test_half_open_successes_close() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);
        trip(&breaker);
        clock.advance(Duration::from_secs(30));

        breaker.try_acquire().unwrap().record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.try_acquire().unwrap().record_success();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().buffered_calls, 0);
    }

    #[test]
    fn test_half_open_limits_concurrent_trials() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);
        trip(&breaker);
        clock.advance(Duration::from_secs(30));

        let first = breaker.try_acquire().unwrap();
        let second = breaker.try_acquire().unwrap();
        assert!(breaker.try_acquire().is_none());

        // Cancelled trial frees its slot
        drop(first);
        assert!(breaker.is_call_permitted());

        second.record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_administrative_transitions() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);

        breaker.record_failure();
        breaker.transition_to_open();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.metrics().buffered_calls, 0);

        breaker.transition_to_closed();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire().is_some());

        trip(&breaker);
        breaker.reset();
        let metrics = breaker.metrics();
        assert_eq!(metrics.state, CircuitState::Closed);
        assert_eq!(metrics.permitted_calls, 0);
        assert_eq!(metrics.rejected_calls, 0);
    }

    #[test]
    fn test_stale_trial_permit_ignored_after_forced_close() {
        let clock = MockClock::new();
        let breaker = breaker(&clock);
        trip(&breaker);
        clock.advance(Duration::from_secs(30));

        let permit = breaker.try_acquire().unwrap();
        breaker.transition_to_closed();
        permit.record_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().buffered_calls, 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "CLOSED");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
        assert_eq!(CircuitState::HalfOpen.to_string(), "HALF_OPEN");
    }
}
