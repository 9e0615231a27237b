//! Time utilities and abstractions
//!
//! Cache expiry and circuit breaker cooldowns read time exclusively through
//! [`Clock`], so production code runs on [`SystemClock`] while tests drive a
//! [`MockClock`] forward without sleeping.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use catalog_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

mod clock;

pub use clock::{Clock, MockClock, SystemClock};
