//! Bounded retry budget for saturated sends.

use std::time::Duration;

use serde::Deserialize;

use crate::config::serde_millis;

/// Number of enqueue attempts made by default before a send gives up.
pub const DEFAULT_ATTEMPTS: u32 = 10;

/// Default pause between two enqueue attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Delay curve between consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
	/// Same delay before every retry.
	#[default]
	Fixed,
	/// Delay multiplied by `factor` after each failure, capped at `max_delay`.
	Exponential {
		factor: u32,
		#[serde(rename = "max_delay_ms", with = "serde_millis")]
		max_delay: Duration,
	},
}

/// How many times, and how far apart, a send retries a full outbound queue.
///
/// `attempts` counts enqueue attempts, not retries: a policy of `N` attempts
/// sleeps at most `N - 1` times. Zero is treated as one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	pub attempts: u32,
	#[serde(rename = "delay_ms", with = "serde_millis")]
	pub delay: Duration,
	pub backoff: Backoff,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			attempts: DEFAULT_ATTEMPTS,
			delay: DEFAULT_DELAY,
			backoff: Backoff::Fixed,
		}
	}
}

impl RetryPolicy {
	/// Fixed-delay policy.
	pub const fn fixed(attempts: u32, delay: Duration) -> Self {
		Self {
			attempts,
			delay,
			backoff: Backoff::Fixed,
		}
	}

	/// Exponential policy starting at `delay`.
	pub const fn exponential(attempts: u32, delay: Duration, factor: u32, max_delay: Duration) -> Self {
		Self {
			attempts,
			delay,
			backoff: Backoff::Exponential { factor, max_delay },
		}
	}

	/// Effective attempt count.
	pub const fn max_attempts(&self) -> u32 {
		if self.attempts == 0 { 1 } else { self.attempts }
	}

	/// Delay slept after the `failure`-th failed attempt (zero based).
	pub fn delay_after(&self, failure: u32) -> Duration {
		match self.backoff {
			Backoff::Fixed => self.delay,
			Backoff::Exponential { factor, max_delay } => self
				.delay
				.saturating_mul(factor.max(1).saturating_pow(failure))
				.min(max_delay),
		}
	}

	/// Upper bound on the time one send can spend sleeping.
	pub fn worst_case(&self) -> Duration {
		(0..self.max_attempts() - 1).fold(Duration::ZERO, |acc, n| acc.saturating_add(self.delay_after(n)))
	}

	pub(crate) fn budget(&self) -> RetryBudget<'_> {
		RetryBudget {
			policy: self,
			remaining: self.max_attempts(),
			failures: 0,
		}
	}
}

/// Per-send budget, reset at the start of every send.
#[derive(Debug)]
pub(crate) struct RetryBudget<'a> {
	policy: &'a RetryPolicy,
	remaining: u32,
	failures: u32,
}

impl RetryBudget<'_> {
	/// Records a failed attempt and returns how long to wait before the next
	/// one, or `None` once the budget is spent.
	pub(crate) fn on_failure(&mut self) -> Option<Duration> {
		self.remaining = self.remaining.saturating_sub(1);
		let failure = self.failures;
		self.failures += 1;
		(self.remaining > 0).then(|| self.policy.delay_after(failure))
	}

	/// Failed attempts recorded so far.
	pub(crate) const fn failures(&self) -> u32 {
		self.failures
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fixed_budget_sleeps_between_attempts_only() {
		let policy = RetryPolicy::fixed(3, Duration::from_millis(5));
		let mut budget = policy.budget();
		assert_eq!(budget.on_failure(), Some(Duration::from_millis(5)));
		assert_eq!(budget.on_failure(), Some(Duration::from_millis(5)));
		assert_eq!(budget.on_failure(), None);
		assert_eq!(budget.failures(), 3);
		assert_eq!(policy.worst_case(), Duration::from_millis(10));
	}

	#[test]
	fn zero_attempts_still_tries_once() {
		let policy = RetryPolicy::fixed(0, Duration::from_secs(1));
		let mut budget = policy.budget();
		assert_eq!(budget.on_failure(), None);
		assert_eq!(policy.worst_case(), Duration::ZERO);
	}

	#[test]
	fn exponential_is_capped() {
		let policy = RetryPolicy::exponential(6, Duration::from_millis(10), 2, Duration::from_millis(50));
		let delays: Vec<_> = (0..5).map(|n| policy.delay_after(n).as_millis()).collect();
		assert_eq!(delays, [10u128, 20, 40, 50, 50]);
	}

	#[test]
	fn budget_resets_per_send() {
		let policy = RetryPolicy::fixed(2, Duration::ZERO);
		let mut first = policy.budget();
		assert!(first.on_failure().is_some());
		assert!(first.on_failure().is_none());
		let mut second = policy.budget();
		assert!(second.on_failure().is_some());
	}
}
