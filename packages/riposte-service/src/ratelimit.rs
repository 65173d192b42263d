use std::{
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use ahash::AHashMap;

use riposte_config::RateLimit;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RateDecision {
	Allowed,
	Throttled,
}

struct RateBucket {
	window_start: Instant,
	count: u32,
}

/// Fixed-window limiter keyed by caller identity. The outer map lock only
/// clones a bucket handle; check-and-increment happens under the bucket's
/// own lock, so one hot caller never serializes the others.
pub struct RateLimiter {
	window: Duration,
	max_requests: u32,
	buckets: Mutex<AHashMap<String, Arc<Mutex<RateBucket>>>>,
}
impl RateLimiter {
	pub fn new(cfg: &RateLimit) -> Self {
		Self {
			window: Duration::from_secs(cfg.window_secs),
			max_requests: cfg.max_requests,
			buckets: Mutex::new(AHashMap::new()),
		}
	}

	pub fn check(&self, identity: &str) -> RateDecision {
		self.check_at(identity, Instant::now())
	}

	/// Decision at an explicit instant. Rejected requests do not extend the
	/// window; the count stays clamped at the threshold so the window rolls
	/// over on schedule no matter how hard the caller hammers.
	pub fn check_at(&self, identity: &str, now: Instant) -> RateDecision {
		let bucket = {
			let mut buckets = self.buckets.lock().unwrap_or_else(|err| err.into_inner());

			buckets
				.entry(identity.to_string())
				.or_insert_with(|| {
					Arc::new(Mutex::new(RateBucket { window_start: now, count: 0 }))
				})
				.clone()
		};
		let mut bucket = bucket.lock().unwrap_or_else(|err| err.into_inner());

		if now.duration_since(bucket.window_start) >= self.window {
			bucket.window_start = now;
			bucket.count = 0;
		}
		if bucket.count >= self.max_requests {
			return RateDecision::Throttled;
		}

		bucket.count += 1;

		RateDecision::Allowed
	}
}

#[cfg(test)]
mod tests {
	use std::time::{Duration, Instant};

	use super::{RateDecision, RateLimiter};
	use riposte_config::RateLimit;

	fn limiter(window_secs: u64, max_requests: u32) -> RateLimiter {
		RateLimiter::new(&RateLimit { window_secs, max_requests, identity: "ip".to_string() })
	}

	#[test]
	fn allows_up_to_the_threshold_then_throttles() {
		let limiter = limiter(60, 2);
		let now = Instant::now();

		assert_eq!(limiter.check_at("1.2.3.4", now), RateDecision::Allowed);
		assert_eq!(limiter.check_at("1.2.3.4", now), RateDecision::Allowed);
		assert_eq!(limiter.check_at("1.2.3.4", now), RateDecision::Throttled);
	}

	#[test]
	fn identities_do_not_share_buckets() {
		let limiter = limiter(60, 1);
		let now = Instant::now();

		assert_eq!(limiter.check_at("a", now), RateDecision::Allowed);
		assert_eq!(limiter.check_at("b", now), RateDecision::Allowed);
		assert_eq!(limiter.check_at("a", now), RateDecision::Throttled);
	}

	#[test]
	fn window_resets_after_expiry() {
		let limiter = limiter(60, 1);
		let start = Instant::now();

		assert_eq!(limiter.check_at("a", start), RateDecision::Allowed);
		assert_eq!(limiter.check_at("a", start), RateDecision::Throttled);
		assert_eq!(
			limiter.check_at("a", start + Duration::from_secs(61)),
			RateDecision::Allowed
		);
	}

	#[test]
	fn rejections_do_not_extend_the_window() {
		let limiter = limiter(60, 1);
		let start = Instant::now();

		assert_eq!(limiter.check_at("a", start), RateDecision::Allowed);

		// Hammering mid-window must not push the reset point forward.
		for offset in 1..50 {
			assert_eq!(
				limiter.check_at("a", start + Duration::from_secs(offset)),
				RateDecision::Throttled
			);
		}

		assert_eq!(
			limiter.check_at("a", start + Duration::from_secs(60)),
			RateDecision::Allowed
		);
	}
}
