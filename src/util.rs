use std::time::Duration;

/// Cut `s` to at most `max` characters without splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> &str {
	match s.char_indices().nth(max) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}

/// Timeout proportional to the size of the tree, clamped to `[min, max]` seconds
pub fn scaled_timeout(file_count: usize, per_second: usize, min: u64, max: u64) -> Duration {
	let scaled = (file_count / per_second.max(1)) as u64;
	Duration::from_secs(scaled.clamp(min, max))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_chars() {
		assert_eq!(truncate_chars("hello", 10), "hello");
		assert_eq!(truncate_chars("hello", 3), "hel");
		assert_eq!(truncate_chars("héllo", 2), "hé");
		assert_eq!(truncate_chars("", 5), "");
	}

	#[test]
	fn test_scaled_timeout_bounds() {
		// staging: max(600, min(3600, n/50))
		assert_eq!(scaled_timeout(1, 50, 600, 3600), Duration::from_secs(600));
		assert_eq!(scaled_timeout(100_000, 50, 600, 3600), Duration::from_secs(2000));
		assert_eq!(scaled_timeout(10_000_000, 50, 600, 3600), Duration::from_secs(3600));

		// push: max(1800, min(7200, n/20))
		assert_eq!(scaled_timeout(0, 20, 1800, 7200), Duration::from_secs(1800));
		assert_eq!(scaled_timeout(60_000, 20, 1800, 7200), Duration::from_secs(3000));
		assert_eq!(scaled_timeout(1_000_000, 20, 1800, 7200), Duration::from_secs(7200));
	}
}

// vim: ts=4
