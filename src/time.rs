//! Time units and the clock used to stamp files.

use std::time::{SystemTime, UNIX_EPOCH};

/// Sets the timestamp to the current time (`utimensat`).
pub const UTIME_NOW: i64 = (1 << 30) - 1;
/// Leaves the timestamp unchanged (`utimensat`).
pub const UTIME_OMIT: i64 = (1 << 30) - 2;

/// A timestamp with nanosecond precision.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Timespec {
	/// Seconds since the Epoch (UNIX time).
	pub tv_sec: i64,
	/// Nanoseconds since `tv_sec`.
	pub tv_nsec: i64,
}

impl Timespec {
	/// Creates a timestamp from a number of seconds since the Epoch.
	pub const fn from_sec(sec: i64) -> Self {
		Self {
			tv_sec: sec,
			tv_nsec: 0,
		}
	}
}

/// A timestamp with microsecond precision (`utimes`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Timeval {
	/// Seconds since the Epoch (UNIX time).
	pub tv_sec: i64,
	/// Microseconds since `tv_sec`.
	pub tv_usec: i64,
}

impl Timeval {
	/// Converts the timestamp to a [`Timespec`].
	pub const fn to_timespec(self) -> Timespec {
		Timespec {
			tv_sec: self.tv_sec,
			tv_nsec: self.tv_usec * 1000,
		}
	}
}

/// Access and modification timestamps with second precision (`utime`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Utimbuf {
	/// Timestamp of the last access.
	pub actime: i64,
	/// Timestamp of the last modification.
	pub modtime: i64,
}

/// Returns the current time of the system clock.
pub fn now() -> Timespec {
	// A clock earlier than the Epoch yields the Epoch itself
	let d = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default();
	Timespec {
		tv_sec: d.as_secs() as _,
		tv_nsec: d.subsec_nanos() as _,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn timeval_conversion() {
		let ts = Timeval {
			tv_sec: 12,
			tv_usec: 34,
		}
		.to_timespec();
		assert_eq!(ts.tv_sec, 12);
		assert_eq!(ts.tv_nsec, 34000);
	}

	#[test]
	fn clock_monotonicity() {
		let a = now();
		let b = now();
		assert!((b.tv_sec, b.tv_nsec) >= (a.tv_sec, a.tv_nsec));
	}
}
