//! This module stores the errno utilities.
//!
//! Every fallible operation of the crate fails with an [`Errno`], carrying only the numeric
//! error code. The values are the Linux uapi values, so callers can reuse standard bindings.

use core::fmt;
use std::error::Error;

/// Operation not permitted.
pub const EPERM: i32 = 1;
/// No such file or directory.
pub const ENOENT: i32 = 2;
/// No such process.
pub const ESRCH: i32 = 3;
/// Interrupted function.
pub const EINTR: i32 = 4;
/// I/O error.
pub const EIO: i32 = 5;
/// No such device or address.
pub const ENXIO: i32 = 6;
/// Argument list too long.
pub const E2BIG: i32 = 7;
/// Executable file format error.
pub const ENOEXEC: i32 = 8;
/// Bad file descriptor.
pub const EBADF: i32 = 9;
/// No child processes.
pub const ECHILD: i32 = 10;
/// Resource unavailable, try again.
pub const EAGAIN: i32 = 11;
/// Not enough space.
pub const ENOMEM: i32 = 12;
/// Permission denied.
pub const EACCES: i32 = 13;
/// Bad address.
pub const EFAULT: i32 = 14;
/// Device or resource busy.
pub const EBUSY: i32 = 16;
/// File exists.
pub const EEXIST: i32 = 17;
/// Cross-device link.
pub const EXDEV: i32 = 18;
/// No such device.
pub const ENODEV: i32 = 19;
/// Not a directory or a symbolic link to a directory.
pub const ENOTDIR: i32 = 20;
/// Is a directory.
pub const EISDIR: i32 = 21;
/// Invalid argument.
pub const EINVAL: i32 = 22;
/// Too many files open in system.
pub const ENFILE: i32 = 23;
/// File descriptor value too large.
pub const EMFILE: i32 = 24;
/// Inappropriate I/O control operation.
pub const ENOTTY: i32 = 25;
/// Text file busy.
pub const ETXTBSY: i32 = 26;
/// File too large.
pub const EFBIG: i32 = 27;
/// No space left on device.
pub const ENOSPC: i32 = 28;
/// Invalid seek.
pub const ESPIPE: i32 = 29;
/// Read-only file system.
pub const EROFS: i32 = 30;
/// Too many links.
pub const EMLINK: i32 = 31;
/// Broken pipe.
pub const EPIPE: i32 = 32;
/// Result too large.
pub const ERANGE: i32 = 34;
/// Filename too long.
pub const ENAMETOOLONG: i32 = 36;
/// Directory not empty.
pub const ENOTEMPTY: i32 = 39;
/// Too many levels of symbolic links.
pub const ELOOP: i32 = 40;
/// No data available.
pub const ENODATA: i32 = 61;
/// Value too large to be stored in data type.
pub const EOVERFLOW: i32 = 75;
/// Operation not supported.
pub const EOPNOTSUPP: i32 = 95;

/// Constructs an [`Errno`] from its symbolic name.
#[macro_export]
macro_rules! errno {
	($name:ident) => {
		$crate::errno::Errno::new($crate::errno::$name)
	};
}

/// Result with an [`Errno`] as the error type.
pub type EResult<T> = core::result::Result<T, Errno>;

/// Structure representing a Unix errno.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Errno(i32);

impl Errno {
	/// Creates a new instance from the given numeric code.
	pub const fn new(errno: i32) -> Self {
		Self(errno)
	}

	/// Returns the numeric value of the errno.
	pub const fn as_int(self) -> i32 {
		self.0
	}

	/// Returns the symbolic name of the errno.
	///
	/// If the code is not known to the crate, the function returns `None`.
	pub const fn name(self) -> Option<&'static str> {
		let name = match self.0 {
			EPERM => "EPERM",
			ENOENT => "ENOENT",
			ESRCH => "ESRCH",
			EINTR => "EINTR",
			EIO => "EIO",
			ENXIO => "ENXIO",
			E2BIG => "E2BIG",
			ENOEXEC => "ENOEXEC",
			EBADF => "EBADF",
			ECHILD => "ECHILD",
			EAGAIN => "EAGAIN",
			ENOMEM => "ENOMEM",
			EACCES => "EACCES",
			EFAULT => "EFAULT",
			EBUSY => "EBUSY",
			EEXIST => "EEXIST",
			EXDEV => "EXDEV",
			ENODEV => "ENODEV",
			ENOTDIR => "ENOTDIR",
			EISDIR => "EISDIR",
			EINVAL => "EINVAL",
			ENFILE => "ENFILE",
			EMFILE => "EMFILE",
			ENOTTY => "ENOTTY",
			ETXTBSY => "ETXTBSY",
			EFBIG => "EFBIG",
			ENOSPC => "ENOSPC",
			ESPIPE => "ESPIPE",
			EROFS => "EROFS",
			EMLINK => "EMLINK",
			EPIPE => "EPIPE",
			ERANGE => "ERANGE",
			ENAMETOOLONG => "ENAMETOOLONG",
			ENOTEMPTY => "ENOTEMPTY",
			ELOOP => "ELOOP",
			ENODATA => "ENODATA",
			EOVERFLOW => "EOVERFLOW",
			EOPNOTSUPP => "EOPNOTSUPP",
			_ => return None,
		};
		Some(name)
	}

	/// Returns the strerror-style message associated with the errno.
	pub const fn strerror(self) -> &'static str {
		match self.0 {
			EPERM => "Operation not permitted",
			ENOENT => "No such file or directory",
			ESRCH => "No such process",
			EINTR => "Interrupted system call",
			EIO => "Input/output error",
			ENXIO => "No such device or address",
			E2BIG => "Argument list too long",
			ENOEXEC => "Exec format error",
			EBADF => "Bad file descriptor",
			ECHILD => "No child processes",
			EAGAIN => "Resource temporarily unavailable",
			ENOMEM => "Cannot allocate memory",
			EACCES => "Permission denied",
			EFAULT => "Bad address",
			EBUSY => "Device or resource busy",
			EEXIST => "File exists",
			EXDEV => "Invalid cross-device link",
			ENODEV => "No such device",
			ENOTDIR => "Not a directory",
			EISDIR => "Is a directory",
			EINVAL => "Invalid argument",
			ENFILE => "Too many open files in system",
			EMFILE => "Too many open files",
			ENOTTY => "Inappropriate ioctl for device",
			ETXTBSY => "Text file busy",
			EFBIG => "File too large",
			ENOSPC => "No space left on device",
			ESPIPE => "Illegal seek",
			EROFS => "Read-only file system",
			EMLINK => "Too many links",
			EPIPE => "Broken pipe",
			ERANGE => "Numerical result out of range",
			ENAMETOOLONG => "File name too long",
			ENOTEMPTY => "Directory not empty",
			ELOOP => "Too many levels of symbolic links",
			ENODATA => "No data available",
			EOVERFLOW => "Value too large for defined data type",
			EOPNOTSUPP => "Operation not supported",
			_ => "Unknown error",
		}
	}
}

impl fmt::Debug for Errno {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.name() {
			Some(name) => write!(f, "{name}"),
			None => write!(f, "Errno({})", self.0),
		}
	}
}

impl fmt::Display for Errno {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} (os error {})", self.strerror(), self.0)
	}
}

impl Error for Errno {}

impl From<std::io::Error> for Errno {
	/// The OS error code is kept verbatim when the host provides one.
	fn from(err: std::io::Error) -> Self {
		Self(err.raw_os_error().unwrap_or(EIO))
	}
}

#[cfg(test)]
mod test {
	#[test]
	fn errno_values() {
		assert_eq!(errno!(ENOENT).as_int(), 2);
		assert_eq!(errno!(EINVAL).as_int(), 22);
		assert_eq!(errno!(ELOOP).as_int(), 40);
		assert_eq!(errno!(EOPNOTSUPP).as_int(), 95);
	}

	#[test]
	fn errno_display() {
		assert_eq!(errno!(ENOENT).to_string(), "No such file or directory (os error 2)");
		assert_eq!(format!("{:?}", errno!(EACCES)), "EACCES");
	}
}
