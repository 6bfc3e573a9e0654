//! The `fsync` system call family synchronizes the state of a file to the storage
//! device.
//!
//! The whole filesystem lives in memory, so after validating the descriptor there is
//! nothing to write back.

use crate::{errno::EResult, MemFS};
use std::ffi::c_int;

impl MemFS {
	/// The `fsync` syscall synchronizes the file behind the given file descriptor.
	pub fn fsync(&self, fd: c_int) -> EResult<()> {
		self.fds.get_fd(fd)?;
		Ok(())
	}

	/// The `fdatasync` syscall synchronizes the data of the file behind the given file
	/// descriptor.
	pub fn fdatasync(&self, fd: c_int) -> EResult<()> {
		self.fds.get_fd(fd)?;
		Ok(())
	}
}
