//! The `lseek` system call repositions the offset of a file descriptor.

use crate::{errno, errno::EResult, MemFS};
use std::ffi::c_int;

/// Sets the offset from the given value.
pub const SEEK_SET: c_int = 0;
/// Sets the offset relative to the current offset.
pub const SEEK_CUR: c_int = 1;
/// Sets the offset relative to the end of the file.
pub const SEEK_END: c_int = 2;
/// Sets the offset to the next data region at or after the given value.
pub const SEEK_DATA: c_int = 3;
/// Sets the offset to the next hole at or after the given value.
pub const SEEK_HOLE: c_int = 4;

impl MemFS {
	/// The `lseek` system call repositions the offset of the file descriptor `fd`.
	///
	/// On success, the function returns the new offset.
	pub fn lseek(&mut self, fd: c_int, offset: i64, whence: c_int) -> EResult<i64> {
		let file = self.fds.get_fd(fd)?.get_file();
		let ino = file.ino();
		let cur = file.get_offset();
		let node = self.nodes.get(ino)?;
		// Compute the new offset
		let off = match whence {
			SEEK_SET => offset,
			SEEK_CUR => (cur as i64)
				.checked_add(offset)
				.ok_or_else(|| errno!(EOVERFLOW))?,
			SEEK_END => (node.size() as i64)
				.checked_add(offset)
				.ok_or_else(|| errno!(EOVERFLOW))?,
			SEEK_DATA | SEEK_HOLE => {
				let content = node.regular()?;
				if offset < 0 {
					return Err(errno!(ENXIO));
				}
				let off = offset as u64;
				if whence == SEEK_DATA {
					if off >= content.size() {
						return Err(errno!(ENXIO));
					}
					content.seek_data(off) as i64
				} else {
					if off > content.size() {
						return Err(errno!(ENXIO));
					}
					content.seek_hole(off) as i64
				}
			}
			_ => return Err(errno!(EINVAL)),
		};
		if off < 0 {
			return Err(errno!(EINVAL));
		}
		self.fds
			.get_fd_mut(fd)?
			.get_file_mut()
			.set_offset(off as u64);
		Ok(off)
	}
}
