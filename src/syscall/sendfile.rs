//! The `sendfile` system call copies data between two open files.

use crate::{errno, errno::EResult, MemFS};
use std::ffi::c_int;

impl MemFS {
	/// The `sendfile` syscall copies up to `count` bytes from `in_fd` into `out_fd`.
	///
	/// If `offset` is `Some`, the copy reads from the given offset, updates it past the
	/// bytes copied, and leaves the input position untouched; otherwise the input
	/// position is used and advanced. The output position always advances (or the file
	/// is appended to with `O_APPEND`).
	///
	/// Both descriptors must refer to regular files ([`errno::EINVAL`]); `in_fd` must be
	/// readable and `out_fd` writable ([`errno::EBADF`]).
	pub fn sendfile(
		&mut self,
		out_fd: c_int,
		in_fd: c_int,
		offset: Option<&mut i64>,
		count: usize,
	) -> EResult<usize> {
		let in_file = self.fds.get_fd(in_fd)?.get_file();
		if !in_file.can_read() {
			return Err(errno!(EBADF));
		}
		let in_ino = in_file.ino();
		let in_pos = in_file.get_offset();
		let out_file = self.fds.get_fd(out_fd)?.get_file();
		if !out_file.can_write() {
			return Err(errno!(EBADF));
		}
		// Both ends must be regular files
		let read_pos = match &offset {
			Some(off) => {
				if **off < 0 {
					return Err(errno!(EINVAL));
				}
				**off as u64
			}
			None => in_pos,
		};
		let content = self
			.nodes
			.get(in_ino)?
			.regular()
			.map_err(|_| errno!(EINVAL))?;
		// Clamp the copy to what the input actually holds
		let len = core::cmp::min(count as u64, content.size().saturating_sub(read_pos)) as usize;
		let mut buf = vec![0u8; len];
		let len = content.read(read_pos, &mut buf);
		buf.truncate(len);
		// Check the output before touching any position
		{
			let out_ino = self.fds.get_fd(out_fd)?.get_file().ino();
			self.nodes
				.get(out_ino)?
				.regular()
				.map_err(|_| errno!(EINVAL))?;
		}
		let written = self.write(out_fd, &buf)?;
		// Advance the input side
		match offset {
			Some(off) => *off += written as i64,
			None => {
				self.fds
					.get_fd_mut(in_fd)?
					.get_file_mut()
					.set_offset(in_pos + written as u64);
			}
		}
		// Update the input access time
		let update_atime = self.fds.get_fd(in_fd)?.get_file().is_atime_updated();
		if update_atime {
			self.nodes.get_mut(in_ino)?.atime = crate::time::now();
		}
		Ok(written)
	}
}
