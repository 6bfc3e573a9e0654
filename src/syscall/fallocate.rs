//! The `fallocate` system call manipulates the allocated space of a file.

use crate::{errno, errno::EResult, time, MemFS};
use std::ffi::c_int;

/// Flag: The size of the file is not changed by the operation.
pub const FALLOC_FL_KEEP_SIZE: c_int = 0x01;
/// Flag: Deallocate the range, turning it into a hole. Must be combined with
/// [`FALLOC_FL_KEEP_SIZE`].
pub const FALLOC_FL_PUNCH_HOLE: c_int = 0x02;
/// Flag: Remove the range and shift the following content left.
pub const FALLOC_FL_COLLAPSE_RANGE: c_int = 0x08;
/// Flag: Zero the range.
pub const FALLOC_FL_ZERO_RANGE: c_int = 0x10;
/// Flag: Insert a hole at the given offset, shifting the following content right.
pub const FALLOC_FL_INSERT_RANGE: c_int = 0x20;

/// Mask of every supported mode bit.
const SUPPORTED: c_int = FALLOC_FL_KEEP_SIZE
	| FALLOC_FL_PUNCH_HOLE
	| FALLOC_FL_COLLAPSE_RANGE
	| FALLOC_FL_ZERO_RANGE
	| FALLOC_FL_INSERT_RANGE;

impl MemFS {
	/// The `fallocate` syscall manipulates the space allocated to the file behind the
	/// file descriptor `fd`, which must be open for writing.
	///
	/// `mode` selects the operation. The offset and length unit is the byte: no further
	/// alignment is required of `COLLAPSE_RANGE`/`INSERT_RANGE` operands.
	pub fn fallocate(&mut self, fd: c_int, mode: c_int, offset: i64, len: i64) -> EResult<()> {
		if mode & !SUPPORTED != 0 {
			return Err(errno!(EOPNOTSUPP));
		}
		if offset < 0 || len <= 0 {
			return Err(errno!(EINVAL));
		}
		let (off, len) = (offset as u64, len as u64);
		let file = self.fds.get_fd(fd)?.get_file();
		if !file.can_write() {
			return Err(errno!(EBADF));
		}
		let ino = file.ino();
		let node = self.nodes.get_mut(ino)?;
		let content = node.regular_mut()?;
		let keep_size = mode & FALLOC_FL_KEEP_SIZE != 0;
		match mode & !FALLOC_FL_KEEP_SIZE {
			0 => content.allocate(off, len, keep_size)?,
			FALLOC_FL_PUNCH_HOLE if keep_size => content.punch_hole(off, len),
			FALLOC_FL_ZERO_RANGE => content.zero_range(off, len, keep_size)?,
			FALLOC_FL_COLLAPSE_RANGE if !keep_size => {
				// The collapsed range must lie strictly inside the file
				if off.checked_add(len).filter(|end| *end < content.size()).is_none() {
					return Err(errno!(EINVAL));
				}
				content.collapse(off, len);
			}
			FALLOC_FL_INSERT_RANGE if !keep_size => {
				// The insertion point must be strictly inside the file
				if off >= content.size() {
					return Err(errno!(EINVAL));
				}
				content.insert(off, len)?;
			}
			_ => return Err(errno!(EINVAL)),
		}
		let ts = time::now();
		node.mtime = ts;
		node.ctime = ts;
		Ok(())
	}
}
