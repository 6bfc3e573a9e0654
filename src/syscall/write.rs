//! The `write` system call family writes to an open file.

use crate::{errno, errno::EResult, file::INode, time, MemFS};
use std::ffi::c_int;

impl MemFS {
	/// Writes to the node at the given offset, updating `mtime` and `ctime`.
	fn do_write(&mut self, ino: INode, off: u64, buf: &[u8]) -> EResult<usize> {
		let node = self.nodes.get_mut(ino)?;
		node.regular_mut()?.write(off, buf)?;
		let ts = time::now();
		node.mtime = ts;
		node.ctime = ts;
		Ok(buf.len())
	}

	/// Checks that `fd` is open for writing and returns its node and write position.
	///
	/// With `O_APPEND`, the position is the current size of the file.
	fn write_fd(&self, fd: c_int) -> EResult<(INode, u64)> {
		let file = self.fds.get_fd(fd)?.get_file();
		if !file.can_write() {
			return Err(errno!(EBADF));
		}
		let ino = file.ino();
		let off = if file.is_append() {
			self.nodes.get(ino)?.size()
		} else {
			file.get_offset()
		};
		Ok((ino, off))
	}

	/// The `write` system call writes at the file descriptor's current position and
	/// advances it. With `O_APPEND`, the position is first moved to the end of the file.
	///
	/// On success, the function returns the number of bytes written.
	pub fn write(&mut self, fd: c_int, buf: &[u8]) -> EResult<usize> {
		let (ino, off) = self.write_fd(fd)?;
		let len = self.do_write(ino, off, buf)?;
		self.fds
			.get_fd_mut(fd)?
			.get_file_mut()
			.set_offset(off + len as u64);
		Ok(len)
	}

	/// The `pwrite` system call writes at the given offset, without touching the file
	/// descriptor's position.
	pub fn pwrite(&mut self, fd: c_int, buf: &[u8], offset: i64) -> EResult<usize> {
		if offset < 0 {
			return Err(errno!(EINVAL));
		}
		let file = self.fds.get_fd(fd)?.get_file();
		if !file.can_write() {
			return Err(errno!(EBADF));
		}
		let ino = file.ino();
		self.do_write(ino, offset as u64, buf)
	}

	/// The `writev` system call writes a vector of buffers at the file descriptor's
	/// current position and advances it.
	///
	/// The write is the concatenation of the buffers.
	pub fn writev(&mut self, fd: c_int, iov: &[&[u8]]) -> EResult<usize> {
		let (ino, off) = self.write_fd(fd)?;
		let len = self.do_writev(ino, off, iov)?;
		self.fds
			.get_fd_mut(fd)?
			.get_file_mut()
			.set_offset(off + len as u64);
		Ok(len)
	}

	/// The `pwritev` system call writes a vector of buffers at the given offset, without
	/// touching the file descriptor's position.
	pub fn pwritev(&mut self, fd: c_int, iov: &[&[u8]], offset: i64) -> EResult<usize> {
		if offset < 0 {
			return Err(errno!(EINVAL));
		}
		let file = self.fds.get_fd(fd)?.get_file();
		if !file.can_write() {
			return Err(errno!(EBADF));
		}
		let ino = file.ino();
		self.do_writev(ino, offset as u64, iov)
	}

	fn do_writev(&mut self, ino: INode, mut off: u64, iov: &[&[u8]]) -> EResult<usize> {
		if iov.len() > crate::limits::IOV_MAX {
			return Err(errno!(EINVAL));
		}
		let mut total = 0;
		for buf in iov {
			let len = self.do_write(ino, off, buf)?;
			total += len;
			off += len as u64;
		}
		Ok(total)
	}
}
