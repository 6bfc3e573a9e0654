//! The `read` system call family reads the content of an open file.

use crate::{errno, errno::EResult, file::INode, time, MemFS};
use std::ffi::c_int;

impl MemFS {
	/// Reads from the node at the given offset, updating `atime` if requested.
	fn do_read(
		&mut self,
		ino: INode,
		off: u64,
		buf: &mut [u8],
		update_atime: bool,
	) -> EResult<usize> {
		let node = self.nodes.get_mut(ino)?;
		let len = node.regular()?.read(off, buf);
		if update_atime {
			node.atime = time::now();
		}
		Ok(len)
	}

	/// Checks that `fd` is open for reading and returns its node and offset.
	fn read_fd(&self, fd: c_int) -> EResult<(INode, u64, bool)> {
		let file = self.fds.get_fd(fd)?.get_file();
		if !file.can_read() {
			return Err(errno!(EBADF));
		}
		Ok((file.ino(), file.get_offset(), file.is_atime_updated()))
	}

	/// The `read` system call reads from the file descriptor's current position and
	/// advances it.
	///
	/// On success, the function returns the number of bytes read, shortened at the end of
	/// the file.
	pub fn read(&mut self, fd: c_int, buf: &mut [u8]) -> EResult<usize> {
		let (ino, off, atime) = self.read_fd(fd)?;
		let len = self.do_read(ino, off, buf, atime)?;
		self.fds
			.get_fd_mut(fd)?
			.get_file_mut()
			.set_offset(off + len as u64);
		Ok(len)
	}

	/// The `pread` system call reads at the given offset, without touching the file
	/// descriptor's position.
	pub fn pread(&mut self, fd: c_int, buf: &mut [u8], offset: i64) -> EResult<usize> {
		if offset < 0 {
			return Err(errno!(EINVAL));
		}
		let (ino, _, atime) = self.read_fd(fd)?;
		self.do_read(ino, offset as u64, buf, atime)
	}

	/// The `readv` system call reads into a vector of buffers, advancing the file
	/// descriptor's position.
	///
	/// The result is the concatenation of the reads, shortened at the end of the file.
	pub fn readv(&mut self, fd: c_int, iov: &mut [&mut [u8]]) -> EResult<usize> {
		let (ino, off, atime) = self.read_fd(fd)?;
		let len = self.do_readv(ino, off, iov, atime)?;
		self.fds
			.get_fd_mut(fd)?
			.get_file_mut()
			.set_offset(off + len as u64);
		Ok(len)
	}

	/// The `preadv` system call reads into a vector of buffers at the given offset,
	/// without touching the file descriptor's position.
	pub fn preadv(&mut self, fd: c_int, iov: &mut [&mut [u8]], offset: i64) -> EResult<usize> {
		if offset < 0 {
			return Err(errno!(EINVAL));
		}
		let (ino, _, atime) = self.read_fd(fd)?;
		self.do_readv(ino, offset as u64, iov, atime)
	}

	fn do_readv(
		&mut self,
		ino: INode,
		mut off: u64,
		iov: &mut [&mut [u8]],
		update_atime: bool,
	) -> EResult<usize> {
		if iov.len() > crate::limits::IOV_MAX {
			return Err(errno!(EINVAL));
		}
		let mut total = 0;
		for buf in iov {
			let len = self.do_read(ino, off, buf, update_atime)?;
			total += len;
			off += len as u64;
			// Short read: the end of the file was reached
			if len < buf.len() {
				break;
			}
		}
		Ok(total)
	}
}
