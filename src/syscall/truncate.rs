//! The `truncate` system call family changes the size of a file.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{node::FileContent, path::PathBuf, vfs::Resolved, INode},
	limits::MAX_FILE_SIZE,
	time, MemFS,
};
use std::ffi::c_int;

impl MemFS {
	fn do_truncate(&mut self, ino: INode, length: u64) -> EResult<()> {
		let node = self.nodes.get_mut(ino)?;
		match &mut node.content {
			FileContent::Regular(content) => content.truncate(length),
			FileContent::Directory(_) => return Err(errno!(EISDIR)),
			FileContent::Link(_) => return Err(errno!(EINVAL)),
		}
		let ts = time::now();
		node.mtime = ts;
		node.ctime = ts;
		Ok(())
	}

	/// The `truncate` syscall truncates or extends the file at the given path to the
	/// given length. Extension leaves a hole.
	pub fn truncate<P: AsRef<[u8]>>(&mut self, path: P, length: i64) -> EResult<()> {
		if length < 0 {
			return Err(errno!(EINVAL));
		}
		if length as u64 > MAX_FILE_SIZE {
			return Err(errno!(EFBIG));
		}
		let path = PathBuf::try_from(path.as_ref())?;
		let Resolved::Found(ino) = self.resolve_at(AT_FDCWD, &path, 0, false, true)? else {
			return Err(errno!(ENOENT));
		};
		// Write permission is required on the file itself
		let node = self.nodes.get(ino)?;
		if !self.ap.can_write_file(&node.stat()) {
			return Err(errno!(EACCES));
		}
		self.do_truncate(ino, length as u64)
	}

	/// The `ftruncate` syscall truncates or extends the file behind the given file
	/// descriptor, which must be open for writing.
	pub fn ftruncate(&mut self, fd: c_int, length: i64) -> EResult<()> {
		if length < 0 {
			return Err(errno!(EINVAL));
		}
		if length as u64 > MAX_FILE_SIZE {
			return Err(errno!(EFBIG));
		}
		let file = self.fds.get_fd(fd)?.get_file();
		if !file.can_write() {
			return Err(errno!(EBADF));
		}
		let ino = file.ino();
		self.do_truncate(ino, length as u64)
	}
}
