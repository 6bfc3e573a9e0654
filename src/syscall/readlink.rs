//! The `readlink` syscall allows to read the target of a symbolic link.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{node::FileContent, path::PathBuf, vfs::Resolved},
	time, MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `readlinkat` syscall reads the target of the symbolic link at the given path,
	/// relative to `dirfd`.
	///
	/// If the file is not a symbolic link, the function returns [`errno::EINVAL`].
	pub fn readlinkat<P: AsRef<[u8]>>(&mut self, dirfd: c_int, path: P) -> EResult<Vec<u8>> {
		let path = PathBuf::try_from(path.as_ref())?;
		// The trailing link is the operand itself
		let Resolved::Found(ino) = self.resolve_at(dirfd, &path, 0, false, false)? else {
			return Err(errno!(ENOENT));
		};
		let node = self.nodes.get_mut(ino)?;
		let FileContent::Link(target) = &node.content else {
			return Err(errno!(EINVAL));
		};
		let target = target.clone();
		node.atime = time::now();
		Ok(target)
	}

	/// The `readlink` syscall reads the target of the symbolic link at the given path,
	/// relative to the current working directory.
	pub fn readlink<P: AsRef<[u8]>>(&mut self, path: P) -> EResult<Vec<u8>> {
		self.readlinkat(AT_FDCWD, path)
	}
}
