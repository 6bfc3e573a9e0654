//! The `stat` system call family returns the status of a file.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{path::PathBuf, vfs::Resolved, Stat},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	fn do_stat(&self, path: &[u8], follow_link: bool) -> EResult<Stat> {
		let path = PathBuf::try_from(path)?;
		let Resolved::Found(ino) = self.resolve_at(AT_FDCWD, &path, 0, false, follow_link)?
		else {
			return Err(errno!(ENOENT));
		};
		Ok(self.nodes.get(ino)?.stat())
	}

	/// The `stat` system call returns the status of the file at the given path, following
	/// symbolic links.
	pub fn stat<P: AsRef<[u8]>>(&self, path: P) -> EResult<Stat> {
		self.do_stat(path.as_ref(), true)
	}

	/// The `lstat` system call returns the status of the file at the given path. If the
	/// path points to a symbolic link, the status of the link itself is returned.
	pub fn lstat<P: AsRef<[u8]>>(&self, path: P) -> EResult<Stat> {
		self.do_stat(path.as_ref(), false)
	}

	/// The `fstat` system call returns the status of the file behind the given file
	/// descriptor.
	pub fn fstat(&self, fd: c_int) -> EResult<Stat> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		Ok(self.nodes.get(ino)?.stat())
	}
}
