//! The `chdir` system call family manages the current working directory.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{path::PathBuf, vfs, vfs::Resolved, INode},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	fn do_chdir(&mut self, ino: INode) -> EResult<()> {
		let node = self.nodes.get(ino)?;
		node.dir()?;
		// Search permission is required to enter a directory
		if !self.ap.can_search_directory(&node.stat()) {
			return Err(errno!(EACCES));
		}
		self.cwd = ino;
		Ok(())
	}

	/// The `chdir` syscall changes the current working directory of the instance.
	pub fn chdir<P: AsRef<[u8]>>(&mut self, path: P) -> EResult<()> {
		let path = PathBuf::try_from(path.as_ref())?;
		let Resolved::Found(ino) = self.resolve_at(AT_FDCWD, &path, 0, false, true)? else {
			return Err(errno!(ENOENT));
		};
		self.do_chdir(ino)
	}

	/// The `fchdir` syscall changes the current working directory to the directory behind
	/// the given file descriptor.
	pub fn fchdir(&mut self, fd: c_int) -> EResult<()> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		self.do_chdir(ino)
	}

	/// The `getcwd` syscall returns the absolute path of the current working directory.
	///
	/// If the directory was removed, the function returns [`errno::ENOENT`].
	pub fn getcwd(&self) -> EResult<PathBuf> {
		vfs::get_path(&self.nodes, self.cwd)
	}
}
