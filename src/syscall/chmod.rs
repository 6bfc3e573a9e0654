//! The `chmod` system call family changes the permissions of a file.

use super::util::at::{AT_FDCWD, AT_SYMLINK_NOFOLLOW};
use crate::{
	errno,
	errno::EResult,
	file::{path::PathBuf, vfs::Resolved, INode, Mode, S_IFMT},
	time, MemFS,
};
use std::ffi::c_int;

impl MemFS {
	fn do_chmod(&mut self, ino: INode, mode: Mode) -> EResult<()> {
		let node = self.nodes.get_mut(ino)?;
		if !self.ap.can_set_file_permissions(&node.stat()) {
			return Err(errno!(EPERM));
		}
		node.mode = (node.mode & S_IFMT) | (mode & 0o7777);
		node.ctime = time::now();
		Ok(())
	}

	/// The `fchmodat` syscall changes the permissions of the file at the given path,
	/// relative to `dirfd`.
	///
	/// Changing the mode of a symbolic link itself is not supported:
	/// [`AT_SYMLINK_NOFOLLOW`] yields [`errno::EOPNOTSUPP`].
	pub fn fchmodat<P: AsRef<[u8]>>(
		&mut self,
		dirfd: c_int,
		path: P,
		mode: Mode,
		flags: c_int,
	) -> EResult<()> {
		if flags & AT_SYMLINK_NOFOLLOW != 0 {
			return Err(errno!(EOPNOTSUPP));
		}
		if flags & !AT_SYMLINK_NOFOLLOW != 0 {
			return Err(errno!(EINVAL));
		}
		let path = PathBuf::try_from(path.as_ref())?;
		let Resolved::Found(ino) = self.resolve_at(dirfd, &path, 0, false, true)? else {
			return Err(errno!(ENOENT));
		};
		self.do_chmod(ino, mode)
	}

	/// The `chmod` syscall changes the permissions of the file at the given path,
	/// relative to the current working directory.
	pub fn chmod<P: AsRef<[u8]>>(&mut self, path: P, mode: Mode) -> EResult<()> {
		self.fchmodat(AT_FDCWD, path, mode, 0)
	}

	/// The `fchmod` syscall changes the permissions of the file behind the given file
	/// descriptor.
	pub fn fchmod(&mut self, fd: c_int, mode: Mode) -> EResult<()> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		self.do_chmod(ino, mode)
	}
}
