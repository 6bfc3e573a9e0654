//! The `link` system call allows to create a hard link.

use super::util::at::{AT_EMPTY_PATH, AT_FDCWD, AT_SYMLINK_FOLLOW};
use crate::{
	errno,
	errno::EResult,
	file::{path::PathBuf, vfs, vfs::Resolved},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `linkat` syscall creates a new hard link at `newpath` (relative to `newdirfd`)
	/// to the file at `oldpath` (relative to `olddirfd`).
	///
	/// By default a trailing symbolic link in `oldpath` is not dereferenced;
	/// [`AT_SYMLINK_FOLLOW`] reverses this. Directories cannot be hard linked
	/// ([`errno::EPERM`]).
	pub fn linkat<P: AsRef<[u8]>, Q: AsRef<[u8]>>(
		&mut self,
		olddirfd: c_int,
		oldpath: P,
		newdirfd: c_int,
		newpath: Q,
		flags: c_int,
	) -> EResult<()> {
		if flags & !(AT_SYMLINK_FOLLOW | AT_EMPTY_PATH) != 0 {
			return Err(errno!(EINVAL));
		}
		let oldpath = PathBuf::try_from(oldpath.as_ref())?;
		let Resolved::Found(target) = self.resolve_at(olddirfd, &oldpath, flags, false, false)?
		else {
			return Err(errno!(ENOENT));
		};
		let newpath = PathBuf::try_from(newpath.as_ref())?;
		let (parent, name) = self.resolve_parent_at(newdirfd, &newpath)?;
		vfs::link(&mut self.nodes, parent, name, target, &self.ap)
	}

	/// The `link` syscall creates a new hard link at `newpath` to the file at `oldpath`,
	/// both relative to the current working directory.
	pub fn link<P: AsRef<[u8]>, Q: AsRef<[u8]>>(&mut self, oldpath: P, newpath: Q) -> EResult<()> {
		self.linkat(AT_FDCWD, oldpath, AT_FDCWD, newpath, 0)
	}
}
