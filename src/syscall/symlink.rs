//! The `symlink` syscall allows to create a symbolic link.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{node::FileContent, path::PathBuf, vfs, vfs::Resolved, FileType},
	limits::SYMLINK_MAX,
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `symlinkat` syscall creates a symbolic link at `linkpath` (relative to
	/// `newdirfd`) holding `target` verbatim.
	///
	/// The target is not interpreted at creation; it must be 1 to [`SYMLINK_MAX`] bytes
	/// long.
	pub fn symlinkat<T: AsRef<[u8]>, P: AsRef<[u8]>>(
		&mut self,
		target: T,
		newdirfd: c_int,
		linkpath: P,
	) -> EResult<()> {
		let target = target.as_ref();
		if target.is_empty() {
			return Err(errno!(ENOENT));
		}
		if target.len() > SYMLINK_MAX {
			return Err(errno!(ENAMETOOLONG));
		}
		let linkpath = PathBuf::try_from(linkpath.as_ref())?;
		// The link itself is never followed
		let resolved = self.resolve_at(newdirfd, &linkpath, 0, true, false)?;
		match resolved {
			Resolved::Found(_) => Err(errno!(EEXIST)),
			Resolved::Creatable {
				parent,
				name,
			} => {
				vfs::create_file(
					&mut self.nodes,
					parent,
					name,
					&self.ap,
					FileType::Link.to_mode() | 0o777,
					FileContent::Link(target.to_vec()),
				)?;
				Ok(())
			}
		}
	}

	/// The `symlink` syscall creates a symbolic link at `linkpath`, relative to the
	/// current working directory.
	pub fn symlink<T: AsRef<[u8]>, P: AsRef<[u8]>>(&mut self, target: T, linkpath: P) -> EResult<()> {
		self.symlinkat(target, AT_FDCWD, linkpath)
	}
}
