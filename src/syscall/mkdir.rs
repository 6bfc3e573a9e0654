//! The `mkdir` system call allows to create a directory.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{
		node::{Entries, FileContent},
		path::PathBuf,
		vfs,
		vfs::Resolved,
		FileType, Mode,
	},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `mkdirat` syscall creates a directory at the given path, relative to `dirfd`.
	///
	/// `mode` is masked against the instance's umask.
	pub fn mkdirat<P: AsRef<[u8]>>(&mut self, dirfd: c_int, path: P, mode: Mode) -> EResult<()> {
		let path = PathBuf::try_from(path.as_ref())?;
		// A trailing symbolic link is not followed: it is reported as existing
		let resolved = self.resolve_at(dirfd, &path, 0, true, false)?;
		match resolved {
			Resolved::Found(_) => Err(errno!(EEXIST)),
			Resolved::Creatable {
				parent,
				name,
			} => {
				let mode = FileType::Directory.to_mode() | (mode & !self.umask & 0o7777);
				vfs::create_file(
					&mut self.nodes,
					parent,
					name,
					&self.ap,
					mode,
					FileContent::Directory(Entries::new(parent)),
				)?;
				Ok(())
			}
		}
	}

	/// The `mkdir` syscall creates a directory at the given path, relative to the current
	/// working directory.
	pub fn mkdir<P: AsRef<[u8]>>(&mut self, path: P, mode: Mode) -> EResult<()> {
		self.mkdirat(AT_FDCWD, path, mode)
	}
}
