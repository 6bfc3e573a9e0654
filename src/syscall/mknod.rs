//! The `mknod` system call allows to create a new node on a filesystem.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{
		content::Regular,
		node::{Entries, FileContent},
		path::PathBuf,
		vfs,
		vfs::Resolved,
		FileType, Mode, S_IFDIR, S_IFMT, S_IFREG,
	},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `mknodat` syscall creates a node at the given path, relative to `dirfd`.
	///
	/// Only regular files and directories can be created this way; requesting any other
	/// type fails with [`errno::EPERM`]. `dev` is ignored for the supported types.
	pub fn mknodat<P: AsRef<[u8]>>(
		&mut self,
		dirfd: c_int,
		path: P,
		mode: Mode,
		_dev: u64,
	) -> EResult<()> {
		let path = PathBuf::try_from(path.as_ref())?;
		let file_type = match mode & S_IFMT {
			// An empty type designates a regular file
			S_IFREG | 0 => FileType::Regular,
			S_IFDIR => FileType::Directory,
			_ => return Err(errno!(EPERM)),
		};
		let resolved = self.resolve_at(dirfd, &path, 0, true, false)?;
		match resolved {
			Resolved::Found(_) => Err(errno!(EEXIST)),
			Resolved::Creatable {
				parent,
				name,
			} => {
				let content = match file_type {
					FileType::Directory => FileContent::Directory(Entries::new(parent)),
					_ => FileContent::Regular(Regular::default()),
				};
				let mode = file_type.to_mode() | (mode & !self.umask & 0o7777);
				vfs::create_file(&mut self.nodes, parent, name, &self.ap, mode, content)?;
				Ok(())
			}
		}
	}

	/// The `mknod` syscall creates a node at the given path, relative to the current
	/// working directory.
	pub fn mknod<P: AsRef<[u8]>>(&mut self, path: P, mode: Mode, dev: u64) -> EResult<()> {
		self.mknodat(AT_FDCWD, path, mode, dev)
	}
}
