//! The `open` system call family allows to open a file and get a file descriptor.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{
		content::Regular,
		node::FileContent,
		open_file::{
			OpenFile, O_ACCMODE, O_CREAT, O_DIRECTORY, O_EXCL, O_NOFOLLOW, O_RDONLY, O_TMPFILE,
			O_TRUNC, O_WRONLY,
		},
		path::{Path, PathBuf},
		perm::AccessProfile,
		vfs,
		vfs::Resolved,
		FileType, INode, Mode, Stat,
	},
	time, MemFS,
};
use std::ffi::c_int;

/// Checks the given open flags against the target file.
///
/// Arguments:
/// - `stat` is the status of the file
/// - `flags` is the set of open flags
/// - `ap` is the access profile to check permissions
fn check_perms(stat: &Stat, flags: c_int, ap: &AccessProfile) -> EResult<()> {
	let (read, write) = match flags & O_ACCMODE {
		O_RDONLY => (true, false),
		O_WRONLY => (false, true),
		_ => (true, true),
	};
	// Check access
	if read && !ap.can_read_file(stat) {
		return Err(errno!(EACCES));
	}
	if write && !ap.can_write_file(stat) {
		return Err(errno!(EACCES));
	}
	let is_dir = stat.get_type() == Some(FileType::Directory);
	// If O_DIRECTORY is set and the file is not a directory, return an error
	if flags & O_DIRECTORY != 0 && !is_dir {
		return Err(errno!(ENOTDIR));
	}
	// A directory cannot be opened for writing
	if write && is_dir {
		return Err(errno!(EISDIR));
	}
	Ok(())
}

impl MemFS {
	/// The `openat` syscall allows to open a file.
	///
	/// Arguments:
	/// - `dirfd` is the file descriptor of the directory from which the file is searched
	/// - `path` is the path of the file, relative to `dirfd`
	/// - `flags` is a set of open flags
	/// - `mode` is the set of permissions to use if the file needs to be created
	///
	/// On success, the function returns the new file descriptor.
	pub fn openat<P: AsRef<[u8]>>(
		&mut self,
		dirfd: c_int,
		path: P,
		flags: c_int,
		mode: Mode,
	) -> EResult<c_int> {
		let path = PathBuf::try_from(path.as_ref())?;
		if flags & O_ACCMODE == O_ACCMODE {
			return Err(errno!(EINVAL));
		}
		// Anonymous files take a dedicated path
		if flags & O_TMPFILE == O_TMPFILE {
			return self.open_tmpfile(dirfd, &path, flags, mode);
		}
		let create = flags & O_CREAT != 0;
		let follow_link = flags & O_NOFOLLOW == 0;
		let resolved = self.resolve_at(dirfd, &path, 0, create, follow_link)?;
		let ino = match resolved {
			Resolved::Found(ino) => {
				if create && flags & O_EXCL != 0 {
					return Err(errno!(EEXIST));
				}
				// Cannot open a symbolic link itself
				if self.nodes.get(ino)?.get_type() == FileType::Link {
					return Err(errno!(ELOOP));
				}
				ino
			}
			Resolved::Creatable {
				parent,
				name,
			} => {
				let mode = FileType::Regular.to_mode() | (mode & !self.umask & 0o7777);
				vfs::create_file(
					&mut self.nodes,
					parent,
					name,
					&self.ap,
					mode,
					FileContent::Regular(Regular::default()),
				)?
			}
		};
		check_perms(&self.nodes.get(ino)?.stat(), flags, &self.ap)?;
		// Truncate the file if necessary
		if flags & O_TRUNC != 0 && flags & O_ACCMODE != O_RDONLY {
			let node = self.nodes.get_mut(ino)?;
			if let FileContent::Regular(content) = &mut node.content {
				content.truncate(0);
				let ts = time::now();
				node.mtime = ts;
				node.ctime = ts;
			}
		}
		self.open_node(ino, flags)
	}

	/// Creates an anonymous file in the directory at `path` (`O_TMPFILE`).
	///
	/// The new node has no directory entry: it lives only as long as its open file
	/// description and cannot be linked afterwards.
	fn open_tmpfile(
		&mut self,
		dirfd: c_int,
		path: &Path,
		flags: c_int,
		mode: Mode,
	) -> EResult<c_int> {
		// The file must be writable
		if flags & O_ACCMODE == O_RDONLY {
			return Err(errno!(EINVAL));
		}
		let Resolved::Found(dir) = self.resolve_at(dirfd, path, 0, false, true)? else {
			return Err(errno!(ENOENT));
		};
		let dir_node = self.nodes.get(dir)?;
		dir_node.dir()?;
		if !self.ap.can_write_directory(&dir_node.stat()) {
			return Err(errno!(EACCES));
		}
		let mode = FileType::Regular.to_mode() | (mode & !self.umask & 0o7777);
		let ino = self.nodes.alloc(
			mode,
			self.ap.uid,
			self.ap.gid,
			FileContent::Regular(Regular::default()),
		);
		self.open_node(ino, flags)
	}

	/// Allocates an open file description and a file descriptor for the given node.
	pub(crate) fn open_node(&mut self, ino: INode, flags: c_int) -> EResult<c_int> {
		let fd = self.fds.create_fd(0, OpenFile::new(ino, flags))?;
		// Cannot fail: the node was just resolved
		if let Ok(node) = self.nodes.get_mut(ino) {
			node.open += 1;
		}
		Ok(fd)
	}

	/// The `open` system call allows a process to open a file and get a file descriptor.
	pub fn open<P: AsRef<[u8]>>(&mut self, path: P, flags: c_int, mode: Mode) -> EResult<c_int> {
		self.openat(AT_FDCWD, path, flags, mode)
	}

	/// The `creat` system call allows a process to create and open a file.
	pub fn creat<P: AsRef<[u8]>>(&mut self, path: P, mode: Mode) -> EResult<c_int> {
		self.open(path, O_CREAT | O_WRONLY | O_TRUNC, mode)
	}
}
