//! `*at` system calls allow to perform operations on files without having to redo the
//! whole path resolution each time.

use crate::{
	errno,
	errno::EResult,
	file::{path::Path, vfs, vfs::Resolved, INode},
	MemFS,
};
use std::ffi::c_int;

/// Special value to be used as file descriptor, telling to take the path relative to the
/// current working directory.
pub const AT_FDCWD: c_int = -100;

/// Flag: If pathname is a symbolic link, do not dereference it: instead return
/// information about the link itself.
pub const AT_SYMLINK_NOFOLLOW: c_int = 0x100;
/// Flag: Perform access checks using the effective user and group IDs.
pub const AT_EACCESS: c_int = 0x200;
/// Flag: If the entry is a directory, remove it instead of unlinking.
pub const AT_REMOVEDIR: c_int = 0x200;
/// Flag: If pathname is a symbolic link, dereference it.
pub const AT_SYMLINK_FOLLOW: c_int = 0x400;
/// Flag: If `pathname` is an empty string, operate on the file referred to by `dirfd`.
pub const AT_EMPTY_PATH: c_int = 0x1000;

impl MemFS {
	/// Returns the inode referred to by the file descriptor `dirfd`, or the current
	/// working directory for [`AT_FDCWD`].
	pub(crate) fn dirfd_inode(&self, dirfd: c_int) -> EResult<INode> {
		if dirfd == AT_FDCWD {
			Ok(self.cwd)
		} else {
			Ok(self.fds.get_fd(dirfd)?.get_file().ino())
		}
	}

	/// Resolves the file for the given path `path`, relative to `dirfd`.
	///
	/// Arguments:
	/// - `dirfd` is the file descriptor of the starting directory
	/// - `path` is the path relative to the starting directory
	/// - `flags` is the set of `AT_*` flags
	/// - `create`: if `true`, the function might return [`Resolved::Creatable`] if the
	///   file does not exist
	/// - `follow_link`: if `true`, symbolic links are followed (unless bypassed by a flag)
	pub(crate) fn resolve_at<'p>(
		&self,
		dirfd: c_int,
		path: &'p Path,
		flags: c_int,
		create: bool,
		follow_link: bool,
	) -> EResult<Resolved<'p>> {
		let mut rs = self.resolution_settings(create, follow_link);
		// If not starting from the current working directory, get the start inode
		if dirfd != AT_FDCWD {
			rs.cwd = self.fds.get_fd(dirfd)?.get_file().ino();
		}
		if path.is_empty() {
			// Validation
			if flags & AT_EMPTY_PATH == 0 {
				return Err(errno!(ENOENT));
			}
			self.nodes.get(rs.cwd)?;
			return Ok(Resolved::Found(rs.cwd));
		}
		rs.follow_link = if rs.follow_link {
			flags & AT_SYMLINK_NOFOLLOW == 0
		} else {
			flags & AT_SYMLINK_FOLLOW != 0
		};
		vfs::resolve_path(&self.nodes, path, &rs)
	}

	/// Resolves the parent directory of the path's last component, relative to `dirfd`.
	///
	/// Symbolic links are followed on every component of the parent path. On success, the
	/// function returns the inode of the parent directory together with the name of the
	/// last component.
	///
	/// If the path has no last component (it is the root), the function returns
	/// [`errno::EBUSY`]; if it is empty, [`errno::ENOENT`].
	pub(crate) fn resolve_parent_at<'p>(
		&self,
		dirfd: c_int,
		path: &'p Path,
	) -> EResult<(INode, &'p [u8])> {
		if path.is_empty() {
			return Err(errno!(ENOENT));
		}
		let name = path.file_name().ok_or_else(|| errno!(EBUSY))?;
		// Cannot fail: the path has a last component
		let parent_path = path.parent().unwrap();
		let parent = if parent_path.is_empty() {
			self.dirfd_inode(dirfd)?
		} else {
			match self.resolve_at(dirfd, parent_path, 0, false, true)? {
				Resolved::Found(ino) => ino,
				// `create` is unset
				Resolved::Creatable {
					..
				} => unreachable!(),
			}
		};
		self.nodes.get(parent)?.dir()?;
		Ok((parent, name))
	}
}
