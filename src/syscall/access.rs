//! The `access` system call family checks the accessibility of a file.

use super::util::at::{AT_EACCESS, AT_FDCWD, AT_SYMLINK_NOFOLLOW};
use crate::{
	errno,
	errno::EResult,
	file::{
		path::PathBuf,
		perm::{R_OK, W_OK, X_OK},
		vfs::Resolved,
	},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `faccessat2` syscall checks whether the file at the given path can be accessed
	/// with the given mode.
	///
	/// `amode` is a combination of [`R_OK`], [`W_OK`] and [`X_OK`], or
	/// [`crate::file::perm::F_OK`] to check for mere existence. Since an instance models
	/// a single identity, [`AT_EACCESS`] is accepted but changes nothing.
	pub fn faccessat2<P: AsRef<[u8]>>(
		&self,
		dirfd: c_int,
		path: P,
		amode: c_int,
		flags: c_int,
	) -> EResult<()> {
		if amode & !(R_OK | W_OK | X_OK) != 0 {
			return Err(errno!(EINVAL));
		}
		if flags & !(AT_EACCESS | AT_SYMLINK_NOFOLLOW) != 0 {
			return Err(errno!(EINVAL));
		}
		let path = PathBuf::try_from(path.as_ref())?;
		let Resolved::Found(ino) = self.resolve_at(dirfd, &path, flags, false, true)? else {
			return Err(errno!(ENOENT));
		};
		// F_OK: resolution succeeded, nothing else to check
		let stat = self.nodes.get(ino)?.stat();
		if amode & R_OK != 0 && !self.ap.can_read_file(&stat) {
			return Err(errno!(EACCES));
		}
		if amode & W_OK != 0 && !self.ap.can_write_file(&stat) {
			return Err(errno!(EACCES));
		}
		if amode & X_OK != 0 && !self.ap.can_execute_file(&stat) {
			return Err(errno!(EACCES));
		}
		Ok(())
	}

	/// The `faccessat` syscall checks whether the file at the given path can be accessed
	/// with the given mode.
	pub fn faccessat<P: AsRef<[u8]>>(&self, dirfd: c_int, path: P, amode: c_int) -> EResult<()> {
		self.faccessat2(dirfd, path, amode, 0)
	}

	/// The `access` syscall checks whether the file at the given path can be accessed
	/// with the given mode, relative to the current working directory.
	pub fn access<P: AsRef<[u8]>>(&self, path: P, amode: c_int) -> EResult<()> {
		self.faccessat2(AT_FDCWD, path, amode, 0)
	}
}
