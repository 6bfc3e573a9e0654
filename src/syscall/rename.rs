//! The `renameat2` system call allows to rename a file.

use super::util::at::AT_FDCWD;
use crate::{
	errno,
	errno::EResult,
	file::{
		path::{Path, PathBuf},
		vfs,
		vfs::{RENAME_EXCHANGE, RENAME_NOREPLACE, RENAME_WHITEOUT},
	},
	MemFS,
};
use std::ffi::c_int;

/// Checks a rename operand path, rejecting the root and the `.`/`..` leaves.
fn check_operand(path: &Path) -> EResult<()> {
	match path.file_name() {
		// Renaming the root is not possible
		None => Err(errno!(EBUSY)),
		Some(b".") | Some(b"..") => Err(errno!(EINVAL)),
		Some(_) => Ok(()),
	}
}

impl MemFS {
	/// The `renameat2` syscall renames or exchanges directory entries.
	///
	/// Arguments:
	/// - `olddirfd`/`oldpath` locate the entry to move
	/// - `newdirfd`/`newpath` locate the destination
	/// - `flags` is a combination of `RENAME_*` flags
	///
	/// Without flags, an existing destination is replaced atomically; a directory may
	/// only replace an empty directory. With [`RENAME_NOREPLACE`], an existing
	/// destination is an error. With [`RENAME_EXCHANGE`], both entries must exist and
	/// are swapped.
	pub fn renameat2<P: AsRef<[u8]>, Q: AsRef<[u8]>>(
		&mut self,
		olddirfd: c_int,
		oldpath: P,
		newdirfd: c_int,
		newpath: Q,
		flags: c_int,
	) -> EResult<()> {
		// RENAME_WHITEOUT only makes sense for overlay filesystems
		if flags & !(RENAME_NOREPLACE | RENAME_EXCHANGE | RENAME_WHITEOUT) != 0
			|| flags & RENAME_WHITEOUT != 0
		{
			return Err(errno!(EINVAL));
		}
		if flags & RENAME_NOREPLACE != 0 && flags & RENAME_EXCHANGE != 0 {
			return Err(errno!(EINVAL));
		}
		let oldpath = PathBuf::try_from(oldpath.as_ref())?;
		let newpath = PathBuf::try_from(newpath.as_ref())?;
		check_operand(&oldpath)?;
		check_operand(&newpath)?;
		let (old_parent, old_name) = self.resolve_parent_at(olddirfd, &oldpath)?;
		let (new_parent, new_name) = self.resolve_parent_at(newdirfd, &newpath)?;
		vfs::rename(
			&mut self.nodes,
			old_parent,
			old_name,
			new_parent,
			new_name,
			flags,
			&self.ap,
		)
	}

	/// The `renameat` syscall renames a file, replacing an existing destination.
	pub fn renameat<P: AsRef<[u8]>, Q: AsRef<[u8]>>(
		&mut self,
		olddirfd: c_int,
		oldpath: P,
		newdirfd: c_int,
		newpath: Q,
	) -> EResult<()> {
		self.renameat2(olddirfd, oldpath, newdirfd, newpath, 0)
	}

	/// The `rename` syscall renames a file, with both paths relative to the current
	/// working directory.
	pub fn rename<P: AsRef<[u8]>, Q: AsRef<[u8]>>(&mut self, oldpath: P, newpath: Q) -> EResult<()> {
		self.renameat(AT_FDCWD, oldpath, AT_FDCWD, newpath)
	}
}
