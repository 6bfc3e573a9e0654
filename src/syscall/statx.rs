//! The `statx` system call returns the extended status of a file.

use crate::{
	errno,
	errno::EResult,
	file::{path::PathBuf, vfs::Resolved, Statx},
	MemFS,
};
use std::ffi::c_int;

impl MemFS {
	/// The `statx` system call returns the extended status of a file.
	///
	/// Arguments:
	/// - `dirfd` is the file descriptor of the starting directory
	/// - `path` is the path of the file; an empty path together with
	///   [`super::util::at::AT_EMPTY_PATH`] designates `dirfd` itself
	/// - `flags` is a set of `AT_*` flags
	/// - `mask` selects the fields of interest; every supported field is populated
	///   regardless, and the returned `stx_mask` is the intersection of `mask` with the
	///   supported set
	pub fn statx<P: AsRef<[u8]>>(
		&self,
		dirfd: c_int,
		path: P,
		flags: c_int,
		mask: u32,
	) -> EResult<Statx> {
		let path = PathBuf::try_from(path.as_ref())?;
		let Resolved::Found(ino) = self.resolve_at(dirfd, &path, flags, false, true)? else {
			return Err(errno!(ENOENT));
		};
		Ok(self.nodes.get(ino)?.statx(mask))
	}
}
