//! The `umask` syscall is used to set the file mode creation mask of the instance.

use crate::{file::Mode, MemFS};

impl MemFS {
	/// The `umask` syscall sets the file mode creation mask and returns the previous
	/// value. Only the permission bits are retained.
	pub fn umask(&mut self, mask: Mode) -> Mode {
		core::mem::replace(&mut self.umask, mask & 0o777)
	}
}
