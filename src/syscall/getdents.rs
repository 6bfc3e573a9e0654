//! The `getdents` system call allows to get the list of entries in a given directory.

use crate::{
	errno,
	errno::EResult,
	file::{INode, DT_UNKNOWN},
	time, MemFS,
};
use std::ffi::c_int;

/// A directory entry as returned by `getdents`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dirent {
	/// Inode number.
	pub d_ino: INode,
	/// Offset of the next entry, to be passed back through the directory cursor.
	pub d_off: u64,
	/// File type of the entry.
	pub d_type: u8,
	/// Filename.
	pub d_name: Vec<u8>,
}

impl MemFS {
	/// The `getdents` system call returns directory entries, starting at the file
	/// descriptor's directory cursor and advancing it.
	///
	/// On a fresh cursor, the implicit `.` and `..` entries come first. At most `count`
	/// entries are returned; an empty vector means the end of the directory.
	pub fn getdents(&mut self, fd: c_int, count: usize) -> EResult<Vec<Dirent>> {
		if count == 0 {
			return Err(errno!(EINVAL));
		}
		let file = self.fds.get_fd(fd)?.get_file();
		let ino = file.ino();
		let mut off = file.get_offset();
		let update_atime = file.is_atime_updated();
		let node = self.nodes.get(ino)?;
		let entries = node.dir()?;
		let mut dirents = Vec::new();
		while dirents.len() < count {
			// The two implicit entries come first
			let (d_ino, name): (INode, &[u8]) = match off {
				0 => (ino, b"."),
				1 => (entries.parent, b".."),
				n => {
					let Some(ent) = entries.iter().nth(n as usize - 2) else {
						break;
					};
					(ent.inode, &ent.name)
				}
			};
			let d_type = self
				.nodes
				.get(d_ino)
				.map(|n| n.get_type().to_dirent_type())
				.unwrap_or(DT_UNKNOWN);
			off += 1;
			dirents.push(Dirent {
				d_ino,
				d_off: off,
				d_type,
				d_name: name.to_vec(),
			});
		}
		if update_atime {
			self.nodes.get_mut(ino)?.atime = time::now();
		}
		self.fds.get_fd_mut(fd)?.get_file_mut().set_offset(off);
		Ok(dirents)
	}

	/// Convenience helper listing the whole directory at `fd` from its current cursor.
	pub fn getdents_all(&mut self, fd: c_int) -> EResult<Vec<Dirent>> {
		let mut out = Vec::new();
		loop {
			let mut batch = self.getdents(fd, 64)?;
			if batch.is_empty() {
				break;
			}
			out.append(&mut batch);
		}
		Ok(out)
	}
}
