//! File descriptors implementation.
//!
//! A file descriptor is a small non-negative integer pointing to an entry in the
//! instance's open file description table.

use super::open_file::OpenFile;
use crate::{errno, errno::EResult, limits};
use std::ffi::c_int;

/// File descriptor flag: If set, the file descriptor is closed on successful
/// call to `execve`.
pub const FD_CLOEXEC: i32 = 1;

/// A file descriptor, pointing to an open file description.
#[derive(Clone, Debug)]
pub struct FileDescriptor {
	/// The file descriptor's flags.
	pub flags: i32,
	/// The open file description associated with the file descriptor.
	file: OpenFile,
}

impl FileDescriptor {
	/// Creates a new file descriptor.
	///
	/// Arguments:
	/// - `flags` is the set of flags associated with the file descriptor
	/// - `file` is the open file description the file descriptor points to
	pub fn new(flags: i32, file: OpenFile) -> Self {
		Self {
			flags,
			file,
		}
	}

	/// Returns the open file description associated with the descriptor.
	pub fn get_file(&self) -> &OpenFile {
		&self.file
	}

	/// Returns a mutable reference to the open file description.
	pub fn get_file_mut(&mut self) -> &mut OpenFile {
		&mut self.file
	}

	/// Closes the file descriptor, returning its open file description.
	pub fn close(self) -> OpenFile {
		self.file
	}
}

/// A table of file descriptors.
#[derive(Debug, Default)]
pub struct FileDescriptorTable(Vec<Option<FileDescriptor>>);

impl FileDescriptorTable {
	/// Returns the available file descriptor with the lowest ID.
	///
	/// If no ID is available, the function returns an error.
	fn get_available_fd(&self) -> EResult<u32> {
		// Find a hole in the table
		let fd = self
			.0
			.iter()
			.enumerate()
			.find(|(_, fd)| fd.is_none())
			.map(|(i, _)| i as u32);
		match fd {
			Some(fd) => Ok(fd),
			// No hole found, place the new FD at the end
			None => {
				let id = self.0.len() as u32;
				if (id as usize) < limits::OPEN_MAX {
					Ok(id)
				} else {
					Err(errno!(EMFILE))
				}
			}
		}
	}

	/// Creates a file descriptor.
	///
	/// Arguments:
	/// - `flags` are the file descriptor's flags
	/// - `file` is the open file description associated with the file descriptor
	///
	/// The function returns the ID of the new file descriptor.
	pub fn create_fd(&mut self, flags: i32, file: OpenFile) -> EResult<c_int> {
		let id = self.get_available_fd()? as usize;
		let fd = FileDescriptor::new(flags, file);
		// Extend the table if necessary, then insert the FD
		if id >= self.0.len() {
			self.0.resize(id + 1, None);
		}
		self.0[id] = Some(fd);
		Ok(id as _)
	}

	/// Returns an immutable reference to the file descriptor with ID `id`.
	///
	/// If the file descriptor does not exist, the function returns [`errno::EBADF`].
	pub fn get_fd(&self, id: c_int) -> EResult<&FileDescriptor> {
		let id: usize = id.try_into().map_err(|_| errno!(EBADF))?;
		self.0
			.get(id)
			.and_then(Option::as_ref)
			.ok_or_else(|| errno!(EBADF))
	}

	/// Returns a mutable reference to the file descriptor with ID `id`.
	///
	/// If the file descriptor does not exist, the function returns [`errno::EBADF`].
	pub fn get_fd_mut(&mut self, id: c_int) -> EResult<&mut FileDescriptor> {
		let id: usize = id.try_into().map_err(|_| errno!(EBADF))?;
		self.0
			.get_mut(id)
			.and_then(Option::as_mut)
			.ok_or_else(|| errno!(EBADF))
	}

	/// Closes the file descriptor with the ID `id`, returning its open file description.
	///
	/// If the file descriptor does not exist, the function returns [`errno::EBADF`].
	pub fn close_fd(&mut self, id: c_int) -> EResult<OpenFile> {
		let id: usize = id.try_into().map_err(|_| errno!(EBADF))?;
		let fd = self.0.get_mut(id).ok_or_else(|| errno!(EBADF))?;
		// Remove FD from table
		let Some(fd) = fd.take() else {
			return Err(errno!(EBADF));
		};
		// Shrink the table if necessary
		let new_len = self
			.0
			.iter()
			.enumerate()
			.rfind(|(_, fd)| fd.is_some())
			.map(|(i, _)| i + 1)
			.unwrap_or(0);
		self.0.truncate(new_len);
		Ok(fd.close())
	}

	/// Closes every open file descriptor in the inclusive range `[first, last]`, returning
	/// the open file descriptions. Unopened IDs in the range are silently skipped.
	pub fn close_range(&mut self, first: u32, last: u32) -> Vec<OpenFile> {
		let mut closed = Vec::new();
		for id in (first as usize)..self.0.len() {
			if id > last as usize {
				break;
			}
			if let Some(fd) = self.0[id].take() {
				closed.push(fd.close());
			}
		}
		let new_len = self
			.0
			.iter()
			.enumerate()
			.rfind(|(_, fd)| fd.is_some())
			.map(|(i, _)| i + 1)
			.unwrap_or(0);
		self.0.truncate(new_len);
		closed
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn dummy_file() -> OpenFile {
		OpenFile::new(1, 0)
	}

	#[test]
	fn fd_create0() {
		let mut fds = FileDescriptorTable::default();
		let id = fds.create_fd(0, dummy_file()).unwrap();
		assert_eq!(id, 0);
	}

	#[test]
	fn fd_create1() {
		let mut fds = FileDescriptorTable::default();
		let id = fds.create_fd(0, dummy_file()).unwrap();
		assert_eq!(id, 0);
		let id = fds.create_fd(0, dummy_file()).unwrap();
		assert_eq!(id, 1);
	}

	#[test]
	fn fd_lowest_reuse() {
		let mut fds = FileDescriptorTable::default();
		for _ in 0..3 {
			fds.create_fd(0, dummy_file()).unwrap();
		}
		fds.close_fd(1).unwrap();
		let id = fds.create_fd(0, dummy_file()).unwrap();
		assert_eq!(id, 1);
	}

	#[test]
	fn fd_close() {
		let mut fds = FileDescriptorTable::default();
		let id = fds.create_fd(0, dummy_file()).unwrap();
		fds.close_fd(id).unwrap();
		assert_eq!(fds.get_fd(id).unwrap_err(), errno!(EBADF));
		assert_eq!(fds.close_fd(id).unwrap_err(), errno!(EBADF));
		assert_eq!(fds.close_fd(-1).unwrap_err(), errno!(EBADF));
	}

	#[test]
	fn fd_close_range() {
		let mut fds = FileDescriptorTable::default();
		for _ in 0..5 {
			fds.create_fd(0, dummy_file()).unwrap();
		}
		fds.close_fd(2).unwrap();
		// The hole at 2 is skipped silently
		let closed = fds.close_range(1, 3);
		assert_eq!(closed.len(), 2);
		assert!(fds.get_fd(0).is_ok());
		assert!(fds.get_fd(4).is_ok());
		assert_eq!(fds.get_fd(1).unwrap_err(), errno!(EBADF));
	}
}
