//! UNIX permissions are detailed in the POSIX specification.
//!
//! This module implements management of such permissions. An instance models a single
//! identity, captured when the instance is created.

use super::{FileType, Mode, Stat};

/// Type representing a user ID.
pub type Uid = u32;
/// Type representing a group ID.
pub type Gid = u32;

/// The root user ID.
pub const ROOT_UID: Uid = 0;
/// The root group ID.
pub const ROOT_GID: Gid = 0;

/// User: Read, Write and Execute.
pub const S_IRWXU: Mode = 0o0700;
/// User: Read.
pub const S_IRUSR: Mode = 0o0400;
/// User: Write.
pub const S_IWUSR: Mode = 0o0200;
/// User: Execute.
pub const S_IXUSR: Mode = 0o0100;
/// Group: Read, Write and Execute.
pub const S_IRWXG: Mode = 0o0070;
/// Group: Read.
pub const S_IRGRP: Mode = 0o0040;
/// Group: Write.
pub const S_IWGRP: Mode = 0o0020;
/// Group: Execute.
pub const S_IXGRP: Mode = 0o0010;
/// Other: Read, Write and Execute.
pub const S_IRWXO: Mode = 0o0007;
/// Other: Read.
pub const S_IROTH: Mode = 0o0004;
/// Other: Write.
pub const S_IWOTH: Mode = 0o0002;
/// Other: Execute.
pub const S_IXOTH: Mode = 0o0001;
/// Setuid.
pub const S_ISUID: Mode = 0o4000;
/// Setgid.
pub const S_ISGID: Mode = 0o2000;
/// Sticky bit.
pub const S_ISVTX: Mode = 0o1000;

/// Access check: file existence.
pub const F_OK: i32 = 0;
/// Access check: execute permission.
pub const X_OK: i32 = 1;
/// Access check: write permission.
pub const W_OK: i32 = 2;
/// Access check: read permission.
pub const R_OK: i32 = 4;

/// A set of informations determining whether an agent can access a file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AccessProfile {
	/// The effective ID of the user.
	pub uid: Uid,
	/// The effective ID of the group.
	pub gid: Gid,
}

impl AccessProfile {
	/// Creates a profile from the given IDs.
	pub fn new(uid: Uid, gid: Gid) -> Self {
		Self {
			uid,
			gid,
		}
	}

	/// Returns the profile of the current process, using its effective IDs.
	#[cfg(unix)]
	pub fn current() -> Self {
		// Cannot fail
		let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
		Self::new(uid, gid)
	}

	#[cfg(not(unix))]
	pub fn current() -> Self {
		Self::new(ROOT_UID, ROOT_GID)
	}

	/// Returns the class of permission bits that applies to the profile for the given file.
	fn rights(&self, stat: &Stat) -> Mode {
		if stat.st_uid == self.uid {
			(stat.st_mode >> 6) & 0o7
		} else if stat.st_gid == self.gid {
			(stat.st_mode >> 3) & 0o7
		} else {
			stat.st_mode & 0o7
		}
	}

	/// Tells whether the agent can read the file.
	pub fn can_read_file(&self, stat: &Stat) -> bool {
		// If root, bypass checks
		if self.uid == ROOT_UID {
			return true;
		}
		self.rights(stat) & 0o4 != 0
	}

	/// Tells whether the agent can write the file.
	pub fn can_write_file(&self, stat: &Stat) -> bool {
		// If root, bypass checks
		if self.uid == ROOT_UID {
			return true;
		}
		self.rights(stat) & 0o2 != 0
	}

	/// Tells whether the agent can execute the file.
	pub fn can_execute_file(&self, stat: &Stat) -> bool {
		// Root bypasses checks, unless the file is regular: executing it then requires at
		// least one execute bit
		if self.uid == ROOT_UID {
			return stat.get_type() != Some(FileType::Regular) || stat.st_mode & 0o111 != 0;
		}
		self.rights(stat) & 0o1 != 0
	}

	/// Tells whether the agent can access files of the directory *if the name of the file is
	/// known*.
	#[inline]
	pub fn can_search_directory(&self, stat: &Stat) -> bool {
		self.can_execute_file(stat)
	}

	/// Tells whether the agent can modify entries in the directory, including creating files,
	/// deleting files, and renaming files.
	#[inline]
	pub fn can_write_directory(&self, stat: &Stat) -> bool {
		self.can_write_file(stat) && self.can_execute_file(stat)
	}

	/// Tells whether the agent can set permissions for the given file.
	pub fn can_set_file_permissions(&self, stat: &Stat) -> bool {
		self.uid == ROOT_UID || self.uid == stat.st_uid
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::file::S_IFREG;

	fn stat(mode: Mode, uid: Uid, gid: Gid) -> Stat {
		Stat {
			st_mode: S_IFREG | mode,
			st_uid: uid,
			st_gid: gid,
			..Default::default()
		}
	}

	#[test]
	fn owner_class() {
		let ap = AccessProfile::new(1000, 1000);
		assert!(ap.can_read_file(&stat(0o400, 1000, 1000)));
		assert!(!ap.can_write_file(&stat(0o400, 1000, 1000)));
		// Owner class applies even when group/other bits are wider
		assert!(!ap.can_write_file(&stat(0o466, 1000, 1000)));
	}

	#[test]
	fn group_and_other_class() {
		let ap = AccessProfile::new(1000, 1000);
		assert!(ap.can_write_file(&stat(0o020, 1, 1000)));
		assert!(!ap.can_write_file(&stat(0o020, 1, 1)));
		assert!(ap.can_read_file(&stat(0o004, 1, 1)));
	}

	#[test]
	fn root_bypass() {
		let ap = AccessProfile::new(ROOT_UID, ROOT_GID);
		assert!(ap.can_read_file(&stat(0o000, 1000, 1000)));
		assert!(ap.can_write_file(&stat(0o000, 1000, 1000)));
		// Executing a regular file still requires at least one execute bit
		assert!(!ap.can_execute_file(&stat(0o644, 1000, 1000)));
		assert!(ap.can_execute_file(&stat(0o100, 1000, 1000)));
	}
}
