//! An embeddable in-memory POSIX filesystem.
//!
//! Each [`MemFS`] value is an independent filesystem instance behaving like a tmpfs: it
//! has its own root directory, current working directory, open file description table and
//! umask. Operations mirror the Linux system call surface (`openat`, `read`, `renameat2`,
//! `statx`, `fallocate`, extended attributes, ...) including errno-style failure
//! reporting, permission checks, symbolic link resolution and atomic rename semantics.
//!
//! An instance is single-threaded: every operation executes atomically with respect to
//! every other operation on the same instance. Hosts exposing an instance to several
//! threads must serialize the calls.
//!
//! ```
//! use memfs::MemFS;
//! use memfs::file::open_file::{O_CREAT, O_RDWR};
//!
//! let mut fs = MemFS::new();
//! fs.mkdir("/tmp", 0o755).unwrap();
//! let fd = fs.open("/tmp/hello", O_CREAT | O_RDWR, 0o644).unwrap();
//! fs.write(fd, b"hello world").unwrap();
//! fs.close(fd).unwrap();
//! assert_eq!(fs.stat("/tmp/hello").unwrap().st_size, 11);
//! ```

pub mod errno;
pub mod file;
pub mod limits;
pub mod snapshot;
pub mod syscall;
pub mod time;

pub use errno::{EResult, Errno};
pub use file::{Stat, Statx};

use file::{
	fd::FileDescriptorTable,
	node::{NodeTable, ROOT_INODE},
	open_file::OpenFile,
	perm::{AccessProfile, Gid, Uid},
	vfs::ResolutionSettings,
	INode, Mode,
};

/// An in-memory filesystem instance.
///
/// The instance owns every node, the table of open file descriptions and the per-instance
/// state (cwd, umask, identity). Dropping the instance closes every file descriptor and
/// frees every node.
#[derive(Debug)]
pub struct MemFS {
	/// The table of nodes.
	pub(crate) nodes: NodeTable,
	/// The table of file descriptors.
	pub(crate) fds: FileDescriptorTable,
	/// The identity captured when the instance was created.
	pub(crate) ap: AccessProfile,
	/// The inode of the current working directory.
	///
	/// The reference may dangle if the directory is removed, in which case relative
	/// resolutions fail.
	pub(crate) cwd: INode,
	/// The file mode creation mask.
	pub(crate) umask: Mode,
}

impl MemFS {
	/// Creates a new, empty filesystem owned by the effective IDs of the calling process.
	pub fn new() -> Self {
		let ap = AccessProfile::current();
		Self::with_ids(ap.uid, ap.gid)
	}

	/// Creates a new, empty filesystem owned by the given IDs.
	pub fn with_ids(uid: Uid, gid: Gid) -> Self {
		Self {
			nodes: NodeTable::new(uid, gid),
			fds: FileDescriptorTable::default(),
			ap: AccessProfile::new(uid, gid),
			cwd: ROOT_INODE,
			umask: 0o022,
		}
	}

	/// Reassembles an instance from its parts (snapshot restore).
	///
	/// An instance only ever models its instantiator's identity, so the ownership of
	/// every restored node is rebound to it.
	pub(crate) fn from_parts(mut nodes: NodeTable, cwd: INode, umask: Mode) -> Self {
		let ap = AccessProfile::current();
		for node in nodes.iter_mut() {
			node.uid = ap.uid;
			node.gid = ap.gid;
		}
		Self {
			nodes,
			fds: FileDescriptorTable::default(),
			ap,
			cwd,
			umask,
		}
	}

	/// Returns the identity of the instance.
	pub fn access_profile(&self) -> AccessProfile {
		self.ap
	}

	/// Returns the resolution settings for the current state of the instance.
	pub(crate) fn resolution_settings(&self, create: bool, follow_link: bool) -> ResolutionSettings {
		ResolutionSettings {
			root: ROOT_INODE,
			cwd: self.cwd,
			ap: self.ap,
			create,
			follow_link,
		}
	}

	/// Releases the open file description, reaping its node if this was the last
	/// reference to a removed file.
	pub(crate) fn release_ofd(&mut self, ofd: OpenFile) {
		let ino = ofd.ino();
		if let Ok(node) = self.nodes.get_mut(ino) {
			node.open = node.open.saturating_sub(1);
		}
		self.nodes.maybe_release(ino);
	}
}

impl Default for MemFS {
	fn default() -> Self {
		Self::new()
	}
}
