//! Files implementation.
//!
//! This module holds the data plane of the filesystem: paths, permissions, nodes with
//! their contents, the open file description table and the path resolver. The syscall
//! surface glueing them together lives in the `syscall` module.

pub mod content;
pub mod fd;
pub mod node;
pub mod open_file;
pub mod path;
pub mod perm;
pub mod vfs;

use crate::time::Timespec;
use perm::{Gid, Uid};

/// Type representing an inode number.
///
/// The value represents a unique node in the filesystem and stays stable for the whole
/// lifetime of the node.
pub type INode = u64;
/// Type representing a file mode, which is a pair of values representing respectively:
/// - UNIX type (regular, directory, etc...)
/// - UNIX permissions (read, write, execute, etc...)
pub type Mode = u32;

/// Mask isolating the file type bits of a mode.
pub const S_IFMT: Mode = 0o170000;
/// File type: socket
pub const S_IFSOCK: Mode = 0o140000;
/// File type: symbolic link
pub const S_IFLNK: Mode = 0o120000;
/// File type: regular file
pub const S_IFREG: Mode = 0o100000;
/// File type: block device
pub const S_IFBLK: Mode = 0o060000;
/// File type: directory
pub const S_IFDIR: Mode = 0o040000;
/// File type: character device
pub const S_IFCHR: Mode = 0o020000;
/// File type: FIFO
pub const S_IFIFO: Mode = 0o010000;

/// Directory entry type: Block Device
pub const DT_BLK: u8 = 6;
/// Directory entry type: Char Device
pub const DT_CHR: u8 = 2;
/// Directory entry type: Directory
pub const DT_DIR: u8 = 4;
/// Directory entry type: FIFO
pub const DT_FIFO: u8 = 1;
/// Directory entry type: Symbolic Link
pub const DT_LNK: u8 = 10;
/// Directory entry type: Regular file
pub const DT_REG: u8 = 8;
/// Directory entry type: Socket
pub const DT_SOCK: u8 = 12;
/// Directory entry type: Unknown
pub const DT_UNKNOWN: u8 = 0;

/// Status mask: want the file type.
pub const STATX_TYPE: u32 = 0x0001;
/// Status mask: want the permission bits.
pub const STATX_MODE: u32 = 0x0002;
/// Status mask: want the number of hard links.
pub const STATX_NLINK: u32 = 0x0004;
/// Status mask: want the owner user ID.
pub const STATX_UID: u32 = 0x0008;
/// Status mask: want the owner group ID.
pub const STATX_GID: u32 = 0x0010;
/// Status mask: want the last access timestamp.
pub const STATX_ATIME: u32 = 0x0020;
/// Status mask: want the last modification timestamp.
pub const STATX_MTIME: u32 = 0x0040;
/// Status mask: want the last status change timestamp.
pub const STATX_CTIME: u32 = 0x0080;
/// Status mask: want the inode number.
pub const STATX_INO: u32 = 0x0100;
/// Status mask: want the size of the file.
pub const STATX_SIZE: u32 = 0x0200;
/// Status mask: want the number of allocated blocks.
pub const STATX_BLOCKS: u32 = 0x0400;
/// Status mask: everything `stat` provides.
pub const STATX_BASIC_STATS: u32 = 0x07ff;
/// Status mask: want the creation timestamp.
pub const STATX_BTIME: u32 = 0x0800;
/// Status mask: every supported field.
pub const STATX_ALL: u32 = 0x0fff;

/// Enumeration representing the different file types.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileType {
	/// A regular file storing data.
	Regular,
	/// A directory, containing other files.
	Directory,
	/// A symbolic link, pointing to another file.
	Link,
}

impl FileType {
	/// Returns the type corresponding to the given mode `mode`.
	///
	/// If the type doesn't exist, or is not supported, the function returns `None`.
	pub fn from_mode(mode: Mode) -> Option<Self> {
		match mode & S_IFMT {
			S_IFREG | 0 => Some(Self::Regular),
			S_IFDIR => Some(Self::Directory),
			S_IFLNK => Some(Self::Link),

			_ => None,
		}
	}

	/// Returns the mode corresponding to the type.
	pub fn to_mode(self) -> Mode {
		match self {
			Self::Regular => S_IFREG,
			Self::Directory => S_IFDIR,
			Self::Link => S_IFLNK,
		}
	}

	/// Returns the directory entry type.
	pub fn to_dirent_type(self) -> u8 {
		match self {
			Self::Regular => DT_REG,
			Self::Directory => DT_DIR,
			Self::Link => DT_LNK,
		}
	}
}

/// The status of a file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stat {
	/// The inode number.
	pub st_ino: INode,
	/// The file's mode: type bits and permission bits.
	pub st_mode: Mode,
	/// The number of hard links to the file.
	pub st_nlink: u32,
	/// The ID of the owner user.
	pub st_uid: Uid,
	/// The ID of the owner group.
	pub st_gid: Gid,
	/// The size of the file in bytes.
	pub st_size: u64,
	/// Timestamp of the last access.
	pub st_atim: Timespec,
	/// Timestamp of the last modification of the content.
	pub st_mtim: Timespec,
	/// Timestamp of the last modification of the metadata.
	pub st_ctim: Timespec,
}

impl Stat {
	/// Returns the type of the file, if valid.
	pub fn get_type(&self) -> Option<FileType> {
		FileType::from_mode(self.st_mode)
	}
}

/// A timestamp for the `statx` syscall.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatxTimestamp {
	/// Seconds since the Epoch (UNIX time)
	pub tv_sec: i64,
	/// Nanoseconds since tv_sec
	pub tv_nsec: u32,
}

impl From<Timespec> for StatxTimestamp {
	fn from(ts: Timespec) -> Self {
		Self {
			tv_sec: ts.tv_sec,
			tv_nsec: ts.tv_nsec as u32,
		}
	}
}

/// Extended status of a file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Statx {
	/// Mask of bits indicating filled fields
	pub stx_mask: u32,
	/// Block size for filesystem I/O
	pub stx_blksize: u32,
	/// Number of hard links
	pub stx_nlink: u32,
	/// User ID of owner
	pub stx_uid: u32,
	/// Group ID of owner
	pub stx_gid: u32,
	/// File type and mode
	pub stx_mode: u16,
	/// Inode number
	pub stx_ino: u64,
	/// Total size in bytes
	pub stx_size: u64,
	/// Number of 512B blocks allocated
	pub stx_blocks: u64,
	/// Last access
	pub stx_atime: StatxTimestamp,
	/// Creation
	pub stx_btime: StatxTimestamp,
	/// Last status change
	pub stx_ctime: StatxTimestamp,
	/// Last modification
	pub stx_mtime: StatxTimestamp,
}

/// Statistics about a filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct Statfs {
	/// Type of filesystem.
	pub f_type: u32,
	/// Optimal transfer block size.
	pub f_bsize: u32,
	/// Total data blocks in filesystem.
	pub f_blocks: i64,
	/// Free blocks in filesystem.
	pub f_bfree: i64,
	/// Free blocks available to unprivileged user.
	pub f_bavail: i64,
	/// Total inodes in filesystem.
	pub f_files: i64,
	/// Free inodes in filesystem.
	pub f_ffree: i64,
	/// Maximum length of filenames.
	pub f_namelen: u32,
	/// Fragment size.
	pub f_frsize: u32,
	/// Mount flags of filesystem.
	pub f_flags: u32,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn file_type_mode() {
		assert_eq!(FileType::from_mode(S_IFREG | 0o644), Some(FileType::Regular));
		assert_eq!(FileType::from_mode(0o644), Some(FileType::Regular));
		assert_eq!(FileType::from_mode(S_IFDIR | 0o755), Some(FileType::Directory));
		assert_eq!(FileType::from_mode(S_IFLNK | 0o777), Some(FileType::Link));
		assert_eq!(FileType::from_mode(S_IFSOCK), None);
		assert_eq!(FileType::Directory.to_dirent_type(), DT_DIR);
	}
}
