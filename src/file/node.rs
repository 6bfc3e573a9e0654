//! Files nodes and the node table.
//!
//! Nodes are stored in an arena keyed by inode number. Directories reference their entries
//! by inode number, never by owning handles, so the cyclic graph formed by `..` needs no
//! special treatment. A node is freed when both its link count and its open count reach
//! zero.

use super::{
	content::Regular,
	perm::{Gid, Uid},
	FileType, Mode, Stat, Statx, StatxTimestamp, STATX_ALL,
};
use crate::{
	errno,
	errno::EResult,
	limits::{LINK_MAX, NAME_MAX, XATTR_NAME_MAX, XATTR_SIZE_MAX},
	time,
	time::Timespec,
};
use std::collections::HashMap;

/// The inode number of the root directory.
pub const ROOT_INODE: super::INode = 1;

/// Fails with [`errno::EEXIST`] if present (`setxattr`).
pub const XATTR_CREATE: i32 = 0x1;
/// Fails with [`errno::ENODATA`] if absent (`setxattr`).
pub const XATTR_REPLACE: i32 = 0x2;

/// Checks the validity of a directory entry name.
///
/// `.` and `..` are never storable as explicit entries, hence they are reported as already
/// existing.
pub fn check_entry_name(name: &[u8]) -> EResult<()> {
	if name.len() > NAME_MAX {
		return Err(errno!(ENAMETOOLONG));
	}
	if name.is_empty() || name.contains(&b'/') || name.contains(&b'\0') {
		return Err(errno!(EINVAL));
	}
	if name == b"." || name == b".." {
		return Err(errno!(EEXIST));
	}
	Ok(())
}

/// A directory entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirEntry {
	/// The name of the entry.
	pub name: Vec<u8>,
	/// The entry's inode.
	pub inode: super::INode,
}

/// The entries of a directory, in insertion order.
///
/// The implicit `.` and `..` entries are not stored; the parent link is kept aside.
#[derive(Clone, Debug)]
pub struct Entries {
	/// The inode of the parent directory (`..`). The root is its own parent.
	pub parent: super::INode,
	/// The explicit entries of the directory.
	entries: Vec<DirEntry>,
}

impl Entries {
	/// Creates an empty table with the given parent.
	pub fn new(parent: super::INode) -> Self {
		Self {
			parent,
			entries: Vec::new(),
		}
	}

	/// Returns the number of explicit entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Tells whether the directory has no explicit entry.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the inode of the entry with the given name, if any.
	pub fn get(&self, name: &[u8]) -> Option<super::INode> {
		self.entries
			.iter()
			.find(|e| e.name == name)
			.map(|e| e.inode)
	}

	/// Inserts a new entry at the end of the table.
	///
	/// If an entry with the same name exists, the function returns [`errno::EEXIST`].
	pub fn insert(&mut self, name: Vec<u8>, inode: super::INode) -> EResult<()> {
		check_entry_name(&name)?;
		if self.get(&name).is_some() {
			return Err(errno!(EEXIST));
		}
		self.entries.push(DirEntry {
			name,
			inode,
		});
		Ok(())
	}

	/// Removes the entry with the given name, returning its inode.
	///
	/// If no entry has this name, the function returns [`errno::ENOENT`].
	pub fn remove(&mut self, name: &[u8]) -> EResult<super::INode> {
		let i = self
			.entries
			.iter()
			.position(|e| e.name == name)
			.ok_or_else(|| errno!(ENOENT))?;
		Ok(self.entries.remove(i).inode)
	}

	/// Retargets the entry with the given name, keeping its position. Returns the previous
	/// inode.
	pub fn retarget(&mut self, name: &[u8], inode: super::INode) -> EResult<super::INode> {
		let ent = self
			.entries
			.iter_mut()
			.find(|e| e.name == name)
			.ok_or_else(|| errno!(ENOENT))?;
		Ok(core::mem::replace(&mut ent.inode, inode))
	}

	/// Renames the entry `old_name` to `new_name`, keeping its position.
	pub fn rename(&mut self, old_name: &[u8], new_name: &[u8]) -> EResult<()> {
		let ent = self
			.entries
			.iter_mut()
			.find(|e| e.name == old_name)
			.ok_or_else(|| errno!(ENOENT))?;
		ent.name = new_name.to_vec();
		Ok(())
	}

	/// Returns an iterator over the explicit entries, in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &DirEntry> {
		self.entries.iter()
	}
}

/// Enumeration of all possible contents for each file type.
#[derive(Clone, Debug)]
pub enum FileContent {
	/// The file is a regular file.
	Regular(Regular),
	/// The file is a directory.
	Directory(Entries),
	/// The file is a symbolic link. The data is the link's target.
	Link(Vec<u8>),
}

impl FileContent {
	/// Returns the file type associated with the content.
	pub fn as_type(&self) -> FileType {
		match self {
			Self::Regular(_) => FileType::Regular,
			Self::Directory(_) => FileType::Directory,
			Self::Link(_) => FileType::Link,
		}
	}
}

/// A node of the filesystem.
#[derive(Clone, Debug)]
pub struct Node {
	/// The node's inode number.
	pub ino: super::INode,
	/// The file's mode: type bits and permission bits.
	pub mode: Mode,
	/// The number of hard links to the node.
	pub nlink: u32,
	/// The ID of the owner user.
	pub uid: Uid,
	/// The ID of the owner group.
	pub gid: Gid,

	/// Timestamp of the last access to the file.
	pub atime: Timespec,
	/// Timestamp of the last modification of the file's content.
	pub mtime: Timespec,
	/// Timestamp of the last modification of the metadata.
	pub ctime: Timespec,
	/// Timestamp of the creation of the file.
	pub btime: Timespec,

	/// The number of open file descriptions referencing the node.
	pub open: u32,

	/// Extended attributes, in insertion order.
	pub(crate) xattrs: Vec<(Vec<u8>, Vec<u8>)>,

	/// The content of the file.
	pub content: FileContent,
}

impl Node {
	/// Returns the type of the file.
	pub fn get_type(&self) -> FileType {
		self.content.as_type()
	}

	/// Returns the apparent size of the file.
	///
	/// For a directory, this is the number of explicit entries; for a symbolic link, the
	/// length of the target.
	pub fn size(&self) -> u64 {
		match &self.content {
			FileContent::Regular(content) => content.size(),
			FileContent::Directory(entries) => entries.len() as _,
			FileContent::Link(target) => target.len() as _,
		}
	}

	/// Returns the directory entries of the node.
	///
	/// If the node is not a directory, the function returns [`errno::ENOTDIR`].
	pub fn dir(&self) -> EResult<&Entries> {
		match &self.content {
			FileContent::Directory(entries) => Ok(entries),
			_ => Err(errno!(ENOTDIR)),
		}
	}

	/// Mutable version of [`Self::dir`].
	pub fn dir_mut(&mut self) -> EResult<&mut Entries> {
		match &mut self.content {
			FileContent::Directory(entries) => Ok(entries),
			_ => Err(errno!(ENOTDIR)),
		}
	}

	/// Returns the regular content of the node.
	///
	/// If the node is a directory, the function returns [`errno::EISDIR`]; a symbolic link,
	/// [`errno::EINVAL`].
	pub fn regular(&self) -> EResult<&Regular> {
		match &self.content {
			FileContent::Regular(content) => Ok(content),
			FileContent::Directory(_) => Err(errno!(EISDIR)),
			FileContent::Link(_) => Err(errno!(EINVAL)),
		}
	}

	/// Mutable version of [`Self::regular`].
	pub fn regular_mut(&mut self) -> EResult<&mut Regular> {
		match &mut self.content {
			FileContent::Regular(content) => Ok(content),
			FileContent::Directory(_) => Err(errno!(EISDIR)),
			FileContent::Link(_) => Err(errno!(EINVAL)),
		}
	}

	/// Returns the status of the file.
	pub fn stat(&self) -> Stat {
		Stat {
			st_ino: self.ino,
			st_mode: self.mode,
			st_nlink: self.nlink,
			st_uid: self.uid,
			st_gid: self.gid,
			st_size: self.size(),
			st_atim: self.atime,
			st_mtim: self.mtime,
			st_ctim: self.ctime,
		}
	}

	/// Returns the extended status of the file.
	///
	/// All supported fields are populated; `stx_mask` is the intersection of `mask` with
	/// the supported set.
	pub fn statx(&self, mask: u32) -> Statx {
		let blocks = match &self.content {
			FileContent::Regular(content) => content.allocated().div_ceil(512),
			_ => 0,
		};
		Statx {
			stx_mask: mask & STATX_ALL,
			stx_blksize: 512,
			stx_nlink: self.nlink,
			stx_uid: self.uid,
			stx_gid: self.gid,
			stx_mode: self.mode as u16,
			stx_ino: self.ino,
			stx_size: self.size(),
			stx_blocks: blocks,
			stx_atime: StatxTimestamp::from(self.atime),
			stx_btime: StatxTimestamp::from(self.btime),
			stx_ctime: StatxTimestamp::from(self.ctime),
			stx_mtime: StatxTimestamp::from(self.mtime),
		}
	}

	/// Returns the total size of the extended attributes, in bytes.
	fn xattrs_size(&self) -> usize {
		self.xattrs.iter().map(|(n, v)| n.len() + v.len()).sum()
	}

	/// Returns the value of the extended attribute with the given name.
	///
	/// If the attribute does not exist, the function returns [`errno::ENODATA`].
	pub fn get_xattr(&self, name: &[u8]) -> EResult<&[u8]> {
		self.xattrs
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_slice())
			.ok_or_else(|| errno!(ENODATA))
	}

	/// Sets the value of the extended attribute with the given name.
	///
	/// `flags` is a combination of [`XATTR_CREATE`] and [`XATTR_REPLACE`].
	pub fn set_xattr(&mut self, name: &[u8], value: &[u8], flags: i32) -> EResult<()> {
		if name.is_empty() || name.len() > XATTR_NAME_MAX {
			return Err(errno!(ERANGE));
		}
		let old_len = self
			.xattrs
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.len());
		if flags & XATTR_CREATE != 0 && old_len.is_some() {
			return Err(errno!(EEXIST));
		}
		if flags & XATTR_REPLACE != 0 && old_len.is_none() {
			return Err(errno!(ENODATA));
		}
		let new_size = self.xattrs_size() - old_len.unwrap_or(0)
			+ value.len()
			+ if old_len.is_none() { name.len() } else { 0 };
		if new_size > XATTR_SIZE_MAX {
			return Err(errno!(ERANGE));
		}
		match self.xattrs.iter_mut().find(|(n, _)| n == name) {
			Some((_, v)) => *v = value.to_vec(),
			None => self.xattrs.push((name.to_vec(), value.to_vec())),
		}
		Ok(())
	}

	/// Removes the extended attribute with the given name.
	///
	/// If the attribute does not exist, the function returns [`errno::ENODATA`].
	pub fn remove_xattr(&mut self, name: &[u8]) -> EResult<()> {
		let i = self
			.xattrs
			.iter()
			.position(|(n, _)| n == name)
			.ok_or_else(|| errno!(ENODATA))?;
		self.xattrs.remove(i);
		Ok(())
	}

	/// Returns the names of the extended attributes, in insertion order.
	pub fn list_xattr(&self) -> Vec<Vec<u8>> {
		self.xattrs.iter().map(|(n, _)| n.clone()).collect()
	}

	/// Returns the extended attributes as name/value pairs, in insertion order.
	pub fn xattrs(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
		self.xattrs
			.iter()
			.map(|(n, v)| (n.as_slice(), v.as_slice()))
	}
}

/// The table of nodes of a filesystem instance.
#[derive(Debug)]
pub struct NodeTable {
	/// The nodes, keyed by inode number.
	nodes: HashMap<super::INode, Node>,
	/// The next inode number to be allocated.
	next_inode: super::INode,
}

impl NodeTable {
	/// Creates a new table containing only the root directory, owned by the given IDs.
	pub fn new(uid: Uid, gid: Gid) -> Self {
		let ts = time::now();
		let root = Node {
			ino: ROOT_INODE,
			mode: FileType::Directory.to_mode() | 0o1777,
			// `.` and `..`
			nlink: 2,
			uid,
			gid,
			atime: ts,
			mtime: ts,
			ctime: ts,
			btime: ts,
			open: 0,
			xattrs: Vec::new(),
			content: FileContent::Directory(Entries::new(ROOT_INODE)),
		};
		Self {
			nodes: [(ROOT_INODE, root)].into_iter().collect(),
			next_inode: ROOT_INODE + 1,
		}
	}

	/// Creates an empty table for deserialization. The root is expected to be inserted
	/// afterwards.
	pub(crate) fn empty() -> Self {
		Self {
			nodes: HashMap::new(),
			next_inode: ROOT_INODE + 1,
		}
	}

	/// Returns the number of live nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Returns an immutable reference to the node with the given inode number.
	///
	/// If the node does not exist, the function returns [`errno::ENOENT`].
	pub fn get(&self, ino: super::INode) -> EResult<&Node> {
		self.nodes.get(&ino).ok_or_else(|| errno!(ENOENT))
	}

	/// Returns a mutable reference to the node with the given inode number.
	///
	/// If the node does not exist, the function returns [`errno::ENOENT`].
	pub fn get_mut(&mut self, ino: super::INode) -> EResult<&mut Node> {
		self.nodes.get_mut(&ino).ok_or_else(|| errno!(ENOENT))
	}

	/// Returns an iterator over all nodes.
	pub fn iter(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	/// Returns a mutable iterator over all nodes.
	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
		self.nodes.values_mut()
	}

	/// Allocates a node with the given mode, ownership and content, stamping every
	/// timestamp with the current time.
	///
	/// The node starts with a link count of zero; the caller is responsible for the
	/// bookkeeping when inserting directory entries.
	pub fn alloc(&mut self, mode: Mode, uid: Uid, gid: Gid, content: FileContent) -> super::INode {
		let ino = self.next_inode;
		self.next_inode += 1;
		let ts = time::now();
		self.nodes.insert(
			ino,
			Node {
				ino,
				mode,
				nlink: 0,
				uid,
				gid,
				atime: ts,
				mtime: ts,
				ctime: ts,
				btime: ts,
				open: 0,
				xattrs: Vec::new(),
				content,
			},
		);
		ino
	}

	/// Inserts a deserialized node verbatim, bumping the allocation counter past its inode.
	pub(crate) fn insert_restored(&mut self, node: Node) -> EResult<()> {
		if self.nodes.insert(node.ino, node).is_some() {
			return Err(errno!(EINVAL));
		}
		let Some(ino) = self.nodes.keys().max() else {
			return Ok(());
		};
		self.next_inode = self.next_inode.max(ino + 1);
		Ok(())
	}

	/// Releases the node with the given inode number if it is no longer referenced by any
	/// directory entry nor open file description.
	pub fn maybe_release(&mut self, ino: super::INode) {
		if let Some(node) = self.nodes.get(&ino) {
			if node.nlink == 0 && node.open == 0 {
				self.nodes.remove(&ino);
			}
		}
	}

	/// Tells whether `ino` is `ancestor` or one of its descendants.
	pub fn is_in_subtree(&self, ino: super::INode, ancestor: super::INode) -> EResult<bool> {
		let mut cur = ino;
		loop {
			if cur == ancestor {
				return Ok(true);
			}
			let parent = self.get(cur)?.dir()?.parent;
			if parent == cur {
				return Ok(false);
			}
			cur = parent;
		}
	}

	/// Checks that one more link can be added to the given node.
	pub fn check_link_count(&self, ino: super::INode) -> EResult<()> {
		if self.get(ino)?.nlink as usize >= LINK_MAX {
			return Err(errno!(EMLINK));
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn dummy_node() -> Node {
		let mut table = NodeTable::new(0, 0);
		let ino = table.alloc(
			FileType::Regular.to_mode() | 0o644,
			0,
			0,
			FileContent::Regular(Regular::default()),
		);
		table.nodes.remove(&ino).unwrap()
	}

	#[test]
	fn entries_order() {
		let mut entries = Entries::new(ROOT_INODE);
		entries.insert(b"bbb".to_vec(), 2).unwrap();
		entries.insert(b"aaa".to_vec(), 3).unwrap();
		entries.insert(b"ccc".to_vec(), 4).unwrap();
		let names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
		assert_eq!(names, vec![b"bbb".to_vec(), b"aaa".to_vec(), b"ccc".to_vec()]);
		// Removal preserves the order of the others
		entries.remove(b"aaa").unwrap();
		let names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
		assert_eq!(names, vec![b"bbb".to_vec(), b"ccc".to_vec()]);
	}

	#[test]
	fn entries_errors() {
		let mut entries = Entries::new(ROOT_INODE);
		entries.insert(b"a".to_vec(), 2).unwrap();
		assert_eq!(entries.insert(b"a".to_vec(), 3).unwrap_err(), errno!(EEXIST));
		assert_eq!(entries.insert(b".".to_vec(), 3).unwrap_err(), errno!(EEXIST));
		assert_eq!(entries.insert(b"".to_vec(), 3).unwrap_err(), errno!(EINVAL));
		assert_eq!(
			entries.insert(b"a/b".to_vec(), 3).unwrap_err(),
			errno!(EINVAL)
		);
		assert_eq!(
			entries.insert(vec![b'x'; NAME_MAX + 1], 3).unwrap_err(),
			errno!(ENAMETOOLONG)
		);
		assert_eq!(entries.remove(b"zzz").unwrap_err(), errno!(ENOENT));
	}

	#[test]
	fn xattr() {
		let mut node = dummy_node();
		node.set_xattr(b"user.foo", b"hello", 0).unwrap();
		assert_eq!(node.get_xattr(b"user.foo").unwrap(), b"hello");
		assert_eq!(
			node.set_xattr(b"user.foo", b"x", XATTR_CREATE).unwrap_err(),
			errno!(EEXIST)
		);
		assert_eq!(
			node.set_xattr(b"user.bar", b"x", XATTR_REPLACE).unwrap_err(),
			errno!(ENODATA)
		);
		node.set_xattr(b"user.bar", b"1", 0).unwrap();
		node.set_xattr(b"user.foo", b"world", XATTR_REPLACE).unwrap();
		assert_eq!(node.get_xattr(b"user.foo").unwrap(), b"world");
		// Insertion order is preserved across replacement
		assert_eq!(
			node.list_xattr(),
			vec![b"user.foo".to_vec(), b"user.bar".to_vec()]
		);
		node.remove_xattr(b"user.foo").unwrap();
		assert_eq!(node.get_xattr(b"user.foo").unwrap_err(), errno!(ENODATA));
	}

	#[test]
	fn xattr_limits() {
		let mut node = dummy_node();
		assert_eq!(
			node.set_xattr(&vec![b'n'; XATTR_NAME_MAX + 1], b"", 0)
				.unwrap_err(),
			errno!(ERANGE)
		);
		assert_eq!(
			node.set_xattr(b"user.big", &vec![0; XATTR_SIZE_MAX + 1], 0)
				.unwrap_err(),
			errno!(ERANGE)
		);
	}

	#[test]
	fn release() {
		let mut table = NodeTable::new(0, 0);
		let ino = table.alloc(
			FileType::Regular.to_mode() | 0o644,
			0,
			0,
			FileContent::Regular(Regular::default()),
		);
		table.get_mut(ino).unwrap().open = 1;
		// Still open: the node survives
		table.maybe_release(ino);
		assert!(table.get(ino).is_ok());
		table.get_mut(ino).unwrap().open = 0;
		table.maybe_release(ino);
		assert_eq!(table.get(ino).unwrap_err(), errno!(ENOENT));
	}
}
