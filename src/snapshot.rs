//! Serialization of a whole filesystem instance to a bytestream, and back.
//!
//! The stream is little-endian. It starts with the magic `DFSv` and a version number,
//! followed by the instance's superblock state (root inode, umask, cwd path) and the
//! set of inodes, each emitted exactly once so hard links are preserved. Directory
//! contents reference their children by inode number; the references are checked in a
//! second pass when loading.
//!
//! The open file description table is not part of a snapshot: snapshots are taken while
//! the instance is quiescent.

use crate::{
	errno,
	errno::EResult,
	file::{
		content::Regular,
		node::{Entries, FileContent, Node, NodeTable, ROOT_INODE},
		path::Path,
		vfs,
		vfs::Resolved,
		FileType,
	},
	time::Timespec,
	MemFS,
};
use log::{debug, warn};

/// The magic number of a snapshot stream.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"DFSv";
/// The version of the snapshot format produced by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Payload tag: regular file.
const TAG_REGULAR: u8 = 0;
/// Payload tag: directory.
const TAG_DIRECTORY: u8 = 1;
/// Payload tag: symbolic link.
const TAG_LINK: u8 = 2;

/// A little-endian stream reader over a byte buffer.
///
/// Every accessor fails with [`errno::EINVAL`] when the stream is exhausted, so a
/// truncated snapshot is reported uniformly.
struct Reader<'b> {
	buf: &'b [u8],
	off: usize,
}

impl<'b> Reader<'b> {
	fn new(buf: &'b [u8]) -> Self {
		Self {
			buf,
			off: 0,
		}
	}

	fn take(&mut self, len: usize) -> EResult<&'b [u8]> {
		let end = self.off.checked_add(len).ok_or_else(|| errno!(EINVAL))?;
		let slice = self.buf.get(self.off..end).ok_or_else(|| errno!(EINVAL))?;
		self.off = end;
		Ok(slice)
	}

	fn u8(&mut self) -> EResult<u8> {
		Ok(self.take(1)?[0])
	}

	fn u16(&mut self) -> EResult<u16> {
		Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
	}

	fn u32(&mut self) -> EResult<u32> {
		Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
	}

	fn u64(&mut self) -> EResult<u64> {
		Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
	}

	fn i64(&mut self) -> EResult<i64> {
		Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
	}

	fn timespec(&mut self) -> EResult<Timespec> {
		Ok(Timespec {
			tv_sec: self.i64()?,
			tv_nsec: self.i64()?,
		})
	}

	fn is_empty(&self) -> bool {
		self.off >= self.buf.len()
	}
}

fn push_u16(buf: &mut Vec<u8>, val: u16) {
	buf.extend_from_slice(&val.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, val: u32) {
	buf.extend_from_slice(&val.to_le_bytes());
}

fn push_u64(buf: &mut Vec<u8>, val: u64) {
	buf.extend_from_slice(&val.to_le_bytes());
}

fn push_timespec(buf: &mut Vec<u8>, ts: Timespec) {
	buf.extend_from_slice(&ts.tv_sec.to_le_bytes());
	buf.extend_from_slice(&ts.tv_nsec.to_le_bytes());
}

/// Encodes a single node record.
fn encode_node(buf: &mut Vec<u8>, node: &Node) {
	push_u64(buf, node.ino);
	push_u32(buf, node.mode);
	push_u32(buf, node.nlink);
	push_u32(buf, node.uid);
	push_u32(buf, node.gid);
	push_timespec(buf, node.atime);
	push_timespec(buf, node.mtime);
	push_timespec(buf, node.ctime);
	push_timespec(buf, node.btime);
	let xattrs: Vec<_> = node.xattrs().collect();
	push_u32(buf, xattrs.len() as u32);
	for (name, value) in xattrs {
		push_u16(buf, name.len() as u16);
		buf.extend_from_slice(name);
		push_u32(buf, value.len() as u32);
		buf.extend_from_slice(value);
	}
	match &node.content {
		FileContent::Regular(content) => {
			buf.push(TAG_REGULAR);
			push_u64(buf, content.size());
			let extents: Vec<_> = content.extents().collect();
			push_u32(buf, extents.len() as u32);
			for ext in extents {
				push_u64(buf, ext.off);
				push_u32(buf, ext.data.len() as u32);
				buf.extend_from_slice(&ext.data);
			}
		}
		FileContent::Directory(entries) => {
			buf.push(TAG_DIRECTORY);
			push_u64(buf, entries.parent);
			push_u32(buf, entries.len() as u32);
			for ent in entries.iter() {
				push_u16(buf, ent.name.len() as u16);
				buf.extend_from_slice(&ent.name);
				push_u64(buf, ent.inode);
			}
		}
		FileContent::Link(target) => {
			buf.push(TAG_LINK);
			push_u16(buf, target.len() as u16);
			buf.extend_from_slice(target);
		}
	}
}

/// Decodes a single node record.
fn decode_node(r: &mut Reader<'_>) -> EResult<Node> {
	let ino = r.u64()?;
	let mode = r.u32()?;
	let nlink = r.u32()?;
	let uid = r.u32()?;
	let gid = r.u32()?;
	let atime = r.timespec()?;
	let mtime = r.timespec()?;
	let ctime = r.timespec()?;
	let btime = r.timespec()?;
	let mut node = Node {
		ino,
		mode,
		nlink,
		uid,
		gid,
		atime,
		mtime,
		ctime,
		btime,
		open: 0,
		xattrs: Vec::new(),
		content: FileContent::Regular(Regular::default()),
	};
	let xattr_count = r.u32()?;
	for _ in 0..xattr_count {
		let name_len = r.u16()? as usize;
		let name = r.take(name_len)?.to_vec();
		let value_len = r.u32()? as usize;
		let value = r.take(value_len)?.to_vec();
		node.set_xattr(&name, &value, 0)
			.map_err(|_| errno!(EINVAL))?;
	}
	node.content = match r.u8()? {
		TAG_REGULAR => {
			let size = r.u64()?;
			let mut content = Regular::default();
			let extent_count = r.u32()?;
			for _ in 0..extent_count {
				let off = r.u64()?;
				let len = r.u32()? as usize;
				let data = r.take(len)?;
				content.write(off, data).map_err(|_| errno!(EINVAL))?;
			}
			if content.size() > size {
				return Err(errno!(EINVAL));
			}
			content.truncate(size);
			FileContent::Regular(content)
		}
		TAG_DIRECTORY => {
			let parent = r.u64()?;
			let mut entries = Entries::new(parent);
			let entry_count = r.u32()?;
			for _ in 0..entry_count {
				let name_len = r.u16()? as usize;
				let name = r.take(name_len)?.to_vec();
				let child = r.u64()?;
				entries.insert(name, child).map_err(|_| errno!(EINVAL))?;
			}
			FileContent::Directory(entries)
		}
		TAG_LINK => {
			let len = r.u16()? as usize;
			let target = r.take(len)?.to_vec();
			if target.is_empty() {
				return Err(errno!(EINVAL));
			}
			FileContent::Link(target)
		}
		_ => return Err(errno!(EINVAL)),
	};
	// The mode must agree with the payload
	if FileType::from_mode(mode) != Some(node.content.as_type()) {
		return Err(errno!(EINVAL));
	}
	Ok(node)
}

impl MemFS {
	/// Serializes the whole instance into a byte stream.
	pub fn dump(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		buf.extend_from_slice(SNAPSHOT_MAGIC);
		push_u32(&mut buf, SNAPSHOT_VERSION);
		push_u64(&mut buf, ROOT_INODE);
		push_u32(&mut buf, self.umask);
		// An unreachable cwd is recorded as the root
		let cwd = self
			.getcwd()
			.map(|p| p.into_bytes())
			.unwrap_or_else(|_| b"/".to_vec());
		push_u32(&mut buf, cwd.len() as u32);
		buf.extend_from_slice(&cwd);
		let mut nodes: Vec<_> = self.nodes.iter().collect();
		nodes.sort_unstable_by_key(|node| node.ino);
		push_u64(&mut buf, nodes.len() as u64);
		for node in nodes {
			encode_node(&mut buf, node);
		}
		debug!(
			"dumped {} nodes ({} bytes)",
			self.nodes.len(),
			buf.len()
		);
		buf
	}

	/// Writes a snapshot of the instance to the host file at `path`.
	///
	/// Host I/O errors are surfaced with their OS error code.
	pub fn dump_to<P: AsRef<std::path::Path>>(&self, path: P) -> EResult<()> {
		let buf = self.dump();
		std::fs::write(path, buf)?;
		Ok(())
	}

	/// Rebuilds an instance from the byte stream `buf`.
	///
	/// A stream with a bad magic, an unknown version, a truncated record or a dangling
	/// directory reference is rejected with [`errno::EINVAL`]. The restored instance is
	/// owned by the calling process's identity and has an empty file descriptor table.
	pub fn load(buf: &[u8]) -> EResult<Self> {
		let mut r = Reader::new(buf);
		if r.take(4)? != SNAPSHOT_MAGIC {
			warn!("bad snapshot magic");
			return Err(errno!(EINVAL));
		}
		let version = r.u32()?;
		if version != SNAPSHOT_VERSION {
			warn!("unsupported snapshot version: {version}");
			return Err(errno!(EINVAL));
		}
		let root = r.u64()?;
		if root != ROOT_INODE {
			return Err(errno!(EINVAL));
		}
		let umask = r.u32()? & 0o777;
		let cwd_len = r.u32()? as usize;
		let cwd_path = r.take(cwd_len)?.to_vec();
		let node_count = r.u64()?;
		let mut table = NodeTable::empty();
		for _ in 0..node_count {
			let node = decode_node(&mut r)?;
			table.insert_restored(node)?;
		}
		if !r.is_empty() {
			// Trailing garbage
			return Err(errno!(EINVAL));
		}
		// Fix up directory references: every child and parent must exist
		let root_node = table.get(ROOT_INODE).map_err(|_| errno!(EINVAL))?;
		if root_node.get_type() != FileType::Directory {
			return Err(errno!(EINVAL));
		}
		for node in table.iter() {
			if let FileContent::Directory(entries) = &node.content {
				table.get(entries.parent).map_err(|_| errno!(EINVAL))?;
				for ent in entries.iter() {
					table.get(ent.inode).map_err(|_| errno!(EINVAL))?;
				}
			}
		}
		// Re-resolve the recorded cwd; fall back to the root if it vanished
		let mut fs = Self::from_parts(table, ROOT_INODE, umask);
		let rs = fs.resolution_settings(false, true);
		if let Ok(Resolved::Found(cwd)) = vfs::resolve_path(&fs.nodes, Path::new(&cwd_path), &rs) {
			if fs.nodes.get(cwd).map(|n| n.dir().is_ok()).unwrap_or(false) {
				fs.cwd = cwd;
			}
		}
		debug!("loaded {} nodes", fs.nodes.len());
		Ok(fs)
	}

	/// Reads a snapshot back from the host file at `path`.
	///
	/// Host I/O errors are surfaced with their OS error code; malformed content is
	/// rejected with [`errno::EINVAL`].
	pub fn load_from<P: AsRef<std::path::Path>>(path: P) -> EResult<Self> {
		let buf = std::fs::read(path)?;
		Self::load(&buf)
	}
}
