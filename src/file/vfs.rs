//! Path resolution and namespace mutation.
//!
//! To manipulate files, the functions of this module should be used instead of touching
//! the node table directly: they enforce the permission checks, the link accounting and
//! the atomicity requirements of the syscall surface.

use super::{
	node::{check_entry_name, FileContent, NodeTable, ROOT_INODE},
	path::{Component, Path, PathBuf},
	perm::AccessProfile,
	FileType, INode, Mode,
};
use crate::{
	errno,
	errno::EResult,
	limits::{NAME_MAX, SYMLOOP_MAX},
	time,
};
use std::ffi::c_int;

/// Flag: Don't replace the new path if it exists. Return an error instead.
pub const RENAME_NOREPLACE: c_int = 1;
/// Flag: Exchange the old and new paths atomically.
pub const RENAME_EXCHANGE: c_int = 2;
/// Flag: Leave a whiteout object at the source. Not supported.
pub const RENAME_WHITEOUT: c_int = 4;

/// Settings for a path resolution operation.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionSettings {
	/// The root directory for the operation.
	pub root: INode,
	/// The current working directory, from which relative resolution starts.
	pub cwd: INode,

	/// The access profile to use for resolution.
	pub ap: AccessProfile,

	/// If `true`, the path is resolved for creation, meaning the operation will not fail
	/// if the file does not exist.
	pub create: bool,
	/// If `true` and if the last component of the path is a symbolic link, path resolution
	/// follows it.
	pub follow_link: bool,
}

/// The result of a path resolution operation.
#[derive(Debug, Eq, PartialEq)]
pub enum Resolved<'p> {
	/// The file has been found.
	Found(INode),
	/// The file can be created.
	///
	/// This variant can be returned only if the `create` field is set in
	/// [`ResolutionSettings`].
	Creatable {
		/// The parent directory in which the file is to be created.
		parent: INode,
		/// The name of the file to be created.
		name: &'p [u8],
	},
}

/// Resolves the symbolic link target `target` and returns the target inode.
///
/// Arguments:
/// - `lookup_dir` is the directory from which the resolution of the target starts
/// - `links` is the number of symbolic link traversals so far
///
/// Symbolic links are followed recursively, including the last element of the target
/// path.
fn resolve_link(
	table: &NodeTable,
	target: &[u8],
	lookup_dir: INode,
	rs: &ResolutionSettings,
	links: &mut usize,
) -> EResult<INode> {
	// If the limit on traversals is exceeded, error
	*links += 1;
	if *links > SYMLOOP_MAX {
		return Err(errno!(ELOOP));
	}
	let rs = ResolutionSettings {
		cwd: lookup_dir,
		create: false,
		follow_link: true,
		..*rs
	};
	match resolve_path_impl(table, Path::new(target), &rs, links)? {
		Resolved::Found(ino) => Ok(ino),
		// Because `create` is unset
		Resolved::Creatable {
			..
		} => unreachable!(),
	}
}

/// Implementation of [`resolve_path`].
///
/// `links` is the number of symbolic link traversals so far.
fn resolve_path_impl<'p>(
	table: &NodeTable,
	path: &'p Path,
	rs: &ResolutionSettings,
	links: &mut usize,
) -> EResult<Resolved<'p>> {
	// Get the start lookup directory
	let mut dir = if path.is_absolute() {
		rs.root
	} else {
		rs.cwd
	};
	// The start of the resolution must exist (the cwd may be dangling)
	table.get(dir)?;
	let mut iter = path.components().peekable();
	while let Some(comp) = iter.next() {
		let is_last = iter.peek().is_none();
		let name = match comp {
			Component::RootDir | Component::CurDir => {
				if is_last {
					return Ok(Resolved::Found(dir));
				}
				continue;
			}
			Component::ParentDir => {
				// `..` from the root resolves to the root itself
				dir = table.get(dir)?.dir()?.parent;
				if is_last {
					return Ok(Resolved::Found(dir));
				}
				continue;
			}
			Component::Normal(name) => name,
		};
		if name.len() > NAME_MAX {
			return Err(errno!(ENAMETOOLONG));
		}
		let node = table.get(dir)?;
		let entries = node.dir()?;
		// Check lookup permission
		if !rs.ap.can_search_directory(&node.stat()) {
			return Err(errno!(EACCES));
		}
		let child = entries.get(name);
		if is_last {
			let Some(child) = child else {
				// The file does not exist
				return if rs.create {
					Ok(Resolved::Creatable {
						parent: dir,
						name,
					})
				} else {
					Err(errno!(ENOENT))
				};
			};
			let child_node = table.get(child)?;
			return match &child_node.content {
				FileContent::Link(target) if rs.follow_link => Ok(Resolved::Found(
					resolve_link(table, target, dir, rs, links)?,
				)),
				_ => Ok(Resolved::Found(child)),
			};
		}
		// Intermediate component
		let child = child.ok_or_else(|| errno!(ENOENT))?;
		let child_node = table.get(child)?;
		match &child_node.content {
			FileContent::Directory(_) => dir = child,
			FileContent::Link(target) => {
				dir = resolve_link(table, target, dir, rs, links)?;
			}
			_ => return Err(errno!(ENOTDIR)),
		}
	}
	// The path contains only separators
	Ok(Resolved::Found(dir))
}

/// Resolves the given `path` with the given `settings`.
///
/// The following conditions can cause errors:
/// - If the path is empty, the function returns [`errno::ENOENT`].
/// - If a component of the path cannot be searched with the provided access profile, the
///   function returns [`errno::EACCES`].
/// - If a component of the path (excluding the last) is not a directory nor a symbolic
///   link to one, the function returns [`errno::ENOTDIR`].
/// - If the resolution of the path requires more symbolic link traversals than
///   [`SYMLOOP_MAX`], the function returns [`errno::ELOOP`].
pub fn resolve_path<'p>(
	table: &NodeTable,
	path: &'p Path,
	settings: &ResolutionSettings,
) -> EResult<Resolved<'p>> {
	// Required by POSIX
	if path.is_empty() {
		return Err(errno!(ENOENT));
	}
	let mut links = 0;
	resolve_path_impl(table, path, settings, &mut links)
}

/// Creates a file in the directory `parent`, with the given name, mode and content.
///
/// `uid` and `gid` are set according to `ap`, except that the group of the new file is
/// inherited from `parent` when the latter carries the SGID bit.
///
/// The following errors can be returned:
/// - `parent` is not a directory: [`errno::ENOTDIR`]
/// - Permissions to create the file are not fulfilled for the given `ap`:
///   [`errno::EACCES`]
/// - The file already exists: [`errno::EEXIST`]
///
/// On success, the function returns the inode of the new file.
pub fn create_file(
	table: &mut NodeTable,
	parent: INode,
	name: &[u8],
	ap: &AccessProfile,
	mode: Mode,
	content: FileContent,
) -> EResult<INode> {
	let parent_node = table.get(parent)?;
	let parent_stat = parent_node.stat();
	let entries = parent_node.dir()?;
	if !ap.can_write_directory(&parent_stat) {
		return Err(errno!(EACCES));
	}
	check_entry_name(name)?;
	if entries.get(name).is_some() {
		return Err(errno!(EEXIST));
	}
	// If SGID is set, the newly created file shall inherit the group ID of the parent
	// directory
	let gid = if parent_stat.st_mode & super::perm::S_ISGID != 0 {
		parent_stat.st_gid
	} else {
		ap.gid
	};
	let is_dir = matches!(content, FileContent::Directory(_));
	let ino = table.alloc(mode, ap.uid, gid, content);
	let ts = time::now();
	// Cannot fail: name and uniqueness were checked above
	let node = table.get_mut(ino)?;
	node.nlink = if is_dir { 2 } else { 1 };
	let parent_node = table.get_mut(parent)?;
	parent_node.dir_mut()?.insert(name.to_vec(), ino)?;
	// Add reference for `..`
	if is_dir {
		parent_node.nlink += 1;
	}
	parent_node.mtime = ts;
	parent_node.ctime = ts;
	Ok(ino)
}

/// Creates a new hard link to the given target file.
///
/// Arguments:
/// - `parent` is the parent directory where the new link will be created
/// - `name` is the name of the link
/// - `target` is the target inode
///
/// The following errors can be returned:
/// - Permissions to create the link are not fulfilled for the given `ap`:
///   [`errno::EACCES`]
/// - The number of links to the file would exceed [`crate::limits::LINK_MAX`]:
///   [`errno::EMLINK`]
/// - `target` is a directory: [`errno::EPERM`]
pub fn link(
	table: &mut NodeTable,
	parent: INode,
	name: &[u8],
	target: INode,
	ap: &AccessProfile,
) -> EResult<()> {
	let parent_node = table.get(parent)?;
	let parent_stat = parent_node.stat();
	parent_node.dir()?;
	if !ap.can_write_directory(&parent_stat) {
		return Err(errno!(EACCES));
	}
	if table.get(target)?.get_type() == FileType::Directory {
		return Err(errno!(EPERM));
	}
	table.check_link_count(target)?;
	table
		.get_mut(parent)?
		.dir_mut()?
		.insert(name.to_vec(), target)?;
	let ts = time::now();
	let target_node = table.get_mut(target)?;
	target_node.nlink += 1;
	target_node.ctime = ts;
	let parent_node = table.get_mut(parent)?;
	parent_node.mtime = ts;
	parent_node.ctime = ts;
	Ok(())
}

/// Removes a hard link from the directory `parent`.
///
/// If `remove_dir` is set, the entry must be an empty directory; otherwise, it must not
/// be a directory.
///
/// The following errors can be returned:
/// - The link does not exist: [`errno::ENOENT`]
/// - Permissions to remove the link are not fulfilled for the given `ap`:
///   [`errno::EACCES`]
/// - `remove_dir` is unset and the entry is a directory: [`errno::EISDIR`]
/// - `remove_dir` is set and the entry is not a directory: [`errno::ENOTDIR`], or is a
///   non-empty directory: [`errno::ENOTEMPTY`]
///
/// On success, the function returns the inode of the removed entry.
pub fn unlink(
	table: &mut NodeTable,
	parent: INode,
	name: &[u8],
	ap: &AccessProfile,
	remove_dir: bool,
) -> EResult<INode> {
	let parent_node = table.get(parent)?;
	let parent_stat = parent_node.stat();
	let entries = parent_node.dir()?;
	if !ap.can_write_directory(&parent_stat) {
		return Err(errno!(EACCES));
	}
	let target = entries.get(name).ok_or_else(|| errno!(ENOENT))?;
	let target_node = table.get(target)?;
	let is_dir = target_node.get_type() == FileType::Directory;
	if remove_dir {
		if !is_dir {
			return Err(errno!(ENOTDIR));
		}
		if !target_node.dir()?.is_empty() {
			return Err(errno!(ENOTEMPTY));
		}
	} else if is_dir {
		return Err(errno!(EISDIR));
	}
	let ts = time::now();
	let parent_node = table.get_mut(parent)?;
	parent_node.dir_mut()?.remove(name)?;
	parent_node.mtime = ts;
	parent_node.ctime = ts;
	let target_node = table.get_mut(target)?;
	if is_dir {
		// The implicit `.` goes away along with the entry
		target_node.nlink = 0;
		table.get_mut(parent)?.nlink -= 1;
	} else {
		target_node.nlink -= 1;
		target_node.ctime = ts;
	}
	table.maybe_release(target);
	Ok(target)
}

/// Moves or exchanges directory entries, implementing the `renameat2` policy.
///
/// Arguments:
/// - `old_parent` and `old_name` locate the entry to move
/// - `new_parent` and `new_name` locate the destination
/// - `flags` is a combination of `RENAME_*` flags
///
/// Renaming within a directory keeps the entry's position; moving across directories
/// appends at the destination. A directory's link count is unchanged by a move, but both
/// parents' counts are adjusted for the `..` entry.
pub fn rename(
	table: &mut NodeTable,
	old_parent: INode,
	old_name: &[u8],
	new_parent: INode,
	new_name: &[u8],
	flags: c_int,
	ap: &AccessProfile,
) -> EResult<()> {
	check_entry_name(new_name).or_else(|e| {
		// The destination is allowed to exist
		if e == errno!(EEXIST) {
			Ok(())
		} else {
			Err(e)
		}
	})?;
	// Check permissions on both parents
	let old_parent_node = table.get(old_parent)?;
	old_parent_node.dir()?;
	if !ap.can_write_directory(&old_parent_node.stat()) {
		return Err(errno!(EACCES));
	}
	let new_parent_node = table.get(new_parent)?;
	new_parent_node.dir()?;
	if !ap.can_write_directory(&new_parent_node.stat()) {
		return Err(errno!(EACCES));
	}
	let old = table
		.get(old_parent)?
		.dir()?
		.get(old_name)
		.ok_or_else(|| errno!(ENOENT))?;
	let new = table.get(new_parent)?.dir()?.get(new_name);
	if flags & RENAME_EXCHANGE != 0 {
		let new = new.ok_or_else(|| errno!(ENOENT))?;
		return exchange(table, old_parent, old_name, old, new_parent, new_name, new);
	}
	if flags & RENAME_NOREPLACE != 0 && new.is_some() {
		return Err(errno!(EEXIST));
	}
	// If the source and destination are the same file, do nothing
	if new == Some(old) {
		return Ok(());
	}
	let old_is_dir = table.get(old)?.get_type() == FileType::Directory;
	// A directory cannot be moved into its own subtree
	if old_is_dir && table.is_in_subtree(new_parent, old)? {
		return Err(errno!(EINVAL));
	}
	// Remove the replaced entry, if any
	if let Some(new) = new {
		let new_node = table.get(new)?;
		let new_is_dir = new_node.get_type() == FileType::Directory;
		match (old_is_dir, new_is_dir) {
			(true, false) => return Err(errno!(ENOTDIR)),
			(false, true) => return Err(errno!(EISDIR)),
			(true, true) if !new_node.dir()?.is_empty() => {
				return Err(errno!(ENOTEMPTY));
			}
			_ => {}
		}
	}
	let ts = time::now();
	if old_parent == new_parent {
		let entries = table.get_mut(old_parent)?.dir_mut()?;
		if new.is_some() {
			// The destination keeps its slot, the source entry goes away
			entries.retarget(new_name, old)?;
			entries.remove(old_name)?;
		} else {
			// Rename in place
			entries.rename(old_name, new_name)?;
		}
	} else {
		table.get_mut(old_parent)?.dir_mut()?.remove(old_name)?;
		let entries = table.get_mut(new_parent)?.dir_mut()?;
		if new.is_some() {
			entries.retarget(new_name, old)?;
		} else {
			entries.insert(new_name.to_vec(), old)?;
		}
		// Keep the `..` entry and the parents' link counts consistent
		if old_is_dir {
			table.get_mut(old)?.dir_mut()?.parent = new_parent;
			table.get_mut(old_parent)?.nlink -= 1;
			table.get_mut(new_parent)?.nlink += 1;
		}
	}
	// Release the replaced entry
	if let Some(new) = new {
		let new_node = table.get_mut(new)?;
		if new_node.get_type() == FileType::Directory {
			new_node.nlink = 0;
			table.get_mut(new_parent)?.nlink -= 1;
		} else {
			new_node.nlink -= 1;
			new_node.ctime = ts;
		}
		table.maybe_release(new);
	}
	table.get_mut(old)?.ctime = ts;
	for parent in [old_parent, new_parent] {
		let node = table.get_mut(parent)?;
		node.mtime = ts;
		node.ctime = ts;
	}
	Ok(())
}

/// Implementation of `RENAME_EXCHANGE`: both entries are swapped atomically.
#[allow(clippy::too_many_arguments)]
fn exchange(
	table: &mut NodeTable,
	old_parent: INode,
	old_name: &[u8],
	old: INode,
	new_parent: INode,
	new_name: &[u8],
	new: INode,
) -> EResult<()> {
	if old == new {
		return Ok(());
	}
	let old_is_dir = table.get(old)?.get_type() == FileType::Directory;
	let new_is_dir = table.get(new)?.get_type() == FileType::Directory;
	// Neither entry may end up inside its own subtree
	if old_is_dir && table.is_in_subtree(new_parent, old)? {
		return Err(errno!(EINVAL));
	}
	if new_is_dir && table.is_in_subtree(old_parent, new)? {
		return Err(errno!(EINVAL));
	}
	table.get_mut(old_parent)?.dir_mut()?.retarget(old_name, new)?;
	table.get_mut(new_parent)?.dir_mut()?.retarget(new_name, old)?;
	if old_parent != new_parent {
		if old_is_dir {
			table.get_mut(old)?.dir_mut()?.parent = new_parent;
			table.get_mut(old_parent)?.nlink -= 1;
			table.get_mut(new_parent)?.nlink += 1;
		}
		if new_is_dir {
			table.get_mut(new)?.dir_mut()?.parent = old_parent;
			table.get_mut(new_parent)?.nlink -= 1;
			table.get_mut(old_parent)?.nlink += 1;
		}
	}
	let ts = time::now();
	for ino in [old, new] {
		table.get_mut(ino)?.ctime = ts;
	}
	for parent in [old_parent, new_parent] {
		let node = table.get_mut(parent)?;
		node.mtime = ts;
		node.ctime = ts;
	}
	Ok(())
}

/// Returns the absolute path to reach the directory with the given inode.
///
/// If the directory is no longer reachable from the root, the function returns
/// [`errno::ENOENT`].
pub fn get_path(table: &NodeTable, ino: INode) -> EResult<PathBuf> {
	if ino == ROOT_INODE {
		return Ok(PathBuf::root());
	}
	let mut segments = Vec::new();
	let mut cur = ino;
	while cur != ROOT_INODE {
		let parent = table.get(cur)?.dir()?.parent;
		let name = table
			.get(parent)?
			.dir()?
			.iter()
			.find(|e| e.inode == cur)
			.ok_or_else(|| errno!(ENOENT))?
			.name
			.clone();
		segments.push(name);
		cur = parent;
	}
	let mut buf = Vec::new();
	for name in segments.iter().rev() {
		buf.push(b'/');
		buf.extend_from_slice(name);
	}
	Ok(PathBuf::new_unchecked(buf))
}
