//! The extended attributes system call family.
//!
//! Each call exists in three variants: by path (following symbolic links), by path
//! without following a trailing link (`l*`), and by file descriptor (`f*`).

use super::util::at::AT_FDCWD;
use crate::{
	errno::EResult,
	file::{path::PathBuf, vfs::Resolved, INode},
	time, MemFS,
};
use std::ffi::c_int;

impl MemFS {
	fn xattr_target(&self, path: &[u8], follow_link: bool) -> EResult<INode> {
		let path = PathBuf::try_from(path)?;
		match self.resolve_at(AT_FDCWD, &path, 0, false, follow_link)? {
			Resolved::Found(ino) => Ok(ino),
			// `create` is unset
			Resolved::Creatable {
				..
			} => unreachable!(),
		}
	}

	fn do_setxattr(&mut self, ino: INode, name: &[u8], value: &[u8], flags: i32) -> EResult<()> {
		let node = self.nodes.get_mut(ino)?;
		node.set_xattr(name, value, flags)?;
		node.ctime = time::now();
		Ok(())
	}

	/// The `setxattr` syscall sets an extended attribute of the file at the given path.
	///
	/// `flags` may hold [`crate::file::node::XATTR_CREATE`] or
	/// [`crate::file::node::XATTR_REPLACE`].
	pub fn setxattr<P: AsRef<[u8]>, N: AsRef<[u8]>>(
		&mut self,
		path: P,
		name: N,
		value: &[u8],
		flags: i32,
	) -> EResult<()> {
		let ino = self.xattr_target(path.as_ref(), true)?;
		self.do_setxattr(ino, name.as_ref(), value, flags)
	}

	/// Like [`Self::setxattr`], but a trailing symbolic link is the operand itself.
	pub fn lsetxattr<P: AsRef<[u8]>, N: AsRef<[u8]>>(
		&mut self,
		path: P,
		name: N,
		value: &[u8],
		flags: i32,
	) -> EResult<()> {
		let ino = self.xattr_target(path.as_ref(), false)?;
		self.do_setxattr(ino, name.as_ref(), value, flags)
	}

	/// Like [`Self::setxattr`], on the file behind the given file descriptor.
	pub fn fsetxattr<N: AsRef<[u8]>>(
		&mut self,
		fd: c_int,
		name: N,
		value: &[u8],
		flags: i32,
	) -> EResult<()> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		self.do_setxattr(ino, name.as_ref(), value, flags)
	}

	/// The `getxattr` syscall returns the value of an extended attribute of the file at
	/// the given path.
	///
	/// If the attribute does not exist, the function returns [`errno::ENODATA`].
	pub fn getxattr<P: AsRef<[u8]>, N: AsRef<[u8]>>(&self, path: P, name: N) -> EResult<Vec<u8>> {
		let ino = self.xattr_target(path.as_ref(), true)?;
		Ok(self.nodes.get(ino)?.get_xattr(name.as_ref())?.to_vec())
	}

	/// Like [`Self::getxattr`], but a trailing symbolic link is the operand itself.
	pub fn lgetxattr<P: AsRef<[u8]>, N: AsRef<[u8]>>(&self, path: P, name: N) -> EResult<Vec<u8>> {
		let ino = self.xattr_target(path.as_ref(), false)?;
		Ok(self.nodes.get(ino)?.get_xattr(name.as_ref())?.to_vec())
	}

	/// Like [`Self::getxattr`], on the file behind the given file descriptor.
	pub fn fgetxattr<N: AsRef<[u8]>>(&self, fd: c_int, name: N) -> EResult<Vec<u8>> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		Ok(self.nodes.get(ino)?.get_xattr(name.as_ref())?.to_vec())
	}

	/// The `listxattr` syscall returns the names of the extended attributes of the file
	/// at the given path, in deterministic insertion order.
	pub fn listxattr<P: AsRef<[u8]>>(&self, path: P) -> EResult<Vec<Vec<u8>>> {
		let ino = self.xattr_target(path.as_ref(), true)?;
		Ok(self.nodes.get(ino)?.list_xattr())
	}

	/// Like [`Self::listxattr`], but a trailing symbolic link is the operand itself.
	pub fn llistxattr<P: AsRef<[u8]>>(&self, path: P) -> EResult<Vec<Vec<u8>>> {
		let ino = self.xattr_target(path.as_ref(), false)?;
		Ok(self.nodes.get(ino)?.list_xattr())
	}

	/// Like [`Self::listxattr`], on the file behind the given file descriptor.
	pub fn flistxattr(&self, fd: c_int) -> EResult<Vec<Vec<u8>>> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		Ok(self.nodes.get(ino)?.list_xattr())
	}

	fn do_removexattr(&mut self, ino: INode, name: &[u8]) -> EResult<()> {
		let node = self.nodes.get_mut(ino)?;
		node.remove_xattr(name)?;
		node.ctime = time::now();
		Ok(())
	}

	/// The `removexattr` syscall removes an extended attribute of the file at the given
	/// path.
	///
	/// If the attribute does not exist, the function returns [`errno::ENODATA`].
	pub fn removexattr<P: AsRef<[u8]>, N: AsRef<[u8]>>(&mut self, path: P, name: N) -> EResult<()> {
		let ino = self.xattr_target(path.as_ref(), true)?;
		self.do_removexattr(ino, name.as_ref())
	}

	/// Like [`Self::removexattr`], but a trailing symbolic link is the operand itself.
	pub fn lremovexattr<P: AsRef<[u8]>, N: AsRef<[u8]>>(&mut self, path: P, name: N) -> EResult<()> {
		let ino = self.xattr_target(path.as_ref(), false)?;
		self.do_removexattr(ino, name.as_ref())
	}

	/// Like [`Self::removexattr`], on the file behind the given file descriptor.
	pub fn fremovexattr<N: AsRef<[u8]>>(&mut self, fd: c_int, name: N) -> EResult<()> {
		let ino = self.fds.get_fd(fd)?.get_file().ino();
		self.do_removexattr(ino, name.as_ref())
	}
}
