//! The `utimensat` system call family changes the timestamps of a file.

use super::util::at::{AT_FDCWD, AT_SYMLINK_NOFOLLOW};
use crate::{
	errno,
	errno::EResult,
	file::{path::PathBuf, vfs::Resolved, INode},
	time,
	time::{Timespec, Timeval, Utimbuf, UTIME_NOW, UTIME_OMIT},
	MemFS,
};
use std::ffi::c_int;

/// Checks the validity of a `utimensat` timestamp.
fn check_time(ts: &Timespec) -> EResult<()> {
	match ts.tv_nsec {
		UTIME_NOW | UTIME_OMIT => Ok(()),
		0..=999_999_999 => Ok(()),
		_ => Err(errno!(EINVAL)),
	}
}

impl MemFS {
	fn do_utimens(&mut self, ino: INode, times: Option<&[Timespec; 2]>) -> EResult<()> {
		// A missing `times` argument is equivalent to two `UTIME_NOW` entries
		const NOW: Timespec = Timespec {
			tv_sec: 0,
			tv_nsec: UTIME_NOW,
		};
		let now = time::now();
		let (atime, mtime) = match times {
			Some([atime, mtime]) => (*atime, *mtime),
			None => (NOW, NOW),
		};
		check_time(&atime)?;
		check_time(&mtime)?;
		let node = self.nodes.get_mut(ino)?;
		let stat = node.stat();
		// Setting the timestamps to the current time only requires write access; setting
		// explicit values requires ownership
		let explicit = atime.tv_nsec != UTIME_NOW && atime.tv_nsec != UTIME_OMIT
			|| mtime.tv_nsec != UTIME_NOW && mtime.tv_nsec != UTIME_OMIT;
		if explicit {
			if !self.ap.can_set_file_permissions(&stat) {
				return Err(errno!(EPERM));
			}
		} else if !self.ap.can_write_file(&stat) && !self.ap.can_set_file_permissions(&stat) {
			return Err(errno!(EACCES));
		}
		match atime.tv_nsec {
			UTIME_OMIT => {}
			UTIME_NOW => node.atime = now,
			_ => node.atime = atime,
		}
		match mtime.tv_nsec {
			UTIME_OMIT => {}
			UTIME_NOW => node.mtime = now,
			_ => node.mtime = mtime,
		}
		node.ctime = now;
		Ok(())
	}

	/// The `utimensat` syscall changes the access and modification timestamps of the file
	/// at the given path, relative to `dirfd`.
	///
	/// `times` holds the new access and modification timestamps, in this order; `None`
	/// sets both to the current time. A `tv_nsec` of [`UTIME_NOW`] selects the current
	/// time, [`UTIME_OMIT`] leaves the timestamp unchanged.
	pub fn utimensat<P: AsRef<[u8]>>(
		&mut self,
		dirfd: c_int,
		path: P,
		times: Option<&[Timespec; 2]>,
		flags: c_int,
	) -> EResult<()> {
		if flags & !AT_SYMLINK_NOFOLLOW != 0 {
			return Err(errno!(EINVAL));
		}
		let path = PathBuf::try_from(path.as_ref())?;
		let Resolved::Found(ino) = self.resolve_at(dirfd, &path, flags, false, true)? else {
			return Err(errno!(ENOENT));
		};
		self.do_utimens(ino, times)
	}

	/// The `futimesat` syscall changes the file timestamps with microsecond precision.
	pub fn futimesat<P: AsRef<[u8]>>(
		&mut self,
		dirfd: c_int,
		path: P,
		times: Option<&[Timeval; 2]>,
	) -> EResult<()> {
		let times = times
			.map(|[atime, mtime]| -> EResult<[Timespec; 2]> {
				if !(0..=999_999).contains(&atime.tv_usec) || !(0..=999_999).contains(&mtime.tv_usec)
				{
					return Err(errno!(EINVAL));
				}
				Ok([atime.to_timespec(), mtime.to_timespec()])
			})
			.transpose()?;
		self.utimensat(dirfd, path, times.as_ref(), 0)
	}

	/// The `utimes` syscall changes the file timestamps with microsecond precision,
	/// relative to the current working directory.
	pub fn utimes<P: AsRef<[u8]>>(&mut self, path: P, times: Option<&[Timeval; 2]>) -> EResult<()> {
		self.futimesat(AT_FDCWD, path, times)
	}

	/// The `utime` syscall changes the file timestamps with second precision, relative to
	/// the current working directory.
	pub fn utime<P: AsRef<[u8]>>(&mut self, path: P, times: Option<&Utimbuf>) -> EResult<()> {
		let times = times.map(|t| {
			[
				Timespec::from_sec(t.actime),
				Timespec::from_sec(t.modtime),
			]
		});
		self.utimensat(AT_FDCWD, path, times.as_ref(), 0)
	}
}
