//! Sparse storage for regular files' contents.
//!
//! The content of a file is represented by a sorted list of non-overlapping, non-adjacent
//! extents. Gaps between extents are holes and read as zeros. The size of the file is
//! tracked separately so a file may end with a hole.

use crate::{errno, errno::EResult, limits::MAX_FILE_SIZE};
use core::cmp::{max, min};

/// A contiguous region of written bytes in a file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extent {
	/// Offset of the region in the file, in bytes.
	pub off: u64,
	/// The bytes of the region.
	pub data: Vec<u8>,
}

impl Extent {
	/// Returns the offset to the end of the region.
	pub fn end(&self) -> u64 {
		self.off + self.data.len() as u64
	}
}

/// The sparse content of a regular file.
#[derive(Clone, Debug, Default)]
pub struct Regular {
	/// Written regions, sorted by offset. No two regions overlap nor touch.
	extents: Vec<Extent>,
	/// The size of the file in bytes. Always greater than or equal to the end of the last
	/// extent.
	size: u64,
}

impl Regular {
	/// Returns the size of the file in bytes.
	pub fn size(&self) -> u64 {
		self.size
	}

	/// Returns the number of bytes actually stored.
	pub fn allocated(&self) -> u64 {
		self.extents.iter().map(|e| e.data.len() as u64).sum()
	}

	/// Returns an iterator over the file's extents.
	pub fn extents(&self) -> impl Iterator<Item = &Extent> {
		self.extents.iter()
	}

	/// Index of the first extent whose end is located after `off`.
	fn first_after(&self, off: u64) -> usize {
		self.extents.partition_point(|e| e.end() <= off)
	}

	/// Reads the content of the file at offset `off` into `buf`.
	///
	/// Holes read as zeros. On success, the function returns the number of bytes read,
	/// shortened at the end of the file.
	pub fn read(&self, off: u64, buf: &mut [u8]) -> usize {
		if off >= self.size {
			return 0;
		}
		let len = min(buf.len() as u64, self.size - off) as usize;
		let buf = &mut buf[..len];
		buf.fill(0);
		for ext in &self.extents[self.first_after(off)..] {
			if ext.off >= off + len as u64 {
				break;
			}
			let src_begin = max(off, ext.off);
			let src_end = min(off + len as u64, ext.end());
			let src = &ext.data[(src_begin - ext.off) as usize..(src_end - ext.off) as usize];
			buf[(src_begin - off) as usize..(src_end - off) as usize].copy_from_slice(src);
		}
		len
	}

	/// Writes `buf` to the file at offset `off`, extending the file if necessary.
	///
	/// If the end of the written region would exceed the maximum file size, the function
	/// returns [`errno::EFBIG`].
	pub fn write(&mut self, off: u64, buf: &[u8]) -> EResult<()> {
		if buf.is_empty() {
			return Ok(());
		}
		let end = off
			.checked_add(buf.len() as u64)
			.filter(|end| *end <= MAX_FILE_SIZE)
			.ok_or_else(|| errno!(EFBIG))?;
		// Locate the extents to coalesce with, including mere neighbours
		let first = self.extents.partition_point(|e| e.end() < off);
		let last = self.extents.partition_point(|e| e.off <= end);
		let (new_off, new_end) = match self.extents.get(first..last) {
			Some([head, .., tail]) => (min(off, head.off), max(end, tail.end())),
			Some([single]) => (min(off, single.off), max(end, single.end())),
			_ => (off, end),
		};
		let mut data = vec![0; (new_end - new_off) as usize];
		for ext in &self.extents[first..last] {
			data[(ext.off - new_off) as usize..(ext.end() - new_off) as usize]
				.copy_from_slice(&ext.data);
		}
		data[(off - new_off) as usize..(end - new_off) as usize].copy_from_slice(buf);
		self.extents.splice(
			first..last,
			[Extent {
				off: new_off,
				data,
			}],
		);
		self.size = max(self.size, end);
		Ok(())
	}

	/// Truncates or extends the file to `new_size` bytes.
	///
	/// When shrinking, the content past the cut is dropped. When extending, the new region
	/// is a hole.
	pub fn truncate(&mut self, new_size: u64) {
		if new_size < self.size {
			let i = self.first_after(new_size);
			self.extents.truncate(i + 1);
			if let Some(last) = self.extents.last_mut() {
				if last.end() > new_size {
					if last.off >= new_size {
						self.extents.pop();
					} else {
						last.data.truncate((new_size - last.off) as usize);
					}
				}
			}
		}
		self.size = new_size;
	}

	/// Reserves the range `[off, off + len)` as written storage, preserving existing data.
	///
	/// If `keep_size` is unset, the size of the file is extended to cover the range.
	pub fn allocate(&mut self, off: u64, len: u64, keep_size: bool) -> EResult<()> {
		let end = off
			.checked_add(len)
			.filter(|end| *end <= MAX_FILE_SIZE)
			.ok_or_else(|| errno!(EFBIG))?;
		// Past the current size with `keep_size`, the reservation is not observable
		let end = if keep_size {
			min(end, self.size)
		} else {
			end
		};
		if end <= off {
			return Ok(());
		}
		let mut buf = vec![0; (end - off) as usize];
		self.read(off, &mut buf);
		self.write(off, &buf)
	}

	/// Deallocates the range `[off, off + len)`, turning it into a hole. The size of the
	/// file is unchanged.
	pub fn punch_hole(&mut self, off: u64, len: u64) {
		let end = min(off.saturating_add(len), self.size);
		if end <= off {
			return;
		}
		let mut extents = Vec::with_capacity(self.extents.len() + 1);
		for ext in self.extents.drain(..) {
			if ext.end() <= off || ext.off >= end {
				extents.push(ext);
				continue;
			}
			if ext.off < off {
				extents.push(Extent {
					off: ext.off,
					data: ext.data[..(off - ext.off) as usize].to_vec(),
				});
			}
			if ext.end() > end {
				extents.push(Extent {
					off: end,
					data: ext.data[(end - ext.off) as usize..].to_vec(),
				});
			}
		}
		self.extents = extents;
	}

	/// Zeroes the range `[off, off + len)`.
	///
	/// If `keep_size` is unset and the range ends past the current size, the file is
	/// extended.
	pub fn zero_range(&mut self, off: u64, len: u64, keep_size: bool) -> EResult<()> {
		let end = off
			.checked_add(len)
			.filter(|end| *end <= MAX_FILE_SIZE)
			.ok_or_else(|| errno!(EFBIG))?;
		self.punch_hole(off, len);
		if !keep_size {
			self.size = max(self.size, end);
		}
		Ok(())
	}

	/// Removes the range `[off, off + len)` and shifts the following bytes left.
	///
	/// The size of the file decreases by `len`. The caller is responsible for the bound
	/// check `off + len < size`.
	pub fn collapse(&mut self, off: u64, len: u64) {
		let end = off + len;
		self.punch_hole(off, len);
		for ext in &mut self.extents {
			if ext.off >= end {
				ext.off -= len;
			}
		}
		self.size -= len;
		self.merge_adjacent();
	}

	/// Inserts `len` bytes of zeros at `off`, shifting the following bytes right.
	///
	/// The size of the file increases by `len`. The caller is responsible for the bound
	/// check `off < size`.
	pub fn insert(&mut self, off: u64, len: u64) -> EResult<()> {
		let new_size = self
			.size
			.checked_add(len)
			.filter(|end| *end <= MAX_FILE_SIZE)
			.ok_or_else(|| errno!(EFBIG))?;
		// Split any extent crossing the insertion point
		let i = self.first_after(off);
		let tail = match self.extents.get_mut(i) {
			Some(ext) if ext.off < off => Some(ext.data.split_off((off - ext.off) as usize)),
			_ => None,
		};
		if let Some(data) = tail {
			self.extents.insert(
				i + 1,
				Extent {
					off,
					data,
				},
			);
		}
		for ext in &mut self.extents {
			if ext.off >= off {
				ext.off += len;
			}
		}
		self.size = new_size;
		Ok(())
	}

	/// Returns the offset of the next data byte at or after `off`.
	///
	/// The end of the file counts as data. The caller is responsible for the bound check
	/// `off < size`.
	pub fn seek_data(&self, off: u64) -> u64 {
		match self.extents.get(self.first_after(off)) {
			Some(ext) => max(off, ext.off),
			None => self.size,
		}
	}

	/// Returns the offset of the next hole at or after `off`. The end of the file is
	/// always a hole.
	pub fn seek_hole(&self, off: u64) -> u64 {
		match self.extents.get(self.first_after(off)) {
			// `off` is inside the extent: the next hole starts at its end, since extents
			// are never adjacent
			Some(ext) if ext.off <= off => ext.end(),
			_ => off,
		}
	}

	/// Merges extents left adjacent by a shift operation.
	fn merge_adjacent(&mut self) {
		let mut i = 1;
		while i < self.extents.len() {
			if self.extents[i - 1].end() == self.extents[i].off {
				let data = self.extents.remove(i).data;
				self.extents[i - 1].data.extend(data);
			} else {
				i += 1;
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn read_all(c: &Regular) -> Vec<u8> {
		let mut buf = vec![0xaa; c.size() as usize];
		let len = c.read(0, &mut buf);
		buf.truncate(len);
		buf
	}

	#[test]
	fn write_read() {
		let mut c = Regular::default();
		c.write(0, b"hello").unwrap();
		assert_eq!(c.size(), 5);
		assert_eq!(read_all(&c), b"hello");
		// Read past the end
		let mut buf = [0; 16];
		assert_eq!(c.read(5, &mut buf), 0);
		assert_eq!(c.read(2, &mut buf), 3);
		assert_eq!(&buf[..3], b"llo");
	}

	#[test]
	fn write_hole() {
		let mut c = Regular::default();
		c.write(4, b"data").unwrap();
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"\0\0\0\0data");
		assert_eq!(c.allocated(), 4);
	}

	#[test]
	fn write_overlap_merge() {
		let mut c = Regular::default();
		c.write(0, b"aaaa").unwrap();
		c.write(8, b"bbbb").unwrap();
		assert_eq!(c.extents().count(), 2);
		// Bridge the two extents
		c.write(2, b"cccccccc").unwrap();
		assert_eq!(c.extents().count(), 1);
		assert_eq!(read_all(&c), b"aaccccccccbb");
	}

	#[test]
	fn write_adjacent_merge() {
		let mut c = Regular::default();
		c.write(0, b"aa").unwrap();
		c.write(2, b"bb").unwrap();
		assert_eq!(c.extents().count(), 1);
		assert_eq!(read_all(&c), b"aabb");
	}

	#[test]
	fn truncate_shrink_extend() {
		let mut c = Regular::default();
		c.write(0, b"hello world").unwrap();
		c.truncate(5);
		assert_eq!(c.size(), 5);
		assert_eq!(read_all(&c), b"hello");
		c.truncate(8);
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"hello\0\0\0");
		// The extension is a hole
		assert_eq!(c.allocated(), 5);
		c.truncate(0);
		assert_eq!(c.extents().count(), 0);
	}

	#[test]
	fn punch() {
		let mut c = Regular::default();
		c.write(0, b"abcdefgh").unwrap();
		c.punch_hole(2, 4);
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"ab\0\0\0\0gh");
		assert_eq!(c.allocated(), 4);
		// Punching past the end is a no-op
		c.punch_hole(16, 4);
		assert_eq!(c.size(), 8);
	}

	#[test]
	fn collapse() {
		let mut c = Regular::default();
		c.write(0, b"hello world").unwrap();
		c.collapse(2, 3);
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"he world");
		assert_eq!(c.extents().count(), 1);
	}

	#[test]
	fn collapse_over_hole() {
		let mut c = Regular::default();
		c.write(0, b"ab").unwrap();
		c.write(6, b"cd").unwrap();
		c.truncate(12);
		c.collapse(1, 4);
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"a\0cd\0\0\0\0");
	}

	#[test]
	fn insert() {
		let mut c = Regular::default();
		c.write(0, b"hello").unwrap();
		c.insert(2, 3).unwrap();
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"he\0\0\0llo");
	}

	#[test]
	fn zero_range() {
		let mut c = Regular::default();
		c.write(0, b"abcdefgh").unwrap();
		c.zero_range(2, 4, true).unwrap();
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"ab\0\0\0\0gh");
		// Extending variant
		c.zero_range(6, 6, false).unwrap();
		assert_eq!(c.size(), 12);
		assert_eq!(read_all(&c), b"ab\0\0\0\0\0\0\0\0\0\0");
	}

	#[test]
	fn allocate() {
		let mut c = Regular::default();
		c.write(0, b"ab").unwrap();
		c.allocate(0, 8, false).unwrap();
		assert_eq!(c.size(), 8);
		assert_eq!(read_all(&c), b"ab\0\0\0\0\0\0");
		// The whole range is storage now
		assert_eq!(c.allocated(), 8);
		// `keep_size` does not change the size
		c.allocate(0, 16, true).unwrap();
		assert_eq!(c.size(), 8);
	}

	#[test]
	fn seek_data_hole() {
		let mut c = Regular::default();
		c.write(4, b"data").unwrap();
		c.truncate(16);
		assert_eq!(c.seek_data(0), 4);
		assert_eq!(c.seek_data(5), 5);
		// Trailing hole: the end of file counts as data
		assert_eq!(c.seek_data(9), 16);
		assert_eq!(c.seek_hole(0), 0);
		assert_eq!(c.seek_hole(5), 8);
		// A file with no hole before EOF
		let mut full = Regular::default();
		full.write(0, b"xyz").unwrap();
		assert_eq!(full.seek_hole(0), 3);
		assert_eq!(full.seek_data(1), 1);
	}

	#[test]
	fn write_efbig() {
		let mut c = Regular::default();
		assert_eq!(c.write(u64::MAX - 1, b"xy").unwrap_err(), errno!(EFBIG));
		assert_eq!(c.write(MAX_FILE_SIZE, b"x").unwrap_err(), errno!(EFBIG));
	}
}
