//! Snapshot round-trip tests.

use memfs::errno;
use memfs::file::open_file::{O_CREAT, O_RDONLY, O_RDWR};
use memfs::file::{S_IFLNK, S_IFMT};
use memfs::syscall::fallocate::{FALLOC_FL_KEEP_SIZE, FALLOC_FL_PUNCH_HOLE};
use memfs::MemFS;

/// Builds an instance exercising every serializable feature.
fn build() -> MemFS {
	let mut fs = MemFS::with_ids(1000, 1000);
	fs.umask(0o027);
	fs.mkdir("/dir", 0o750).unwrap();
	fs.mkdir("/dir/sub", 0o700).unwrap();
	let fd = fs.open("/dir/file", O_CREAT | O_RDWR, 0o640).unwrap();
	fs.write(fd, b"hello snapshot").unwrap();
	// A hole in the middle
	fs.fallocate(fd, FALLOC_FL_PUNCH_HOLE | FALLOC_FL_KEEP_SIZE, 2, 4)
		.unwrap();
	fs.close(fd).unwrap();
	// A sparse tail
	fs.truncate("/dir/file", 64).unwrap();
	fs.link("/dir/file", "/dir/hard").unwrap();
	fs.symlink("/dir/file", "/dir/sym").unwrap();
	fs.setxattr("/dir/file", "user.one", b"1", 0).unwrap();
	fs.setxattr("/dir/file", "user.two", b"22", 0).unwrap();
	fs.chdir("/dir/sub").unwrap();
	fs
}

fn read_all(fs: &mut MemFS, path: &str) -> Vec<u8> {
	let fd = fs.open(path, O_RDONLY, 0).unwrap();
	let mut buf = vec![0; 256];
	let len = fs.read(fd, &mut buf).unwrap();
	fs.close(fd).unwrap();
	buf.truncate(len);
	buf
}

#[test]
fn round_trip() {
	let mut fs = build();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("fs.snap");
	fs.dump_to(&path).unwrap();
	let mut restored = MemFS::load_from(&path).unwrap();
	// Same bytes, holes included
	assert_eq!(read_all(&mut fs, "/dir/file"), read_all(&mut restored, "/dir/file"));
	let expected = {
		let mut v = b"he".to_vec();
		v.extend_from_slice(&[0; 4]);
		v.extend_from_slice(b"snapshot");
		v.resize(64, 0);
		v
	};
	assert_eq!(read_all(&mut restored, "/dir/file"), expected);
	// Inode numbers are preserved
	assert_eq!(
		fs.stat("/dir/file").unwrap().st_ino,
		restored.stat("/dir/file").unwrap().st_ino
	);
	// Hard links still share an inode
	let a = restored.stat("/dir/file").unwrap();
	let b = restored.stat("/dir/hard").unwrap();
	assert_eq!(a.st_ino, b.st_ino);
	assert_eq!(a.st_nlink, 2);
	// Ownership is rebound to the restoring identity
	let ap = restored.access_profile();
	assert_eq!(a.st_uid, ap.uid);
	assert_eq!(a.st_gid, ap.gid);
	assert_eq!(restored.stat("/dir").unwrap().st_uid, ap.uid);
	// A write through one name is visible through the other
	let fd = restored.open("/dir/hard", O_RDWR, 0).unwrap();
	restored.pwrite(fd, b"XX", 0).unwrap();
	restored.close(fd).unwrap();
	assert_eq!(&read_all(&mut restored, "/dir/file")[..2], b"XX");
	// The symbolic link survived
	assert_eq!(
		restored.lstat("/dir/sym").unwrap().st_mode & S_IFMT,
		S_IFLNK
	);
	assert_eq!(restored.readlink("/dir/sym").unwrap(), b"/dir/file");
	// Extended attributes, in order
	assert_eq!(
		restored.listxattr("/dir/file").unwrap(),
		vec![b"user.one".to_vec(), b"user.two".to_vec()]
	);
	assert_eq!(restored.getxattr("/dir/file", "user.two").unwrap(), b"22");
	// The cwd and umask survived
	assert_eq!(restored.getcwd().unwrap().as_bytes(), b"/dir/sub");
	assert_eq!(restored.umask(0o022), 0o027);
	// Permissions survived
	assert_eq!(restored.stat("/dir").unwrap().st_mode & 0o7777, 0o750);
	// New inodes do not collide with restored ones
	let before: Vec<u64> = {
		let fd = restored.open("/dir", O_RDONLY, 0).unwrap();
		let ents = restored.getdents_all(fd).unwrap();
		restored.close(fd).unwrap();
		ents.iter().map(|e| e.d_ino).collect()
	};
	restored.mkdir("/fresh", 0o755).unwrap();
	let fresh = restored.stat("/fresh").unwrap().st_ino;
	assert!(!before.contains(&fresh));
}

#[test]
fn directory_listing_preserved() {
	let mut fs = MemFS::with_ids(1000, 1000);
	fs.mkdir("/d", 0o755).unwrap();
	for name in ["ccc", "aaa", "bbb"] {
		let path = format!("/d/{name}");
		let fd = fs.creat(path.as_bytes(), 0o644).unwrap();
		fs.close(fd).unwrap();
	}
	let buf = fs.dump();
	let mut restored = MemFS::load(&buf).unwrap();
	let fd = restored.open("/d", O_RDONLY, 0).unwrap();
	let names: Vec<_> = restored
		.getdents_all(fd)
		.unwrap()
		.into_iter()
		.map(|e| e.d_name)
		.collect();
	restored.close(fd).unwrap();
	assert_eq!(
		names,
		vec![
			b".".to_vec(),
			b"..".to_vec(),
			b"ccc".to_vec(),
			b"aaa".to_vec(),
			b"bbb".to_vec(),
		]
	);
}

#[test]
fn rejects_malformed() {
	let fs = build();
	let buf = fs.dump();
	// Bad magic
	let mut bad = buf.clone();
	bad[0] = b'X';
	assert_eq!(MemFS::load(&bad).unwrap_err(), errno!(EINVAL));
	// Unknown version
	let mut bad = buf.clone();
	bad[4] = 0xff;
	assert_eq!(MemFS::load(&bad).unwrap_err(), errno!(EINVAL));
	// Truncated stream
	for len in [3, 8, 20, buf.len() / 2, buf.len() - 1] {
		assert_eq!(MemFS::load(&buf[..len]).unwrap_err(), errno!(EINVAL));
	}
	// Trailing garbage
	let mut bad = buf.clone();
	bad.push(0);
	assert_eq!(MemFS::load(&bad).unwrap_err(), errno!(EINVAL));
}

#[test]
fn missing_host_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("absent.snap");
	let err = MemFS::load_from(&path).unwrap_err();
	assert_eq!(err, errno!(ENOENT));
}

#[test]
fn dangling_cwd_restores_to_root() {
	let mut fs = MemFS::with_ids(1000, 1000);
	fs.mkdir("/gone", 0o755).unwrap();
	fs.chdir("/gone").unwrap();
	fs.rmdir("/gone").unwrap();
	let buf = fs.dump();
	let restored = MemFS::load(&buf).unwrap();
	assert_eq!(restored.getcwd().unwrap().as_bytes(), b"/");
}
