//! An in-memory file with the read/seek behaviour of a real one.

use std::fs::Permissions;
use std::io::{self, Read, Seek, SeekFrom};
use std::time::SystemTime;

/// Synthesized file contents (an injected or shell-wrapped page) plus the
/// metadata of the file they were built from.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    name: String,
    data: Vec<u8>,
    permissions: Option<Permissions>,
    modified: Option<SystemTime>,
    offset: u64,
}

impl VirtualFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            permissions: None,
            modified: None,
            offset: 0,
        }
    }

    pub fn with_metadata(
        mut self,
        permissions: Option<Permissions>,
        modified: Option<SystemTime>,
    ) -> Self {
        self.permissions = permissions;
        self.modified = modified;
        self
    }

    /// Base name of the file.
    pub fn name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn path(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn permissions(&self) -> Option<&Permissions> {
        self.permissions.as_ref()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn invalid(&self, op: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{op} {}: invalid offset", self.name),
        )
    }
}

impl Read for VirtualFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.len();
        if self.offset >= len {
            return Ok(0);
        }
        let start = self.offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.offset += n as u64;
        Ok(n)
    }
}

impl Seek for VirtualFile {
    /// Offsets before the start or past the end are rejected and leave the
    /// position unchanged.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => (0i128, i128::from(offset)),
            SeekFrom::Current(delta) => (i128::from(self.offset), i128::from(delta)),
            SeekFrom::End(delta) => (i128::from(self.len()), i128::from(delta)),
        };
        let target = base + delta;
        if target < 0 || target > i128::from(self.len()) {
            return Err(self.invalid("seek"));
        }
        self.offset = target as u64;
        Ok(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> VirtualFile {
        VirtualFile::new("docs/index.html", b"0123456789".to_vec())
    }

    #[test]
    fn test_name_is_base_name() {
        let f = file();
        assert_eq!(f.name(), "index.html");
        assert_eq!(f.path(), "docs/index.html");
    }

    #[test]
    fn test_short_read_then_eof() {
        let mut f = file();
        let mut buf = [0u8; 4];
        f.seek(SeekFrom::Start(8)).unwrap();
        assert_eq!(f.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(f.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_variants() {
        let mut f = file();
        assert_eq!(f.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(f.seek(SeekFrom::Current(2)).unwrap(), 5);
        assert_eq!(f.seek(SeekFrom::Current(-5)).unwrap(), 0);
        assert_eq!(f.seek(SeekFrom::End(-1)).unwrap(), 9);
        assert_eq!(f.seek(SeekFrom::End(0)).unwrap(), 10);

        let mut rest = String::new();
        f.seek(SeekFrom::End(-3)).unwrap();
        f.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "789");
    }

    #[test]
    fn test_seek_out_of_range_is_rejected() {
        let mut f = file();
        f.seek(SeekFrom::Start(4)).unwrap();
        assert_eq!(
            f.seek(SeekFrom::Current(-5)).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert!(f.seek(SeekFrom::Start(11)).is_err());
        assert!(f.seek(SeekFrom::End(1)).is_err());
        // Position survives a failed seek.
        assert_eq!(f.stream_position().unwrap(), 4);
    }

    #[test]
    fn test_read_to_end_matches_data() {
        let mut f = file();
        let mut out = Vec::new();
        f.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"0123456789");
    }
}
