use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{FetchError, Result};
use crate::location::ObjectLocation;

/// What a completed fetch wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub location: ObjectLocation,
    pub destination: PathBuf,
    pub bytes: u64,
    /// Hex-encoded SHA-256 of the written bytes.
    pub sha256: String,
}

/// A source of remote objects.
pub trait ObjectStore {
    /// Copy the object at `location` to `destination`, replacing any existing file.
    fn fetch(&self, location: &ObjectLocation, destination: &Path) -> Result<FetchReport>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

impl<T: ObjectStore + ?Sized> ObjectStore for Box<T> {
    fn fetch(&self, location: &ObjectLocation, destination: &Path) -> Result<FetchReport> {
        (**self).fetch(location, destination)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Stream `reader` into a temp file beside `destination`, then rename it into place.
///
/// The destination is only replaced once every byte has been written, so a
/// failed transfer leaves any previous file untouched.
pub(crate) fn write_atomically<R: Read>(
    reader: &mut R,
    location: &ObjectLocation,
    destination: &Path,
) -> Result<FetchReport> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|source| FetchError::destination(&parent, source))?;
    let temp =
        NamedTempFile::new_in(&parent).map_err(|source| FetchError::destination(&parent, source))?;

    let mut writer = HashingWriter {
        inner: temp,
        hasher: Sha256::new(),
    };
    let mut buffer = vec![0u8; 64 * 1024];
    let mut bytes = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(FetchError::Interrupted {
                    location: location.to_string(),
                    source,
                });
            }
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|source| FetchError::destination(destination, source))?;
        bytes += read as u64;
    }
    writer
        .flush()
        .map_err(|source| FetchError::destination(destination, source))?;

    let HashingWriter { inner: temp, hasher } = writer;
    temp.as_file()
        .sync_all()
        .map_err(|source| FetchError::destination(destination, source))?;
    temp.persist(destination)
        .map_err(|err| FetchError::destination(destination, err.error))?;

    Ok(FetchReport {
        location: location.clone(),
        destination: destination.to_path_buf(),
        bytes,
        sha256: hex::encode(hasher.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("nested").join("out.csv");
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, "stale contents that are longer").unwrap();

        let location = ObjectLocation::new("bucket", "a.csv").unwrap();
        let report =
            write_atomically(&mut "a,b\n1,2\n".as_bytes(), &location, &destination).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), "a,b\n1,2\n");
        assert_eq!(report.bytes, 8);
        assert_eq!(report.sha256.len(), 64);
    }

    #[test]
    fn interrupted_reader_keeps_previous_file() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.csv");
        fs::write(&destination, "previous").unwrap();
        let location = ObjectLocation::new("bucket", "a.csv").unwrap();

        let err = write_atomically(&mut Failing, &location, &destination).unwrap_err();
        assert!(matches!(err, FetchError::Interrupted { .. }));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "previous");
    }
}
