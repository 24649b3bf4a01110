//! On-disk sample backed by a binary container file.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::{Result, SampleError};
use crate::value::Value;

use super::container::{self, BlockHeader};
use super::Sample;

/// Location of a block's payload.
#[derive(Debug)]
enum Entry {
    /// Payload still in the backing file.
    OnDisk { header: BlockHeader, offset: u64, len: u64 },
    /// Payload written by `put` and not yet flushed.
    Staged { header: BlockHeader, payload: Vec<u8> },
}

/// Sample stored in a self-describing binary file.
///
/// Only block headers are read when the file is opened; payloads are
/// loaded on access, so large samples are cheap to open. `put` stages the
/// new block in memory, and staged blocks are written back by
/// [`close`](Self::close) or, failing that, when the sample is dropped.
/// The file is replaced atomically on write-back.
///
/// # Examples
///
/// ```
/// use cutforge_core::{FileSample, Sample, VectorList};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("instance-0.cfs");
///
/// let mut sample = FileSample::create(&path).unwrap();
/// let rows = VectorList::Str(vec![Some(vec!["x".into(), "yz".into()]), None, Some(vec![])]);
/// sample.put_vector_list("names", rows.clone()).unwrap();
/// sample.close().unwrap();
///
/// let sample = FileSample::open(&path).unwrap();
/// assert_eq!(sample.get_vector_list("names").unwrap(), Some(rows));
/// ```
#[derive(Debug)]
pub struct FileSample {
    path: PathBuf,
    /// Seek-then-read on a shared handle must not interleave across threads.
    file: Mutex<File>,
    index: BTreeMap<String, Entry>,
    dirty: bool,
}

impl FileSample {
    /// Creates a new, empty sample file, truncating any existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut w = BufWriter::new(File::create(path)?);
        container::write_preamble(&mut w, 0)?;
        w.flush()?;
        drop(w);
        Self::open(path)
    }

    /// Opens an existing sample file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (file, index) = load(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            index,
            dirty: false,
        })
    }

    /// Opens `path`, runs `f` on the sample and closes it again.
    ///
    /// The sample is released on every exit path; when `f` fails, its
    /// error is returned after the sample has been dropped.
    pub fn with_file<R, E>(
        path: impl AsRef<Path>,
        f: impl FnOnce(&mut FileSample) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<SampleError>,
    {
        let mut sample = Self::open(path)?;
        let out = f(&mut sample)?;
        sample.close()?;
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes staged blocks back and releases the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    /// Writes staged blocks back to disk.
    ///
    /// Does nothing if no block was put since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let mut w = BufWriter::new(File::create(&tmp)?);
            let count = u32::try_from(self.index.len())
                .map_err(|_| SampleError::Unsupported("too many blocks".to_string()))?;
            container::write_preamble(&mut w, count)?;
            let mut src = self.file.get_mut().unwrap_or_else(PoisonError::into_inner);
            for (name, entry) in &self.index {
                match entry {
                    Entry::Staged { header, payload } => {
                        container::write_block_header(&mut w, name, header, payload.len() as u64)?;
                        w.write_all(payload)?;
                    }
                    Entry::OnDisk {
                        header,
                        offset,
                        len,
                    } => {
                        container::write_block_header(&mut w, name, header, *len)?;
                        src.seek(SeekFrom::Start(*offset))?;
                        let copied = std::io::copy(&mut (&mut src).take(*len), &mut w)?;
                        if copied != *len {
                            return Err(SampleError::Corrupt(format!(
                                "block `{name}` was truncated on disk"
                            )));
                        }
                    }
                }
            }
            w.flush()?;
            w.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        let (file, index) = load(&self.path)?;
        self.file = Mutex::new(file);
        self.index = index;
        self.dirty = false;
        Ok(())
    }

    fn read_payload(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let mut src = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        src.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        (&mut *src).take(len).read_to_end(&mut buf)?;
        if buf.len() as u64 != len {
            return Err(SampleError::Corrupt("truncated block payload".to_string()));
        }
        Ok(buf)
    }
}

/// Opens `path` and indexes its block headers.
fn load(path: &Path) -> Result<(File, BTreeMap<String, Entry>)> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);

    let count = container::read_preamble(&mut r)?;
    let mut index = BTreeMap::new();
    for _ in 0..count {
        let (name, header, len) = container::read_block_header(&mut r)?;
        let offset = r.stream_position()?;
        if offset.checked_add(len).map_or(true, |end| end > file_len) {
            return Err(SampleError::Corrupt(format!(
                "block `{name}` extends past end of file"
            )));
        }
        r.seek(SeekFrom::Current(len as i64))?;
        index.insert(
            name,
            Entry::OnDisk {
                header,
                offset,
                len,
            },
        );
    }
    Ok((r.into_inner(), index))
}

impl Sample for FileSample {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.index.get(key) {
            None => Ok(None),
            Some(Entry::Staged { header, payload }) => container::decode(header, payload).map(Some),
            Some(Entry::OnDisk {
                header,
                offset,
                len,
            }) => {
                let payload = self.read_payload(*offset, *len)?;
                container::decode(header, &payload).map(Some)
            }
        }
    }

    fn put(&mut self, key: &str, value: Value) -> Result<()> {
        let (header, payload) = container::encode(&value)?;
        self.index
            .insert(key.to_string(), Entry::Staged { header, payload });
        self.dirty = true;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }
}

impl Drop for FileSample {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), error = %e, "failed to write sample file");
        }
    }
}
