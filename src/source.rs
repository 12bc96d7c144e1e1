//! Owned encoded byte sources.
//!
//! Every constructor produces an [`EncodedSource`] that owns its bytes outright.
//! Construction of a [`RegionDecoder`](crate::RegionDecoder) moves the source
//! into the selected backend, or drops it when construction fails.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::RegionError;

/// A platform asset whose contents can be exposed as one contiguous buffer.
pub trait Asset {
    /// The asset's full contents, or `None` if it cannot be buffered.
    fn buffer(&mut self) -> Option<&[u8]>;
}

/// An owned, rewindable encoded image stream.
pub struct EncodedSource {
    data: Box<dyn AsRef<[u8]> + Send + Sync>,
}

impl EncodedSource {
    /// Take ownership of any byte container without copying.
    pub fn from_owner<T>(owner: T) -> Self
    where
        T: AsRef<[u8]> + Send + Sync + 'static,
    {
        Self {
            data: Box::new(owner),
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::from_owner(data)
    }

    /// Copy `length` bytes starting at `offset` out of a borrowed range.
    pub fn from_bytes(bytes: &[u8], offset: usize, length: usize) -> Result<Self, RegionError> {
        let range = offset
            .checked_add(length)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| {
                RegionError::InvalidDescriptor(format!(
                    "range {offset}+{length} outside buffer of {} bytes",
                    bytes.len()
                ))
            })?;
        Ok(Self::from_vec(range.to_vec()))
    }

    /// Read a whole open file, from its first byte, into an owned copy.
    ///
    /// The file's cursor is rewound first, so earlier reads by the caller
    /// don't matter. It is left at end of file.
    pub fn from_file(file: &File) -> Result<Self, RegionError> {
        let meta = file
            .metadata()
            .map_err(|e| RegionError::InvalidDescriptor(format!("broken file descriptor: {e}")))?;
        let mut reader = file;
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| RegionError::InvalidDescriptor(format!("cannot rewind descriptor: {e}")))?;
        let mut data = Vec::with_capacity(meta.len().try_into().unwrap_or(0));
        reader.read_to_end(&mut data)?;
        Ok(Self::from_vec(data))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RegionError::InvalidDescriptor(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_file(&file)
    }

    /// Copy a generic readable stream into an owned buffer.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, RegionError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_vec(data))
    }

    /// Copy an asset's contents into an owned buffer.
    pub fn from_asset(asset: &mut impl Asset) -> Result<Self, RegionError> {
        let buf = asset
            .buffer()
            .ok_or_else(|| RegionError::InvalidDescriptor("asset buffer unavailable".into()))?;
        Ok(Self::from_vec(buf.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        (*self.data).as_ref()
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for EncodedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedSource")
            .field("len", &self.len())
            .finish()
    }
}

impl From<Vec<u8>> for EncodedSource {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}
