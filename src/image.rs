use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

use crate::error::LoadError;
use crate::memory::MEMORY_SIZE;

/// Persisted program: a load origin followed by the words placed from it.
///
/// On disk every word is big-endian, regardless of host byte order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ObjectImage {
    origin: u16,
    words: Vec<u16>,
}

impl ObjectImage {
    pub fn new(origin: u16, words: Vec<u16>) -> Self {
        ObjectImage { origin, words }
    }

    /// Open and decode an object file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, LoadError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() % 2 != 0 {
            return Err(LoadError::Misaligned { len: bytes.len() });
        }
        let mut words = bytes
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]));
        let origin = words.next().ok_or(LoadError::Empty)?;
        Ok(ObjectImage {
            origin,
            words: words.collect(),
        })
    }

    /// Encode as origin then program words, big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.words.len() + 1) * 2);
        bytes.extend_from_slice(&self.origin.to_be_bytes());
        for word in &self.words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    pub fn origin(&self) -> u16 {
        self.origin
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Memory cells covered by this image.
    ///
    /// Programs are never wrapped around the top of the address space.
    pub fn range(&self) -> Result<Range<usize>, LoadError> {
        let start = self.origin as usize;
        let end = start + self.words.len();
        if end > MEMORY_SIZE {
            return Err(LoadError::Overflow {
                origin: self.origin,
                len: self.words.len(),
            });
        }
        Ok(start..end)
    }
}
