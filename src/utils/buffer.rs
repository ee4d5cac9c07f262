//! Byte buffers behind the postings blob

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::errors::Error;

/// Read access to the postings blob, either resident or memory-mapped
pub trait Buffer: Send + Sync {
    fn data(&self) -> &[u8];

    fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.data()[start..end]
    }
}

/// Stores the data in memory
pub struct MemoryBuffer {
    data: Vec<u8>,
}

impl MemoryBuffer {
    pub fn new(path: &Path) -> Result<Self, Error> {
        let mut file = File::options().read(true).open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self { data })
    }

}

impl Buffer for MemoryBuffer {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Uses a memory map
pub struct MmapBuffer {
    mmap: Mmap,
}

impl MmapBuffer {
    pub fn new(path: &Path) -> Result<Self, Error> {
        let file = File::options().read(true).open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(Self { mmap })
    }
}

impl Buffer for MmapBuffer {
    fn data(&self) -> &[u8] {
        &self.mmap
    }
}
