//! Memory-mapped loader.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use super::{decode_utf8_json, LoaderOutput, ProgressReporter, StandardLoader, Strategy};
use crate::error::LoadResult;
use crate::json::JsonCodec;

/// Creates read-only mappings.
///
/// Injected so tests can make mapping fail deterministically.
pub trait MemoryMapper: Send + Sync {
    fn map(&self, file: &File) -> io::Result<Mmap>;
}

impl<M: MemoryMapper + ?Sized> MemoryMapper for Arc<M> {
    fn map(&self, file: &File) -> io::Result<Mmap> {
        (**self).map(file)
    }
}

/// Maps files through the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsMapper;

impl MemoryMapper for OsMapper {
    fn map(&self, file: &File) -> io::Result<Mmap> {
        // Safety: the map is read-only and never outlives the loader call. A
        // concurrent writer truncating the file can still fault the reader;
        // callers accept that in exchange for zero-copy reads.
        #[allow(unsafe_code)]
        unsafe {
            Mmap::map(file)
        }
    }
}

/// Maps the file and decodes the mapped bytes in place.
///
/// Progress: `0.1` after mapping, `1.0` after decode.
///
/// If opening or mapping the file fails for any reason the load is retried
/// with [`StandardLoader`]. Encoding and decode errors in the mapped bytes are
/// data problems and are returned as-is.
pub struct MmapLoader<M: MemoryMapper> {
    codec: JsonCodec,
    mapper: M,
    fallback: StandardLoader,
}

impl<M: MemoryMapper> MmapLoader<M> {
    pub fn new(codec: JsonCodec, mapper: M) -> Self {
        let fallback = StandardLoader::new(codec.clone());
        Self {
            codec,
            mapper,
            fallback,
        }
    }

    pub fn load(&self, path: &Path, progress: &mut ProgressReporter) -> LoadResult<LoaderOutput> {
        let mmap = match self.try_map(path) {
            Ok(mmap) => mmap,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Memory mapping failed, falling back to standard load"
                );
                return self.fallback.load(path, progress);
            }
        };
        progress.report(0.1);

        let value = decode_utf8_json(&self.codec, &mmap, path, Strategy::MemoryMapped)?;
        progress.finish();

        Ok(LoaderOutput {
            value,
            bytes_read: mmap.len() as u64,
            strategy_used: Strategy::MemoryMapped,
        })
    }

    fn try_map(&self, path: &Path) -> io::Result<Mmap> {
        let file = File::open(path)?;
        // Empty maps are rejected on several platforms.
        if file.metadata()?.len() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty file",
            ));
        }
        self.mapper.map(&file)
    }
}
