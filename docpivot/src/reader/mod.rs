//! Adaptive document loading.
//!
//! [`AdaptiveDocumentLoader`] ties the pieces together:
//!
//! ```text
//! load(request)
//!   │
//!   ├─ stat + open check ──────────► FileNotFound / FileIsDirectory / PermissionDenied
//!   ├─ DocumentCache::lookup ──────► hit: return (no progress reported)
//!   ├─ choose_strategy(size, ...)
//!   ├─ Standard | Streaming | Mmap ─► ParsedValue
//!   ├─ SchemaValidator::validate
//!   ├─ DocumentBuilder::build
//!   └─ DocumentCache::store
//! ```
//!
//! The loader is synchronous and `Sync`; share it behind an `Arc` and call it
//! from as many threads as needed. [`AdaptiveDocumentLoader::load_async`]
//! runs a load on Tokio's blocking pool for async callers.
//!
//! # Example
//!
//! ```ignore
//! use docpivot::reader::{AdaptiveDocumentLoader, LoadRequest, LoaderConfig};
//!
//! let loader = AdaptiveDocumentLoader::new(LoaderConfig::default())?;
//! let document = loader.load(
//!     LoadRequest::new("report.docling.json").with_progress(|p| println!("{:.0}%", p * 100.0)),
//! )?;
//! println!("{} ({} nodes)", document.name, document.node_count());
//! ```

mod config;
mod request;

use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

pub use config::{LoaderConfig, DEFAULT_LARGE_FILE_THRESHOLD_BYTES, DEFAULT_STREAMING_THRESHOLD_BYTES};
pub use request::LoadRequest;

use crate::cache::{CacheStats, DocumentCache, FileIdentity, FileSystem, OsFileSystem};
use crate::config::ConfigError;
use crate::document::{DoclingDocument, DoclingDocumentBuilder, DocumentBuilder};
use crate::error::{LoadError, LoadResult};
use crate::json::JsonCodec;
use crate::loader::{
    choose_strategy, LoaderOutput, MemoryMapper, MmapLoader, OsMapper, ProgressReporter,
    StandardLoader, Strategy, StreamingLoader,
};
use crate::schema::{SchemaValidator, SchemaViolation};

/// Cache state for operational introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    pub enabled: bool,
    pub size: usize,
}

/// Load counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub standard_loads: u64,
    pub streaming_loads: u64,
    pub mmap_loads: u64,
    /// Mmap loads that fell back to a standard read.
    pub mmap_fallbacks: u64,
    pub cache_hits: u64,
    pub failures: u64,
    pub cache: CacheStats,
}

impl LoaderStats {
    /// Loads that actually read the file.
    pub fn loads_from_disk(&self) -> u64 {
        self.standard_loads + self.streaming_loads + self.mmap_loads
    }
}

#[derive(Default)]
struct Counters {
    standard: AtomicU64,
    streaming: AtomicU64,
    mmap: AtomicU64,
    mmap_fallbacks: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

/// Loads Docling JSON files, choosing an I/O strategy by size and caching
/// results by file identity.
pub struct AdaptiveDocumentLoader {
    config: LoaderConfig,
    codec: JsonCodec,
    fs: Arc<dyn FileSystem>,
    standard: StandardLoader,
    streaming: StreamingLoader,
    mmap: MmapLoader<Arc<dyn MemoryMapper>>,
    validator: SchemaValidator,
    builder: Arc<dyn DocumentBuilder>,
    cache: DocumentCache,
    counters: Counters,
}

impl AdaptiveDocumentLoader {
    /// Create a loader with the production filesystem, mapper and builder.
    pub fn new(config: LoaderConfig) -> Result<Self, ConfigError> {
        Self::with_parts(
            config,
            Arc::new(OsFileSystem),
            Arc::new(OsMapper),
            Arc::new(DoclingDocumentBuilder),
        )
    }

    /// Create a loader with injected collaborators.
    pub fn with_parts(
        config: LoaderConfig,
        fs: Arc<dyn FileSystem>,
        mapper: Arc<dyn MemoryMapper>,
        builder: Arc<dyn DocumentBuilder>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, fs, mapper, builder))
    }

    /// A loader with default settings.
    pub fn with_defaults() -> Self {
        Self::assemble(
            LoaderConfig::default(),
            Arc::new(OsFileSystem),
            Arc::new(OsMapper),
            Arc::new(DoclingDocumentBuilder),
        )
    }

    /// Process-wide default loader, created on first use.
    pub fn global() -> &'static AdaptiveDocumentLoader {
        static GLOBAL: OnceLock<AdaptiveDocumentLoader> = OnceLock::new();
        GLOBAL.get_or_init(Self::with_defaults)
    }

    fn assemble(
        config: LoaderConfig,
        fs: Arc<dyn FileSystem>,
        mapper: Arc<dyn MemoryMapper>,
        builder: Arc<dyn DocumentBuilder>,
    ) -> Self {
        let codec = JsonCodec::select(config.use_fast_json_backend);
        Self {
            standard: StandardLoader::new(codec.clone()),
            streaming: StreamingLoader::new(codec.clone(), config.chunk_size),
            mmap: MmapLoader::new(codec.clone(), mapper),
            validator: SchemaValidator::docling(),
            cache: DocumentCache::new(Arc::clone(&fs)),
            counters: Counters::default(),
            codec,
            fs,
            builder,
            config,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Name of the JSON backend in use.
    pub fn json_backend(&self) -> &'static str {
        self.codec.name()
    }

    /// Load a document.
    ///
    /// Returns a shared handle; cached documents are shared with the cache.
    pub fn load(&self, request: impl Into<LoadRequest>) -> LoadResult<Arc<DoclingDocument>> {
        let request = request.into();
        let span = tracing::debug_span!("load_document", path = %request.path.display());
        let _guard = span.enter();
        let started = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.load_inner(&request)))
            .unwrap_or_else(|payload| Err(LoadError::unexpected(panic_message(payload.as_ref()))));

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(document) => {
                tracing::info!(
                    path = %request.path.display(),
                    name = %document.name,
                    duration_ms = format_args!("{:.2}", elapsed_ms),
                    "Loaded document"
                );
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    path = %request.path.display(),
                    code = e.code(),
                    error = %e,
                    duration_ms = format_args!("{:.2}", elapsed_ms),
                    "Failed to load document"
                );
            }
        }
        result
    }

    /// Load `path` with the configured defaults and no progress sink.
    pub fn load_path(&self, path: impl AsRef<Path>) -> LoadResult<Arc<DoclingDocument>> {
        self.load(LoadRequest::new(path.as_ref()))
    }

    /// Load several files, keeping going after failures.
    pub fn load_many<I, P>(&self, paths: I) -> Vec<(PathBuf, LoadResult<Arc<DoclingDocument>>)>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .map(|path| {
                let path = path.into();
                let result = self.load(LoadRequest::new(path.clone()));
                (path, result)
            })
            .collect()
    }

    /// Run [`load`](Self::load) on Tokio's blocking pool.
    ///
    /// Dropping the returned future detaches the load; the blocking call still
    /// releases its file handle and mapping when it finishes.
    pub async fn load_async(
        self: Arc<Self>,
        request: LoadRequest,
    ) -> LoadResult<Arc<DoclingDocument>> {
        tokio::task::spawn_blocking(move || self.load(request))
            .await
            .map_err(|e| LoadError::unexpected(format!("load task failed: {}", e)))?
    }

    fn load_inner(&self, request: &LoadRequest) -> LoadResult<Arc<DoclingDocument>> {
        let path = request.path.as_path();

        let stat = self
            .fs
            .stat(path)
            .map_err(|e| LoadError::from_stat(path.to_path_buf(), e))?;
        if stat.is_dir {
            return Err(LoadError::FileIsDirectory {
                path: path.to_path_buf(),
            });
        }
        check_readable(path)?;

        if self.config.enable_caching {
            if let Some(document) = self.cache.lookup(path) {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(path = %path.display(), "Served from cache");
                return Ok(document);
            }
        }

        let identity = FileIdentity::from_stat(path, &stat);
        let strategy = choose_strategy(
            stat.size_bytes,
            request.force_streaming.unwrap_or(self.config.force_streaming),
            request.force_standard.unwrap_or(self.config.force_standard),
            self.config.streaming_threshold_bytes,
            self.config.large_file_threshold_bytes,
        );
        tracing::debug!(
            path = %path.display(),
            size_bytes = stat.size_bytes,
            %strategy,
            "Chose loading strategy"
        );

        let mut progress = ProgressReporter::new(request.progress.clone());
        let output = self.run_strategy(strategy, path, &mut progress)?;

        self.validator.validate(&output.value)?;
        let document = self
            .builder
            .build(output.value)
            .map_err(|e| SchemaViolation::InvalidDocument { details: e.details })?;
        let document = Arc::new(document);

        if self.config.enable_caching {
            self.cache.store(identity, Arc::clone(&document));
        }

        Ok(document)
    }

    fn run_strategy(
        &self,
        strategy: Strategy,
        path: &Path,
        progress: &mut ProgressReporter,
    ) -> LoadResult<LoaderOutput> {
        let output = match strategy {
            Strategy::Standard => self.standard.load(path, progress)?,
            Strategy::Streaming => self.streaming.load(path, progress)?,
            Strategy::MemoryMapped => self.mmap.load(path, progress)?,
        };

        let counter = match output.strategy_used {
            Strategy::Standard => &self.counters.standard,
            Strategy::Streaming => &self.counters.streaming,
            Strategy::MemoryMapped => &self.counters.mmap,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if strategy == Strategy::MemoryMapped && output.strategy_used != strategy {
            self.counters.mmap_fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        Ok(output)
    }

    /// Drop every cached document.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Document cache cleared");
    }

    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            enabled: self.config.enable_caching,
            size: self.cache.len(),
        }
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            standard_loads: self.counters.standard.load(Ordering::Relaxed),
            streaming_loads: self.counters.streaming.load(Ordering::Relaxed),
            mmap_loads: self.counters.mmap.load(Ordering::Relaxed),
            mmap_fallbacks: self.counters.mmap_fallbacks.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            cache: self.cache.stats(),
        }
    }
}

impl std::fmt::Debug for AdaptiveDocumentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveDocumentLoader")
            .field("config", &self.config)
            .field("json_backend", &self.codec.name())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Open the file once to surface permission problems before any loader runs.
fn check_readable(path: &Path) -> LoadResult<()> {
    File::open(path)
        .map(drop)
        .map_err(|e| LoadError::from_precondition(path.to_path_buf(), e))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic during load: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic during load: {}", msg)
    } else {
        "panic during load".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::ParsedValue;
    use crate::document::BuildError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{"schema_name":"DoclingDocument","version":"1.0.0"}"#;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn uncached() -> AdaptiveDocumentLoader {
        AdaptiveDocumentLoader::new(LoaderConfig::default().with_caching(false)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(AdaptiveDocumentLoader::new(LoaderConfig::default().with_chunk_size(0)).is_err());
    }

    #[test]
    fn test_load_minimal_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.docling.json", MINIMAL.as_bytes());

        let document = uncached().load_path(&path).unwrap();
        assert_eq!(document.schema_name, "DoclingDocument");
        assert!(!document.has_body_content());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = uncached().load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_path_below_a_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "doc.json", MINIMAL.as_bytes());

        let err = uncached().load(file.join("child.json")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }), "{:?}", err);
    }

    #[test]
    fn test_directory() {
        let dir = TempDir::new().unwrap();
        let err = uncached().load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::FileIsDirectory { .. }));
    }

    #[test]
    fn test_schema_errors_surface() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.json", br#"{"schema_name":"Other","version":"1"}"#);
        let err = uncached().load(&*path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaViolation::WrongSchemaName { .. })
        ));
    }

    #[test]
    fn test_builder_error_becomes_schema_violation() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "doc.json",
            br#"{"schema_name":"DoclingDocument","version":"1.0.0","texts":{}}"#,
        );
        let err = uncached().load(&*path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaViolation::InvalidDocument { .. })
        ));
    }

    struct PanickingBuilder;

    impl DocumentBuilder for PanickingBuilder {
        fn build(&self, _parsed: ParsedValue) -> Result<DoclingDocument, BuildError> {
            panic!("builder exploded");
        }
    }

    #[test]
    fn test_panic_becomes_unexpected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.json", MINIMAL.as_bytes());
        let loader = AdaptiveDocumentLoader::with_parts(
            LoaderConfig::default(),
            Arc::new(OsFileSystem),
            Arc::new(OsMapper),
            Arc::new(PanickingBuilder),
        )
        .unwrap();

        match loader.load(&*path).unwrap_err() {
            LoadError::Unexpected { cause } => assert!(cause.contains("builder exploded")),
            other => panic!("expected Unexpected, got {:?}", other),
        }
        assert_eq!(loader.stats().failures, 1);
        assert_eq!(loader.cache_info().size, 0);
    }

    #[test]
    fn test_cache_hit_skips_loaders_and_progress() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.json", MINIMAL.as_bytes());
        let loader = AdaptiveDocumentLoader::new(LoaderConfig::default()).unwrap();

        let first = loader.load(&*path).unwrap();

        let calls = Arc::new(Mutex::new(0));
        let counted = Arc::clone(&calls);
        let second = loader
            .load(LoadRequest::new(&*path).with_progress(move |_| *counted.lock().unwrap() += 1))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*calls.lock().unwrap(), 0);
        let stats = loader.stats();
        assert_eq!(stats.loads_from_disk(), 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_cache_info_and_clear() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.json", MINIMAL.as_bytes());
        let b = write(&dir, "b.json", MINIMAL.as_bytes());
        let loader = AdaptiveDocumentLoader::with_defaults();

        loader.load(&*a).unwrap();
        loader.load(&*b).unwrap();
        assert_eq!(
            loader.cache_info(),
            CacheInfo {
                enabled: true,
                size: 2
            }
        );

        loader.clear_cache();
        assert_eq!(loader.cache_info().size, 0);
    }

    #[test]
    fn test_caching_disabled_never_stores() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.json", MINIMAL.as_bytes());
        let loader = uncached();

        loader.load(&*path).unwrap();
        loader.load(&*path).unwrap();
        assert_eq!(
            loader.cache_info(),
            CacheInfo {
                enabled: false,
                size: 0
            }
        );
        assert_eq!(loader.stats().standard_loads, 2);
    }

    #[test]
    fn test_request_override_beats_config() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.json", MINIMAL.as_bytes());
        let loader = AdaptiveDocumentLoader::new(
            LoaderConfig::default()
                .with_caching(false)
                .with_force_streaming(true),
        )
        .unwrap();

        loader.load(LoadRequest::new(&*path)).unwrap();
        loader
            .load(LoadRequest::new(&*path).force_streaming(false).force_standard(true))
            .unwrap();

        let stats = loader.stats();
        assert_eq!(stats.streaming_loads, 1);
        assert_eq!(stats.standard_loads, 1);
    }

    #[test]
    fn test_load_many_reports_each_path() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", MINIMAL.as_bytes());
        let bad = dir.path().join("missing.json");

        let results = uncached().load_many(vec![good.clone(), bad.clone()]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, good);
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, bad);
        assert!(matches!(results[1].1, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_global_is_shared() {
        let a = AdaptiveDocumentLoader::global() as *const _;
        let b = AdaptiveDocumentLoader::global() as *const _;
        assert_eq!(a, b);
        assert!(AdaptiveDocumentLoader::global().config().enable_caching);
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"boom"), "panic during load: boom");
        assert_eq!(
            panic_message(&String::from("bang")),
            "panic during load: bang"
        );
        assert_eq!(panic_message(&42u8), "panic during load");
    }
}
