//! Integration tests for the adaptive document loader.
//!
//! These exercise the full pipeline through the public API:
//! - strategy selection and equivalence of the three loaders
//! - cache staleness detection after on-disk changes
//! - mmap fallback with an injected failing mapper
//! - the error taxonomy for schema and encoding failures
//! - progress reporting and the async wrapper
//!
//! Run with: `cargo test --test loader_integration`

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use filetime::FileTime;
use memmap2::Mmap;
use proptest::prelude::*;
use tempfile::TempDir;

use docpivot::cache::OsFileSystem;
use docpivot::document::DoclingDocumentBuilder;
use docpivot::loader::{MemoryMapper, OsMapper};
use docpivot::{
    AdaptiveDocumentLoader, DoclingDocument, LoadError, LoadRequest, LoaderConfig,
    SchemaViolation,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Mapper that always fails, as if the platform refused the mapping.
struct FailingMapper;

impl MemoryMapper for FailingMapper {
    fn map(&self, _file: &File) -> io::Result<Mmap> {
        Err(io::Error::other("mapping disabled for test"))
    }
}

fn write(dir: &TempDir, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A document with `paragraphs` text items hanging off the body.
fn sample_document(name: &str, paragraphs: usize) -> String {
    let children: Vec<String> = (0..paragraphs)
        .map(|i| format!(r##"{{"$ref": "#/texts/{}"}}"##, i))
        .collect();
    let texts: Vec<String> = (0..paragraphs)
        .map(|i| {
            format!(
                r##"{{"self_ref": "#/texts/{i}", "parent": {{"$ref": "#/body"}}, "children": [],
                    "label": "paragraph", "orig": "Paragraph {i} ✓", "text": "Paragraph {i}: naïve café 日本語 ✓"}}"##
            )
        })
        .collect();

    format!(
        r##"{{
  "schema_name": "DoclingDocument",
  "version": "1.0.0",
  "name": "{name}",
  "origin": {{"mimetype": "application/pdf", "binary_hash": 42, "filename": "{name}.pdf"}},
  "body": {{"self_ref": "#/body", "children": [{children}], "label": "unspecified", "name": "_root_"}},
  "texts": [{texts}],
  "tables": [{{"self_ref": "#/tables/0", "data": {{"num_rows": 0}}}}],
  "pages": {{"1": {{"size": {{"width": 612.0, "height": 792.0}}, "page_no": 1}}}}
}}"##,
        name = name,
        children = children.join(", "),
        texts = texts.join(",\n    "),
    )
}

fn minimal_padded(len: usize) -> Vec<u8> {
    let mut content = br#"{"schema_name": "DoclingDocument", "version": "1.0.0"}"#.to_vec();
    content.resize(len, b' ');
    content
}

fn uncached_config() -> LoaderConfig {
    LoaderConfig::default().with_caching(false)
}

/// Config under which every file is memory-mapped.
fn mmap_config() -> LoaderConfig {
    uncached_config()
        .with_streaming_threshold(0)
        .with_large_file_threshold(0)
}

fn loader(config: LoaderConfig) -> AdaptiveDocumentLoader {
    AdaptiveDocumentLoader::new(config).unwrap()
}

fn loader_with_mapper(config: LoaderConfig, mapper: Arc<dyn MemoryMapper>) -> AdaptiveDocumentLoader {
    AdaptiveDocumentLoader::with_parts(
        config,
        Arc::new(OsFileSystem),
        mapper,
        Arc::new(DoclingDocumentBuilder),
    )
    .unwrap()
}

fn recording_request(path: &Path) -> (LoadRequest, Arc<Mutex<Vec<f64>>>) {
    let values = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&values);
    let request =
        LoadRequest::new(path).with_progress(move |p| captured.lock().unwrap().push(p));
    (request, values)
}

fn assert_monotonic_to_one(values: &[f64]) {
    assert!(!values.is_empty(), "no progress reported");
    for pair in values.windows(2) {
        assert!(pair[0] <= pair[1], "progress went backwards: {:?}", values);
    }
    assert_eq!(*values.last().unwrap(), 1.0);
}

// ============================================================================
// Determinism and strategy equivalence
// ============================================================================

#[test]
fn test_repeated_loads_are_structurally_equal() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.docling.json", sample_document("determinism", 25));
    let loader = loader(uncached_config());

    let first = loader.load_path(&path).unwrap();
    let second = loader.load_path(&path).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
    assert_eq!(loader.stats().loads_from_disk(), 2);
}

#[test]
fn test_all_strategies_build_equal_documents() {
    let dir = TempDir::new().unwrap();

    for (label, paragraphs) in [("small", 1), ("medium", 50), ("large", 2000)] {
        let path = write(&dir, &format!("{}.json", label), sample_document(label, paragraphs));

        let standard_loader = loader(uncached_config());
        let standard = standard_loader
            .load(LoadRequest::new(&path).force_standard(true))
            .unwrap();

        // Small chunks so multi-byte characters straddle chunk boundaries.
        let streaming_loader = loader(uncached_config().with_chunk_size(7));
        let streaming = streaming_loader
            .load(LoadRequest::new(&path).force_streaming(true))
            .unwrap();

        let mmap_loader = loader(mmap_config());
        let mapped = mmap_loader.load_path(&path).unwrap();

        assert_eq!(standard_loader.stats().standard_loads, 1, "{}", label);
        assert_eq!(streaming_loader.stats().streaming_loads, 1, "{}", label);
        assert_eq!(mmap_loader.stats().mmap_loads, 1, "{}", label);

        assert_eq!(*standard, *streaming, "{}: standard vs streaming", label);
        assert_eq!(*standard, *mapped, "{}: standard vs mmap", label);
        assert_eq!(standard.texts.len(), paragraphs);
        assert_eq!(standard.body_text().len(), paragraphs);
    }
}

#[test]
fn test_size_thresholds_pick_strategy() {
    let dir = TempDir::new().unwrap();
    let small = write(&dir, "small.json", minimal_padded(100));
    let medium = write(&dir, "medium.json", minimal_padded(1_000));
    let large = write(&dir, "large.json", minimal_padded(10_000));

    let loader = loader(
        uncached_config()
            .with_streaming_threshold(500)
            .with_large_file_threshold(5_000),
    );
    loader.load_path(&small).unwrap();
    loader.load_path(&medium).unwrap();
    loader.load_path(&large).unwrap();

    let stats = loader.stats();
    assert_eq!(stats.standard_loads, 1);
    assert_eq!(stats.streaming_loads, 1);
    assert_eq!(stats.mmap_loads, 1);
    assert_eq!(stats.mmap_fallbacks, 0);
}

// ============================================================================
// Cache correctness
// ============================================================================

#[test]
fn test_cache_reflects_changed_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("before", 2));
    let loader = loader(LoaderConfig::default());

    let before = loader.load_path(&path).unwrap();
    assert_eq!(before.name, "before");

    std::fs::write(&path, sample_document("after", 3)).unwrap();
    let later = FileTime::from_unix_time(FileTime::now().unix_seconds() + 60, 0);
    filetime::set_file_mtime(&path, later).unwrap();

    let after = loader.load_path(&path).unwrap();
    assert_eq!(after.name, "after");
    assert_eq!(after.texts.len(), 3);
    assert_eq!(loader.stats().cache.evictions, 1);
    assert_eq!(loader.cache_info().size, 1);
}

#[test]
fn test_cache_detects_mtime_only_change() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("same", 1));
    let loader = loader(LoaderConfig::default());

    let first = loader.load_path(&path).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_000_000, 0)).unwrap();
    let second = loader.load_path(&path).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
    assert_eq!(loader.stats().loads_from_disk(), 2);
}

#[test]
fn test_deleted_file_is_not_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("gone", 1));
    let loader = loader(LoaderConfig::default());

    loader.load_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        loader.load_path(&path),
        Err(LoadError::FileNotFound { .. })
    ));
}

#[test]
fn test_concurrent_loads_share_one_cache() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("shared", 10));
    let loader = Arc::new(loader(LoaderConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let path = path.clone();
            thread::spawn(move || loader.load_path(&path).unwrap())
        })
        .collect();
    let documents: Vec<Arc<DoclingDocument>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    for doc in &documents {
        assert_eq!(**doc, *documents[0]);
    }
    assert_eq!(loader.cache_info().size, 1);
    let stats = loader.stats();
    assert_eq!(stats.loads_from_disk() + stats.cache_hits, 8);
}

// ============================================================================
// Memory-mapping fallback
// ============================================================================

#[test]
fn test_failing_mapper_falls_back_to_standard() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("fallback", 20));

    let failing = loader_with_mapper(mmap_config(), Arc::new(FailingMapper));
    let recovered = failing.load_path(&path).unwrap();

    let direct = loader(uncached_config())
        .load(LoadRequest::new(&path).force_standard(true))
        .unwrap();

    assert_eq!(*recovered, *direct);
    let stats = failing.stats();
    assert_eq!(stats.mmap_fallbacks, 1);
    assert_eq!(stats.standard_loads, 1);
    assert_eq!(stats.mmap_loads, 0);
}

#[test]
fn test_failing_mapper_does_not_mask_data_errors() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.json", b"{\"schema_name\": ");

    let err = loader_with_mapper(mmap_config(), Arc::new(FailingMapper))
        .load_path(&path)
        .unwrap_err();
    assert!(matches!(err, LoadError::Decode { .. }));
}

#[test]
fn test_os_mapper_via_with_parts() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("mapped", 3));

    let loader = loader_with_mapper(mmap_config(), Arc::new(OsMapper));
    loader.load_path(&path).unwrap();
    assert_eq!(loader.stats().mmap_loads, 1);
}

// ============================================================================
// Error taxonomy
// ============================================================================

#[test]
fn test_missing_schema_name() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", r#"{"version": "1.0"}"#);

    let err = loader(uncached_config()).load_path(&path).unwrap_err();
    match err {
        LoadError::Schema(SchemaViolation::MissingFields(fields)) => {
            assert_eq!(fields, vec!["schema_name".to_string()]);
        }
        other => panic!("expected MissingFields, got {:?}", other),
    }
}

#[test]
fn test_wrong_schema_name() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", r#"{"schema_name": "Wrong", "version": "1.0"}"#);

    let err = loader(uncached_config()).load_path(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Schema(SchemaViolation::WrongSchemaName { ref expected, ref actual })
            if expected == "DoclingDocument" && actual == "Wrong"
    ));
    assert!(err.to_string().contains("Wrong"));
}

#[test]
fn test_invalid_encoding_under_streaming_and_mmap() {
    let dir = TempDir::new().unwrap();
    let mut content = vec![0xFF, 0xFE, 0x00, 0x00];
    content.extend_from_slice(b"{\"schema_name\": \"DoclingDocument\"}");
    let path = write(&dir, "utf32.json", &content);

    let streamed = loader(uncached_config())
        .load(LoadRequest::new(&path).force_streaming(true))
        .unwrap_err();
    assert!(matches!(streamed, LoadError::Encoding { offset: 0, .. }), "{:?}", streamed);

    let mapped = loader(mmap_config()).load_path(&path).unwrap_err();
    assert!(matches!(mapped, LoadError::Encoding { offset: 0, .. }), "{:?}", mapped);

    let standard = loader(uncached_config())
        .load(LoadRequest::new(&path).force_standard(true))
        .unwrap_err();
    assert!(matches!(standard, LoadError::Encoding { .. }), "{:?}", standard);
}

#[test]
fn test_streaming_decode_error_names_strategy() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.json", b"{\"schema_name\": \"DoclingDocument\", }");

    let err = loader(uncached_config())
        .load(LoadRequest::new(&path).force_streaming(true))
        .unwrap_err();
    assert!(err.to_string().contains("streaming"), "{}", err);
}

#[test]
fn test_precondition_errors() {
    let dir = TempDir::new().unwrap();
    let loader = loader(uncached_config());

    assert!(matches!(
        loader.load_path(dir.path().join("absent.json")),
        Err(LoadError::FileNotFound { .. })
    ));
    assert!(matches!(
        loader.load_path(dir.path()),
        Err(LoadError::FileIsDirectory { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_permission_denied() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = write(&dir, "locked.json", minimal_padded(64));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores file modes; nothing to check there.
    if File::open(&path).is_ok() {
        return;
    }
    assert!(matches!(
        loader(uncached_config()).load_path(&path),
        Err(LoadError::PermissionDenied { .. })
    ));
}

// ============================================================================
// Progress reporting
// ============================================================================

#[test]
fn test_progress_is_monotonic_for_every_strategy() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("progress", 100));

    // (loader, force_standard, force_streaming)
    let cases = vec![
        (loader(uncached_config()), true, false),
        (loader(uncached_config().with_chunk_size(256)), false, true),
        (loader(mmap_config()), false, false),
        (loader_with_mapper(mmap_config(), Arc::new(FailingMapper)), false, false),
    ];

    for (loader, force_standard, force_streaming) in cases {
        let (request, values) = recording_request(&path);
        loader
            .load(
                request
                    .force_standard(force_standard)
                    .force_streaming(force_streaming),
            )
            .unwrap();
        assert_monotonic_to_one(&values.lock().unwrap());
    }
}

#[test]
fn test_streaming_reports_intermediate_progress() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", minimal_padded(4096));

    let (request, values) = recording_request(&path);
    loader(uncached_config().with_chunk_size(1024))
        .load(request.force_streaming(true))
        .unwrap();

    let values = values.lock().unwrap();
    assert_monotonic_to_one(&values);
    assert!(values.iter().any(|v| *v > 0.0 && *v < 1.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn streaming_progress_monotonic_for_any_chunk_size(chunk in 1usize..600, pad in 60usize..3000) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "doc.json", minimal_padded(pad));

        let (request, values) = recording_request(&path);
        loader(uncached_config().with_chunk_size(chunk))
            .load(request.force_streaming(true))
            .unwrap();

        let values = values.lock().unwrap();
        for pair in values.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert_eq!(values.last().copied(), Some(1.0));
    }
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_two_kilobyte_document_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "minimal.docling.json", minimal_padded(2048));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 2048);

    let loader = loader(LoaderConfig::default());
    let first = loader.load_path(&path).unwrap();
    assert_eq!(first.schema_name, "DoclingDocument");
    assert_eq!(first.version, "1.0.0");
    assert!(!first.has_body_content());
    assert_eq!(loader.stats().loads_from_disk(), 1);

    let (request, progress) = recording_request(&path);
    let second = loader.load(request).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(progress.lock().unwrap().is_empty());
    let stats = loader.stats();
    assert_eq!(stats.loads_from_disk(), 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache.hits, 1);
}

#[test]
fn test_load_many_continues_after_failure() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.json", sample_document("good", 2));
    let bad = write(&dir, "bad.json", r#"{"version": "1.0.0"}"#);

    let results = loader(LoaderConfig::default()).load_many([&good, &bad, &good]);
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    assert!(matches!(results[1].1, Err(LoadError::Schema(_))));
    assert!(results[2].1.is_ok());
}

#[test]
fn test_detect_format_matches_loadable_files() {
    let dir = TempDir::new().unwrap();
    let plain = write(&dir, "plain.json", sample_document("plain", 1));
    let other = write(&dir, "other.json", r#"{"hello": "world"}"#);

    assert!(docpivot::detect_format(&plain));
    assert!(!docpivot::detect_format(&other));
}

// ============================================================================
// Async wrapper
// ============================================================================

#[tokio::test]
async fn test_load_async() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "doc.json", sample_document("async", 5));
    let loader = Arc::new(loader(LoaderConfig::default()));

    let document = Arc::clone(&loader)
        .load_async(LoadRequest::new(&path))
        .await
        .unwrap();
    assert_eq!(document.name, "async");

    let err = Arc::clone(&loader)
        .load_async(LoadRequest::new(dir.path().join("missing.json")))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_loads() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..6)
        .map(|i| write(&dir, &format!("doc{}.json", i), sample_document(&format!("doc{}", i), i + 1)))
        .collect();
    let loader = Arc::new(loader(LoaderConfig::default()));

    let tasks: Vec<_> = paths
        .iter()
        .map(|path| tokio::spawn(Arc::clone(&loader).load_async(LoadRequest::new(path))))
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let document = task.await.unwrap().unwrap();
        assert_eq!(document.name, format!("doc{}", i));
        assert_eq!(document.texts.len(), i + 1);
    }
    assert_eq!(loader.cache_info().size, 6);
}
