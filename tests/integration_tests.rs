use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use luga::{
    ArtifactConfig, BatchOptions, ClassifierError, Diagnostics, Fetch, IdentifierConfig,
    InitError, LanguageIdentifier, LanguageModel, ModelError, ModelLoader, ModelManager,
    RawPrediction,
};
use ndarray::array;

const MODEL_BYTES: &[u8] = b"fake lid.176 weights";

/// Answers from a tiny keyword table instead of real weights.
struct KeywordModel;

impl LanguageModel for KeywordModel {
    fn predict_one(&self, text: &str) -> Result<RawPrediction, ClassifierError> {
        let (label, score) = if text.contains("the") {
            ("__label__en", 0.95f32)
        } else if text.contains("och") {
            ("__label__sv", 0.88)
        } else {
            ("__label__eo", 0.11)
        };
        Ok((vec![label.to_string()], array![score]))
    }
}

#[derive(Default)]
struct RecordingLoader {
    loads: Mutex<Vec<(PathBuf, Vec<u8>, Diagnostics)>>,
}

impl ModelLoader for RecordingLoader {
    fn load(
        &self,
        path: &Path,
        diagnostics: Diagnostics,
    ) -> Result<Box<dyn LanguageModel>, ClassifierError> {
        let bytes = fs::read(path).map_err(|e| ClassifierError::ModelError(e.to_string()))?;
        diagnostics.emit("Warning : `load_model` does not return WordVectorModel");
        self.loads
            .lock()
            .unwrap()
            .push((path.to_path_buf(), bytes, diagnostics));
        Ok(Box::new(KeywordModel))
    }
}

struct RejectingLoader;

impl ModelLoader for RejectingLoader {
    fn load(&self, path: &Path, _: Diagnostics) -> Result<Box<dyn LanguageModel>, ClassifierError> {
        Err(ClassifierError::ModelError(format!("{:?} is not a model", path)))
    }
}

#[derive(Clone, Default)]
struct CountingFetcher {
    calls: Arc<AtomicUsize>,
    unreachable: bool,
}

impl Fetch for CountingFetcher {
    fn fetch(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(ModelError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "connect timed out",
            )));
        }
        sink.write_all(MODEL_BYTES)?;
        Ok(MODEL_BYTES.len() as u64)
    }
}

fn manager_in(dir: &Path, fetcher: CountingFetcher) -> ModelManager<CountingFetcher> {
    let config = ArtifactConfig {
        cache_dir: dir.join("models"),
        ..ArtifactConfig::default()
    };
    ModelManager::with_fetcher(config, fetcher)
}

#[test]
fn test_end_to_end_identification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let fetcher = CountingFetcher::default();
    let manager = manager_in(dir.path(), fetcher.clone());
    let loader = RecordingLoader::default();

    let identifier = LanguageIdentifier::builder().build_with(&manager, &loader)?;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    let loads = loader.loads.lock().unwrap();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].0, manager.artifact_path());
    assert_eq!(loads[0].1, MODEL_BYTES);
    assert_eq!(loads[0].2, Diagnostics::Silent);
    drop(loads);

    let language = identifier.identify("the quick brown fox")?;
    assert_eq!(language.name(), "en");
    assert!((language.score() - 0.95).abs() < 1e-6);
    assert!(identifier.identify("saluton mondo")?.is_unknown());

    let names = identifier
        .identify_many(
            &["the end", "fisk och chips", "bonan tagon"],
            identifier.batch_options().with_only_language(true),
        )?
        .into_names();
    assert_eq!(names, vec!["en", "sv", "unknown"]);
    Ok(())
}

#[test]
fn test_cached_artifact_skips_transfer() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let fetcher = CountingFetcher::default();
    let manager = manager_in(dir.path(), fetcher.clone());
    manager.ensure_default(false)?;

    let loader = RecordingLoader::default();
    LanguageIdentifier::builder().build_with(&manager, &loader)?;
    LanguageIdentifier::builder().build_with(&manager, &loader)?;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    LanguageIdentifier::builder()
        .with_force_refresh(true)
        .build_with(&manager, &loader)?;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_threshold_and_diagnostics_are_applied() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = manager_in(dir.path(), CountingFetcher::default());
    let loader = RecordingLoader::default();

    let identifier = LanguageIdentifier::builder()
        .with_threshold(0.9)?
        .with_diagnostics(Diagnostics::Log)
        .build_with(&manager, &loader)?;

    assert_eq!(identifier.threshold(), 0.9);
    assert_eq!(loader.loads.lock().unwrap()[0].2, Diagnostics::Log);
    // 0.88 clears the default threshold but not this one
    assert!(identifier.identify("bröd och smör")?.is_unknown());
    assert_eq!(identifier.identify("the")?.name(), "en");

    // the batch path judges by the same threshold as `identify`
    let full = identifier
        .identify_many(&["och", "the"], BatchOptions::new())?
        .names()
        .join(",");
    assert_eq!(full, "unknown,en");
    Ok(())
}

#[test]
fn test_transfer_failure_aborts_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CountingFetcher {
        unreachable: true,
        ..CountingFetcher::default()
    };
    let manager = manager_in(dir.path(), fetcher.clone());
    let loader = RecordingLoader::default();

    let result = LanguageIdentifier::builder().build_with(&manager, &loader);
    assert!(matches!(result, Err(InitError::Artifact(ModelError::Io(_)))));
    assert!(loader.loads.lock().unwrap().is_empty());
    assert!(!manager.is_present());
    // no retry
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_load_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_in(dir.path(), CountingFetcher::default());

    let result = LanguageIdentifier::builder().build_with(&manager, &RejectingLoader);
    assert!(matches!(
        result,
        Err(InitError::Classifier(ClassifierError::ModelError(_)))
    ));
}

#[test]
fn test_invalid_configured_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_in(dir.path(), CountingFetcher::default());
    let config = IdentifierConfig {
        threshold: -0.1,
        ..IdentifierConfig::default()
    };

    let result = LanguageIdentifier::builder()
        .with_config(config)
        .build_with(&manager, &RecordingLoader::default());
    assert!(matches!(
        result,
        Err(InitError::Classifier(ClassifierError::ValidationError(_)))
    ));
}

#[test]
fn test_init_from_cached_artifact() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let artifact = ArtifactConfig {
        // never contacted: the artifact is already cached
        source_url: "http://127.0.0.1:9/lid.176.bin".to_string(),
        cache_dir: dir.path().join("models"),
        ..ArtifactConfig::default()
    };
    fs::create_dir_all(&artifact.cache_dir)?;
    fs::write(artifact.artifact_path(), MODEL_BYTES)?;

    let config = IdentifierConfig {
        artifact,
        ..IdentifierConfig::default()
    };
    let identifier = LanguageIdentifier::init(config, &RecordingLoader::default())?;
    assert_eq!(identifier.identify("the")?.name(), "en");
    Ok(())
}

#[test]
fn test_thread_safety() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = manager_in(dir.path(), CountingFetcher::default());
    let identifier = Arc::new(
        LanguageIdentifier::builder().build_with(&manager, &RecordingLoader::default())?,
    );

    let mut handles = vec![];
    for _ in 0..3 {
        let identifier = Arc::clone(&identifier);
        handles.push(thread::spawn(move || {
            let result = identifier.identify("the test text");
            assert!(result.is_ok());
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    Ok(())
}
