use std::sync::Arc;
use std::thread;

use verity::corpus::{Corpus, RawArticle};
use verity::config::TrainingConfig;
use verity::inference::{InferenceService, LazyInferenceService};
use verity::ml::types::Label;
use verity::storage::{ArtifactSet, ArtifactStore};
use verity::training::TrainingPipeline;

fn corpus() -> Corpus {
    Corpus::from_sources(
        (0..20)
            .map(|i| {
                RawArticle::new(
                    format!("Shocking secret {i}"),
                    "Anonymous insider reveals the conspiracy they hid",
                )
            })
            .collect(),
        (0..20)
            .map(|i| {
                RawArticle::new(
                    format!("Senate report {i}"),
                    "According to officials the study was published in a journal",
                )
            })
            .collect(),
    )
}

fn service() -> InferenceService {
    let model = TrainingPipeline::new(TrainingConfig::default())
        .fit(corpus())
        .unwrap();
    InferenceService::new(model.vectorizer, model.classifier).unwrap()
}

#[test]
fn test_concurrent_predictions_match_sequential() {
    let service = service();
    let texts = [
        "Shocking secret revealed by an anonymous insider",
        "According to officials the report was published",
        "",
        "conspiracy journal",
    ];
    let expected: Vec<_> = texts.iter().map(|t| service.predict_news(t)).collect();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    for (text, expected) in texts.iter().zip(&expected) {
                        assert_eq!(&service.predict_news(text), expected);
                    }
                }
            });
        }
    });

    assert_eq!(expected[0].label, Label::Fake);
    assert_eq!(expected[1].label, Label::Real);
}

#[test]
fn test_cloned_service_shares_model() {
    let service = service();
    let clone = service.clone();
    let handle = thread::spawn(move || clone.predict_news("shocking anonymous secret"));
    let remote = handle.join().unwrap();
    assert_eq!(remote, service.predict_news("shocking anonymous secret"));
}

#[test]
fn test_lazy_service_loads_once_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("model");
    let model = TrainingPipeline::new(TrainingConfig::default())
        .fit(corpus())
        .unwrap();
    ArtifactStore::new(&model_dir)
        .save(&ArtifactSet {
            vectorizer: &model.vectorizer,
            classifier: &model.classifier,
            report: &model.report,
            training_documents: model.train_size,
        })
        .unwrap();

    let lazy = Arc::new(LazyInferenceService::new(&model_dir));
    assert!(!lazy.is_loaded());

    let results: Vec<Label> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                scope.spawn(move || lazy.predict_news("shocking secret insider").unwrap().label)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(lazy.is_loaded());
    assert!(results.iter().all(|label| *label == Label::Fake));
}
