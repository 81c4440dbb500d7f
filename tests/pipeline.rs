//! End-to-end pipeline scenarios over scripted collaborators.
//!
//! Every external seam (signer, model, store) is swapped for a double
//! from `receipt2txn::testing`, so these run offline and deterministically
//! while still exercising the full orchestration path.

use std::sync::Arc;
use tokio::time::Duration;

use receipt2txn::testing::{FailingStore, ScriptedModel, StaticSigner};
use receipt2txn::{
    ExtractError, ExtractRequest, ExtractionConfig, ExtractionPipeline, Identity, MemoryStore,
    ReceiptModel, SourceType, StatusClass, UrlSigner,
};

fn pipeline_with(
    signer: impl UrlSigner + 'static,
    model: impl ReceiptModel + 'static,
    store: Arc<MemoryStore>,
) -> ExtractionPipeline {
    let config = ExtractionConfig::builder()
        .build()
        .expect("default config is valid");
    ExtractionPipeline::new(Arc::new(signer), Arc::new(model), store, config)
}

fn identity() -> Identity {
    Identity::from_bearer(Some("user-42")).expect("credential is non-empty")
}

/// A clean run: well-formed model output lands as a fully populated row
/// with the normalized fields mirrored into the ai_json audit payload.
#[tokio::test]
async fn well_formed_receipt_is_extracted_and_stored() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::responding(
        r#"{
            "merchant": "Costco Wholesale",
            "txn_date": "2024-03-01",
            "total_cents": 4599,
            "currency": "cad",
            "category": "Groceries",
            "confidence": 0.92,
            "notes": null
        }"#,
    );
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/costco.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/costco.jpg", "receipt").unwrap();
    let record = pipeline.run(&request, &identity()).await.unwrap();

    assert_eq!(record.user_id, "user-42");
    assert_eq!(record.merchant.as_deref(), Some("Costco Wholesale"));
    assert_eq!(record.txn_date.as_deref(), Some("2024-03-01"));
    assert_eq!(record.total_cents, Some(4599));
    assert_eq!(record.currency, "CAD");
    assert_eq!(record.category.as_deref(), Some("Groceries"));
    assert_eq!(record.confidence, Some(0.92));
    assert_eq!(record.ai_json["merchant"], "Costco Wholesale");
    assert_eq!(record.ai_json["total_cents"], 4599);
    assert_eq!(store.len(), 1);
}

/// Drifted model output: wrong-typed and out-of-range fields default
/// independently instead of failing the run.
#[tokio::test]
async fn drifted_model_output_is_normalized_not_rejected() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::responding(
        r#"{
            "merchant": "  Esso  ",
            "txn_date": "March 1, 2024",
            "total_cents": "23.47",
            "currency": null,
            "category": "Fuel",
            "confidence": 1.7,
            "notes": ""
        }"#,
    );
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/esso.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/esso.jpg", "receipt").unwrap();
    let record = pipeline.run(&request, &identity()).await.unwrap();

    assert_eq!(record.merchant.as_deref(), Some("Esso"));
    assert_eq!(record.txn_date, None);
    assert_eq!(record.total_cents, None);
    assert_eq!(record.currency, "CAD");
    assert_eq!(record.category.as_deref(), Some("Fuel"));
    assert_eq!(record.confidence, None);
    assert_eq!(record.notes, None);
}

/// Model text that is not JSON at all surfaces as an upstream contract
/// violation carrying a snippet, and nothing is stored.
#[tokio::test]
async fn non_json_model_output_is_an_upstream_error() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::responding("Sure! Here is the receipt you asked about:");
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/x.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/x.jpg", "receipt").unwrap();
    let err = pipeline.run(&request, &identity()).await.unwrap_err();

    match &err {
        ExtractError::ModelOutputNotJson { snippet, .. } => {
            assert!(snippet.contains("Sure!"));
        }
        other => panic!("expected ModelOutputNotJson, got {other:?}"),
    }
    assert_eq!(err.status_class(), StatusClass::Upstream);
    assert!(store.is_empty());
}

/// A model that hangs past the budget is cancelled; the paused clock
/// makes the 60-second budget elapse instantly.
#[tokio::test(start_paused = true)]
async fn hanging_model_is_cancelled_at_the_budget() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::hanging(Duration::from_secs(300));
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/slow.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/slow.jpg", "receipt").unwrap();
    let err = pipeline.run(&request, &identity()).await.unwrap_err();

    assert!(matches!(err, ExtractError::ModelTimeout { secs: 60 }));
    assert!(store.is_empty());
}

/// A missing image object fails the run before any model call.
#[tokio::test]
async fn missing_image_object_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::responding("{}");
    let pipeline = pipeline_with(StaticSigner::not_found(), model, store.clone());

    let request = ExtractRequest::new("user-42/gone.jpg", "receipt").unwrap();
    let err = pipeline.run(&request, &identity()).await.unwrap_err();

    assert!(matches!(err, ExtractError::ObjectNotFound { .. }));
    assert_eq!(err.status_class(), StatusClass::NotFound);
    assert!(store.is_empty());
}

/// Model-side API failures propagate with their status and body.
#[tokio::test]
async fn model_api_failure_propagates() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::erroring(|| ExtractError::ModelApi {
        status: 429,
        body: "rate limited".into(),
    });
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/x.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/x.jpg", "receipt").unwrap();
    let err = pipeline.run(&request, &identity()).await.unwrap_err();

    assert!(matches!(err, ExtractError::ModelApi { status: 429, .. }));
    assert!(store.is_empty());
}

/// A store that refuses the insert leaves the caller with a persistence
/// error; the image stays uploaded and a resubmission starts clean.
#[tokio::test]
async fn persistence_failure_surfaces_as_persist_error() {
    let config = ExtractionConfig::builder().build().unwrap();
    let pipeline = ExtractionPipeline::new(
        Arc::new(StaticSigner::ok("https://storage.test/signed/x.jpg")),
        Arc::new(ScriptedModel::responding(r#"{"merchant": "Costco"}"#)),
        Arc::new(FailingStore),
        config,
    );

    let request = ExtractRequest::new("user-42/x.jpg", "receipt").unwrap();
    let err = pipeline.run(&request, &identity()).await.unwrap_err();

    assert!(matches!(err, ExtractError::Persist { .. }));
    assert_eq!(err.status_class(), StatusClass::Upstream);
}

/// Legacy and unknown source types fall back to the receipt framing and
/// are persisted as such.
#[tokio::test]
async fn legacy_source_type_falls_back_to_receipt() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::responding(r#"{"merchant": "Shell"}"#);
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/shell.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/shell.jpg", "camera").unwrap();
    let record = pipeline.run(&request, &identity()).await.unwrap();

    assert_eq!(record.source_type, SourceType::Receipt);
}

/// Re-running the same image appends a second independent row.
#[tokio::test]
async fn rerun_creates_a_new_row() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::responding(r#"{"merchant": "Costco"}"#);
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/costco.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/costco.jpg", "receipt").unwrap();
    let first = pipeline.run(&request, &identity()).await.unwrap();
    let second = pipeline.run(&request, &identity()).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.len(), 2);
}

/// Boundary validation rejects degenerate input before any stage runs.
#[tokio::test]
async fn boundary_validation_rejects_bad_input() {
    let err = ExtractRequest::new("   ", "receipt").unwrap_err();
    assert_eq!(err.status_class(), StatusClass::BadInput);

    let err = Identity::from_bearer(None).unwrap_err();
    assert_eq!(err.status_class(), StatusClass::Unauthorized);
}

/// An envelope with no usable text is reported as empty, not as a parse
/// failure, and nothing is stored.
#[tokio::test]
async fn empty_model_response_surfaces_as_such() {
    let store = Arc::new(MemoryStore::new());
    let model = ScriptedModel::erroring(|| ExtractError::EmptyModelResponse);
    let pipeline = pipeline_with(
        StaticSigner::ok("https://storage.test/signed/x.jpg"),
        model,
        store.clone(),
    );

    let request = ExtractRequest::new("user-42/x.jpg", "screenshot").unwrap();
    let err = pipeline.run(&request, &identity()).await.unwrap_err();

    assert!(matches!(err, ExtractError::EmptyModelResponse));
    assert!(store.is_empty());
}
