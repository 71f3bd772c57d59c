//! Reconciliation against a reader that records every call.

use std::sync::Mutex;
use std::time::Duration;
use tagbridge_hardware::{
    AnalyzeOutcome, ClearOutcome, EditOutcome, InitializeOutcome, ReaderStatus, Result, RfidReader,
    SecurityOutcome, Subscription, TagReading,
};
use tagbridge_ils::{DesiredItemState, Reconciler, Reconciliation};
use tokio::time::Instant;

// ── Recording reader ────────────────────────────────────────────────

/// Panics on any call outside the reconciliation path.
#[derive(Default)]
struct RecordingReader {
    tags: Mutex<Vec<TagReading>>,
    calls: Mutex<Vec<String>>,
    rewrite_epc: Option<String>,
    fail_edit: bool,
    fail_security: bool,
}

impl RecordingReader {
    fn with_tags(tags: Vec<TagReading>) -> Self {
        Self {
            tags: Mutex::new(tags),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call != "inventory")
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn set_secured(&self, epc: &str, secured: bool) -> SecurityOutcome {
        if self.fail_security {
            return SecurityOutcome {
                success: false,
                message: Some("write error".to_string()),
                ..SecurityOutcome::default()
            };
        }

        let mut tags = self.tags.lock().unwrap();
        match tags.iter_mut().find(|tag| tag.id == epc) {
            Some(tag) => {
                tag.secured = Some(secured);
                SecurityOutcome {
                    success: true,
                    epc: Some(epc.to_string()),
                    secured: Some(secured),
                    ..SecurityOutcome::default()
                }
            }
            None => SecurityOutcome::default(),
        }
    }
}

impl RfidReader for RecordingReader {
    async fn inventory(&self) -> Result<Vec<TagReading>> {
        self.record("inventory".to_string());
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn start_monitoring(&self) -> Result<Subscription> {
        unimplemented!("reconciliation never calls start_monitoring")
    }

    async fn stop_monitoring(&self) -> Result<()> {
        Ok(())
    }

    async fn edit(&self, epc: &str, media_id: &str) -> Result<EditOutcome> {
        self.record(format!("edit {epc} {media_id}"));
        if self.fail_edit {
            return Ok(EditOutcome {
                success: false,
                message: Some("locked".to_string()),
                ..EditOutcome::default()
            });
        }

        let mut tags = self.tags.lock().unwrap();
        let Some(tag) = tags.iter_mut().find(|tag| tag.id == epc) else {
            return Ok(EditOutcome::default());
        };

        tag.media_id = Some(media_id.to_string());
        if let Some(new_epc) = &self.rewrite_epc {
            tag.id = new_epc.clone();
        }

        Ok(EditOutcome {
            success: true,
            old_epc: Some(epc.to_string()),
            new_epc: Some(tag.id.clone()),
            media_id: Some(media_id.to_string()),
            ..EditOutcome::default()
        })
    }

    async fn secure(&self, epc: &str) -> Result<SecurityOutcome> {
        self.record(format!("secure {epc}"));
        Ok(self.set_secured(epc, true))
    }

    async fn unsecure(&self, epc: &str) -> Result<SecurityOutcome> {
        self.record(format!("unsecure {epc}"));
        Ok(self.set_secured(epc, false))
    }

    async fn read(&self, epc: &str) -> Result<Option<TagReading>> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|tag| tag.id == epc)
            .cloned())
    }

    async fn kill(&self, _epc: &str) -> Result<bool> {
        unimplemented!("reconciliation never calls kill")
    }

    async fn initialize(
        &self,
        _media_id: &str,
        _format: Option<&str>,
        _secured: Option<bool>,
    ) -> Result<InitializeOutcome> {
        unimplemented!("reconciliation never calls initialize")
    }

    async fn clear(&self, _epc: &str) -> Result<ClearOutcome> {
        unimplemented!("reconciliation never calls clear")
    }

    async fn analyze(&self, _epc: &str) -> Result<AnalyzeOutcome> {
        unimplemented!("reconciliation never calls analyze")
    }

    async fn is_connected(&self) -> Result<bool> {
        Ok(true)
    }

    async fn status(&self) -> Result<ReaderStatus> {
        Ok(ReaderStatus::default())
    }
}

fn desired(barcode: &str, secure: Option<bool>) -> DesiredItemState {
    DesiredItemState {
        barcode: barcode.to_string(),
        secure,
        tags: Vec::new(),
    }
}

fn completed(reconciliation: Reconciliation) -> tagbridge_ils::ReconciliationOutcome {
    match reconciliation {
        Reconciliation::Completed(outcome) => outcome,
        Reconciliation::ItemNotFound => panic!("expected the tag to be found"),
    }
}

// ── Ordering ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_edit_precedes_security_change() {
    let reader = RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(false)]);

    let outcome = completed(
        Reconciler::default()
            .reconcile(&reader, &desired("E1", Some(true)))
            .await
            .unwrap(),
    );

    assert!(outcome.success);
    assert!(outcome.media_edited);
    assert!(outcome.security_changed);
    assert_eq!(reader.mutations(), vec!["edit E1 E1", "secure E1"]);
}

#[tokio::test(start_paused = true)]
async fn test_security_uses_epc_returned_by_edit() {
    let reader = RecordingReader {
        rewrite_epc: Some("E9".to_string()),
        ..RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(true)])
    };

    let outcome = completed(
        Reconciler::default()
            .reconcile(&reader, &desired("E1", Some(false)))
            .await
            .unwrap(),
    );

    assert!(outcome.success);
    assert_eq!(outcome.epc, "E9");
    assert_eq!(reader.mutations(), vec!["edit E1 E1", "unsecure E9"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_edit_skips_security() {
    let reader = RecordingReader {
        fail_edit: true,
        ..RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(false)])
    };

    let outcome = completed(
        Reconciler::default()
            .reconcile(&reader, &desired("E1", Some(true)))
            .await
            .unwrap(),
    );

    assert!(!outcome.success);
    assert!(!outcome.security_changed);
    assert_eq!(reader.mutations(), vec!["edit E1 E1"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_security_leaves_edit_in_place() {
    let reader = RecordingReader {
        fail_security: true,
        ..RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(false)])
    };

    let outcome = completed(
        Reconciler::default()
            .reconcile(&reader, &desired("E1", Some(true)))
            .await
            .unwrap(),
    );

    assert!(!outcome.success);
    assert!(outcome.media_edited);

    let tag = reader.read("E1").await.unwrap().unwrap();
    assert_eq!(tag.media_id.as_deref(), Some("E1"));
    assert_eq!(tag.secured, Some(false));
}

// ── Short-circuit ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_second_reconciliation_is_noop() {
    let reader = RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(false)]);
    let reconciler = Reconciler::default();
    let target = desired("E1", Some(true));

    assert!(completed(reconciler.reconcile(&reader, &target).await.unwrap()).success);
    let before = reader.mutations().len();

    let second = completed(reconciler.reconcile(&reader, &target).await.unwrap());
    assert!(second.success);
    assert!(second.is_noop());
    assert_eq!(reader.mutations().len(), before);
}

#[tokio::test(start_paused = true)]
async fn test_absent_flag_leaves_security_alone() {
    let reader = RecordingReader::with_tags(vec![
        TagReading::new("E1").with_media_id("31234").with_secured(false),
    ]);

    let outcome = completed(
        Reconciler::default()
            .reconcile(&reader, &desired("31234", None))
            .await
            .unwrap(),
    );

    assert!(outcome.success);
    assert!(outcome.is_noop());
    assert!(reader.mutations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_security_only_skips_edit() {
    let reader = RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(true)]);

    let outcome = completed(
        Reconciler::default()
            .reconcile_security(&reader, "E1", false)
            .await
            .unwrap(),
    );

    assert!(outcome.success);
    assert!(!outcome.media_edited);
    assert_eq!(reader.mutations(), vec!["unsecure E1"]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_tag_is_item_not_found() {
    let reader = RecordingReader::with_tags(vec![TagReading::new("E1")]);

    let result = Reconciler::default()
        .reconcile(&reader, &desired("E2", Some(true)))
        .await
        .unwrap();

    assert_eq!(result, Reconciliation::ItemNotFound);
    assert_eq!(reader.calls(), vec!["inventory"]);
}

// ── Timing ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_settling_delay_precedes_each_hardware_call() {
    let reader = RecordingReader::with_tags(vec![TagReading::new("E1").with_secured(false)]);
    let reconciler = Reconciler::new(Duration::from_millis(200));

    let started = Instant::now();
    reconciler
        .reconcile(&reader, &desired("E1", Some(true)))
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(600), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(800), "elapsed {elapsed:?}");
}
