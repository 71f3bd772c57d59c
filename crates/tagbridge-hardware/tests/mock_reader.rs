//! Behaviour tests for the simulated reader.
//!
//! Time is paused in every test, so simulated latency and the periodic
//! simulation tick run instantly.

use std::time::Duration;
use tagbridge_core::MockMode;
use tagbridge_hardware::{
    ManualItemOptions, MockConfig, MockReader, ReaderEventKind, RfidReader,
};
use tokio::time::Instant;

fn manual_reader() -> MockReader {
    MockReader::with_config(MockConfig {
        mode: MockMode::Manual,
        seed: Some(42),
        ..MockConfig::default()
    })
}

fn auto_reader() -> MockReader {
    MockReader::with_config(MockConfig {
        mode: MockMode::Auto,
        seed: Some(42),
        ..MockConfig::default()
    })
}

#[tokio::test(start_paused = true)]
async fn test_manual_mode_starts_empty() {
    let reader = manual_reader();

    assert!(reader.inventory().await.unwrap().is_empty());
    assert_eq!(reader.mode().await.unwrap(), MockMode::Manual);
    assert_eq!(reader.addable_items().await.unwrap().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_inventory_primes_empty_auto_reader() {
    let reader = auto_reader();

    let tags = reader.inventory().await.unwrap();
    assert!(!tags.is_empty());
    assert!(tags.len() <= 2);
    assert!(!reader.is_simulating().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_subscription_replays_current_contents() {
    let reader = manual_reader();
    reader
        .add_item_from_pool("RFID001", ManualItemOptions::default())
        .await
        .unwrap();
    reader
        .add_item_from_pool("RFID004", ManualItemOptions::default())
        .await
        .unwrap();

    let mut events = reader.start_monitoring().await.unwrap();
    let replay = events.drain();

    assert_eq!(replay.len(), 2);
    assert!(replay.iter().all(|event| event.kind == ReaderEventKind::Added));
    assert!(!reader.is_simulating().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_mutations_notify_before_returning() {
    let reader = manual_reader();
    reader
        .add_item_from_pool("RFID002", ManualItemOptions::default())
        .await
        .unwrap();
    let mut events = reader.start_monitoring().await.unwrap();
    events.drain();

    let outcome = reader.edit("RFID002", "31234").await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.new_epc.as_deref(), Some("RFID002"));

    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, ReaderEventKind::Updated);
    assert_eq!(event.item.media_id.as_deref(), Some("31234"));
    assert_eq!(event.item.data.as_deref(), Some("Book: Media 31234"));

    reader.secure("RFID002").await.unwrap();
    let event = events.try_recv().unwrap();
    assert_eq!(event.item.secured, Some(true));

    assert!(reader.kill("RFID002").await.unwrap());
    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, ReaderEventKind::Removed);
    assert!(events.try_recv().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_missing_tag_is_a_negative_value() {
    let reader = manual_reader();

    let edit = reader.edit("NOPE", "1").await.unwrap();
    assert!(!edit.success);
    assert_eq!(edit.message.as_deref(), Some("Tag not found"));

    assert!(!reader.secure("NOPE").await.unwrap().success);
    assert!(!reader.unsecure("NOPE").await.unwrap().success);
    assert!(!reader.clear("NOPE").await.unwrap().success);
    assert!(!reader.analyze("NOPE").await.unwrap().success);
    assert!(reader.read("NOPE").await.unwrap().is_none());
    assert!(!reader.kill("NOPE").await.unwrap());
    assert!(!reader.kill("NOPE").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_clear_is_an_identity_change() {
    let reader = manual_reader();
    reader
        .add_item_from_pool("RFID001", ManualItemOptions::default())
        .await
        .unwrap();
    let mut events = reader.start_monitoring().await.unwrap();
    events.drain();

    let outcome = reader.clear("RFID001").await.unwrap();
    assert!(outcome.success);
    let new_epc = outcome.new_epc.unwrap();
    assert_ne!(new_epc, "RFID001");
    assert!(new_epc.starts_with("TID"));
    let tid = outcome.tid.clone().unwrap();
    assert_eq!(new_epc[3..11], tid[8..16]);
    assert_eq!(outcome.new_pc.as_deref(), Some("3000"));

    let events = events.drain();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, ReaderEventKind::Removed);
    assert_eq!(events[0].item.id, "RFID001");
    assert_eq!(events[1].kind, ReaderEventKind::Added);
    assert_eq!(events[1].item.id, new_epc);
    assert_eq!(events[1].item.secured, Some(false));
    assert_eq!(events[1].item.media_id, None);

    let ids: Vec<_> = reader
        .inventory()
        .await
        .unwrap()
        .into_iter()
        .map(|tag| tag.id)
        .collect();
    assert_eq!(ids, vec![new_epc.clone()]);

    let analysis = reader.analyze(&new_epc).await.unwrap();
    let tid = analysis.analysis.unwrap().tid_bank.unwrap().tid_hex;
    assert_eq!(tid, outcome.tid);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_is_deterministic() {
    let reader = manual_reader();
    let mut events = reader.start_monitoring().await.unwrap();

    let first = reader.initialize("31234", None, None).await.unwrap();
    assert!(first.success);
    assert_eq!(first.epc.as_deref(), Some("E000000000000000000031234"));
    assert_eq!(first.format.as_deref(), Some("DE290"));
    assert_eq!(first.secured, Some(true));
    assert_eq!(first.pc.as_deref(), Some("3000"));

    let second = reader
        .initialize("31234", Some("DE6"), Some(false))
        .await
        .unwrap();
    assert_eq!(second.epc, first.epc);
    assert_eq!(reader.current_items().await.unwrap().len(), 1);

    let kinds: Vec<_> = events.drain().into_iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![ReaderEventKind::Added, ReaderEventKind::Updated]);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_is_never_exceeded() {
    let reader = MockReader::with_config(MockConfig {
        mode: MockMode::Manual,
        max_items: 2,
        seed: Some(1),
        ..MockConfig::default()
    });

    for id in ["RFID001", "RFID002"] {
        assert!(
            reader
                .add_item_from_pool(id, ManualItemOptions::default())
                .await
                .unwrap()
                .is_some()
        );
    }

    let third = reader
        .add_item_from_pool("RFID003", ManualItemOptions::default())
        .await
        .unwrap();
    assert!(third.is_none());

    let initialized = reader.initialize("99", None, None).await.unwrap();
    assert!(!initialized.success);

    let custom = reader
        .add_custom_item("CUSTOM1", None, ManualItemOptions::default())
        .await
        .unwrap();
    assert!(custom.is_none());
    assert_eq!(reader.current_items().await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_harness_operations() {
    let reader = manual_reader();

    let added = reader
        .add_item_from_pool("RFID002", ManualItemOptions::default().with_rssi(-60))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(added.rssi, Some(-60));

    let again = reader
        .add_item_from_pool("RFID002", ManualItemOptions::default().with_rssi(-30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.rssi, Some(-60));

    assert!(
        reader
            .add_item_from_pool("RFID999", ManualItemOptions::default())
            .await
            .unwrap()
            .is_none()
    );

    let custom = reader
        .add_custom_item("X1", Some("Atlas"), ManualItemOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(custom.data.as_deref(), Some("Atlas"));
    assert_eq!(custom.tag_type.as_deref(), Some("CUSTOM"));
    assert_eq!(custom.rssi, Some(-55));

    assert!(reader.update_item_rssi("X1", 0).await.unwrap());
    let x1 = reader.read("X1").await.unwrap().unwrap();
    assert_eq!(x1.rssi, Some(-25));
    assert!(!reader.update_item_rssi("NOPE", -40).await.unwrap());

    assert!(reader.remove_item("X1").await.unwrap());
    assert!(!reader.remove_item("X1").await.unwrap());
    assert_eq!(reader.addable_items().await.unwrap().len(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_tick_follows_subscriber_count() {
    let reader = auto_reader();
    assert!(!reader.is_simulating().await.unwrap());

    let first = reader.start_monitoring().await.unwrap();
    let second = reader.start_monitoring().await.unwrap();
    assert!(reader.is_simulating().await.unwrap());
    assert_eq!(reader.subscriber_count().await.unwrap(), 2);

    drop(first);
    assert!(reader.is_simulating().await.unwrap());

    second.unsubscribe();
    assert_eq!(reader.subscriber_count().await.unwrap(), 0);
    assert!(!reader.is_simulating().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_auto_simulation_emits_events_within_capacity() {
    let reader = auto_reader();
    let mut events = reader.start_monitoring().await.unwrap();

    let primed = events.drain();
    assert!(!primed.is_empty());
    assert!(primed.iter().all(|event| event.kind == ReaderEventKind::Added));

    tokio::time::sleep(Duration::from_secs(60)).await;

    let later = events.drain();
    assert!(!later.is_empty());
    assert!(reader.current_items().await.unwrap().len() <= 5);

    for event in later.iter().filter(|event| event.kind != ReaderEventKind::Removed) {
        let rssi = event.item.rssi.unwrap();
        assert!((-75..=-30).contains(&rssi));
    }
}

#[tokio::test(start_paused = true)]
async fn test_switching_to_manual_stops_simulation() {
    let reader = auto_reader();
    let mut events = reader.start_monitoring().await.unwrap();
    assert!(reader.is_simulating().await.unwrap());

    assert_eq!(reader.set_mode(MockMode::Manual).await.unwrap(), MockMode::Manual);
    assert!(!reader.is_simulating().await.unwrap());
    events.drain();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(events.drain().is_empty());

    reader.set_mode(MockMode::Auto).await.unwrap();
    assert!(reader.is_simulating().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_stop_monitoring_closes_subscriptions() {
    let reader = auto_reader();
    let mut events = reader.start_monitoring().await.unwrap();
    events.drain();

    reader.stop_monitoring().await.unwrap();

    assert!(events.recv().await.is_none());
    assert!(!reader.is_simulating().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_operations_simulate_latency() {
    let reader = manual_reader();
    reader
        .add_item_from_pool("RFID001", ManualItemOptions::default())
        .await
        .unwrap();

    let start = Instant::now();
    reader.read("RFID001").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));

    let start = Instant::now();
    reader.kill("RFID001").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(300));

    let start = Instant::now();
    reader.status().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_state() {
    let reader = manual_reader();
    let clone = reader.clone();

    reader
        .add_item_from_pool("RFID005", ManualItemOptions::default())
        .await
        .unwrap();

    let tag = clone.read("RFID005").await.unwrap().unwrap();
    assert_eq!(tag.data.as_deref(), Some("Book: Pride and Prejudice"));
    assert_eq!(tag.secured, Some(true));
}
