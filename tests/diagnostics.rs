//! Misuse diagnostics are logged warnings, never failures.

use std::cell::RefCell;
use std::sync::{Arc, Once};

use flexcore::{LayoutManager, Size};
use log::{Level, LevelFilter, Log, Metadata, Record};

// =============================================================================
// CAPTURING LOGGER
// =============================================================================

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct Capture;

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let entry = (record.level(), record.args().to_string());
        CAPTURED.with(|c| c.borrow_mut().push(entry));
    }

    fn flush(&self) {}
}

static LOGGER: Capture = Capture;
static INIT: Once = Once::new();

fn capture() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
}

fn warnings() -> Vec<String> {
    CAPTURED.with(|c| {
        c.borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, message)| message.clone())
            .collect()
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn measure_without_owner_warns() {
    capture();
    let mut manager = LayoutManager::new();
    let node = manager.create_node().unwrap();
    manager.set_measure_function(node, Some(Arc::new(|_, _, _, _, _| Size::ZERO)));

    let warnings = warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("no owner"));
    assert!(manager.has_measure_function(node));
}

#[test]
fn baseline_without_owner_warns() {
    capture();
    let mut manager = LayoutManager::new();
    let node = manager.create_node().unwrap();
    manager.set_baseline_function(node, Some(Arc::new(|_, _, _| 0.0_f32)));
    assert_eq!(warnings().len(), 1);
}

#[test]
fn clearing_owner_with_callbacks_warns() {
    capture();
    let mut manager = LayoutManager::new();
    let node = manager.create_node().unwrap();
    let owner: Arc<dyn std::any::Any + Send + Sync> = Arc::new("label");
    manager.set_owner(node, Some(Arc::downgrade(&owner)));
    manager.set_measure_function(node, Some(Arc::new(|_, _, _, _, _| Size::new(4.0, 1.0))));
    assert!(warnings().is_empty());

    manager.set_owner(node, None);
    let warnings = warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("owner cleared"));
    assert!(manager.owner(node).is_none());
}

#[test]
fn well_formed_usage_is_silent() {
    capture();
    let mut manager = LayoutManager::new();
    let node = manager.create_node().unwrap();
    let owner: Arc<dyn std::any::Any + Send + Sync> = Arc::new(7_i32);
    manager.set_owner(node, Some(Arc::downgrade(&owner)));
    manager.set_measure_function(node, Some(Arc::new(|_, _, _, _, _| Size::ZERO)));
    manager.set_measure_function(node, None);
    manager.set_owner(node, None);
    assert!(warnings().is_empty());
}
