//! Cross-thread destruction.
//!
//! Only the deferred-free queue is shared. Worker threads push handles
//! through `DestroyQueue` or the registry while the owner thread keeps
//! creating nodes; the owner reclaims slots on its own schedule.

use std::sync::mpsc;
use std::thread;

use flexcore::engine::registry;
use flexcore::{LayoutManager, LayoutNode};

#[test]
fn destroy_queue_from_worker_threads() {
    let mut manager = LayoutManager::new();
    let nodes: Vec<LayoutNode> = (0..64).map(|_| manager.create_node().unwrap()).collect();

    let handles: Vec<_> = nodes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let queue = manager.destroy_queue();
            let chunk = chunk.to_vec();
            thread::Builder::new()
                .name(format!("destroyer-{i}"))
                .spawn(move || {
                    for node in chunk {
                        queue.destroy(node);
                    }
                })
                .unwrap()
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.pending_free_count(), 64);
    manager.collect();
    assert_eq!(manager.node_count(), 0);
    assert!(nodes.iter().all(|&node| !manager.contains(node)));
}

#[test]
fn owner_keeps_creating_while_workers_destroy() {
    let mut manager = LayoutManager::new();
    let (tx, rx) = mpsc::channel::<LayoutNode>();

    let worker = thread::Builder::new()
        .name("finalizer".to_string())
        .spawn(move || {
            let mut destroyed = 0;
            for node in rx {
                if registry::destroy_detached(node) {
                    destroyed += 1;
                }
            }
            destroyed
        })
        .unwrap();

    for _ in 0..200 {
        let node = manager.create_node().unwrap();
        tx.send(node).unwrap();
    }
    drop(tx);
    assert_eq!(worker.join().unwrap(), 200);

    manager.collect();
    assert_eq!(manager.node_count(), 0);
    let high_water = manager.high_water_mark();
    assert!(high_water <= 200);

    // Every slot is free again; a second burst of the same size reuses them.
    for _ in 0..high_water {
        manager.create_node().unwrap();
    }
    assert_eq!(manager.high_water_mark(), high_water);
}

#[test]
fn remote_destroy_releases_hierarchy_on_drain() {
    let mut manager = LayoutManager::new();
    let root = manager.create_node().unwrap();
    let middle = manager.create_node().unwrap();
    let leaf = manager.create_node().unwrap();
    manager.insert_child(root, 0, middle).unwrap();
    manager.insert_child(middle, 0, leaf).unwrap();

    let queue = manager.destroy_queue();
    thread::spawn(move || queue.destroy(middle)).join().unwrap();

    // Nothing changes until the owner drains.
    assert_eq!(manager.child_count(root), 1);
    manager.collect();
    assert_eq!(manager.child_count(root), 0);
    assert!(manager.parent(leaf).is_undefined());
    assert!(!manager.contains(middle));
}

#[test]
fn queue_outliving_manager_is_harmless() {
    let mut manager = LayoutManager::new();
    let node = manager.create_node().unwrap();
    let queue = manager.destroy_queue();
    drop(manager);

    thread::spawn(move || queue.destroy(node)).join().unwrap();
    assert!(!registry::destroy_detached(node));
}
