//! End-to-end node lifecycle through the public API.
//!
//! A recording processor stands in for the layout algorithm so the tests
//! can observe exactly what the manager hands over.

use std::sync::{Arc, Mutex};

use flexcore::{
    Direction, Edge, LayoutError, LayoutManager, LayoutNode, LayoutProcessor, ManagerOptions,
    StyleValue,
};

// =============================================================================
// RECORDING PROCESSOR
// =============================================================================

#[derive(Default)]
struct Recording {
    calls: Mutex<Vec<(LayoutNode, f32, f32, Direction, usize)>>,
}

impl LayoutProcessor for Recording {
    fn calculate_layout(
        &self,
        manager: &mut LayoutManager,
        node: LayoutNode,
        width: f32,
        height: f32,
        direction: Direction,
    ) {
        let children = manager.child_count(node);
        self.calls.lock().unwrap().push((node, width, height, direction, children));

        // Fixed geometry: stack children vertically, 10 units each.
        let kids: Vec<_> = manager.children(node).collect();
        for (i, child) in kids.into_iter().enumerate() {
            let computed = manager.computed_mut(child);
            computed.top = i as f32 * 10.0;
            computed.height = 10.0;
            manager.set_dirty(child, false);
        }
        manager.set_dirty(node, false);
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn basic_tree_is_handed_to_processor() {
    let recording = Arc::new(Recording::default());
    let mut manager = LayoutManager::new();
    manager.set_processor(recording.clone());

    let root = manager.create_node().unwrap();
    let a = manager.create_node().unwrap();
    let b = manager.create_node().unwrap();
    manager.insert_child(root, 0, a).unwrap();
    manager.insert_child(root, 1, b).unwrap();

    manager.calculate_layout(root, 300.0, f32::NAN, Direction::Rtl);

    {
        let calls = recording.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (node, width, height, direction, children) = calls[0];
        assert_eq!(node, root);
        assert_eq!(width, 300.0);
        assert!(height.is_nan());
        assert_eq!(direction, Direction::Rtl);
        assert_eq!(children, 2);
    }

    assert_eq!(manager.computed(b).top, 10.0);
    assert!(!manager.is_dirty(root));

    // Inherit reaches the processor already resolved, from the node or its ancestors.
    manager.update_style(root, |s| s.direction = Direction::Rtl);
    manager.calculate_layout(root, 10.0, 10.0, Direction::Inherit);
    manager.calculate_layout(a, 10.0, 10.0, Direction::Inherit);

    let calls = recording.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].3, Direction::Rtl);
    assert_eq!((calls[2].0, calls[2].3), (a, Direction::Rtl));
}

#[test]
fn inherit_without_styled_ancestor_falls_back_to_ltr() {
    let recording = Arc::new(Recording::default());
    let mut manager = LayoutManager::new();
    manager.set_processor(recording.clone());
    let root = manager.create_node().unwrap();

    manager.calculate_layout(root, f32::NAN, f32::NAN, Direction::Inherit);
    assert_eq!(recording.calls.lock().unwrap()[0].3, Direction::Ltr);
}

#[test]
fn deferred_destruction_keeps_high_water_mark_across_bursts() {
    const N: usize = 300;
    let mut manager = LayoutManager::new();

    let mut nodes: Vec<_> = (0..N).map(|_| manager.create_node().unwrap()).collect();
    assert_eq!(manager.high_water_mark(), N);
    let chunks = manager.chunk_count();

    for node in &mut nodes {
        manager.destroy_node(node);
    }
    assert_eq!(manager.pending_free_count(), N);
    manager.collect();
    assert_eq!(manager.node_count(), 0);

    let second: Vec<_> = (0..N).map(|_| manager.create_node().unwrap()).collect();
    assert_eq!(manager.node_count(), N);
    assert_eq!(manager.high_water_mark(), N);
    assert_eq!(manager.chunk_count(), chunks);
    assert!(second.iter().all(|&node| manager.contains(node)));
}

#[test]
fn processor_swap_takes_effect_on_next_layout() {
    let first = Arc::new(Recording::default());
    let second = Arc::new(Recording::default());
    let mut manager = LayoutManager::new();
    let root = manager.create_node().unwrap();

    manager.set_processor(first.clone());
    manager.calculate_layout(root, f32::NAN, f32::NAN, Direction::Ltr);
    manager.set_processor(second.clone());
    manager.calculate_layout(root, f32::NAN, f32::NAN, Direction::Ltr);

    assert_eq!(first.calls.lock().unwrap().len(), 1);
    assert_eq!(second.calls.lock().unwrap().len(), 1);
}

#[test]
fn deferred_destruction_reuses_slots_with_clean_records() {
    let mut manager = LayoutManager::new();
    let mut node = manager.create_node().unwrap();
    let stale = node;
    let index = node.handle().index();
    manager.update_style(node, |s| s.flex_grow = 4.0);
    manager.update_margin(node, |m| m.set(Edge::All, StyleValue::point(3.0)));

    manager.destroy_node(&mut node);
    assert!(node.is_undefined());
    assert_eq!(manager.pending_free_count(), 1);
    manager.collect();

    let fresh = manager.create_node().unwrap();
    assert_eq!(fresh.handle().index(), index);
    assert_ne!(fresh, stale);
    assert!(manager.style(fresh).flex_grow.is_nan());
    assert!(manager.margin(fresh).all.is_undefined());
    assert!(!manager.contains(stale));
    assert_eq!(
        manager.remove_child(stale, fresh),
        Err(LayoutError::StaleHandle(stale.handle()))
    );
}

#[test]
fn chunked_storage_grows_without_moving_handles() {
    let mut manager = LayoutManager::new();
    let nodes: Vec<_> = (0..600).map(|_| manager.create_node().unwrap()).collect();
    for (i, &node) in nodes.iter().enumerate() {
        manager.style_mut(node).flex_grow = i as f32;
    }

    assert!(manager.chunk_count() >= 3);
    assert_eq!(manager.node_count(), 600);
    for (i, &node) in nodes.iter().enumerate() {
        assert_eq!(manager.style(node).flex_grow, i as f32);
    }
}

#[test]
fn clones_share_config_and_style_but_not_children() {
    let mut manager = LayoutManager::new();
    let config = manager.create_config();
    manager.set_use_web_defaults(config, true);

    let source = manager.create_node_with_config(config).unwrap();
    let child = manager.create_node().unwrap();
    manager.insert_child(source, 0, child).unwrap();
    manager.update_dimensions(source, |d| d.width = StyleValue::percent(80.0));

    let clone = manager.create_node_from(source).unwrap();
    assert_eq!(manager.node_config(clone), config);
    assert_eq!(manager.dimensions(clone), manager.dimensions(source));
    assert_eq!(manager.child_count(clone), 0);
    assert!(manager.parent(clone).is_undefined());
}

#[test]
fn dispose_then_drop_is_quiet() {
    let mut manager = LayoutManager::with_options(ManagerOptions::default());
    let root = manager.create_node().unwrap();
    let child = manager.create_node().unwrap();
    manager.insert_child(root, 0, child).unwrap();

    manager.dispose();
    assert!(manager.is_disposed());
    assert_eq!(manager.node_count(), 0);
    assert_eq!(manager.create_node(), Err(LayoutError::Disposed));
    drop(manager);
}
