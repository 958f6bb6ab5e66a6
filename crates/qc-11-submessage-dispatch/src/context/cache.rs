//! # Isolated Context Arena
//!
//! A stack of overlay layers over a read-only base snapshot. Layer 0 is the
//! root, owned by the enclosing transaction. Every submessage gets a layer of
//! its own; commit merges it into the layer below, discard drops it.
//!
//! Layers are addressed by [`LayerId`] and only the innermost open layer can
//! be committed or discarded.

use crate::domain::entities::Event;
use crate::errors::ContextError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Committed key/value state the arena reads through to.
pub type StoreMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Buffered writes of a layer. `None` marks a deletion.
pub type WriteSet = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Handle of an open layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(usize);

impl LayerId {
    /// The root layer.
    pub const ROOT: Self = Self(0);

    /// Depth of the layer, root is 0.
    #[must_use]
    pub const fn depth(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
struct Layer {
    writes: WriteSet,
    events: Vec<Event>,
}

/// Root-layer effects handed back to the enclosing transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootChanges {
    /// Writes to apply to the store.
    pub writes: WriteSet,
    /// Events to publish, in emission order.
    pub events: Vec<Event>,
}

/// Stack of overlay layers.
#[derive(Debug)]
pub struct ContextArena {
    base: Arc<StoreMap>,
    layers: Vec<Layer>,
}

impl Default for ContextArena {
    fn default() -> Self {
        Self::new(Arc::new(StoreMap::new()))
    }
}

impl ContextArena {
    /// Creates an arena with only the root layer open.
    #[must_use]
    pub fn new(base: Arc<StoreMap>) -> Self {
        Self {
            base,
            layers: vec![Layer::default()],
        }
    }

    /// Innermost open layer.
    #[must_use]
    pub fn top(&self) -> LayerId {
        LayerId(self.layers.len() - 1)
    }

    /// Number of open layers, root included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Opens a new layer on top of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NotInnermost`] if `parent` is not the top.
    pub fn open_layer(&mut self, parent: LayerId) -> Result<LayerId, ContextError> {
        self.ensure_top(parent)?;
        self.layers.push(Layer::default());
        Ok(self.top())
    }

    /// Merges the innermost layer into its parent.
    ///
    /// # Errors
    ///
    /// Fails for the root layer or a layer that is not the top.
    pub fn commit(&mut self, layer: LayerId) -> Result<(), ContextError> {
        let child = self.pop(layer)?;
        let parent = self.top_layer_mut();
        parent.writes.extend(child.writes);
        parent.events.extend(child.events);
        Ok(())
    }

    /// Drops the innermost layer with all its writes and events.
    ///
    /// # Errors
    ///
    /// Fails for the root layer or a layer that is not the top.
    pub fn discard(&mut self, layer: LayerId) -> Result<(), ContextError> {
        self.pop(layer).map(drop)
    }

    /// Removes and returns the events buffered in `layer`.
    #[must_use]
    pub fn take_events(&mut self, layer: LayerId) -> Vec<Event> {
        self.layers
            .get_mut(layer.0)
            .map(|l| std::mem::take(&mut l.events))
            .unwrap_or_default()
    }

    /// Events buffered in `layer`.
    #[must_use]
    pub fn events(&self, layer: LayerId) -> &[Event] {
        self.layers
            .get(layer.0)
            .map(|l| l.events.as_slice())
            .unwrap_or(&[])
    }

    /// Reads `key` as seen from `layer`.
    #[must_use]
    pub fn get(&self, layer: LayerId, key: &[u8]) -> Option<Vec<u8>> {
        let visible = layer.0.min(self.layers.len() - 1);
        for l in self.layers[..=visible].iter().rev() {
            if let Some(write) = l.writes.get(key) {
                return write.clone();
            }
        }
        self.base.get(key).cloned()
    }

    /// Buffers a write in `layer`.
    pub fn set(&mut self, layer: LayerId, key: Vec<u8>, value: Vec<u8>) {
        if let Some(l) = self.layers.get_mut(layer.0) {
            l.writes.insert(key, Some(value));
        }
    }

    /// Buffers a deletion in `layer`.
    pub fn remove(&mut self, layer: LayerId, key: Vec<u8>) {
        if let Some(l) = self.layers.get_mut(layer.0) {
            l.writes.insert(key, None);
        }
    }

    /// Appends an event to `layer`.
    pub fn emit_event(&mut self, layer: LayerId, event: Event) {
        if let Some(l) = self.layers.get_mut(layer.0) {
            l.events.push(event);
        }
    }

    /// Consumes the arena and returns the root layer's effects.
    ///
    /// Layers still open above the root are dropped.
    #[must_use]
    pub fn into_root_changes(mut self) -> RootChanges {
        self.layers.truncate(1);
        let root = self.layers.pop().unwrap_or_default();
        RootChanges {
            writes: root.writes,
            events: root.events,
        }
    }

    fn ensure_top(&self, layer: LayerId) -> Result<(), ContextError> {
        let top = self.top();
        if layer == top {
            Ok(())
        } else {
            Err(ContextError::NotInnermost {
                layer: layer.0,
                top: top.0,
            })
        }
    }

    fn pop(&mut self, layer: LayerId) -> Result<Layer, ContextError> {
        if layer == LayerId::ROOT {
            return Err(ContextError::RootLayer);
        }
        self.ensure_top(layer)?;
        self.layers.pop().ok_or(ContextError::RootLayer)
    }

    fn top_layer_mut(&mut self) -> &mut Layer {
        let top = self.layers.len() - 1;
        &mut self.layers[top]
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with(key: &[u8], value: &[u8]) -> ContextArena {
        let mut base = StoreMap::new();
        base.insert(key.to_vec(), value.to_vec());
        ContextArena::new(Arc::new(base))
    }

    #[test]
    fn test_reads_fall_through_layers() {
        let mut arena = arena_with(b"k", b"base");
        let child = arena.open_layer(LayerId::ROOT).unwrap();
        assert_eq!(arena.get(child, b"k"), Some(b"base".to_vec()));

        arena.set(child, b"k".to_vec(), b"child".to_vec());
        assert_eq!(arena.get(child, b"k"), Some(b"child".to_vec()));
        assert_eq!(arena.get(LayerId::ROOT, b"k"), Some(b"base".to_vec()));

        arena.remove(child, b"k".to_vec());
        assert_eq!(arena.get(child, b"k"), None);
    }

    #[test]
    fn test_commit_merges_into_parent() {
        let mut arena = ContextArena::default();
        let child = arena.open_layer(LayerId::ROOT).unwrap();
        arena.set(child, b"a".to_vec(), b"1".to_vec());
        arena.emit_event(child, Event::new("foo"));

        arena.commit(child).unwrap();
        assert_eq!(arena.depth(), 1);
        assert_eq!(arena.get(LayerId::ROOT, b"a"), Some(b"1".to_vec()));
        assert_eq!(arena.events(LayerId::ROOT), &[Event::new("foo")]);
    }

    #[test]
    fn test_discard_drops_everything() {
        let mut arena = ContextArena::default();
        arena.emit_event(LayerId::ROOT, Event::new("before"));
        let child = arena.open_layer(LayerId::ROOT).unwrap();
        arena.set(child, b"a".to_vec(), b"1".to_vec());
        arena.emit_event(child, Event::new("lost"));

        arena.discard(child).unwrap();
        assert_eq!(arena.get(LayerId::ROOT, b"a"), None);
        assert_eq!(arena.events(LayerId::ROOT), &[Event::new("before")]);
    }

    #[test]
    fn test_stack_discipline() {
        let mut arena = ContextArena::default();
        let outer = arena.open_layer(LayerId::ROOT).unwrap();
        let inner = arena.open_layer(outer).unwrap();

        assert_eq!(
            arena.commit(outer),
            Err(ContextError::NotInnermost { layer: 1, top: 2 })
        );
        assert!(matches!(
            arena.open_layer(outer),
            Err(ContextError::NotInnermost { .. })
        ));
        assert_eq!(arena.discard(LayerId::ROOT), Err(ContextError::RootLayer));

        arena.commit(inner).unwrap();
        arena.commit(outer).unwrap();
        assert_eq!(arena.top(), LayerId::ROOT);
    }

    #[test]
    fn test_nested_discard_keeps_outer_writes() {
        let mut arena = ContextArena::default();
        let outer = arena.open_layer(LayerId::ROOT).unwrap();
        arena.set(outer, b"x".to_vec(), b"outer".to_vec());
        let inner = arena.open_layer(outer).unwrap();
        arena.set(inner, b"x".to_vec(), b"inner".to_vec());
        assert_eq!(arena.get(inner, b"x"), Some(b"inner".to_vec()));

        arena.discard(inner).unwrap();
        assert_eq!(arena.get(outer, b"x"), Some(b"outer".to_vec()));
    }

    #[test]
    fn test_take_events_empties_layer() {
        let mut arena = ContextArena::default();
        let child = arena.open_layer(LayerId::ROOT).unwrap();
        arena.emit_event(child, Event::new("a"));
        assert_eq!(arena.take_events(child), vec![Event::new("a")]);
        assert!(arena.events(child).is_empty());
    }

    #[test]
    fn test_into_root_changes_drops_open_layers() {
        let mut arena = ContextArena::default();
        arena.set(LayerId::ROOT, b"r".to_vec(), b"1".to_vec());
        let child = arena.open_layer(LayerId::ROOT).unwrap();
        arena.set(child, b"c".to_vec(), b"2".to_vec());

        let changes = arena.into_root_changes();
        assert_eq!(changes.writes.len(), 1);
        assert_eq!(changes.writes.get(b"r".as_slice()), Some(&Some(b"1".to_vec())));
    }
}
