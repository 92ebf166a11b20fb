use indexmap::IndexMap;

use crate::model::item::{ItemId, ItemRef, TrackedItem};

/// The hotlist: tracked items plus their display order.
///
/// Pinned and unpinned items live in two separate id sequences. Iteration
/// yields the pinned sequence (in manual drag order) followed by the
/// unpinned sequence (in insertion order). An item's `is_pinned` flag always
/// agrees with the sequence that holds it.
#[derive(Debug, Clone, Default)]
pub struct Store {
    items: IndexMap<ItemId, TrackedItem>,
    pinned: Vec<ItemId>,
    unpinned: Vec<ItemId>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Build a store from items in persisted order. Pinned items keep their
    /// relative order even if the persisted sequence interleaved them.
    /// Duplicate ids (hand-edited files) keep the first record.
    pub fn from_items(items: Vec<TrackedItem>) -> Self {
        let mut store = Store::new();
        for item in items {
            if store.items.contains_key(&item.id) {
                continue;
            }
            store.add(item);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in display order: pinned first, then unpinned.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedItem> {
        self.pinned
            .iter()
            .chain(self.unpinned.iter())
            .filter_map(|id| self.items.get(id))
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.pinned.iter().chain(self.unpinned.iter()).copied().collect()
    }

    pub fn pinned(&self) -> impl Iterator<Item = &TrackedItem> {
        self.pinned.iter().filter_map(|id| self.items.get(id))
    }

    pub fn unpinned(&self) -> impl Iterator<Item = &TrackedItem> {
        self.unpinned.iter().filter_map(|id| self.items.get(id))
    }

    /// Snapshot of all items in display order (the persisted order).
    pub fn to_vec(&self) -> Vec<TrackedItem> {
        self.iter().cloned().collect()
    }

    pub fn get(&self, id: ItemId) -> Option<&TrackedItem> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut TrackedItem> {
        self.items.get_mut(&id)
    }

    /// Resolve a reference to an item id. Legacy references resolve to the
    /// first match in display order.
    pub fn resolve(&self, item_ref: &ItemRef) -> Option<ItemId> {
        match item_ref {
            ItemRef::Id(id) => self.items.contains_key(id).then_some(*id),
            ItemRef::Legacy {
                file_path,
                line_number,
                added_at,
            } => self
                .iter()
                .find(|i| i.matches_legacy(file_path, *line_number, *added_at))
                .map(|i| i.id),
        }
    }

    /// Find the single item whose id starts with `prefix` (hex digits,
    /// dashes ignored). Returns `Err` with the match count when it is not
    /// exactly one.
    pub fn find_by_id_prefix(&self, prefix: &str) -> Result<ItemId, usize> {
        let needle = prefix.replace('-', "").to_ascii_lowercase();
        if needle.is_empty() {
            return Err(self.items.len());
        }
        let matches: Vec<ItemId> = self
            .ids()
            .into_iter()
            .filter(|id| id.to_string().replace('-', "").starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [only] => Ok(*only),
            _ => Err(matches.len()),
        }
    }

    /// Whether an item already tracks this exact line.
    pub fn tracks_line(&self, file_path: &str, line_number: usize) -> bool {
        self.item_at_line(file_path, line_number).is_some()
    }

    /// The first item, in display order, that tracks this exact line.
    pub fn item_at_line(&self, file_path: &str, line_number: usize) -> Option<ItemId> {
        self.iter()
            .find(|i| i.file_path == file_path && i.line_number == line_number)
            .map(|i| i.id)
    }

    /// Insert an item. Pinned items go to the end of the pinned sequence,
    /// unpinned items to the end of the unpinned sequence. An item whose id
    /// is already present replaces the old record and takes the new position.
    pub fn add(&mut self, item: TrackedItem) -> ItemId {
        let id = item.id;
        if self.items.contains_key(&id) {
            self.pinned.retain(|p| *p != id);
            self.unpinned.retain(|u| *u != id);
        }
        if item.is_pinned {
            self.pinned.push(id);
        } else {
            self.unpinned.push(id);
        }
        self.items.insert(id, item);
        id
    }

    /// Remove the referenced item. Absent items are not an error.
    pub fn remove(&mut self, item_ref: &ItemRef) -> Option<TrackedItem> {
        let id = self.resolve(item_ref)?;
        self.pinned.retain(|p| *p != id);
        self.unpinned.retain(|u| *u != id);
        self.items.shift_remove(&id)
    }

    /// Pin the item, moving it to the end of the pinned sequence.
    /// Returns false if the item does not exist.
    pub fn pin(&mut self, item_ref: &ItemRef) -> bool {
        let Some(id) = self.resolve(item_ref) else {
            return false;
        };
        self.pinned.retain(|p| *p != id);
        self.unpinned.retain(|u| *u != id);
        self.pinned.push(id);
        if let Some(item) = self.items.get_mut(&id) {
            item.is_pinned = true;
        }
        true
    }

    /// Unpin the item. It becomes the first unpinned item, directly after
    /// the remaining pinned ones. Unpinning an unpinned item changes nothing.
    pub fn unpin(&mut self, item_ref: &ItemRef) -> bool {
        let Some(id) = self.resolve(item_ref) else {
            return false;
        };
        if let Some(pos) = self.pinned.iter().position(|p| *p == id) {
            self.pinned.remove(pos);
            self.unpinned.insert(0, id);
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.is_pinned = false;
        }
        true
    }

    /// Move a pinned item to the drop target's position within the pinned
    /// sequence. The target index is taken before the dragged item is
    /// removed, so dragging down lands after the target and dragging up
    /// lands before it. Returns false unless both items are pinned.
    pub fn reorder_pinned(&mut self, dragged: &ItemRef, target: &ItemRef) -> bool {
        let (Some(dragged_id), Some(target_id)) = (self.resolve(dragged), self.resolve(target))
        else {
            return false;
        };
        let (Some(from), Some(to)) = (
            self.pinned.iter().position(|p| *p == dragged_id),
            self.pinned.iter().position(|p| *p == target_id),
        ) else {
            return false;
        };
        if from == to {
            return true;
        }
        let id = self.pinned.remove(from);
        let to = to.min(self.pinned.len());
        self.pinned.insert(to, id);
        true
    }

    /// Remove every item, returning them in display order.
    pub fn clear(&mut self) -> Vec<TrackedItem> {
        let drained = self.to_vec();
        self.items.clear();
        self.pinned.clear();
        self.unpinned.clear();
        drained
    }

    /// Drop completed items whose completion time is before `boundary_ms`.
    pub fn purge_completed_before(&mut self, boundary_ms: i64) -> Vec<TrackedItem> {
        let stale: Vec<ItemId> = self
            .iter()
            .filter(|i| i.completed_at.is_some_and(|c| c < boundary_ms))
            .map(|i| i.id)
            .collect();
        stale
            .into_iter()
            .filter_map(|id| self.remove(&ItemRef::Id(id)))
            .collect()
    }
}
