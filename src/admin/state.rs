use serde::Serialize;

use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemPhase {
    Stable,
    /// A remote call for this item has not resolved yet.
    Pending,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    item: T,
    phase: ItemPhase,
    /// Last value the store confirmed, kept while an update is in flight.
    confirmed: Option<T>,
    /// Delete in flight; the slot keeps its place but is not listed.
    removing: bool,
}

impl<T> Slot<T> {
    fn stable(item: T) -> Self {
        Self {
            item,
            phase: ItemPhase::Stable,
            confirmed: None,
            removing: false,
        }
    }

    fn visible(&self) -> bool {
        !self.removing
    }

    fn committed(&self) -> Option<&T> {
        match self.phase {
            ItemPhase::Stable => Some(&self.item),
            ItemPhase::Pending => self.confirmed.as_ref(),
        }
    }
}

/// Ordered local mirror of one remote collection.
///
/// Items being removed disappear from the listing immediately but keep their
/// slot until the delete resolves, so a failed delete puts them back where
/// they were relative to everything else, however many deletes overlap.
#[derive(Debug, Clone)]
pub struct AdminListState<T> {
    slots: Vec<Slot<T>>,
    next_placeholder: i64,
}

impl<T: Record> Default for AdminListState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> AdminListState<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_placeholder: -1,
        }
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.slots = items.into_iter().map(Slot::stable).collect();
    }

    pub fn items(&self) -> Vec<T> {
        self.slots
            .iter()
            .filter(|slot| slot.visible())
            .map(|slot| slot.item.clone())
            .collect()
    }

    /// The list as the store last confirmed it: placeholders are skipped,
    /// in-flight updates show their previous value and in-flight removals
    /// are still present.
    pub fn committed_items(&self) -> Vec<T> {
        self.slots
            .iter()
            .filter_map(|slot| slot.committed().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.visible()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.visible() && slot.item.id() == id)
    }

    fn removing_position(&self, id: i64) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.removing && slot.item.id() == id)
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.position(id).map(|index| &self.slots[index].item)
    }

    pub fn phase(&self, id: i64) -> Option<ItemPhase> {
        if self.removing_position(id).is_some() {
            return Some(ItemPhase::Pending);
        }
        self.position(id).map(|index| self.slots[index].phase)
    }

    pub fn any_pending(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.removing || slot.phase == ItemPhase::Pending)
    }

    /// Placeholders count down from -1; store ids are positive.
    pub fn next_placeholder_id(&mut self) -> i64 {
        let id = self.next_placeholder;
        self.next_placeholder = self.next_placeholder.checked_sub(1).unwrap_or(-1);
        id
    }

    /// Append a provisional item under a fresh placeholder id.
    pub fn push_pending(&mut self, mut item: T) -> i64 {
        let id = self.next_placeholder_id();
        item.set_id(id);
        self.slots.push(Slot {
            item,
            phase: ItemPhase::Pending,
            confirmed: None,
            removing: false,
        });
        id
    }

    /// Swap in the optimistic value and mark the item pending.
    pub fn apply_pending(&mut self, id: i64, item: T) -> bool {
        match self.position(id) {
            Some(index) => {
                let slot = &mut self.slots[index];
                let previous = std::mem::replace(&mut slot.item, item);
                if slot.phase == ItemPhase::Stable {
                    slot.confirmed = Some(previous);
                }
                slot.phase = ItemPhase::Pending;
                true
            }
            None => false,
        }
    }

    /// Resolve a pending item to `item` (authoritative row or snapshot). The
    /// id may change, as when a placeholder is replaced.
    pub fn settle(&mut self, id: i64, item: T) -> bool {
        match self.position(id) {
            Some(index) => {
                self.slots[index] = Slot::stable(item);
                true
            }
            None => false,
        }
    }

    pub fn discard(&mut self, id: i64) -> Option<T> {
        self.position(id).map(|index| self.slots.remove(index).item)
    }

    pub fn take_for_removal(&mut self, id: i64) -> Option<T> {
        let index = self.position(id)?;
        let slot = &mut self.slots[index];
        slot.removing = true;
        Some(slot.item.clone())
    }

    /// Show a removed item again in the slot it never left.
    pub fn restore_removed(&mut self, id: i64) -> bool {
        match self.removing_position(id) {
            Some(index) => {
                self.slots[index].removing = false;
                true
            }
            None => false,
        }
    }

    pub fn forget_removed(&mut self, id: i64) -> Option<T> {
        self.removing_position(id)
            .map(|index| self.slots.remove(index).item)
    }
}
