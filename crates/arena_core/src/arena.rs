//! Generational entity storage with deferred removal.
//!
//! Entities live in a dense slot array. A [`Handle`] pairs a slot index with
//! the slot's generation, so a handle to a removed entity never resolves to
//! whatever later reuses the slot.
//!
//! Removal is two-phase. [`EntityArena::remove`] only marks an entity; it
//! stays addressable but is skipped by iteration. [`EntityArena::compact`]
//! frees every marked slot at once. The frame orchestrator calls `compact`
//! once per category after all decisions for that category are made, so no
//! pass ever mutates the collection it is walking.

use serde::{Deserialize, Serialize};

/// Stable reference to an entity in an [`EntityArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
    removed: bool,
}

/// Dense storage addressed by generational handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for EntityArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityArena<T> {
    /// Create an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Insert an entity, reusing a freed slot when one exists.
    pub fn insert(&mut self, value: T) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.removed = false;
            return Handle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
            removed: false,
        });
        Handle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: Handle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    /// Get an entity that has not been marked for removal.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slot(handle)
            .filter(|slot| !slot.removed)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutable access to an entity that has not been marked for removal.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation && !slot.removed)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Check whether a handle still resolves to a live entity.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Mark an entity for removal at the next [`compact`](Self::compact).
    ///
    /// Returns `false` if the handle is stale or already marked.
    pub fn remove(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if slot.generation != handle.generation || slot.value.is_none() || slot.removed {
            return false;
        }
        slot.removed = true;
        self.live -= 1;
        true
    }

    /// Whether a handle is marked but not yet compacted.
    #[must_use]
    pub fn is_pending_removal(&self, handle: Handle) -> bool {
        self.slot(handle).is_some_and(|slot| slot.removed)
    }

    /// Free every marked slot. Returns how many entities were dropped.
    pub fn compact(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.removed {
                slot.value = None;
                slot.removed = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        freed
    }

    /// Number of live, unmarked entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether no live entity remains.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Mark every entity for removal.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.value.is_some() && !slot.removed {
                slot.removed = true;
            }
        }
        self.live = 0;
    }

    /// Iterate live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            if slot.removed {
                return None;
            }
            slot.value.as_ref().map(|value| {
                (
                    Handle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Iterate live entities mutably in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            if slot.removed {
                return None;
            }
            let generation = slot.generation;
            slot.value.as_mut().map(|value| {
                (
                    Handle {
                        index: index as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }

    /// Snapshot of live handles in slot order.
    ///
    /// Use this when a pass needs to mutate other state while walking.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Iterate live entity values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, value)| value)
    }
}

impl<T> FromIterator<T> for EntityArena<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arena = Self::new();
        for value in iter {
            arena.insert(value);
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_is_deferred() {
        let mut arena: EntityArena<i32> = [1, 2, 3].into_iter().collect();
        let handles = arena.handles();
        assert!(arena.remove(handles[1]));
        assert!(!arena.remove(handles[1]));

        assert_eq!(arena.len(), 2);
        assert!(arena.get(handles[1]).is_none());
        assert!(arena.is_pending_removal(handles[1]));
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![1, 3]);

        assert_eq!(arena.compact(), 1);
        assert!(!arena.is_pending_removal(handles[1]));
        assert_eq!(arena.compact(), 0);
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena = EntityArena::new();
        let old = arena.insert("robot");
        arena.remove(old);
        arena.compact();

        let new = arena.insert("projectile");
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new), Some(&"projectile"));
    }

    #[test]
    fn test_iteration_order_is_slot_order() {
        let mut arena: EntityArena<u8> = (0..5).collect();
        let handles = arena.handles();
        arena.remove(handles[0]);
        arena.remove(handles[3]);
        arena.compact();
        arena.insert(10);
        arena.insert(11);
        // Free list hands back slot 3 first, then slot 0.
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![11, 1, 2, 10, 4]);
    }

    #[test]
    fn test_clear_marks_everything() {
        let mut arena: EntityArena<u8> = (0..3).collect();
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.iter().count(), 0);
        assert_eq!(arena.compact(), 3);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut arena = EntityArena::new();
        let h = arena.insert(1);
        if let Some(v) = arena.get_mut(h) {
            *v += 41;
        }
        assert_eq!(arena.get(h), Some(&42));
    }
}
