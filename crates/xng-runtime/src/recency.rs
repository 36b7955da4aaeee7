//! Recency queue: a slab-backed doubly-linked list ordered by last use.
//!
//! Each entry is addressed by a [`Link`] handed out on insertion. Promoting a
//! link moves its entry to the front in O(1), so iterating from the front
//! yields entries from most to least recently promoted, and the back holds
//! the entries that have gone longest without activity.

use serde::{Deserialize, Serialize};

/// Handle to an entry in a [`RecencyQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link(usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyQueue<T> {
    slots: Vec<Option<Slot<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> RecencyQueue<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert as the most recent entry.
    pub fn push_front(&mut self, value: T) -> Link {
        let i = self.alloc(value);
        self.attach_front(i);
        Link(i)
    }

    /// Insert as the least recent entry.
    pub fn push_back(&mut self, value: T) -> Link {
        let i = self.alloc(value);
        self.attach_back(i);
        Link(i)
    }

    /// Move an entry to the front. Returns `false` for a removed link.
    pub fn promote(&mut self, link: Link) -> bool {
        if self.slot(link.0).is_none() {
            return false;
        }
        if self.head != Some(link.0) {
            self.detach(link.0);
            self.attach_front(link.0);
        }
        true
    }

    pub fn remove(&mut self, link: Link) -> Option<T> {
        self.slot(link.0)?;
        self.detach(link.0);
        let slot = self.slots[link.0].take()?;
        self.free.push(link.0);
        self.len -= 1;
        Some(slot.value)
    }

    pub fn get(&self, link: Link) -> Option<&T> {
        self.slot(link.0).map(|s| &s.value)
    }

    pub fn get_mut(&mut self, link: Link) -> Option<&mut T> {
        self.slot_mut(link.0).map(|s| &mut s.value)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|i| self.slot(i)).map(|s| &s.value)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|i| self.slot(i)).map(|s| &s.value)
    }

    /// Iterate from most to least recent.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            cursor: self.head,
            forward: true,
        }
    }

    /// Iterate from least to most recent.
    pub fn iter_rev(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            cursor: self.tail,
            forward: false,
        }
    }

    /// Walk from the back, removing every entry for which `reclaim` holds.
    /// Returns the removed values in the order they were visited.
    pub fn sweep<F>(&mut self, mut reclaim: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = Vec::new();
        let mut cursor = self.tail;
        while let Some(i) = cursor {
            let Some(slot) = self.slot(i) else { break };
            cursor = slot.prev;
            if reclaim(&slot.value) {
                if let Some(value) = self.remove(Link(i)) {
                    removed.push(value);
                }
            }
        }
        removed
    }

    fn slot(&self, i: usize) -> Option<&Slot<T>> {
        self.slots.get(i).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, i: usize) -> Option<&mut Slot<T>> {
        self.slots.get_mut(i).and_then(Option::as_mut)
    }

    fn alloc(&mut self, value: T) -> usize {
        let slot = Some(Slot {
            value,
            prev: None,
            next: None,
        });
        self.len += 1;
        match self.free.pop() {
            Some(i) => {
                self.slots[i] = slot;
                i
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn detach(&mut self, i: usize) {
        let Some(slot) = self.slot_mut(i) else { return };
        let (prev, next) = (slot.prev.take(), slot.next.take());
        match prev {
            Some(p) => {
                if let Some(s) = self.slot_mut(p) {
                    s.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(s) = self.slot_mut(n) {
                    s.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn attach_front(&mut self, i: usize) {
        let old = self.head;
        if let Some(slot) = self.slot_mut(i) {
            slot.prev = None;
            slot.next = old;
        }
        match old {
            Some(h) => {
                if let Some(s) = self.slot_mut(h) {
                    s.prev = Some(i);
                }
            }
            None => self.tail = Some(i),
        }
        self.head = Some(i);
    }

    fn attach_back(&mut self, i: usize) {
        let old = self.tail;
        if let Some(slot) = self.slot_mut(i) {
            slot.prev = old;
            slot.next = None;
        }
        match old {
            Some(t) => {
                if let Some(s) = self.slot_mut(t) {
                    s.next = Some(i);
                }
            }
            None => self.head = Some(i),
        }
        self.tail = Some(i);
    }
}

impl<T> Default for RecencyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    queue: &'a RecencyQueue<T>,
    cursor: Option<usize>,
    forward: bool,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let slot = self.queue.slot(self.cursor?)?;
        self.cursor = if self.forward { slot.next } else { slot.prev };
        Some(&slot.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(q: &RecencyQueue<u32>) -> Vec<u32> {
        q.iter().copied().collect()
    }

    #[test]
    fn promote_moves_to_front() {
        let mut q = RecencyQueue::new();
        let a = q.push_back(1);
        let _b = q.push_back(2);
        let c = q.push_back(3);
        assert_eq!(contents(&q), vec![1, 2, 3]);

        assert!(q.promote(c));
        assert_eq!(contents(&q), vec![3, 1, 2]);
        assert!(q.promote(a));
        assert_eq!(contents(&q), vec![1, 3, 2]);
        assert_eq!(q.iter_rev().copied().collect::<Vec<_>>(), vec![2, 3, 1]);
        assert_eq!(q.front(), Some(&1));
        assert_eq!(q.back(), Some(&2));
    }

    #[test]
    fn removed_links_are_recycled() {
        let mut q = RecencyQueue::new();
        let a = q.push_front(10);
        let b = q.push_front(20);
        assert_eq!(q.remove(a), Some(10));
        assert!(!q.promote(a));
        assert_eq!(q.remove(a), None);

        let c = q.push_back(30);
        assert_eq!(c, a);
        assert_eq!(contents(&q), vec![20, 30]);
        assert_eq!(q.get(b), Some(&20));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn sweep_visits_from_the_back() {
        let mut q = RecencyQueue::new();
        for v in 1..=5 {
            q.push_front(v);
        }
        // front to back: 5 4 3 2 1
        let removed = q.sweep(|v| v % 2 == 1);
        assert_eq!(removed, vec![1, 3, 5]);
        assert_eq!(contents(&q), vec![4, 2]);

        let removed = q.sweep(|_| true);
        assert_eq!(removed, vec![2, 4]);
        assert!(q.is_empty());
        assert_eq!(q.front(), None);
    }
}
