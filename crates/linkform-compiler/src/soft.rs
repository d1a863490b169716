//! Bounded strong retention for weakly cached values.
//!
//! Caches hold derived forms and handles through `Weak`. A `SoftRetainer`
//! keeps a bounded set of them strongly reachable using the CLOCK
//! second-chance policy, so recently used entries survive while the rest
//! can be dropped once nothing else refers to them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

struct Slot<T: ?Sized> {
    value: Arc<T>,
    referenced: bool,
}

struct Clock<T: ?Sized> {
    slots: Vec<Slot<T>>,
    index: HashMap<usize, usize>,
    hand: usize,
}

pub struct SoftRetainer<T: ?Sized> {
    capacity: usize,
    clock: Mutex<Clock<T>>,
}

fn address<T: ?Sized>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

impl<T: ?Sized> SoftRetainer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            clock: Mutex::new(Clock {
                slots: Vec::with_capacity(capacity.min(64)),
                index: HashMap::new(),
                hand: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keep `value` alive, or mark it recently used if already retained.
    pub fn retain(&self, value: &Arc<T>) {
        if self.capacity == 0 {
            return;
        }
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let addr = address(value);
        if let Some(&slot) = clock.index.get(&addr) {
            clock.slots[slot].referenced = true;
            return;
        }
        let fresh = Slot {
            value: Arc::clone(value),
            referenced: false,
        };
        if clock.slots.len() < self.capacity {
            clock.slots.push(fresh);
            let slot = clock.slots.len() - 1;
            clock.index.insert(addr, slot);
            return;
        }
        // Second chance: skip referenced slots once, clearing the bit.
        loop {
            let hand = clock.hand;
            clock.hand = (hand + 1) % clock.slots.len();
            if clock.slots[hand].referenced {
                clock.slots[hand].referenced = false;
                continue;
            }
            let evicted = std::mem::replace(&mut clock.slots[hand], fresh);
            clock.index.remove(&address(&evicted.value));
            clock.index.insert(addr, hand);
            return;
        }
    }

    pub fn len(&self) -> usize {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every retained value.
    pub fn clear(&self) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.slots.clear();
        clock.index.clear();
        clock.hand = 0;
    }
}
