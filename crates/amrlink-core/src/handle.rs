//! Generic slot+generation handle table.
//!
//! Runtimes store their containers and arrays here and give out `u64`
//! handles. Released handles carry a stale generation and resolve to `None`
//! instead of aliasing whatever object reuses the slot.

/// Upper 32 bits index the slot, lower 32 bits carry its generation.
fn encode(slot: u32, generation: u32) -> u64 {
    (u64::from(slot) << 32) | u64::from(generation)
}

fn decode(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A slot+generation table mapping `u64` handles to owned values.
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    /// Create an empty handle table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Insert a value and return its handle.
    pub fn insert(&mut self, value: T) -> u64 {
        self.live += 1;
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    data: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.data = Some(value);
        encode(index, slot.generation)
    }

    fn slot(&self, handle: u64) -> Option<&Slot<T>> {
        let (index, generation) = decode(handle);
        self.slots
            .get(index as usize)
            .filter(|s| s.generation == generation)
    }

    fn slot_mut(&mut self, handle: u64) -> Option<&mut Slot<T>> {
        let (index, generation) = decode(handle);
        self.slots
            .get_mut(index as usize)
            .filter(|s| s.generation == generation)
    }

    /// Value behind a handle, or `None` if the handle is stale or unknown.
    pub fn get(&self, handle: u64) -> Option<&T> {
        self.slot(handle)?.data.as_ref()
    }

    /// Mutable value behind a handle, or `None` if stale or unknown.
    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        self.slot_mut(handle)?.data.as_mut()
    }

    /// Remove the value behind a handle. Removing twice is a no-op.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let value = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        // A wrapped generation would collide with handles from epoch 0.
        let reusable = slot.generation != 0;
        if reusable {
            self.free_list.push(decode(handle).0);
        }
        self.live -= 1;
        Some(value)
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the table holds no live values.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
