//! Bounded registry mapping call IDs to handlers.

/// A boxed handler. All effects and results travel through the payload.
pub type Handler<T> = Box<dyn Fn(&mut T) + Send>;

/// Fixed-capacity callback table indexed by call ID.
///
/// Assembled by whoever starts the responder, before the loop runs, and
/// read-only from then on. Gaps are allowed: an unset or out-of-range ID
/// completes the call round trip without invoking anything (fail-silent; a
/// caller cannot tell a gap from a no-op handler without its own
/// bookkeeping).
pub struct CallTable<T> {
    entries: Box<[Option<Handler<T>>]>,
}

impl<T> CallTable<T> {
    /// Creates an empty table accepting IDs in `[0, capacity)`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Registers `handler` under `call_id`, replacing any previous entry.
    ///
    /// # Panics
    /// Panics if `call_id` is outside the table's capacity.
    pub fn register<F>(&mut self, call_id: u16, handler: F)
    where
        F: Fn(&mut T) + Send + 'static,
    {
        assert!(
            (call_id as usize) < self.entries.len(),
            "call_id {} out of range (capacity {})",
            call_id,
            self.entries.len()
        );
        self.entries[call_id as usize] = Some(Box::new(handler));
    }

    /// Number of IDs the table can hold, registered or not.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Whether a handler is registered under `call_id`.
    pub fn is_registered(&self, call_id: u16) -> bool {
        self.get(call_id).is_some()
    }

    pub(crate) fn get(&self, call_id: u16) -> Option<&Handler<T>> {
        self.entries.get(call_id as usize).and_then(|e| e.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_dispatch() {
        let mut table = CallTable::with_capacity(2);
        table.register(0, |v: &mut u64| *v += 1);
        table.register(1, |v: &mut u64| *v *= 2);

        let mut data = 3u64;
        table.get(0).unwrap()(&mut data);
        assert_eq!(data, 4);
        table.get(1).unwrap()(&mut data);
        assert_eq!(data, 8);
    }

    #[test]
    fn test_gaps_and_out_of_range() {
        let mut table = CallTable::<u64>::with_capacity(4);
        table.register(0, |_| {});

        assert_eq!(table.capacity(), 4);
        assert!(table.is_registered(0));
        assert!(!table.is_registered(2));
        assert!(table.get(2).is_none());
        assert!(table.get(100).is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_register_out_of_range_panics() {
        let mut table = CallTable::<u64>::with_capacity(1);
        table.register(1, |_| {});
    }
}
