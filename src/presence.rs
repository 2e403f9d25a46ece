//! Presence bitmap over the whole IPv4 address space.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of 64-bit words needed to hold one bit per IPv4 address.
pub const WORDS: usize = (1usize << 32) / 64;

/// Destination for parsed addresses.
///
/// Workers only ever see a shared reference, so implementations must handle
/// concurrent calls themselves.
pub trait AddressSink: Sync {
    /// Records one address.
    fn add(&self, address: u32);
}

/// A set of IPv4 addresses stored as one bit per address.
///
/// The backing storage is a single zeroed allocation of [`WORDS`] atomic
/// words (512 MiB). Marking is lock-free and idempotent; bits are never
/// cleared. Pages that no address falls into are never written, so the
/// resident size follows the spread of the input rather than the full
/// reservation.
///
/// `PresenceSet` is `Send` and `Sync`. Share it by reference across the
/// worker threads of one run.
///
/// # Example
///
/// ```
/// let set = uniqip::PresenceSet::new();
/// assert!(set.add(0x0A00_0001));
/// assert!(!set.add(0x0A00_0001));
/// assert_eq!(set.count(), 1);
/// ```
pub struct PresenceSet {
    words: Box<[AtomicU64]>,
}

impl PresenceSet {
    /// Allocates an empty set covering all 2^32 addresses.
    pub fn new() -> PresenceSet {
        let layout =
            Layout::array::<AtomicU64>(WORDS).expect("presence bitmap layout exceeds isize::MAX");
        // SAFETY: the layout is non-zero sized. An all-zero bit pattern is a
        // valid `AtomicU64` holding 0, and the box is built from the same
        // global allocator and layout it will be freed with.
        let words = unsafe {
            let raw = alloc::alloc_zeroed(layout).cast::<AtomicU64>();
            if raw.is_null() {
                alloc::handle_alloc_error(layout);
            }
            Box::from_raw(ptr::slice_from_raw_parts_mut(raw, WORDS))
        };
        PresenceSet { words }
    }

    /// Marks `address` present.
    ///
    /// Returns `true` if this call set the bit and `false` if the address
    /// was already present. At most one word is written.
    #[inline]
    pub fn add(&self, address: u32) -> bool {
        let (word, mask) = locate(address);
        let word = &self.words[word];

        let mut current = word.load(Ordering::Relaxed);
        loop {
            if current & mask != 0 {
                return false;
            }
            match word.compare_exchange_weak(
                current,
                current | mask,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Returns `true` if `address` has been added.
    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        let (word, mask) = locate(address);
        self.words[word].load(Ordering::Relaxed) & mask != 0
    }

    /// Returns the number of distinct addresses added so far.
    ///
    /// Exact once every concurrent [`add`](Self::add) has returned and been
    /// joined; while writers are still running it is a lower bound.
    pub fn count(&self) -> u64 {
        self.words
            .iter()
            .map(|word| u64::from(word.load(Ordering::Relaxed).count_ones()))
            .sum()
    }
}

#[inline]
fn locate(address: u32) -> (usize, u64) {
    ((address >> 6) as usize, 1u64 << (address & 63))
}

impl Default for PresenceSet {
    fn default() -> Self {
        PresenceSet::new()
    }
}

impl AddressSink for PresenceSet {
    #[inline]
    fn add(&self, address: u32) {
        PresenceSet::add(self, address);
    }
}

impl fmt::Debug for PresenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceSet")
            .field("words", &self.words.len())
            .finish_non_exhaustive()
    }
}
