//! Bounded least-recently-used cache of prepared 2-D transform plans.
//!
//! Entries are keyed by `(rows, cols, source buffer, target buffer, kind)`.
//! A buffer identity is either [`BufferId::Scratch`], in which case the
//! entry allocates and owns a scratch buffer, or [`BufferId::External`],
//! the address of a caller buffer that has to be handed back on every run.
//! Entries never own caller memory.
//!
//! The cache has no internal locking; share it between threads only behind
//! the caller's own synchronisation.

use num::Complex;

use crate::{
    trace::{trace_event, trace_warn},
    DftError, DftNum,
};

mod buffer;
pub mod processor;

pub use buffer::ScratchBuffer;
use processor::{Engine, Planners, Processor};

/// Number of plans kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Transform a plan performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Real input, compact (`rows × (cols / 2 + 1)`) complex output.
    RealForward,
    /// Interleaved complex input, full complex output.
    ComplexForward,
}

/// Identity of the buffer a plan reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    /// No persistent caller buffer; the plan owns a private scratch buffer.
    Scratch,
    /// Address of a caller-owned buffer.
    External(usize),
}

impl BufferId {
    /// Identity of a caller slice.
    pub fn of<E>(buffer: &[E]) -> Self {
        BufferId::External(buffer.as_ptr() as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub rows: usize,
    pub cols: usize,
    pub source: BufferId,
    pub target: BufferId,
    pub kind: TransformKind,
}

impl PlanKey {
    pub fn new(
        rows: usize,
        cols: usize,
        source: BufferId,
        target: BufferId,
        kind: TransformKind,
    ) -> Self {
        Self {
            rows,
            cols,
            source,
            target,
            kind,
        }
    }

    /// Key for a plan running entirely on its own scratch buffers.
    pub fn scratch(rows: usize, cols: usize, kind: TransformKind) -> Self {
        Self::new(rows, cols, BufferId::Scratch, BufferId::Scratch, kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCacheConfig {
    /// Maximum number of live plans.
    pub capacity: usize,
}

impl Default for PlanCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

enum Binding<T: DftNum> {
    Owned(ScratchBuffer<T>),
    External(usize),
}

impl<T: DftNum> Binding<T> {
    fn for_id(id: BufferId, len: usize) -> Result<Self, DftError> {
        Ok(match id {
            BufferId::Scratch => Binding::Owned(ScratchBuffer::try_new(len)?),
            BufferId::External(addr) => Binding::External(addr),
        })
    }

    fn owned(&self) -> Option<&ScratchBuffer<T>> {
        match self {
            Binding::Owned(buf) => Some(buf),
            Binding::External(_) => None,
        }
    }

    fn owned_mut(&mut self) -> Option<&mut ScratchBuffer<T>> {
        match self {
            Binding::Owned(buf) => Some(buf),
            Binding::External(_) => None,
        }
    }
}

/// A cached plan together with the scratch buffers it owns.
pub struct PlanEntry<T: DftNum> {
    id: u64,
    key: PlanKey,
    engine: Engine<T>,
    source: Binding<T>,
    target: Binding<T>,
    last_used: u64,
}

impl<T: DftNum> PlanEntry<T> {
    fn build(id: u64, key: PlanKey, planners: &mut Planners<T>) -> Result<Self, DftError> {
        let len = key
            .rows
            .checked_mul(key.cols)
            .ok_or(DftError::InvalidShape {
                rows: key.rows,
                cols: key.cols,
            })?;
        // scratch is allocated before any 1-D planning; a failed target
        // allocation drops the source scratch with it
        let source = Binding::for_id(key.source, len)?;
        let target = Binding::for_id(key.target, len)?;
        let engine = Engine::build(key.kind, key.rows, key.cols, planners)?;
        Ok(Self {
            id,
            key,
            engine,
            source,
            target,
            last_used: 0,
        })
    }

    /// Unique build number; a rebuilt plan never reuses an id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &PlanKey {
        &self.key
    }

    /// Value of the cache's use counter when this plan was last handed out.
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    /// Owned source scratch, `None` when the source is a caller buffer.
    pub fn source(&self) -> Option<&ScratchBuffer<T>> {
        self.source.owned()
    }

    pub fn source_mut(&mut self) -> Option<&mut ScratchBuffer<T>> {
        self.source.owned_mut()
    }

    /// Owned target scratch, `None` when the target is a caller buffer.
    pub fn target(&self) -> Option<&ScratchBuffer<T>> {
        self.target.owned()
    }

    /// Number of input scalars the plan reads.
    pub fn input_len(&self) -> usize {
        self.engine.input_len()
    }

    /// Number of complex values the plan writes.
    pub fn output_len(&self) -> usize {
        self.engine.output_len()
    }

    /// Runs the plan on its owned scratch buffers.
    pub fn execute(&mut self) -> Result<(), DftError> {
        self.execute_with(None, None)
    }

    /// Runs the plan, taking caller buffers for the sides keyed on
    /// [`BufferId::External`].
    ///
    /// A side keyed on scratch must be passed as `None`; an external side
    /// must be passed the very slice whose address it was keyed on.
    pub fn execute_with(
        &mut self,
        source: Option<&[T]>,
        target: Option<&mut [Complex<T>]>,
    ) -> Result<(), DftError> {
        let input = match (&self.source, source) {
            (Binding::Owned(buf), None) => buf.as_real(),
            (Binding::External(addr), Some(slice)) if slice.as_ptr() as usize == *addr => slice,
            _ => return Err(DftError::BufferMismatch),
        };
        let output = match (&mut self.target, target) {
            (Binding::Owned(buf), None) => buf.as_complex_mut(),
            (Binding::External(addr), Some(slice)) if slice.as_ptr() as usize == *addr => slice,
            _ => return Err(DftError::BufferMismatch),
        };
        self.engine.execute(input, output)
    }
}

impl<T: DftNum> std::fmt::Debug for PlanEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanEntry")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("last_used", &self.last_used)
            .finish()
    }
}

/// Fixed-capacity plan cache with least-recently-used eviction.
///
/// Slots are scanned linearly. On a miss with every slot taken, the entry
/// with the lowest use counter is replaced, the lowest slot index winning
/// ties.
pub struct PlanCache<T: DftNum> {
    slots: Vec<PlanEntry<T>>,
    capacity: usize,
    use_counter: u64,
    next_id: u64,
    stats: CacheStats,
    planners: Planners<T>,
}

impl<T: DftNum> Default for PlanCache<T> {
    fn default() -> Self {
        Self::new(PlanCacheConfig::default())
    }
}

impl<T: DftNum> PlanCache<T> {
    pub fn new(config: PlanCacheConfig) -> Self {
        Self {
            slots: Vec::with_capacity(config.capacity.min(DEFAULT_CAPACITY)),
            capacity: config.capacity,
            use_counter: 0,
            next_id: 0,
            stats: CacheStats::default(),
            planners: Planners::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live plans.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn contains(&self, key: &PlanKey) -> bool {
        self.search(key).is_some()
    }

    /// Live entries in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry<T>> {
        self.slots.iter()
    }

    /// Destroys every live plan and its scratch buffers.
    pub fn clear(&mut self) {
        trace_event!("plan_cache.clear", plans = self.slots.len());
        self.slots.clear();
    }

    fn search(&self, key: &PlanKey) -> Option<usize> {
        self.slots.iter().position(|entry| entry.key == *key)
    }

    fn least_recently_used(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .min_by_key(|(slot, entry)| (entry.last_used, *slot))
            .map(|(slot, _)| slot)
    }

    /// Returns the plan for `key`, building it on a miss.
    ///
    /// A hit or a successful build marks the plan as most recently used. A
    /// failed build leaves the cache exactly as it was, including the entry
    /// that would have been evicted.
    pub fn acquire(&mut self, key: PlanKey) -> Result<&mut PlanEntry<T>, DftError> {
        if let Some(slot) = self.search(&key) {
            self.stats.hits += 1;
            self.use_counter += 1;
            trace_event!("plan_cache.hit", slot = slot, rows = key.rows, cols = key.cols);
            let entry = &mut self.slots[slot];
            entry.last_used = self.use_counter;
            return Ok(entry);
        }

        let slot = if self.slots.len() < self.capacity {
            None
        } else {
            match self.least_recently_used() {
                Some(slot) => Some(slot),
                None => {
                    trace_warn!("plan_cache.saturated", capacity = self.capacity);
                    return Err(DftError::ZeroCapacity);
                }
            }
        };

        let mut entry = match PlanEntry::build(self.next_id, key, &mut self.planners) {
            Ok(entry) => entry,
            Err(e) => {
                trace_warn!("plan_cache.build_failed", rows = key.rows, cols = key.cols);
                return Err(e);
            }
        };

        self.next_id += 1;
        self.use_counter += 1;
        self.stats.misses += 1;
        entry.last_used = self.use_counter;

        let slot = match slot {
            Some(slot) => {
                self.stats.evictions += 1;
                trace_event!("plan_cache.evict", slot = slot, id = self.slots[slot].id);
                self.slots[slot] = entry;
                slot
            }
            None => {
                self.slots.push(entry);
                self.slots.len() - 1
            }
        };
        trace_event!("plan_cache.insert", slot = slot, rows = key.rows, cols = key.cols);

        Ok(&mut self.slots[slot])
    }
}

impl<T: DftNum> Drop for PlanCache<T> {
    fn drop(&mut self) {
        self.clear();
    }
}
