//! Per-region presentation registry.
//!
//! A registry owns the ordered slot list of one region. Every mutation goes through the
//! registry's `watch` channel, which serializes writers and publishes a fresh
//! [`RegionSnapshot`] to subscribers (render surfaces) as part of the same step.
//!
//! Invariants:
//! - `Replace` keeps at most one slot per name; the previous slot leaves in the same
//!   mutation that inserts its successor.
//! - `Stack` slots sharing a name keep insertion order, and name-based dismissal is LIFO.
//! - A slot's `id` never changes; animation playback only swaps its state and transition.
//! - At most one playback runs per slot. Starting a new one (an exit step, say) cancels
//!   the previous one, and a cancelled playback never writes again.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::core::animation::{AnimationStep, Transition, VisualState};
use crate::core::view::ViewId;
use crate::runtime::directory::RegionId;
use crate::runtime::scheduler::Scheduler;

/// Stable identity of one presented overlay.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SlotId(Uuid);

impl SlotId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Conflict policy when presenting under a name that is already on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresentMode {
    /// The new slot takes over the name; the old one is removed.
    #[default]
    Replace,
    /// The new slot is added on top; older slots stay.
    Stack,
}

/// One active overlay instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    id: SlotId,
    name: String,
    view: ViewId,
    state: VisualState,
    transition: Option<Transition>,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn state(&self) -> &VisualState {
        &self.state
    }

    /// Transition that leads into `state`; `None` for the spawn state.
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }
}

/// Immutable view of a region's slots at one revision.
#[derive(Clone, Debug, Default)]
pub struct RegionSnapshot {
    revision: u64,
    slots: Arc<[Slot]>,
}

impl RegionSnapshot {
    /// Increases by one per published mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Slots in insertion order, oldest first.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn count(&self, name: &str) -> usize {
        self.slots.iter().filter(|slot| slot.name == name).count()
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn latest(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().rev().find(|slot| slot.name == name)
    }
}

#[derive(Clone, Debug)]
enum RemovalTarget {
    All,
    Slot(SlotId),
    Latest(String),
}

struct Playback {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct PlaybackTable {
    next_generation: u64,
    running: HashMap<SlotId, Playback>,
}

struct RegistryInner {
    region: RegionId,
    scheduler: Scheduler,
    snapshots: watch::Sender<RegionSnapshot>,
    playback: Mutex<PlaybackTable>,
}

/// Cheaply cloneable handle to a region's slot list.
#[derive(Clone)]
pub struct PresentationRegistry {
    inner: Arc<RegistryInner>,
}

impl fmt::Debug for PresentationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationRegistry")
            .field("region", &self.inner.region)
            .field("slots", &self.len())
            .finish()
    }
}

impl PresentationRegistry {
    pub fn new(region: RegionId, scheduler: Scheduler) -> Self {
        let (snapshots, _) = watch::channel(RegionSnapshot::default());
        Self {
            inner: Arc::new(RegistryInner {
                region,
                scheduler,
                snapshots,
                playback: Mutex::new(PlaybackTable::default()),
            }),
        }
    }

    pub fn region(&self) -> &RegionId {
        &self.inner.region
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Presents `view` under `name`.
    ///
    /// `steps[0]` is the spawn state, applied without a transition. Remaining steps play
    /// in order on the scheduler, each held for its own duration before the next one is
    /// applied. Playback stops quietly once the slot has been dismissed.
    pub fn present(
        &self,
        view: ViewId,
        name: &str,
        mode: PresentMode,
        steps: &[AnimationStep],
    ) -> SlotId {
        let slot = Slot {
            id: SlotId::generate(),
            name: name.to_owned(),
            view,
            state: steps.first().map_or(VisualState::NEUTRAL, |step| step.state),
            transition: None,
        };
        let id = slot.id;

        self.mutate(|slots| {
            if mode == PresentMode::Replace {
                slots.retain(|existing| existing.name != name);
            }
            slots.push(slot);
            true
        });
        if mode == PresentMode::Replace {
            self.cancel_orphaned_playback();
        }
        debug!(
            region = %self.inner.region,
            name,
            slot = %id,
            ?mode,
            steps = steps.len(),
            "present"
        );

        if steps.len() > 1 {
            self.play(id, steps[1..].to_vec());
        }
        id
    }

    /// Dismisses the most recent slot named `name`, or every slot when `all` is set.
    ///
    /// With an `exit` step, the targeted slot animates to it first and removal happens once
    /// the step's duration has elapsed. Removal does not wait on the animation itself.
    /// Unmatched names are a no-op.
    pub fn dismiss(&self, name: &str, all: bool, exit: Option<AnimationStep>) {
        let target = self.snapshot().latest(name).map(Slot::id);

        if let (Some(step), Some(id)) = (exit, target) {
            self.play(id, vec![step]);
        }

        let removal = if all {
            RemovalTarget::All
        } else {
            match target {
                Some(id) => RemovalTarget::Slot(id),
                None => RemovalTarget::Latest(name.to_owned()),
            }
        };
        self.schedule_removal(removal, exit.map_or(Duration::ZERO, |step| step.duration()));
    }

    /// Removes every slot immediately.
    pub fn dismiss_all(&self) {
        self.dismiss("", true, None);
    }

    /// Dismisses one known slot, optionally animating it out first.
    pub fn dismiss_slot(&self, id: SlotId, exit: Option<AnimationStep>) {
        if let Some(step) = exit {
            self.play(id, vec![step]);
        }
        self.schedule_removal(
            RemovalTarget::Slot(id),
            exit.map_or(Duration::ZERO, |step| step.duration()),
        );
    }

    pub fn subscribe(&self) -> watch::Receiver<RegionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> RegionSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.snapshots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, name: &str) -> usize {
        self.inner.snapshots.borrow().count(name)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.inner.snapshots.borrow().slot(id).is_some()
    }

    /// Whether both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles, including the directory's own.
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Vec<Slot>) -> bool,
    {
        self.inner.snapshots.send_if_modified(|snapshot| {
            let mut slots = snapshot.slots.to_vec();
            if !f(&mut slots) {
                return false;
            }
            snapshot.slots = slots.into();
            snapshot.revision += 1;
            true
        })
    }

    /// Writes `step` unless the playback owning `token` has been superseded. The check
    /// runs under the snapshot lock, so a cancelled playback cannot land a late write.
    fn apply_step(&self, id: SlotId, step: AnimationStep, token: &CancellationToken) -> bool {
        self.mutate(|slots| match slots.iter_mut().find(|slot| slot.id == id) {
            Some(_) if token.is_cancelled() => false,
            Some(slot) => {
                slot.state = step.state;
                slot.transition = Some(step.transition);
                true
            }
            None => false,
        })
    }

    fn play(&self, id: SlotId, steps: Vec<AnimationStep>) {
        let (generation, token) = self.start_playback(id);
        let weak = Arc::downgrade(&self.inner);
        self.inner.scheduler.spawn(async move {
            for step in steps {
                let Some(registry) = upgrade(&weak) else {
                    return;
                };
                if !registry.apply_step(id, step, &token) {
                    trace!(
                        region = %registry.region(),
                        slot = %id,
                        "slot gone or superseded; playback stopped"
                    );
                    registry.finish_playback(id, generation);
                    return;
                }
                trace!(
                    region = %registry.region(),
                    slot = %id,
                    duration_ms = step.duration().as_millis() as u64,
                    "animation step"
                );
                drop(registry);
                if !step.duration().is_zero() {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(step.duration()) => {}
                    }
                }
            }
            if let Some(registry) = upgrade(&weak) {
                registry.finish_playback(id, generation);
            }
        });
    }

    /// Registers a new playback for `id`, cancelling the one it supersedes.
    fn start_playback(&self, id: SlotId) -> (u64, CancellationToken) {
        let mut table = self.playback();
        table.next_generation = table.next_generation.wrapping_add(1);
        let generation = table.next_generation;
        let token = CancellationToken::new();
        let previous = table.running.insert(
            id,
            Playback {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            trace!(region = %self.inner.region, slot = %id, "playback superseded");
        }
        (generation, token)
    }

    fn finish_playback(&self, id: SlotId, generation: u64) {
        let mut table = self.playback();
        if table
            .running
            .get(&id)
            .is_some_and(|playback| playback.generation == generation)
        {
            table.running.remove(&id);
        }
    }

    /// Cancels playback for slots that are no longer in the region.
    fn cancel_orphaned_playback(&self) {
        let snapshot = self.snapshot();
        let mut table = self.playback();
        table.running.retain(|id, playback| {
            let alive = snapshot.slot(*id).is_some();
            if !alive {
                playback.token.cancel();
            }
            alive
        });
    }

    fn playback(&self) -> MutexGuard<'_, PlaybackTable> {
        match self.inner.playback.lock() {
            Ok(table) => table,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn schedule_removal(&self, target: RemovalTarget, delay: Duration) {
        if delay.is_zero() {
            self.remove(&target);
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        self.inner.scheduler.defer(delay, move || {
            if let Some(registry) = upgrade(&weak) {
                registry.remove(&target);
            }
        });
    }

    fn remove(&self, target: &RemovalTarget) -> bool {
        let removed = self.mutate(|slots| match target {
            RemovalTarget::All => {
                let had_slots = !slots.is_empty();
                slots.clear();
                had_slots
            }
            RemovalTarget::Slot(id) => match slots.iter().position(|slot| slot.id == *id) {
                Some(index) => {
                    slots.remove(index);
                    true
                }
                None => false,
            },
            RemovalTarget::Latest(name) => {
                match slots.iter().rposition(|slot| &slot.name == name) {
                    Some(index) => {
                        slots.remove(index);
                        true
                    }
                    None => false,
                }
            }
        });
        if removed {
            self.cancel_orphaned_playback();
            debug!(region = %self.inner.region, ?target, "dismissed");
        } else {
            trace!(region = %self.inner.region, ?target, "dismiss matched nothing");
        }
        removed
    }
}

fn upgrade(weak: &Weak<RegistryInner>) -> Option<PresentationRegistry> {
    weak.upgrade().map(|inner| PresentationRegistry { inner })
}
