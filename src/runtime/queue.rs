//! Presentation queue: one region, one private name, one item on screen at a time.
//!
//! Items are assembled with an [`ItemBuilder`] (`push_view` → `reach`* → `finish`), kept in
//! descending priority order, and played through the region's [`PresentationRegistry`].
//! Each item retires itself after the configured on-screen duration, and the queue then
//! advances on its own.
//!
//! Playback phases:
//! - `Idle`: nothing active; `show` pops the head of the ready queue.
//! - `Playing`: the active item is presented and its dismissal timer is armed.
//! - `Retiring`: the exit step is animating; once it has run its course the item is
//!   dropped and `show` runs again.
//!
//! `show` is a strict no-op unless the queue is `Idle`, so the registry never holds two
//! slots under the queue's name.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use crate::config::{EnvConfig, DEFAULT_DISMISS_FLOOR};
use crate::core::animation::AnimationStep;
use crate::core::geometry::AxisOrth;
use crate::core::view::ViewId;
use crate::runtime::directory::RegionId;
use crate::runtime::registry::{PresentMode, PresentationRegistry, SlotId};
use crate::runtime::scheduler::TimerHandle;

const DEFAULT_ON_SCREEN: Duration = Duration::from_secs(3);

/// Queue ordering weight. Higher plays first; any integer is accepted.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOWEST: Self = Self(0);
    pub const LOW: Self = Self(1);
    pub const MIDDLE: Self = Self(2);
    pub const HIGH: Self = Self(3);
    pub const HIGHEST: Self = Self(4);
}

impl Default for Priority {
    fn default() -> Self {
        Self::MIDDLE
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// How an item with a single step is played.
///
/// With one step the spawn step and the exit step are the same keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SingleStepPolicy {
    /// Spawn in the neutral state; the step is only used to animate out.
    #[default]
    ExitOnly,
    /// Spawn at the step's state and animate out with it as well.
    SpawnAndExit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueueOptions {
    /// Total time an item stays up, exit animation included. `None` disables
    /// auto-dismissal; items then leave only through [`PresentationQueue::dismiss`].
    pub on_screen: Option<Duration>,
    /// Axis used when a builder call does not name one.
    pub axis: AxisOrth,
    /// Shortest delay before an auto-dismiss, whatever the exit duration.
    pub dismiss_floor: Duration,
    pub single_step: SingleStepPolicy,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            on_screen: Some(DEFAULT_ON_SCREEN),
            axis: AxisOrth::default(),
            dismiss_floor: DEFAULT_DISMISS_FLOOR,
            single_step: SingleStepPolicy::default(),
        }
    }
}

impl From<&EnvConfig> for QueueOptions {
    fn from(config: &EnvConfig) -> Self {
        Self {
            dismiss_floor: config.dismiss_floor,
            ..Self::default()
        }
    }
}

impl QueueOptions {
    pub fn new(on_screen: Duration) -> Self {
        Self {
            on_screen: Some(on_screen),
            ..Self::default()
        }
    }

    /// Items stay until dismissed by hand.
    pub fn manual() -> Self {
        Self {
            on_screen: None,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_axis(mut self, axis: AxisOrth) -> Self {
        self.axis = axis;
        self
    }

    #[must_use]
    pub fn with_dismiss_floor(mut self, floor: Duration) -> Self {
        self.dismiss_floor = floor;
        self
    }

    #[must_use]
    pub fn with_single_step(mut self, policy: SingleStepPolicy) -> Self {
        self.single_step = policy;
        self
    }

    /// Delay between presenting an item and starting its exit.
    pub fn dismiss_delay(&self, exit: Duration) -> Option<Duration> {
        self.on_screen
            .map(|on_screen| on_screen.saturating_sub(exit).max(self.dismiss_floor))
    }
}

/// A fully built queue entry: spawn step, transit steps, exit step (always last).
#[derive(Clone, Debug, PartialEq)]
pub struct QueueItem {
    view: ViewId,
    priority: Priority,
    steps: Vec<AnimationStep>,
}

impl QueueItem {
    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    pub fn exit(&self) -> Option<&AnimationStep> {
        self.steps.last()
    }

    fn exit_duration(&self) -> Duration {
        self.exit().map_or(Duration::ZERO, AnimationStep::duration)
    }

    /// Steps handed to `present`: everything but the exit step.
    fn presented_steps(&self, policy: SingleStepPolicy) -> &[AnimationStep] {
        match (self.steps.len(), policy) {
            (0, _) | (1, SingleStepPolicy::ExitOnly) => &[],
            (1, SingleStepPolicy::SpawnAndExit) => &self.steps,
            (len, _) => &self.steps[..len - 1],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueuePhase {
    #[default]
    Idle,
    Playing,
    Retiring,
}

#[derive(Default)]
struct QueueState {
    ready: Vec<QueueItem>,
    active: Option<QueueItem>,
    /// Slot the active item was presented in.
    active_slot: Option<SlotId>,
    phase: QueuePhase,
    timer: Option<TimerHandle>,
    generation: u64,
}

struct QueueShared {
    name: String,
    registry: PresentationRegistry,
    options: QueueOptions,
    state: Mutex<QueueState>,
}

impl QueueShared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Cheaply cloneable handle to a serialized overlay queue.
#[derive(Clone)]
pub struct PresentationQueue {
    shared: Arc<QueueShared>,
}

impl std::fmt::Debug for PresentationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationQueue")
            .field("name", &self.shared.name)
            .field("region", self.shared.registry.region())
            .field("phase", &self.phase())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl PresentationQueue {
    pub fn new(registry: PresentationRegistry, options: QueueOptions) -> Self {
        Self {
            shared: Arc::new(QueueShared {
                name: format!("queue-{}", Uuid::new_v4()),
                registry,
                options,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Private slot name; never collides with caller-chosen names.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn region(&self) -> &RegionId {
        self.shared.registry.region()
    }

    pub fn registry(&self) -> &PresentationRegistry {
        &self.shared.registry
    }

    pub fn options(&self) -> &QueueOptions {
        &self.shared.options
    }

    pub fn phase(&self) -> QueuePhase {
        self.shared.lock().phase
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().active.is_some()
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.shared.lock().active.as_ref().map(QueueItem::view)
    }

    /// Items waiting behind the active one.
    pub fn pending_len(&self) -> usize {
        self.shared.lock().ready.len()
    }

    /// Starts a new item whose spawn state sits `distance` along `axis` (queue axis when
    /// `None`). A `None` distance keeps the step's own position.
    pub fn push_view(
        &self,
        view: ViewId,
        distance: Option<f64>,
        axis: Option<AxisOrth>,
        step: Option<AnimationStep>,
    ) -> ItemBuilder<'_> {
        let spawn = self.resolve_step(distance, axis, step);
        ItemBuilder {
            queue: self,
            item: QueueItem {
                view,
                priority: Priority::default(),
                steps: vec![spawn],
            },
            queued: false,
        }
    }

    /// Plays the head of the ready queue if nothing is active.
    pub fn show(&self) {
        show(&self.shared);
    }

    /// Retires the active item early. With `all`, also drops every waiting item.
    ///
    /// Cancels the pending auto-dismiss timer. A second call while the item is already
    /// animating out only clears the ready queue (when `all` is set).
    pub fn dismiss(&self, all: bool) {
        dismiss(&self.shared, all, None);
    }

    /// Slides `view` in from one edge to the centre and out through the opposite edge
    /// along the queue axis.
    pub fn line_out(&self, view: ViewId, line: LineOut) {
        let offset = line.offset.unwrap_or(line.extent / 2.0);
        let (start, end) = if line.reverse {
            (line.extent + offset, -offset)
        } else {
            (-offset, line.extent + offset)
        };
        self.push_view(view, Some(start), None, None)
            .reach(Some(line.extent / 2.0), None, None)
            .reach(Some(end), None, None)
            .finish()
            .show();
    }

    fn resolve_step(
        &self,
        distance: Option<f64>,
        axis: Option<AxisOrth>,
        step: Option<AnimationStep>,
    ) -> AnimationStep {
        let axis = axis.unwrap_or(self.shared.options.axis);
        step.unwrap_or_default().with_position(axis.resolve(distance))
    }

    fn enqueue(&self, item: QueueItem) {
        let mut state = self.shared.lock();
        let index = state
            .ready
            .partition_point(|queued| queued.priority >= item.priority);
        debug!(
            queue = %self.shared.name,
            priority = item.priority.0,
            position = index,
            steps = item.steps.len(),
            "item queued"
        );
        state.ready.insert(index, item);
    }
}

/// Work-in-progress queue item. Nothing is queued until [`ItemBuilder::finish`] or
/// [`ItemBuilder::leave`]; a builder dropped before that discards its item.
#[must_use = "an item is only queued once `finish` or `leave` is called"]
pub struct ItemBuilder<'q> {
    queue: &'q PresentationQueue,
    item: QueueItem,
    queued: bool,
}

impl<'q> ItemBuilder<'q> {
    /// Appends a waypoint. The last waypoint at `finish` time is the exit step.
    pub fn reach(
        mut self,
        distance: Option<f64>,
        axis: Option<AxisOrth>,
        step: Option<AnimationStep>,
    ) -> Self {
        let step = self.queue.resolve_step(distance, axis, step);
        self.item.steps.push(step);
        self
    }

    /// Same as [`ItemBuilder::reach`]; reads better for the first waypoint.
    pub fn enter(
        self,
        distance: Option<f64>,
        axis: Option<AxisOrth>,
        step: Option<AnimationStep>,
    ) -> Self {
        self.reach(distance, axis, step)
    }

    pub fn priority(mut self, priority: impl Into<Priority>) -> Self {
        self.item.priority = priority.into();
        self
    }

    pub fn item(&self) -> &QueueItem {
        &self.item
    }

    /// Queues the item.
    pub fn finish(mut self) -> &'q PresentationQueue {
        self.queued = true;
        let item = QueueItem {
            view: self.item.view,
            priority: self.item.priority,
            steps: std::mem::take(&mut self.item.steps),
        };
        self.queue.enqueue(item);
        self.queue
    }

    /// Appends the exit step and queues the item.
    pub fn leave(
        self,
        distance: Option<f64>,
        axis: Option<AxisOrth>,
        step: Option<AnimationStep>,
    ) -> &'q PresentationQueue {
        self.reach(distance, axis, step).finish()
    }
}

impl Drop for ItemBuilder<'_> {
    fn drop(&mut self) {
        if !self.queued {
            debug!(
                queue = %self.queue.shared.name,
                view = self.item.view.raw(),
                steps = self.item.steps.len(),
                "unfinished item discarded"
            );
        }
    }
}

/// Parameters for [`PresentationQueue::line_out`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineOut {
    /// Region length along the queue axis.
    pub extent: f64,
    /// How far past each edge the item starts and ends; half the extent when `None`.
    pub offset: Option<f64>,
    /// Travel from the far edge back towards the origin.
    pub reverse: bool,
}

impl LineOut {
    pub fn new(extent: f64) -> Self {
        Self {
            extent,
            offset: None,
            reverse: false,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

fn show(shared: &Arc<QueueShared>) {
    let mut state = shared.lock();
    if state.phase != QueuePhase::Idle || state.active.is_some() || state.ready.is_empty() {
        return;
    }

    let item = state.ready.remove(0);
    state.generation = state.generation.wrapping_add(1);
    let generation = state.generation;

    let slot = shared.registry.present(
        item.view,
        &shared.name,
        PresentMode::Replace,
        item.presented_steps(shared.options.single_step),
    );

    let delay = shared.options.dismiss_delay(item.exit_duration());
    if let Some(delay) = delay {
        let timer_shared = Arc::clone(shared);
        state.timer = Some(shared.registry.scheduler().timer(delay, move || {
            dismiss(&timer_shared, false, Some(generation));
        }));
    }
    debug!(
        queue = %shared.name,
        region = %shared.registry.region(),
        view = item.view.raw(),
        generation,
        dismiss_in_ms = delay.map(|delay| delay.as_millis() as u64),
        "showing item"
    );

    state.active = Some(item);
    state.active_slot = Some(slot);
    state.phase = QueuePhase::Playing;
}

/// `expected` is set when the auto-dismiss timer fires; a stale timer is ignored.
fn dismiss(shared: &Arc<QueueShared>, all: bool, expected: Option<u64>) {
    let mut state = shared.lock();
    if let Some(expected) = expected {
        if state.generation != expected || state.phase != QueuePhase::Playing {
            return;
        }
    }

    if let Some(timer) = state.timer.take() {
        timer.cancel();
    }
    if all && !state.ready.is_empty() {
        debug!(queue = %shared.name, dropped = state.ready.len(), "ready queue cleared");
        state.ready.clear();
    }
    if state.phase != QueuePhase::Playing {
        return;
    }
    let Some(item) = state.active.as_ref() else {
        return;
    };

    let exit = item.exit().copied();
    let exit_duration = item.exit_duration();
    if all {
        shared.registry.dismiss(&shared.name, true, exit);
    } else if let Some(slot) = state.active_slot {
        // By id: a region cleared behind the queue's back must not make the removal
        // fall through to the next item's slot.
        shared.registry.dismiss_slot(slot, exit);
    }
    state.phase = QueuePhase::Retiring;
    let generation = state.generation;
    debug!(
        queue = %shared.name,
        generation,
        exit_ms = exit_duration.as_millis() as u64,
        auto = expected.is_some(),
        "retiring item"
    );
    drop(state);

    let retire_shared = Arc::clone(shared);
    shared.registry.scheduler().defer(exit_duration, move || {
        retire(&retire_shared, generation);
    });
}

fn retire(shared: &Arc<QueueShared>, generation: u64) {
    {
        let mut state = shared.lock();
        if state.generation != generation || state.phase != QueuePhase::Retiring {
            return;
        }
        state.active = None;
        state.active_slot = None;
        state.phase = QueuePhase::Idle;
    }
    show(shared);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point;
    use crate::runtime::scheduler::Scheduler;
    use pretty_assertions::assert_eq;

    fn queue(options: QueueOptions) -> PresentationQueue {
        let registry = PresentationRegistry::new(
            RegionId::from("queue-tests"),
            Scheduler::current().expect("runtime"),
        );
        PresentationQueue::new(registry, options)
    }

    fn ready_priorities(queue: &PresentationQueue) -> Vec<(i32, u64)> {
        queue
            .shared
            .lock()
            .ready
            .iter()
            .map(|item| (item.priority.0, item.view.raw()))
            .collect()
    }

    #[test]
    fn dismiss_delay_is_floor_clamped() {
        let options = QueueOptions::new(Duration::from_millis(100));
        assert_eq!(
            options.dismiss_delay(Duration::from_secs(5)),
            Some(DEFAULT_DISMISS_FLOOR)
        );
        assert_eq!(
            options.dismiss_delay(Duration::from_millis(30)),
            Some(Duration::from_millis(70))
        );
        assert_eq!(QueueOptions::manual().dismiss_delay(Duration::ZERO), None);
    }

    #[test]
    fn presented_steps_drop_the_exit_step() {
        let step = |x: f64| AnimationStep::at(Point::new(x, 0.0));
        let item = QueueItem {
            view: ViewId::from_raw(1),
            priority: Priority::default(),
            steps: vec![step(0.0), step(1.0), step(2.0)],
        };
        assert_eq!(
            item.presented_steps(SingleStepPolicy::ExitOnly),
            &[step(0.0), step(1.0)]
        );
        assert_eq!(item.exit(), Some(&step(2.0)));

        let single = QueueItem {
            steps: vec![step(5.0)],
            ..item
        };
        assert!(single.presented_steps(SingleStepPolicy::ExitOnly).is_empty());
        assert_eq!(
            single.presented_steps(SingleStepPolicy::SpawnAndExit),
            &[step(5.0)]
        );
    }

    #[tokio::test]
    async fn finish_orders_by_priority_then_insertion() {
        let queue = queue(QueueOptions::default());
        for (raw, priority) in [(1, 1), (2, 3), (3, 2), (4, 3), (5, 1)] {
            queue
                .push_view(ViewId::from_raw(raw), None, None, None)
                .priority(priority)
                .finish();
        }
        assert_eq!(
            ready_priorities(&queue),
            vec![(3, 2), (3, 4), (2, 3), (1, 1), (1, 5)]
        );
    }

    #[tokio::test]
    async fn builder_resolves_positions_on_queue_axis() {
        let queue = queue(QueueOptions::default().with_axis(AxisOrth::vertical(40.0)));
        let builder = queue
            .push_view(ViewId::from_raw(1), Some(-10.0), None, None)
            .reach(Some(100.0), Some(AxisOrth::horizontal(7.0)), None)
            .reach(None, None, Some(AnimationStep::at(Point::new(1.0, 2.0))));

        let positions: Vec<_> = builder
            .item()
            .steps()
            .iter()
            .map(|step| step.state.position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Some(Point::new(40.0, -10.0)),
                Some(Point::new(100.0, 7.0)),
                Some(Point::new(1.0, 2.0)),
            ]
        );
        builder.finish();
        assert_eq!(queue.pending_len(), 1);
    }

    #[tokio::test]
    async fn leave_appends_exit_step_and_queues() {
        let queue = queue(QueueOptions::default());
        let exit = AnimationStep::default().with_opacity(0.0);
        queue
            .push_view(ViewId::from_raw(9), None, None, None)
            .enter(Some(50.0), None, None)
            .leave(None, None, Some(exit));

        let state = queue.shared.lock();
        let item = state.ready.first().expect("queued");
        assert_eq!(item.steps().len(), 3);
        assert_eq!(item.exit(), Some(&exit));
    }

    #[tokio::test]
    async fn dropped_builder_queues_nothing() {
        let queue = queue(QueueOptions::manual());
        let builder = queue
            .push_view(ViewId::from_raw(1), Some(0.0), None, None)
            .reach(Some(10.0), None, None);
        assert!(!builder.queued);
        drop(builder);
        assert_eq!(queue.pending_len(), 0);

        queue.show();
        assert_eq!(queue.phase(), QueuePhase::Idle);

        let builder = queue.push_view(ViewId::from_raw(2), None, None, None);
        builder.finish();
        assert_eq!(ready_priorities(&queue), vec![(2, 2)]);
    }

    #[tokio::test]
    async fn show_is_a_no_op_while_active() {
        let queue = queue(QueueOptions::manual());
        queue
            .push_view(ViewId::from_raw(1), None, None, None)
            .finish()
            .push_view(ViewId::from_raw(2), None, None, None)
            .finish()
            .show();
        queue.show();
        queue.show();

        assert_eq!(queue.phase(), QueuePhase::Playing);
        assert_eq!(queue.active_view(), Some(ViewId::from_raw(1)));
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.registry().count(queue.name()), 1);
    }

    #[tokio::test]
    async fn queue_names_are_private_and_unique() {
        let registry = PresentationRegistry::new(
            RegionId::global(),
            Scheduler::current().expect("runtime"),
        );
        let a = PresentationQueue::new(registry.clone(), QueueOptions::default());
        let b = PresentationQueue::new(registry, QueueOptions::default());
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("queue-"));
    }
}
