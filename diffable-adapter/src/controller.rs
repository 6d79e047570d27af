use alloc::vec::Vec;

use diffable::{EditScript, IdMap, Identifier, OutlineSnapshot, Snapshot, SnapshotError, diff};

use crate::Renderer;
#[cfg(feature = "worker")]
use crate::worker::{DiffDone, DiffJob, DiffWorker, Idle};

/// Where the controller is in its apply cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    /// A script is being committed and rendered.
    Applying,
    /// A background diff is in flight; new requests wait in the pending slot.
    Diffing,
}

/// What happened to a snapshot handed to [`DataSourceController::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Diffed and committed synchronously. `changes == 0` means the renderer was not called.
    Applied { changes: usize },
    /// Parked in the pending slot (inside a batch, or behind an in-flight diff).
    Queued,
    /// Handed to the background worker; drain it with `poll` or `wait`.
    Deferred,
}

impl ApplyOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Lifetime counters, mostly useful for tests and debugging overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplyStats {
    /// Snapshots committed through the differ.
    pub applied: u64,
    /// Committed snapshots whose script was empty.
    pub empty: u64,
    /// Pending requests replaced by a newer one before being diffed.
    pub superseded: u64,
    /// Background results dropped because their request was cancelled.
    pub discarded: u64,
    /// Snapshots installed with `apply_reloading_data`.
    pub reloads: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerOptions {
    /// Diffs whose old+new item count reaches this are sent to the worker, if one is attached.
    /// `None` keeps every diff on the caller's thread.
    pub background_threshold: Option<usize>,
}

impl ControllerOptions {
    pub fn with_background_threshold(mut self, threshold: Option<usize>) -> Self {
        self.background_threshold = threshold;
        self
    }
}

struct Request<S, I> {
    snapshot: Snapshot<S, I>,
    animated: bool,
}

#[cfg(feature = "worker")]
struct InFlight<S, I> {
    generation: u64,
    request: Request<S, I>,
}

/// Owns the applied snapshot and serializes apply requests into renderer calls.
///
/// The controller holds no UI objects. The host pushes snapshots with [`Self::apply`] from its
/// single UI context; the controller diffs them against the current snapshot and forwards the
/// non-empty scripts to its [`Renderer`].
///
/// At most one diff runs at a time. While one is in flight (on the background worker) or a
/// [`Self::batch_update`] is open, further requests land in a single pending slot where the
/// newest supersedes the older one. Superseded snapshots are never diffed or rendered.
pub struct DataSourceController<S, I, R> {
    current: Snapshot<S, I>,
    renderer: R,
    options: ControllerOptions,
    phase: Phase,
    pending: Option<Request<S, I>>,
    batch_depth: usize,
    outlines: IdMap<S, OutlineSnapshot<I>>,
    stats: ApplyStats,
    #[cfg(feature = "worker")]
    generation: u64,
    #[cfg(feature = "worker")]
    worker: Option<DiffWorker<S, I>>,
    #[cfg(feature = "worker")]
    in_flight: Option<InFlight<S, I>>,
    #[cfg(feature = "worker")]
    outstanding: usize,
}

impl<S, I, R> core::fmt::Debug for DataSourceController<S, I, R>
where
    S: core::fmt::Debug,
    I: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut d = f.debug_struct("DataSourceController");
        d.field("current", &self.current)
            .field("phase", &self.phase)
            .field("pending", &self.pending.is_some())
            .field("batch_depth", &self.batch_depth)
            .field("options", &self.options)
            .field("stats", &self.stats);
        #[cfg(feature = "worker")]
        d.field("worker", &self.worker)
            .field("in_flight", &self.in_flight.as_ref().map(|f| f.generation));
        d.finish_non_exhaustive()
    }
}

impl<S: Identifier, I: Identifier, R: Renderer<S, I>> DataSourceController<S, I, R> {
    pub fn new(renderer: R) -> Self {
        Self::with_options(renderer, ControllerOptions::default())
    }

    pub fn with_options(renderer: R, options: ControllerOptions) -> Self {
        Self {
            current: Snapshot::new(),
            renderer,
            options,
            phase: Phase::Idle,
            pending: None,
            batch_depth: 0,
            outlines: IdMap::default(),
            stats: ApplyStats::default(),
            #[cfg(feature = "worker")]
            generation: 0,
            #[cfg(feature = "worker")]
            worker: None,
            #[cfg(feature = "worker")]
            in_flight: None,
            #[cfg(feature = "worker")]
            outstanding: 0,
        }
    }

    /// Attaches a background worker. Diffs reaching `background_threshold` go to it.
    #[cfg(feature = "worker")]
    pub fn with_worker(mut self, worker: DiffWorker<S, I>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// The latest applied snapshot, exactly as it was applied.
    ///
    /// Reload markers it carries are inert for snapshots derived from it: the differ only
    /// reloads items whose marker is new.
    pub fn snapshot(&self) -> &Snapshot<S, I> {
        &self.current
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> ApplyStats {
        self.stats
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ControllerOptions) {
        self.options = options;
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Returns `true` while a request waits in the pending slot.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies `snapshot`: diffs it against the current snapshot, commits it, and hands a
    /// non-empty script to the renderer.
    pub fn apply(&mut self, snapshot: Snapshot<S, I>, animated: bool) -> ApplyOutcome {
        let request = Request { snapshot, animated };
        if self.batch_depth > 0 || self.phase != Phase::Idle {
            self.enqueue(request);
            return ApplyOutcome::Queued;
        }
        self.run(request)
    }

    /// Runs `f` with applies deferred; when the outermost batch ends, only the last snapshot
    /// applied inside it is diffed and rendered.
    pub fn batch_update<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.batch_depth += 1;
        let out = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.drain();
        }
        out
    }

    /// Replaces the current snapshot without diffing and asks the renderer to reload
    /// everything. Pending and in-flight requests are cancelled.
    pub fn apply_reloading_data(&mut self, snapshot: Snapshot<S, I>) {
        self.cancel();
        self.current = snapshot;
        self.prune_outlines();
        self.stats.reloads += 1;
        ddebug!(
            items = self.current.number_of_items(),
            "DataSourceController: reloaded without diffing"
        );
        self.renderer.reload(&self.current);
    }

    /// Drops the pending request and any in-flight background diff. A result that arrives
    /// afterwards is discarded. Returns `true` if anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        let pending = self.pending.take().is_some();
        let in_flight = self.abandon_in_flight();
        if pending || in_flight {
            ddebug!(pending, in_flight, "DataSourceController: cancelled");
        }
        pending || in_flight
    }

    /// Stores `outline` for `section` and applies its visible items as that section's items,
    /// appending the section if it is not in the snapshot yet.
    ///
    /// # Panics
    ///
    /// If a visible item of the outline already lives in another section.
    #[track_caller]
    pub fn apply_outline(
        &mut self,
        section: S,
        outline: OutlineSnapshot<I>,
        animated: bool,
    ) -> ApplyOutcome {
        let visible: Vec<I> = outline.visible_items().into_iter().cloned().collect();
        self.outlines.insert(section.clone(), outline);
        self.apply_section_items(&section, visible, animated)
    }

    pub fn outline(&self, section: &S) -> Option<&OutlineSnapshot<I>> {
        self.outlines.get(section)
    }

    /// Expands `items` in the outline of `section` and re-applies its visible items.
    ///
    /// # Panics
    ///
    /// If `section` has no outline or an item is not part of it.
    #[track_caller]
    pub fn expand(
        &mut self,
        section: &S,
        items: impl IntoIterator<Item = I>,
        animated: bool,
    ) -> ApplyOutcome {
        self.update_outline(section, animated, |o| o.try_set_expanded(items, true))
    }

    /// Collapses `items` in the outline of `section` and re-applies its visible items.
    ///
    /// # Panics
    ///
    /// If `section` has no outline or an item is not part of it.
    #[track_caller]
    pub fn collapse(
        &mut self,
        section: &S,
        items: impl IntoIterator<Item = I>,
        animated: bool,
    ) -> ApplyOutcome {
        self.update_outline(section, animated, |o| o.try_set_expanded(items, false))
    }

    #[track_caller]
    pub fn toggle(&mut self, section: &S, item: &I, animated: bool) -> ApplyOutcome {
        self.update_outline(section, animated, |o| o.try_toggle(item).map(|_| ()))
    }

    /// Applies finished background diffs without blocking. Returns the number of snapshots
    /// committed, including a pending one that could then run synchronously.
    #[cfg(feature = "worker")]
    pub fn poll(&mut self) -> usize {
        let mut committed = 0;
        while self.outstanding > 0 {
            let received = match &self.worker {
                Some(worker) => worker.try_recv(),
                None => break,
            };
            match received {
                Ok(done) => committed += self.finish(done),
                Err(Idle::Empty) => break,
                Err(Idle::Disconnected) => {
                    committed += self.fall_back();
                    break;
                }
            }
        }
        committed
    }

    /// Blocks until every outstanding background diff has been returned and applied,
    /// including ones started for requests that were pending along the way.
    #[cfg(feature = "worker")]
    pub fn wait(&mut self) -> usize {
        let mut committed = 0;
        while self.outstanding > 0 {
            let received = match &self.worker {
                Some(worker) => worker.recv(),
                None => break,
            };
            match received {
                Ok(done) => committed += self.finish(done),
                Err(_) => {
                    committed += self.fall_back();
                    break;
                }
            }
        }
        committed
    }

    fn enqueue(&mut self, request: Request<S, I>) {
        if self.pending.replace(request).is_some() {
            self.stats.superseded += 1;
            dwarn!("DataSourceController: pending snapshot superseded");
        }
    }

    fn drain(&mut self) -> Option<ApplyOutcome> {
        if self.batch_depth > 0 || self.phase != Phase::Idle {
            return None;
        }
        let request = self.pending.take()?;
        Some(self.run(request))
    }

    fn run(&mut self, request: Request<S, I>) -> ApplyOutcome {
        #[cfg(feature = "worker")]
        let request = match self.offload(request) {
            Ok(()) => return ApplyOutcome::Deferred,
            Err(request) => request,
        };
        self.phase = Phase::Applying;
        let script = diff(&self.current, &request.snapshot);
        let changes = self.commit(request, script);
        self.phase = Phase::Idle;
        ApplyOutcome::Applied { changes }
    }

    fn commit(&mut self, request: Request<S, I>, script: EditScript<S, I>) -> usize {
        debug_assert_eq!(self.phase, Phase::Applying);
        let changes = script.len();
        self.current = request.snapshot;
        self.prune_outlines();
        self.stats.applied += 1;
        if script.is_empty() {
            self.stats.empty += 1;
            dtrace!("DataSourceController: empty script, renderer not called");
        } else {
            ddebug!(
                changes,
                animated = request.animated,
                "DataSourceController: rendering script"
            );
            self.renderer.render(&script, request.animated);
        }
        changes
    }

    /// The snapshot the next request will be diffed against once everything queued lands.
    fn latest(&self) -> &Snapshot<S, I> {
        if let Some(pending) = &self.pending {
            return &pending.snapshot;
        }
        #[cfg(feature = "worker")]
        if let Some(in_flight) = &self.in_flight {
            return &in_flight.request.snapshot;
        }
        &self.current
    }

    fn prune_outlines(&mut self) {
        let latest = self.latest();
        let stale: Vec<S> = self
            .outlines
            .keys()
            .filter(|s| !latest.contains_section(s))
            .cloned()
            .collect();
        for section in stale {
            self.outlines.remove(&section);
        }
    }

    #[track_caller]
    fn update_outline(
        &mut self,
        section: &S,
        animated: bool,
        f: impl FnOnce(&mut OutlineSnapshot<I>) -> Result<(), SnapshotError>,
    ) -> ApplyOutcome {
        let Some(outline) = self.outlines.get_mut(section) else {
            dwarn!(?section, "DataSourceController: no outline for section");
            panic!("no outline is registered for section {section:?}");
        };
        if let Err(err) = f(outline) {
            dwarn!(%err, "DataSourceController: outline update rejected");
            panic!("{err}");
        }
        let visible: Vec<I> = outline.visible_items().into_iter().cloned().collect();
        self.apply_section_items(section, visible, animated)
    }

    #[track_caller]
    fn apply_section_items(&mut self, section: &S, items: Vec<I>, animated: bool) -> ApplyOutcome {
        // Markers carried by the base stay: already-applied ones do not fire twice, and queued
        // ones still have to render.
        let mut next = self.latest().clone();
        let before: &[I] = next.items_in(section).unwrap_or_default();
        let content: Vec<(I, u64)> = before
            .iter()
            .filter_map(|i| Some((i.clone(), next.content_of(i)?)))
            .collect();
        let reloaded: Vec<I> = before
            .iter()
            .filter(|i| next.is_reloaded(i))
            .cloned()
            .collect();
        if next.contains_section(section) {
            let stale: Vec<I> = next.items_in(section).unwrap_or_default().to_vec();
            next.delete_items(stale);
        } else {
            next.append_section(section.clone());
        }
        next.append_items(items, section);
        for (item, fingerprint) in content {
            if next.contains_item(&item) {
                next.set_content(&item, fingerprint);
            }
        }
        let reloaded: Vec<I> = reloaded.into_iter().filter(|i| next.contains_item(i)).collect();
        next.reload_items(reloaded);
        self.apply(next, animated)
    }

    #[cfg(feature = "worker")]
    fn offload(&mut self, request: Request<S, I>) -> Result<(), Request<S, I>> {
        let Some(threshold) = self.options.background_threshold else {
            return Err(request);
        };
        let Some(worker) = &self.worker else {
            return Err(request);
        };
        if self.current.number_of_items() + request.snapshot.number_of_items() < threshold {
            return Err(request);
        }
        let generation = self.generation + 1;
        let job = DiffJob {
            generation,
            old: self.current.clone(),
            new: request.snapshot.clone(),
        };
        if worker.submit(job).is_err() {
            return Err(request);
        }
        self.generation = generation;
        self.outstanding += 1;
        self.in_flight = Some(InFlight {
            generation,
            request,
        });
        self.phase = Phase::Diffing;
        ddebug!(generation, "DataSourceController: diff offloaded");
        Ok(())
    }

    #[cfg(feature = "worker")]
    fn finish(&mut self, done: DiffDone<S, I>) -> usize {
        self.outstanding -= 1;
        let Some(in_flight) = self.in_flight.take_if(|f| f.generation == done.generation) else {
            self.stats.discarded += 1;
            dwarn!(
                generation = done.generation,
                "DataSourceController: discarding stale diff"
            );
            return 0;
        };
        self.phase = Phase::Applying;
        self.commit(in_flight.request, done.script);
        self.phase = Phase::Idle;
        1 + usize::from(self.drain().is_some_and(ApplyOutcome::is_applied))
    }

    /// The worker thread is gone: diff the in-flight request here and stop offloading.
    #[cfg(feature = "worker")]
    fn fall_back(&mut self) -> usize {
        dwarn!("DataSourceController: worker disconnected, diffing synchronously");
        self.worker = None;
        self.outstanding = 0;
        let mut committed = 0;
        if let Some(in_flight) = self.in_flight.take() {
            self.phase = Phase::Applying;
            let script = diff(&self.current, &in_flight.request.snapshot);
            self.commit(in_flight.request, script);
            committed += 1;
        }
        self.phase = Phase::Idle;
        committed + usize::from(self.drain().is_some_and(ApplyOutcome::is_applied))
    }

    #[cfg(feature = "worker")]
    fn abandon_in_flight(&mut self) -> bool {
        if self.in_flight.take().is_none() {
            return false;
        }
        self.phase = Phase::Idle;
        true
    }

    #[cfg(not(feature = "worker"))]
    fn abandon_in_flight(&mut self) -> bool {
        false
    }
}
