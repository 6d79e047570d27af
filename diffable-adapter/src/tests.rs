use crate::*;

use alloc::vec::Vec;
use diffable::{EditScript, ItemPath, OutlineSnapshot, Snapshot, diff};
use std::string::String;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 11
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + (self.next_u64() % span) as usize
    }
}

#[derive(Default)]
struct Recorder {
    scripts: Vec<(EditScript<&'static str, u32>, bool)>,
    reloads: Vec<Snapshot<&'static str, u32>>,
}

impl Renderer<&'static str, u32> for Recorder {
    fn render(&mut self, script: &EditScript<&'static str, u32>, animated: bool) {
        self.scripts.push((script.clone(), animated));
    }

    fn reload(&mut self, snapshot: &Snapshot<&'static str, u32>) {
        self.reloads.push(snapshot.clone());
    }
}

fn flat(sections: &[(&'static str, &[u32])]) -> Snapshot<&'static str, u32> {
    let mut s = Snapshot::new();
    for (section, items) in sections {
        s.append_section(*section);
        s.append_items(items.iter().copied(), section);
    }
    s
}

fn menu() -> OutlineSnapshot<&'static str> {
    let mut outline = OutlineSnapshot::new();
    outline.append(["FirstSection", "You Know Who?", "Harry Potter and"], None);
    outline.append(["Hoge", "Fuga", "Piyo"], Some(&"FirstSection"));
    outline.append(
        ["It's me Jcob", "Kety? You?", "Tell me who."],
        Some(&"You Know Who?"),
    );
    outline.append(
        ["the stinkly toilet", "the hungry dog", "the british pub"],
        Some(&"Harry Potter and"),
    );
    outline
}

#[test]
fn apply_renders_then_commits() {
    let mut c = DataSourceController::new(Recorder::default());
    let a = flat(&[("main", &[1, 2, 3])]);

    assert_eq!(c.apply(a.clone(), true), ApplyOutcome::Applied { changes: 4 });
    assert_eq!(c.snapshot(), &a);
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.renderer().scripts.len(), 1);
    assert_eq!(c.renderer().scripts[0].0, diff(&Snapshot::new(), &a));
    assert!(c.renderer().scripts[0].1);

    let b = flat(&[("main", &[3, 1, 4])]);
    assert_eq!(c.apply(b.clone(), false), ApplyOutcome::Applied { changes: 3 });
    assert_eq!(c.renderer().scripts[1].0, diff(&a, &b));
    assert!(!c.renderer().scripts[1].1);
    assert_eq!(c.snapshot(), &b);
}

#[test]
fn reapplying_the_same_snapshot_skips_the_renderer() {
    let mut c = DataSourceController::new(Recorder::default());
    let a = flat(&[("main", &[1, 2, 3]), ("more", &[4])]);

    c.apply(a.clone(), true);
    assert_eq!(c.apply(a.clone(), true), ApplyOutcome::Applied { changes: 0 });
    assert_eq!(c.renderer().scripts.len(), 1);
    assert_eq!(
        c.stats(),
        ApplyStats {
            applied: 2,
            empty: 1,
            ..ApplyStats::default()
        }
    );
}

#[test]
fn applied_reload_markers_are_not_replayed() {
    let mut c = DataSourceController::new(Recorder::default());
    c.apply(flat(&[("main", &[1, 2, 3])]), false);

    let mut marked = c.snapshot().clone();
    marked.reload_items([2]);
    assert_eq!(c.apply(marked.clone(), false), ApplyOutcome::Applied { changes: 1 });
    assert_eq!(c.apply(marked, false), ApplyOutcome::Applied { changes: 0 });

    let mut next = c.snapshot().clone();
    next.append_items([4], &"main");
    c.apply(next, false);

    let scripts = &c.renderer().scripts;
    assert_eq!(scripts.len(), 3);
    assert_eq!(scripts[1].0.reloaded_items().copied().collect::<Vec<_>>(), [2]);
    assert_eq!(scripts[2].0.reloaded_items().count(), 0);
    assert_eq!(scripts[2].0.inserted_items().copied().collect::<Vec<_>>(), [4]);
}

#[test]
fn outline_updates_keep_queued_reloads() {
    let mut c = DataSourceController::new(Recorder::default());
    let mut outline = OutlineSnapshot::new();
    outline.append([100], None);
    outline.append([101, 102], Some(&100));

    c.apply(flat(&[("main", &[1, 2, 3])]), false);
    c.apply_outline("side", outline, false);
    c.batch_update(|c| {
        let mut marked = c.snapshot().clone();
        marked.reload_items([2]);
        c.apply(marked, true);
        c.expand(&"side", [100], true);
    });

    assert_eq!(c.stats().superseded, 1);
    let (script, animated) = &c.renderer().scripts[2];
    assert!(*animated);
    assert_eq!(script.reloaded_items().copied().collect::<Vec<_>>(), [2]);
    assert_eq!(script.inserted_items().copied().collect::<Vec<_>>(), [101, 102]);
    assert_eq!(c.renderer().scripts.len(), 3);
}

#[test]
fn model_renderer_tracks_every_applied_snapshot() {
    let mut rng = Lcg::new(7);
    let mut c = DataSourceController::new(ModelRenderer::<u32, u32>::new());

    for _ in 0..50 {
        let mut next = Snapshot::new();
        let sections = rng.gen_range_usize(0, 4) as u32;
        next.append_sections(0..sections);
        for item in 0..20u32 {
            if sections == 0 || rng.gen_range_usize(0, 3) == 0 {
                continue;
            }
            let section = rng.gen_range_usize(0, sections as usize) as u32;
            next.append_items([item], &section);
        }
        c.apply(next, true);
        assert!(c.renderer().model().same_layout(c.snapshot()));
    }
    assert_eq!(c.renderer().render_count() as u64, c.stats().applied - c.stats().empty);
}

#[test]
fn closures_are_renderers() {
    let mut changes = 0;
    {
        let mut c = DataSourceController::new(
            |script: &EditScript<&'static str, u32>, _animated: bool| changes += script.len(),
        );
        c.apply(flat(&[("main", &[1, 2, 3])]), false);
        c.apply(flat(&[("main", &[3, 1, 4])]), false);
    }
    assert_eq!(changes, 7);
}

#[test]
fn batch_update_renders_only_the_last_snapshot() {
    let mut c = DataSourceController::new(Recorder::default());
    let a = flat(&[("main", &[1])]);
    let b = flat(&[("main", &[1, 2])]);
    let last = flat(&[("main", &[2, 3])]);

    let outcome = c.batch_update(|c| {
        assert_eq!(c.apply(a, true), ApplyOutcome::Queued);
        assert_eq!(c.apply(b, true), ApplyOutcome::Queued);
        assert!(c.snapshot().is_empty());
        c.apply(last.clone(), true)
    });

    assert_eq!(outcome, ApplyOutcome::Queued);
    assert_eq!(c.stats().superseded, 2);
    assert_eq!(c.renderer().scripts.len(), 1);
    assert_eq!(c.renderer().scripts[0].0, diff(&Snapshot::new(), &last));
    assert_eq!(c.snapshot(), &last);
}

#[test]
fn nested_batches_flush_once() {
    let mut c = DataSourceController::new(Recorder::default());
    c.batch_update(|c| {
        c.apply(flat(&[("main", &[1])]), false);
        c.batch_update(|c| {
            c.apply(flat(&[("main", &[2])]), false);
        });
        assert!(c.has_pending());
        assert!(c.renderer().scripts.is_empty());
    });
    assert!(!c.has_pending());
    assert_eq!(c.renderer().scripts.len(), 1);
    assert_eq!(c.snapshot(), &flat(&[("main", &[2])]));
}

#[test]
fn cancel_drops_the_pending_request() {
    let mut c = DataSourceController::new(Recorder::default());
    c.batch_update(|c| {
        c.apply(flat(&[("main", &[1])]), false);
        assert!(c.cancel());
    });
    assert!(c.renderer().scripts.is_empty());
    assert!(c.snapshot().is_empty());
    assert!(!c.cancel());
}

#[test]
fn reloading_data_bypasses_the_differ() {
    let mut c = DataSourceController::new(Recorder::default());
    c.apply(flat(&[("main", &[1, 2])]), false);

    let b = flat(&[("other", &[9])]);
    c.apply_reloading_data(b.clone());
    assert_eq!(c.snapshot(), &b);
    assert_eq!(c.renderer().scripts.len(), 1);
    assert_eq!(c.renderer().reloads, [b]);
    assert_eq!(c.stats().reloads, 1);
}

#[test]
fn outline_toggles_apply_contiguous_blocks() {
    let mut c = DataSourceController::new(ModelRenderer::<&'static str, &'static str>::new());
    let mut outline = menu();
    outline.expand(["FirstSection", "You Know Who?", "Harry Potter and"]);

    assert_eq!(
        c.apply_outline("sidebar", outline, false),
        ApplyOutcome::Applied { changes: 13 }
    );
    assert_eq!(c.snapshot().number_of_items_in(&"sidebar"), Some(12));

    assert_eq!(
        c.collapse(&"sidebar", ["FirstSection"], true),
        ApplyOutcome::Applied { changes: 3 }
    );
    assert_eq!(c.snapshot().number_of_items_in(&"sidebar"), Some(9));
    assert!(!c.snapshot().contains_item(&"Hoge"));
    assert!(c.outline(&"sidebar").is_some_and(|o| !o.is_expanded(&"FirstSection")));

    assert_eq!(
        c.expand(&"sidebar", ["FirstSection"], true),
        ApplyOutcome::Applied { changes: 3 }
    );
    assert_eq!(c.snapshot().item_path(&"Hoge"), Some(ItemPath::new(0, 1)));
    assert_eq!(c.snapshot().item_path(&"Piyo"), Some(ItemPath::new(0, 3)));

    assert_eq!(
        c.toggle(&"sidebar", &"Harry Potter and", true),
        ApplyOutcome::Applied { changes: 3 }
    );
    assert!(c.renderer().model().same_layout(c.snapshot()));
    assert_eq!(c.renderer().render_count(), 4);
}

#[test]
fn outline_is_dropped_with_its_section() {
    let mut c = DataSourceController::new(ModelRenderer::<&'static str, &'static str>::new());
    c.apply_outline("sidebar", menu(), false);
    assert!(c.outline(&"sidebar").is_some());

    c.apply(Snapshot::new(), false);
    assert!(c.outline(&"sidebar").is_none());
}

#[test]
#[should_panic(expected = "no outline is registered")]
fn expanding_without_an_outline_panics() {
    let mut c = DataSourceController::new(ModelRenderer::<&'static str, &'static str>::new());
    c.expand(&"sidebar", ["FirstSection"], false);
}

#[test]
#[should_panic(expected = "does not exist")]
fn expanding_an_unknown_outline_item_panics() {
    let mut c = DataSourceController::new(ModelRenderer::<&'static str, &'static str>::new());
    c.apply_outline("sidebar", menu(), false);
    c.expand(&"sidebar", ["Nope"], false);
}

#[derive(Clone, Debug)]
enum Row {
    Header(&'static str),
    Leaf(&'static str, u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum RowKind {
    Header,
    Leaf,
    Footer,
}

impl Kinded for Row {
    type Kind = RowKind;

    fn kind(&self) -> RowKind {
        match self {
            Row::Header(_) => RowKind::Header,
            Row::Leaf(..) => RowKind::Leaf,
        }
    }
}

#[test]
fn registry_dispatches_on_item_kind() {
    let registry = CellRegistry::<Row, String>::new()
        .with(RowKind::Header, |row, at| match row {
            Row::Header(title) => std::format!("{title} {at}"),
            Row::Leaf(..) => String::new(),
        })
        .with(RowKind::Leaf, |row, _| match row {
            Row::Leaf(name, count) => std::format!("{name} ({count})"),
            Row::Header(_) => String::new(),
        });

    assert_eq!(registry.len(), 2);
    assert!(registry.contains(&RowKind::Leaf));
    assert!(!registry.contains(&RowKind::Footer));
    assert_eq!(
        registry
            .configure(&Row::Header("Inbox"), ItemPath::new(0, 0))
            .as_deref(),
        Some("Inbox [0, 0]")
    );
    assert_eq!(
        registry
            .configure(&Row::Leaf("drafts", 3), ItemPath::new(0, 1))
            .as_deref(),
        Some("drafts (3)")
    );

    let mut empty = CellRegistry::<Row, String>::new();
    assert!(empty.is_empty());
    assert_eq!(empty.configure(&Row::Header("x"), ItemPath::new(0, 0)), None);
    empty.register(RowKind::Header, |_, _| String::from("h"));
    assert_eq!(
        empty.configure(&Row::Header("x"), ItemPath::new(0, 0)).as_deref(),
        Some("h")
    );
}

#[cfg(feature = "worker")]
fn threaded() -> DataSourceController<&'static str, u32, Recorder> {
    let worker = DiffWorker::spawn().expect("spawn diff worker");
    DataSourceController::with_options(
        Recorder::default(),
        ControllerOptions::default().with_background_threshold(Some(1)),
    )
    .with_worker(worker)
}

#[cfg(feature = "worker")]
#[test]
fn background_diffs_coalesce_while_in_flight() {
    let mut c = threaded();
    let a = flat(&[("main", &[1, 2, 3])]);
    let b = flat(&[("main", &[1, 2])]);
    let last = flat(&[("main", &[3, 1, 4])]);

    assert_eq!(c.apply(a.clone(), true), ApplyOutcome::Deferred);
    assert_eq!(c.phase(), Phase::Diffing);
    assert_eq!(c.apply(b, true), ApplyOutcome::Queued);
    assert_eq!(c.apply(last.clone(), true), ApplyOutcome::Queued);
    assert_eq!(c.stats().superseded, 1);
    assert!(c.snapshot().is_empty());

    assert_eq!(c.wait(), 2);
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.snapshot(), &last);

    let scripts = &c.renderer().scripts;
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[0].0, diff(&Snapshot::new(), &a));
    assert_eq!(scripts[1].0, diff(&a, &last));
}

#[cfg(feature = "worker")]
#[test]
fn stale_background_results_are_discarded() {
    let mut c = threaded();
    let a = flat(&[("main", &[1, 2, 3])]);
    let b = flat(&[("main", &[5])]);

    assert_eq!(c.apply(a, true), ApplyOutcome::Deferred);
    c.apply_reloading_data(b.clone());
    assert_eq!(c.phase(), Phase::Idle);

    assert_eq!(c.wait(), 0);
    assert_eq!(c.stats().discarded, 1);
    assert!(c.renderer().scripts.is_empty());
    assert_eq!(c.snapshot(), &b);

    let last = flat(&[("main", &[5, 6])]);
    assert_eq!(c.apply(last.clone(), false), ApplyOutcome::Deferred);
    while c.poll() == 0 {
        std::thread::yield_now();
    }
    assert_eq!(c.renderer().scripts.len(), 1);
    assert_eq!(c.renderer().scripts[0].0, diff(&b, &last));
}

#[cfg(feature = "worker")]
#[test]
fn small_diffs_stay_on_the_caller_thread() {
    let worker = DiffWorker::spawn().expect("spawn diff worker");
    let mut c = DataSourceController::with_options(
        Recorder::default(),
        ControllerOptions::default().with_background_threshold(Some(100)),
    )
    .with_worker(worker);

    assert_eq!(
        c.apply(flat(&[("main", &[1, 2])]), false),
        ApplyOutcome::Applied { changes: 3 }
    );
    assert_eq!(c.poll(), 0);
}

#[cfg(feature = "worker")]
#[test]
fn worker_config_names_the_thread() {
    let worker =
        DiffWorker::<u32, u32>::with_config(WorkerConfig::with_name("rows").queue_capacity(0))
            .expect("spawn diff worker");
    assert_eq!(worker.name(), "rows");
    assert!(worker.is_running());
}
