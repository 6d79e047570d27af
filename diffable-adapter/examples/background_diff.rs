// Example: large diffs run on a worker thread while newer snapshots coalesce.
use diffable::{EditScript, Snapshot};
use diffable_adapter::{ControllerOptions, DataSourceController, DiffWorker};

fn range(start: u32, end: u32) -> Snapshot<u8, u32> {
    let mut s = Snapshot::new();
    s.append_section(0);
    s.append_items(start..end, &0);
    s
}

fn main() -> std::io::Result<()> {
    let renderer = |script: &EditScript<u8, u32>, _animated: bool| {
        println!(
            "render: +{} -{} moved {}",
            script.inserted_items().count(),
            script.removed_items().count(),
            script.moved_items().count()
        );
    };
    let options = ControllerOptions::default().with_background_threshold(Some(10_000));
    let mut c = DataSourceController::with_options(renderer, options).with_worker(DiffWorker::spawn()?);

    println!("{:?}", c.apply(range(0, 20_000), true));
    println!("{:?}", c.apply(range(5_000, 25_000), true));
    println!("{:?}", c.apply(range(10_000, 30_000), true));

    let committed = c.wait();
    println!("committed {committed}, stats {:?}", c.stats());
    Ok(())
}
