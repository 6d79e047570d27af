// Example: applies inside a batch collapse into a single render.
use diffable::{EditScript, Snapshot};
use diffable_adapter::DataSourceController;

fn list(items: &[u32]) -> Snapshot<&'static str, u32> {
    let mut s = Snapshot::new();
    s.append_section("main");
    s.append_items(items.iter().copied(), &"main");
    s
}

fn main() {
    let mut c = DataSourceController::new(|script: &EditScript<&'static str, u32>, animated: bool| {
        println!("render: {} change(s), animated={animated}", script.len());
    });

    c.batch_update(|c| {
        c.apply(list(&[1]), true);
        c.apply(list(&[1, 2]), true);
        c.apply(list(&[2, 3, 4]), true);
    });
    println!("stats: {:?}", c.stats());

    // Re-applying the same snapshot produces no render at all.
    c.apply(list(&[2, 3, 4]), true);
    println!("stats: {:?}", c.stats());
}
