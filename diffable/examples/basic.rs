// Example: diff two flat snapshots and replay the script.
use diffable::{ItemChange, Snapshot, diff};

fn main() {
    let mut old = Snapshot::new();
    old.append_section("inbox");
    old.append_items([1u32, 2, 3], &"inbox");

    let mut new = Snapshot::new();
    new.append_section("inbox");
    new.append_items([3u32, 1, 4], &"inbox");

    let script = diff(&old, &new);
    for change in script.items() {
        match change {
            ItemChange::Remove { id, at } => println!("remove {id} at {at}"),
            ItemChange::Insert { id, at } => println!("insert {id} at {at}"),
            ItemChange::Move { id, from, to } => println!("move {id} {from} -> {to}"),
            ItemChange::Reload { id, at } => println!("reload {id} at {at}"),
        }
    }

    let replayed = script.apply_to(&old);
    println!("replay matches: {}", replayed.same_layout(&new));
}
