// Example: content fingerprints turn value changes into reloads.
use diffable::{Snapshot, diff, fingerprint};

fn main() {
    let rows = [(1u32, "Milk"), (2, "Eggs"), (3, "Bread")];

    let mut old = Snapshot::new();
    old.append_section("groceries");
    old.append_items_with_content(
        rows.iter().map(|(id, title)| (*id, fingerprint(title))),
        &"groceries",
    );

    // Same identities, one edited title, one row moved to the top.
    let edited = [(3u32, "Bread"), (1, "Oat milk"), (2, "Eggs")];
    let mut new = Snapshot::new();
    new.append_section("groceries");
    new.append_items_with_content(
        edited.iter().map(|(id, title)| (*id, fingerprint(title))),
        &"groceries",
    );

    let script = diff(&old, &new);
    println!("moved: {:?}", script.moved_items().collect::<Vec<_>>());
    println!("reloaded: {:?}", script.reloaded_items().collect::<Vec<_>>());
}
