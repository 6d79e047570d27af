// Example: collapsing an outline node removes its visible descendants.
use diffable::{OutlineSnapshot, diff};

fn main() {
    let mut outline = OutlineSnapshot::new();
    outline.append(["Mail", "Calendar"], None);
    outline.append(["Inbox", "Sent", "Archive"], Some(&"Mail"));
    outline.append(["Work", "Home"], Some(&"Calendar"));
    outline.expand(["Mail", "Calendar"]);

    let before = outline.to_snapshot("sidebar");
    outline.collapse(["Mail"]);
    let after = outline.to_snapshot("sidebar");

    for change in diff(&before, &after).items() {
        println!("{change:?}");
    }
    for item in outline.visible_items() {
        let indent = outline.level(item).unwrap_or(0) * 2;
        println!("{:indent$}{item}", "");
    }
}
