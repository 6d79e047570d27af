// Example: outline expand/collapse through the controller, mirrored by a ModelRenderer.
use diffable::OutlineSnapshot;
use diffable_adapter::{DataSourceController, ModelRenderer};

fn main() {
    let mut outline = OutlineSnapshot::new();
    outline.append(["Fruits", "Vegetables"], None);
    outline.append(["Apple", "Pear"], Some(&"Fruits"));
    outline.append(["Leek", "Kale", "Pea"], Some(&"Vegetables"));

    let mut c = DataSourceController::new(ModelRenderer::new());
    c.apply_outline("menu", outline, false);

    for header in ["Fruits", "Vegetables", "Fruits"] {
        let outcome = c.toggle(&"menu", &header, true);
        let rows: Vec<_> = c.renderer().model().item_identifiers().copied().collect();
        println!("toggle {header}: {outcome:?} -> {rows:?}");
    }
}
