use diffable::{EditScript, Identifier, Snapshot};

/// The collaborator that turns edit scripts into on-screen changes.
///
/// The controller only calls `render` with non-empty scripts. Operations must be applied in
/// the order given (see [`EditScript`]): section removes, section inserts/moves, item removes,
/// item inserts/moves, item reloads.
///
/// Closures `FnMut(&EditScript<S, I>, bool)` implement this trait.
pub trait Renderer<S, I> {
    fn render(&mut self, script: &EditScript<S, I>, animated: bool);

    /// Called when the controller replaces its snapshot without diffing
    /// (see [`crate::DataSourceController::apply_reloading_data`]).
    fn reload(&mut self, snapshot: &Snapshot<S, I>) {
        let _ = snapshot;
    }
}

impl<S, I, F> Renderer<S, I> for F
where
    F: FnMut(&EditScript<S, I>, bool),
{
    fn render(&mut self, script: &EditScript<S, I>, animated: bool) {
        self(script, animated)
    }
}

/// A renderer that keeps a headless mirror of the on-screen rows by replaying every script.
///
/// Useful for adapters that need to know what is displayed (e.g. to map a tapped row back to
/// its identifier) and for verifying that scripts reproduce the applied snapshot.
#[derive(Clone, Debug)]
pub struct ModelRenderer<S, I> {
    model: Snapshot<S, I>,
    renders: usize,
    reloads: usize,
}

impl<S, I> Default for ModelRenderer<S, I> {
    fn default() -> Self {
        Self {
            model: Snapshot::default(),
            renders: 0,
            reloads: 0,
        }
    }
}

impl<S: Identifier, I: Identifier> ModelRenderer<S, I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &Snapshot<S, I> {
        &self.model
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn reload_count(&self) -> usize {
        self.reloads
    }
}

impl<S: Identifier, I: Identifier> Renderer<S, I> for ModelRenderer<S, I> {
    fn render(&mut self, script: &EditScript<S, I>, _animated: bool) {
        self.model = script.apply_to(&self.model);
        self.renders += 1;
    }

    fn reload(&mut self, snapshot: &Snapshot<S, I>) {
        self.model = snapshot.clone();
        self.reloads += 1;
    }
}
