use alloc::sync::Arc;

use diffable::{IdMap, Identifier, ItemPath};

/// An item that belongs to one of several presentation kinds (e.g. an outline header versus
/// a leaf row).
pub trait Kinded {
    type Kind: Identifier;

    fn kind(&self) -> Self::Kind;
}

/// Builds the presentation `C` for an item of a given kind at a given path.
pub type CellProvider<T, C> = Arc<dyn Fn(&T, ItemPath) -> C + Send + Sync>;

/// A dispatch table from item kind to presentation provider.
///
/// Renderers look up the provider for each inserted or reloaded item instead of matching on
/// item variants at every call site.
pub struct CellRegistry<T: Kinded, C> {
    providers: IdMap<T::Kind, CellProvider<T, C>>,
}

impl<T: Kinded, C> Default for CellRegistry<T, C> {
    fn default() -> Self {
        Self {
            providers: IdMap::default(),
        }
    }
}

impl<T: Kinded, C> Clone for CellRegistry<T, C> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
        }
    }
}

impl<T: Kinded, C> core::fmt::Debug for CellRegistry<T, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CellRegistry")
            .field("kinds", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl<T: Kinded, C> CellRegistry<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the provider for `kind`, replacing any previous one.
    pub fn register(
        &mut self,
        kind: T::Kind,
        provider: impl Fn(&T, ItemPath) -> C + Send + Sync + 'static,
    ) -> &mut Self {
        if self.providers.insert(kind, Arc::new(provider)).is_some() {
            ddebug!("CellRegistry: replaced provider");
        }
        self
    }

    pub fn with(
        mut self,
        kind: T::Kind,
        provider: impl Fn(&T, ItemPath) -> C + Send + Sync + 'static,
    ) -> Self {
        self.register(kind, provider);
        self
    }

    pub fn contains(&self, kind: &T::Kind) -> bool {
        self.providers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Builds the presentation for `item`, or `None` if its kind was never registered.
    pub fn configure(&self, item: &T, at: ItemPath) -> Option<C> {
        let kind = item.kind();
        let Some(provider) = self.providers.get(&kind) else {
            dwarn!(?kind, "CellRegistry: no provider registered");
            return None;
        };
        Some(provider(item, at))
    }
}
