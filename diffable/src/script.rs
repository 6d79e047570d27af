use alloc::vec::Vec;

use crate::key::{Identifier, id_map};
use crate::{ItemPath, Snapshot};

/// A structural change to the section list.
///
/// `Remove::at` and `Move::from` are indices in the old snapshot; `Insert::at` and `Move::to`
/// are indices in the new one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionChange<S> {
    Remove { id: S, at: usize },
    Insert { id: S, at: usize },
    Move { id: S, from: usize, to: usize },
}

impl<S> SectionChange<S> {
    pub fn id(&self) -> &S {
        match self {
            Self::Remove { id, .. } | Self::Insert { id, .. } | Self::Move { id, .. } => id,
        }
    }
}

/// A structural or content change to a single item.
///
/// `Remove::at` and `Move::from` are paths in the old snapshot; `Insert::at`, `Move::to` and
/// `Reload::at` are paths in the new one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemChange<I> {
    Remove { id: I, at: ItemPath },
    Insert { id: I, at: ItemPath },
    Move { id: I, from: ItemPath, to: ItemPath },
    Reload { id: I, at: ItemPath },
}

impl<I> ItemChange<I> {
    pub fn id(&self) -> &I {
        match self {
            Self::Remove { id, .. }
            | Self::Insert { id, .. }
            | Self::Move { id, .. }
            | Self::Reload { id, .. } => id,
        }
    }
}

/// The changes that turn one snapshot into another, in the order a renderer must apply them.
///
/// Section changes come first (removes, then inserts and moves), followed by item changes
/// (removes, then inserts and moves, then reloads). Each item phase spans all sections: every
/// item remove in the script precedes every item insert, whichever section it touches, which
/// is the order a single batch update needs. Removes are listed from last to first by path;
/// everything else is listed by ascending destination path.
///
/// Indices follow batch-update semantics: anything describing where a row *was* refers to the
/// old snapshot, anything describing where a row *goes* refers to the new one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EditScript<S, I> {
    sections: Vec<SectionChange<S>>,
    items: Vec<ItemChange<I>>,
}

impl<S, I> Default for EditScript<S, I> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<S, I> EditScript<S, I> {
    pub(crate) fn from_parts(sections: Vec<SectionChange<S>>, items: Vec<ItemChange<I>>) -> Self {
        Self { sections, items }
    }

    pub fn sections(&self) -> &[SectionChange<S>] {
        &self.sections
    }

    pub fn items(&self) -> &[ItemChange<I>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.items.is_empty()
    }

    /// Total number of section and item changes.
    pub fn len(&self) -> usize {
        self.sections.len() + self.items.len()
    }

    pub fn inserted_items(&self) -> impl Iterator<Item = &I> + '_ {
        self.items.iter().filter_map(|c| match c {
            ItemChange::Insert { id, .. } => Some(id),
            _ => None,
        })
    }

    pub fn removed_items(&self) -> impl Iterator<Item = &I> + '_ {
        self.items.iter().filter_map(|c| match c {
            ItemChange::Remove { id, .. } => Some(id),
            _ => None,
        })
    }

    pub fn moved_items(&self) -> impl Iterator<Item = &I> + '_ {
        self.items.iter().filter_map(|c| match c {
            ItemChange::Move { id, .. } => Some(id),
            _ => None,
        })
    }

    pub fn reloaded_items(&self) -> impl Iterator<Item = &I> + '_ {
        self.items.iter().filter_map(|c| match c {
            ItemChange::Reload { id, .. } => Some(id),
            _ => None,
        })
    }
}

impl<S: Identifier, I: Identifier> EditScript<S, I> {
    /// Replays the script on `old` and returns the resulting layout.
    ///
    /// This is what a renderer does to its on-screen rows. The result carries no content
    /// fingerprints or reload markers.
    ///
    /// # Panics
    ///
    /// Panics if the script was not computed against `old` and produces a duplicate identifier.
    #[track_caller]
    pub fn apply_to(&self, old: &Snapshot<S, I>) -> Snapshot<S, I> {
        let mut gone_sections = id_map::<&S, ()>(self.sections.len());
        let mut placed_sections: Vec<(usize, &S)> = Vec::new();
        for change in &self.sections {
            match change {
                SectionChange::Remove { id, .. } => {
                    gone_sections.insert(id, ());
                }
                SectionChange::Insert { id, at } => placed_sections.push((*at, id)),
                SectionChange::Move { id, to, .. } => {
                    gone_sections.insert(id, ());
                    placed_sections.push((*to, id));
                }
            }
        }
        placed_sections.sort_by_key(|(at, _)| *at);
        let order = interleave(
            old.section_identifiers()
                .filter(|s| !gone_sections.contains_key(s)),
            placed_sections,
        );

        let mut gone_items = id_map::<&I, ()>(self.items.len());
        let mut placed_items: Vec<(ItemPath, &I)> = Vec::new();
        for change in &self.items {
            match change {
                ItemChange::Remove { id, .. } => {
                    gone_items.insert(id, ());
                }
                ItemChange::Insert { id, at } => placed_items.push((*at, id)),
                ItemChange::Move { id, to, .. } => {
                    gone_items.insert(id, ());
                    placed_items.push((*to, id));
                }
                ItemChange::Reload { .. } => {}
            }
        }
        placed_items.sort_by_key(|(at, _)| *at);

        let mut out = Snapshot::new();
        out.append_sections(order.iter().map(|s| (*s).clone()));
        let mut cursor = 0;
        for (index, section) in order.iter().enumerate() {
            let start = cursor;
            while cursor < placed_items.len() && placed_items[cursor].0.section == index {
                cursor += 1;
            }
            let items = interleave(
                old.items_in(section)
                    .unwrap_or_default()
                    .iter()
                    .filter(|i| !gone_items.contains_key(i)),
                placed_items[start..cursor]
                    .iter()
                    .map(|(at, id)| (at.item, *id)),
            );
            out.append_items(items.into_iter().cloned(), section);
        }
        debug_assert_eq!(cursor, placed_items.len(), "item placed in a missing section");
        out
    }
}

/// Fills slots named by `placed` (ascending index) and fills the gaps with `stable` in order.
fn interleave<'a, T: ?Sized>(
    mut stable: impl Iterator<Item = &'a T>,
    placed: impl IntoIterator<Item = (usize, &'a T)>,
) -> Vec<&'a T> {
    let mut out = Vec::new();
    for (at, id) in placed {
        while out.len() < at {
            match stable.next() {
                Some(s) => out.push(s),
                None => break,
            }
        }
        out.push(id);
    }
    out.extend(stable);
    out
}
