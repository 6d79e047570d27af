use alloc::vec::Vec;

use crate::error::violated;
use crate::key::{IdMap, Identifier, id_map};
use crate::{ItemPath, SnapshotError};

#[derive(Clone, Debug)]
pub(crate) struct Section<S, I> {
    pub(crate) id: S,
    pub(crate) items: Vec<I>,
}

/// The declarative target state of a list or grid: ordered sections, each holding an ordered
/// list of items.
///
/// Snapshots are plain values. Cloning one and mutating the clone never affects the original,
/// which is what lets a controller diff a snapshot while the caller keeps editing its own copy.
///
/// Item identifiers are unique across the whole snapshot, not just within a section. Every
/// mutator checks this (and that referenced identifiers exist) before touching any state:
/// the plain form panics at the offending call, the `try_*` form returns a [`SnapshotError`].
///
/// Content changes are tracked separately from identity, either by marking items with
/// [`Snapshot::reload_items`] or by attaching a content fingerprint with
/// [`Snapshot::set_content`].
#[derive(Clone, Debug)]
pub struct Snapshot<S, I> {
    sections: Vec<Section<S, I>>,
    section_index: IdMap<S, usize>,
    item_section: IdMap<I, S>,
    content: IdMap<I, u64>,
    reloaded: IdMap<I, ()>,
}

impl<S, I> Default for Snapshot<S, I> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            section_index: IdMap::default(),
            item_section: IdMap::default(),
            content: IdMap::default(),
            reloaded: IdMap::default(),
        }
    }
}

impl<S: Identifier, I: Identifier> PartialEq for Snapshot<S, I> {
    fn eq(&self, other: &Self) -> bool {
        self.same_layout(other) && self.content == other.content && self.reloaded == other.reloaded
    }
}

impl<S: Identifier, I: Identifier> Eq for Snapshot<S, I> {}

impl<S: Identifier, I: Identifier> Snapshot<S, I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn raw_sections(&self) -> &[Section<S, I>] {
        &self.sections
    }

    pub fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn number_of_items(&self) -> usize {
        self.item_section.len()
    }

    pub fn number_of_items_in(&self, section: &S) -> Option<usize> {
        self.items_in(section).map(<[I]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section_identifiers(&self) -> impl Iterator<Item = &S> + '_ {
        self.sections.iter().map(|s| &s.id)
    }

    /// All items in display order, section by section.
    pub fn item_identifiers(&self) -> impl Iterator<Item = &I> + '_ {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn items_in(&self, section: &S) -> Option<&[I]> {
        let index = *self.section_index.get(section)?;
        Some(&self.sections[index].items)
    }

    pub fn section_of(&self, item: &I) -> Option<&S> {
        self.item_section.get(item)
    }

    pub fn index_of_section(&self, section: &S) -> Option<usize> {
        self.section_index.get(section).copied()
    }

    /// Index of `item` in the flattened display order (across all sections).
    pub fn index_of_item(&self, item: &I) -> Option<usize> {
        let path = self.item_path(item)?;
        let before: usize = self.sections[..path.section]
            .iter()
            .map(|s| s.items.len())
            .sum();
        Some(before + path.item)
    }

    /// Linear in the length of the item's section.
    pub fn item_path(&self, item: &I) -> Option<ItemPath> {
        let section = self.index_of_section(self.item_section.get(item)?)?;
        let index = self.sections[section].items.iter().position(|i| i == item)?;
        Some(ItemPath::new(section, index))
    }

    pub fn contains_section(&self, section: &S) -> bool {
        self.section_index.contains_key(section)
    }

    pub fn contains_item(&self, item: &I) -> bool {
        self.item_section.contains_key(item)
    }

    pub fn content_of(&self, item: &I) -> Option<u64> {
        self.content.get(item).copied()
    }

    pub fn is_reloaded(&self, item: &I) -> bool {
        self.reloaded.contains_key(item)
    }

    /// Items marked with [`Snapshot::reload_items`], in display order.
    pub fn reloaded_items(&self) -> impl Iterator<Item = &I> + '_ {
        self.item_identifiers().filter(|i| self.is_reloaded(i))
    }

    /// Returns `true` when both snapshots have the same sections and items in the same order,
    /// ignoring content fingerprints and reload markers.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.sections.len() == other.sections.len()
            && self
                .sections
                .iter()
                .zip(other.sections.iter())
                .all(|(a, b)| a.id == b.id && a.items == b.items)
    }

    #[track_caller]
    pub fn append_section(&mut self, section: S) {
        violated(self.try_append_section(section))
    }

    pub fn try_append_section(&mut self, section: S) -> Result<(), SnapshotError> {
        self.try_append_sections([section])
    }

    #[track_caller]
    pub fn append_sections(&mut self, sections: impl IntoIterator<Item = S>) {
        violated(self.try_append_sections(sections))
    }

    pub fn try_append_sections(
        &mut self,
        sections: impl IntoIterator<Item = S>,
    ) -> Result<(), SnapshotError> {
        let at = self.sections.len();
        self.splice_sections(at, sections)
    }

    #[track_caller]
    pub fn insert_sections_before(&mut self, sections: impl IntoIterator<Item = S>, before: &S) {
        violated(self.try_insert_sections_before(sections, before))
    }

    pub fn try_insert_sections_before(
        &mut self,
        sections: impl IntoIterator<Item = S>,
        before: &S,
    ) -> Result<(), SnapshotError> {
        let at = self.require_section(before)?;
        self.splice_sections(at, sections)
    }

    #[track_caller]
    pub fn insert_sections_after(&mut self, sections: impl IntoIterator<Item = S>, after: &S) {
        violated(self.try_insert_sections_after(sections, after))
    }

    pub fn try_insert_sections_after(
        &mut self,
        sections: impl IntoIterator<Item = S>,
        after: &S,
    ) -> Result<(), SnapshotError> {
        let at = self.require_section(after)? + 1;
        self.splice_sections(at, sections)
    }

    /// Deletes sections together with all of their items.
    #[track_caller]
    pub fn delete_sections(&mut self, sections: impl IntoIterator<Item = S>) {
        violated(self.try_delete_sections(sections))
    }

    pub fn try_delete_sections(
        &mut self,
        sections: impl IntoIterator<Item = S>,
    ) -> Result<(), SnapshotError> {
        let sections: Vec<S> = sections.into_iter().collect();
        let mut doomed = id_map::<S, ()>(sections.len());
        for id in sections {
            self.require_section(&id)?;
            doomed.insert(id, ());
        }
        let mut removed = Vec::new();
        self.sections.retain_mut(|s| {
            if doomed.contains_key(&s.id) {
                removed.append(&mut s.items);
                false
            } else {
                true
            }
        });
        for item in &removed {
            self.forget_item(item);
        }
        dtrace!(
            sections = self.sections.len(),
            removed_items = removed.len(),
            "delete_sections"
        );
        self.reindex_sections();
        Ok(())
    }

    #[track_caller]
    pub fn move_section_before(&mut self, section: &S, before: &S) {
        violated(self.try_move_section_before(section, before))
    }

    pub fn try_move_section_before(&mut self, section: &S, before: &S) -> Result<(), SnapshotError> {
        self.move_section(section, before, 0)
    }

    #[track_caller]
    pub fn move_section_after(&mut self, section: &S, after: &S) {
        violated(self.try_move_section_after(section, after))
    }

    pub fn try_move_section_after(&mut self, section: &S, after: &S) -> Result<(), SnapshotError> {
        self.move_section(section, after, 1)
    }

    #[track_caller]
    pub fn append_items(&mut self, items: impl IntoIterator<Item = I>, section: &S) {
        violated(self.try_append_items(items, section))
    }

    pub fn try_append_items(
        &mut self,
        items: impl IntoIterator<Item = I>,
        section: &S,
    ) -> Result<(), SnapshotError> {
        let index = self.require_section(section)?;
        let at = self.sections[index].items.len();
        self.splice_items(index, at, items.into_iter().collect())
    }

    /// Appends items together with their content fingerprints (see [`crate::fingerprint`]).
    #[track_caller]
    pub fn append_items_with_content(
        &mut self,
        items: impl IntoIterator<Item = (I, u64)>,
        section: &S,
    ) {
        violated(self.try_append_items_with_content(items, section))
    }

    pub fn try_append_items_with_content(
        &mut self,
        items: impl IntoIterator<Item = (I, u64)>,
        section: &S,
    ) -> Result<(), SnapshotError> {
        let (ids, fingerprints): (Vec<I>, Vec<u64>) = items.into_iter().unzip();
        self.try_append_items(ids.iter().cloned(), section)?;
        for (id, fp) in ids.into_iter().zip(fingerprints) {
            self.content.insert(id, fp);
        }
        Ok(())
    }

    #[track_caller]
    pub fn insert_items_before(&mut self, items: impl IntoIterator<Item = I>, before: &I) {
        violated(self.try_insert_items_before(items, before))
    }

    pub fn try_insert_items_before(
        &mut self,
        items: impl IntoIterator<Item = I>,
        before: &I,
    ) -> Result<(), SnapshotError> {
        let path = self.require_item(before)?;
        self.splice_items(path.section, path.item, items.into_iter().collect())
    }

    #[track_caller]
    pub fn insert_items_after(&mut self, items: impl IntoIterator<Item = I>, after: &I) {
        violated(self.try_insert_items_after(items, after))
    }

    pub fn try_insert_items_after(
        &mut self,
        items: impl IntoIterator<Item = I>,
        after: &I,
    ) -> Result<(), SnapshotError> {
        let path = self.require_item(after)?;
        self.splice_items(path.section, path.item + 1, items.into_iter().collect())
    }

    #[track_caller]
    pub fn delete_items(&mut self, items: impl IntoIterator<Item = I>) {
        violated(self.try_delete_items(items))
    }

    pub fn try_delete_items(&mut self, items: impl IntoIterator<Item = I>) -> Result<(), SnapshotError> {
        let items: Vec<I> = items.into_iter().collect();
        let mut doomed = id_map::<I, ()>(items.len());
        for id in items {
            if !self.contains_item(&id) {
                return Err(SnapshotError::unknown_item(&id));
            }
            doomed.insert(id, ());
        }
        for section in &mut self.sections {
            section.items.retain(|i| !doomed.contains_key(i));
        }
        for id in doomed.keys() {
            self.forget_item(id);
        }
        Ok(())
    }

    /// Deletes every item and every section, leaving an empty snapshot.
    pub fn delete_all_items(&mut self) {
        *self = Self::default();
    }

    /// Marks items as having changed content. The differ reports a reload for each of them that
    /// keeps its position.
    #[track_caller]
    pub fn reload_items(&mut self, items: impl IntoIterator<Item = I>) {
        violated(self.try_reload_items(items))
    }

    pub fn try_reload_items(&mut self, items: impl IntoIterator<Item = I>) -> Result<(), SnapshotError> {
        let items: Vec<I> = items.into_iter().collect();
        if let Some(unknown) = items.iter().find(|i| !self.contains_item(i)) {
            return Err(SnapshotError::unknown_item(unknown));
        }
        for id in items {
            self.reloaded.insert(id, ());
        }
        Ok(())
    }

    /// Drops every reload marker.
    ///
    /// A marker only triggers a reload when the previous snapshot did not carry it, so markers
    /// copied along from an applied snapshot are inert. Clearing them keeps derived snapshots
    /// tidy; it is not needed to avoid duplicate reloads.
    pub fn clear_reloaded(&mut self) {
        self.reloaded.clear();
    }

    #[track_caller]
    pub fn set_content(&mut self, item: &I, fingerprint: u64) {
        violated(self.try_set_content(item, fingerprint))
    }

    pub fn try_set_content(&mut self, item: &I, fingerprint: u64) -> Result<(), SnapshotError> {
        if !self.contains_item(item) {
            return Err(SnapshotError::unknown_item(item));
        }
        self.content.insert(item.clone(), fingerprint);
        Ok(())
    }

    #[track_caller]
    pub fn move_item_before(&mut self, item: &I, before: &I) {
        violated(self.try_move_item_before(item, before))
    }

    pub fn try_move_item_before(&mut self, item: &I, before: &I) -> Result<(), SnapshotError> {
        self.move_item(item, before, 0)
    }

    #[track_caller]
    pub fn move_item_after(&mut self, item: &I, after: &I) {
        violated(self.try_move_item_after(item, after))
    }

    pub fn try_move_item_after(&mut self, item: &I, after: &I) -> Result<(), SnapshotError> {
        self.move_item(item, after, 1)
    }

    fn require_section(&self, section: &S) -> Result<usize, SnapshotError> {
        self.index_of_section(section)
            .ok_or_else(|| SnapshotError::unknown_section(section))
    }

    fn require_item(&self, item: &I) -> Result<ItemPath, SnapshotError> {
        self.item_path(item)
            .ok_or_else(|| SnapshotError::unknown_item(item))
    }

    fn splice_sections(
        &mut self,
        at: usize,
        sections: impl IntoIterator<Item = S>,
    ) -> Result<(), SnapshotError> {
        let sections: Vec<S> = sections.into_iter().collect();
        let mut seen = id_map::<S, ()>(sections.len());
        for id in &sections {
            if self.contains_section(id) || seen.insert(id.clone(), ()).is_some() {
                return Err(SnapshotError::duplicate_section(id));
            }
        }
        let tail = self.sections.split_off(at);
        self.sections.extend(sections.into_iter().map(|id| Section {
            id,
            items: Vec::new(),
        }));
        self.sections.extend(tail);
        self.reindex_sections();
        Ok(())
    }

    fn splice_items(&mut self, section: usize, at: usize, items: Vec<I>) -> Result<(), SnapshotError> {
        let mut seen = id_map::<I, ()>(items.len());
        for id in &items {
            if self.contains_item(id) || seen.insert(id.clone(), ()).is_some() {
                return Err(SnapshotError::duplicate_item(id));
            }
        }
        let section_id = self.sections[section].id.clone();
        for id in &items {
            self.item_section.insert(id.clone(), section_id.clone());
        }
        let target = &mut self.sections[section].items;
        let tail = target.split_off(at);
        target.extend(items);
        target.extend(tail);
        Ok(())
    }

    fn move_section(&mut self, section: &S, anchor: &S, offset: usize) -> Result<(), SnapshotError> {
        let from = self.require_section(section)?;
        self.require_section(anchor)?;
        if section == anchor {
            return Err(SnapshotError::self_reference(section));
        }
        let entry = self.sections.remove(from);
        let to = self
            .sections
            .iter()
            .position(|s| &s.id == anchor)
            .map_or(self.sections.len(), |i| i + offset);
        self.sections.insert(to, entry);
        self.reindex_sections();
        Ok(())
    }

    fn move_item(&mut self, item: &I, anchor: &I, offset: usize) -> Result<(), SnapshotError> {
        let from = self.require_item(item)?;
        let mut to = self.require_item(anchor)?;
        if item == anchor {
            return Err(SnapshotError::self_reference(item));
        }
        let moved = self.sections[from.section].items.remove(from.item);
        if to.section == from.section && to.item > from.item {
            to.item -= 1;
        }
        let section_id = self.sections[to.section].id.clone();
        self.sections[to.section].items.insert(to.item + offset, moved);
        self.item_section.insert(item.clone(), section_id);
        Ok(())
    }

    fn forget_item(&mut self, item: &I) {
        self.item_section.remove(item);
        self.content.remove(item);
        self.reloaded.remove(item);
    }

    fn reindex_sections(&mut self) {
        self.section_index.clear();
        for (i, s) in self.sections.iter().enumerate() {
            self.section_index.insert(s.id.clone(), i);
        }
    }
}
