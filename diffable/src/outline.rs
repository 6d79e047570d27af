use alloc::vec::Vec;

use crate::error::violated;
use crate::key::{IdMap, Identifier, id_map};
use crate::{Snapshot, SnapshotError};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Node<I> {
    parent: Option<I>,
    children: Vec<I>,
    expanded: bool,
}

/// A hierarchical snapshot for sidebar/outline style lists.
///
/// Items form a forest. Every item is unique, may have a parent and ordered children, and
/// carries an expanded flag (new items start collapsed). Items can only be attached to a parent
/// that already exists, so the forest never contains cycles.
///
/// Only the *visible* items are shown on screen: an item is visible when every ancestor is
/// expanded. [`OutlineSnapshot::visible_items`] flattens the forest in pre-order; diffing the
/// flattened sequence before and after a toggle yields a contiguous insert/remove block for
/// the toggled item's descendants.
#[derive(Clone, Debug)]
pub struct OutlineSnapshot<I> {
    roots: Vec<I>,
    nodes: IdMap<I, Node<I>>,
}

impl<I> Default for OutlineSnapshot<I> {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            nodes: IdMap::default(),
        }
    }
}

impl<I: Identifier> PartialEq for OutlineSnapshot<I> {
    fn eq(&self, other: &Self) -> bool {
        self.roots == other.roots && self.nodes == other.nodes
    }
}

impl<I: Identifier> OutlineSnapshot<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, item: &I) -> bool {
        self.nodes.contains_key(item)
    }

    pub fn root_items(&self) -> &[I] {
        &self.roots
    }

    pub fn parent(&self, item: &I) -> Option<&I> {
        self.nodes.get(item)?.parent.as_ref()
    }

    pub fn children(&self, item: &I) -> Option<&[I]> {
        self.nodes.get(item).map(|n| n.children.as_slice())
    }

    /// Depth of `item` in the forest; root items are at level 0.
    pub fn level(&self, item: &I) -> Option<usize> {
        let mut node = self.nodes.get(item)?;
        let mut level = 0;
        while let Some(parent) = &node.parent {
            level += 1;
            node = self.nodes.get(parent)?;
        }
        Some(level)
    }

    pub fn is_expanded(&self, item: &I) -> bool {
        self.nodes.get(item).is_some_and(|n| n.expanded)
    }

    /// Returns `true` when `item` exists and all of its ancestors are expanded.
    pub fn is_visible(&self, item: &I) -> bool {
        let Some(mut node) = self.nodes.get(item) else {
            return false;
        };
        while let Some(parent) = &node.parent {
            match self.nodes.get(parent) {
                Some(p) if p.expanded => node = p,
                _ => return false,
            }
        }
        true
    }

    /// Every item in pre-order, regardless of expansion state.
    pub fn items(&self) -> Vec<&I> {
        self.walk(false)
    }

    /// The items currently shown on screen, in pre-order.
    pub fn visible_items(&self) -> Vec<&I> {
        self.walk(true)
    }

    /// Builds a flat single-section snapshot from the visible items.
    pub fn to_snapshot<S: Identifier>(&self, section: S) -> Snapshot<S, I> {
        let mut snapshot = Snapshot::new();
        snapshot.append_section(section.clone());
        snapshot.append_items(self.visible_items().into_iter().cloned(), &section);
        snapshot
    }

    #[track_caller]
    pub fn append(&mut self, items: impl IntoIterator<Item = I>, parent: Option<&I>) {
        violated(self.try_append(items, parent))
    }

    pub fn try_append(
        &mut self,
        items: impl IntoIterator<Item = I>,
        parent: Option<&I>,
    ) -> Result<(), SnapshotError> {
        let at = match parent {
            Some(p) => self.require(p)?.children.len(),
            None => self.roots.len(),
        };
        self.attach(items.into_iter().collect(), parent.cloned(), at)
    }

    #[track_caller]
    pub fn insert_before(&mut self, items: impl IntoIterator<Item = I>, before: &I) {
        violated(self.try_insert_before(items, before))
    }

    pub fn try_insert_before(
        &mut self,
        items: impl IntoIterator<Item = I>,
        before: &I,
    ) -> Result<(), SnapshotError> {
        let (parent, at) = self.sibling_slot(before)?;
        self.attach(items.into_iter().collect(), parent, at)
    }

    #[track_caller]
    pub fn insert_after(&mut self, items: impl IntoIterator<Item = I>, after: &I) {
        violated(self.try_insert_after(items, after))
    }

    pub fn try_insert_after(
        &mut self,
        items: impl IntoIterator<Item = I>,
        after: &I,
    ) -> Result<(), SnapshotError> {
        let (parent, at) = self.sibling_slot(after)?;
        self.attach(items.into_iter().collect(), parent, at + 1)
    }

    /// Deletes items together with all of their descendants.
    #[track_caller]
    pub fn delete(&mut self, items: impl IntoIterator<Item = I>) {
        violated(self.try_delete(items))
    }

    pub fn try_delete(&mut self, items: impl IntoIterator<Item = I>) -> Result<(), SnapshotError> {
        let items: Vec<I> = items.into_iter().collect();
        if let Some(unknown) = items.iter().find(|i| !self.contains(i)) {
            return Err(SnapshotError::unknown_item(unknown));
        }
        for item in &items {
            // An earlier entry may already have taken this one down with its subtree.
            let Some(node) = self.nodes.get(item) else {
                continue;
            };
            match node.parent.clone() {
                Some(parent) => {
                    if let Some(p) = self.nodes.get_mut(&parent) {
                        p.children.retain(|c| c != item);
                    }
                }
                None => self.roots.retain(|r| r != item),
            }
            let mut stack = alloc::vec![item.clone()];
            while let Some(id) = stack.pop() {
                if let Some(node) = self.nodes.remove(&id) {
                    stack.extend(node.children);
                }
            }
        }
        Ok(())
    }

    #[track_caller]
    pub fn expand(&mut self, items: impl IntoIterator<Item = I>) {
        violated(self.try_set_expanded(items, true))
    }

    #[track_caller]
    pub fn collapse(&mut self, items: impl IntoIterator<Item = I>) {
        violated(self.try_set_expanded(items, false))
    }

    pub fn try_set_expanded(
        &mut self,
        items: impl IntoIterator<Item = I>,
        expanded: bool,
    ) -> Result<(), SnapshotError> {
        let items: Vec<I> = items.into_iter().collect();
        if let Some(unknown) = items.iter().find(|i| !self.contains(i)) {
            return Err(SnapshotError::unknown_item(unknown));
        }
        for item in &items {
            if let Some(node) = self.nodes.get_mut(item) {
                node.expanded = expanded;
            }
        }
        Ok(())
    }

    /// Flips the expanded flag of `item` and returns the new state.
    #[track_caller]
    pub fn toggle(&mut self, item: &I) -> bool {
        violated(self.try_toggle(item))
    }

    pub fn try_toggle(&mut self, item: &I) -> Result<bool, SnapshotError> {
        let node = self
            .nodes
            .get_mut(item)
            .ok_or_else(|| SnapshotError::unknown_item(item))?;
        node.expanded = !node.expanded;
        Ok(node.expanded)
    }

    /// Extracts the subtree below `parent` as a new outline.
    ///
    /// With `include_parent`, `parent` becomes the single root; otherwise its children become
    /// the roots. Expansion state is preserved.
    #[track_caller]
    pub fn snapshot_of(&self, parent: &I, include_parent: bool) -> Self {
        violated(self.try_snapshot_of(parent, include_parent))
    }

    pub fn try_snapshot_of(&self, parent: &I, include_parent: bool) -> Result<Self, SnapshotError> {
        let node = self.require(parent)?;
        let roots = if include_parent {
            alloc::vec![parent.clone()]
        } else {
            node.children.clone()
        };
        let mut out = Self {
            roots: roots.clone(),
            nodes: id_map(node.children.len() + 1),
        };
        let mut stack = roots;
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let mut copy = node.clone();
            if out.roots.contains(&id) {
                copy.parent = None;
            }
            stack.extend(copy.children.iter().cloned());
            out.nodes.insert(id, copy);
        }
        Ok(out)
    }

    fn require(&self, item: &I) -> Result<&Node<I>, SnapshotError> {
        self.nodes
            .get(item)
            .ok_or_else(|| SnapshotError::unknown_item(item))
    }

    fn sibling_slot(&self, item: &I) -> Result<(Option<I>, usize), SnapshotError> {
        let parent = self.require(item)?.parent.clone();
        let siblings = match &parent {
            Some(p) => &self.require(p)?.children,
            None => &self.roots,
        };
        let at = siblings.iter().position(|s| s == item).unwrap_or(siblings.len());
        Ok((parent, at))
    }

    fn attach(&mut self, items: Vec<I>, parent: Option<I>, at: usize) -> Result<(), SnapshotError> {
        let mut seen = id_map::<&I, ()>(items.len());
        for id in &items {
            if self.contains(id) || seen.insert(id, ()).is_some() {
                return Err(SnapshotError::duplicate_item(id));
            }
        }
        let siblings = match &parent {
            Some(p) => {
                &mut self
                    .nodes
                    .get_mut(p)
                    .ok_or_else(|| SnapshotError::unknown_item(p))?
                    .children
            }
            None => &mut self.roots,
        };
        let tail = siblings.split_off(at.min(siblings.len()));
        siblings.extend(items.iter().cloned());
        siblings.extend(tail);
        for id in items {
            self.nodes.insert(
                id,
                Node {
                    parent: parent.clone(),
                    children: Vec::new(),
                    expanded: false,
                },
            );
        }
        Ok(())
    }

    fn walk(&self, visible_only: bool) -> Vec<&I> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&I> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if visible_only && !node.expanded {
                continue;
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }
}
