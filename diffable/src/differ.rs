use alloc::vec::Vec;

use crate::key::{Identifier, id_map};
use crate::lis::stable_mask;
use crate::{EditScript, ItemChange, ItemPath, SectionChange, Snapshot};

/// Computes the changes that turn `old` into `new`.
///
/// Items and sections are matched by identity. An identifier present in both snapshots whose
/// relative order changed is reported as a single move, never as a remove plus an insert. An
/// item that keeps its position but whose content changed (see [`Snapshot::reload_items`] and
/// [`Snapshot::set_content`]) is reported as a reload; a moved item is never also reloaded.
/// Only reload markers that are new in `new` count, so diffing a snapshot against a copy of
/// itself yields an empty script even when it carries markers.
///
/// The result depends only on the ordered contents of the two snapshots, so identical inputs
/// always yield identical scripts.
pub fn diff<S: Identifier, I: Identifier>(
    old: &Snapshot<S, I>,
    new: &Snapshot<S, I>,
) -> EditScript<S, I> {
    diff_by(old, new, |_| false)
}

/// Like [`diff`], with an extra content check.
///
/// `changed(id)` is asked about every item that keeps its position and returns `true` when the
/// item's displayed content differs between the two snapshots.
pub fn diff_by<S: Identifier, I: Identifier>(
    old: &Snapshot<S, I>,
    new: &Snapshot<S, I>,
    mut changed: impl FnMut(&I) -> bool,
) -> EditScript<S, I> {
    let sections = diff_sections(old, new);

    let old_sections = old.raw_sections();
    let mut old_paths = id_map::<&I, ItemPath>(old.number_of_items());
    for (si, section) in old_sections.iter().enumerate() {
        for (ii, id) in section.items.iter().enumerate() {
            old_paths.insert(id, ItemPath::new(si, ii));
        }
    }

    let mut removes = Vec::new();
    for (si, section) in old_sections.iter().enumerate().rev() {
        for (ii, id) in section.items.iter().enumerate().rev() {
            if !new.contains_item(id) {
                removes.push(ItemChange::Remove {
                    id: id.clone(),
                    at: ItemPath::new(si, ii),
                });
            }
        }
    }

    let mut placements = Vec::new();
    let mut reloads = Vec::new();
    let mut kept: Vec<usize> = Vec::new();
    for (si, section) in new.raw_sections().iter().enumerate() {
        let old_si = old.index_of_section(&section.id);

        kept.clear();
        kept.extend(section.items.iter().filter_map(|id| {
            old_paths
                .get(id)
                .filter(|from| Some(from.section) == old_si)
                .map(|from| from.item)
        }));
        let stable = stable_mask(&kept);
        let mut k = 0;

        for (ii, id) in section.items.iter().enumerate() {
            let to = ItemPath::new(si, ii);
            let Some(&from) = old_paths.get(id) else {
                placements.push(ItemChange::Insert { id: id.clone(), at: to });
                continue;
            };
            if Some(from.section) == old_si {
                let is_stable = stable[k];
                k += 1;
                if is_stable {
                    if content_changed(old, new, id) || changed(id) {
                        reloads.push(ItemChange::Reload { id: id.clone(), at: to });
                    }
                    continue;
                }
            }
            placements.push(ItemChange::Move {
                id: id.clone(),
                from,
                to,
            });
        }
        debug_assert_eq!(k, kept.len());
    }

    let mut items = removes;
    items.append(&mut placements);
    items.append(&mut reloads);

    dtrace!(
        old_items = old.number_of_items(),
        new_items = new.number_of_items(),
        section_changes = sections.len(),
        item_changes = items.len(),
        "diff"
    );
    EditScript::from_parts(sections, items)
}

fn diff_sections<S: Identifier, I: Identifier>(
    old: &Snapshot<S, I>,
    new: &Snapshot<S, I>,
) -> Vec<SectionChange<S>> {
    let mut out = Vec::new();
    for (at, section) in old.raw_sections().iter().enumerate().rev() {
        if !new.contains_section(&section.id) {
            out.push(SectionChange::Remove {
                id: section.id.clone(),
                at,
            });
        }
    }

    let kept: Vec<usize> = new
        .section_identifiers()
        .filter_map(|id| old.index_of_section(id))
        .collect();
    let stable = stable_mask(&kept);
    let mut k = 0;
    for (to, id) in new.section_identifiers().enumerate() {
        match old.index_of_section(id) {
            None => out.push(SectionChange::Insert { id: id.clone(), at: to }),
            Some(from) => {
                if !stable[k] {
                    out.push(SectionChange::Move {
                        id: id.clone(),
                        from,
                        to,
                    });
                }
                k += 1;
            }
        }
    }
    out
}

fn content_changed<S: Identifier, I: Identifier>(
    old: &Snapshot<S, I>,
    new: &Snapshot<S, I>,
    id: &I,
) -> bool {
    // A marker carried over from `old` was already consumed by the apply that produced it.
    if new.is_reloaded(id) && !old.is_reloaded(id) {
        return true;
    }
    matches!(
        (old.content_of(id), new.content_of(id)),
        (Some(before), Some(after)) if before != after
    )
}
