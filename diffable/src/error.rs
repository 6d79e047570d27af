use alloc::string::String;

/// A snapshot contract violation.
///
/// The plain mutators on [`crate::Snapshot`] and [`crate::OutlineSnapshot`] panic with this
/// error at the offending call; the `try_*` forms return it instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("section identifier {0} is already in the snapshot")]
    DuplicateSection(String),
    #[error("item identifier {0} is already in the snapshot")]
    DuplicateItem(String),
    #[error("section identifier {0} does not exist in the snapshot")]
    UnknownSection(String),
    #[error("item identifier {0} does not exist in the snapshot")]
    UnknownItem(String),
    #[error("identifier {0} cannot be positioned relative to itself")]
    SelfReference(String),
}

impl SnapshotError {
    pub(crate) fn duplicate_section(id: &impl core::fmt::Debug) -> Self {
        Self::DuplicateSection(alloc::format!("{id:?}"))
    }

    pub(crate) fn duplicate_item(id: &impl core::fmt::Debug) -> Self {
        Self::DuplicateItem(alloc::format!("{id:?}"))
    }

    pub(crate) fn unknown_section(id: &impl core::fmt::Debug) -> Self {
        Self::UnknownSection(alloc::format!("{id:?}"))
    }

    pub(crate) fn unknown_item(id: &impl core::fmt::Debug) -> Self {
        Self::UnknownItem(alloc::format!("{id:?}"))
    }

    pub(crate) fn self_reference(id: &impl core::fmt::Debug) -> Self {
        Self::SelfReference(alloc::format!("{id:?}"))
    }
}

/// Panics with `err` at the caller of the mutator that produced it.
#[track_caller]
pub(crate) fn violated<T>(result: Result<T, SnapshotError>) -> T {
    match result {
        Ok(v) => v,
        Err(err) => {
            dwarn!(error = %err, "snapshot contract violation");
            panic!("{err}")
        }
    }
}
