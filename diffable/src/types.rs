/// Location of an item: section index plus item index within that section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPath {
    pub section: usize,
    pub item: usize,
}

impl ItemPath {
    pub fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl core::fmt::Display for ItemPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}
