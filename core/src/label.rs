/// A branch target label within a translation block.
///
/// Labels support forward references: a branch may name a label before
/// it is placed, and the backend resolves the position when it lowers
/// the `set_label` op. At the IR level only placement is tracked.
#[derive(Debug, Clone)]
pub struct Label {
    pub id: u32,
    /// Whether this label has been placed (set_label emitted).
    pub present: bool,
    /// Number of branches referencing this label.
    pub refs: u32,
}

impl Label {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            present: false,
            refs: 0,
        }
    }
}
