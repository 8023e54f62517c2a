use slotmap::new_key_type;

new_key_type! {
    /// Key of an atom stored in a [`Structure`](super::structure::Structure).
    pub struct AtomId;
    /// Key of a residue stored in a [`Structure`](super::structure::Structure).
    pub struct ResidueId;
    /// Key of a chain stored in a [`Structure`](super::structure::Structure).
    pub struct ChainId;
}
