use phf::{Set, phf_set};

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "CA", "C", "O",
};

// Terminal atoms written by relaxation tools that have no counterpart once modules are fused.
static ARTIFACT_ATOM_NAMES: Set<&'static str> = phf_set! {
    "1H", "2H", "3H", "OXT",
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_artifact_atom(atom_name: &str) -> bool {
    ARTIFACT_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_letter = atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_letter, Some('H') | Some('D'))
}
