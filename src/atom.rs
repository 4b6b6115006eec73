use std::fmt;

/// Tetrahedral chirality tag.
///
/// The tag is relative to the atom's ligand order (see
/// [`ligands`](crate::chirality::ligands)): looking from the first ligand,
/// the remaining ones run counterclockwise (`Ccw`, SMILES `@`) or clockwise
/// (`Cw`, SMILES `@@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    #[default]
    None,
    Ccw,
    Cw,
}

impl Chirality {
    pub fn is_set(self) -> bool {
        self != Chirality::None
    }

    pub fn inverted(self) -> Self {
        match self {
            Chirality::None => Chirality::None,
            Chirality::Ccw => Chirality::Cw,
            Chirality::Cw => Chirality::Ccw,
        }
    }

    /// Apply a permutation parity: an odd permutation of the ligands flips
    /// the tag.
    pub fn permuted(self, even: bool) -> Self {
        if even {
            self
        } else {
            self.inverted()
        }
    }
}

impl fmt::Display for Chirality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Chirality::None => "CHI_UNSPECIFIED",
            Chirality::Ccw => "CHI_TETRAHEDRAL_CCW",
            Chirality::Cw => "CHI_TETRAHEDRAL_CW",
        };
        f.write_str(s)
    }
}

/// A graph node: the properties read off a structural formula.
///
/// `hydrogen_count` holds the suppressed hydrogens only. Hydrogens that are
/// graph nodes (after [`add_hs`](crate::hydrogen::add_hs)) are counted by
/// [`Mol::total_hs`](crate::Mol::total_hs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Atom {
    pub atomic_num: u8,
    pub formal_charge: i8,
    /// Mass number; `0` for natural abundance.
    pub isotope: u16,
    pub hydrogen_count: u8,
    pub radical_electrons: u8,
    pub is_aromatic: bool,
    pub chirality: Chirality,
    /// The hydrogen count is fixed (bracket atoms, cleaved radicals) rather
    /// than inferred from the default valence.
    pub no_implicit: bool,
}

impl Atom {
    pub fn new(atomic_num: u8) -> Self {
        Self {
            atomic_num,
            ..Self::default()
        }
    }

    pub fn symbol(&self) -> &'static str {
        crate::element::symbol(self.atomic_num)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_num == crate::element::HYDROGEN
    }
}
