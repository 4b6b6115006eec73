//! Periodic-table lookups used by the SMILES reader and the featurizers.

static SYMBOLS: [&str; 119] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

static OUTER_ELECTRONS: [u8; 119] = [
    0, //
    1, 2, //
    1, 2, 3, 4, 5, 6, 7, 8, //
    1, 2, 3, 4, 5, 6, 7, 8, //
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8, //
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8, //
    1, 2, //
    3, 4, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, //
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8, //
    1, 2, //
    3, 4, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, //
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 3, 4, 5, 6, 7, 8,
];

pub const HYDROGEN: u8 = 1;
pub const CARBON: u8 = 6;

/// Element symbol for an atomic number; `"*"` for 0 or anything out of range.
pub fn symbol(atomic_num: u8) -> &'static str {
    SYMBOLS.get(atomic_num as usize).copied().unwrap_or("*")
}

/// Case-sensitive symbol lookup (`"Cl"`, not `"CL"`).
pub fn from_symbol(s: &str) -> Option<u8> {
    SYMBOLS
        .iter()
        .skip(1)
        .position(|&sym| sym == s)
        .map(|i| (i + 1) as u8)
}

pub fn outer_shell_electrons(atomic_num: u8) -> u8 {
    OUTER_ELECTRONS
        .get(atomic_num as usize)
        .copied()
        .unwrap_or(0)
}

/// Allowed valences for implicit-hydrogen inference, lowest first.
/// Empty for elements outside the SMILES organic subset.
pub fn default_valences(atomic_num: u8) -> &'static [u8] {
    match atomic_num {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        9 | 17 | 35 | 85 => &[1],
        14 | 32 => &[4],
        15 | 33 => &[3, 5],
        16 | 34 | 52 => &[2, 4, 6],
        53 => &[1, 3, 5, 7],
        _ => &[],
    }
}

/// Atoms that may be written without brackets.
pub fn is_organic_subset(atomic_num: u8) -> bool {
    matches!(atomic_num, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
}

/// Elements accepted in lowercase (aromatic) form.
pub fn aromatic_symbol_allowed(atomic_num: u8) -> bool {
    matches!(atomic_num, 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52)
}

/// Valence an atom of this element reaches with the given charge, picking the
/// smallest default valence that is at least `used`. `None` when the element
/// has no default valence.
pub fn target_valence(atomic_num: u8, formal_charge: i8, used: u8) -> Option<u8> {
    // isoelectronic shift: N+ behaves like C, O+ like N, C- like N, B- like C
    let shifted = match (atomic_num, formal_charge) {
        (_, 0) => atomic_num,
        (n, c) => {
            let s = n as i16 - c as i16;
            if !(1..=118).contains(&s) {
                return None;
            }
            s as u8
        }
    };
    let valences = default_valences(shifted);
    if valences.is_empty() {
        return None;
    }
    let valences = if matches!(shifted, 6 | 7 | 8) && formal_charge != 0 {
        &valences[..1]
    } else {
        valences
    };
    valences
        .iter()
        .copied()
        .find(|&v| v >= used)
        .or_else(|| valences.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip() {
        for n in 1..=118u8 {
            assert_eq!(from_symbol(symbol(n)), Some(n), "{}", symbol(n));
        }
    }

    #[test]
    fn from_symbol_case_sensitive() {
        assert_eq!(from_symbol("Cl"), Some(17));
        assert_eq!(from_symbol("CL"), None);
        assert_eq!(from_symbol("cl"), None);
        assert_eq!(from_symbol("*"), None);
    }

    #[test]
    fn out_of_range_symbol() {
        assert_eq!(symbol(0), "*");
        assert_eq!(symbol(200), "*");
    }

    #[test]
    fn default_valences_smiles() {
        assert_eq!(default_valences(6), &[4]);
        assert_eq!(default_valences(7), &[3, 5]);
        assert_eq!(default_valences(16), &[2, 4, 6]);
        assert!(default_valences(26).is_empty());
    }

    #[test]
    fn charged_targets() {
        assert_eq!(target_valence(7, 1, 4), Some(4));
        assert_eq!(target_valence(8, -1, 1), Some(1));
        assert_eq!(target_valence(8, 1, 2), Some(3));
        assert_eq!(target_valence(6, 0, 2), Some(4));
        assert_eq!(target_valence(16, 0, 3), Some(4));
        assert_eq!(target_valence(26, 0, 0), None);
    }

    #[test]
    fn organic_subset() {
        assert!(is_organic_subset(6));
        assert!(is_organic_subset(53));
        assert!(!is_organic_subset(1));
        assert!(!is_organic_subset(14));
    }
}
