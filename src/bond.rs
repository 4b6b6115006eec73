use std::fmt;

use petgraph::graph::NodeIndex;

/// Kekulé bond order. Aromaticity is a separate flag on [`Bond`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondOrder {
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

/// Double-bond configuration.
///
/// The two reference atoms are substituents of the bond's begin and end
/// atoms respectively (begin/end as stored in the graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Cis(NodeIndex, NodeIndex),
    Trans(NodeIndex, NodeIndex),
}

impl BondStereo {
    pub fn is_set(self) -> bool {
        self != BondStereo::None
    }

    pub fn refs(self) -> Option<(NodeIndex, NodeIndex)> {
        match self {
            BondStereo::None => None,
            BondStereo::Cis(a, b) | BondStereo::Trans(a, b) => Some((a, b)),
        }
    }

    pub fn is_cis(self) -> bool {
        matches!(self, BondStereo::Cis(..))
    }

    /// Same configuration expressed with different reference atoms;
    /// `flip` is true when exactly one reference moved to the other
    /// substituent on its end.
    pub fn with_refs(self, a: NodeIndex, b: NodeIndex, flip: bool) -> Self {
        match (self, flip) {
            (BondStereo::None, _) => BondStereo::None,
            (BondStereo::Cis(..), false) | (BondStereo::Trans(..), true) => BondStereo::Cis(a, b),
            (BondStereo::Trans(..), false) | (BondStereo::Cis(..), true) => {
                BondStereo::Trans(a, b)
            }
        }
    }
}

impl fmt::Display for BondStereo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BondStereo::None => "STEREONONE",
            BondStereo::Cis(..) => "STEREOCIS",
            BondStereo::Trans(..) => "STEREOTRANS",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bond {
    pub order: BondOrder,
    pub is_aromatic: bool,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn single() -> Self {
        Self::new(BondOrder::Single)
    }

    /// Bond type name, aromatic bonds reported as such regardless of their
    /// Kekulé order.
    pub fn type_name(&self) -> &'static str {
        if self.is_aromatic {
            return "AROMATIC";
        }
        match self.order {
            BondOrder::Single => "SINGLE",
            BondOrder::Double => "DOUBLE",
            BondOrder::Triple => "TRIPLE",
        }
    }
}
