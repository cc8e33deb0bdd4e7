//! Type registry - which piece types are common and which are special
//!
//! Built once from a mode roster. The roster index + 1 is the type id, so id 0 stays free
//! for [`EMPTY`](crate::types::EMPTY).

use crate::types::{Mode, PieceType, SpecialKind};

/// Role a registered type plays on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Randomly spawnable, takes part in ordinary matches
    Common,
    /// Never randomly spawned; bound to exactly one special handler
    Special(SpecialKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub piece_type: PieceType,
    pub name: &'static str,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    common: Vec<PieceType>,
    specials: Vec<(SpecialKind, PieceType)>,
}

impl TypeRegistry {
    /// Build the registry for a mode's roster
    pub fn for_mode(mode: Mode) -> Self {
        Self::from_roster(&mode.roster())
    }

    /// Build a registry from piece names. Names of known specials become special types
    /// (in roster order); everything else is common. Ids start at 1; names past id 255
    /// are ignored.
    pub fn from_roster(names: &[&'static str]) -> Self {
        let mut entries = Vec::with_capacity(names.len());
        let mut common = Vec::new();
        let mut specials = Vec::new();

        for (&name, piece_type) in names.iter().zip(1..=PieceType::MAX) {
            let role = match SpecialKind::from_name(name) {
                Some(kind) if !specials.iter().any(|&(k, _)| k == kind) => {
                    specials.push((kind, piece_type));
                    Role::Special(kind)
                }
                _ => {
                    common.push(piece_type);
                    Role::Common
                }
            };
            entries.push(TypeEntry {
                piece_type,
                name,
                role,
            });
        }

        Self {
            entries,
            common,
            specials,
        }
    }

    /// Types eligible for random spawn
    pub fn common_types(&self) -> &[PieceType] {
        &self.common
    }

    /// Special kinds with their type ids, in registration order
    pub fn specials(&self) -> &[(SpecialKind, PieceType)] {
        &self.specials
    }

    pub fn entry(&self, piece_type: PieceType) -> Option<&TypeEntry> {
        self.entries.iter().find(|e| e.piece_type == piece_type)
    }

    pub fn name(&self, piece_type: PieceType) -> Option<&'static str> {
        self.entry(piece_type).map(|e| e.name)
    }

    pub fn special_kind(&self, piece_type: PieceType) -> Option<SpecialKind> {
        match self.entry(piece_type)?.role {
            Role::Special(kind) => Some(kind),
            Role::Common => None,
        }
    }

    pub fn is_special(&self, piece_type: PieceType) -> bool {
        self.special_kind(piece_type).is_some()
    }

    pub fn is_common(&self, piece_type: PieceType) -> bool {
        self.common.contains(&piece_type)
    }

    /// Type id bound to a special kind, if the roster has it
    pub fn special_type(&self, kind: SpecialKind) -> Option<PieceType> {
        self.specials
            .iter()
            .find(|&&(k, _)| k == kind)
            .map(|&(_, ty)| ty)
    }
}
