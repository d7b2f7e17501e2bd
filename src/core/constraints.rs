use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Feasible-set type of one constraint group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Equality row, the multiplier is unbounded.
    Bilateral,
    /// Non-penetration row, the multiplier must stay non-negative.
    Unilateral,
    /// Normal row followed by two tangential rows bounded by a Coulomb cone.
    Friction { mu: f64 },
}

impl ConstraintKind {
    /// Number of contiguous components occupied by a group of this kind.
    pub fn size(&self) -> usize {
        match self {
            ConstraintKind::Bilateral | ConstraintKind::Unilateral => 1,
            ConstraintKind::Friction { .. } => 3,
        }
    }

    pub fn friction_coefficient(&self) -> Option<f64> {
        match self {
            ConstraintKind::Friction { mu } => Some(*mu),
            _ => None,
        }
    }
}

/// A constraint group anchored at `offset` in the multiplier vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintGroup {
    pub offset: usize,
    pub kind: ConstraintKind,
}

impl ConstraintGroup {
    pub fn new(offset: usize, kind: ConstraintKind) -> Self {
        Self { offset, kind }
    }

    pub fn bilateral(offset: usize) -> Self {
        Self::new(offset, ConstraintKind::Bilateral)
    }

    pub fn unilateral(offset: usize) -> Self {
        Self::new(offset, ConstraintKind::Unilateral)
    }

    pub fn friction(offset: usize, mu: f64) -> Self {
        Self::new(offset, ConstraintKind::Friction { mu })
    }

    pub fn size(&self) -> usize {
        self.kind.size()
    }

    /// Index range covered by this group.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size()
    }
}

/// Appends constraint groups back to back, tracking the running offset.
#[derive(Debug, Default, Clone)]
pub struct ConstraintLayout {
    groups: Vec<ConstraintGroup>,
    dimension: usize,
}

impl ConstraintLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a group and returns its offset.
    pub fn push(&mut self, kind: ConstraintKind) -> usize {
        let offset = self.dimension;
        self.groups.push(ConstraintGroup::new(offset, kind));
        self.dimension += kind.size();
        offset
    }

    pub fn push_bilateral(&mut self) -> usize {
        self.push(ConstraintKind::Bilateral)
    }

    pub fn push_unilateral(&mut self) -> usize {
        self.push(ConstraintKind::Unilateral)
    }

    pub fn push_friction(&mut self, mu: f64) -> usize {
        self.push(ConstraintKind::Friction { mu })
    }

    /// Total number of multiplier components.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn groups(&self) -> &[ConstraintGroup] {
        &self.groups
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.dimension = 0;
    }
}
