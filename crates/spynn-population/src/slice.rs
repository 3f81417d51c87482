//! Slices, core locations and partitioning helpers.
//!
//! Placement itself happens upstream; these types only carry its results.
//! The partitioning helpers exist so callers can make the atoms-per-core
//! rounding decision explicit instead of relying on integer division.

use crate::error::{PopulationError, Result};

/// Contiguous range `[lo_atom, hi_atom]` of a population mapped to one core
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexSlice {
    lo_atom: usize,
    hi_atom: usize,
}

impl VertexSlice {
    /// Create a slice covering `lo_atom..=hi_atom`
    ///
    /// # Errors
    ///
    /// Returns `InvalidSlice` when `hi_atom < lo_atom`.
    pub fn new(lo_atom: usize, hi_atom: usize) -> Result<Self> {
        if hi_atom < lo_atom {
            return Err(PopulationError::InvalidSlice {
                slice: Self { lo_atom, hi_atom },
                reason: "hi_atom is below lo_atom".into(),
            });
        }
        Ok(Self { lo_atom, hi_atom })
    }

    /// First atom
    pub const fn lo_atom(&self) -> usize {
        self.lo_atom
    }

    /// Last atom (inclusive)
    pub const fn hi_atom(&self) -> usize {
        self.hi_atom
    }

    /// Number of atoms in the slice
    pub const fn n_atoms(&self) -> usize {
        self.hi_atom - self.lo_atom + 1
    }

    /// Atom indices in the slice
    pub fn atoms(&self) -> std::ops::RangeInclusive<usize> {
        self.lo_atom..=self.hi_atom
    }

    /// True if `atom` lies in the slice
    pub const fn contains(&self, atom: usize) -> bool {
        atom >= self.lo_atom && atom <= self.hi_atom
    }
}

impl std::fmt::Display for VertexSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}]", self.lo_atom, self.hi_atom)
    }
}

/// Chip coordinates and processor of one core
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreLocation {
    /// Chip x
    pub x: u32,
    /// Chip y
    pub y: u32,
    /// Processor on the chip
    pub p: u32,
}

impl CoreLocation {
    /// Create a location
    pub const fn new(x: u32, y: u32, p: u32) -> Self {
        Self { x, y, p }
    }
}

impl std::fmt::Display for CoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.p)
    }
}

/// A slice placed on a core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Atoms handled by the core
    pub slice: VertexSlice,
    /// Where the core is
    pub location: CoreLocation,
}

impl Placement {
    /// Create a placement
    pub const fn new(slice: VertexSlice, location: CoreLocation) -> Self {
        Self { slice, location }
    }
}

/// How to divide a population by a number of cores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtomsPerCorePolicy {
    /// Round down, leaving a remainder for an extra core
    #[default]
    Floor,
    /// Fail unless the divisor divides the population exactly
    RequireExact,
}

/// Atoms per core when splitting `n_atoms` into `divisor` parts
///
/// # Errors
///
/// Returns `InvalidAtomsPerCore` for a zero divisor, a divisor larger than
/// the population, or a non-divisor under [`AtomsPerCorePolicy::RequireExact`].
pub fn atoms_per_core(n_atoms: usize, divisor: usize, policy: AtomsPerCorePolicy) -> Result<usize> {
    let invalid = || PopulationError::InvalidAtomsPerCore { n_atoms, divisor };
    if divisor == 0 || divisor > n_atoms {
        return Err(invalid());
    }
    match policy {
        AtomsPerCorePolicy::Floor => Ok(n_atoms / divisor),
        AtomsPerCorePolicy::RequireExact if n_atoms % divisor == 0 => Ok(n_atoms / divisor),
        AtomsPerCorePolicy::RequireExact => Err(invalid()),
    }
}

/// Split `n_atoms` into consecutive slices of at most `max_atoms_per_core`
///
/// # Errors
///
/// Returns `InvalidAtomsPerCore` when `max_atoms_per_core` is zero.
pub fn split_population(n_atoms: usize, max_atoms_per_core: usize) -> Result<Vec<VertexSlice>> {
    if max_atoms_per_core == 0 {
        return Err(PopulationError::InvalidAtomsPerCore {
            n_atoms,
            divisor: 0,
        });
    }
    (0..n_atoms)
        .step_by(max_atoms_per_core)
        .map(|lo| VertexSlice::new(lo, (lo + max_atoms_per_core).min(n_atoms) - 1))
        .collect()
}
