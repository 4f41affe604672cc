//! Physical constants in SI units.

/// Boltzmann constant in J/K
pub const KB: f64 = 1.380649e-23;
/// Avogadro constant in 1/mol
pub const NAV: f64 = 6.02214076e23;
/// Planck constant in J s
pub const PLANCK: f64 = 6.62607015e-34;
/// Ideal gas constant in J/(mol K)
pub const RGAS: f64 = 8.31446261815324;
/// Conversion factor from cubic Angstrom to cubic meter
pub const ANGSTROM3: f64 = 1e-30;
