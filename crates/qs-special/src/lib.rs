//! Special functions for quantum statistics.
//!
//! - [`occupation`]: Fermi–Dirac and Bose–Einstein occupation numbers with
//!   overflow guards
//! - [`fermi_dirac`]: complete Fermi–Dirac integrals
//! - [`bessel`]: exponentially scaled modified Bessel functions `K_ν`

pub mod bessel;
pub mod fermi_dirac;
pub mod occupation;

pub use bessel::bessel_k_scaled;
pub use fermi_dirac::{fermi_dirac, fermi_dirac_3half, fermi_dirac_half};
pub use occupation::{DEFAULT_LIMIT, bose_function, fermi_function};
