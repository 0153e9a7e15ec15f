// qs-core/src/units.rs
//
// The engines work in natural units (ħ = c = k_B = 1) with lengths in fm,
// so masses, energies and temperatures are all expressed in fm⁻¹.

use uom::si::f64::{Energy as UomEnergy, Mass as UomMass, ThermodynamicTemperature};

use crate::Real;

pub type Energy = UomEnergy;
pub type Mass = UomMass;
pub type Temperature = ThermodynamicTemperature;

/// ħc in MeV·fm
pub const HC_MEV_FM: Real = 197.326_980_4;

/// Speed of light in m/s
pub const C_MPS: Real = 299_792_458.0;

/// One MeV in joules
pub const MEV_J: Real = 1.602_176_634e-13;

/// Boltzmann constant in MeV/K
pub const KB_MEV_PER_K: Real = 8.617_333_262e-11;

#[inline]
pub fn mev(v: f64) -> Energy {
    use uom::si::energy::megaelectronvolt;
    Energy::new::<megaelectronvolt>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kelvin(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

/// Energy → fm⁻¹
#[inline]
pub fn energy_to_inv_fm(e: Energy) -> Real {
    use uom::si::energy::megaelectronvolt;
    e.get::<megaelectronvolt>() / HC_MEV_FM
}

/// fm⁻¹ → energy
#[inline]
pub fn inv_fm_to_energy(x: Real) -> Energy {
    mev(x * HC_MEV_FM)
}

/// Rest mass → rest energy in fm⁻¹
#[inline]
pub fn mass_to_inv_fm(m: Mass) -> Real {
    use uom::si::mass::kilogram;
    m.get::<kilogram>() * C_MPS * C_MPS / MEV_J / HC_MEV_FM
}

/// Temperature → k_B·T in fm⁻¹
#[inline]
pub fn temperature_to_inv_fm(t: Temperature) -> Real {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>() * KB_MEV_PER_K / HC_MEV_FM
}

pub mod constants {
    use super::*;

    pub const ELECTRON_MASS_KG: f64 = 9.109_383_701_5e-31;
    pub const ELECTRON_MASS_MEV: f64 = 0.510_998_950;
    pub const PION_MASS_MEV: f64 = 139.570_39;

    #[inline]
    pub fn electron_mass() -> Mass {
        kg(ELECTRON_MASS_KG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn electron_mass_in_inverse_fermi() {
        let m = mass_to_inv_fm(constants::electron_mass());
        let expected = constants::ELECTRON_MASS_MEV / HC_MEV_FM;
        assert!((m / expected - 1.0).abs() < 1e-8, "m = {m}");
    }

    #[test]
    fn energy_round_trip() {
        let x = energy_to_inv_fm(mev(10.0));
        assert!((x - 10.0 / HC_MEV_FM).abs() < 1e-15);
        let back = inv_fm_to_energy(x);
        assert!((energy_to_inv_fm(back) - x).abs() < 1e-15);
    }

    #[test]
    fn room_temperature_is_tiny() {
        // k_B·300 K ≈ 25.85 meV
        let t = temperature_to_inv_fm(kelvin(300.0));
        assert!((t * HC_MEV_FM - 2.585e-8).abs() < 1e-10);
    }
}
