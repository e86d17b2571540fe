//! Field identifiers and their output attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A per-cell field exposed by a solver state.
///
/// Every field is a flat `f64` array of `Nx * Ny * Nz` values in the
/// grid's canonical ordering (x fastest, then y, then z).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Zonal velocity `u` (m/s).
    VelocityU,
    /// Meridional velocity `v` (m/s).
    VelocityV,
    /// Vertical velocity `w` (m/s).
    VelocityW,
    /// Potential temperature `T` (°C).
    Temperature,
    /// Practical salinity `S` (psu).
    Salinity,
    /// Passive tracer marking the meltwater fraction, in `[0, 1]`.
    Meltwater,
    /// Turbulent eddy viscosity `ν` (m²/s).
    Viscosity,
    /// Turbulent tracer diffusivity `κ` (m²/s).
    Diffusivity,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Field; 8] = [
        Field::VelocityU,
        Field::VelocityV,
        Field::VelocityW,
        Field::Temperature,
        Field::Salinity,
        Field::Meltwater,
        Field::Viscosity,
        Field::Diffusivity,
    ];

    /// Short array name used in output payloads.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::VelocityU => "u",
            Self::VelocityV => "v",
            Self::VelocityW => "w",
            Self::Temperature => "T",
            Self::Salinity => "S",
            Self::Meltwater => "meltwater",
            Self::Viscosity => "nu",
            Self::Diffusivity => "kappa",
        }
    }

    /// Output attributes (long name and units) for this field.
    pub fn attributes(self) -> Attributes {
        let (long_name, units) = match self {
            Self::VelocityU => ("zonal velocity", "m/s"),
            Self::VelocityV => ("meridional velocity", "m/s"),
            Self::VelocityW => ("vertical velocity", "m/s"),
            Self::Temperature => ("potential temperature", "degC"),
            Self::Salinity => ("practical salinity", "psu"),
            Self::Meltwater => ("meltwater fraction", "1"),
            Self::Viscosity => ("turbulent viscosity", "m2/s"),
            Self::Diffusivity => ("turbulent diffusivity", "m2/s"),
        };
        Attributes::new(long_name, units)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Active tracers that receive relaxation forcing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracer {
    /// Temperature `T`.
    Temperature,
    /// Salinity `S`.
    Salinity,
}

impl Tracer {
    /// Both forced tracers.
    pub const ALL: [Tracer; 2] = [Tracer::Temperature, Tracer::Salinity];

    /// The solver field holding this tracer.
    pub fn field(self) -> Field {
        match self {
            Self::Temperature => Field::Temperature,
            Self::Salinity => Field::Salinity,
        }
    }
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.field().fmt(f)
    }
}

/// Velocity component selector for solver extrema queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VelocityComponent {
    /// `u`, along x.
    U,
    /// `v`, along y.
    V,
    /// `w`, along z.
    W,
}

impl VelocityComponent {
    /// All three components in `(u, v, w)` order.
    pub const ALL: [VelocityComponent; 3] = [Self::U, Self::V, Self::W];

    /// The solver field holding this component.
    pub fn field(self) -> Field {
        match self {
            Self::U => Field::VelocityU,
            Self::V => Field::VelocityV,
            Self::W => Field::VelocityW,
        }
    }
}

/// Closure-model diffusivity selector for solver extrema queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffusivityComponent {
    /// Momentum viscosity `ν`.
    Viscosity,
    /// Tracer diffusivity `κ`.
    Diffusivity,
}

impl DiffusivityComponent {
    /// The solver field holding this component.
    pub fn field(self) -> Field {
        match self {
            Self::Viscosity => Field::Viscosity,
            Self::Diffusivity => Field::Diffusivity,
        }
    }
}

/// Metadata attached to every persisted array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Human-readable description, e.g. `"potential temperature"`.
    pub long_name: String,
    /// Physical units, e.g. `"degC"`.
    pub units: String,
}

impl Attributes {
    /// Construct attributes from borrowed strings.
    pub fn new(long_name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            long_name: long_name.into(),
            units: units.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_unique() {
        let mut names: Vec<_> = Field::ALL.iter().map(|f| f.short_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Field::ALL.len());
    }

    #[test]
    fn tracer_maps_to_field() {
        assert_eq!(Tracer::Temperature.field(), Field::Temperature);
        assert_eq!(Tracer::Salinity.field(), Field::Salinity);
    }

    #[test]
    fn velocity_components_map_in_order() {
        let fields: Vec<_> = VelocityComponent::ALL.iter().map(|c| c.field()).collect();
        assert_eq!(
            fields,
            vec![Field::VelocityU, Field::VelocityV, Field::VelocityW]
        );
    }

    #[test]
    fn field_serde_uses_snake_case() {
        let json = serde_json::to_string(&Field::VelocityU).unwrap();
        assert_eq!(json, "\"velocity_u\"");
        let back: Field = serde_json::from_str("\"meltwater\"").unwrap();
        assert_eq!(back, Field::Meltwater);
    }

    #[test]
    fn attributes_carry_units() {
        let a = Field::Viscosity.attributes();
        assert_eq!(a.units, "m2/s");
        assert_eq!(a.long_name, "turbulent viscosity");
    }
}
