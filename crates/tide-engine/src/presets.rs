//! Built-in scenario configurations.
//!
//! Each preset is a complete, valid [`SimulationConfig`] built in code.
//! Outputs default to [`SinkConfig::Null`]; callers redirect them to disk
//! by replacing the sink.

use std::fmt;
use std::str::FromStr;

use tide_core::{ConfigError, Field};
use tide_forcing::{
    MaintenanceStrategy, OverlapPolicy, ReferenceProfile, RelaxationRegion, SpongeLayer,
    TracerTargets,
};
use tide_grid::{Axis, CellIndex, Region, Side};
use tide_obs::OutputEntry;

use crate::clock::SECONDS_PER_DAY;
use crate::config::{
    ControllerConfig, ForcingConfig, GridConfig, InitialConditions, OutputConfig,
    SimulationConfig, SinkConfig,
};

/// Meltwater relaxation rate shared by every preset source (1/60 s⁻¹).
const SOURCE_RATE: f64 = 1.0 / 60.0;

/// Freezing-point fresh meltwater.
const MELTWATER: TracerTargets = TracerTargets {
    temperature: -1.0,
    salinity: 0.0,
};

/// A named scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Point meltwater source in a 3-D box.
    PointSource,
    /// Line inlet across a 2-D (`Nx = 1`) channel.
    LineInlet,
    /// 2-D box model with a source block and an outflow sponge.
    BoxModel,
}

impl Preset {
    /// Every preset.
    pub const ALL: [Preset; 3] = [Preset::PointSource, Preset::LineInlet, Preset::BoxModel];

    /// Kebab-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::PointSource => "point-source",
            Self::LineInlet => "line-inlet",
            Self::BoxModel => "box-model",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Self::PointSource => "point meltwater source in a 32^3 box",
            Self::LineInlet => "line inlet across a 1x128x64 channel with an outflow sponge",
            Self::BoxModel => "1x256x64 box model, source block and linear-profile sponge",
        }
    }

    /// The configuration for this preset.
    pub fn config(self) -> SimulationConfig {
        match self {
            Self::PointSource => point_source(),
            Self::LineInlet => line_inlet(),
            Self::BoxModel => box_model(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "point-source" | "point" => Ok(Self::PointSource),
            "line-inlet" | "line" => Ok(Self::LineInlet),
            "box-model" | "box" => Ok(Self::BoxModel),
            _ => Err(ConfigError::InvalidParameter {
                name: "preset",
                reason: format!(
                    "unknown preset '{s}', expected one of: point-source, line-inlet, box-model"
                ),
            }),
        }
    }
}

fn controller(max_dt: f64) -> ControllerConfig {
    ControllerConfig {
        initial_dt: 1.0,
        cfl_target: 0.5,
        max_change: 1.1,
        max_dt,
        diffusive_cfl_target: None,
    }
}

/// 32³ box, 4 m cells, one source cell near the bottom centre.
pub fn point_source() -> SimulationConfig {
    SimulationConfig {
        name: Preset::PointSource.name().to_string(),
        grid: GridConfig {
            size: [32, 32, 32],
            extent: [128.0, 128.0, 128.0],
        },
        end_time: SECONDS_PER_DAY / 4.0,
        inner_steps: 10,
        controller: controller(30.0),
        forcing: ForcingConfig {
            regions: vec![RelaxationRegion::new(
                Region::Point {
                    cell: CellIndex::new(16, 1, 16),
                },
                MELTWATER,
                SOURCE_RATE,
            )],
            sponge: None,
            overlap: OverlapPolicy::Additive,
            maintenance: MaintenanceStrategy::PinOnly,
        },
        initial: InitialConditions {
            velocity: [0.02, 0.0, 0.0],
            ..InitialConditions::default()
        },
        outputs: vec![
            OutputConfig {
                name: "fields".to_string(),
                interval: 3600.0,
                entries: vec![
                    OutputEntry::full(Field::Temperature),
                    OutputEntry::full(Field::Salinity),
                    OutputEntry::full(Field::Meltwater),
                ],
                sink: SinkConfig::Null,
            },
            OutputConfig {
                name: "slices".to_string(),
                interval: 600.0,
                entries: vec![
                    OutputEntry::slice(Field::Temperature, Axis::Y, 16),
                    OutputEntry::slice(Field::Meltwater, Axis::Y, 16),
                    OutputEntry::maximum(Field::Viscosity),
                ],
                sink: SinkConfig::Null,
            },
        ],
    }
}

/// 1×128×64 channel with an inlet along `(j, k) = (0, 2)` and an outflow
/// sponge over the last 8 rows.
pub fn line_inlet() -> SimulationConfig {
    let nz = 64;
    SimulationConfig {
        name: Preset::LineInlet.name().to_string(),
        grid: GridConfig {
            size: [1, 128, nz],
            extent: [20.0, 2560.0, 640.0],
        },
        end_time: SECONDS_PER_DAY / 2.0,
        inner_steps: 10,
        controller: controller(60.0),
        forcing: ForcingConfig {
            regions: vec![RelaxationRegion::new(
                Region::Line { j: 0, k: 2 },
                MELTWATER,
                SOURCE_RATE,
            )],
            sponge: Some(SpongeLayer::new(
                Axis::Y,
                8,
                Side::High,
                1.0 / 3600.0,
                ReferenceProfile::uniform(nz, 0.0, 34.5),
            )),
            overlap: OverlapPolicy::Additive,
            maintenance: MaintenanceStrategy::PinAndZeroSponge,
        },
        initial: InitialConditions {
            velocity: [0.0, 0.05, 0.0],
            ..InitialConditions::default()
        },
        outputs: vec![OutputConfig {
            name: "section".to_string(),
            interval: 1800.0,
            entries: vec![
                OutputEntry::slice(Field::Temperature, Axis::X, 0),
                OutputEntry::slice(Field::Salinity, Axis::X, 0),
                OutputEntry::slice(Field::Meltwater, Axis::X, 0),
            ],
            sink: SinkConfig::Null,
        }],
    }
}

/// 1×256×64 box model: a source block in the bottom-left corner and a
/// 16-row sponge relaxing to a linear stratification at the far end.
pub fn box_model() -> SimulationConfig {
    let nz = 64;
    SimulationConfig {
        name: Preset::BoxModel.name().to_string(),
        grid: GridConfig {
            size: [1, 256, nz],
            extent: [20.0, 5120.0, 640.0],
        },
        end_time: SECONDS_PER_DAY,
        inner_steps: 10,
        controller: controller(60.0),
        forcing: ForcingConfig {
            regions: vec![RelaxationRegion::new(
                Region::Box {
                    lo: CellIndex::new(0, 0, 0),
                    hi: CellIndex::new(0, 49, 9),
                },
                MELTWATER,
                SOURCE_RATE,
            )],
            sponge: Some(SpongeLayer::new(
                Axis::Y,
                16,
                Side::High,
                1.0 / 600.0,
                ReferenceProfile::linear(nz, (1.0, 34.7), (-1.5, 33.8)),
            )),
            overlap: OverlapPolicy::SpongeOverrides,
            maintenance: MaintenanceStrategy::PinZeroSpongeThenNormalize,
        },
        initial: InitialConditions {
            velocity: [0.0, 0.02, 0.0],
            ..InitialConditions::default()
        },
        outputs: vec![
            OutputConfig {
                name: "section".to_string(),
                interval: 3600.0,
                entries: vec![
                    OutputEntry::full(Field::Temperature),
                    OutputEntry::full(Field::Salinity),
                    OutputEntry::full(Field::Meltwater),
                ],
                sink: SinkConfig::Null,
            },
            OutputConfig {
                name: "closure".to_string(),
                interval: 900.0,
                entries: vec![
                    OutputEntry::maximum(Field::Viscosity),
                    OutputEntry::maximum(Field::Diffusivity),
                ],
                sink: SinkConfig::Null,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_core::Tracer;

    #[test]
    fn every_preset_validates() {
        for preset in Preset::ALL {
            preset
                .config()
                .validate()
                .unwrap_or_else(|e| panic!("{preset}: {e}"));
        }
    }

    #[test]
    fn names_parse_back() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("BOX_MODEL".parse::<Preset>().unwrap(), Preset::BoxModel);
        assert!("tsunami".parse::<Preset>().is_err());
    }

    #[test]
    fn point_source_forcing_at_source_cell() {
        let setup = point_source().build().unwrap();
        let f = setup
            .forcing
            .evaluate(Tracer::Temperature, CellIndex::new(16, 1, 16), 0.0);
        assert!((f - (-1.0 / 60.0)).abs() < 1e-15);
        assert_eq!(
            setup
                .forcing
                .evaluate(Tracer::Temperature, CellIndex::new(0, 0, 0), 0.0),
            0.0
        );
    }

    #[test]
    fn box_model_source_block_and_sponge() {
        let setup = box_model().build().unwrap();
        let forced = setup
            .forcing
            .evaluate(Tracer::Temperature, CellIndex::new(0, 24, 4), 0.0);
        assert!(forced < 0.0);
        assert_eq!(
            setup
                .forcing
                .evaluate(Tracer::Temperature, CellIndex::new(0, 59, 4), 0.0),
            0.0
        );
        let sponge = setup.forcing.sponge_region().unwrap();
        assert!(sponge.matches(CellIndex::new(0, 240, 0)));
        assert!(!sponge.matches(CellIndex::new(0, 239, 0)));
    }

    #[test]
    fn presets_round_trip_through_json() {
        for preset in Preset::ALL {
            let cfg = preset.config();
            let back = SimulationConfig::from_json(&cfg.to_json().unwrap()).unwrap();
            assert_eq!(back, cfg);
        }
    }
}
