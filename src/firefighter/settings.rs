use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{Display, EnumString, EnumVariantNames};

/// How defense behaves once a vertex is protected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
         Display, EnumString, EnumVariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DefenceModel {
    /// Only the vertices chosen by an action become defended
    #[default]
    Standard,
    /// Defense additionally spreads to every neighbour that is not burning,
    /// the same way fire does
    Infectious,
}

/// When a defense action takes effect relative to the fire spreading in the same time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
         Display, EnumString, EnumVariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DefenseTiming {
    /// The firefighter moves first, a vertex defended at `t` cannot catch fire at `t`
    #[default]
    Immediate,
    /// Fire spreading into `t` only sees the defenses placed up to `t - 1`
    Delayed,
}

/// Settings shaping the generated formulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulationSettings {
    /// Maximum number of defense actions per time step
    pub budget: usize,
    pub defence: DefenceModel,
    pub timing: DefenseTiming,
}

impl Default for FormulationSettings {
    fn default() -> Self {
        Self {
            budget: 1,
            defence: DefenceModel::default(),
            timing: DefenseTiming::default(),
        }
    }
}

impl FormulationSettings {
    /// Returns a list of available defence models
    pub fn available_defence_models() -> Vec<String> {
        DefenceModel::VARIANTS.iter()
            .map(<&str>::to_string)
            .collect::<Vec<_>>()
    }

    /// Returns a list of available defense timings
    pub fn available_timings() -> Vec<String> {
        DefenseTiming::VARIANTS.iter()
            .map(<&str>::to_string)
            .collect::<Vec<_>>()
    }
}
