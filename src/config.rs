use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of the virtual CPU.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HardwareConfig {
    /// Probability that one `h-copy` writes a random instruction.
    pub copy_mut_prob: f64,
    /// Probability of one point substitution in the offspring per divide.
    pub divide_mut_prob: f64,
    /// Probability of one random insertion in the offspring per divide.
    pub divide_ins_prob: f64,
    /// Probability of one random deletion in the offspring per divide.
    pub divide_del_prob: f64,
    /// Maximal ratio between offspring and parent sizes, either way. Also
    /// bounds how much `h-alloc` may add.
    pub child_size_range: f64,
    /// Fraction of the offspring that must have been copied before divide.
    pub min_copied_lines: f64,
    /// Fraction of the parent that must have been executed before divide.
    pub min_exe_lines: f64,
    /// Longest template read after `h-search` / `if-label`.
    pub max_label_size: usize,
    pub min_genome_size: usize,
    pub max_genome_size: usize,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            copy_mut_prob: 0.0075,
            divide_mut_prob: 0.0,
            divide_ins_prob: 0.05,
            divide_del_prob: 0.05,
            child_size_range: 2.0,
            min_copied_lines: 0.5,
            min_exe_lines: 0.5,
            max_label_size: 10,
            min_genome_size: 8,
            max_genome_size: 2048,
        }
    }
}

impl HardwareConfig {
    /// The same hardware with every mutation source switched off.
    pub fn without_mutations(&self) -> Self {
        Self {
            copy_mut_prob: 0.0,
            divide_mut_prob: 0.0,
            divide_ins_prob: 0.0,
            divide_del_prob: 0.0,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("hardware.copy_mut_prob", self.copy_mut_prob)?;
        check_probability("hardware.divide_mut_prob", self.divide_mut_prob)?;
        check_probability("hardware.divide_ins_prob", self.divide_ins_prob)?;
        check_probability("hardware.divide_del_prob", self.divide_del_prob)?;
        check_probability("hardware.min_copied_lines", self.min_copied_lines)?;
        check_probability("hardware.min_exe_lines", self.min_exe_lines)?;
        if !(self.child_size_range >= 1.0) {
            return Err(ConfigError::Invalid {
                field: "hardware.child_size_range",
                reason: format!("{} is below 1.0", self.child_size_range),
            });
        }
        if self.min_genome_size == 0 || self.min_genome_size > self.max_genome_size {
            return Err(ConfigError::Invalid {
                field: "hardware.min_genome_size",
                reason: format!(
                    "need 0 < min ({}) <= max ({})",
                    self.min_genome_size, self.max_genome_size
                ),
            });
        }
        Ok(())
    }
}

/// How a newborn picks the slot it lands in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BirthMethod {
    /// Any slot in the population, occupied or not.
    Random,
    /// An empty slot if one exists, otherwise a random one.
    EmptyFirst,
}

/// Parameters of the population scheduler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of organism slots.
    pub population_size: usize,
    /// Instructions each organism executes per update.
    pub time_slice: usize,
    /// An organism dies after executing `age_limit * genome length`
    /// instructions in one gestation (0 disables).
    pub age_limit: usize,
    pub birth_method: BirthMethod,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            population_size: 3600,
            time_slice: 30,
            age_limit: 20,
            birth_method: BirthMethod::Random,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Invalid {
                field: "world.population_size",
                reason: "must be positive".to_string(),
            });
        }
        if self.time_slice == 0 {
            return Err(ConfigError::Invalid {
                field: "world.time_slice",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub hardware: HardwareConfig,
    pub world: WorldConfig,
}

impl Config {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hardware.validate()?;
        self.world.validate()
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is not a probability"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_document() {
        let config = Config::from_toml(
            r#"
            [hardware]
            copy_mut_prob = 0.0

            [world]
            population_size = 100
            birth_method = "empty-first"
            "#,
        )
        .unwrap();
        assert_eq!(config.hardware.copy_mut_prob, 0.0);
        assert_eq!(config.hardware.child_size_range, 2.0);
        assert_eq!(config.world.population_size, 100);
        assert_eq!(config.world.time_slice, 30);
        assert_eq!(config.world.birth_method, BirthMethod::EmptyFirst);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = Config::from_toml("[hardware]\ncopy_mut_prob = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "hardware.copy_mut_prob", .. }
        ));
    }

    #[test]
    fn test_rejects_nan_probability() {
        let hw = HardwareConfig {
            copy_mut_prob: f64::NAN,
            ..Default::default()
        };
        assert!(hw.validate().is_err());
    }

    #[test]
    fn test_rejects_shrinking_size_range() {
        let hw = HardwareConfig {
            child_size_range: 0.5,
            ..Default::default()
        };
        assert!(hw.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_population() {
        let err = Config::from_toml("[world]\npopulation_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = Config::from_toml("[hardware\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_without_mutations() {
        let hw = HardwareConfig::default().without_mutations();
        assert_eq!(hw.copy_mut_prob, 0.0);
        assert_eq!(hw.divide_ins_prob, 0.0);
        assert_eq!(hw.divide_del_prob, 0.0);
        assert_eq!(hw.max_label_size, 10);
    }
}
