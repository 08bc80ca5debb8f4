use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use crate::config::{BirthMethod, Config};
use crate::genome::Genome;
use crate::organism::Organism;

/// What one update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub births: usize,
    /// Organisms removed for exceeding the age limit.
    pub deaths: usize,
    /// Organisms overwritten by a newborn.
    pub replaced: usize,
}

/// A well-mixed population of organisms in a fixed number of slots.
pub struct Population {
    slots: Vec<Option<Organism>>,
    config: Config,
    rng: SmallRng,
    updates: u64,
    /// Reusable scratch: slots emptied or never filled.
    empty: Vec<usize>,
}

impl Population {
    /// A population holding a single copy of `ancestor`.
    pub fn new(config: Config, ancestor: &Genome, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let size = config.world.population_size;
        let mut slots: Vec<Option<Organism>> = (0..size).map(|_| None).collect();
        if size > 0 {
            let slot = rng.gen_range(0..size);
            slots[slot] = Some(Organism::new(ancestor, rng.r#gen()));
        }
        Self {
            slots,
            config,
            rng,
            updates: 0,
            empty: Vec::new(),
        }
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn slots(&self) -> &[Option<Organism>] {
        &self.slots
    }

    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.slots.iter().flatten()
    }

    pub fn num_organisms(&self) -> usize {
        self.organisms().count()
    }

    /// Genomes of all living organisms, in slot order.
    pub fn genomes(&self) -> Vec<Genome> {
        self.organisms().map(|o| o.genome().clone()).collect()
    }

    /// Fill `buf` with every living genome, one byte per site.
    pub fn population_bytes_into(&self, buf: &mut Vec<u8>) {
        buf.clear();
        for organism in self.organisms() {
            buf.extend(organism.genome().sites().iter().map(|inst| inst.0));
        }
    }

    pub fn population_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.population_bytes_into(&mut buf);
        buf
    }

    /// Run one update.
    ///
    /// Phase 1 (parallel): every organism executes one time slice; offspring
    /// are collected per organism and expired organisms are removed.
    /// Phase 2 (sequential): offspring are placed in slot order of their
    /// parents using the population's random stream.
    pub fn update(&mut self) -> UpdateStats {
        let hardware = &self.config.hardware;
        let time_slice = self.config.world.time_slice;
        let age_limit = self.config.world.age_limit;

        // --- Phase 1: execute (parallel) ---

        let results: Vec<(Vec<Organism>, bool)> = self
            .slots
            .par_iter_mut()
            .map(|slot| {
                let Some(organism) = slot.as_mut() else {
                    return (Vec::new(), false);
                };
                let mut born = Vec::new();
                organism.execute(hardware, time_slice, &mut born);
                let expired = organism.is_expired(age_limit);
                if expired {
                    *slot = None;
                }
                (born, expired)
            })
            .collect();

        // --- Phase 2: place offspring (sequential) ---

        let mut stats = UpdateStats::default();
        self.empty.clear();
        if self.config.world.birth_method == BirthMethod::EmptyFirst {
            self.empty
                .extend(self.slots.iter().enumerate().filter(|(_, s)| s.is_none()).map(|(i, _)| i));
        }

        for (born, expired) in results {
            stats.deaths += usize::from(expired);
            for child in born {
                let slot = self.birth_slot();
                if self.slots[slot].is_some() {
                    stats.replaced += 1;
                }
                tracing::trace!(slot, generation = child.generation(), "offspring placed");
                self.slots[slot] = Some(child);
                stats.births += 1;
            }
        }

        self.updates += 1;
        tracing::debug!(
            update = self.updates,
            births = stats.births,
            deaths = stats.deaths,
            replaced = stats.replaced,
            alive = self.num_organisms(),
            "update complete"
        );
        stats
    }

    fn birth_slot(&mut self) -> usize {
        if !self.empty.is_empty() {
            let pick = self.rng.gen_range(0..self.empty.len());
            return self.empty.swap_remove(pick);
        }
        self.rng.gen_range(0..self.slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::genome::DEFAULT_ANCESTOR;

    fn ancestor() -> Genome {
        DEFAULT_ANCESTOR.parse().unwrap()
    }

    fn config(size: usize, birth_method: BirthMethod) -> Config {
        Config {
            hardware: Default::default(),
            world: WorldConfig {
                population_size: size,
                birth_method,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_starts_with_one_ancestor() {
        let pop = Population::new(config(16, BirthMethod::Random), &ancestor(), 1);
        assert_eq!(pop.slots().len(), 16);
        assert_eq!(pop.num_organisms(), 1);
        assert_eq!(pop.genomes(), vec![ancestor()]);
        assert_eq!(pop.population_bytes().len(), DEFAULT_ANCESTOR.len());
    }

    #[test]
    fn test_empty_first_fills_population() {
        let mut cfg = config(10, BirthMethod::EmptyFirst);
        cfg.hardware = cfg.hardware.without_mutations();
        let mut pop = Population::new(cfg, &ancestor(), 3);
        let mut births = 0;
        for _ in 0..40 {
            let stats = pop.update();
            births += stats.births;
            assert_eq!(stats.deaths, 0);
        }
        assert_eq!(pop.num_organisms(), 10);
        assert!(births >= 9);
        assert!(pop.organisms().all(|o| o.genome() == &ancestor()));
        assert_eq!(pop.updates(), 40);
    }

    #[test]
    fn test_replicator_spreads() {
        let mut cfg = config(50, BirthMethod::Random);
        cfg.hardware = cfg.hardware.without_mutations();
        let mut pop = Population::new(cfg, &ancestor(), 7);
        for _ in 0..30 {
            pop.update();
        }
        assert!(pop.num_organisms() > 1);
        assert!(pop.organisms().any(|o| o.generation() > 0));
    }

    #[test]
    fn test_non_replicators_die_out() {
        let genome: Genome = "llllllllll".parse().unwrap();
        let mut pop = Population::new(config(4, BirthMethod::Random), &genome, 0);
        let mut deaths = 0;
        // 20 * 10 cycles at 30 per update.
        for _ in 0..7 {
            deaths += pop.update().deaths;
        }
        assert_eq!(deaths, 1);
        assert_eq!(pop.num_organisms(), 0);
    }

    #[test]
    fn test_deterministic_population() {
        let run = |seed: u64| -> Vec<Genome> {
            let mut pop = Population::new(config(40, BirthMethod::Random), &ancestor(), seed);
            for _ in 0..40 {
                pop.update();
            }
            pop.genomes()
        };
        assert_eq!(run(42), run(42));
    }
}
