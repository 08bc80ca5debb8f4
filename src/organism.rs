use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::HardwareConfig;
use crate::cpu::Cpu;
use crate::environment::{EnvironmentInputs, Event, ExecContext, OffspringSink};
use crate::genome::Genome;
use crate::tasks::LogicTasks;

/// One organism: a CPU plus everything it needs to run on its own.
///
/// Each organism owns its random stream, task detector and inputs, so any
/// number of them can be stepped in parallel without sharing state.
#[derive(Debug, Clone)]
pub struct Organism {
    cpu: Cpu,
    /// The genome the current gestation started from.
    genome: Genome,
    tasks: LogicTasks,
    inputs: EnvironmentInputs,
    rng: SmallRng,
    generation: u64,
}

impl Organism {
    pub fn new(genome: &Genome, seed: u64) -> Self {
        Self::with_cpu(Cpu::new(genome), seed, 0)
    }

    fn with_cpu(cpu: Cpu, seed: u64, generation: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let inputs = EnvironmentInputs::new(&mut rng);
        Self {
            genome: cpu.genome(),
            cpu,
            tasks: LogicTasks::new(),
            inputs,
            rng,
            generation,
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run up to `cycles` instructions, handing every offspring to `sink`.
    ///
    /// Returns the number of offspring produced.
    pub fn execute(
        &mut self,
        config: &HardwareConfig,
        cycles: usize,
        sink: &mut impl OffspringSink,
    ) -> usize {
        let mut born = 0;
        for _ in 0..cycles {
            let mut ctx = ExecContext {
                config,
                rng: &mut self.rng,
                tasks: &mut self.tasks,
                inputs: &mut self.inputs,
            };
            if let Some(Event::Offspring(child)) = self.cpu.step(&mut ctx) {
                self.tasks.reset();
                self.genome = self.cpu.genome();
                let seed = self.rng.r#gen();
                sink.on_offspring_ready(Organism::with_cpu(*child, seed, self.generation + 1));
                born += 1;
            }
        }
        born
    }

    /// True once the current gestation has run longer than `age_limit`
    /// instructions per site of the genome. An `age_limit` of 0 never
    /// expires.
    pub fn is_expired(&self, age_limit: usize) -> bool {
        if age_limit == 0 {
            return false;
        }
        let limit = (age_limit * self.genome.len().max(1)) as u64;
        self.cpu.phenotype().cycles > limit
    }
}
