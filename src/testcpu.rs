use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::HardwareConfig;
use crate::cpu::Cpu;
use crate::environment::{EnvironmentInputs, Event, ExecContext};
use crate::error::Inviable;
use crate::genome::Genome;
use crate::tasks::{LogicTasks, Task};

/// Instructions per genome site the test CPU allows before giving up.
pub const DEFAULT_TIME_MOD: usize = 20;

/// What one isolated gestation of a genome showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    /// The genome produced an offspring.
    pub viable: bool,
    /// Cycles from birth to the first successful divide.
    pub gestation_time: Option<u64>,
    pub offspring: Option<Genome>,
    /// The offspring is identical to the tested genome.
    pub copy_true: bool,
    /// Completions of each task during the gestation.
    pub tasks: [u32; Task::COUNT],
    /// Instructions executed.
    pub cycles: u64,
    /// Reason the last divide attempt was rejected, for inviable genomes.
    pub failure: Option<Inviable>,
}

impl TestResult {
    /// Names of the tasks performed at least once.
    pub fn task_names(&self) -> Vec<&'static str> {
        Task::ALL
            .iter()
            .filter(|task| self.tasks[task.index()] > 0)
            .map(|task| task.name())
            .collect()
    }
}

/// Runs a genome in isolation, without mutations, until its first divide.
#[derive(Debug, Clone)]
pub struct TestCpu {
    config: HardwareConfig,
    time_mod: usize,
    seed: u64,
}

impl TestCpu {
    pub fn new(config: &HardwareConfig) -> Self {
        Self {
            config: config.without_mutations(),
            time_mod: DEFAULT_TIME_MOD,
            seed: 0,
        }
    }

    /// Seed for the environment inputs handed to the genome.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_mod(mut self, time_mod: usize) -> Self {
        self.time_mod = time_mod;
        self
    }

    pub fn evaluate(&self, genome: &Genome) -> TestResult {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut inputs = EnvironmentInputs::new(&mut rng);
        let mut tasks = LogicTasks::new();
        let mut cpu = Cpu::new(genome);
        let limit = self.time_mod * genome.len().max(1);

        let mut cycles = 0;
        let mut offspring = None;
        while cycles < limit as u64 {
            let mut ctx = ExecContext {
                config: &self.config,
                rng: &mut rng,
                tasks: &mut tasks,
                inputs: &mut inputs,
            };
            let event = cpu.step(&mut ctx);
            cycles += 1;
            if let Some(Event::Offspring(child)) = event {
                offspring = Some(child.genome());
                break;
            }
        }

        let phenotype = cpu.phenotype();
        match offspring {
            Some(child) => TestResult {
                viable: true,
                gestation_time: phenotype.last_gestation_time,
                copy_true: &child == genome,
                offspring: Some(child),
                tasks: phenotype.last_task_counts,
                cycles,
                failure: None,
            },
            None => TestResult {
                viable: false,
                gestation_time: None,
                offspring: None,
                copy_true: false,
                tasks: phenotype.task_counts,
                cycles,
                failure: cpu.divide_failure(),
            },
        }
    }
}
