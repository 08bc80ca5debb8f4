use std::collections::VecDeque;

use rand::Rng;

use crate::config::HardwareConfig;
use crate::cpu::Cpu;
use crate::organism::Organism;
use crate::tasks::Task;

/// How many recent inputs and outputs an organism remembers.
pub const IO_HISTORY_SIZE: usize = 3;

/// Recent inputs and outputs of one organism, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoHistory {
    inputs: VecDeque<u32>,
    outputs: VecDeque<u32>,
}

impl IoHistory {
    pub fn inputs(&self) -> &VecDeque<u32> {
        &self.inputs
    }

    pub fn outputs(&self) -> &VecDeque<u32> {
        &self.outputs
    }

    pub fn push_input(&mut self, value: u32) {
        push_bounded(&mut self.inputs, value);
    }

    pub fn push_output(&mut self, value: u32) {
        push_bounded(&mut self.outputs, value);
    }
}

fn push_bounded(ring: &mut VecDeque<u32>, value: u32) {
    ring.push_front(value);
    ring.truncate(IO_HISTORY_SIZE);
}

/// Decides which tasks an output completes.
pub trait TaskDetector {
    /// Called after `value` has been appended to `history`'s outputs.
    /// Returns the tasks newly completed by it.
    fn on_output(&mut self, value: u32, history: &IoHistory) -> Vec<Task>;
}

/// Supplies the values read by the IO instruction.
pub trait InputSource {
    fn next_input(&mut self) -> u32;
}

/// Receives offspring produced by a successful divide.
pub trait OffspringSink {
    fn on_offspring_ready(&mut self, offspring: Organism);
}

impl OffspringSink for Vec<Organism> {
    fn on_offspring_ready(&mut self, offspring: Organism) {
        self.push(offspring);
    }
}

/// The three environment inputs handed out in turn.
///
/// The top byte of each is fixed (0x0F, 0x33, 0x55) so that every
/// combination of input bits appears among the lower bits of the three
/// values; the low 24 bits are random.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInputs {
    values: [u32; 3],
    next: usize,
}

impl EnvironmentInputs {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut values: [u32; 3] = [0x0F << 24, 0x33 << 24, 0x55 << 24];
        for value in &mut values {
            *value |= rng.gen_range(0..1u32 << 24);
        }
        Self { values, next: 0 }
    }

    pub fn values(&self) -> [u32; 3] {
        self.values
    }
}

impl InputSource for EnvironmentInputs {
    fn next_input(&mut self) -> u32 {
        let value = self.values[self.next];
        self.next = (self.next + 1) % self.values.len();
        value
    }
}

/// Everything one instruction may touch outside the CPU itself.
pub struct ExecContext<'a, R: Rng> {
    pub config: &'a HardwareConfig,
    pub rng: &'a mut R,
    pub tasks: &'a mut dyn TaskDetector,
    pub inputs: &'a mut dyn InputSource,
}

/// Externally observable result of one instruction.
#[derive(Debug)]
pub enum Event {
    /// The IO instruction emitted `value`; `completed` lists tasks it
    /// newly satisfied.
    Output { value: u32, completed: Vec<Task> },
    /// A divide succeeded. The offspring has fresh CPU state.
    Offspring(Box<Cpu>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_history_keeps_newest_three() {
        let mut history = IoHistory::default();
        for v in 1..=5 {
            history.push_input(v);
        }
        assert_eq!(history.inputs().iter().copied().collect::<Vec<_>>(), vec![5, 4, 3]);
        history.push_output(9);
        assert_eq!(history.outputs().front(), Some(&9));
        assert_eq!(history.outputs().len(), 1);
    }

    #[test]
    fn test_environment_inputs_cycle() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut inputs = EnvironmentInputs::new(&mut rng);
        let values = inputs.values();
        assert_eq!(values[0] >> 24, 0x0F);
        assert_eq!(values[1] >> 24, 0x33);
        assert_eq!(values[2] >> 24, 0x55);
        let drawn: Vec<u32> = (0..6).map(|_| inputs.next_input()).collect();
        assert_eq!(drawn[..3], values);
        assert_eq!(drawn[3..], values);
    }

    #[test]
    fn test_environment_inputs_depend_on_seed() {
        let a = EnvironmentInputs::new(&mut SmallRng::seed_from_u64(1));
        let b = EnvironmentInputs::new(&mut SmallRng::seed_from_u64(1));
        let c = EnvironmentInputs::new(&mut SmallRng::seed_from_u64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
