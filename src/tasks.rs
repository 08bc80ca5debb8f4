use std::collections::HashSet;

use crate::environment::{IoHistory, TaskDetector};

/// The logic tasks an organism can be rewarded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    Echo = 0,
    Not,
    Nand,
    And,
    OrNot,
    Or,
    AndNot,
    Nor,
    Xor,
    Equ,
}

impl Task {
    pub const COUNT: usize = 10;

    pub const ALL: [Task; Task::COUNT] = [
        Task::Echo,
        Task::Not,
        Task::Nand,
        Task::And,
        Task::OrNot,
        Task::Or,
        Task::AndNot,
        Task::Nor,
        Task::Xor,
        Task::Equ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Task::Echo => "echo",
            Task::Not => "not",
            Task::Nand => "nand",
            Task::And => "and",
            Task::OrNot => "orn",
            Task::Or => "or",
            Task::AndNot => "andn",
            Task::Nor => "nor",
            Task::Xor => "xor",
            Task::Equ => "equ",
        }
    }

    /// The task computed by a function with the given truth table.
    pub fn from_logic_id(id: u8) -> Option<Task> {
        let task = match id {
            170 | 204 | 240 => Task::Echo,
            15 | 51 | 85 => Task::Not,
            63 | 95 | 119 => Task::Nand,
            136 | 160 | 192 => Task::And,
            175 | 187 | 207 | 221 | 243 | 245 => Task::OrNot,
            238 | 250 | 252 => Task::Or,
            10 | 12 | 34 | 48 | 68 | 80 => Task::AndNot,
            3 | 5 | 17 => Task::Nor,
            60 | 90 | 102 => Task::Xor,
            153 | 165 | 195 => Task::Equ,
            _ => return None,
        };
        Some(task)
    }
}

/// Truth table of `output` as a function of up to three inputs, newest
/// first.
///
/// Bit `i` of the id is the output bit seen when the inputs' bits read
/// `i` (newest input as the least significant bit). Missing inputs are
/// treated as don't-cares. Returns `None` when two bit positions with the
/// same inputs disagree on the output, or when some input combination was
/// never observed.
pub fn logic_id(inputs: &[u32], output: u32) -> Option<u8> {
    let inputs = &inputs[..inputs.len().min(3)];
    let mut table: [Option<bool>; 8] = [None; 8];
    for bit in 0..32 {
        let row = inputs
            .iter()
            .enumerate()
            .fold(0usize, |row, (i, &input)| row | (((input >> bit) & 1) as usize) << i);
        let out = (output >> bit) & 1 == 1;
        match table[row] {
            Some(seen) if seen != out => return None,
            _ => table[row] = Some(out),
        }
    }
    // Rows that differ only in an absent input share the observed value.
    for row in 0..8 {
        let known = row & ((1 << inputs.len()) - 1);
        if table[row].is_none() {
            table[row] = table[known];
        }
    }
    let mut id = 0u8;
    for (row, value) in table.iter().enumerate() {
        if (*value)? {
            id |= 1 << row;
        }
    }
    Some(id)
}

/// Task detector for the logic-9 library plus echo.
///
/// Each task is credited at most once per distinct set of inputs, so an
/// organism cannot farm a task by repeating one output.
#[derive(Debug, Clone, Default)]
pub struct LogicTasks {
    credited: HashSet<(Task, Vec<u32>)>,
}

impl LogicTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.credited.clear();
    }
}

impl TaskDetector for LogicTasks {
    fn on_output(&mut self, value: u32, history: &IoHistory) -> Vec<Task> {
        let inputs: Vec<u32> = history.inputs().iter().copied().collect();
        if inputs.is_empty() {
            return Vec::new();
        }
        let Some(task) = logic_id(&inputs, value).and_then(Task::from_logic_id) else {
            return Vec::new();
        };
        let mut key = inputs;
        key.sort_unstable();
        if self.credited.insert((task, key)) {
            vec![task]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u32 = 0x0F13_5791;
    const B: u32 = 0x33AB_CDEF;
    const C: u32 = 0x5502_4680;

    fn history(inputs: &[u32]) -> IoHistory {
        let mut history = IoHistory::default();
        for &input in inputs {
            history.push_input(input);
        }
        history
    }

    #[test]
    fn test_logic_id_single_input() {
        assert_eq!(logic_id(&[A], A), Some(170));
        assert_eq!(logic_id(&[A], !A), Some(85));
    }

    #[test]
    fn test_logic_id_three_inputs() {
        // Newest input is bit 0 of the row.
        assert_eq!(logic_id(&[C, B, A], C), Some(170));
        assert_eq!(logic_id(&[C, B, A], B), Some(204));
        assert_eq!(logic_id(&[C, B, A], A), Some(240));
        assert_eq!(logic_id(&[C, B, A], !(C & B)), Some(119));
        assert_eq!(logic_id(&[C, B, A], C ^ B), Some(102));
    }

    #[test]
    fn test_logic_id_inconsistent() {
        // Input bits all zero but output bits differ.
        assert_eq!(logic_id(&[0], 0b10), None);
    }

    #[test]
    fn test_task_table() {
        for &task in &Task::ALL {
            assert_eq!(Task::ALL[task.index()], task);
        }
        assert_eq!(Task::from_logic_id(0), None);
        assert_eq!(Task::from_logic_id(255), None);
        assert_eq!(Task::OrNot.name(), "orn");
    }

    #[test]
    fn test_detects_not() {
        let mut tasks = LogicTasks::new();
        let mut history = history(&[A]);
        history.push_output(!A);
        assert_eq!(tasks.on_output(!A, &history), vec![Task::Not]);
    }

    #[test]
    fn test_detects_echo() {
        let mut tasks = LogicTasks::new();
        let history = history(&[A]);
        assert_eq!(tasks.on_output(A, &history), vec![Task::Echo]);
    }

    #[test]
    fn test_detects_nand() {
        let mut tasks = LogicTasks::new();
        let history = history(&[A, B]);
        assert_eq!(tasks.on_output(!(A & B), &history), vec![Task::Nand]);
    }

    #[test]
    fn test_credits_once_per_input_set() {
        let mut tasks = LogicTasks::new();
        let first = history(&[A]);
        assert_eq!(tasks.on_output(!A, &first), vec![Task::Not]);
        assert!(tasks.on_output(!A, &first).is_empty());

        let other = history(&[B]);
        assert_eq!(tasks.on_output(!B, &other), vec![Task::Not]);

        tasks.reset();
        assert_eq!(tasks.on_output(!A, &first), vec![Task::Not]);
    }

    #[test]
    fn test_no_inputs_no_tasks() {
        let mut tasks = LogicTasks::new();
        assert!(tasks.on_output(5, &IoHistory::default()).is_empty());
    }

    #[test]
    fn test_unrelated_output() {
        let mut tasks = LogicTasks::new();
        let history = history(&[A, B, C]);
        assert!(tasks.on_output(0x1234_5678, &history).is_empty());
    }
}
