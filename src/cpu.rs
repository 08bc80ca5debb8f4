use rand::Rng;

use crate::config::HardwareConfig;
use crate::environment::{Event, ExecContext, IoHistory};
use crate::error::Inviable;
use crate::genome::Genome;
use crate::head::{Head, HeadKind, NUM_HEADS};
use crate::inst::{Inst, NUM_OPS, Nop, Op};
use crate::label::{Label, find_template, read_label};
use crate::memory::Memory;
use crate::tasks::Task;

/// Depth of each stack. Pushing onto a full stack drops the oldest value.
pub const STACK_DEPTH: usize = 10;

/// The three registers. The default operand of most instructions is BX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Ax = 0,
    Bx = 1,
    Cx = 2,
}

impl Register {
    pub fn from_nop(nop: Nop) -> Register {
        match nop {
            Nop::A => Register::Ax,
            Nop::B => Register::Bx,
            Nop::C => Register::Cx,
        }
    }

    /// The register compared or swapped with this one: AX→BX→CX→AX.
    pub fn complement(self) -> Register {
        match self {
            Register::Ax => Register::Bx,
            Register::Bx => Register::Cx,
            Register::Cx => Register::Ax,
        }
    }
}

/// A fixed-depth ring of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    values: [u32; STACK_DEPTH],
    top: usize,
    len: usize,
}

impl Stack {
    pub fn push(&mut self, value: u32) {
        self.top = (self.top + 1) % STACK_DEPTH;
        self.values[self.top] = value;
        self.len = (self.len + 1).min(STACK_DEPTH);
    }

    /// Remove and return the top value; an empty stack yields 0.
    pub fn pop(&mut self) -> u32 {
        if self.len == 0 {
            return 0;
        }
        let value = self.values[self.top];
        self.top = (self.top + STACK_DEPTH - 1) % STACK_DEPTH;
        self.len -= 1;
        value
    }

    pub fn peek(&self) -> u32 {
        if self.len == 0 { 0 } else { self.values[self.top] }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Statistics of the current gestation, plus what the previous one left.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Phenotype {
    /// Instructions executed since birth or the last divide.
    pub cycles: u64,
    pub copies_executed: u64,
    pub copy_mutations: u64,
    pub task_counts: [u32; Task::COUNT],
    /// Cycles taken by the last completed gestation.
    pub last_gestation_time: Option<u64>,
    /// Tasks performed during the last completed gestation.
    pub last_task_counts: [u32; Task::COUNT],
    pub offspring_count: u64,
}

impl Phenotype {
    fn roll_over(&mut self) {
        self.last_gestation_time = Some(self.cycles);
        self.last_task_counts = self.task_counts;
        self.offspring_count += 1;
        self.cycles = 0;
        self.copies_executed = 0;
        self.copy_mutations = 0;
        self.task_counts = [0; Task::COUNT];
    }
}

/// The heads-based virtual CPU of one organism.
///
/// `step` executes exactly one instruction. Nothing here fails: malformed
/// code runs as no-ops, every head wraps within memory and a rejected
/// allocate or divide simply has no effect beyond what is documented on
/// the instruction.
#[derive(Debug, Clone)]
pub struct Cpu {
    memory: Memory,
    registers: [u32; 3],
    stacks: [Stack; 2],
    active_stack: usize,
    heads: [Head; NUM_HEADS],
    pending: Option<Nop>,
    read_label: Label,
    history: IoHistory,
    phenotype: Phenotype,
    /// Set by `h-alloc`, cleared by a successful divide.
    allocated: bool,
    divide_failure: Option<Inviable>,
    advance_ip: bool,
}

impl Cpu {
    pub fn new(genome: &Genome) -> Self {
        Self {
            memory: Memory::from_genome(genome),
            registers: [0; 3],
            stacks: Default::default(),
            active_stack: 0,
            heads: [Head::default(); NUM_HEADS],
            pending: None,
            read_label: Label::new(),
            history: IoHistory::default(),
            phenotype: Phenotype::default(),
            allocated: false,
            divide_failure: None,
            advance_ip: true,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The current memory contents as a genome.
    pub fn genome(&self) -> Genome {
        self.memory.to_genome()
    }

    pub fn register(&self, reg: Register) -> u32 {
        self.registers[reg as usize]
    }

    pub fn set_register(&mut self, reg: Register, value: u32) {
        self.registers[reg as usize] = value;
    }

    pub fn head(&self, kind: HeadKind) -> usize {
        self.heads[kind as usize].position()
    }

    pub fn set_head(&mut self, kind: HeadKind, pos: usize) {
        let len = self.memory.len();
        self.heads[kind as usize].set(pos, len);
    }

    pub fn stack(&self, which: usize) -> &Stack {
        &self.stacks[which & 1]
    }

    pub fn active_stack(&self) -> usize {
        self.active_stack
    }

    pub fn pending(&self) -> Option<Nop> {
        self.pending
    }

    pub fn read_label(&self) -> &Label {
        &self.read_label
    }

    pub fn history(&self) -> &IoHistory {
        &self.history
    }

    pub fn phenotype(&self) -> &Phenotype {
        &self.phenotype
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Why the most recent divide attempt was rejected, if it was.
    pub fn divide_failure(&self) -> Option<Inviable> {
        self.divide_failure
    }

    /// Execute the instruction under the IP.
    ///
    /// Returns an event for IO and for a successful divide. An empty memory
    /// executes nothing.
    pub fn step<R: Rng>(&mut self, ctx: &mut ExecContext<'_, R>) -> Option<Event> {
        if self.memory.is_empty() {
            return None;
        }
        let modifier = self.pending.take();
        let ip = self.ip();
        let inst = self.memory.get(ip);
        self.memory.flags_mut(ip).executed = true;
        self.phenotype.cycles += 1;
        self.advance_ip = true;

        let event = match inst.op() {
            Some(op) => self.dispatch(op, modifier, ctx),
            None => None,
        };

        if self.advance_ip {
            let len = self.memory.len();
            self.heads[HeadKind::Ip as usize].advance(len);
        }
        event
    }

    fn dispatch<R: Rng>(
        &mut self,
        op: Op,
        modifier: Option<Nop>,
        ctx: &mut ExecContext<'_, R>,
    ) -> Option<Event> {
        let reg = |default| modifier.map_or(default, Register::from_nop);
        let head = |default| modifier.map_or(default, HeadKind::from_nop);
        let len = self.memory.len();

        match op {
            Op::NopA | Op::NopB | Op::NopC => self.pending = op.nop(),
            Op::IfNEqu => {
                let r = reg(Register::Bx);
                if self.register(r) == self.register(r.complement()) {
                    self.skip();
                }
            }
            Op::IfLess => {
                let r = reg(Register::Bx);
                if self.register(r) >= self.register(r.complement()) {
                    self.skip();
                }
            }
            Op::Pop => {
                let value = self.stacks[self.active_stack].pop();
                self.set_register(reg(Register::Bx), value);
            }
            Op::Push => {
                let value = self.register(reg(Register::Bx));
                self.stacks[self.active_stack].push(value);
            }
            Op::SwapStk => self.active_stack ^= 1,
            Op::Swap => {
                let r = reg(Register::Bx);
                self.registers.swap(r as usize, r.complement() as usize);
            }
            Op::ShiftR => self.update(reg(Register::Bx), |v| v >> 1),
            Op::ShiftL => self.update(reg(Register::Bx), |v| v << 1),
            Op::Inc => self.update(reg(Register::Bx), |v| v.wrapping_add(1)),
            Op::Dec => self.update(reg(Register::Bx), |v| v.wrapping_sub(1)),
            Op::Add => {
                let value = self.register(Register::Bx).wrapping_add(self.register(Register::Cx));
                self.set_register(reg(Register::Bx), value);
            }
            Op::Sub => {
                let value = self.register(Register::Bx).wrapping_sub(self.register(Register::Cx));
                self.set_register(reg(Register::Bx), value);
            }
            Op::Nand => {
                let value = !(self.register(Register::Bx) & self.register(Register::Cx));
                self.set_register(reg(Register::Bx), value);
            }
            Op::Io => return Some(self.io(reg(Register::Bx), ctx)),
            Op::HAlloc => self.allocate(ctx.config),
            Op::HDivide => return self.divide(ctx),
            Op::HCopy => self.copy(ctx),
            Op::HSearch => self.search(ctx.config),
            Op::MovHead => {
                let target = head(HeadKind::Ip);
                self.heads[target as usize] = self.heads[HeadKind::Flow as usize];
                if target == HeadKind::Ip {
                    self.advance_ip = false;
                }
            }
            Op::JmpHead => {
                let offset = self.register(Register::Cx) as i32;
                self.heads[head(HeadKind::Ip) as usize].jump(offset as i64, len);
            }
            Op::GetHead => {
                let pos = self.head(head(HeadKind::Ip));
                self.set_register(Register::Cx, pos as u32);
            }
            Op::IfLabel => {
                let label = self.read_template(ctx.config.max_label_size);
                if label.complement() != self.read_label {
                    self.skip();
                }
            }
            Op::SetFlow => {
                let target = self.register(reg(Register::Cx)) as usize;
                self.heads[HeadKind::Flow as usize].set(target, len);
            }
        }
        None
    }

    fn ip(&self) -> usize {
        self.heads[HeadKind::Ip as usize].position()
    }

    fn update(&mut self, reg: Register, f: impl FnOnce(u32) -> u32) {
        let slot = &mut self.registers[reg as usize];
        *slot = f(*slot);
    }

    fn skip(&mut self) {
        let len = self.memory.len();
        self.heads[HeadKind::Ip as usize].advance(len);
    }

    /// Read the template after the IP and leave the IP on its last nop, so
    /// that execution resumes after it. The template counts as executed.
    fn read_template(&mut self, max_size: usize) -> Label {
        let len = self.memory.len();
        let ip = self.ip();
        let label = read_label(&self.memory, (ip + 1) % len, max_size);
        for offset in 1..=label.len() {
            self.memory.flags_mut((ip + offset) % len).executed = true;
        }
        self.heads[HeadKind::Ip as usize].set(ip + label.len(), len);
        label
    }

    fn search(&mut self, config: &HardwareConfig) {
        let origin = self.ip();
        let template = self.read_template(config.max_label_size);
        let len = self.memory.len();
        let flow = HeadKind::Flow as usize;

        if template.is_empty() {
            self.set_register(Register::Bx, 0);
            self.set_register(Register::Cx, 0);
            self.heads[flow].set(origin + 1, len);
            return;
        }

        let after = (origin + template.len() + 1) % len;
        let mut window = len - 1 - template.len();
        // A template cut off at `max_label_size` leaves the rest of its run
        // behind; the scan starts past it.
        let mut from = after;
        while window > 0 && self.memory.get(from).is_nop() {
            from = (from + 1) % len;
            window -= 1;
        }
        self.set_register(Register::Cx, template.len() as u32);
        match find_template(&self.memory, from, window, &template.complement()) {
            Some(start) => {
                self.set_register(Register::Bx, ((start + len - origin) % len) as u32);
                self.heads[flow].set(start, len);
            }
            None => {
                self.set_register(Register::Bx, 0);
                self.heads[flow].set(after, len);
            }
        }
    }

    fn copy<R: Rng>(&mut self, ctx: &mut ExecContext<'_, R>) {
        let len = self.memory.len();
        let read = self.head(HeadKind::Read);
        let write = self.head(HeadKind::Write);

        let original = self.memory.get(read);
        match original.nop() {
            Some(nop) if self.read_label.len() < ctx.config.max_label_size => {
                self.read_label.push(nop)
            }
            Some(_) => {}
            None => self.read_label.clear(),
        }

        let p = ctx.config.copy_mut_prob;
        let mutated = p > 0.0 && ctx.rng.gen_bool(p);
        let inst = if mutated {
            self.phenotype.copy_mutations += 1;
            random_inst(ctx.rng)
        } else {
            original
        };
        self.phenotype.copies_executed += 1;

        self.memory.set(write, inst);
        let flags = self.memory.flags_mut(write);
        flags.copied = true;
        flags.mutated |= mutated;

        self.heads[HeadKind::Read as usize].advance(len);
        self.heads[HeadKind::Write as usize].advance(len);
    }

    fn allocate(&mut self, config: &HardwareConfig) {
        if self.allocated {
            tracing::trace!("allocate rejected: already allocated");
            return;
        }
        let old_size = self.memory.len();
        let range = config.child_size_range;
        let amount = ((range * old_size as f64) as usize)
            .min(config.max_genome_size.saturating_sub(old_size));
        let new_size = old_size + amount;

        let rejected = amount < 1
            || new_size < config.min_genome_size
            || new_size > config.max_genome_size
            || amount > (old_size as f64 * range) as usize
            || old_size > (amount as f64 * range) as usize;
        if rejected {
            tracing::trace!(old_size, amount, "allocate rejected");
            return;
        }

        self.memory.resize(new_size);
        self.set_register(Register::Ax, old_size as u32);
        self.allocated = true;
    }

    fn divide<R: Rng>(&mut self, ctx: &mut ExecContext<'_, R>) -> Option<Event> {
        // Either outcome leaves every head at 0; the IP must not advance.
        self.advance_ip = false;
        let (read, write) = match self.check_divide(ctx.config) {
            Ok(bounds) => bounds,
            Err(reason) => {
                tracing::trace!(%reason, "divide rejected");
                self.divide_failure = Some(reason);
                self.heads = [Head::default(); NUM_HEADS];
                return None;
            }
        };

        let mut sites = self.memory.extract(read, write).into_sites();
        apply_divide_mutations(&mut sites, ctx.config, ctx.rng);
        let offspring = Cpu::new(&Genome::from(sites));

        self.memory.resize(read);
        self.reset();
        self.phenotype.roll_over();
        Some(Event::Offspring(Box::new(offspring)))
    }

    /// Bounds `[read, write)` of the offspring, if dividing is allowed.
    fn check_divide(&self, config: &HardwareConfig) -> Result<(usize, usize), Inviable> {
        let len = self.memory.len();
        let read = self.head(HeadKind::Read);
        let write = match self.head(HeadKind::Write) {
            0 => len,
            pos => pos,
        };
        if write <= read {
            return Err(Inviable::EmptyOffspring { read, write });
        }

        let parent_size = read;
        let child_size = write - read;
        let range = config.child_size_range;

        let min = config
            .min_genome_size
            .max((parent_size as f64 / range).ceil() as usize);
        let max = config
            .max_genome_size
            .min((parent_size as f64 * range) as usize);
        if child_size < min || child_size > max {
            return Err(Inviable::OffspringSize {
                size: child_size,
                min,
                max,
            });
        }
        if parent_size < config.min_genome_size || parent_size > config.max_genome_size {
            return Err(Inviable::ParentSize {
                size: parent_size,
                min: config.min_genome_size,
                max: config.max_genome_size,
            });
        }

        let executed = self.memory.count_executed(0, parent_size);
        let required = (config.min_exe_lines * parent_size as f64) as usize;
        if executed < required {
            return Err(Inviable::TooFewExecuted { executed, required });
        }

        let copied = self.memory.count_copied(read, write);
        let required = (config.min_copied_lines * child_size as f64) as usize;
        if copied < required {
            return Err(Inviable::TooFewCopied { copied, required });
        }

        Ok((read, write))
    }

    /// Fresh CPU state over the current memory, as after birth.
    fn reset(&mut self) {
        self.registers = [0; 3];
        self.stacks = Default::default();
        self.active_stack = 0;
        self.heads = [Head::default(); NUM_HEADS];
        self.pending = None;
        self.read_label.clear();
        self.memory.clear_flags();
        self.allocated = false;
        self.divide_failure = None;
    }

    fn io<R: Rng>(&mut self, reg: Register, ctx: &mut ExecContext<'_, R>) -> Event {
        let value = self.register(reg);
        self.history.push_output(value);
        let completed = ctx.tasks.on_output(value, &self.history);
        for task in &completed {
            self.phenotype.task_counts[task.index()] += 1;
        }
        let input = ctx.inputs.next_input();
        self.set_register(reg, input);
        self.history.push_input(input);
        Event::Output { value, completed }
    }
}

fn random_inst<R: Rng>(rng: &mut R) -> Inst {
    Inst(rng.gen_range(0..NUM_OPS as u8))
}

/// Divide-time mutations of an offspring: at most one substitution, one
/// insertion and one deletion, each with its own probability.
fn apply_divide_mutations<R: Rng>(sites: &mut Vec<Inst>, config: &HardwareConfig, rng: &mut R) {
    if sites.is_empty() {
        return;
    }
    if config.divide_mut_prob > 0.0 && rng.gen_bool(config.divide_mut_prob) {
        let pos = rng.gen_range(0..sites.len());
        sites[pos] = random_inst(rng);
    }
    if config.divide_ins_prob > 0.0
        && rng.gen_bool(config.divide_ins_prob)
        && sites.len() < config.max_genome_size
    {
        let pos = rng.gen_range(0..=sites.len());
        let inst = random_inst(rng);
        sites.insert(pos, inst);
    }
    if config.divide_del_prob > 0.0
        && rng.gen_bool(config.divide_del_prob)
        && sites.len() > config.min_genome_size
    {
        let pos = rng.gen_range(0..sites.len());
        sites.remove(pos);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::environment::EnvironmentInputs;
    use crate::tasks::LogicTasks;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn random_genomes_never_escape_memory(
            codes in prop::collection::vec(0u8..32, 8..120),
            seed in any::<u64>(),
        ) {
            let config = HardwareConfig::default();
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut tasks = LogicTasks::new();
            let mut inputs = EnvironmentInputs::new(&mut rng);
            let mut cpu = Cpu::new(&Genome::new(codes.into_iter().map(Inst).collect()));

            for _ in 0..2000 {
                let mut ctx = ExecContext {
                    config: &config,
                    rng: &mut rng,
                    tasks: &mut tasks,
                    inputs: &mut inputs,
                };
                cpu.step(&mut ctx);
                let len = cpu.memory().len();
                prop_assert!(len > 0);
                for kind in [HeadKind::Ip, HeadKind::Read, HeadKind::Write, HeadKind::Flow] {
                    prop_assert!(cpu.head(kind) < len);
                }
                prop_assert!(cpu.active_stack() < 2);
            }
        }
    }
}
