/// The heads-based instruction set.
///
/// Twenty-six instructions, one per lowercase letter. The first three are
/// no-ops that double as operand modifiers and template symbols; the rest
/// operate on the register file, the stacks and the four heads.
///
/// Instructions live in memory as raw codes (`Inst`) so that a genome can
/// carry codes outside the alphabet. Those decode to `None` and execute as
/// inert no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Op {
    NopA = 0,
    NopB,
    NopC,
    IfNEqu,
    IfLess,
    Pop,
    Push,
    SwapStk,
    Swap,
    ShiftR,
    ShiftL,
    Inc,
    Dec,
    Add,
    Sub,
    Nand,
    Io,
    HAlloc,
    HDivide,
    HCopy,
    HSearch,
    MovHead,
    JmpHead,
    GetHead,
    IfLabel,
    SetFlow,
}

/// Number of instructions in the alphabet.
pub const NUM_OPS: usize = 26;

const ALL_OPS: [Op; NUM_OPS] = [
    Op::NopA,
    Op::NopB,
    Op::NopC,
    Op::IfNEqu,
    Op::IfLess,
    Op::Pop,
    Op::Push,
    Op::SwapStk,
    Op::Swap,
    Op::ShiftR,
    Op::ShiftL,
    Op::Inc,
    Op::Dec,
    Op::Add,
    Op::Sub,
    Op::Nand,
    Op::Io,
    Op::HAlloc,
    Op::HDivide,
    Op::HCopy,
    Op::HSearch,
    Op::MovHead,
    Op::JmpHead,
    Op::GetHead,
    Op::IfLabel,
    Op::SetFlow,
];

impl Op {
    /// All instructions in code order.
    pub fn all() -> &'static [Op; NUM_OPS] {
        &ALL_OPS
    }

    /// Decode a raw instruction code.
    pub fn from_code(code: u8) -> Option<Op> {
        ALL_OPS.get(code as usize).copied()
    }

    /// Look up an instruction by its one-letter symbol.
    pub fn from_symbol(symbol: char) -> Option<Op> {
        if symbol.is_ascii_lowercase() {
            Op::from_code(symbol as u8 - b'a')
        } else {
            None
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> char {
        (b'a' + self as u8) as char
    }

    /// The no-op this instruction represents, if it is one.
    pub fn nop(self) -> Option<Nop> {
        match self {
            Op::NopA => Some(Nop::A),
            Op::NopB => Some(Nop::B),
            Op::NopC => Some(Nop::C),
            _ => None,
        }
    }

    /// Short mnemonic, as shown next to the symbol in disassembly.
    pub fn name(self) -> &'static str {
        match self {
            Op::NopA => "nop-A",
            Op::NopB => "nop-B",
            Op::NopC => "nop-C",
            Op::IfNEqu => "if-n-equ",
            Op::IfLess => "if-less",
            Op::Pop => "pop",
            Op::Push => "push",
            Op::SwapStk => "swap-stk",
            Op::Swap => "swap",
            Op::ShiftR => "shift-r",
            Op::ShiftL => "shift-l",
            Op::Inc => "inc",
            Op::Dec => "dec",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Nand => "nand",
            Op::Io => "IO",
            Op::HAlloc => "h-alloc",
            Op::HDivide => "h-divide",
            Op::HCopy => "h-copy",
            Op::HSearch => "h-search",
            Op::MovHead => "mov-head",
            Op::JmpHead => "jmp-head",
            Op::GetHead => "get-head",
            Op::IfLabel => "if-label",
            Op::SetFlow => "set-flow",
        }
    }

    /// What the instruction does, in one or two sentences.
    pub fn description(self) -> &'static str {
        match self {
            Op::NopA | Op::NopB | Op::NopC => {
                "Does nothing when executed. Changes which register or head the \
                 next instruction operates on, and forms templates that mark \
                 positions in the genome."
            }
            Op::IfNEqu => {
                "Compares BX with its complement register. The next instruction \
                 runs only if they differ; otherwise it is skipped."
            }
            Op::IfLess => {
                "Compares BX with its complement register. The next instruction \
                 runs only if BX is smaller; otherwise it is skipped."
            }
            Op::Pop => "Removes the top value of the active stack and places it in BX.",
            Op::Push => "Pushes a copy of BX onto the active stack. BX is unchanged.",
            Op::SwapStk => "Toggles which of the two stacks is active.",
            Op::Swap => "Exchanges the contents of BX and its complement register.",
            Op::ShiftR => "Shifts BX right by one bit, halving it and rounding down.",
            Op::ShiftL => {
                "Shifts BX left by one bit, filling with zero and dropping any bit \
                 beyond the 32nd."
            }
            Op::Inc => "Adds one to BX.",
            Op::Dec => "Subtracts one from BX.",
            Op::Add => "Places BX + CX in BX.",
            Op::Sub => "Places BX - CX in BX.",
            Op::Nand => "Places the bitwise NAND of BX and CX in BX.",
            Op::Io => {
                "Outputs BX, checking it for completed tasks, then reads a new \
                 input into BX."
            }
            Op::HAlloc => {
                "Extends memory by the largest amount the organism may use for \
                 its offspring. AX receives the previous size."
            }
            Op::HDivide => {
                "Splits off an offspring. The organism keeps its memory up to the \
                 read-head; the offspring receives everything from the read-head \
                 to the write-head; anything past the write-head is discarded."
            }
            Op::HCopy => {
                "Copies the instruction under the read-head to the write-head and \
                 advances both. With a non-zero copy mutation rate a random \
                 instruction may be written instead."
            }
            Op::HSearch => {
                "Reads the template that follows and finds its complement. BX gets \
                 the distance to it, CX the template size, and the flow-head is \
                 placed on it. Without a template BX and CX are zeroed and the \
                 flow-head lands on the next instruction."
            }
            Op::MovHead => "Moves the instruction pointer to the flow-head.",
            Op::JmpHead => "Moves the instruction pointer by the amount in CX.",
            Op::GetHead => "Copies the position of the instruction pointer into CX.",
            Op::IfLabel => {
                "Reads the template that follows. The next instruction runs only \
                 if the complement of that template was the most recent run of \
                 instructions copied."
            }
            Op::SetFlow => "Moves the flow-head to the position held in CX.",
        }
    }
}

/// A raw instruction code as stored in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Inst(pub u8);

impl Inst {
    pub fn op(self) -> Option<Op> {
        Op::from_code(self.0)
    }

    pub fn nop(self) -> Option<Nop> {
        self.op().and_then(Op::nop)
    }

    pub fn is_nop(self) -> bool {
        self.nop().is_some()
    }

    /// Symbol for display. Codes outside the alphabet render as `?`.
    pub fn symbol(self) -> char {
        self.op().map_or('?', Op::symbol)
    }
}

impl From<Op> for Inst {
    fn from(op: Op) -> Self {
        Inst(op.code())
    }
}

/// One of the three reserved no-ops.
///
/// As a modifier a nop names a register (A→AX, B→BX, C→CX) or a head
/// (A→IP, B→read, C→write). As a template symbol its complement is the
/// next nop in the cycle A→B→C→A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nop {
    A,
    B,
    C,
}

impl Nop {
    pub fn complement(self) -> Nop {
        match self {
            Nop::A => Nop::B,
            Nop::B => Nop::C,
            Nop::C => Nop::A,
        }
    }

    pub fn op(self) -> Op {
        match self {
            Nop::A => Op::NopA,
            Nop::B => Op::NopB,
            Nop::C => Op::NopC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_round_trip() {
        for &op in Op::all() {
            assert_eq!(Op::from_symbol(op.symbol()), Some(op));
            assert_eq!(Op::from_code(op.code()), Some(op));
        }
        assert_eq!(Op::all()[0].symbol(), 'a');
        assert_eq!(Op::all()[NUM_OPS - 1].symbol(), 'z');
    }

    #[test]
    fn test_symbol_table() {
        assert_eq!(Op::from_symbol('d'), Some(Op::IfNEqu));
        assert_eq!(Op::from_symbol('q'), Some(Op::Io));
        assert_eq!(Op::from_symbol('r'), Some(Op::HAlloc));
        assert_eq!(Op::from_symbol('s'), Some(Op::HDivide));
        assert_eq!(Op::from_symbol('t'), Some(Op::HCopy));
        assert_eq!(Op::from_symbol('u'), Some(Op::HSearch));
        assert_eq!(Op::from_symbol('y'), Some(Op::IfLabel));
        assert_eq!(Op::from_symbol('z'), Some(Op::SetFlow));
    }

    #[test]
    fn test_unknown_symbols() {
        assert_eq!(Op::from_symbol('A'), None);
        assert_eq!(Op::from_symbol('{'), None);
        assert_eq!(Op::from_symbol('0'), None);
        assert_eq!(Op::from_code(26), None);
        assert_eq!(Inst(200).op(), None);
        assert_eq!(Inst(200).symbol(), '?');
        assert!(!Inst(200).is_nop());
    }

    #[test]
    fn test_every_op_is_described() {
        for &op in Op::all() {
            assert!(!op.name().is_empty());
            assert!(!op.description().is_empty());
        }
        assert_eq!(Op::HSearch.name(), "h-search");
    }

    #[test]
    fn test_only_first_three_are_nops() {
        let nops: Vec<Op> = Op::all().iter().copied().filter(|op| op.nop().is_some()).collect();
        assert_eq!(nops, vec![Op::NopA, Op::NopB, Op::NopC]);
    }

    #[test]
    fn test_complement_cycle() {
        assert_eq!(Nop::A.complement(), Nop::B);
        assert_eq!(Nop::B.complement(), Nop::C);
        assert_eq!(Nop::C.complement(), Nop::A);
        for nop in [Nop::A, Nop::B, Nop::C] {
            assert_eq!(nop.complement().complement().complement(), nop);
            assert_eq!(nop.op().nop(), Some(nop));
        }
    }
}
