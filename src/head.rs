use crate::inst::Nop;

/// The four heads of the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadKind {
    Ip = 0,
    Read = 1,
    Write = 2,
    Flow = 3,
}

pub const NUM_HEADS: usize = 4;

impl HeadKind {
    /// Head selected by a nop modifier. The flow-head cannot be selected.
    pub fn from_nop(nop: Nop) -> HeadKind {
        match nop {
            Nop::A => HeadKind::Ip,
            Nop::B => HeadKind::Read,
            Nop::C => HeadKind::Write,
        }
    }
}

/// A cursor into memory. Every update wraps modulo the memory length, so a
/// head is always a valid index into non-empty memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Head {
    pos: usize,
}

impl Head {
    #[inline(always)]
    pub fn position(self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn set(&mut self, pos: usize, len: usize) {
        self.pos = if len == 0 { 0 } else { pos % len };
    }

    #[inline(always)]
    pub fn advance(&mut self, len: usize) {
        self.set(self.pos + 1, len);
    }

    /// Move by a signed offset, wrapping in both directions.
    pub fn jump(&mut self, offset: i64, len: usize) {
        if len == 0 {
            self.pos = 0;
            return;
        }
        let target = (self.pos as i64 + offset).rem_euclid(len as i64);
        self.pos = target as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let mut head = Head::default();
        head.set(4, 5);
        head.advance(5);
        assert_eq!(head.position(), 0);
    }

    #[test]
    fn test_set_wraps() {
        let mut head = Head::default();
        head.set(12, 5);
        assert_eq!(head.position(), 2);
    }

    #[test]
    fn test_jump_backwards_wraps() {
        let mut head = Head::default();
        head.set(1, 10);
        head.jump(-3, 10);
        assert_eq!(head.position(), 8);
        head.jump(25, 10);
        assert_eq!(head.position(), 3);
    }

    #[test]
    fn test_empty_memory_pins_to_zero() {
        let mut head = Head::default();
        head.set(3, 0);
        head.advance(0);
        head.jump(-1, 0);
        assert_eq!(head.position(), 0);
    }

    #[test]
    fn test_nop_head_mapping() {
        assert_eq!(HeadKind::from_nop(Nop::A), HeadKind::Ip);
        assert_eq!(HeadKind::from_nop(Nop::B), HeadKind::Read);
        assert_eq!(HeadKind::from_nop(Nop::C), HeadKind::Write);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn head_updates_stay_in_range(
            start in any::<usize>(),
            offset in any::<i32>(),
            len in 1usize..5000,
        ) {
            let mut head = Head::default();
            head.set(start, len);
            prop_assert!(head.position() < len);
            head.advance(len);
            prop_assert!(head.position() < len);
            head.jump(offset as i64, len);
            prop_assert!(head.position() < len);
        }
    }
}
