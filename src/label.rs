use crate::inst::Nop;
use crate::memory::Memory;

/// A template: a run of no-ops, read as a sequence of nop symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label {
    nops: Vec<Nop>,
}

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, nop: Nop) {
        self.nops.push(nop);
    }

    pub fn clear(&mut self) {
        self.nops.clear();
    }

    pub fn len(&self) -> usize {
        self.nops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nops.is_empty()
    }

    pub fn nops(&self) -> &[Nop] {
        &self.nops
    }

    /// Each symbol replaced by its complement (A→B, B→C, C→A).
    pub fn complement(&self) -> Label {
        Label {
            nops: self.nops.iter().map(|nop| nop.complement()).collect(),
        }
    }
}

impl From<Vec<Nop>> for Label {
    fn from(nops: Vec<Nop>) -> Self {
        Self { nops }
    }
}

/// Read the template beginning at `start`: consecutive no-ops, at most
/// `max_size` of them, never wrapping back onto the site before `start`.
pub fn read_label(memory: &Memory, start: usize, max_size: usize) -> Label {
    let len = memory.len();
    let mut label = Label::new();
    let limit = max_size.min(len.saturating_sub(1));
    while label.len() < limit {
        match memory.get((start + label.len()) % len).nop() {
            Some(nop) => label.push(nop),
            None => break,
        }
    }
    label
}

/// Find the nearest maximal no-op run equal to `target`, scanning `window`
/// sites forward from `from` and wrapping at the end of memory.
///
/// Runs are bounded by non-nops or by the edges of the window. Returns the
/// position of the run's first site.
pub fn find_template(memory: &Memory, from: usize, window: usize, target: &Label) -> Option<usize> {
    let len = memory.len();
    if len == 0 || target.is_empty() {
        return None;
    }
    let window = window.min(len);
    let mut offset = 0;
    while offset < window {
        if memory.get((from + offset) % len).nop().is_none() {
            offset += 1;
            continue;
        }
        let run_start = offset;
        let mut matches = true;
        while offset < window {
            let Some(nop) = memory.get((from + offset) % len).nop() else {
                break;
            };
            let idx = offset - run_start;
            if idx >= target.len() || target.nops()[idx] != nop {
                matches = false;
            }
            offset += 1;
        }
        if matches && offset - run_start == target.len() {
            return Some((from + run_start) % len);
        }
    }
    None
}
