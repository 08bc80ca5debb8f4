use crate::genome::Genome;
use crate::inst::{Inst, Op};

/// Per-site bookkeeping used by divide viability checks and displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteFlags {
    /// Written by `h-copy` during this gestation.
    pub copied: bool,
    /// Executed (or read as a template) during this gestation.
    pub executed: bool,
    /// Written by a copy mutation.
    pub mutated: bool,
}

/// The instruction store an organism executes from and copies into.
///
/// Starts as the organism's genome; `h-alloc` grows it with room for the
/// offspring and `h-divide` cuts it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    sites: Vec<Inst>,
    flags: Vec<SiteFlags>,
}

impl Memory {
    pub fn from_genome(genome: &Genome) -> Self {
        let sites = genome.sites().to_vec();
        let flags = vec![SiteFlags::default(); sites.len()];
        Self { sites, flags }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Instruction at `pos`. `pos` must already be in range.
    #[inline(always)]
    pub fn get(&self, pos: usize) -> Inst {
        self.sites[pos]
    }

    #[inline(always)]
    pub fn set(&mut self, pos: usize, inst: Inst) {
        self.sites[pos] = inst;
    }

    pub fn sites(&self) -> &[Inst] {
        &self.sites
    }

    pub fn flags(&self, pos: usize) -> SiteFlags {
        self.flags[pos]
    }

    pub fn flags_mut(&mut self, pos: usize) -> &mut SiteFlags {
        &mut self.flags[pos]
    }

    /// Grow (filling with nop-A) or shrink to `new_len` sites.
    pub fn resize(&mut self, new_len: usize) {
        self.sites.resize(new_len, Inst::from(Op::NopA));
        self.flags.resize(new_len, SiteFlags::default());
    }

    pub fn clear_flags(&mut self) {
        self.flags.fill(SiteFlags::default());
    }

    /// Number of sites in `start..end` flagged as executed.
    pub fn count_executed(&self, start: usize, end: usize) -> usize {
        self.flags[start..end].iter().filter(|f| f.executed).count()
    }

    /// Number of sites in `start..end` flagged as copied.
    pub fn count_copied(&self, start: usize, end: usize) -> usize {
        self.flags[start..end].iter().filter(|f| f.copied).count()
    }

    /// Copy out `start..end` as a genome.
    pub fn extract(&self, start: usize, end: usize) -> Genome {
        Genome::new(self.sites[start..end].to_vec())
    }

    /// The whole store as a genome.
    pub fn to_genome(&self) -> Genome {
        Genome::new(self.sites.clone())
    }
}
