use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::GenomeError;
use crate::inst::{Inst, Op};

/// A minimal self-replicator: allocate, point the write-head past the
/// parent, copy until the copied label matches, divide.
pub const DEFAULT_ANCESTOR: &str = "razcvxztycasvab";

/// An organism's genetic program: one instruction per site.
///
/// The text encoding is one lowercase letter per instruction, so a genome
/// round-trips through `to_string` / `parse` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Genome {
    sites: Vec<Inst>,
}

impl Genome {
    pub fn new(sites: Vec<Inst>) -> Self {
        Self { sites }
    }

    /// Load a genome from a file holding its text encoding. Surrounding
    /// whitespace is ignored.
    pub fn load(path: &Path) -> Result<Self, GenomeError> {
        let text = fs::read_to_string(path)?;
        text.trim().parse()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[Inst] {
        &self.sites
    }

    pub fn into_sites(self) -> Vec<Inst> {
        self.sites
    }

    /// One line per site: address, symbol and mnemonic.
    pub fn disassemble(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for (addr, &inst) in self.sites.iter().enumerate() {
            let name = inst.op().map_or("(unknown)", Op::name);
            let _ = writeln!(out, "{addr:04}: {}  {name}", inst.symbol());
        }
        out
    }
}

impl FromStr for Genome {
    type Err = GenomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(GenomeError::Empty);
        }
        let sites = s
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                Op::from_symbol(symbol)
                    .map(Inst::from)
                    .ok_or(GenomeError::InvalidSymbol { position, symbol })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sites })
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.sites {
            write!(f, "{}", inst.symbol())?;
        }
        Ok(())
    }
}

impl From<Vec<Inst>> for Genome {
    fn from(sites: Vec<Inst>) -> Self {
        Self { sites }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::inst::NUM_OPS;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn text_round_trip(codes in prop::collection::vec(0u8..NUM_OPS as u8, 1..300)) {
            let genome = Genome::new(codes.into_iter().map(Inst).collect());
            let parsed: Genome = genome.to_string().parse().unwrap();
            prop_assert_eq!(parsed, genome);
        }

        #[test]
        fn parse_accepts_exactly_lowercase(text in "[a-z]{1,100}") {
            let genome: Genome = text.parse().unwrap();
            prop_assert_eq!(genome.to_string(), text);
        }
    }
}
