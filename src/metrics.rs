use std::collections::{HashMap, HashSet};

use crate::genome::Genome;
use crate::inst::NUM_OPS;
use crate::population::Population;
use crate::tasks::Task;

/// Compute the high-order entropy (HOE) of a byte slice.
///
/// HOE = compressed_size / raw_size, where compression uses brotli at quality 2.
/// This approximates the normalized Kolmogorov complexity of the data.
///
/// Returns a value typically between 0 and 1, where:
/// - ~1.0 means the data is incompressible (random)
/// - <<1.0 means the data is highly structured/repetitive
///
/// Instruction codes use fewer than 5 of the 8 bits per byte, so random
/// genomes already land well below 1.0.
pub fn high_order_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut compressed = Vec::new();
    let params = brotli::enc::BrotliEncoderParams {
        quality: 2,
        ..Default::default()
    };
    if brotli::BrotliCompress(&mut &data[..], &mut compressed, &params).is_err() {
        return 1.0;
    }

    compressed.len() as f64 / data.len() as f64
}

/// Count the number of distinct genomes.
pub fn unique_genome_count(genomes: &[Genome]) -> usize {
    genomes.iter().collect::<HashSet<_>>().len()
}

/// The most abundant genome and its count. Ties go to the genome seen
/// first.
pub fn dominant_genome(genomes: &[Genome]) -> Option<(&Genome, usize)> {
    let mut counts: HashMap<&Genome, (usize, usize)> = HashMap::new();
    for (i, genome) in genomes.iter().enumerate() {
        counts.entry(genome).or_insert((0, i)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(genome, (count, _))| (genome, count))
}

/// Instruction frequencies across all genomes. Codes outside the alphabet
/// are not counted.
pub fn instruction_histogram(genomes: &[Genome]) -> [usize; NUM_OPS] {
    let mut hist = [0usize; NUM_OPS];
    for genome in genomes {
        for inst in genome.sites() {
            if let Some(op) = inst.op() {
                hist[op.code() as usize] += 1;
            }
        }
    }
    hist
}

pub fn average_length(genomes: &[Genome]) -> f64 {
    if genomes.is_empty() {
        return 0.0;
    }
    genomes.iter().map(Genome::len).sum::<usize>() as f64 / genomes.len() as f64
}

/// Number of organisms that performed each task during their last
/// completed gestation.
pub fn task_totals(population: &Population) -> [usize; Task::COUNT] {
    let mut totals = [0usize; Task::COUNT];
    for organism in population.organisms() {
        let counts = &organism.cpu().phenotype().last_task_counts;
        for (total, &count) in totals.iter_mut().zip(counts) {
            if count > 0 {
                *total += 1;
            }
        }
    }
    totals
}

/// Mean of the last gestation time over organisms that have divided.
pub fn average_gestation(population: &Population) -> Option<f64> {
    let times: Vec<u64> = population
        .organisms()
        .filter_map(|o| o.cpu().phenotype().last_gestation_time)
        .collect();
    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<u64>() as f64 / times.len() as f64)
    }
}

/// One row of the CSV written by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub update: u64,
    pub organisms: usize,
    pub unique_genomes: usize,
    pub hoe: f64,
    pub average_length: f64,
    pub average_gestation: Option<f64>,
    pub max_generation: u64,
    pub tasks: [usize; Task::COUNT],
}

impl Snapshot {
    pub fn capture(population: &Population) -> Self {
        let genomes = population.genomes();
        Self {
            update: population.updates(),
            organisms: genomes.len(),
            unique_genomes: unique_genome_count(&genomes),
            hoe: high_order_entropy(&population.population_bytes()),
            average_length: average_length(&genomes),
            average_gestation: average_gestation(population),
            max_generation: population.organisms().map(|o| o.generation()).max().unwrap_or(0),
            tasks: task_totals(population),
        }
    }

    pub fn csv_header() -> String {
        let mut header = String::from(
            "update,organisms,unique_genomes,hoe,average_length,average_gestation,max_generation",
        );
        for task in Task::ALL {
            header.push(',');
            header.push_str(task.name());
        }
        header
    }

    pub fn csv_row(&self) -> String {
        let gestation = self
            .average_gestation
            .map_or(String::new(), |g| format!("{g:.2}"));
        let mut row = format!(
            "{},{},{},{:.6},{:.2},{},{}",
            self.update,
            self.organisms,
            self.unique_genomes,
            self.hoe,
            self.average_length,
            gestation,
            self.max_generation
        );
        for count in self.tasks {
            row.push_str(&format!(",{count}"));
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BirthMethod, Config};
    use crate::genome::DEFAULT_ANCESTOR;

    fn genomes(texts: &[&str]) -> Vec<Genome> {
        texts.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn test_hoe_random_data_near_one() {
        // Pseudorandom data should be near-incompressible.
        use rand::Rng;
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(12345);
        let data: Vec<u8> = (0..8192).map(|_| rng.r#gen()).collect();
        let hoe = high_order_entropy(&data);
        assert!(hoe > 0.9, "HOE of random data should be near 1.0, got {hoe}");
    }

    #[test]
    fn test_hoe_repeated_data_low() {
        let data = vec![7u8; 8192];
        let hoe = high_order_entropy(&data);
        assert!(hoe < 0.1, "HOE of repeated data should be well below 1.0, got {hoe}");
    }

    #[test]
    fn test_hoe_empty() {
        assert_eq!(high_order_entropy(&[]), 0.0);
    }

    #[test]
    fn test_unique_genome_count() {
        assert_eq!(unique_genome_count(&genomes(&["abc", "abc", "abd"])), 2);
        assert_eq!(unique_genome_count(&[]), 0);
    }

    #[test]
    fn test_dominant_genome() {
        let pop = genomes(&["abd", "abc", "abc", "abd", "zzz"]);
        let (genome, count) = dominant_genome(&pop).unwrap();
        assert_eq!(genome.to_string(), "abd");
        assert_eq!(count, 2);
        assert!(dominant_genome(&[]).is_none());
    }

    #[test]
    fn test_instruction_histogram() {
        let hist = instruction_histogram(&genomes(&["aab", "zb"]));
        assert_eq!(hist[0], 2);
        assert_eq!(hist[1], 2);
        assert_eq!(hist[25], 1);
        assert_eq!(hist.iter().sum::<usize>(), 5);
    }

    #[test]
    fn test_average_length() {
        assert_eq!(average_length(&genomes(&["ab", "abcd"])), 3.0);
        assert_eq!(average_length(&[]), 0.0);
    }

    #[test]
    fn test_snapshot_row_matches_header() {
        let ancestor: Genome = DEFAULT_ANCESTOR.parse().unwrap();
        let mut config = Config::default();
        config.world.population_size = 20;
        config.world.birth_method = BirthMethod::EmptyFirst;
        config.hardware = config.hardware.without_mutations();
        let mut pop = Population::new(config, &ancestor, 11);
        for _ in 0..10 {
            pop.update();
        }
        let snapshot = Snapshot::capture(&pop);
        assert_eq!(snapshot.update, 10);
        assert!(snapshot.organisms > 1);
        assert_eq!(snapshot.unique_genomes, 1);
        assert_eq!(snapshot.average_length, DEFAULT_ANCESTOR.len() as f64);
        assert_eq!(snapshot.average_gestation, Some(80.0));
        assert_eq!(
            snapshot.csv_row().split(',').count(),
            Snapshot::csv_header().split(',').count()
        );
    }
}
