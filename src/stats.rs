//! Summary counters over a packing run, used by the CLI and worker reports.

use crate::types::PackerData;

#[derive(Debug, Default)]
pub struct PackStats {
    pub input_len: usize,
    pub strategies: usize,
    pub best_strategy: String,
    pub best_length: i64,
    pub total_replacements: usize,
}

impl PackStats {
    pub fn from_results(input: &str, results: &[PackerData]) -> Self {
        let mut stats = PackStats {
            input_len: input.len(),
            strategies: results.len(),
            best_length: -1,
            ..PackStats::default()
        };
        for data in results {
            let stage = data.best_stage();
            if stage.length >= 0 && (stats.best_length < 0 || stage.length < stats.best_length) {
                stats.best_length = stage.length;
                stats.best_strategy = data.strategy.clone();
            }
            stats.total_replacements += data.replacements.len();
        }
        stats
    }

    pub fn report(&self) -> String {
        if self.best_length < 0 {
            return format!(
                "{} strategies, none packed the {}-byte input",
                self.strategies, self.input_len
            );
        }
        let ratio = 100.0 * (1.0 - self.best_length as f64 / self.input_len.max(1) as f64);
        format!(
            "{} -> {} bytes ({:.2}%) via {}, {} replacements across {} strategies",
            self.input_len,
            self.best_length,
            ratio,
            self.best_strategy,
            self.total_replacements,
            self.strategies
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pack, PackerOptions};

    #[test]
    fn best_stage_is_picked_across_strategies() {
        let opts = PackerOptions { look_ahead_depth: 2, ..PackerOptions::default() };
        let input = "one two one two one two one two one two";
        let results = pack(input, &opts);
        let stats = PackStats::from_results(input, &results);
        assert_eq!(stats.strategies, 3);
        assert!(stats.best_length > 0);
        assert!(!stats.best_strategy.is_empty());
        assert!(stats.report().contains("via"));
    }
}
