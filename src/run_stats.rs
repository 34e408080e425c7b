//! Track stats for the whole trioscope run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::classify::ClassifyStats;
use crate::filenames::RUN_STATS_FILENAME;

#[derive(Deserialize, Serialize)]
pub struct RunStats {
    /// Trio sample names in child, father, mother order
    pub sample_names: Vec<String>,

    /// None when the classification stage was skipped as already complete
    pub recessive: Option<ClassifyStats>,

    pub denovo: Option<ClassifyStats>,
}

/// Write run_stats structure out in json format
pub fn write_run_stats(output_dir: &Utf8Path, run_stats: &RunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stats_serialization() {
        let run_stats = RunStats {
            sample_names: vec!["c".to_string(), "f".to_string(), "m".to_string()],
            recessive: Some(ClassifyStats {
                record_count: 10,
                malformed_record_count: 1,
                candidate_count: 2,
            }),
            denovo: None,
        };

        let json = serde_json::to_string(&run_stats).unwrap();
        let restored: RunStats = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.sample_names, run_stats.sample_names);
        assert_eq!(restored.recessive.as_ref().unwrap().candidate_count, 2);
        assert!(restored.denovo.is_none());
    }
}
