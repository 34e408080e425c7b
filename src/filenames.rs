//! Filenames and directory names for pipeline artifacts within the output directory
//!

/// Directory holding per-sample sorted alignment files
pub const ALIGNMENT_DIR: &str = "alignments";

/// Directory holding per-sample variant call files
pub const CALL_DIR: &str = "calls";

/// Directory holding the multi-sample joint-call workspace
pub const JOINT_DIR: &str = "joint";

/// Combined multi-sample workspace file, keyed by sample name
pub const COMBINED_GVCF_FILENAME: &str = "combined.g.vcf.gz";

/// Joint genotyping result over all trio samples
pub const JOINT_VCF_FILENAME: &str = "joint.vcf.gz";

/// Joint call set after quality/depth filtration and target restriction
pub const FILTERED_VCF_FILENAME: &str = "filtered.vcf.gz";

pub const RECESSIVE_VCF_FILENAME: &str = "recessive_candidates.vcf.gz";

pub const DENOVO_VCF_FILENAME: &str = "denovo_candidates.vcf.gz";

pub const RUN_STATS_FILENAME: &str = "run.stats.json";
