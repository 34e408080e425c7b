//! Joint aggregation of per-sample calls into one filtered multi-sample call set
//!
//! The three sub-stages here are strictly dependent and never run concurrently: each one's
//! output artifact is the next one's required input.
//!

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::cli::Settings;
use crate::error::PipelineError;
use crate::filenames::{COMBINED_GVCF_FILENAME, FILTERED_VCF_FILENAME, JOINT_DIR, JOINT_VCF_FILENAME};
use crate::stage::{require_input, run_stage, run_tool};
use crate::trio::Trio;

/// Artifact paths of the joint-call workspace
pub struct JointPaths {
    pub joint_dir: Utf8PathBuf,

    /// Combined multi-sample workspace, keyed by the sample names carried in each input
    pub combined_gvcf: Utf8PathBuf,

    /// Jointly genotyped call set over all trio samples
    pub joint_vcf: Utf8PathBuf,

    /// Joint call set after quality/depth filtration and target restriction
    pub filtered_vcf: Utf8PathBuf,
}

impl JointPaths {
    pub fn new(output_dir: &Utf8Path) -> Self {
        let joint_dir = output_dir.join(JOINT_DIR);
        Self {
            combined_gvcf: joint_dir.join(COMBINED_GVCF_FILENAME),
            joint_vcf: joint_dir.join(JOINT_VCF_FILENAME),
            filtered_vcf: joint_dir.join(FILTERED_VCF_FILENAME),
            joint_dir,
        }
    }
}

fn filter_expression(min_qual: f64, min_depth: u32) -> String {
    format!("QUAL>={min_qual} && INFO/DP>={min_depth}")
}

/// Run the combine, joint-genotype and filter sub-stages in fixed sequence
///
pub fn run_joint_aggregation(
    settings: &Settings,
    trio: &Trio,
    paths: &JointPaths,
) -> Result<(), PipelineError> {
    run_stage("joint-combine", &paths.combined_gvcf, || {
        for sample in trio.samples() {
            require_input("joint-combine", &sample.gvcf_filename)?;
        }

        let mut cmd = Command::new(&settings.gatk_bin);
        cmd.args(["CombineGVCFs", "-R", settings.ref_filename.as_str()]);
        for sample in trio.samples() {
            cmd.args(["-V", sample.gvcf_filename.as_str()]);
        }
        cmd.args(["-O", paths.combined_gvcf.as_str()]);
        run_tool("joint-combine", &mut cmd)
    })?;

    run_stage("joint-genotype", &paths.joint_vcf, || {
        require_input("joint-genotype", &paths.combined_gvcf)?;

        let mut cmd = Command::new(&settings.gatk_bin);
        cmd.args([
            "GenotypeGVCFs",
            "-R",
            settings.ref_filename.as_str(),
            "-V",
            paths.combined_gvcf.as_str(),
            "-O",
            paths.joint_vcf.as_str(),
        ]);
        run_tool("joint-genotype", &mut cmd)
    })?;

    run_stage("joint-filter", &paths.filtered_vcf, || {
        require_input("joint-filter", &paths.joint_vcf)?;

        let expr = filter_expression(settings.min_qual, settings.min_depth);
        let mut cmd = Command::new(&settings.bcftools_bin);
        cmd.args([
            "view",
            "-i",
            expr.as_str(),
            "-R",
            settings.targets_filename.as_str(),
            "-Oz",
            "-o",
            paths.filtered_vcf.as_str(),
            paths.joint_vcf.as_str(),
        ]);
        run_tool("joint-filter", &mut cmd)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_paths() {
        let paths = JointPaths::new(Utf8Path::new("/run/out"));
        assert_eq!(
            paths.combined_gvcf,
            Utf8PathBuf::from("/run/out/joint/combined.g.vcf.gz")
        );
        assert_eq!(
            paths.filtered_vcf,
            Utf8PathBuf::from("/run/out/joint/filtered.vcf.gz")
        );
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(filter_expression(30.0, 10), "QUAL>=30 && INFO/DP>=10");
        assert_eq!(filter_expression(12.5, 4), "QUAL>=12.5 && INFO/DP>=4");
    }
}
