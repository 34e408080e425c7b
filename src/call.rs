//! Per-sample variant calling stages
//!

use std::process::Command;

use crate::cli::Settings;
use crate::error::PipelineError;
use crate::stage::{require_input, run_stage, run_tool};
use crate::trio::SampleConfig;

/// Produce one sample's genomic VCF from its sorted alignment file
///
/// The caller's pair-HMM step is the expensive inner computation of the whole pipeline, its
/// thread count is the per-instance share of the global worker budget so that three
/// concurrent callers stay within it.
///
pub fn call_sample(
    settings: &Settings,
    sample: &SampleConfig,
    thread_share: usize,
) -> Result<(), PipelineError> {
    let stage_name = format!("call-{}", sample.name);
    run_stage(&stage_name, &sample.gvcf_filename, || {
        require_input(&stage_name, &sample.sorted_bam_filename)?;

        let mut caller = Command::new(&settings.gatk_bin);
        caller.args([
            "HaplotypeCaller",
            "-R",
            settings.ref_filename.as_str(),
            "-I",
            sample.sorted_bam_filename.as_str(),
            "-O",
            sample.gvcf_filename.as_str(),
            "-ERC",
            "GVCF",
            "--native-pair-hmm-threads",
            thread_share.to_string().as_str(),
        ]);
        run_tool(&stage_name, &mut caller)
    })?;

    Ok(())
}
