//! Per-sample read alignment stages
//!

use std::process::Command;

use camino::Utf8PathBuf;

use crate::cli::Settings;
use crate::error::PipelineError;
use crate::stage::{require_input, run_stage, run_tool, run_tool_pipe};
use crate::trio::SampleConfig;

/// Read group line keying downstream joint genotyping on the sample name
///
fn read_group_line(sample_name: &str) -> String {
    format!("@RG\\tID:{sample_name}\\tSM:{sample_name}\\tPL:ILLUMINA")
}

/// Align one sample's reads, then sort and index the result
///
/// Aligner output is piped directly into the sorter so no unsorted intermediate lands on
/// disk, the sorted alignment file is the only completion marker for the stage.
///
pub fn align_sample(
    settings: &Settings,
    sample: &SampleConfig,
    thread_share: usize,
) -> Result<(), PipelineError> {
    let stage_name = format!("align-{}", sample.name);
    run_stage(&stage_name, &sample.sorted_bam_filename, || {
        require_input(&stage_name, &sample.reads_filename)?;

        let read_group = read_group_line(&sample.name);
        let mut aligner = Command::new(&settings.bwa_bin);
        aligner.args([
            "mem",
            "-R",
            read_group.as_str(),
            "-t",
            thread_share.to_string().as_str(),
            settings.ref_filename.as_str(),
            sample.reads_filename.as_str(),
        ]);

        let mut sorter = Command::new(&settings.samtools_bin);
        sorter.args([
            "sort",
            "-o",
            sample.sorted_bam_filename.as_str(),
            "-",
        ]);

        run_tool_pipe(&stage_name, &mut aligner, &mut sorter)
    })?;

    let index_stage_name = format!("align-index-{}", sample.name);
    let bai_filename = Utf8PathBuf::from(format!("{}.bai", sample.sorted_bam_filename));
    run_stage(&index_stage_name, &bai_filename, || {
        let mut cmd = Command::new(&settings.samtools_bin);
        cmd.args(["index", sample.sorted_bam_filename.as_str()]);
        run_tool(&index_stage_name, &mut cmd)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_group_line() {
        assert_eq!(
            read_group_line("NA12878"),
            "@RG\\tID:NA12878\\tSM:NA12878\\tPL:ILLUMINA"
        );
    }
}
