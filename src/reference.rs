//! Reference preparation stages
//!
//! These stages run sequentially before any per-sample work. Each index artifact doubles as
//! the completion marker for its stage, so a re-run only rebuilds missing indexes.
//!

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::cli::Settings;
use crate::error::PipelineError;
use crate::stage::{require_input, run_stage, run_tool};

/// Prepare all reference-derived index artifacts required by the alignment and calling tools
///
pub fn prepare_reference(settings: &Settings) -> Result<(), PipelineError> {
    let ref_path = Utf8Path::new(&settings.ref_filename);
    require_input("reference-prepare", ref_path)?;

    let bwt_filename = Utf8PathBuf::from(format!("{ref_path}.bwt"));
    run_stage("reference-aligner-index", &bwt_filename, || {
        let mut cmd = Command::new(&settings.bwa_bin);
        cmd.args(["index", settings.ref_filename.as_str()]);
        run_tool("reference-aligner-index", &mut cmd)
    })?;

    let fai_filename = Utf8PathBuf::from(format!("{ref_path}.fai"));
    run_stage("reference-fasta-index", &fai_filename, || {
        let mut cmd = Command::new(&settings.samtools_bin);
        cmd.args(["faidx", settings.ref_filename.as_str()]);
        run_tool("reference-fasta-index", &mut cmd)
    })?;

    // The genotyper requires the dictionary adjacent to the reference with the fasta
    // extension replaced rather than appended
    let dict_filename = ref_path.with_extension("dict");
    run_stage("reference-dictionary", &dict_filename, || {
        let mut cmd = Command::new(&settings.samtools_bin);
        cmd.args([
            "dict",
            settings.ref_filename.as_str(),
            "-o",
            dict_filename.as_str(),
        ]);
        run_tool("reference-dictionary", &mut cmd)
    })?;

    Ok(())
}
