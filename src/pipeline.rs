//! Top-level pipeline driver
//!
//! Stages run in strict order: reference preparation, per-sample alignment (fan-out),
//! per-sample calling (fan-out), joint aggregation, inheritance classification (fan-out),
//! workspace cleanup. Any stage failure halts the run so later stages never see incomplete
//! upstream output.
//!

use std::sync::Mutex;

use camino::Utf8PathBuf;
use log::info;

use crate::align::align_sample;
use crate::call::call_sample;
use crate::classify::{InheritancePattern, classify_pattern};
use crate::cli::{Settings, TrioInput};
use crate::error::PipelineError;
use crate::filenames::{ALIGNMENT_DIR, CALL_DIR, DENOVO_VCF_FILENAME, RECESSIVE_VCF_FILENAME};
use crate::joint::{JointPaths, run_joint_aggregation};
use crate::os_utils::{create_dir_all, remove_transient_file};
use crate::reference::prepare_reference;
use crate::resources::partition_budget;
use crate::run_stats::{RunStats, write_run_stats};
use crate::scheduler::{FanOutTask, run_fan_out};
use crate::stage::{completion_marker_path, run_stage};
use crate::trio::Trio;

pub fn run_pipeline(settings: &Settings, trio_input: &TrioInput) -> Result<(), PipelineError> {
    let trio = Trio::new(trio_input, &settings.output_dir);
    let joint_paths = JointPaths::new(&settings.output_dir);

    create_dir_all(&settings.output_dir.join(ALIGNMENT_DIR), "alignment");
    create_dir_all(&settings.output_dir.join(CALL_DIR), "call");
    create_dir_all(&joint_paths.joint_dir, "joint workspace");

    info!("Preparing reference indexes");
    prepare_reference(settings)?;

    let sample_count = trio.samples().len();
    let thread_share = partition_budget(settings.thread_count, sample_count);

    info!("Aligning {sample_count} samples ({thread_share} thread(s) per aligner)");
    let align_tasks = trio
        .samples()
        .into_iter()
        .map(|sample| {
            FanOutTask::new(&format!("{} ({})", sample.name, sample.role), move || {
                align_sample(settings, sample, thread_share)
            })
        })
        .collect::<Vec<_>>();
    run_fan_out("align", align_tasks)?;

    info!("Calling variants in {sample_count} samples ({thread_share} thread(s) per caller)");
    let call_tasks = trio
        .samples()
        .into_iter()
        .map(|sample| {
            FanOutTask::new(&format!("{} ({})", sample.name, sample.role), move || {
                call_sample(settings, sample, thread_share)
            })
        })
        .collect::<Vec<_>>();
    run_fan_out("call", call_tasks)?;

    info!("Aggregating per-sample calls into the joint call set");
    run_joint_aggregation(settings, &trio, &joint_paths)?;

    info!("Classifying inheritance patterns");
    let recessive_vcf = settings.output_dir.join(RECESSIVE_VCF_FILENAME);
    let denovo_vcf = settings.output_dir.join(DENOVO_VCF_FILENAME);

    // Both classification tasks are pure readers of the same immutable filtered call set,
    // so they can run concurrently
    let recessive_stats = Mutex::new(None);
    let denovo_stats = Mutex::new(None);
    {
        let classify_tasks = vec![
            FanOutTask::new("recessive", || {
                run_stage("classify-recessive", &recessive_vcf, || {
                    let stats = classify_pattern(
                        &trio,
                        &joint_paths.filtered_vcf,
                        &recessive_vcf,
                        InheritancePattern::Recessive,
                    )?;
                    *recessive_stats.lock().unwrap() = Some(stats);
                    Ok(())
                })
                .map(|_| ())
            }),
            FanOutTask::new("denovo", || {
                run_stage("classify-denovo", &denovo_vcf, || {
                    let stats = classify_pattern(
                        &trio,
                        &joint_paths.filtered_vcf,
                        &denovo_vcf,
                        InheritancePattern::DeNovo,
                    )?;
                    *denovo_stats.lock().unwrap() = Some(stats);
                    Ok(())
                })
                .map(|_| ())
            }),
        ];
        run_fan_out("classify", classify_tasks)?;
    }

    if !settings.keep_intermediates {
        info!("Cleaning up joint-call workspace");
        remove_transient_file(&joint_paths.combined_gvcf);
        remove_transient_file(&Utf8PathBuf::from(format!(
            "{}.tbi",
            joint_paths.combined_gvcf
        )));
        remove_transient_file(&completion_marker_path(&joint_paths.combined_gvcf));
    }

    let run_stats = RunStats {
        sample_names: trio
            .sample_names()
            .into_iter()
            .map(|x| x.to_string())
            .collect(),
        recessive: recessive_stats.into_inner().unwrap(),
        denovo: denovo_stats.into_inner().unwrap(),
    };
    write_run_stats(&settings.output_dir, &run_stats);

    info!("Candidate call sets written: '{recessive_vcf}', '{denovo_vcf}'");
    Ok(())
}
