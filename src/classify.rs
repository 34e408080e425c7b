//! Inheritance-pattern classification of the filtered joint call set
//!
//! Classification is a pure per-record operation: each record's three genotype calls are
//! resolved through the trio's named roles and tested against each pattern predicate
//! independently. A record may match neither, either, or both patterns.
//!

use camino::Utf8Path;
use log::{info, warn};
use rust_htslib::bcf::record::GenotypeAllele;
use rust_htslib::bcf::{self, Read};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::trio::Trio;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Genotype {
    HomRef,
    Het,
    HomAlt,

    /// No usable call for this sample at this site. Missing never matches any predicate
    /// position.
    Missing,
}

/// One record's genotype calls resolved to trio roles
#[derive(Clone, Copy, Debug)]
pub struct TrioGenotypes {
    pub child: Genotype,
    pub father: Genotype,
    pub mother: Genotype,
}

/// Both parents are unaffected carriers and the child inherits one alternate allele from each
pub fn is_recessive_candidate(gt: &TrioGenotypes) -> bool {
    gt.child == Genotype::HomAlt && gt.father == Genotype::Het && gt.mother == Genotype::Het
}

/// The child carries a variant that is absent from both parental calls
pub fn is_denovo_candidate(gt: &TrioGenotypes) -> bool {
    (gt.child == Genotype::Het || gt.child == Genotype::HomAlt)
        && gt.father == Genotype::HomRef
        && gt.mother == Genotype::HomRef
}

#[derive(Clone, Copy, Debug, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum InheritancePattern {
    Recessive,
    DeNovo,
}

impl InheritancePattern {
    pub fn matches(&self, gt: &TrioGenotypes) -> bool {
        match self {
            InheritancePattern::Recessive => is_recessive_candidate(gt),
            InheritancePattern::DeNovo => is_denovo_candidate(gt),
        }
    }
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct ClassifyStats {
    pub record_count: usize,

    /// Records skipped because their genotype fields could not be resolved for all three
    /// trio samples
    pub malformed_record_count: usize,

    pub candidate_count: usize,
}

/// Map a sample's genotype field to its zygosity state
///
/// Returns None for records not carrying a diploid call, which are treated as malformed.
///
fn genotype_from_alleles(alleles: &[GenotypeAllele]) -> Option<Genotype> {
    if alleles.len() != 2 {
        return None;
    }

    let mut allele_indices = [0i32; 2];
    for (index, allele) in alleles.iter().enumerate() {
        match allele {
            GenotypeAllele::Unphased(x) | GenotypeAllele::Phased(x) => {
                allele_indices[index] = *x;
            }
            GenotypeAllele::UnphasedMissing | GenotypeAllele::PhasedMissing => {
                return Some(Genotype::Missing);
            }
        }
    }

    Some(if allele_indices[0] == allele_indices[1] {
        if allele_indices[0] == 0 {
            Genotype::HomRef
        } else {
            Genotype::HomAlt
        }
    } else {
        Genotype::Het
    })
}

/// Header columns of the three trio samples in the filtered call set
struct TrioColumns {
    child: usize,
    father: usize,
    mother: usize,
}

fn sample_column(header: &bcf::header::HeaderView, sample_name: &str) -> Option<usize> {
    header
        .samples()
        .iter()
        .position(|x| *x == sample_name.as_bytes())
}

/// Resolve trio roles to header sample columns by name
///
/// Roles are never inferred from column position: a call set whose samples don't match the
/// configured trio names is rejected here, before any record is read.
///
fn trio_columns(
    stage_name: &str,
    header: &bcf::header::HeaderView,
    trio: &Trio,
) -> Result<TrioColumns, PipelineError> {
    let resolve = |sample_name: &str| -> Result<usize, PipelineError> {
        sample_column(header, sample_name).ok_or_else(|| {
            let header_samples = header
                .samples()
                .iter()
                .map(|x| String::from_utf8_lossy(x).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            PipelineError::stage_execution(
                stage_name,
                format!(
                    "sample '{sample_name}' not present in filtered call set (samples: {header_samples})"
                ),
            )
        })
    };

    Ok(TrioColumns {
        child: resolve(&trio.child.name)?,
        father: resolve(&trio.father.name)?,
        mother: resolve(&trio.mother.name)?,
    })
}

fn trio_genotypes(record: &bcf::Record, columns: &TrioColumns) -> Option<TrioGenotypes> {
    let genotypes = record.genotypes().ok()?;
    Some(TrioGenotypes {
        child: genotype_from_alleles(&genotypes.get(columns.child))?,
        father: genotype_from_alleles(&genotypes.get(columns.father))?,
        mother: genotype_from_alleles(&genotypes.get(columns.mother))?,
    })
}

/// Stream the filtered call set and write records matching `pattern` to `output_vcf`
///
/// Records pass through unmodified and in their original order. Malformed records are
/// counted and skipped with a warning, they never abort the run.
///
pub fn classify_pattern(
    trio: &Trio,
    filtered_vcf: &Utf8Path,
    output_vcf: &Utf8Path,
    pattern: InheritancePattern,
) -> Result<ClassifyStats, PipelineError> {
    let stage_name = format!("classify-{pattern}");

    let mut reader = bcf::Reader::from_path(filtered_vcf).map_err(|e| {
        PipelineError::stage_execution(
            &stage_name,
            format!("failed to open filtered call set '{filtered_vcf}': {e}"),
        )
    })?;

    let columns = trio_columns(&stage_name, reader.header(), trio)?;

    let header = bcf::Header::from_template(reader.header());
    let mut writer =
        bcf::Writer::from_path(output_vcf, &header, false, bcf::Format::Vcf).map_err(|e| {
            PipelineError::stage_execution(
                &stage_name,
                format!("failed to create candidate output '{output_vcf}': {e}"),
            )
        })?;

    let mut stats = ClassifyStats::default();
    for record_result in reader.records() {
        let mut record = record_result.map_err(|e| {
            PipelineError::stage_execution(
                &stage_name,
                format!("failed to read filtered call set '{filtered_vcf}': {e}"),
            )
        })?;
        stats.record_count += 1;

        let genotypes = match trio_genotypes(&record, &columns) {
            Some(x) => x,
            None => {
                warn!(
                    "Stage {stage_name}: skipping record {} with unresolvable trio genotypes",
                    stats.record_count
                );
                stats.malformed_record_count += 1;
                continue;
            }
        };

        if pattern.matches(&genotypes) {
            stats.candidate_count += 1;
            writer.translate(&mut record);
            writer.write(&record).map_err(|e| {
                PipelineError::stage_execution(
                    &stage_name,
                    format!("failed to write candidate output '{output_vcf}': {e}"),
                )
            })?;
        }
    }

    info!(
        "Stage {stage_name}: {} of {} records classified as candidates ({} malformed records skipped)",
        stats.candidate_count, stats.record_count, stats.malformed_record_count
    );

    Ok(stats)
}
