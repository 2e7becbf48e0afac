//! Aggregate counts shown on the Home and monitor screens.

use crate::types::{Modality, ProcessingStatus, Scan, Subject};

/// Subject counts by processing status.
///
/// Every subject lands in exactly one status bucket, so the four buckets
/// always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectStats {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub failed: usize,
    pub pending: usize,
}

impl SubjectStats {
    /// Count a subject listing.
    pub fn from_subjects(subjects: &[Subject]) -> Self {
        let mut stats = Self {
            total: subjects.len(),
            ..Self::default()
        };
        for subject in subjects {
            match subject.processing_status {
                ProcessingStatus::Completed => stats.completed += 1,
                ProcessingStatus::Processing => stats.processing += 1,
                ProcessingStatus::Failed => stats.failed += 1,
                ProcessingStatus::Pending => stats.pending += 1,
            }
        }
        stats
    }

    /// Count for one status.
    pub fn count(&self, status: ProcessingStatus) -> usize {
        match status {
            ProcessingStatus::Completed => self.completed,
            ProcessingStatus::Processing => self.processing,
            ProcessingStatus::Failed => self.failed,
            ProcessingStatus::Pending => self.pending,
        }
    }
}

/// Headline numbers for the Home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub subjects: usize,
    pub scans: usize,
    pub completed: usize,
    pub processing: usize,
}

impl PipelineSummary {
    /// Summarize one subjects + scans fetch.
    pub fn from_listings(subjects: &[Subject], scans: &[Scan]) -> Self {
        let stats = SubjectStats::from_subjects(subjects);
        Self {
            subjects: stats.total,
            scans: scans.len(),
            completed: stats.completed,
            processing: stats.processing,
        }
    }
}

/// Engine 2 counts for one modality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalityStats {
    pub total: usize,
    /// Scans whose status carries the `engine2` stage marker
    pub completed: usize,
}

impl ModalityStats {
    /// Count the scans of `modality` in a listing.
    pub fn for_modality(scans: &[Scan], modality: &Modality) -> Self {
        scans
            .iter()
            .filter(|s| &s.modality == modality)
            .fold(Self::default(), |mut acc, scan| {
                acc.total += 1;
                if scan.reached_engine2() {
                    acc.completed += 1;
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(id: &str, status: ProcessingStatus) -> Subject {
        Subject {
            subject_id: id.to_string(),
            processing_status: status,
            ..Default::default()
        }
    }

    fn scan(modality: Modality, status: &str) -> Scan {
        Scan {
            subject_id: "sub".into(),
            modality,
            processing_status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_counts_match_listing() {
        let subjects = vec![
            subject("a", ProcessingStatus::Completed),
            subject("b", ProcessingStatus::Completed),
            subject("c", ProcessingStatus::Processing),
            subject("d", ProcessingStatus::Pending),
            subject("e", ProcessingStatus::Failed),
        ];
        let stats = SubjectStats::from_subjects(&subjects);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.processing, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_statuses_partition_subjects() {
        let statuses = [
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
            ProcessingStatus::Processing,
            ProcessingStatus::Pending,
        ];
        let subjects: Vec<Subject> = (0..23)
            .map(|i| subject(&format!("s{i}"), statuses[i % statuses.len()]))
            .collect();
        let stats = SubjectStats::from_subjects(&subjects);

        let sum: usize = ProcessingStatus::ALL.iter().map(|s| stats.count(*s)).sum();
        assert_eq!(sum, stats.total);
        assert_eq!(stats.total, 23);
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(SubjectStats::from_subjects(&[]), SubjectStats::default());
        assert_eq!(PipelineSummary::from_listings(&[], &[]), PipelineSummary::default());
    }

    #[test]
    fn test_pipeline_summary() {
        let subjects = vec![
            subject("a", ProcessingStatus::Completed),
            subject("b", ProcessingStatus::Processing),
        ];
        let scans = vec![scan(Modality::Dti, "x"), scan(Modality::Fmri, "y"), scan(Modality::Dti, "z")];
        let summary = PipelineSummary::from_listings(&subjects, &scans);
        assert_eq!(summary.subjects, 2);
        assert_eq!(summary.scans, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.processing, 1);
    }

    #[test]
    fn test_modality_stats_use_engine2_marker() {
        let scans = vec![
            scan(Modality::Dti, "engine2_complete"),
            scan(Modality::Dti, "engine1_completed"),
            scan(Modality::Fmri, "engine2_running"),
            scan(Modality::Structural, "engine2_complete"),
        ];
        let dti = ModalityStats::for_modality(&scans, &Modality::Dti);
        assert_eq!(dti, ModalityStats { total: 2, completed: 1 });
        let fmri = ModalityStats::for_modality(&scans, &Modality::Fmri);
        assert_eq!(fmri, ModalityStats { total: 1, completed: 1 });
    }
}
