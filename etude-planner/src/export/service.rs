use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use futures_util::future::try_join_all;

use super::directory::VolunteerDirectory;
use super::pivot::{build_pivot, PivotContext};
use super::{export_file_name, ExportKind, PivotTable};
use crate::api::{fetch_volunteers, Appointment, Group, StudyBackend};
use crate::error::{AppResult, ValidationError};

/// A built export, not yet serialised
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub file_stem: String,
    pub banner: String,
    pub table: PivotTable,
}

impl ExportDocument {
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem, extension)
    }
}

fn assigned_volunteer_ids(appointments: &[Appointment]) -> Vec<i64> {
    appointments
        .iter()
        .filter_map(|a| a.volunteer_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the appointment or recruitment export of one study.
///
/// `CommonVolunteers` is rejected here; use [`export_common_volunteers`].
pub async fn export_study(
    backend: &dyn StudyBackend,
    study_id: i64,
    kind: ExportKind,
    concurrency: usize,
    today: NaiveDate,
) -> AppResult<ExportDocument> {
    // A single study never has volunteers shared with another one
    if kind == ExportKind::CommonVolunteers {
        return Err(ValidationError::CommonExportNeedsStudies.into());
    }

    let (study, associations, appointments, groups) = tokio::try_join!(
        backend.study(study_id),
        backend.study_volunteers(study_id),
        backend.study_appointments(study_id),
        backend.study_groups(study_id),
    )?;

    let ids = assigned_volunteer_ids(&appointments);
    let details = fetch_volunteers(backend, &ids, concurrency).await;
    let directory = VolunteerDirectory::build(&associations, details);
    let groups: HashMap<i64, Group> = groups.into_iter().map(|g| (g.id, g)).collect();
    let study_refs = HashMap::from([(study.id, study.reference.clone())]);

    let table = build_pivot(
        kind,
        &appointments,
        &PivotContext {
            volunteers: &directory,
            groups: &groups,
            study_refs: &study_refs,
        },
    );
    tracing::info!(
        study_id,
        kind = %kind,
        rows = table.rows.len(),
        max_passages = table.max_passages,
        "export built"
    );

    let heading = if study.title.is_empty() {
        format!("Étude {}", study.reference)
    } else {
        format!("Étude {} - {}", study.reference, study.title)
    };
    Ok(ExportDocument {
        file_stem: export_file_name(kind.purpose(), Some(&study.reference), today),
        banner: format!(
            "{} | {} | {} volontaire(s) | export du {}",
            heading,
            kind.title(),
            directory.len(),
            today.format("%d/%m/%Y")
        ),
        table,
    })
}

/// Builds the cross-study export of volunteers seen in two or more of `study_ids`
pub async fn export_common_volunteers(
    backend: &dyn StudyBackend,
    study_ids: &[i64],
    concurrency: usize,
    today: NaiveDate,
) -> AppResult<ExportDocument> {
    let kind = ExportKind::CommonVolunteers;
    if study_ids.iter().collect::<BTreeSet<_>>().len() < 2 {
        return Err(ValidationError::CommonExportNeedsStudies.into());
    }
    let studies = try_join_all(study_ids.iter().map(|id| backend.study(*id))).await?;
    let per_study = try_join_all(study_ids.iter().map(|id| async move {
        let mut appointments = backend.study_appointments(*id).await?;
        for appointment in &mut appointments {
            appointment.study_id.get_or_insert(*id);
        }
        AppResult::Ok(appointments)
    }))
    .await?;
    let appointments: Vec<Appointment> = per_study.into_iter().flatten().collect();

    let ids = assigned_volunteer_ids(&appointments);
    let details = fetch_volunteers(backend, &ids, concurrency).await;
    let directory = VolunteerDirectory::build(&[], details);
    let groups = HashMap::new();
    let study_refs: HashMap<i64, String> = studies
        .iter()
        .map(|s| (s.id, s.reference.clone()))
        .collect();

    let table = build_pivot(
        kind,
        &appointments,
        &PivotContext {
            volunteers: &directory,
            groups: &groups,
            study_refs: &study_refs,
        },
    );
    tracing::info!(studies = study_ids.len(), rows = table.rows.len(), "common volunteer export built");

    let references: Vec<&str> = studies.iter().map(|s| s.reference.as_str()).collect();
    Ok(ExportDocument {
        file_stem: export_file_name(kind.purpose(), None, today),
        banner: format!(
            "Études {} | {} | {} volontaire(s) commun(s) | export du {}",
            references.join(", "),
            kind.title(),
            table.rows.len(),
            today.format("%d/%m/%Y")
        ),
        table,
    })
}
