use std::collections::{BTreeSet, HashMap};

use super::directory::{VolunteerDirectory, VolunteerInfo};
use super::status::{display_status, penalty_status};
use super::{visit_columns, Cell, ExportKind, PivotTable};
use crate::api::{Appointment, Group};
use crate::schedule::slot_utils::visit_time_key;

/// Lookups the builder needs besides the appointments themselves
#[derive(Debug, Clone, Copy)]
pub struct PivotContext<'a> {
    pub volunteers: &'a VolunteerDirectory,
    pub groups: &'a HashMap<i64, Group>,
    /// Study id -> study reference, for the cross-study export
    pub study_refs: &'a HashMap<i64, String>,
}

fn sort_visits(visits: &mut [&Appointment]) {
    visits.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| visit_time_key(a.time.as_deref()).cmp(visit_time_key(b.time.as_deref())))
    });
}

fn distinct_studies(visits: &[&Appointment]) -> BTreeSet<i64> {
    visits.iter().filter_map(|a| a.study_id).collect()
}

/// Builds the volunteer x visit matrix.
///
/// Appointments are grouped by volunteer and sorted by (date, time). The widest
/// group fixes the number of visit column pairs; every row is padded to it.
/// Unassigned appointments get one row each after the volunteers.
pub fn build_pivot(kind: ExportKind, appointments: &[Appointment], ctx: &PivotContext) -> PivotTable {
    let mut by_volunteer: HashMap<i64, Vec<&Appointment>> = HashMap::new();
    let mut unassigned: Vec<&Appointment> = Vec::new();
    for appointment in appointments {
        match appointment.volunteer_id {
            Some(id) => by_volunteer.entry(id).or_default().push(appointment),
            None => unassigned.push(appointment),
        }
    }

    let mut groups: Vec<(i64, Vec<&Appointment>)> = by_volunteer
        .into_iter()
        .filter(|(_, visits)| {
            kind != ExportKind::CommonVolunteers || distinct_studies(visits).len() >= 2
        })
        .collect();
    for (_, visits) in groups.iter_mut() {
        sort_visits(visits);
    }
    groups.sort_by_key(|(id, _)| ctx.volunteers.sort_key(*id));

    let max_passages = groups
        .iter()
        .map(|(_, visits)| visits.len())
        .max()
        .unwrap_or(1)
        .max(1);

    let mut columns = kind.leading_columns();
    for n in 2..=max_passages {
        columns.extend(visit_columns(n));
    }
    columns.extend(kind.trailing_columns());

    let mut rows = Vec::with_capacity(groups.len() + unassigned.len());
    for (id, visits) in &groups {
        let line = rows.len() + 1;
        let mut row = volunteer_cells(kind, line, *id, ctx.volunteers.get(*id));
        push_visits(&mut row, visits, max_passages);
        row.extend(trailing_cells(kind, visits, ctx));
        rows.push(row);
    }

    if kind.includes_unassigned() {
        sort_visits(&mut unassigned);
        let blanks = kind.leading_columns().len() - 3;
        for appointment in unassigned {
            let line = rows.len() + 1;
            let mut row = vec![Cell::Number(line as f64)];
            row.extend(std::iter::repeat(Cell::Empty).take(blanks));
            push_visits(&mut row, &[appointment], max_passages);
            row.extend(trailing_cells(kind, &[appointment], ctx));
            rows.push(row);
        }
    }

    PivotTable {
        kind,
        columns,
        rows,
        max_passages,
    }
}

/// Leading cells before the first visit
fn volunteer_cells(kind: ExportKind, line: usize, id: i64, info: Option<&VolunteerInfo>) -> Vec<Cell> {
    let fallback = VolunteerInfo::default();
    let info = info.unwrap_or(&fallback);
    let subject = Cell::text(info.subject_number.clone().unwrap_or_default());
    let line = Cell::Number(line as f64);
    match kind {
        ExportKind::Appointments => vec![
            line,
            subject,
            Cell::text(display_status(info.status.as_deref())),
            Cell::text(info.name()),
            Cell::text(info.phone()),
            Cell::text(info.phototype()),
            Cell::text(info.email()),
        ],
        ExportKind::Recruitment => vec![
            line,
            subject,
            Cell::text(info.name()),
            Cell::text(info.phone()),
            Cell::text(info.email()),
            Cell::text(penalty_status(info.status.as_deref())),
        ],
        ExportKind::CommonVolunteers => vec![
            line,
            Cell::Number(id as f64),
            Cell::text(info.name()),
            Cell::text(info.phone()),
            Cell::text(info.email()),
        ],
    }
}

fn push_visits(row: &mut Vec<Cell>, visits: &[&Appointment], max_passages: usize) {
    for n in 0..max_passages {
        match visits.get(n) {
            Some(visit) => {
                row.push(Cell::text(visit.date.clone()));
                row.push(Cell::text(visit.time.clone().unwrap_or_default()));
            }
            None => {
                row.push(Cell::Empty);
                row.push(Cell::Empty);
            }
        }
    }
}

fn trailing_cells(kind: ExportKind, visits: &[&Appointment], ctx: &PivotContext) -> Vec<Cell> {
    let group = visits
        .first()
        .and_then(|v| v.group_id)
        .and_then(|id| ctx.groups.get(&id));
    let group_label = Cell::text(group.map(|g| g.label.clone()).unwrap_or_default());
    match kind {
        ExportKind::Appointments => vec![group_label],
        ExportKind::Recruitment => vec![
            group_label,
            group
                .and_then(|g| g.indemnity)
                .map_or(Cell::Empty, Cell::Number),
            Cell::Empty,
            Cell::Empty,
        ],
        ExportKind::CommonVolunteers => {
            let studies = distinct_studies(visits);
            let refs: Vec<String> = studies
                .iter()
                .map(|id| {
                    ctx.study_refs
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| id.to_string())
                })
                .collect();
            vec![Cell::Number(studies.len() as f64), Cell::text(refs.join(", "))]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StudyVolunteer;

    fn rdv(volunteer: Option<i64>, study: i64, date: &str, time: Option<&str>) -> Appointment {
        Appointment {
            study_id: Some(study),
            group_id: Some(1),
            volunteer_id: volunteer,
            date: date.to_string(),
            time: time.map(str::to_string),
            ..Appointment::default()
        }
    }

    fn groups() -> HashMap<i64, Group> {
        HashMap::from([(
            1,
            Group {
                id: 1,
                label: "G1".into(),
                enrolled_subjects: 10,
                indemnity: Some(40.0),
            },
        )])
    }

    #[test]
    fn missing_time_sorts_first_within_a_day() {
        let appointments = vec![
            rdv(Some(1), 1, "2024-01-10", Some("09h00")),
            rdv(Some(1), 1, "2024-01-10", None),
        ];
        let directory = VolunteerDirectory::default();
        let groups = groups();
        let refs = HashMap::new();
        let ctx = PivotContext {
            volunteers: &directory,
            groups: &groups,
            study_refs: &refs,
        };
        let table = build_pivot(ExportKind::Appointments, &appointments, &ctx);
        assert_eq!(table.visit(0, 1).unwrap().1, &Cell::Empty);
        assert_eq!(table.visit(0, 2).unwrap().1, &Cell::Text("09h00".into()));
    }

    #[test]
    fn unassigned_rows_follow_volunteers() {
        let appointments = vec![
            rdv(None, 1, "2024-01-12", Some("10h00")),
            rdv(Some(5), 1, "2024-01-10", Some("09h00")),
        ];
        let directory = VolunteerDirectory::build(
            &[StudyVolunteer {
                volunteer_id: 5,
                subject_number: Some("1".into()),
                status: Some("INSCRIT".into()),
                group_id: Some(1),
            }],
            Vec::new(),
        );
        let groups = groups();
        let refs = HashMap::new();
        let ctx = PivotContext {
            volunteers: &directory,
            groups: &groups,
            study_refs: &refs,
        };
        let table = build_pivot(ExportKind::Recruitment, &appointments, &ctx);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], Cell::Text("1".into()));
        assert_eq!(table.rows[1][0], Cell::Number(2.0));
        assert_eq!(table.rows[1][1], Cell::Empty);
        assert_eq!(table.visit(1, 1).unwrap().0, &Cell::Text("2024-01-12".into()));
        let iv_column = table.width() - 3;
        assert_eq!(table.rows[1][iv_column], Cell::Number(40.0));
    }

    #[test]
    fn common_export_keeps_only_multi_study_volunteers() {
        let appointments = vec![
            rdv(Some(1), 10, "2024-02-01", Some("08h00")),
            rdv(Some(1), 11, "2024-03-01", Some("08h00")),
            rdv(Some(2), 10, "2024-02-01", Some("08h30")),
            rdv(None, 10, "2024-02-02", Some("08h30")),
        ];
        let directory = VolunteerDirectory::default();
        let groups = groups();
        let refs = HashMap::from([(10, "E-10".to_string()), (11, "E-11".to_string())]);
        let ctx = PivotContext {
            volunteers: &directory,
            groups: &groups,
            study_refs: &refs,
        };
        let table = build_pivot(ExportKind::CommonVolunteers, &appointments, &ctx);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], Cell::Number(1.0));
        let last = table.rows[0].last().unwrap();
        assert_eq!(last, &Cell::Text("E-10, E-11".into()));
    }

    #[test]
    fn no_assigned_appointment_still_has_one_visit_pair() {
        let appointments = vec![rdv(None, 1, "2024-01-12", Some("10h00"))];
        let directory = VolunteerDirectory::default();
        let groups = HashMap::new();
        let refs = HashMap::new();
        let ctx = PivotContext {
            volunteers: &directory,
            groups: &groups,
            study_refs: &refs,
        };
        let table = build_pivot(ExportKind::Appointments, &appointments, &ctx);
        assert_eq!(table.max_passages, 1);
        assert_eq!(table.rows[0].len(), table.width());
    }
}
