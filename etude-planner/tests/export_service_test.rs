mod tools;

#[cfg(test)]
mod export_service_tests {
    use chrono::NaiveDate;

    use etude_planner::error::{AppError, ValidationError};
    use etude_planner::export::{
        export_common_volunteers, export_study, Cell, ExportFormat, ExportKind,
    };

    use crate::tools;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[tokio::test]
    async fn failed_volunteer_fetch_leaves_blank_details() {
        let mut backend = tools::seeded_backend();
        backend.failing_volunteers.push(2);

        let document = export_study(&backend, 1, ExportKind::Appointments, 4, today())
            .await
            .unwrap();
        let rows = &document.table.rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][3], Cell::Text("MARTIN Julie".into()));
        assert_eq!(rows[1][1], Cell::Text("2".into()));
        assert!(rows[1][3..7].iter().all(Cell::is_empty));
    }

    #[tokio::test]
    async fn study_export_is_named_after_the_reference() {
        let backend = tools::seeded_backend();

        let appointments = export_study(&backend, 1, ExportKind::Appointments, 4, today())
            .await
            .unwrap();
        assert_eq!(appointments.file_name("xlsx"), "rdv-E24-001.xlsx");
        assert!(appointments.banner.starts_with("Étude E24-001"));
        assert!(appointments.banner.ends_with("export du 02/05/2024"));

        let recruitment = export_study(&backend, 1, ExportKind::Recruitment, 4, today())
            .await
            .unwrap();
        assert_eq!(recruitment.file_name("csv"), "recrutement-E24-001.csv");
    }

    #[tokio::test]
    async fn unknown_study_is_an_error() {
        let backend = tools::seeded_backend();
        assert!(export_study(&backend, 99, ExportKind::Appointments, 4, today())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn renders_workbook_and_csv() {
        let backend = tools::seeded_backend();
        let document = export_study(&backend, 1, ExportKind::Appointments, 4, today())
            .await
            .unwrap();

        let xlsx = ExportFormat::Xlsx.render(&document).unwrap();
        assert!(xlsx.starts_with(b"PK"));

        let csv = String::from_utf8(ExportFormat::Csv.render(&document).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], document.banner);
        assert_eq!(
            lines[1],
            "N°;N° sujet;Statut;Nom;Téléphone;Phototype;Email;Date visite 1;Heure visite 1;Date visite 2;Heure visite 2;Groupe"
        );
        assert!(lines[2].starts_with("1;1;;MARTIN Julie;"));
        assert!(lines[2].ends_with(";2024-01-10;09h00;2024-01-12;10h00;G1"));
        assert_eq!(lines[4], "3;;;;;;;2024-01-13;08h00;;;G1");
    }

    #[tokio::test]
    async fn common_export_spans_studies() {
        let mut backend = tools::seeded_backend();
        backend.studies.insert(2, tools::study(2, "E24-002"));
        let mut shared = tools::appointment(2, Some(1), "2024-02-01", "08h30");
        shared.study_id = None;
        backend.appointments.insert(2, vec![shared]);

        let document = export_common_volunteers(&backend, &[1, 2], 4, today())
            .await
            .unwrap();
        assert_eq!(document.file_name("xlsx"), "volontaires-communs-2024-05-02.xlsx");

        let table = &document.table;
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.max_passages, 3);
        assert_eq!(table.rows[0][1], Cell::Number(1.0));
        let width = table.width();
        assert_eq!(table.rows[0][width - 2], Cell::Number(2.0));
        assert_eq!(table.rows[0][width - 1], Cell::Text("E24-001, E24-002".into()));
    }

    #[tokio::test]
    async fn common_export_rejects_a_single_study() {
        let backend = tools::seeded_backend();

        let single = export_study(&backend, 1, ExportKind::CommonVolunteers, 4, today()).await;
        assert!(matches!(
            single,
            Err(AppError::Validation(ValidationError::CommonExportNeedsStudies))
        ));

        let repeated = export_common_volunteers(&backend, &[1, 1], 4, today()).await;
        assert!(matches!(
            repeated,
            Err(AppError::Validation(ValidationError::CommonExportNeedsStudies))
        ));
    }
}
