/// Default association status, left blank in the appointment export
pub const REGISTERED_STATUS: &str = "INSCRIT";

/// Status as shown in the appointment export: everything verbatim except `INSCRIT`
pub fn display_status(status: Option<&str>) -> String {
    match status.map(str::trim) {
        Some(REGISTERED_STATUS) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Status as shown in the recruitment sheet: only penalties are kept
pub fn penalty_status(status: Option<&str>) -> String {
    match status {
        Some(s) if is_penalty(s) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Accent-insensitive, case-insensitive match on "penalite"
pub fn is_penalty(status: &str) -> bool {
    fold_accents(status).contains("penalite")
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
