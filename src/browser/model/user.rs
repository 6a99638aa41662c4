// browser/model/user.rs - Flat registrant rows
//
// Registration documents nest the user profile; tables and exports want
// one flat row per registrant. `UserDataEntry::from_registration` is the
// default converter used by the table facade.

use serde::{Deserialize, Serialize};

use super::Document;

/// Country names for the university country codes used by the fixtures
const UNIVERSITY_COUNTRIES: &[(&str, &str)] = &[
    ("AT", "Austria"),
    ("CH", "Switzerland"),
    ("DE", "Germany"),
    ("ES", "Spain"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("IT", "Italy"),
    ("NL", "Netherlands"),
    ("PL", "Poland"),
    ("US", "United States"),
];

/// Display name of a university country code, falling back to the code itself
pub fn university_country_name(code: &str) -> String {
    UNIVERSITY_COUNTRIES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// One row of a registrant / talent-pool / applicant table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataEntry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub university_country_code: String,
    pub university_country_name: String,
    pub university_name: String,
    pub field_of_study: String,
    pub level_of_study: String,
    pub resume_url: String,
    pub linked_in_url: String,
    pub avatar: Option<String>,
}

impl UserDataEntry {
    /// Column titles in export order
    pub const HEADERS: [&'static str; 9] = [
        "First Name",
        "Last Name",
        "Email",
        "University Country",
        "University Name",
        "Field Of Study",
        "Level Of Study",
        "Resume",
        "LinkedIn",
    ];

    /// Convert a registration document. Documents without a `user` map are skipped.
    pub fn from_registration(document: &Document) -> Option<Self> {
        document.get("user")?.as_object()?;

        let text = |path: &str| document.get_str(path).unwrap_or_default().to_string();
        let country_code = text("user.universityCountryCode");

        Some(Self {
            first_name: text("user.firstName"),
            last_name: text("user.lastName"),
            email: text("user.userEmail"),
            university_country_name: university_country_name(&country_code),
            university_country_code: country_code,
            university_name: text("user.university.name"),
            field_of_study: text("user.fieldOfStudy.name"),
            level_of_study: text("user.levelOfStudy.name"),
            resume_url: text("user.userResume"),
            linked_in_url: text("user.linkedinUrl"),
            avatar: document.get_str("user.avatar").map(str::to_string),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Cells in [`UserDataEntry::HEADERS`] order
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.university_country_name.clone(),
            self.university_name.clone(),
            self.field_of_study.clone(),
            self.level_of_study.clone(),
            self.resume_url.clone(),
            self.linked_in_url.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_registration() {
        let doc = Document::from_value(
            "r1",
            json!({
                "user": {
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "userEmail": "ada@example.com",
                    "universityCountryCode": "GB",
                    "university": { "name": "University of London", "code": "uol" },
                    "fieldOfStudy": { "id": "math", "name": "Mathematics" },
                    "levelOfStudy": { "id": "msc", "name": "Master" },
                    "linkedinUrl": "linkedin.com/in/ada"
                }
            }),
        );

        let entry = UserDataEntry::from_registration(&doc).unwrap();
        assert_eq!(entry.full_name(), "Ada Lovelace");
        assert_eq!(entry.university_country_name, "United Kingdom");
        assert_eq!(entry.field_of_study, "Mathematics");
        assert_eq!(entry.resume_url, "");
        assert_eq!(entry.avatar, None);
        assert_eq!(entry.to_record().len(), UserDataEntry::HEADERS.len());
    }

    #[test]
    fn test_documents_without_user_are_skipped() {
        let doc = Document::from_value("x", json!({ "livestreamId": "ls" }));
        assert!(UserDataEntry::from_registration(&doc).is_none());
    }

    #[test]
    fn test_unknown_country_code_falls_back() {
        assert_eq!(university_country_name("ch"), "Switzerland");
        assert_eq!(university_country_name("ZZ"), "ZZ");
    }
}
