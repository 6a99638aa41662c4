// fixtures/collections/registrations.rs
//
// Livestream registrations: one document per registrant, with the user's
// profile nested under `user`. Documents are generated from a seeded RNG so
// every run (and every store) sees exactly the same data.
//
// Shape of one document:
//   {
//     "livestreamId": "ls-career-day",
//     "registeredAt": "2024-03-01T09:00:00+00:00",
//     "user": {
//       "userUid", "firstName", "lastName", "userEmail",
//       "universityCountryCode",
//       "university": { "code", "name" },
//       "fieldOfStudy": { "id", "name" },
//       "levelOfStudy": { "id", "name" },
//       "userResume"?, "linkedinUrl"?, "avatar"?,
//       "searchTokens": [..]
//     }
//   }

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::browser::model::Document;
use crate::fixtures::TestCollection;

pub const COLLECTION: &str = "livestreams/ls-career-day/userLivestreamData";
pub const LIVESTREAM_ID: &str = "ls-career-day";
pub const DEFAULT_COUNT: usize = 25;
pub const DEFAULT_SEED: u64 = 42;

/// 2024-03-01T09:00:00Z
const FIRST_REGISTRATION: i64 = 1_709_283_600;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Grace", "Linus", "Margaret", "Edsger", "Barbara", "Ken", "Frances", "Dennis",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Torvalds", "Hamilton", "Dijkstra", "Liskov", "Thompson", "Allen", "Ritchie",
];

/// (country code, university code, university name)
const UNIVERSITIES: &[(&str, &str, &str)] = &[
    ("CH", "ethz", "ETH Zurich"),
    ("CH", "epfl", "EPFL"),
    ("DE", "tum", "Technical University of Munich"),
    ("DE", "kit", "Karlsruhe Institute of Technology"),
    ("AT", "tuw", "TU Wien"),
    ("FR", "psl", "PSL University"),
    ("GB", "ucl", "University College London"),
];

const FIELDS_OF_STUDY: &[(&str, &str)] = &[
    ("computer-science", "Computer Science"),
    ("mathematics", "Mathematics"),
    ("business", "Business"),
    ("law", "Law"),
];

const LEVELS_OF_STUDY: &[(&str, &str)] = &[("bachelor", "Bachelor"), ("master", "Master"), ("phd", "PhD")];

pub struct RegistrationsCollection;

impl RegistrationsCollection {
    /// `count` registrations generated from `seed`
    ///
    /// Registration times increase with the index, so ordering by
    /// `registeredAt` ascending returns documents in generation order.
    pub fn generate(count: usize, seed: u64) -> Vec<Document> {
        let mut rng = StdRng::seed_from_u64(seed);
        let first_registration = Utc
            .timestamp_opt(FIRST_REGISTRATION, 0)
            .single()
            .unwrap_or_default();

        (0..count)
            .map(|index| registration(&mut rng, index, first_registration))
            .collect()
    }
}

impl TestCollection for RegistrationsCollection {
    fn name() -> &'static str {
        COLLECTION
    }

    fn documents() -> Vec<Document> {
        Self::generate(DEFAULT_COUNT, DEFAULT_SEED)
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn registration(rng: &mut StdRng, index: usize, first_registration: DateTime<Utc>) -> Document {
    let first_name = *pick(rng, FIRST_NAMES);
    let last_name = *pick(rng, LAST_NAMES);
    let (country_code, university_code, university_name) = *pick(rng, UNIVERSITIES);
    let (field_id, field_name) = *pick(rng, FIELDS_OF_STUDY);
    let (level_id, level_name) = *pick(rng, LEVELS_OF_STUDY);

    let user_uid = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
    let email = format!(
        "{}.{}{}@example.com",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        index
    );
    let registered_at = first_registration + Duration::minutes(17 * index as i64);

    let mut user = json!({
        "userUid": user_uid.to_string(),
        "firstName": first_name,
        "lastName": last_name,
        "userEmail": email,
        "universityCountryCode": country_code,
        "university": { "code": university_code, "name": university_name },
        "fieldOfStudy": { "id": field_id, "name": field_name },
        "levelOfStudy": { "id": level_id, "name": level_name },
        "searchTokens": [
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            format!("{} {}", first_name, last_name).to_lowercase(),
            email.clone(),
        ],
    });

    if let Value::Object(profile) = &mut user {
        if index % 3 == 0 {
            profile.insert(
                "userResume".to_string(),
                json!(format!("https://files.example.com/resumes/{}.pdf", user_uid)),
            );
        }
        if rng.gen_bool(0.5) {
            profile.insert(
                "linkedinUrl".to_string(),
                json!(format!("linkedin.com/in/{}-{}", first_name.to_lowercase(), index)),
            );
        }
    }

    Document::from_value(
        format!("reg-{:03}", index),
        json!({
            "livestreamId": LIVESTREAM_ID,
            "registeredAt": registered_at.to_rfc3339(),
            "user": user,
        }),
    )
}
