// browser/filters.rs - User-editable filter state
//
// The registrant tables let an admin narrow the list by university
// country, university, field of study, level of study and a free-text
// search. FilterState holds those selections; FilterFields says which
// document fields they map to, so the same state drives registrations,
// talent-pool and applicant collections.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{FieldFilter, Operator};

/// Current filter selections of a table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub selected_country_codes: Vec<String>,
    pub selected_university: Option<String>,
    pub selected_field_of_study: Option<String>,
    pub selected_level_of_study: Option<String>,
    pub search: Option<String>,
}

impl FilterState {
    /// Whether any selection narrows the result set
    pub fn is_active(&self) -> bool {
        !self.to_filters(&FilterFields::default()).is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn with_country_codes<I, T>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.selected_country_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_university(mut self, code: impl Into<String>) -> Self {
        self.selected_university = Some(code.into());
        self
    }

    pub fn with_field_of_study(mut self, id: impl Into<String>) -> Self {
        self.selected_field_of_study = Some(id.into());
        self
    }

    pub fn with_level_of_study(mut self, id: impl Into<String>) -> Self {
        self.selected_level_of_study = Some(id.into());
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Normalized search token: trimmed, lowercased, `None` when blank
    pub fn search_token(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }

    /// Predicates for these selections, in a stable order.
    /// Blank selections produce no predicate at all.
    pub fn to_filters(&self, fields: &FilterFields) -> Vec<FieldFilter> {
        let mut filters = Vec::new();

        let codes: Vec<Value> = self
            .selected_country_codes
            .iter()
            .map(|code| code.trim())
            .filter(|code| !code.is_empty())
            .map(|code| Value::String(code.to_string()))
            .collect();
        if !codes.is_empty() {
            filters.push(FieldFilter::new(&fields.country_code, Operator::In, Value::Array(codes)));
        }

        let selections = [
            (&fields.university, &self.selected_university),
            (&fields.field_of_study, &self.selected_field_of_study),
            (&fields.level_of_study, &self.selected_level_of_study),
        ];
        for (field, selection) in selections {
            if let Some(value) = selection.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                filters.push(FieldFilter::new(field, Operator::Equal, value));
            }
        }

        if let Some(token) = self.search_token() {
            filters.push(FieldFilter::new(&fields.search_tokens, Operator::ArrayContains, token));
        }

        filters
    }
}

/// Document fields the filter selections apply to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFields {
    pub country_code: String,
    pub university: String,
    pub field_of_study: String,
    pub level_of_study: String,
    pub search_tokens: String,
}

impl FilterFields {
    /// Layout of livestream registration documents (`user` map per registrant)
    pub fn registrations() -> Self {
        Self {
            country_code: "user.universityCountryCode".to_string(),
            university: "user.university.code".to_string(),
            field_of_study: "user.fieldOfStudy.id".to_string(),
            level_of_study: "user.levelOfStudy.id".to_string(),
            search_tokens: "user.searchTokens".to_string(),
        }
    }
}

impl Default for FilterFields {
    fn default() -> Self {
        Self::registrations()
    }
}
