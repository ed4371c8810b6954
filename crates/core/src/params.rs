//! Template parameter substitution for notification emails.
//!
//! Subjects and bodies contain `{NAME}` placeholders drawn from a fixed
//! dictionary ([`ACCEPTED_PARAMS`]). Rendering is plain substitution: there is
//! no expression language and no escaping. `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PARAM_EXTERNAL_ID: &str = "EXTERNAL_ID";
pub const PARAM_COUNTRY: &str = "COUNTRY";
pub const PARAM_COMPANY: &str = "COMPANY";
pub const PARAM_CONTACT: &str = "CONTACT";
pub const PARAM_VAT: &str = "VAT";
pub const PARAM_CLOSING_DATE: &str = "CLOSING_DATE";
pub const PARAM_OR_NAME: &str = "OR_NAME";
pub const PARAM_OR_VAT: &str = "OR_VAT";
pub const PARAM_OR_COUNTRY: &str = "OR_COUNTRY";

/// Every placeholder a template may use, with a description of its source.
pub const ACCEPTED_PARAMS: &[(&str, &str)] = &[
    (PARAM_EXTERNAL_ID, "company.external_id"),
    (PARAM_COUNTRY, "company.country"),
    (PARAM_COMPANY, "company.name"),
    (PARAM_CONTACT, "person.name"),
    (PARAM_VAT, "company.vat"),
    (PARAM_CLOSING_DATE, "cycle.closing_date"),
    (PARAM_OR_NAME, "company.representative_name"),
    (PARAM_OR_VAT, "company.representative_vat"),
    (PARAM_OR_COUNTRY, "company.representative_country_name"),
];

/// strftime format used for `{CLOSING_DATE}`, e.g. `03 October 2009`.
pub const CLOSING_DATE_FORMAT: &str = "%d %B %Y";

static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid regex"));

/// Whether `name` is one of the [`ACCEPTED_PARAMS`].
pub fn is_accepted(name: &str) -> bool {
    ACCEPTED_PARAMS.iter().any(|(param, _)| *param == name)
}

// ---------------------------------------------------------------------------
// Parameter values
// ---------------------------------------------------------------------------

/// Everything needed to fill the parameter dictionary for one recipient.
#[derive(Debug, Clone, Default)]
pub struct RecipientContext {
    pub external_id: Option<String>,
    pub company_name: String,
    pub country: String,
    pub vat: Option<String>,
    pub representative_name: Option<String>,
    pub representative_vat: Option<String>,
    pub representative_country_name: Option<String>,
    pub contact_name: String,
    pub closing_date: Option<NaiveDate>,
}

/// A fully resolved parameter dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateParams(BTreeMap<String, String>);

impl TemplateParams {
    /// Build the dictionary for one person at one company.
    ///
    /// Absent optional values render as the empty string.
    pub fn for_recipient(ctx: &RecipientContext) -> Self {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let closing_date = ctx
            .closing_date
            .map(|d| d.format(CLOSING_DATE_FORMAT).to_string())
            .unwrap_or_default();

        let mut values = BTreeMap::new();
        values.insert(PARAM_EXTERNAL_ID.to_string(), opt(&ctx.external_id));
        values.insert(PARAM_COUNTRY.to_string(), ctx.country.clone());
        values.insert(PARAM_COMPANY.to_string(), ctx.company_name.clone());
        values.insert(PARAM_CONTACT.to_string(), ctx.contact_name.clone());
        values.insert(PARAM_VAT.to_string(), opt(&ctx.vat));
        values.insert(PARAM_CLOSING_DATE.to_string(), closing_date);
        values.insert(PARAM_OR_NAME.to_string(), opt(&ctx.representative_name));
        values.insert(PARAM_OR_VAT.to_string(), opt(&ctx.representative_vat));
        values.insert(
            PARAM_OR_COUNTRY.to_string(),
            opt(&ctx.representative_country_name),
        );
        Self(values)
    }

    /// Build the dictionary from caller-supplied values (test sends).
    ///
    /// Keys are matched case-insensitively against [`ACCEPTED_PARAMS`];
    /// unknown keys are ignored and missing ones become empty strings.
    pub fn from_supplied<'a, I>(supplied: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values: BTreeMap<String, String> = ACCEPTED_PARAMS
            .iter()
            .map(|(name, _)| (name.to_string(), String::new()))
            .collect();
        for (key, value) in supplied {
            let key = key.to_ascii_uppercase();
            if let Some(slot) = values.get_mut(&key) {
                *slot = value.to_string();
            }
        }
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Parsing and rendering
// ---------------------------------------------------------------------------

/// One piece of a parsed template.
#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Param(&'a str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, CoreError> {
    let mut segments = Vec::new();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                if bytes.get(i + 1) == Some(&b'{') {
                    segments.push(Segment::Brace('{'));
                    i += 2;
                } else {
                    let close = template[i + 1..].find('}').ok_or_else(|| {
                        CoreError::Validation(format!("Unclosed '{{' at position {i}"))
                    })?;
                    let name = &template[i + 1..i + 1 + close];
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_alphanumeric() || c == '_')
                    {
                        return Err(CoreError::Validation(format!(
                            "Invalid template parameter '{{{name}}}'"
                        )));
                    }
                    segments.push(Segment::Param(name));
                    i += close + 2;
                }
                literal_start = i;
            }
            b'}' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                if bytes.get(i + 1) == Some(&b'}') {
                    segments.push(Segment::Brace('}'));
                    i += 2;
                    literal_start = i;
                } else {
                    return Err(CoreError::Validation(format!(
                        "Single '}}' encountered at position {i}"
                    )));
                }
            }
            _ => i += 1,
        }
    }
    if literal_start < bytes.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    Ok(segments)
}

/// Substitute every `{NAME}` in `template` with its value from `params`.
pub fn render(template: &str, params: &TemplateParams) -> Result<String, CoreError> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Brace(c) => out.push(c),
            Segment::Param(name) => {
                let value = params.get(name).ok_or_else(|| {
                    CoreError::Validation(format!("Unknown template parameter '{{{name}}}'"))
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Distinct `{NAME}` tokens appearing in `text`, sorted.
pub fn extract_parameters(text: &str) -> Vec<String> {
    let mut names: Vec<String> = PARAM_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Check that a subject/body pair only uses accepted parameters and is
/// well formed.
pub fn validate_template(subject: &str, body_html: &str) -> Result<(), CoreError> {
    for (field, text) in [("subject", subject), ("body_html", body_html)] {
        let unknown: Vec<&str> = parse(text)?
            .into_iter()
            .filter_map(|s| match s {
                Segment::Param(name) if !is_accepted(name) => Some(name),
                _ => None,
            })
            .collect();
        if !unknown.is_empty() {
            return Err(CoreError::Validation(format!(
                "Unknown parameters in {field}: {}",
                unknown.join(", ")
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
