#![forbid(unsafe_code)]

//! Request-body validation for `POST /api/survey/submit`.
//!
//! Every failing field is reported, not only the first one. Strings are
//! trimmed before their length is checked, numbers may arrive as numeric
//! strings and unknown keys are dropped.

use serde_json::{Map, Value};
use survey_kernel_contracts::common::char_len;
use survey_kernel_contracts::session::{PARTICIPANT_MAX_AGE, PARTICIPANT_MIN_AGE};
use survey_kernel_contracts::submission::{
    FieldError, ParticipantPayload, SurveyResponsePayload, SurveySubmissionRequest,
    RESPONSES_MAX, RESPONSES_MIN, SURVEY_VERSION_DEFAULT, TEXT_FIELD_MAX_CHARS,
    TEXT_FIELD_MIN_CHARS,
};

pub fn validate_submission(body: &Value) -> Result<SurveySubmissionRequest, Vec<FieldError>> {
    let mut errors = Vec::new();
    let Some(root) = body.as_object() else {
        return Err(vec![FieldError::new(
            "",
            "\"value\" must be of type object",
        )]);
    };

    let participant = object_field(root, "participant", true, &mut errors).and_then(|p| {
        let age = integer_field(
            p,
            "participant.age",
            "age",
            u64::from(PARTICIPANT_MIN_AGE),
            u64::from(PARTICIPANT_MAX_AGE),
            &mut errors,
        );
        let field_of_study =
            text_field(p, "participant.field_of_study", "field_of_study", &mut errors);
        Some(ParticipantPayload {
            age: u32::try_from(age?).ok()?,
            field_of_study: field_of_study?,
        })
    });

    let responses = responses_field(root, &mut errors);

    let survey_version = match root.get("survey_version") {
        None => Some(SURVEY_VERSION_DEFAULT.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(FieldError::new(
                "survey_version",
                "\"survey_version\" is not allowed to be empty",
            ));
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.push(FieldError::new(
                "survey_version",
                "\"survey_version\" must be a string",
            ));
            None
        }
    };

    match (participant, responses, survey_version) {
        (Some(participant), Some(responses), Some(version)) if errors.is_empty() => {
            Ok(SurveySubmissionRequest {
                participant,
                responses,
                survey_version: Some(version),
            })
        }
        _ => Err(errors),
    }
}

fn responses_field(
    root: &Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<SurveyResponsePayload>> {
    let items = match root.get("responses") {
        None => {
            errors.push(FieldError::new("responses", "\"responses\" is required"));
            return None;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(FieldError::new("responses", "\"responses\" must be an array"));
            return None;
        }
    };

    let before = errors.len();
    let mut parsed = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let path = format!("responses.{idx}");
        let Some(obj) = item.as_object() else {
            errors.push(FieldError::new(
                path.clone(),
                format!("\"{path}\" must be of type object"),
            ));
            continue;
        };
        let role_title = text_field(
            obj,
            &format!("{path}.role_title"),
            "role_title",
            errors,
        );
        let assigned_icon = text_field(
            obj,
            &format!("{path}.assigned_icon"),
            "assigned_icon",
            errors,
        );
        let response_order = integer_field(
            obj,
            &format!("{path}.response_order"),
            "response_order",
            0,
            u64::from(u32::MAX),
            errors,
        );
        if let (Some(role_title), Some(assigned_icon), Some(order)) =
            (role_title, assigned_icon, response_order)
        {
            parsed.push(SurveyResponsePayload {
                role_title,
                assigned_icon,
                response_order: u32::try_from(order).unwrap_or(u32::MAX),
            });
        }
    }

    if items.len() < RESPONSES_MIN {
        errors.push(FieldError::new(
            "responses",
            format!("\"responses\" must contain at least {RESPONSES_MIN} items"),
        ));
    } else if items.len() > RESPONSES_MAX {
        errors.push(FieldError::new(
            "responses",
            format!("\"responses\" must contain less than or equal to {RESPONSES_MAX} items"),
        ));
    }
    (errors.len() == before).then_some(parsed)
}

fn object_field<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    required: bool,
    errors: &mut Vec<FieldError>,
) -> Option<&'a Map<String, Value>> {
    match parent.get(key) {
        None if required => {
            errors.push(FieldError::new(key, format!("\"{key}\" is required")));
            None
        }
        None => None,
        Some(Value::Object(obj)) => Some(obj),
        Some(_) => {
            errors.push(FieldError::new(
                key,
                format!("\"{key}\" must be of type object"),
            ));
            None
        }
    }
}

fn text_field(
    parent: &Map<String, Value>,
    path: &str,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let raw = match parent.get(key) {
        None => {
            errors.push(FieldError::new(path, format!("\"{path}\" is required")));
            return None;
        }
        Some(Value::String(raw)) => raw,
        Some(_) => {
            errors.push(FieldError::new(path, format!("\"{path}\" must be a string")));
            return None;
        }
    };
    let trimmed = raw.trim();
    let len = char_len(trimmed);
    let message = if len == 0 {
        format!("\"{path}\" is not allowed to be empty")
    } else if len < TEXT_FIELD_MIN_CHARS {
        format!("\"{path}\" length must be at least {TEXT_FIELD_MIN_CHARS} characters long")
    } else if len > TEXT_FIELD_MAX_CHARS {
        format!(
            "\"{path}\" length must be less than or equal to {TEXT_FIELD_MAX_CHARS} characters long"
        )
    } else {
        return Some(trimmed.to_string());
    };
    errors.push(FieldError::new(path, message));
    None
}

fn integer_field(
    parent: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
    errors: &mut Vec<FieldError>,
) -> Option<u64> {
    let number = match parent.get(key) {
        None => {
            errors.push(FieldError::new(path, format!("\"{path}\" is required")));
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        errors.push(FieldError::new(path, format!("\"{path}\" must be a number")));
        return None;
    };
    let message = if number.fract() != 0.0 {
        format!("\"{path}\" must be an integer")
    } else if number < min as f64 {
        format!("\"{path}\" must be greater than or equal to {min}")
    } else if number > max as f64 {
        format!("\"{path}\" must be less than or equal to {max}")
    } else {
        return Some(number as u64);
    };
    errors.push(FieldError::new(path, message));
    None
}
