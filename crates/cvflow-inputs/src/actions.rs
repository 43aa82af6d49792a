use std::path::Path;

use crate::error::InputsResult;

/// One row of an autofill action file: which interface of which device to
/// generate inputs for, and the profile to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutofillAction {
    pub device: String,
    pub interface: String,
    pub profile_id: String,
}

/// Parse the comma-separated action format.
///
/// Lines starting with `#` are comments; lines without exactly three
/// fields are skipped rather than rejected, so a trailing blank line or a
/// stray header costs nothing.
pub fn parse_actions(text: &str) -> Vec<AutofillAction> {
    let mut actions = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            continue;
        }
        actions.push(AutofillAction {
            device: fields[0].trim().to_string(),
            interface: fields[1].trim().to_string(),
            profile_id: fields[2].trim().to_string(),
        });
    }
    actions
}

pub fn read_action_file(path: impl AsRef<Path>) -> InputsResult<Vec<AutofillAction>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_actions(&text))
}
