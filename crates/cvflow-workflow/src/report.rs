//! Build failure formatting.
//!
//! Turns the per-device detail records of a failed build into the tabbed
//! text block shown to the operator. Only the stage a device stopped in is
//! reported, with its errors numbered under a `--- # n` separator.

use std::fmt::Write;

use cvflow_api::{BuildStage, BuildState, InputError, WorkspaceBuild};
use cvflow_types::StudioId;

/// Format the failing devices of a build into a readable report.
pub fn build_failure_report(build: &WorkspaceBuild, studio_id: &StudioId) -> String {
    let mut out = String::new();
    for (device_id, result) in &build.build_results {
        if result.state != BuildState::Fail {
            continue;
        }
        let _ = writeln!(out, "\t\tDevice {device_id}:");
        match result.stage {
            BuildStage::InputValidation => {
                out.push_str("\t\t\tInput validation:\n");
                let Some(ivr) = result.input_validation_results.get(studio_id) else {
                    continue;
                };
                if !ivr.input_schema_errors.is_empty() {
                    out.push_str("\t\t\t\tInput schema errors:\n");
                }
                for (i, err) in ivr.input_schema_errors.iter().enumerate() {
                    input_error_entry(&mut out, i + 1, err);
                }
                if !ivr.input_value_errors.is_empty() {
                    out.push_str("\t\t\t\tInput value errors:\n");
                }
                for (i, err) in ivr.input_value_errors.iter().enumerate() {
                    input_error_entry(&mut out, i + 1, err);
                }
                if !ivr.other_errors.is_empty() {
                    out.push_str("\t\t\t\tOther errors:\n");
                }
                for (i, err) in ivr.other_errors.iter().enumerate() {
                    let _ = writeln!(out, "\t\t\t\t\t--- # {}", i + 1);
                    let _ = writeln!(out, "\t\t\t\t\t{err}");
                }
            }
            BuildStage::ConfigletBuild => {
                out.push_str("\t\t\tConfiglet compilation:\n");
                let Some(cbr) = result.configlet_build_results.get(studio_id) else {
                    continue;
                };
                if !cbr.template_errors.is_empty() {
                    out.push_str("\t\t\t\tTemplate errors:\n");
                }
                for (i, err) in cbr.template_errors.iter().enumerate() {
                    let _ = writeln!(out, "\t\t\t\t\t--- # {}", i + 1);
                    let _ = writeln!(out, "\t\t\t\t\tLine number: {}", err.line_num);
                    let _ = writeln!(out, "\t\t\t\t\tException: {}", err.exception);
                    let _ = writeln!(out, "\t\t\t\t\tDetails: {}", err.details);
                }
            }
            BuildStage::ConfigValidation => {
                out.push_str("\t\t\tConfiglet validation:\n");
                let Some(cvr) = result.configlet_validation_results.get(studio_id) else {
                    continue;
                };
                if !cvr.errors.is_empty() {
                    out.push_str("\t\t\t\tErrors:\n");
                }
                for (i, err) in cvr.errors.iter().enumerate() {
                    let _ = writeln!(out, "\t\t\t\t\t--- # {}", i + 1);
                    let _ = writeln!(out, "\t\t\t\t\tCode: {}", err.error_code);
                    let _ = writeln!(out, "\t\t\t\t\tConfiglet: {}", err.configlet_name);
                    let _ = writeln!(out, "\t\t\t\t\tLine number: {}", err.line_num);
                    let _ = writeln!(out, "\t\t\t\t\tDetails: {}", err.error_msg);
                }
            }
            BuildStage::Unspecified => {}
        }
    }
    out
}

fn input_error_entry(out: &mut String, n: usize, err: &InputError) {
    let _ = writeln!(out, "\t\t\t\t\t--- # {n}");
    let _ = writeln!(out, "\t\t\t\t\tField ID: {}", err.field_id);
    let _ = writeln!(out, "\t\t\t\t\tPath: {:?}", err.path);
    let _ = writeln!(out, "\t\t\t\t\tMembers: {:?}", err.members);
    let _ = writeln!(out, "\t\t\t\t\tDetails: {}", err.message);
}
