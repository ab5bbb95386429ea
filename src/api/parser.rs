use crate::app::{ApiError, Build, InputOutputs};
use color_eyre::eyre::Result;

pub fn parse_builds(json: &str) -> Result<Vec<Build>> {
    let builds: Vec<Build> = serde_json::from_str(json)?;
    Ok(builds)
}

#[derive(serde::Deserialize)]
struct GetBuildResponse {
    build: Build,
    inputs: Vec<InputOutputs>,
}

pub fn parse_build(json: &str) -> Result<(Build, Vec<InputOutputs>)> {
    let resp: GetBuildResponse = serde_json::from_str(json)?;
    Ok((resp.build, resp.inputs))
}

/// `PUT /api/build` answers with the created build record.
pub fn parse_submitted(json: &str) -> Result<Build> {
    let build: Build = serde_json::from_str(json)?;
    Ok(build)
}

#[derive(serde::Deserialize)]
struct RestartResponse {
    success: bool,
}

pub fn parse_restart(json: &str) -> Result<bool> {
    let resp: RestartResponse = serde_json::from_str(json)?;
    Ok(resp.success)
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Pull the human-readable description out of an error body, if it has the
/// backend's envelope shape.
pub fn error_description(json: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(json)
        .ok()
        .map(|e| e.error.description)
}
