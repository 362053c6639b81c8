//! Query string for the `/batch/project` web service

use crate::client::SonarQubeError;

/// Web service serving project repositories to the batch
pub const BATCH_PROJECT_WS: &str = "/batch/project";

/// Build `key=..[&profile=..]&preview=..` with form-url-encoded values.
///
/// Parameter order is fixed so the same inputs always map to the same cache entry.
pub fn build_path(
    project_key: &str,
    profile: Option<&str>,
    preview: bool,
) -> Result<String, SonarQubeError> {
    if project_key.trim().is_empty() {
        return Err(SonarQubeError::Config(
            "project key must not be empty".to_string(),
        ));
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("key", project_key);
    if let Some(profile) = profile.filter(|p| !p.is_empty()) {
        query.append_pair("profile", profile);
    }
    query.append_pair("preview", if preview { "true" } else { "false" });
    Ok(query.finish())
}

/// Full server-relative path, e.g. `/batch/project?key=foo&preview=false`
pub fn project_ws_path(
    project_key: &str,
    profile: Option<&str>,
    preview: bool,
) -> Result<String, SonarQubeError> {
    Ok(format!(
        "{}?{}",
        BATCH_PROJECT_WS,
        build_path(project_key, profile, preview)?
    ))
}
