//! Loads the project repositories the batch needs before analysing a project

use std::collections::HashMap;

use crate::client::SonarQubeError;
use crate::query;
use crate::types::ProjectRepositories;
use crate::ws_loader::{WsLoader, WsLoaderResult};

/// Analysis property forcing the quality profile to use
pub const SONAR_PROFILE_PROP: &str = "sonar.profile";

pub const NO_QUALITY_PROFILE_MESSAGE: &str = "No quality profiles has been found this project, you probably don't have any language plugin suitable for this analysis.";

/// How the current analysis runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Full analysis, results are published to the server
    #[default]
    Publish,
    /// Issues-only analysis, nothing is persisted
    Issues,
}

impl AnalysisMode {
    pub fn is_issues(self) -> bool {
        self == Self::Issues
    }
}

/// What to load: the project, the analysis properties and the analysis mode
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    pub project_key: String,
    pub properties: HashMap<String, String>,
    pub mode: AnalysisMode,
}

impl LoadContext {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_profile(self, profile: impl Into<String>) -> Self {
        self.with_property(SONAR_PROFILE_PROP, profile)
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn profile(&self) -> Option<&str> {
        self.properties.get(SONAR_PROFILE_PROP).map(String::as_str)
    }
}

/// Fetches `/batch/project` through a [`WsLoader`] and checks the result is usable
pub struct ProjectRepositoriesLoader<L: WsLoader> {
    ws_loader: L,
}

impl<L: WsLoader> ProjectRepositoriesLoader<L> {
    pub fn new(ws_loader: L) -> Self {
        Self { ws_loader }
    }

    pub async fn load(
        &self,
        context: &LoadContext,
    ) -> Result<WsLoaderResult<ProjectRepositories>, SonarQubeError> {
        let path = query::project_ws_path(
            &context.project_key,
            context.profile(),
            context.mode.is_issues(),
        )?;
        tracing::debug!(path = %path, "Loading project repositories");

        let response = self.ws_loader.load_string(&path).await?;
        let from_cache = response.from_cache;
        let repositories: ProjectRepositories = serde_json::from_str(&response.result)
            .map_err(|e| SonarQubeError::Deserialize(e.to_string()))?;

        validate(&repositories)?;

        tracing::debug!(
            profiles = repositories.quality_profiles().len(),
            active_rules = repositories.active_rules().len(),
            files = repositories.file_count(),
            from_cache,
            "Project repositories loaded"
        );
        Ok(WsLoaderResult::new(repositories, from_cache))
    }
}

fn validate(repositories: &ProjectRepositories) -> Result<(), SonarQubeError> {
    if repositories.quality_profiles().is_empty() {
        return Err(SonarQubeError::Validation(
            NO_QUALITY_PROFILE_MESSAGE.to_string(),
        ));
    }
    Ok(())
}
