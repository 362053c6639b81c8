use sonar_batch::client::{SonarQubeClient, SonarQubeConfig};
use sonar_batch::loader::{LoadContext, ProjectRepositoriesLoader};

use crate::output;

pub async fn run(
    config: SonarQubeConfig,
    context: &LoadContext,
    json: bool,
) -> i32 {
    let client = match SonarQubeClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {e}");
            return 1;
        }
    };

    // One load per process, so there is nothing a response cache could serve
    let loader = ProjectRepositoriesLoader::new(client);

    match loader.load(context).await {
        Ok(loaded) => {
            output::print_project_repositories(&loaded, &context.project_key, json);
            0
        }
        Err(e) if e.is_validation() => {
            eprintln!("{e}");
            1
        }
        Err(e) => {
            eprintln!("Failed to load project repositories: {e}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonar_batch::loader::AnalysisMode;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn try_mock_server() -> Option<MockServer> {
        let listener = match std::net::TcpListener::bind("127.0.0.1:0") {
            Ok(l) => l,
            Err(_) => return None,
        };
        Some(MockServer::builder().listener(listener).start().await)
    }

    fn project_body() -> serde_json::Value {
        serde_json::json!({
            "timestamp": 0,
            "qualityProfiles": [
                {"key": "rust-sonar-way", "name": "Sonar way", "language": "rust", "lastUsed": "2025-01-01T00:00:00+0000"}
            ],
            "activeRules": {
                "rust:S3776": {"repositoryKey": "rust", "ruleKey": "S3776", "severity": "CRITICAL"}
            },
            "fileDataByModuleAndPath": {
                "my-project": {"src/main.rs": {"hash": "abc"}}
            }
        })
    }

    #[tokio::test]
    async fn test_run_project_success() {
        let mock_server = match try_mock_server().await {
            Some(s) => s,
            None => return,
        };
        Mock::given(method("GET"))
            .and(path("/batch/project"))
            .and(query_param("key", "my-project"))
            .and(query_param("preview", "false"))
            .and(query_param_is_missing("profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = SonarQubeConfig::new(mock_server.uri());
        let context = LoadContext::new("my-project");
        let exit = run(config, &context, false).await;
        assert_eq!(exit, 0);
    }

    #[tokio::test]
    async fn test_run_project_issues_mode_with_profile_json() {
        let mock_server = match try_mock_server().await {
            Some(s) => s,
            None => return,
        };
        Mock::given(method("GET"))
            .and(path("/batch/project"))
            .and(query_param("key", "my project"))
            .and(query_param("profile", "my-profile#2"))
            .and(query_param("preview", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = SonarQubeConfig::new(mock_server.uri());
        let context = LoadContext::new("my project")
            .with_profile("my-profile#2")
            .with_mode(AnalysisMode::Issues);
        let exit = run(config, &context, true).await;
        assert_eq!(exit, 0);
    }

    #[tokio::test]
    async fn test_run_project_without_profiles_fails() {
        let mock_server = match try_mock_server().await {
            Some(s) => s,
            None => return,
        };
        Mock::given(method("GET"))
            .and(path("/batch/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let config = SonarQubeConfig::new(mock_server.uri());
        let exit = run(config, &LoadContext::new("foo"), false).await;
        assert_eq!(exit, 1);
    }

    #[tokio::test]
    async fn test_run_project_api_error() {
        let mock_server = match try_mock_server().await {
            Some(s) => s,
            None => return,
        };
        Mock::given(method("GET"))
            .and(path("/batch/project"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let config = SonarQubeConfig::new(mock_server.uri());
        let exit = run(config, &LoadContext::new("foo"), false).await;
        assert_eq!(exit, 1);
    }

    #[tokio::test]
    async fn test_run_project_twice_asks_server_each_time() {
        let mock_server = match try_mock_server().await {
            Some(s) => s,
            None => return,
        };
        Mock::given(method("GET"))
            .and(path("/batch/project"))
            .and(query_param("key", "foo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
            .expect(2)
            .mount(&mock_server)
            .await;

        let context = LoadContext::new("foo");
        let first = run(SonarQubeConfig::new(mock_server.uri()), &context, false).await;
        let second = run(SonarQubeConfig::new(mock_server.uri()), &context, true).await;
        assert_eq!((first, second), (0, 0));
    }
}
