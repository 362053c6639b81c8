//! Output formatting — human-readable and JSON

use sonar_batch::types::ProjectRepositories;
use sonar_batch::ws_loader::WsLoaderResult;

/// Print value as JSON to stdout
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize JSON: {e}"),
    }
}

/// Format loaded project repositories
pub fn print_project_repositories(
    loaded: &WsLoaderResult<ProjectRepositories>,
    project: &str,
    json: bool,
) {
    let repo = &loaded.result;
    if json {
        print_json(&serde_json::json!({
            "project": project,
            "fromCache": loaded.from_cache,
            "repositories": repo,
        }));
        return;
    }

    let origin = if loaded.from_cache { "cache" } else { "server" };
    println!("Project repositories for {project} (from {origin})");
    if let Some(ref date) = repo.last_analysis_date {
        println!("Last analysis: {date}");
    }

    println!();
    println!("  {:<30} {:<30} {:<10} Last used", "Profile", "Key", "Language");
    println!("  {}", "-".repeat(85));
    for profile in repo.quality_profiles() {
        println!(
            "  {:<30} {:<30} {:<10} {}",
            profile.name,
            profile.key,
            profile.language,
            profile.last_used.as_deref().unwrap_or("-")
        );
    }

    println!();
    println!("Active rules: {}", repo.active_rules().len());
    println!("Files known:  {}", repo.file_count());
}
