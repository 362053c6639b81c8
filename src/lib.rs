//! Batch-side access to SonarQube project repositories
//!
//! Before an analysis starts, the batch asks the server which quality profiles,
//! active rules and per-file data apply to the project. [`loader::ProjectRepositoriesLoader`]
//! does that through any [`ws_loader::WsLoader`] transport and rejects
//! responses an analysis cannot run with.

pub mod client;
pub mod config;
pub mod loader;
pub mod query;
pub mod types;
pub mod ws_loader;

pub use client::{SonarQubeClient, SonarQubeConfig, SonarQubeError};
pub use loader::{AnalysisMode, LoadContext, ProjectRepositoriesLoader};
pub use types::{ActiveRule, FileData, ProjectRepositories, QProfile};
pub use ws_loader::{CachedWsLoader, LoadStrategy, WsLoader, WsLoaderResult};
