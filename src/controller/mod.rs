pub mod dispatcher;
pub mod engine;

use anyhow::Result;
use std::sync::Arc;

use crate::access::AccessControl;
use crate::analysis::GridAnalyzer;
use crate::command::{CommandExecutor, CommandRouter, OperationRegistry};
use crate::config::Config;
use crate::domain::RegionRegistry;
use crate::optimizer::GridSolver;
use crate::repo::{Repositories, ResultCache, StateStore};

pub use dispatcher::{AsyncDispatcher, JobHandle, JobInfo, JobStatus};
pub use engine::OptimizationEngine;

/// Everything a front-end needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub regions: Arc<RegionRegistry>,
    pub access: AccessControl,
    pub engine: Arc<OptimizationEngine>,
    pub analyzer: Arc<GridAnalyzer>,
    pub dispatcher: AsyncDispatcher,
    pub commands: Arc<CommandExecutor>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Repositories::new(&cfg).await?;
        Ok(Self::with_repositories(cfg, repos))
    }

    pub fn with_repositories(cfg: Config, repos: Repositories) -> Self {
        let access = AccessControl::new(&cfg.regions.allow_list);
        let regions = Arc::new(RegionRegistry::new(cfg.regions.catalog.clone()));

        let states = StateStore::new(repos.states, access.clone());
        let results = ResultCache::new(repos.results, access.clone());
        let solver = GridSolver::new(cfg.grid.solver());

        let engine = Arc::new(OptimizationEngine::new(
            access.clone(),
            states.clone(),
            results.clone(),
            solver,
        ));
        let analyzer = Arc::new(GridAnalyzer::new(
            access.clone(),
            states,
            results,
            cfg.grid.history_limit,
        ));
        let dispatcher = AsyncDispatcher::new(engine.clone());

        let registry = OperationRegistry::standard(engine.clone(), analyzer.clone());
        let commands = Arc::new(CommandExecutor::new(
            CommandRouter::new(&access),
            registry,
            cfg.grid.max_command_len,
        ));

        Self {
            cfg: Arc::new(cfg),
            regions,
            access,
            engine,
            analyzer,
            dispatcher,
            commands,
        }
    }

    /// In-memory wiring used by tests and the CLI.
    pub fn in_memory(cfg: Config) -> Self {
        Self::with_repositories(cfg, Repositories::in_memory())
    }
}
