//! Command handlers for the `cf` binary.
//!
//! `run` drives a [`WorkflowRunner`] step by step, either through prompts or
//! automatically with `--yes`. `history` and `show` read the store directly.

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use codeflow_core::{
    models::MAX_DEBUG_ATTEMPTS,
    providers::{GenerationProvider, GeminiGenerator, SimulatedExecutor, TemplateGenerator},
    Elapsed, Event, OperationStatus, RequestStore, Requests, Session, SqliteStore, WorkflowError,
    WorkflowRunner, WorkflowStep,
};
use jiff::Timestamp;
use log::{debug, info};

use crate::{
    args::{HistoryArgs, ProviderArg, RunArgs, ShowArgs},
    panels,
    renderer::TerminalRenderer,
};

pub struct Cli {
    store: SqliteStore,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(store: SqliteStore, renderer: TerminalRenderer) -> Self {
        Self { store, renderer }
    }

    /// Runs one request from description to follow-up.
    pub async fn run(&self, args: &RunArgs) -> Result<()> {
        let config = args.workflow_config();
        let generator: Arc<dyn GenerationProvider> = match args.provider {
            ProviderArg::Mock => Arc::new(TemplateGenerator::new(&config)),
            ProviderArg::Gemini => Arc::new(GeminiGenerator::new(args.gemini_config()?)?),
        };
        let executor = Arc::new(SimulatedExecutor::new(&config));

        let mut runner = WorkflowRunner::new(
            Session::signed_in(&args.user)?,
            generator,
            executor,
            Arc::new(self.store.clone()),
            config,
        );
        info!(
            "Running request for {} with the {} provider",
            args.user,
            runner.generator_name()
        );

        runner
            .dispatch(Event::Submit {
                description: args.description.clone(),
            })
            .await?;

        if args.yes {
            self.run_unattended(&mut runner, args.plan_file.as_deref())
                .await?;
        } else {
            self.run_interactive(&mut runner).await?;
        }

        if let Some(request) = runner.controller().request() {
            let elapsed = Elapsed(request.elapsed(Timestamp::now()));
            self.renderer.status(&OperationStatus::success(format!(
                "Request ID: {} ({}, {elapsed})",
                request.id,
                request.status.with_icon()
            )))?;
        }
        Ok(())
    }

    /// Approves, executes, debugs, and completes without asking.
    async fn run_unattended(
        &self,
        runner: &mut WorkflowRunner,
        plan_file: Option<&Path>,
    ) -> Result<()> {
        let mut plan_override = match plan_file {
            Some(path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("Failed to read plan file {}", path.display()))?,
            ),
            None => None,
        };

        loop {
            let controller = runner.controller();
            panels::render(&self.renderer, controller)?;

            if let Some(failure) = controller.failure() {
                anyhow::bail!("{failure}");
            }

            let event = match controller.step() {
                WorkflowStep::Request => return Ok(()),
                WorkflowStep::Plan => match plan_override.take() {
                    Some(text) => Event::EditPlan { text },
                    None => Event::Approve,
                },
                WorkflowStep::Code => {
                    let Some(request) = controller.request() else {
                        return Ok(());
                    };
                    if controller.can_complete() {
                        Event::Complete
                    } else if request.errors.is_empty() {
                        Event::Execute
                    } else if controller.can_debug() {
                        Event::Debug
                    } else {
                        return Err(WorkflowError::DebugBudgetExhausted {
                            max: MAX_DEBUG_ATTEMPTS,
                        }
                        .into());
                    }
                }
                WorkflowStep::FollowUp => return Ok(()),
            };

            debug!("Auto-selected event: {}", event.action());
            runner.dispatch(event).await?;
        }
    }

    /// Prompts for each step until the user quits.
    async fn run_interactive(&self, runner: &mut WorkflowRunner) -> Result<()> {
        loop {
            panels::render(&self.renderer, runner.controller())?;

            let Some(event) = panels::prompt(runner.controller())? else {
                return Ok(());
            };

            // Refused events are reported and the same panel is shown again.
            if let Err(err) = runner.dispatch(event).await {
                self.renderer
                    .status(&OperationStatus::failure(err.to_string()))?;
            }
        }
    }

    /// Lists a user's requests, newest first.
    pub async fn history(&self, args: &HistoryArgs) -> Result<()> {
        let session = Session::signed_in(&args.user)?;
        let user = session.require_user()?;
        let requests = self.store.list_by_user(&user.id).await?;
        self.renderer.render(&Requests(requests).to_string())
    }

    /// Shows one stored request.
    pub async fn show(&self, args: &ShowArgs) -> Result<()> {
        let stored = self
            .store
            .get(&args.id)
            .await?
            .ok_or_else(|| WorkflowError::RequestNotFound {
                id: args.id.clone(),
            })?;
        self.renderer.render(&stored.to_string())
    }
}
