//! Async executor for controller effects.

use std::{collections::VecDeque, sync::Arc};

use log::{debug, warn};

use super::{Controller, Effect, Event, Persist};
use crate::{
    config::WorkflowConfig,
    error::Result,
    models::CodingRequest,
    providers::{ExecutionProvider, GenerationProvider},
    session::{Session, User},
    store::RequestStore,
};

/// Drives a [`Controller`] against real providers and a store.
///
/// Effects are performed one at a time in the order the controller issued
/// them, and every completion is fed straight back, so a single
/// [`WorkflowRunner::dispatch`] runs until the workflow is waiting on the
/// user again.
pub struct WorkflowRunner {
    controller: Controller,
    generator: Arc<dyn GenerationProvider>,
    executor: Arc<dyn ExecutionProvider>,
    store: Arc<dyn RequestStore>,
    config: WorkflowConfig,
}

impl WorkflowRunner {
    pub fn new(
        session: Session,
        generator: Arc<dyn GenerationProvider>,
        executor: Arc<dyn ExecutionProvider>,
        store: Arc<dyn RequestStore>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            controller: Controller::new(session),
            generator,
            executor,
            store,
            config,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn login(&mut self, user_id: &str) -> Result<&User> {
        self.controller.login(user_id)
    }

    /// Signs out and drops the live request.
    pub fn logout(&mut self) -> Option<User> {
        self.controller.logout()
    }

    /// Requests of the signed-in user, newest first.
    pub async fn history(&self) -> Result<Vec<CodingRequest>> {
        let user = self.controller.session().require_user()?;
        self.store.list_by_user(&user.id).await
    }

    /// Handles `event` and every effect that follows from it.
    ///
    /// # Errors
    ///
    /// Returns the controller's error when the event is refused. Store
    /// failures do not stop the workflow; they are logged as they happen and
    /// the first one is returned once the queue is drained.
    pub async fn dispatch(&mut self, event: Event) -> Result<()> {
        let mut queue: VecDeque<Effect> = self.controller.handle(event)?.into();
        let mut store_error = None;

        while let Some(effect) = queue.pop_front() {
            match self.perform(effect).await {
                Ok(Some(completion)) => queue.extend(self.controller.handle(completion)?),
                Ok(None) => {}
                Err(err) => {
                    warn!("Failed to persist request: {err}");
                    if store_error.is_none() {
                        store_error = Some(err);
                    }
                }
            }
        }

        match store_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn perform(&self, effect: Effect) -> Result<Option<Event>> {
        let completion = match effect {
            Effect::Persist(op) => {
                self.persist(op).await?;
                return Ok(None);
            }
            Effect::GeneratePlan {
                ticket,
                description,
            } => {
                debug!("{}: generating plan", self.generator.name());
                Event::PlanGenerated {
                    ticket,
                    result: self.generator.generate_plan(&description).await,
                }
            }
            Effect::GenerateCode {
                ticket,
                description,
                plan,
            } => {
                debug!("{}: generating code", self.generator.name());
                Event::CodeGenerated {
                    ticket,
                    result: self.generator.generate_code(&description, &plan).await,
                }
            }
            Effect::Execute {
                ticket,
                code,
                after_debug,
            } => {
                if after_debug && !self.config.post_debug_delay.is_zero() {
                    tokio::time::sleep(self.config.post_debug_delay).await;
                }
                debug!("Executing {} bytes of code", code.len());
                Event::Executed {
                    ticket,
                    result: self.executor.execute_code(&code).await,
                }
            }
            Effect::Debug {
                ticket,
                code,
                errors,
            } => {
                debug!("{}: debugging code", self.generator.name());
                Event::Debugged {
                    ticket,
                    result: self.generator.debug_code(&code, &errors).await,
                }
            }
            Effect::GenerateFollowUp {
                ticket,
                description,
                code,
                explanation,
                question,
            } => {
                debug!(
                    "{}: generating follow-up (explanation={explanation}, question={question})",
                    self.generator.name()
                );
                let (explanation, question) = match (explanation, question) {
                    (true, true) => {
                        let result = self.generator.generate_follow_up(&description, &code).await;
                        (Some(result.explanation), Some(result.question))
                    }
                    (true, false) => (
                        Some(self.generator.generate_explanation(&description, &code).await),
                        None,
                    ),
                    (false, true) => (
                        None,
                        Some(
                            self.generator
                                .generate_follow_up_question(&description, &code)
                                .await,
                        ),
                    ),
                    (false, false) => (None, None),
                };
                Event::FollowUpGenerated {
                    ticket,
                    explanation,
                    question,
                }
            }
        };
        Ok(Some(completion))
    }

    async fn persist(&self, op: Persist) -> Result<()> {
        match op {
            Persist::Create { user_id, request } => {
                let id = self.store.create(&user_id, &request).await?;
                debug!("Stored request {id} for {user_id}");
            }
            Persist::Update { id, update } => {
                if !update.is_empty() {
                    self.store.update(&id, update).await?;
                }
            }
        }
        Ok(())
    }
}
