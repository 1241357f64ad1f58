//! Core ReAct reasoning loop: Think → Act → Observe.
//!
//! For one query the loop:
//! 1. Sends the transcript and tool definitions to the model
//! 2. Decodes the response into a single step
//! 3. Executes the chosen tool, or corrects a malformed / unknown choice
//! 4. Feeds the observation back and repeats
//!
//! A final answer is the only successful exit; every model call consumes
//! one step, so the loop always ends within `max_steps`.

use crate::agent::{context, injection_defense, step, system_prompt, Agent, AgentError};
use crate::config::ResearchConfig;
use crate::inference::ChatModel;
use crate::tools::ToolRegistry;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bounded tool-selection loop around an external chat model.
pub struct ReasoningLoop {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    system_prompt: String,
    max_steps: u32,
    max_consecutive_errors: u32,
}

impl ReasoningLoop {
    pub fn new(config: &ResearchConfig, model: Arc<dyn ChatModel>, registry: ToolRegistry) -> Self {
        let system_prompt = system_prompt::build_system_prompt(&registry, &config.model);
        Self {
            model,
            registry,
            system_prompt,
            max_steps: config.max_steps.max(1),
            max_consecutive_errors: config.max_consecutive_errors.max(1),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Answer one query.
    pub async fn run(&self, query: &str) -> Result<String, AgentError> {
        info!("New query: {}", preview(query, 200));

        let definitions = self.registry.definitions();
        let tool_names = self.registry.names();
        let mut transcript = context::initial_transcript(&self.system_prompt, query);
        let mut consecutive_errors: u32 = 0;
        let mut partial: Option<String> = None;
        let mut state = LoopState::Thinking;

        for step_number in 1..=self.max_steps {
            debug!("[Step {}/{}] {}", step_number, self.max_steps, state);

            let response = match self.model.chat(&transcript, &definitions).await {
                Ok(resp) => {
                    consecutive_errors = 0;
                    resp
                }
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(
                        "[Step {}] Inference error ({}/{}): {:#}",
                        step_number, consecutive_errors, self.max_consecutive_errors, e
                    );
                    if consecutive_errors >= self.max_consecutive_errors {
                        return Err(AgentError::Inference(format!("{:#}", e)));
                    }
                    continue;
                }
            };

            if let Some(content) = response.content.as_deref().map(str::trim) {
                if !content.is_empty() {
                    partial = Some(content.to_string());
                }
            }

            match step::decode(&response) {
                ReasoningStep::FinalAnswer(answer) => {
                    state = LoopState::Done;
                    info!(
                        "[Step {}] {}: {} chars",
                        step_number,
                        state,
                        answer.len()
                    );
                    return Ok(answer);
                }
                ReasoningStep::Malformed(reason) => {
                    warn!("[Step {}] Malformed step: {}", step_number, reason);
                    let feedback = context::malformed_feedback(&reason, &tool_names);
                    context::push_correction(&mut transcript, &response, &feedback);
                }
                ReasoningStep::ToolInvocation {
                    call_id,
                    tool_name,
                    argument,
                } => {
                    state = LoopState::Acting;
                    debug!("[Step {}] {} {}", step_number, state, tool_name);
                    transcript.push(ChatMessage::assistant(
                        response.content.clone().unwrap_or_default(),
                        response.tool_calls.clone(),
                    ));

                    let observation = self.act(step_number, &tool_name, &argument).await?;
                    if observation.is_error() {
                        debug!("[Step {}] Feeding error back to the model", step_number);
                    }
                    transcript.push(ChatMessage::tool(
                        call_id.clone(),
                        injection_defense::sanitize_observation(&observation.render()),
                    ));

                    for extra in response.tool_calls.iter().filter(|c| c.id != call_id) {
                        debug!("[Step {}] Skipping extra tool call {}", step_number, extra.name);
                        transcript.push(ChatMessage::tool(extra.id.clone(), context::SKIPPED_CALL));
                    }
                    state = LoopState::Thinking;
                }
            }
        }

        warn!("Step limit ({}) reached without a final answer", self.max_steps);
        Err(AgentError::IterationLimit {
            steps: self.max_steps,
            partial,
        })
    }

    /// Resolve and invoke one tool, converting failures into observations.
    ///
    /// Only a failed local write escapes as an error.
    async fn act(
        &self,
        step_number: u32,
        tool_name: &str,
        argument: &str,
    ) -> Result<Observation, AgentError> {
        info!(
            "[Step {}] Tool: {}({})",
            step_number,
            tool_name,
            preview(argument, 120)
        );

        let Some(tool) = self.registry.find(tool_name) else {
            warn!("[Step {}] Unknown tool '{}'", step_number, tool_name);
            return Ok(Observation {
                tool_name: tool_name.to_string(),
                argument: argument.to_string(),
                result: Err(context::invalid_tool_message(
                    tool_name,
                    &self.registry.names(),
                )),
            });
        };

        let result = match tool.invoke(argument).await {
            Ok(output) => {
                info!("[Step {}] Tool result: {} chars", step_number, output.len());
                Ok(output)
            }
            Err(e) if e.is_recoverable() => {
                warn!("[Step {}] Tool error: {}", step_number, e);
                Err(e.to_string())
            }
            Err(e) => return Err(AgentError::Persistence(e)),
        };

        Ok(Observation {
            tool_name: tool_name.to_string(),
            argument: argument.to_string(),
            result,
        })
    }
}

#[async_trait]
impl Agent for ReasoningLoop {
    async fn run(&self, query: &str) -> Result<String, AgentError> {
        ReasoningLoop::run(self, query).await
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push('…');
    }
    out.replace('\n', " ")
}
