//! Pipeline Controller
//!
//! Generate -> Validate -> Execute -> Summarize, with Validate/Execute failures
//! routed through a bounded Repair loop. Every failure is absorbed into the
//! session; the caller always receives an answer.

use crate::chart::{heuristic_request, parse_directive, ChartSpecBuilder, PlotlyChartBuilder};
use crate::db::{QueryExecutor, Row, SchemaProvider};
use crate::execution_loop::repair::repair_prompt;
use crate::execution_loop::stage::{can_repair, transition, Outcome, Stage, StageReport, MAX_REPAIR_ATTEMPTS};
use crate::execution_loop::state::{PipelineAnswer, SessionState};
use crate::extract::{extract_sql, strip_json_blocks};
use crate::guardrails::{Redactor, RegexPiiRedactor};
use crate::llm::TextGenerator;
use crate::prompting::{generation_prompt, summary_prompt, system_prompt};
use crate::validation::validate_sql;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

pub const NO_DATA_ANSWER: &str = "Query executed successfully but returned no data.";

/// Called on entry to every stage.
pub type StageObserver = Arc<dyn Fn(Stage) + Send + Sync>;

pub struct PipelineController {
    generator: Arc<dyn TextGenerator>,
    executor: Arc<dyn QueryExecutor>,
    schema: Arc<dyn SchemaProvider>,
    charts: Arc<dyn ChartSpecBuilder>,
    redactor: Arc<dyn Redactor>,
    observer: Option<StageObserver>,
}

impl PipelineController {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        executor: Arc<dyn QueryExecutor>,
        schema: Arc<dyn SchemaProvider>,
    ) -> Self {
        Self {
            generator,
            executor,
            schema,
            charts: Arc::new(PlotlyChartBuilder::new()),
            redactor: Arc::new(RegexPiiRedactor::new()),
            observer: None,
        }
    }

    pub fn with_chart_builder(mut self, charts: Arc<dyn ChartSpecBuilder>) -> Self {
        self.charts = charts;
        self
    }

    pub fn with_redactor(mut self, redactor: Arc<dyn Redactor>) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(Stage) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Run one question and return only what crosses the caller boundary.
    pub async fn answer(&self, question: &str) -> PipelineAnswer {
        self.run(question).await.into_answer()
    }

    /// Run one question to a terminal stage and return the full session.
    ///
    /// Everything logged during the run, collaborators included, is inside a
    /// `session` span carrying the session id.
    pub async fn run(&self, question: &str) -> SessionState {
        let state = SessionState::new(question);
        let span = info_span!("session", id = %state.session_id);
        self.drive(state).instrument(span).await
    }

    async fn drive(&self, mut state: SessionState) -> SessionState {
        info!("Question: {}", state.question);

        let system_context = self.system_context().await;
        let mut stage = Stage::Generate;

        loop {
            state.history.push(stage);
            if let Some(observer) = &self.observer {
                observer(stage);
            }

            let report = match stage {
                Stage::Generate => self.generate(&mut state, &system_context).await,
                Stage::Validate => self.validate(&mut state),
                Stage::Execute => self.execute(&mut state).await,
                Stage::Repair => self.repair(&mut state, &system_context).await,
                Stage::Summarize => self.summarize(&mut state).await,
                Stage::Terminal(outcome) => {
                    let elapsed_ms = (Utc::now() - state.started_at).num_milliseconds();
                    match outcome {
                        Outcome::Success => {
                            info!("✅ Answered after {} repair(s) in {} ms", state.retry_count, elapsed_ms)
                        }
                        Outcome::Failure => {
                            warn!("Gave up after {} repair(s) in {} ms", state.retry_count, elapsed_ms)
                        }
                    }
                    break;
                }
            };

            let next = transition(report);
            debug!("{} --{:?}--> {}", stage, report, next);
            stage = next;
        }

        state
    }

    async fn system_context(&self) -> String {
        let schema = match self.schema.describe_schema().await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Schema description failed: {}", e);
                String::new()
            }
        };
        system_prompt(&schema)
    }

    async fn generate(&self, state: &mut SessionState, system_context: &str) -> StageReport {
        let prompt = generation_prompt(system_context, &state.question);
        state.sql_query = match self.generator.generate(&prompt).await {
            Ok(response) => extract_sql(&response),
            Err(e) => {
                warn!("Generation failed: {}", e);
                String::new()
            }
        };
        state.retry_count = 0;
        state.sql_error = None;

        info!("Generated SQL: {}", state.sql_query);
        StageReport::Generated
    }

    fn validate(&self, state: &mut SessionState) -> StageReport {
        match validate_sql(&state.sql_query) {
            Ok(()) => {
                state.sql_error = None;
                StageReport::Valid
            }
            Err(violation) => {
                warn!("Validation failed: {}", violation);
                state.sql_error = Some(violation.to_string());
                StageReport::Invalid
            }
        }
    }

    async fn execute(&self, state: &mut SessionState) -> StageReport {
        match self.executor.execute(&state.sql_query).await {
            Ok(rows) => {
                info!("Query returned {} row(s)", rows.len());
                state.query_result = Some(rows);
                state.sql_error = None;
                StageReport::Executed
            }
            Err(e) => {
                warn!("Execution failed: {}", e);
                state.sql_error = Some(e.to_string());
                StageReport::ExecutionFailed
            }
        }
    }

    async fn repair(&self, state: &mut SessionState, system_context: &str) -> StageReport {
        let error = state
            .sql_error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string());

        if !can_repair(state.retry_count) {
            state.final_answer = Some(format!(
                "I tried {} times but failed. Last error: {}",
                MAX_REPAIR_ATTEMPTS, error
            ));
            return StageReport::Exhausted;
        }

        info!("Repair attempt {} of {}", state.retry_count + 1, MAX_REPAIR_ATTEMPTS);

        let prompt = repair_prompt(system_context, &state.sql_query, &error);
        match self.generator.generate(&prompt).await {
            Ok(response) => state.sql_query = extract_sql(&response),
            Err(e) => warn!("Repair generation failed, keeping previous query: {}", e),
        }
        state.sql_error = None;
        state.retry_count += 1;

        StageReport::Repaired
    }

    async fn summarize(&self, state: &mut SessionState) -> StageReport {
        let rows = state.query_result.take().unwrap_or_default();

        if rows.is_empty() {
            state.final_answer = Some(NO_DATA_ANSWER.to_string());
            state.visualization_spec = None;
            state.query_result = Some(rows);
            return StageReport::Summarized;
        }

        let prompt = summary_prompt(&state.question, &state.sql_query, &rows);
        let (prose, directive) = match self.generator.generate(&prompt).await {
            Ok(response) => (strip_json_blocks(&response), parse_directive(&response)),
            Err(e) => {
                warn!("Summary generation failed: {}", e);
                (String::new(), None)
            }
        };
        let prose = if prose.is_empty() {
            format!("The query returned {} row(s).", rows.len())
        } else {
            prose
        };

        state.visualization_spec = self.build_chart(state, &rows, directive);
        state.final_answer = Some(self.redactor.redact(&prose));
        state.query_result = Some(rows);

        StageReport::Summarized
    }

    fn build_chart(
        &self,
        state: &SessionState,
        rows: &[Row],
        directive: Option<crate::chart::ChartDirective>,
    ) -> Option<serde_json::Value> {
        let request = match directive {
            Some(directive) => Some(directive.resolve(rows, &state.question)),
            None => heuristic_request(&state.question, rows),
        }?;

        match self.charts.build(rows, &request) {
            Ok(spec) => {
                info!("Built {} chart ({} vs {})", request.chart_type, request.x_axis, request.y_axis);
                Some(spec)
            }
            Err(e) => {
                warn!("Chart skipped: {}", e);
                None
            }
        }
    }
}
