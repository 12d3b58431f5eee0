//! 流水线执行引擎：具名阶段、共享类型化上下文、按转移标签路由。
//!
//! # Pipeline Engine
//!
//! A pipeline is a set of named stages sharing one mutable, typed context.
//! Each stage runs in three steps:
//!
//! ```text
//!   prepare(&mut ctx) ──► compute(input).await ──► commit(&mut ctx, output)
//!    read inputs or        the only step that        write results, return
//!    take a move-only      may perform I/O           a transition label
//!    artifact; no I/O
//! ```
//!
//! The label returned by `commit` is looked up in the stage's routes. A routed
//! label moves to the successor stage; an unrouted label ends the run and
//! hands the context back. Any stage error aborts the run and is returned
//! unchanged; the context is dropped with it.
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | SSE line decoder (bytes → JSON frames) |
//! | [`assemble`] | Streaming assembler (events → one response object) |
//! | [`stages`] | Chat stages and the default prepare → call → finalize pipeline |
//!
//! ## Example
//!
//! ```rust
//! use anthropic_speak::pipeline::{PipelineBuilder, Stage, Transition};
//!
//! struct Double;
//!
//! #[async_trait::async_trait]
//! impl Stage<Vec<u32>> for Double {
//!     type Input = u32;
//!     type Output = u32;
//!
//!     fn prepare(&self, ctx: &mut Vec<u32>) -> anthropic_speak::Result<u32> {
//!         Ok(*ctx.last().unwrap_or(&1))
//!     }
//!
//!     async fn compute(&self, input: u32) -> anthropic_speak::Result<u32> {
//!         Ok(input * 2)
//!     }
//!
//!     fn commit(&self, ctx: &mut Vec<u32>, output: u32) -> anthropic_speak::Result<Transition> {
//!         ctx.push(output);
//!         Ok(if output < 8 { "again".into() } else { "done".into() })
//!     }
//! }
//!
//! # tokio_test_block_on(async {
//! let pipeline = PipelineBuilder::new()
//!     .stage("double", Double)
//!     .route("double", "again", "double")
//!     .build()
//!     .unwrap();
//! let ctx = pipeline.run(vec![1]).await.unwrap();
//! assert_eq!(ctx, vec![1, 2, 4, 8]);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod assemble;
pub mod decode;
pub mod stages;


use std::collections::HashMap;
use tracing::{debug, warn};

use crate::Result;

pub use assemble::{assemble, AssemblerState, StreamAssembler};
pub use decode::SseDecoder;
pub use stages::{chat_pipeline, ChatContext, RawResponse};

/// Default bound on stage executions per run.
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Label returned by a stage's `commit` step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transition(String);

impl Transition {
    pub fn new(label: impl Into<String>) -> Self {
        Transition(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Transition {
    fn from(label: &str) -> Self {
        Transition::new(label)
    }
}

impl From<String> for Transition {
    fn from(label: String) -> Self {
        Transition(label)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work in a pipeline over context `C`.
#[async_trait::async_trait]
pub trait Stage<C: Send>: Send + Sync {
    type Input: Send;
    type Output: Send;

    /// Pull inputs out of the context. Must not perform I/O.
    ///
    /// Treat the context as read-only here. The mutable borrow exists only so
    /// a stage can move out a single-use artifact, such as a response byte
    /// stream, with `Option::take`; every other write belongs in `commit`.
    fn prepare(&self, ctx: &mut C) -> Result<Self::Input>;

    /// Do the work.
    async fn compute(&self, input: Self::Input) -> Result<Self::Output>;

    /// Store the results and pick the next transition.
    fn commit(&self, ctx: &mut C, output: Self::Output) -> Result<Transition>;
}

/// Object-safe view of a [`Stage`], so stages with different input and
/// output types can live in one pipeline.
#[async_trait::async_trait]
trait StageRunner<C>: Send + Sync {
    async fn run(&self, ctx: &mut C) -> Result<Transition>;
}

#[async_trait::async_trait]
impl<C, S> StageRunner<C> for S
where
    C: Send,
    S: Stage<C>,
{
    async fn run(&self, ctx: &mut C) -> Result<Transition> {
        let input = self.prepare(ctx)?;
        let output = self.compute(input).await?;
        self.commit(ctx, output)
    }
}

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Step limit of {limit} exceeded at stage '{stage}'")]
    StepLimit { limit: usize, stage: String },

    #[error("Stage '{stage}' found no {artifact} in the context{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    MissingArtifact {
        stage: String,
        artifact: String,
        hint: Option<String>,
    },
}

impl PipelineError {
    pub fn missing_artifact(stage: impl Into<String>, artifact: impl Into<String>) -> Self {
        PipelineError::MissingArtifact {
            stage: stage.into(),
            artifact: artifact.into(),
            hint: None,
        }
    }

    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        if let PipelineError::MissingArtifact { ref mut hint, .. } = self {
            *hint = hint_val;
        }
        self
    }
}

struct StageSlot<C> {
    name: String,
    runner: Box<dyn StageRunner<C>>,
    routes: HashMap<String, usize>,
}

/// Builder for [`Pipeline`]. Names are resolved and checked in [`build`](Self::build).
pub struct PipelineBuilder<C> {
    stages: Vec<(String, Box<dyn StageRunner<C>>)>,
    routes: Vec<(String, String, String)>,
    start: Option<String>,
    max_steps: usize,
}

impl<C: Send + 'static> PipelineBuilder<C> {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            routes: Vec::new(),
            start: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Register a stage. The first registered stage is the default start.
    pub fn stage<S>(mut self, name: impl Into<String>, stage: S) -> Self
    where
        S: Stage<C> + 'static,
    {
        self.stages.push((name.into(), Box::new(stage)));
        self
    }

    /// Route `label` returned by stage `from` to stage `to`.
    pub fn route(
        mut self,
        from: impl Into<String>,
        label: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.routes.push((from.into(), label.into(), to.into()));
        self
    }

    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    pub fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = n.max(1);
        self
    }

    pub fn build(self) -> std::result::Result<Pipeline<C>, PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::Configuration(
                "a pipeline needs at least one stage".to_string(),
            ));
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, (name, _)) in self.stages.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(PipelineError::Configuration(format!(
                    "duplicate stage name '{}'",
                    name
                )));
            }
        }
        let lookup = |name: &str| {
            index.get(name).copied().ok_or_else(|| {
                PipelineError::Configuration(format!("unknown stage '{}'", name))
            })
        };

        let mut slots: Vec<StageSlot<C>> = self
            .stages
            .into_iter()
            .map(|(name, runner)| StageSlot {
                name,
                runner,
                routes: HashMap::new(),
            })
            .collect();

        for (from, label, to) in self.routes {
            let from_idx = lookup(&from)?;
            let to_idx = lookup(&to)?;
            if slots[from_idx].routes.insert(label.clone(), to_idx).is_some() {
                return Err(PipelineError::Configuration(format!(
                    "label '{}' of stage '{}' is routed twice",
                    label, from
                )));
            }
        }

        let start = match self.start {
            Some(name) => lookup(&name)?,
            None => 0,
        };

        Ok(Pipeline {
            stages: slots,
            start,
            max_steps: self.max_steps,
        })
    }
}

impl<C: Send + 'static> Default for PipelineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable, reusable pipeline. Each [`run`](Self::run) owns its own context.
pub struct Pipeline<C> {
    stages: Vec<StageSlot<C>>,
    start: usize,
    max_steps: usize,
}

impl<C: Send> Pipeline<C> {
    pub fn stage_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.stages.iter().map(|s| s.name.as_str())
    }

    /// Run from the start stage until a label has no route.
    pub async fn run(&self, mut ctx: C) -> Result<C> {
        let mut current = self.start;
        for step in 0..self.max_steps {
            let slot = &self.stages[current];
            debug!(stage = %slot.name, step, "stage started");

            let transition = match slot.runner.run(&mut ctx).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(stage = %slot.name, step, error = %e, "stage failed");
                    return Err(e);
                }
            };

            match slot.routes.get(transition.as_str()) {
                Some(&next) => {
                    debug!(
                        stage = %slot.name,
                        label = %transition,
                        next = %self.stages[next].name,
                        "stage finished"
                    );
                    current = next;
                }
                None => {
                    debug!(stage = %slot.name, label = %transition, "pipeline finished");
                    return Ok(ctx);
                }
            }
        }
        Err(PipelineError::StepLimit {
            limit: self.max_steps,
            stage: self.stages[current].name.clone(),
        }
        .into())
    }
}

impl<C> std::fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            )
            .field("start", &self.stages[self.start].name)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}
