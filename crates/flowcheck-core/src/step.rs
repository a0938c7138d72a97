//! Step descriptors and the caller-side builders that produce them.
//!
//! The engine never inspects how a step was declared: it only sees a kind, a
//! description and an action. `Step::transition`, `Step::query` and
//! `Step::check` adapt plain closures into actions; `Step::from_parts` is the
//! entry point for external classifiers that already produce full actions.
//!
//! Every builder records the caller's source location, which is used as the
//! location hint in failure diagnostics.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use flowcheck_types::{AssertionError, Cid, EngineError, FailureKind, StepFailure, StepKind, World};
use serde_json::Value;

use crate::retry::RetryPolicy;

/// What a step action receives besides the world.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Cid of this step invocation.
    pub cid: &'a Cid,
    pub description: &'a str,
    pub kind: StepKind,
    pub location: &'static Location<'static>,
}

/// A step action: the next world on success, a failure otherwise.
pub type ActionFn = Arc<dyn Fn(&StepContext<'_>, &World) -> Result<World, StepFailure> + Send + Sync>;

/// How a step is executed.
#[derive(Clone)]
pub enum StepAction {
    /// Invoke a single action.
    Run(ActionFn),
    /// Run the wrapped steps in order under a bounded retry loop.
    Retry(RetryGroup),
}

/// A run of consecutive retriable steps executed as one unit.
#[derive(Clone)]
pub struct RetryGroup {
    pub(crate) steps: Vec<Step>,
    pub(crate) policy: RetryPolicy,
}

impl RetryGroup {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

/// An immutable step descriptor.
#[derive(Clone)]
pub struct Step {
    kind: StepKind,
    description: String,
    location: &'static Location<'static>,
    action: StepAction,
}

impl Step {
    /// Build a step from an already-classified kind and a raw action.
    ///
    /// `StepKind::Retry` is reserved for groups built by the engine.
    #[track_caller]
    pub fn from_parts<F>(kind: StepKind, description: impl Into<String>, action: F) -> Result<Self, EngineError>
    where
        F: Fn(&StepContext<'_>, &World) -> Result<World, StepFailure> + Send + Sync + 'static,
    {
        if kind == StepKind::Retry {
            return Err(EngineError::ReservedKind(kind.to_string()));
        }
        Ok(Self {
            kind,
            description: description.into(),
            location: Location::caller(),
            action: StepAction::Run(Arc::new(action)),
        })
    }

    /// A world-changing step. The closure's value must be a JSON object.
    #[track_caller]
    pub fn transition<F>(description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&World) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::producing(StepKind::Transition, description.into(), Location::caller(), f)
    }

    /// A retriable step that reads state into the world.
    #[track_caller]
    pub fn query<F>(description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&World) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::producing(StepKind::Query, description.into(), Location::caller(), f)
    }

    /// A retriable assertion. On success the world passes through unchanged.
    #[track_caller]
    pub fn check<F>(description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&World) -> Result<(), AssertionError> + Send + Sync + 'static,
    {
        let action = move |_: &StepContext<'_>, world: &World| match f(world) {
            Ok(()) => Ok(world.clone()),
            Err(err) => Err(StepFailure::assertion(err.0)),
        };
        Self {
            kind: StepKind::Check,
            description: description.into(),
            location: Location::caller(),
            action: StepAction::Run(Arc::new(action)),
        }
    }

    fn producing<F>(kind: StepKind, description: String, location: &'static Location<'static>, f: F) -> Self
    where
        F: Fn(&World) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let action = move |ctx: &StepContext<'_>, world: &World| match f(world) {
            Ok(value) => World::try_from(value).map_err(|returned| {
                StepFailure::new(
                    FailureKind::InvalidWorld,
                    format!(
                        "{} `{}` ({}) returned a value that is not a world map: {}",
                        ctx.kind, ctx.description, ctx.location, returned
                    ),
                )
            }),
            Err(err) => Err(StepFailure::new(
                FailureKind::ActionError,
                format!(
                    "{} `{}` ({}) failed: {:?}",
                    ctx.kind, ctx.description, ctx.location, err
                ),
            )),
        };
        Self {
            kind,
            description,
            location,
            action: StepAction::Run(Arc::new(action)),
        }
    }

    pub(crate) fn retry_group(steps: Vec<Step>, policy: RetryPolicy) -> Self {
        let description = format!(
            "retry [{}]",
            steps
                .iter()
                .map(|s| s.description.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let location = steps.first().map_or(Location::caller(), |s| s.location);
        Self {
            kind: StepKind::Retry,
            description,
            location,
            action: StepAction::Retry(RetryGroup { steps, policy }),
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn action(&self) -> &StepAction {
        &self.action
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Step");
        s.field("kind", &self.kind)
            .field("description", &self.description)
            .field("location", &format_args!("{}", self.location));
        if let StepAction::Retry(group) = &self.action {
            s.field("steps", &group.steps);
        }
        s.finish()
    }
}
