//! Flow state and the typed stage states
//!
//! Each stage owns exactly what it may touch. The connection only exists
//! between `Loaded` and `Answered`; `Closed` no longer has one.

use crate::agent::AgentAnswer;
use crate::ingestion::LoadSummary;
use crate::schema::SchemaDescriptor;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Idle,
    Loaded,
    Inspected,
    Answered,
    Closed,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Idle,
        Stage::Loaded,
        Stage::Inspected,
        Stage::Answered,
        Stage::Closed,
    ];

    /// The stage that follows, and the transition that gets there.
    pub fn next(self) -> Option<(&'static str, Stage)> {
        match self {
            Stage::Idle => Some(("load", Stage::Loaded)),
            Stage::Loaded => Some(("inspect", Stage::Inspected)),
            Stage::Inspected => Some(("delegate", Stage::Answered)),
            Stage::Answered => Some(("teardown", Stage::Closed)),
            Stage::Closed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "Idle",
            Stage::Loaded => "Loaded",
            Stage::Inspected => "Inspected",
            Stage::Answered => "Answered",
            Stage::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// `Idle --load--> Loaded --inspect--> ...`, one transition per line.
pub fn flow_diagram() -> String {
    Stage::ALL
        .iter()
        .filter_map(|stage| {
            stage
                .next()
                .map(|(edge, to)| format!("{} --{}--> {}", stage, edge, to))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Context threaded between stages. Each transition returns an updated copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    pub user_question: String,
    pub schema_descriptor: Option<SchemaDescriptor>,
    pub answer: Option<String>,
}

impl FlowState {
    pub fn new(user_question: impl Into<String>) -> Self {
        Self {
            user_question: user_question.into(),
            ..Self::default()
        }
    }

    pub fn with_schema(self, schema: SchemaDescriptor) -> Self {
        Self {
            schema_descriptor: Some(schema),
            ..self
        }
    }

    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..self
        }
    }
}

pub trait PipelineState {
    const STAGE: Stage;

    fn flow(&self) -> &FlowState;
}

#[derive(Debug)]
pub struct Idle {
    pub(crate) flow: FlowState,
}

impl Idle {
    pub fn new(user_question: impl Into<String>) -> Self {
        Self {
            flow: FlowState::new(user_question),
        }
    }
}

#[derive(Debug)]
pub struct Loaded {
    pub(crate) conn: Connection,
    pub(crate) flow: FlowState,
    pub load: LoadSummary,
}

#[derive(Debug)]
pub struct Inspected {
    pub(crate) conn: Connection,
    pub(crate) flow: FlowState,
    pub load: LoadSummary,
    pub schema: SchemaDescriptor,
}

#[derive(Debug)]
pub struct Answered {
    pub(crate) conn: Connection,
    pub(crate) flow: FlowState,
    pub load: LoadSummary,
    pub answer: AgentAnswer,
    pub summary_path: PathBuf,
}

#[derive(Debug)]
pub struct Closed {
    pub(crate) flow: FlowState,
    pub load: LoadSummary,
    pub answer: AgentAnswer,
    pub summary_path: PathBuf,
}

macro_rules! pipeline_state {
    ($($ty:ident),*) => {
        $(
            impl PipelineState for $ty {
                const STAGE: Stage = Stage::$ty;

                fn flow(&self) -> &FlowState {
                    &self.flow
                }
            }
        )*
    };
}

pipeline_state!(Idle, Loaded, Inspected, Answered, Closed);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_diagram() {
        assert_eq!(
            flow_diagram(),
            "Idle --load--> Loaded\n\
             Loaded --inspect--> Inspected\n\
             Inspected --delegate--> Answered\n\
             Answered --teardown--> Closed"
        );
    }

    #[test]
    fn test_flow_state_updates_are_values() {
        let initial = FlowState::new("How many tickets are open?");
        let answered = initial.clone().with_answer("42");

        assert_eq!(initial.answer, None);
        assert_eq!(answered.answer.as_deref(), Some("42"));
        assert_eq!(answered.user_question, initial.user_question);
    }
}
