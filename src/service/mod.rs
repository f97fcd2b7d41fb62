//! Engine services: validation, execution, lifecycle, generation, batch orchestration.

pub mod batch;
pub mod executor;
pub mod generation;
pub mod lifecycle;
pub mod path;
pub mod tasks;
mod validation;

pub use batch::{BatchOperation, BatchOrchestrator, BatchOutcome, BatchRequest, FailedItem, ItemOutcome, Outcome};
pub use executor::{ExecutionResult, Executor};
pub use generation::{standard_parameters, Generator, PreviewResult};
pub use lifecycle::Lifecycle;
pub use tasks::{TaskRegistry, TaskSnapshot, TaskStatus};
pub use validation::{parse_rules, ParamViolation, ParameterValidator, Rule, ValidatedParams};
