mod budget;
mod context;
mod engine;

pub use budget::{apply_budget, BudgetReport};
pub use context::{ContextEvent, CorrelatedContext, CorrelationDiagnostics, SessionSummary};
pub use engine::{CorrelationEngine, CorrelationRequest};
