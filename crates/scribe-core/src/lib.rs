pub mod commit;
pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod window;

pub use commit::CommitContext;
pub use config::{BudgetConfig, ClassifierConfig, EngineConfig, ScanConfig};
pub use error::{ConfigError, ValidationError};
pub use event::{ContentBlock, ConversationEvent, MessageContent, Role};
pub use session::Session;
pub use window::{format_timestamp, parse_timestamp, TimeWindow};
