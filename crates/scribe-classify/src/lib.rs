mod classify;
mod error;
mod fallback;
#[cfg(any(test, feature = "test-util"))]
mod mock;
mod prompt;
mod response;
mod service;

pub use classify::classify_sessions;
pub use error::ClassifyError;
pub use fallback::{
    is_valid_transition, select_with_fallback, ClassificationResult, FallbackSelector,
    Selection, SelectionMethod, SelectorState,
};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockReasoningService, MockReply};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use response::{extract_first_object, match_session_ids, parse_selection};
pub use service::{CompletionRequest, OpenAiChatService, ReasoningService};
