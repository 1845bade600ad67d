pub mod message;
pub mod orchestrator;
pub mod session;

pub use message::{AttachmentInfo, ChatMessage, Role};
pub use orchestrator::{ChatOrchestrator, ComposedTurn, StreamEvent, StreamOutcome, StreamReport};
pub use session::ChatSession;
