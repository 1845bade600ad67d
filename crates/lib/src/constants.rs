//! Shared defaults for the ingestion pipeline and the chat surface.

/// Upper bound on the estimated tokens kept from a single attachment.
pub const PER_ATTACHMENT_TOKENS: usize = 15_000;
/// Aggregate estimate above which a request is refused outright.
pub const HARD_CAP_TOKENS: usize = 25_000;
/// Aggregate estimate above which a request proceeds with a warning.
pub const WARN_THRESHOLD_TOKENS: usize = 20_000;
/// Characters per heuristic token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Percentage of the character budget a line-break cut must preserve.
pub const LINE_BREAK_WINDOW_PERCENT: usize = 90;

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_SAMPLE_COUNT: usize = 10;
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const HISTORY_LOCK_FILE: &str = ".history.lock";
pub const DEFAULT_HISTORY_TITLE: &str = "Untitled";
