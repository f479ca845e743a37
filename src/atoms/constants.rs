// ── AiMan Atoms: Constants ─────────────────────────────────────────────────
// All named constants for the crate live here.
// Collecting them in one place eliminates magic values and makes the
// client's fixed behavior (capacities, timeouts, fixed strings) auditable.

// ── Conversation history ───────────────────────────────────────────────────
// The persisted collection keeps only the most recent conversations; the
// 21st insertion evicts the oldest entry (positional, most-recent-first).
pub const MAX_CONVERSATIONS: usize = 20;

// Titles are derived from the first user message. Longer messages are cut
// at this many characters and marked with the ellipsis suffix.
pub const TITLE_MAX_CHARS: usize = 50;
pub const TITLE_ELLIPSIS: &str = "...";

// ── Verification codes ─────────────────────────────────────────────────────
// Four decimal digits; the lower bound makes a leading zero impossible.
pub const CODE_MIN: u32 = 1000;
pub const CODE_MAX: u32 = 9999;

// A code is accepted while `now <= issued_at + CODE_TTL_SECS`.
pub const CODE_TTL_SECS: i64 = 600;

// Cadence of the cosmetic countdown ticker. Display only — the
// authoritative expiry check happens inline at validation time.
pub const COUNTDOWN_TICK_SECS: u64 = 1;

// ── Storage keys ───────────────────────────────────────────────────────────
// One key holds the whole serialized conversation collection, one the
// current user identity. Treat as stable identifiers: changing either
// orphans previously saved state.
pub const CONVERSATIONS_KEY: &str = "aiman_conversations";
pub const IDENTITY_KEY: &str = "aiman_identity";

// ── Completion endpoint defaults ───────────────────────────────────────────
pub const DEFAULT_COMPLETION_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-pro";

pub const DEFAULT_TEMPERATURE: f64 = 0.9;
pub const DEFAULT_TOP_K: u32 = 1;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

// ── Email delivery ─────────────────────────────────────────────────────────
pub const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
pub const PRODUCT_NAME: &str = "AiMan";

// ── Fixed user-facing strings ──────────────────────────────────────────────
// Appended as an assistant turn when the completion call fails; the raw
// error never reaches the transcript.
pub const APOLOGY_TEXT: &str =
    "Sorry, something went wrong. Check that your API key is configured.";

// Config values still carrying the template placeholder prefix are treated
// as missing credentials.
pub const PLACEHOLDER_PREFIX: &str = "YOUR_";
