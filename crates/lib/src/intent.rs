//! Deterministic intent rules: the fast path over normalized text.
//!
//! Greetings and the category listing are resolved here and never reach the
//! model. Read/create indicators only produce a provisional hint that biases
//! the model prompt; read wins whenever both match, because create phrasing is
//! easily triggered by incidental words.

/// Classified purpose of a single inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    ListCategories,
    Read,
    Create,
    Unknown,
}

/// Provisional action passed to the model when the rules could not settle the
/// intent on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionHint {
    Read,
    Create,
}

/// Outcome of the rule stage. `Deferred` hands the message to the model
/// classifier, carrying the hint (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Greeting,
    ListCategories,
    Deferred(Option<ActionHint>),
}

/// Messages answered with a canned reply, matched exactly (optionally with a
/// trailing "!").
const GREETINGS: [&str; 20] = [
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
    "thank",
    "bye",
    "goodbye",
    "ok",
    "okay",
    "cool",
    "great",
    "nice",
    "awesome",
    "perfect",
    "got it",
    "alright",
];

/// Words that mark a query; any match forces the read hint.
const READ_INDICATORS: [&str; 17] = [
    "list",
    "show",
    "get",
    "what",
    "how many",
    "do we have",
    "any",
    "all",
    "display",
    "find",
    "search",
    "total",
    "sum",
    "count",
    "available",
    "who",
    "which",
];

/// Explicit creation phrasing. Deliberately multi-word: bare verbs like
/// "add" misfire on queries.
const CREATE_PHRASES: [&str; 13] = [
    "create a",
    "create new",
    "add a",
    "add new",
    "register a",
    "register new",
    "insert a",
    "make a new",
    "book a",
    "new booking for",
    "add tenant",
    "add guest",
    "create booking",
];

/// Classify normalized text with the deterministic rules. Never fails.
pub fn classify(text: &str) -> RuleOutcome {
    let normalized = text.trim().to_lowercase();

    if GREETINGS
        .iter()
        .any(|g| normalized == *g || normalized == format!("{}!", g))
    {
        return RuleOutcome::Greeting;
    }

    if normalized == "list modules"
        || normalized == "show modules"
        || normalized == "modules"
        || normalized.contains("what modules")
    {
        return RuleOutcome::ListCategories;
    }

    let has_read = READ_INDICATORS.iter().any(|k| normalized.contains(k));
    let has_create = CREATE_PHRASES.iter().any(|k| normalized.contains(k));

    if has_read {
        return RuleOutcome::Deferred(Some(ActionHint::Read));
    }
    if has_create {
        return RuleOutcome::Deferred(Some(ActionHint::Create));
    }
    RuleOutcome::Deferred(None)
}
