//=========================================================================
// Chat
//
// Session chat: the shared message log and the overlays built on it.
//
// Responsibilities:
// - Keep the authoritative, append-only message list (`ChatLog`)
// - Hand local messages to the network collaborator (`ChatTransport`)
// - Present the list with relative age labels (`MessageFeed`)
// - Turn typed drafts into posts or client commands (`ChatComposer`)
//
//=========================================================================

//=== Submodules ==========================================================
mod composer;
mod feed;
mod message;
mod store;
mod time_ago;

//=== Public Exports ======================================================
pub use composer::{Author, ChatComposer, Submission, CLIENT_COMMANDS};
pub use feed::{FeedLine, MessageFeed};
pub use message::{ChatMessage, MessageDraft};
pub use store::{ChatLog, ChatSubscription, ChatTransport};
pub use time_ago::{age_label, time_ago};
