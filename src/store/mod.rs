//! Per-domain state slices. Each store owns its state exclusively and
//! re-fetches canonical lists from the backend after every mutation.

pub mod ai_log;
pub mod note;
pub mod reminder;

pub use ai_log::AiLogStore;
pub use note::{NoteStore, Status, StatusKind};
pub use reminder::{FetchOrder, ReminderStore};
