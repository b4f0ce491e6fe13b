pub mod document;
pub mod event;
pub mod page;

pub use document::{FinalDocument, IntermediateDocument, PersistedDocument};
pub use event::SessionEvent;
pub use page::{page_file_name, PageArtifact, PageTask};
