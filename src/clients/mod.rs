pub mod lookup_client;

pub use lookup_client::{parse_page_tasks, HttpLookup, PageLookup};
