mod service;

pub use self::service::{Denial, MemoryService};
