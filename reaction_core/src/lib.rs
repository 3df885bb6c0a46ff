pub mod modules;

pub use modules::{cache, config, control, engine, events, gesture, listeners, remote, session};
pub use modules::feed::{Feed, FeedOptions};
pub use reaction_protocol as protocol;
