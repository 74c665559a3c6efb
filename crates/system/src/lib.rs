pub mod flush;
pub mod poller;

pub use flush::spawn_flusher;
pub use poller::spawn_poller;
