mod poll;
mod select;

pub use self::poll::PollMultiplexer;
pub use self::select::SelectMultiplexer;
