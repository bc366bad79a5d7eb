pub mod cooldown;
pub mod poller;
pub mod schedule;
pub mod twelvedata;

pub use cooldown::CooldownGate;
pub use poller::Poller;
pub use twelvedata::TwelveDataClient;
