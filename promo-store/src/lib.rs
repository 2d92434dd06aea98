pub mod app_config;
pub mod http_store;
pub mod memory;
pub mod lomadee;

pub use http_store::HttpOfferStore;
pub use memory::{MemoryOfferStore, StaticFeed};
pub use lomadee::LomadeeFeed;
