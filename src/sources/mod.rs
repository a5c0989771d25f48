pub mod base;
pub mod yahoo;

pub use base::PriceSource;
pub use yahoo::YahooSource;
