pub mod processing;
pub mod reporting;
pub mod stock_service;

pub use stock_service::StockService;
