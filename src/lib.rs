// 公开导出的模块，供外部使用
pub mod models;
pub mod sources;
pub mod services;
pub mod errors;
pub mod config;
pub mod api;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::stock::{PriceTable, DerivedRecord, Summary, Comparison, Company};
pub use models::table::{RawTable, Column, ColumnHeader, Cell};
pub use services::processing::process;
pub use services::reporting::{summarize, compare};
pub use services::StockService;
pub use sources::{PriceSource, YahooSource};
pub use config::Config;
pub use errors::{Result, StockApiError};
