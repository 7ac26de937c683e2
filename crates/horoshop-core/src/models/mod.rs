//! Data models for Horoshop entities.
//!
//! - `Order`, `OrderFilters`: orders and the filters accepted by `orders/get`
//! - `Product`, `CatalogQuery`: catalog entries and `catalog/export` queries
//!
//! Models keep a few typed fields and carry every other field of the remote
//! payload in `extra`, so nothing the API returns is dropped.

pub(crate) mod lenient;
pub mod order;
pub mod product;

pub use order::{Order, OrderFilters};
pub use product::{CatalogQuery, Product};
