pub mod analytics;
pub mod export;
pub mod orders;
pub mod products;
pub mod sales;
pub mod suppliers;
