pub mod product;
pub mod sale;
pub mod supplier;
pub mod supplier_order;
