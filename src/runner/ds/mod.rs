pub mod context;
pub mod error;
pub mod frame;
pub mod function;
pub mod value;
