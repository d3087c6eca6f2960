pub mod ds;
pub mod eval;
pub mod host;
pub mod module;
