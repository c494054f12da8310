//! Rust code generation modules.

pub mod array;
pub mod object;
pub mod ops;
pub mod writer;

pub use array::ArrayGenerator;
pub use object::ObjectGenerator;
pub use writer::CodeWriter;
