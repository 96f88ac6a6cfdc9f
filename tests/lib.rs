#[macro_use]
mod macros;

mod props;
