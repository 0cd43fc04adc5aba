// IO module tests
#[cfg(feature = "io-csv")]
mod csv;
mod glob;
mod text;
