//! CLI command implementations.

pub(crate) mod generate;
pub(crate) mod serve;

pub(crate) use generate::GenerateArgs;
pub(crate) use serve::ServeArgs;
