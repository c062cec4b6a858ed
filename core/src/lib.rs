pub mod analyzer;
pub mod cancel;
pub mod diagnostics;
pub mod finder;
pub mod imports;
pub mod library;
pub mod matcher;
pub mod model;
pub mod namespace;
pub mod token;
pub mod variables;

#[cfg(test)]
mod finder_test;
#[cfg(test)]
mod matcher_test;
#[cfg(test)]
mod test_support;
