mod constants;
mod env;
mod file;
mod load;
mod types;
mod util;

pub use types::AppConfig;

#[cfg(test)]
mod tests;
