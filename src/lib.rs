pub mod activation;
pub mod commands;
pub mod config;
pub mod flow;
pub mod paths;
pub mod profiles;
pub mod prompt;
pub mod store;
pub mod ui;
pub mod validator;

#[cfg(test)]
pub mod test_utils;
