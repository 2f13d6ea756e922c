pub mod config;
pub mod mode;
pub mod persister;
pub mod remote;
pub mod settings;
pub mod store;
#[cfg(test)]
pub(crate) mod test_support;
pub mod validator;
