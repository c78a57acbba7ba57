//! Configuration resolved from the environment.
//!
//! Values are read once, validated, and cached by the
//! [`Monitor`](crate::Monitor) for the life of the process.

mod app;
mod env;

pub use app::{vars, AppConfig};
pub use env::{
    flag_env, optional_env, require_env, require_json_env, ConfigError, ProcessEnv, VarSource,
};

#[cfg(test)]
pub(crate) use app::tests::base_vars;
