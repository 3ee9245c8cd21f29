//! Deployment configuration.
//!
//! The daemon trusts the host shim to inject the caller identity on each
//! request. In development the `debugCaller` envelope field is accepted as a
//! substitute so the daemon can be driven by hand.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub env: Env,
}

impl Config {
    pub fn from_env() -> Self {
        let env = match std::env::var("STARCLASS_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Development,
        };
        Self { env }
    }

    pub fn debug_identity_allowed(&self) -> bool {
        self.env == Env::Development
    }
}
