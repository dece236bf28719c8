use std::{env, ffi::OsString};

/// Setting this variable (to anything) skips fuzzing engine initialization,
/// for running the harness by hand outside the fuzzing loop.
pub const NO_AFL_VAR: &str = "NO_AFL";

/// Who drives the harness loop
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Engine {
    /// AFL++ persistent mode, the `afl` feature
    Afl,
    /// honggfuzz, the `honggfuzz` feature
    Honggfuzz,
    /// One read of stdin, one record, one exit
    Standalone,
}

/// The engine built into this binary, if any
pub fn compiled_engine() -> Engine {
    if cfg!(feature = "afl") {
        Engine::Afl
    } else if cfg!(feature = "honggfuzz") {
        Engine::Honggfuzz
    } else {
        Engine::Standalone
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    pub engine: Engine,
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let engine = match lookup(NO_AFL_VAR) {
            Some(_) => Engine::Standalone,
            None => compiled_engine(),
        };
        HarnessConfig { engine }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_afl_forces_standalone() {
        let config = HarnessConfig::from_lookup(|key| {
            (key == NO_AFL_VAR).then(|| OsString::from("1"))
        });
        assert_eq!(config.engine, Engine::Standalone);
    }

    #[test]
    fn empty_no_afl_still_counts_as_set() {
        let config = HarnessConfig::from_lookup(|key| (key == NO_AFL_VAR).then(OsString::new));
        assert_eq!(config.engine, Engine::Standalone);
    }

    #[test]
    fn unset_uses_compiled_engine() {
        let config = HarnessConfig::from_lookup(|_| None);
        assert_eq!(config.engine, compiled_engine());
    }
}
