use urldiff::{config::HarnessConfig, harness};

// Reads one URL from stdin and prints its components, Base64 encoded.
// Under AFL++ or honggfuzz the engine feeds inputs in a loop instead,
// unless NO_AFL is set.
fn main() {
    harness::init();
    let config = HarnessConfig::from_env();
    log::debug!("driving harness with {:?}", config.engine);
    harness::drive(&config);
}
