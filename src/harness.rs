use crate::{
    config::{Engine, HarnessConfig},
    encode::serialize,
    error::{HarnessError, HarnessResult},
    record::ParsedUrlRecord,
};
use log::{debug, error, warn};
use std::{
    io::{self, Read, Write},
    panic, process,
    sync::Once,
};
use url::Url;

static INIT: Once = Once::new();

/// Process-wide setup. Safe to call more than once, only the first call does anything.
pub fn init() {
    INIT.call_once(|| {
        // Logs must never reach stdout, the record line is compared byte for byte
        let _ = env_logger::Builder::from_default_env()
            .target(env_logger::Target::Stderr)
            .try_init();
        debug!("harness initialized");
    });
}

/// Interpret raw input bytes as a URL and extract its components
pub fn parse(data: &[u8]) -> HarnessResult<ParsedUrlRecord> {
    let input = std::str::from_utf8(data)?;
    let url = Url::parse(input)?;
    Ok(ParsedUrlRecord::from(&url))
}

/// Parse and serialize in one go
pub fn run(data: &[u8]) -> HarnessResult<String> {
    serialize(&parse(data)?)
}

/// Write a complete record line in a single write.
pub fn emit<W: Write>(out: &mut W, line: &str) -> HarnessResult<()> {
    out.write_all(line.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Report the error and die with SIGABRT, which every engine counts as a crash.
pub fn crash(err: &HarnessError) -> ! {
    error!("{err}");
    process::abort()
}

/// Run one input and print its record, or crash. Panics raised anywhere
/// below this point are crashes too.
pub fn run_or_crash(data: &[u8]) {
    let result = panic::catch_unwind(|| {
        let line = run(data)?;
        emit(&mut io::stdout().lock(), &line)
    });

    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => crash(&err),
        Err(_) => {
            error!("panic while handling input");
            process::abort()
        }
    }
}

fn run_standalone() {
    let mut data = Vec::new();
    if let Err(err) = io::stdin().lock().read_to_end(&mut data) {
        crash(&HarnessError::from(err));
    }
    debug!("read {} bytes from stdin", data.len());
    run_or_crash(&data);
}

/// Hand control to whichever engine the config selects.
pub fn drive(config: &HarnessConfig) {
    match config.engine {
        #[cfg(feature = "afl")]
        Engine::Afl => {
            crate::afl_fuzz!(|data: &[u8]| {
                run_or_crash(data);
            });
        }
        #[cfg(feature = "honggfuzz")]
        Engine::Honggfuzz => loop {
            crate::honggfuzz_fuzz!(|data: &[u8]| {
                run_or_crash(data);
            });
        },
        engine => {
            if engine != Engine::Standalone {
                warn!("{engine:?} support is not compiled in, running standalone");
            }
            run_standalone();
        }
    }
}
