use crate::{
    config::{CompareConfig, TargetConfig},
    decode::format_field,
    inputs::collect_inputs,
    Compare,
};
use anyhow::{anyhow, Context, Result};
use console::style;
use std::{
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    process::{self, Stdio},
    thread,
    time::{Duration, Instant},
};
use urldiff::{DecodedRecord, Field};

#[cfg(unix)]
use std::os::unix::process::{CommandExt, ExitStatusExt};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How a target invocation ended
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Exited(i32),
    Signaled(i32),
    TimedOut,
}

impl Status {
    pub fn success(&self) -> bool {
        matches!(self, Status::Exited(0))
    }
}

impl From<process::ExitStatus> for Status {
    fn from(status: process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Status::Exited(code);
        }
        #[cfg(unix)]
        if let Some(signal) = status.signal() {
            return Status::Signaled(signal);
        }
        Status::Exited(-1)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Exited(code) => write!(f, "{code}"),
            Status::Signaled(signal) => write!(f, "signal {signal}"),
            Status::TimedOut => write!(f, "timeout"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub stdout: Vec<u8>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Differential {
    ExitStatus,
    Output,
}

fn all_equal<T: PartialEq>(mut items: impl Iterator<Item = T>) -> bool {
    match items.next() {
        Some(first) => items.all(|item| item == first),
        None => true,
    }
}

/// Exit status differentials take precedence over output differentials.
pub fn classify(outcomes: &[Outcome], config: &CompareConfig) -> Option<Differential> {
    let statuses_agree = if config.exit_statuses_matter {
        all_equal(outcomes.iter().map(|o| o.status))
    } else {
        all_equal(outcomes.iter().map(|o| o.status.success()))
    };
    if !statuses_agree {
        return Some(Differential::ExitStatus);
    }

    if config.output_differentials_matter && !all_equal(outcomes.iter().map(|o| &o.stdout)) {
        return Some(Differential::Output);
    }

    None
}

/// Run one target with the input file on stdin
pub fn execute(target: &TargetConfig, input: &Path, timeout: Duration) -> Result<Outcome> {
    let stdin =
        File::open(input).with_context(|| format!("Could not open input {}", input.display()))?;

    let mut command = process::Command::new(&target.executable);
    command
        .args(&target.args)
        .envs(&target.env)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    // Own process group, so a timeout also reaches whatever the target spawned
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command
        .spawn()
        .with_context(|| format!("Could not start {}", target.executable.display()))?;

    // Drain stdout on the side so a chatty target cannot block on a full pipe
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout of {} was not captured", target.display_name()))?;
    let reader = thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        stdout.read_to_end(&mut buffer)?;
        Ok(buffer)
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Status::from(status);
        }
        if start.elapsed() >= timeout {
            warn!("{} timed out on {}", target.display_name(), input.display());
            kill_target(&mut child);
            child.wait()?;
            break Status::TimedOut;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = reader
        .join()
        .map_err(|_| anyhow!("stdout reader for {} panicked", target.display_name()))??;

    Ok(Outcome { status, stdout })
}

/// Kill the target and every process in its group. Descendants keep the
/// stdout pipe open otherwise.
fn kill_target(child: &mut process::Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = i32::try_from(child.id()) {
            info!("Killing process group {pgid}");
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
}

/// Run all targets on one input concurrently, outcomes in target order
pub fn execute_all(config: &CompareConfig, input: &Path) -> Result<Vec<Outcome>> {
    let timeout = config.timeout();
    thread::scope(|scope| {
        let handles: Vec<_> = config
            .targets
            .iter()
            .map(|target| scope.spawn(move || execute(target, input, timeout)))
            .collect();
        handles
            .into_iter()
            .map(|handle| -> Result<Outcome> {
                handle
                    .join()
                    .map_err(|_| anyhow!("target runner thread panicked"))?
            })
            .collect()
    })
}

#[derive(Debug, Default)]
pub struct Report {
    pub inputs_run: usize,
    pub exit_status_differentials: Vec<PathBuf>,
    pub output_differentials: Vec<PathBuf>,
}

impl Report {
    pub fn differentials(&self) -> usize {
        self.exit_status_differentials.len() + self.output_differentials.len()
    }
}

/// Fields that differ between any decodable stdout and the first decodable one
fn differing_fields(records: &[Option<DecodedRecord>]) -> Vec<Field> {
    let mut decoded = records.iter().flatten();
    let Some(first) = decoded.next() else {
        return Vec::new();
    };
    let mut fields: Vec<Field> = Vec::new();
    for other in decoded {
        for field in first.differing_fields(other) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    fields
}

fn print_exit_status_differential(config: &CompareConfig, input: &Path, outcomes: &[Outcome]) {
    println!(
        "{}",
        style(format!("Exit status differential: {}", input.display())).blue()
    );
    for (target, outcome) in config.targets.iter().zip(outcomes) {
        let line = format!(
            "    Exit status {}:\t{}",
            outcome.status,
            target.display_name()
        );
        if outcome.status.success() {
            println!("{}", style(line).blue());
        } else {
            println!("{}", style(line).red());
        }
    }
}

fn print_output_differential(config: &CompareConfig, input: &Path, outcomes: &[Outcome]) {
    println!(
        "{}",
        style(format!("Output differential: {}", input.display())).yellow()
    );

    let records: Vec<Option<DecodedRecord>> = outcomes
        .iter()
        .map(|outcome| {
            std::str::from_utf8(&outcome.stdout)
                .ok()
                .and_then(|line| urldiff::decode_line(line).ok())
        })
        .collect();
    let differing = differing_fields(&records);

    for ((target, outcome), record) in config.targets.iter().zip(outcomes).zip(&records) {
        println!("    {} printed", style(target.display_name()).yellow().bold());
        match record {
            Some(record) => {
                for (field, value) in record.iter() {
                    let line = format!("    {}", format_field(field, value));
                    if differing.contains(&field) {
                        println!("{}", style(line).yellow().bold());
                    } else {
                        println!("{line}");
                    }
                }
            }
            None => println!("        {}", outcome.stdout.escape_ascii()),
        }
    }
}

impl Compare {
    pub fn compare(&self) -> Result<(), anyhow::Error> {
        let config = CompareConfig::load(&self.config)?;
        let inputs = collect_inputs(&self.inputs, self.recursive)?;
        info!(
            "Comparing {} targets on {} inputs",
            config.targets.len(),
            inputs.len()
        );

        let report = compare_inputs(&config, &inputs)?;
        print_summary(&report);

        if self.fail_on_differential && report.differentials() != 0 {
            return Err(anyhow!("Found {} differentials", report.differentials()));
        }
        Ok(())
    }
}

pub fn compare_inputs(config: &CompareConfig, inputs: &[PathBuf]) -> Result<Report> {
    let mut report = Report::default();

    for input in inputs {
        let outcomes = execute_all(config, input)
            .with_context(|| format!("Failed running targets on {}", input.display()))?;
        report.inputs_run += 1;

        match classify(&outcomes, config) {
            Some(Differential::ExitStatus) => {
                print_exit_status_differential(config, input, &outcomes);
                report.exit_status_differentials.push(input.clone());
            }
            Some(Differential::Output) => {
                print_output_differential(config, input, &outcomes);
                report.output_differentials.push(input.clone());
            }
            None => debug!("No differential on {}", input.display()),
        }
    }

    Ok(report)
}

fn print_summary(report: &Report) {
    println!(
        "{}",
        style(format!(
            "Inputs run:\t\t\t{}\nOutput differentials:\t\t{}\nExit status differentials:\t{}",
            report.inputs_run,
            report.output_differentials.len(),
            report.exit_status_differentials.len()
        ))
        .green()
    );

    if report.differentials() == 0 {
        println!("No differentials found!");
        return;
    }
    if !report.exit_status_differentials.is_empty() {
        println!("Exit status differentials:");
        for input in &report.exit_status_differentials {
            println!("{}", input.display());
        }
    }
    if !report.output_differentials.is_empty() {
        println!("Output differentials:");
        for input in &report.output_differentials {
            println!("{}", input.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(output_differentials_matter: bool, exit_statuses_matter: bool) -> CompareConfig {
        let mut config = CompareConfig::parse(
            r#"
            [[target]]
            executable = "a"
            [[target]]
            executable = "b"
            "#,
        )
        .unwrap();
        config.output_differentials_matter = output_differentials_matter;
        config.exit_statuses_matter = exit_statuses_matter;
        config
    }

    fn outcome(status: Status, stdout: &str) -> Outcome {
        Outcome {
            status,
            stdout: stdout.as_bytes().to_vec(),
        }
    }

    #[test]
    fn identical_outcomes_agree() {
        let outcomes = [
            outcome(Status::Exited(0), "{}"),
            outcome(Status::Exited(0), "{}"),
        ];
        assert_eq!(classify(&outcomes, &config(true, true)), None);
    }

    #[test]
    fn success_versus_crash() {
        let outcomes = [
            outcome(Status::Exited(0), "{}"),
            outcome(Status::Signaled(6), ""),
        ];
        assert_eq!(
            classify(&outcomes, &config(true, false)),
            Some(Differential::ExitStatus)
        );
    }

    #[test]
    fn different_failures_only_matter_when_configured() {
        let outcomes = [
            outcome(Status::Exited(1), ""),
            outcome(Status::Signaled(6), ""),
        ];
        assert_eq!(classify(&outcomes, &config(true, false)), None);
        assert_eq!(
            classify(&outcomes, &config(true, true)),
            Some(Differential::ExitStatus)
        );
    }

    #[test]
    fn timeouts_are_failures() {
        assert!(!Status::TimedOut.success());
        let outcomes = [outcome(Status::Exited(0), ""), outcome(Status::TimedOut, "")];
        assert_eq!(
            classify(&outcomes, &config(false, false)),
            Some(Differential::ExitStatus)
        );
    }

    #[test]
    fn output_differential() {
        let outcomes = [
            outcome(Status::Exited(0), "{\"a\"}"),
            outcome(Status::Exited(0), "{\"b\"}"),
        ];
        assert_eq!(
            classify(&outcomes, &config(true, false)),
            Some(Differential::Output)
        );
        assert_eq!(classify(&outcomes, &config(false, false)), None);
    }

    #[test]
    fn differing_fields_across_targets() {
        let a = urldiff::decode_line(&urldiff::harness::run(b"http://h/?a").unwrap()).unwrap();
        let b = urldiff::decode_line(&urldiff::harness::run(b"http://h/?b").unwrap()).unwrap();
        let c = urldiff::decode_line(&urldiff::harness::run(b"http://g/?a").unwrap()).unwrap();
        let fields = differing_fields(&[Some(a), None, Some(b), Some(c)]);
        assert_eq!(fields, vec![Field::Query, Field::Host]);
        assert!(differing_fields(&[None, None]).is_empty());
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Exited(0).to_string(), "0");
        assert_eq!(Status::Signaled(6).to_string(), "signal 6");
        assert_eq!(Status::TimedOut.to_string(), "timeout");
    }

    #[cfg(unix)]
    #[test]
    fn execute_captures_stdout_and_status() {
        let input = std::env::temp_dir().join(format!("urldiff-execute-{}", std::process::id()));
        std::fs::write(&input, "http://a/").unwrap();
        let target: TargetConfig = toml::from_str(
            r#"
            executable = "/bin/sh"
            args = ["-c", "cat; exit 3"]
            "#,
        )
        .unwrap();
        let outcome = execute(&target, &input, Duration::from_secs(30)).unwrap();
        assert_eq!(outcome.status, Status::Exited(3));
        assert_eq!(outcome.stdout, b"http://a/");
        std::fs::remove_file(input).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn execute_kills_on_timeout() {
        let input = std::env::temp_dir().join(format!("urldiff-timeout-{}", std::process::id()));
        std::fs::write(&input, "").unwrap();
        let target: TargetConfig = toml::from_str(
            r#"
            executable = "/bin/sh"
            args = ["-c", "exec sleep 30"]
            "#,
        )
        .unwrap();
        let outcome = execute(&target, &input, Duration::from_millis(100)).unwrap();
        assert_eq!(outcome.status, Status::TimedOut);
        std::fs::remove_file(input).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_processes_spawned_by_target() {
        let input = std::env::temp_dir().join(format!("urldiff-tree-{}", std::process::id()));
        std::fs::write(&input, "").unwrap();
        // The shell forks sleep as a child, which inherits the stdout pipe
        let target: TargetConfig = toml::from_str(
            r#"
            executable = "/bin/sh"
            args = ["-c", "sleep 5; true"]
            "#,
        )
        .unwrap();
        let start = Instant::now();
        let outcome = execute(&target, &input, Duration::from_millis(100)).unwrap();
        assert_eq!(outcome.status, Status::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(2));
        std::fs::remove_file(input).unwrap();
    }
}
