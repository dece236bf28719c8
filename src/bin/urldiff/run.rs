use crate::{decode::format_record, inputs::collect_inputs, Run};
use anyhow::{Context, Result};
use console::style;
use std::fs;

impl Run {
    /// Runs the in-process harness. Rejected inputs are reported, not crashed on.
    pub fn run(&self) -> Result<(), anyhow::Error> {
        let inputs = collect_inputs(&self.inputs, self.recursive)?;
        info!("Running {} inputs", inputs.len());

        let mut rejected = 0;
        for input in &inputs {
            let data =
                fs::read(input).with_context(|| format!("Could not read {}", input.display()))?;
            println!("Now running file {}", input.display());

            match urldiff::harness::run(&data) {
                Ok(line) => {
                    println!("{line}");
                    if self.decoded {
                        let record = urldiff::decode_line(&line)?;
                        for formatted in format_record(&record) {
                            println!("{formatted}");
                        }
                    }
                }
                Err(err) => {
                    rejected += 1;
                    println!("    {} {err}", style("Rejected").red().bold());
                }
            }
        }

        eprintln!(
            "{} {} inputs, {} rejected",
            style("    Finished").cyan().bold(),
            inputs.len(),
            rejected
        );
        Ok(())
    }
}
