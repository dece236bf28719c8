use crate::Decode;
use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};
use urldiff::{encode::escape, DecodedRecord, Field};

/// One `name: value` line per field, values escaped for the terminal
pub fn format_record(record: &DecodedRecord) -> Vec<String> {
    record
        .iter()
        .map(|(field, value)| format_field(field, value))
        .collect()
}

pub fn format_field(field: Field, value: &[u8]) -> String {
    format!("{:>9}: {}", field.name(), escape(value))
}

impl Decode {
    pub fn decode(&self) -> Result<(), anyhow::Error> {
        let reader: Box<dyn BufRead> = match &self.input {
            Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
                format!("Could not open {}", path.display())
            })?)),
            None => Box::new(io::stdin().lock()),
        };

        let mut first = true;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = urldiff::decode_line(&line)
                .with_context(|| format!("Line {} is not a record", index + 1))?;

            if !first {
                println!();
            }
            first = false;
            for formatted in format_record(&record) {
                println!("{formatted}");
            }
        }
        Ok(())
    }
}
