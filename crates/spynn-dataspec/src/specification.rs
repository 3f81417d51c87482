//! Finished data specifications.

use crate::command::Command;
use crate::error::{DataSpecError, Result};
use bytes::{Bytes, BytesMut};
use std::fmt::Write as _;

/// A complete, validated command stream for one core
#[derive(Debug, Clone, PartialEq)]
pub struct DataSpecification {
    commands: Vec<Command>,
}

impl DataSpecification {
    pub(crate) fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Commands in issue order, ending with [`Command::End`]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Reserved regions as (index, size in bytes, empty)
    pub fn reserved_regions(&self) -> impl Iterator<Item = (u8, usize, bool)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            Command::ReserveRegion {
                region,
                size,
                empty,
                ..
            } => Some((*region, *size, *empty)),
            _ => None,
        })
    }

    /// Total bytes reserved across all regions
    pub fn total_reserved_bytes(&self) -> usize {
        self.reserved_regions().map(|(_, size, _)| size).sum()
    }

    /// Encode to the binary command stream
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for command in &self.commands {
            command.encode(&mut buf);
        }
        buf.freeze()
    }

    /// Decode a binary command stream
    ///
    /// The stream is replayed through the executor before being accepted,
    /// so a decoded specification satisfies the same region rules as a
    /// generated one.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed input or a missing end marker,
    /// and any construction error the replay uncovers.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        tracing::debug!("Parsing data specification ({} bytes)", data.len());
        if data.len() % 4 != 0 {
            return Err(DataSpecError::parse_error(format!(
                "length {} is not a whole number of words",
                data.len()
            )));
        }

        let mut buf = data;
        let mut commands = Vec::new();
        while !buf.is_empty() {
            let command = Command::decode(&mut buf)?;
            let end = command == Command::End;
            commands.push(command);
            if end {
                break;
            }
        }
        if !buf.is_empty() {
            return Err(DataSpecError::CommandAfterEnd);
        }
        if commands.last() != Some(&Command::End) {
            return Err(DataSpecError::parse_error("missing end of specification"));
        }

        let spec = Self { commands };
        spec.execute()?;
        Ok(spec)
    }

    /// Human-readable listing of every command, comments included
    pub fn report(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            // writing to a String cannot fail
            let _ = writeln!(out, "{command}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataSpecificationGenerator, DataType};

    fn sample() -> DataSpecification {
        let mut spec = DataSpecificationGenerator::new();
        spec.comment("sample");
        spec.reserve_memory_region(0, 8, Some("System"), false)
            .unwrap();
        spec.reserve_memory_region(6, 32, Some("spikeHistBuffer"), true)
            .unwrap();
        spec.switch_write_focus(0).unwrap();
        spec.write_u32(0xBEEF_0001).unwrap();
        spec.write_value(-65.0, DataType::S1615).unwrap();
        spec.end_specification().unwrap()
    }

    #[test]
    fn binary_stream_round_trips_without_comments() {
        let spec = sample();
        let decoded = DataSpecification::from_bytes(&spec.to_bytes()).unwrap();
        let without_comments: Vec<_> = spec
            .commands()
            .iter()
            .filter(|c| !matches!(c, Command::Comment(_)))
            .map(|c| match c {
                Command::ReserveRegion {
                    region,
                    size,
                    empty,
                    ..
                } => Command::ReserveRegion {
                    region: *region,
                    size: *size,
                    label: None,
                    empty: *empty,
                },
                other => other.clone(),
            })
            .collect();
        assert_eq!(decoded.commands(), &without_comments[..]);
    }

    #[test]
    fn trailing_words_are_rejected() {
        let mut bytes = sample().to_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            DataSpecification::from_bytes(&bytes),
            Err(DataSpecError::CommandAfterEnd)
        ));
    }

    #[test]
    fn oversized_reservations_in_a_stream_are_rejected() {
        use crate::command::{OPCODE_END_SPEC, OPCODE_RESERVE};
        let reserve = |region: u32| (1u32 << 28) | (u32::from(OPCODE_RESERVE) << 20) | (1 << 7) | region;
        let mut words = Vec::new();
        // two 3 GiB empty regions
        for region in [6, 7] {
            words.push(reserve(region));
            words.push(0xC000_0000u32);
        }
        words.push(u32::from(OPCODE_END_SPEC) << 20);
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert!(matches!(
            DataSpecification::from_bytes(&bytes),
            Err(DataSpecError::RegionTooLarge { region: 6, .. })
        ));
    }

    #[test]
    fn missing_end_is_rejected() {
        let bytes = sample().to_bytes();
        assert!(DataSpecification::from_bytes(&bytes[..bytes.len() - 4]).is_err());
    }

    #[test]
    fn report_lists_comments_and_labels() {
        let report = sample().report();
        assert!(report.starts_with("# sample\n"));
        assert!(report.contains("label=spikeHistBuffer UNFILLED"));
        assert!(report.trim_end().ends_with("END_SPEC"));
    }

    #[test]
    fn reserved_totals() {
        assert_eq!(sample().total_reserved_bytes(), 40);
    }
}
