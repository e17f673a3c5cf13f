//! Reads the packet-trace dataset format: a `known_count num_packets
//! ip_range` header followed by that many known keys and then that many
//! packets, all whitespace-separated decimal integers.

use std::fs;
use std::path::Path;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone)]
pub struct Dataset {
    pub ip_range: u32,
    pub known_keys: Vec<u32>,
    pub packets: Vec<u32>,
}

/// Token stream over the whole file, whitespace is the only delimiter:
/// the header and every key/packet can span any number of lines.
struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            iter: content.split_whitespace(),
        }
    }

    fn next_u32(&mut self, field: &str) -> CliResult<u32> {
        let raw = self
            .iter
            .next()
            .ok_or_else(|| CliError::DatasetParse(format!("missing {field}")))?;
        raw.parse::<u32>()
            .map_err(|_| CliError::DatasetParse(format!("{field} is not a valid integer: {raw:?}")))
    }
}

impl Dataset {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut tokens = Tokens::new(&content);

        let known_count = tokens.next_u32("known_count")?;
        let num_packets = tokens.next_u32("num_packets")?;
        let ip_range = tokens.next_u32("ip_range")?;

        let mut known_keys = Vec::with_capacity(known_count as usize);
        for i in 0..known_count {
            known_keys.push(tokens.next_u32(&format!("known key #{i}"))?);
        }

        let mut packets = Vec::with_capacity(num_packets as usize);
        for i in 0..num_packets {
            packets.push(tokens.next_u32(&format!("packet #{i}"))?);
        }

        Ok(Self {
            ip_range,
            known_keys,
            packets,
        })
    }
}
