use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Entry kinds as they appear in the `type` field of a Solidity ABI.
const KNOWN_KINDS: [&str; 6] = [
    "function",
    "event",
    "error",
    "constructor",
    "fallback",
    "receive",
];

#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct AbiEntry {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Eq, PartialEq, Serialize)]
pub struct AbiSummary {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
    pub entries: Vec<AbiEntry>,
}

/// Tallies ABI entries by kind, keeping their order.
///
/// Entries without a `type` are functions, as in solc output. Unrecognised
/// kinds are counted under `other`. A non-array ABI has no entries.
#[must_use]
pub fn summarize(abi: &Value) -> AbiSummary {
    let mut summary = AbiSummary::default();

    for item in abi.as_array().into_iter().flatten() {
        let kind = match item.get("type").and_then(Value::as_str) {
            None => "function",
            Some(kind) if KNOWN_KINDS.contains(&kind) => kind,
            Some(_) => "other",
        };

        let count = summary.counts.entry(kind.to_owned()).or_default();
        *count = count.saturating_add(1);

        summary.entries.push(AbiEntry {
            kind: kind.to_owned(),
            name: item.get("name").and_then(Value::as_str).map(str::to_owned),
        });
    }

    summary.total = summary.entries.len();

    summary
}

impl AbiSummary {
    pub fn print(&self) {
        println!("Entries: {} total", self.total);
        for (kind, count) in &self.counts {
            println!("  {kind}: {count}");
        }

        if self.entries.is_empty() {
            return;
        }

        println!("\nAll entries:");
        for (i, entry) in self.entries.iter().enumerate() {
            match &entry.name {
                Some(name) => println!("  {}. {} {name}", i.saturating_add(1), entry.kind),
                None => println!("  {}. {}", i.saturating_add(1), entry.kind),
            }
        }
    }
}
