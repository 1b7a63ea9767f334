//! Bit-exact encoder/decoder for ledger entry bodies.
//!
//! Entry bodies are the commit messages of ledger commits, line-oriented:
//!
//! ```text
//! RSL Entry
//!
//! ref: refs/heads/main
//! targetID: 4b825dc642cb6eb9a060e54bf8d69288fbee4904
//! ```
//!
//! ```text
//! RSL Annotation
//!
//! entryID: <hash>
//! entryID: <hash>
//! skip: true
//! -----BEGIN MESSAGE-----
//! <base64, wrapped at 64 columns>
//! -----END MESSAGE-----
//! ```
//!
//! The decoder ignores unknown keys (forward compatibility), takes the last
//! value for duplicate keys except `entryID` which accumulates, and trims
//! whitespace per line so `\r\n` bodies decode the same as `\n` bodies.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use refseal_types::Hash;

use crate::entry::{Annotation, Entry, StandardEntry};
use crate::error::RslError;

pub const ENTRY_HEADER: &str = "RSL Entry";
pub const ANNOTATION_HEADER: &str = "RSL Annotation";
pub const REF_KEY: &str = "ref";
pub const TARGET_ID_KEY: &str = "targetID";
pub const ENTRY_ID_KEY: &str = "entryID";
pub const SKIP_KEY: &str = "skip";
pub const BEGIN_MESSAGE: &str = "-----BEGIN MESSAGE-----";
pub const END_MESSAGE: &str = "-----END MESSAGE-----";

const ARMOR_WIDTH: usize = 64;

/// Encode an entry body. Deterministic: keys in grammar order, no surplus
/// whitespace, the message block omitted when the message is empty.
pub fn encode(entry: &Entry) -> String {
    match entry {
        Entry::Standard(e) => encode_standard(e),
        Entry::Annotation(a) => encode_annotation(a),
    }
}

fn encode_standard(entry: &StandardEntry) -> String {
    format!(
        "{ENTRY_HEADER}\n\n{REF_KEY}: {}\n{TARGET_ID_KEY}: {}",
        entry.ref_name, entry.target_id
    )
}

fn encode_annotation(annotation: &Annotation) -> String {
    let mut lines = vec![ANNOTATION_HEADER.to_string(), String::new()];
    for target in &annotation.targets {
        lines.push(format!("{ENTRY_ID_KEY}: {target}"));
    }
    lines.push(format!("{SKIP_KEY}: {}", annotation.skip));

    if !annotation.message.is_empty() {
        lines.push(BEGIN_MESSAGE.to_string());
        let encoded = BASE64.encode(annotation.message.as_bytes());
        for chunk in encoded.as_bytes().chunks(ARMOR_WIDTH) {
            // base64 output is ASCII
            lines.push(String::from_utf8_lossy(chunk).into_owned());
        }
        lines.push(END_MESSAGE.to_string());
    }

    lines.join("\n")
}

/// Decode an entry body. `id` is the hash of the ledger commit carrying the
/// body.
pub fn decode(id: &Hash, message: &str) -> Result<Entry, RslError> {
    let text = message.trim();
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    if lines.len() < 4 {
        return Err(RslError::invalid("body has fewer than 4 lines"));
    }

    match lines[0] {
        ENTRY_HEADER => decode_standard(id, &lines[2..]),
        ANNOTATION_HEADER => decode_annotation(id, &lines[2..]),
        other => Err(RslError::invalid(format!("unrecognized header {other:?}"))),
    }
}

fn split_key_line(line: &str) -> Result<(&str, &str), RslError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| RslError::invalid(format!("malformed key line {line:?}")))?;
    Ok((key.trim(), value.trim()))
}

fn decode_standard(id: &Hash, lines: &[&str]) -> Result<Entry, RslError> {
    let mut ref_name: Option<String> = None;
    let mut target_id: Option<Hash> = None;

    for line in lines {
        let (key, value) = split_key_line(line)?;
        match key {
            REF_KEY => ref_name = Some(value.to_string()),
            TARGET_ID_KEY => {
                let hash = Hash::parse(value)
                    .map_err(|e| RslError::invalid(format!("bad target id: {e}")))?;
                target_id = Some(hash);
            }
            _ => {} // unknown keys are ignored for forward compatibility
        }
    }

    Ok(Entry::Standard(StandardEntry {
        id: id.clone(),
        ref_name: ref_name.ok_or_else(|| RslError::invalid("missing ref key"))?,
        target_id: target_id.ok_or_else(|| RslError::invalid("missing targetID key"))?,
    }))
}

fn decode_annotation(id: &Hash, lines: &[&str]) -> Result<Entry, RslError> {
    let mut targets = Vec::new();
    let mut skip: Option<bool> = None;

    for line in lines {
        if *line == BEGIN_MESSAGE {
            break;
        }
        let (key, value) = split_key_line(line)?;
        match key {
            ENTRY_ID_KEY => {
                let hash = Hash::parse(value)
                    .map_err(|e| RslError::invalid(format!("bad entry id: {e}")))?;
                targets.push(hash);
            }
            SKIP_KEY => skip = Some(value == "true"),
            _ => {}
        }
    }

    // Everything between the armor markers is base64 message body. Reaching
    // the end of input without the end marker is a truncated block.
    let mut message = String::new();
    let mut in_block = false;
    let mut terminated = true;
    let mut encoded = String::new();
    for line in lines {
        if *line == BEGIN_MESSAGE {
            in_block = true;
            terminated = false;
            continue;
        }
        if *line == END_MESSAGE {
            in_block = false;
            terminated = true;
            continue;
        }
        if in_block {
            encoded.push_str(line);
        }
    }
    if !terminated {
        return Err(RslError::invalid("message block is not terminated"));
    }
    if !encoded.is_empty() {
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| RslError::invalid(format!("bad message block: {e}")))?;
        message = String::from_utf8(bytes)
            .map_err(|_| RslError::invalid("message block is not UTF-8"))?;
    }

    if targets.is_empty() {
        return Err(RslError::invalid("annotation carries no entryID"));
    }

    Ok(Entry::Annotation(Annotation {
        id: id.clone(),
        targets,
        skip: skip.ok_or_else(|| RslError::invalid("missing skip key"))?,
        message,
    }))
}
