use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The three fields a detection runs on. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from_address: String,
}

impl EmailMessage {
    pub fn new(subject: &str, body: &str, from_address: &str) -> Self {
        Self {
            subject: subject.to_string(),
            body: body.to_string(),
            from_address: from_address.to_string(),
        }
    }

    /// Parse a raw message: headers, a blank line, then the body.
    ///
    /// Folded header lines are joined onto the previous header. The sender
    /// comes from `From`, falling back to `Return-Path`.
    pub fn parse_raw(raw: &str) -> Self {
        let mut headers: HashMap<String, String> = HashMap::new();
        let mut body = String::new();
        let mut in_headers = true;
        let mut last_header_key: Option<String> = None;

        for line in raw.lines() {
            if in_headers {
                if line.trim().is_empty() {
                    in_headers = false;
                    continue;
                }

                if line.starts_with(' ') || line.starts_with('\t') {
                    let existing = last_header_key.as_ref().and_then(|k| headers.get_mut(k));
                    if let Some(existing) = existing {
                        existing.push(' ');
                        existing.push_str(line.trim());
                    }
                    continue;
                }

                if let Some((key, value)) = line.split_once(':') {
                    let key = key.trim().to_lowercase();
                    last_header_key = Some(key.clone());
                    headers.entry(key).or_insert_with(|| value.trim().to_string());
                }
            } else {
                body.push_str(line);
                body.push('\n');
            }
        }

        let from_address = headers
            .get("from")
            .or_else(|| headers.get("return-path"))
            .map(|value| extract_address(value))
            .unwrap_or_default();

        Self {
            subject: headers.remove("subject").unwrap_or_default(),
            body: body.trim_end().to_string(),
            from_address,
        }
    }
}

/// Reduce `"Name" <user@host>` to `user@host`.
pub fn extract_address(header: &str) -> String {
    if let (Some(start), Some(end)) = (header.rfind('<'), header.rfind('>')) {
        if start < end {
            return header[start + 1..end].trim().to_string();
        }
    }
    header.trim().trim_matches(['<', '>']).to_string()
}
