use serde::{Deserialize, Serialize};

/// How `read_file` turns bytes into text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Drop byte sequences that are not valid UTF-8.
    #[default]
    Ignore,
    /// Substitute U+FFFD for each invalid sequence.
    Replace,
    /// Refuse files that are not valid UTF-8.
    Strict,
}

impl DecodePolicy {
    /// Returns `None` only under `Strict` when the input is not UTF-8.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Ignore => Some(decode_ignoring_invalid(bytes)),
            Self::Replace => Some(String::from_utf8_lossy(bytes).into_owned()),
            Self::Strict => std::str::from_utf8(bytes).ok().map(str::to_string),
        }
    }
}

fn decode_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                // valid_up_to guarantees this prefix decodes
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // truncated sequence at end of input
                    None => return out,
                }
            }
        }
    }
}
