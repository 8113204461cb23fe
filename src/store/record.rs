use serde::{Deserialize, Serialize};

/// One capture result, as emitted by the capture tool on stdout.
///
/// The same shape is reused for manifest lines: after persistence the
/// `screenshot`, `html` and `pcap` payloads are replaced by the paths the
/// payloads were written to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Whether the tool considers the capture usable
    pub success: bool,
    /// Domain the capture was taken from
    pub domain: String,
    /// ISO-8601 capture instant
    pub timestamp: String,
    /// PNG screenshot, base64-encoded
    pub screenshot: String,
    /// Raw document HTML
    pub html: String,
    /// Network trace, base64-encoded
    pub pcap: String,
}

impl CaptureRecord {
    /// Decode a record from capture-tool stdout.
    pub fn parse(stdout: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(stdout)
    }
}
