//! Incremental JSON parser for streaming responses
//!
//! Ollama streams newline-delimited JSON, but HTTP chunk boundaries do not
//! line up with object boundaries. The parser buffers bytes and extracts
//! complete objects by bracket matching:
//! - Buffer: 1MB maximum
//! - Algorithm: O(n) single pass bracket matching
//! - Braces inside strings (and escaped quotes) are ignored

use crate::errors::{AgentError, Result};
use serde::Deserialize;

/// Maximum buffer size (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// One line of an `/api/generate` stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateChunk {
    /// Text produced since the previous chunk
    #[serde(default)]
    pub response: String,

    /// Set on the final chunk
    #[serde(default)]
    pub done: bool,

    /// Server-side failure reported in-band
    #[serde(default)]
    pub error: Option<String>,
}

/// Incremental JSON parser
#[derive(Debug)]
pub struct JsonParser {
    /// Accumulation buffer
    buffer: Vec<u8>,

    /// Maximum buffer size
    max_buffer_size: usize,
}

impl JsonParser {
    /// Create new JSON parser with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    /// Create parser with custom buffer capacity
    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_buffer_size,
        }
    }

    /// Add bytes to parser and attempt to extract the first complete object
    ///
    /// ```text
    /// Algorithm extract_complete_json(B):
    /// 1. depth ← 0, start ← None
    /// 2. For each byte bᵢ in B (outside string literals):
    ///      If bᵢ = '{':
    ///        If depth = 0: start ← i
    ///        depth ← depth + 1
    ///      If bᵢ = '}':
    ///        depth ← depth - 1
    ///        If depth = 0 and start ≠ None:
    ///          Return B[start..=i]
    /// 3. Return None
    /// ```
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Option<String>> {
        if self.buffer.len() + bytes.len() > self.max_buffer_size {
            return Err(AgentError::JsonParseError(format!(
                "Buffer overflow: {} bytes exceeds maximum {}",
                self.buffer.len() + bytes.len(),
                self.max_buffer_size
            )));
        }

        self.buffer.extend_from_slice(bytes);
        self.try_extract_json()
    }

    /// Attempt to extract the next complete object from the buffer
    pub fn try_extract_json(&mut self) -> Result<Option<String>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        if let Some((start, end)) = self.find_complete_json()? {
            let json_str = String::from_utf8_lossy(&self.buffer[start..=end]).to_string();
            self.buffer.drain(..=end);
            return Ok(Some(json_str));
        }

        Ok(None)
    }

    /// Feed bytes and decode every generate chunk that became complete
    pub fn push_chunks(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>> {
        let mut chunks = Vec::new();
        let mut next = self.add_bytes(bytes)?;
        while let Some(json) = next {
            chunks.push(self.parse_chunk(&json)?);
            next = self.try_extract_json()?;
        }
        Ok(chunks)
    }

    /// Decode one extracted object
    pub fn parse_chunk(&self, json_str: &str) -> Result<GenerateChunk> {
        serde_json::from_str(json_str).map_err(|e| {
            AgentError::JsonParseError(format!("Failed to parse generate chunk: {}", e))
        })
    }

    fn find_complete_json(&self) -> Result<Option<(usize, usize)>> {
        let mut depth: i32 = 0;
        let mut start: Option<usize> = None;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, &byte) in self.buffer.iter().enumerate() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match byte {
                b'\\' if in_string => escape_next = true,
                b'"' => in_string = !in_string,
                _ if in_string => {}
                b'{' => {
                    if depth == 0 {
                        start = Some(i);
                    }
                    depth += 1;
                }
                b'}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(AgentError::JsonParseError(
                            "Mismatched braces: too many closing braces".to_string(),
                        ));
                    }
                    if depth == 0 {
                        if let Some(s) = start {
                            return Ok(Some((s, i)));
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(None)
    }

    /// Whether any bytes are still buffered (ignoring whitespace)
    pub fn has_pending(&self) -> bool {
        self.buffer.iter().any(|b| !b.is_ascii_whitespace())
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_chunk() {
        let mut parser = JsonParser::new();
        let chunks = parser
            .push_chunks(br#"{"model":"m","response":"Hel","done":false}"#)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].response, "Hel");
        assert!(!chunks[0].done);
    }

    #[test]
    fn test_chunk_split_across_reads() {
        let mut parser = JsonParser::new();
        assert!(parser.push_chunks(br#"{"response":"Tho"#).unwrap().is_empty());
        let chunks = parser.push_chunks(b"ught\",\"done\":false}\n").unwrap();
        assert_eq!(chunks[0].response, "Thought");
    }

    #[test]
    fn test_several_chunks_in_one_read() {
        let mut parser = JsonParser::new();
        let data = b"{\"response\":\"a\",\"done\":false}\n{\"response\":\"b\",\"done\":false}\n{\"response\":\"\",\"done\":true}\n";
        let chunks = parser.push_chunks(data).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].response, "b");
        assert!(chunks[2].done);
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_braces_and_escaped_quotes_in_response() {
        let mut parser = JsonParser::new();
        let data = br#"{"response":"finish[answer=\"{x}\"]","done":false}"#;
        let chunks = parser.push_chunks(data).unwrap();
        assert_eq!(chunks[0].response, "finish[answer=\"{x}\"]");
    }

    #[test]
    fn test_error_chunk() {
        let mut parser = JsonParser::new();
        let chunks = parser
            .push_chunks(br#"{"error":"model 'x' not found"}"#)
            .unwrap();
        assert_eq!(chunks[0].error.as_deref(), Some("model 'x' not found"));
    }

    #[test]
    fn test_buffer_overflow() {
        let mut parser = JsonParser::with_capacity(100);
        let result = parser.add_bytes(&[b'a'; 150]);
        assert!(matches!(result, Err(AgentError::JsonParseError(_))));
    }

    #[test]
    fn test_mismatched_braces() {
        let mut parser = JsonParser::new();
        assert!(parser.add_bytes(b"}").is_err());
    }

    #[test]
    fn test_invalid_chunk_json() {
        let parser = JsonParser::new();
        assert!(parser.parse_chunk(r#"{"response": 5}"#).is_err());
    }

    #[test]
    fn test_clear() {
        let mut parser = JsonParser::new();
        parser.add_bytes(b"{\"partial").unwrap();
        assert!(parser.has_pending());
        parser.clear();
        assert_eq!(parser.buffer_size(), 0);
    }
}
