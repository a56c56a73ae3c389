//! The dictionary codec plugin interface (§6) and its two registered
//! implementations: an uncompressed passthrough and a canonical Huffman
//! coder over byte frequencies, selected by the string-table's `flags`
//! field at read time (§6.1).

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Per-archive codec state, built once from every string that will be
/// written (so a stateful codec like Huffman can derive a shared code
/// table), then used to encode/decode individual strings. This is the
/// Rust realization of §6's `(write_extra, read_extra, encode, decode,
/// print_extra, print_encoded)` plugin shape: `StringCodec` is the
/// stateless registration handle, `CodecState` is the built/loaded state
/// those six operations actually run against.
pub trait CodecState: Send + Sync {
    fn write_extra(&self) -> Vec<u8>;
    fn encode(&self, s: &str) -> Vec<u8>;
    fn decode(&self, encoded: &[u8], decoded_len: usize) -> Result<String>;
    fn print_extra(&self) -> String;
    fn print_encoded(&self, encoded: &[u8]) -> String;
}

pub trait StringCodec: Send + Sync {
    fn flag_bit(&self) -> u32;
    fn name(&self) -> &'static str;
    fn build(&self, strings: &[&str]) -> Box<dyn CodecState>;
    fn read_extra(&self, bytes: &[u8]) -> Result<Box<dyn CodecState>>;
}

/// Keys registered codecs by their string-table `flag_bit` so a reader can
/// pick the right decoder from `StringTable.flags` without needing to know
/// the writer's choice ahead of time.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<u32, Box<dyn StringCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        CodecRegistry { codecs: HashMap::new() }
    }

    /// A registry with both built-in codecs already registered.
    pub fn with_defaults() -> Self {
        let mut reg = CodecRegistry::new();
        reg.register(Box::new(PlainCodec));
        reg.register(Box::new(HuffmanCodec));
        reg
    }

    pub fn register(&mut self, codec: Box<dyn StringCodec>) {
        self.codecs.insert(codec.flag_bit(), codec);
    }

    pub fn get(&self, flag_bit: u32) -> Result<&dyn StringCodec> {
        self.codecs.get(&flag_bit).map(|b| b.as_ref()).ok_or(Error::UnknownCodec(flag_bit))
    }
}

/// Uncompressed passthrough codec (`flag_bit = 0x01`).
pub struct PlainCodec;

pub const PLAIN_FLAG_BIT: u32 = 0x01;

struct PlainState;

impl CodecState for PlainState {
    fn write_extra(&self) -> Vec<u8> {
        Vec::new()
    }

    fn encode(&self, s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    fn decode(&self, encoded: &[u8], decoded_len: usize) -> Result<String> {
        let bytes = &encoded[..decoded_len.min(encoded.len())];
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Corrupted { detail: format!("invalid utf-8 in plain-coded string: {e}") })
    }

    fn print_extra(&self) -> String {
        String::new()
    }

    fn print_encoded(&self, encoded: &[u8]) -> String {
        String::from_utf8_lossy(encoded).into_owned()
    }
}

impl StringCodec for PlainCodec {
    fn flag_bit(&self) -> u32 {
        PLAIN_FLAG_BIT
    }

    fn name(&self) -> &'static str {
        "plain"
    }

    fn build(&self, _strings: &[&str]) -> Box<dyn CodecState> {
        Box::new(PlainState)
    }

    fn read_extra(&self, _bytes: &[u8]) -> Result<Box<dyn CodecState>> {
        Ok(Box::new(PlainState))
    }
}

/// Canonical Huffman codec over byte frequencies (`flag_bit = 0x02`).
pub struct HuffmanCodec;

pub const HUFFMAN_FLAG_BIT: u32 = 0x02;

struct HuffmanState {
    /// Code length per byte value, 0 if the byte never occurs.
    lengths: [u8; 256],
    /// Canonical code (left-justified in a u32) per byte value.
    codes: [u32; 256],
    /// Byte value for each (length, code) pair, for decoding.
    decode_table: HashMap<(u8, u32), u8>,
}

impl HuffmanState {
    fn from_lengths(lengths: [u8; 256]) -> Self {
        let (codes, decode_table) = canonical_codes(&lengths);
        HuffmanState { lengths, codes, decode_table }
    }
}

impl CodecState for HuffmanState {
    fn write_extra(&self) -> Vec<u8> {
        self.lengths.to_vec()
    }

    fn encode(&self, s: &str) -> Vec<u8> {
        let mut writer = BitWriter::new();
        for &b in s.as_bytes() {
            let len = self.lengths[b as usize];
            debug_assert!(len > 0, "byte {b} missing from huffman table");
            writer.write_bits(self.codes[b as usize], len);
        }
        writer.finish()
    }

    fn decode(&self, encoded: &[u8], decoded_len: usize) -> Result<String> {
        let mut reader = BitReader::new(encoded);
        let mut out = Vec::with_capacity(decoded_len);
        while out.len() < decoded_len {
            let mut code: u32 = 0;
            let mut len: u8 = 0;
            loop {
                let bit = reader
                    .read_bit()
                    .ok_or_else(|| Error::Corrupted { detail: "huffman stream exhausted mid-symbol".into() })?;
                code = (code << 1) | bit as u32;
                len += 1;
                if let Some(&byte) = self.decode_table.get(&(len, code)) {
                    out.push(byte);
                    break;
                }
                if len > 32 {
                    return Err(Error::Corrupted { detail: "huffman code exceeded 32 bits".into() });
                }
            }
        }
        String::from_utf8(out).map_err(|e| Error::Corrupted { detail: format!("invalid utf-8 in huffman-coded string: {e}") })
    }

    fn print_extra(&self) -> String {
        let entries: Vec<String> = self
            .lengths
            .iter()
            .enumerate()
            .filter(|(_, &l)| l > 0)
            .map(|(b, l)| format!("{b}:{l}"))
            .collect();
        format!("huffman-lengths[{}]", entries.join(","))
    }

    fn print_encoded(&self, encoded: &[u8]) -> String {
        format!("<{} huffman-coded bytes>", encoded.len())
    }
}

impl StringCodec for HuffmanCodec {
    fn flag_bit(&self) -> u32 {
        HUFFMAN_FLAG_BIT
    }

    fn name(&self) -> &'static str {
        "huffman"
    }

    fn build(&self, strings: &[&str]) -> Box<dyn CodecState> {
        let mut freq = [0u64; 256];
        for s in strings {
            for &b in s.as_bytes() {
                freq[b as usize] += 1;
            }
        }
        let lengths = huffman_lengths(&freq);
        Box::new(HuffmanState::from_lengths(lengths))
    }

    fn read_extra(&self, bytes: &[u8]) -> Result<Box<dyn CodecState>> {
        if bytes.len() != 256 {
            return Err(Error::Corrupted { detail: format!("huffman extra region had {} bytes, expected 256", bytes.len()) });
        }
        let mut lengths = [0u8; 256];
        lengths.copy_from_slice(bytes);
        Ok(Box::new(HuffmanState::from_lengths(lengths)))
    }
}

/// Builds per-symbol code lengths for a canonical Huffman code over byte
/// frequencies, via the standard two-queue merge. Symbols with zero
/// frequency get length 0 (absent from the table). A single distinct
/// symbol is still assigned length 1 so `encode` always has a code to
/// emit.
fn huffman_lengths(freq: &[u64; 256]) -> [u8; 256] {
    #[derive(Clone)]
    enum Node {
        Leaf { symbol: u8, weight: u64 },
        Internal { weight: u64, left: Box<Node>, right: Box<Node> },
    }
    impl Node {
        fn weight(&self) -> u64 {
            match self {
                Node::Leaf { weight, .. } => *weight,
                Node::Internal { weight, .. } => *weight,
            }
        }
    }

    let mut nodes: Vec<Node> = (0u16..256)
        .filter(|&b| freq[b as usize] > 0)
        .map(|b| Node::Leaf { symbol: b as u8, weight: freq[b as usize] })
        .collect();

    let mut lengths = [0u8; 256];
    if nodes.is_empty() {
        return lengths;
    }
    if nodes.len() == 1 {
        if let Node::Leaf { symbol, .. } = nodes[0] {
            lengths[symbol as usize] = 1;
        }
        return lengths;
    }

    while nodes.len() > 1 {
        nodes.sort_by_key(|n| n.weight());
        let left = nodes.remove(0);
        let right = nodes.remove(0);
        let weight = left.weight() + right.weight();
        nodes.push(Node::Internal { weight, left: Box::new(left), right: Box::new(right) });
    }

    fn walk(node: &Node, depth: u8, lengths: &mut [u8; 256]) {
        match node {
            Node::Leaf { symbol, .. } => lengths[*symbol as usize] = depth.max(1),
            Node::Internal { left, right, .. } => {
                walk(left, depth + 1, lengths);
                walk(right, depth + 1, lengths);
            }
        }
    }
    walk(&nodes[0], 0, &mut lengths);
    lengths
}

/// Assigns canonical codes given code lengths: symbols ordered by
/// `(length, symbol value)`, codes allocated in that order starting from
/// 0 and left-shifted by one whenever length increases.
fn canonical_codes(lengths: &[u8; 256]) -> ([u32; 256], HashMap<(u8, u32), u8>) {
    let mut symbols: Vec<u8> = (0u16..256).filter(|&b| lengths[b as usize] > 0).map(|b| b as u8).collect();
    symbols.sort_by_key(|&b| (lengths[b as usize], b));

    let mut codes = [0u32; 256];
    let mut decode_table = HashMap::new();
    let mut code: u32 = 0;
    let mut prev_len = 0u8;
    for &b in &symbols {
        let len = lengths[b as usize];
        code <<= len.saturating_sub(prev_len);
        codes[b as usize] = code;
        decode_table.insert((len, code), b);
        code += 1;
        prev_len = len;
    }
    (codes, decode_table)
}

struct BitWriter {
    bytes: Vec<u8>,
    cur: u8,
    nbits: u8,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter { bytes: Vec::new(), cur: 0, nbits: 0 }
    }

    fn write_bits(&mut self, code: u32, len: u8) {
        for i in (0..len).rev() {
            let bit = (code >> i) & 1;
            self.cur = (self.cur << 1) | bit as u8;
            self.nbits += 1;
            if self.nbits == 8 {
                self.bytes.push(self.cur);
                self.cur = 0;
                self.nbits = 0;
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.cur <<= 8 - self.nbits;
            self.bytes.push(self.cur);
        }
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    byte_idx: usize,
    bit_idx: u8,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        BitReader { bytes, byte_idx: 0, bit_idx: 0 }
    }

    fn read_bit(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.byte_idx)?;
        let bit = (byte >> (7 - self.bit_idx)) & 1;
        self.bit_idx += 1;
        if self.bit_idx == 8 {
            self.bit_idx = 0;
            self.byte_idx += 1;
        }
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_round_trips() {
        let state = PlainCodec.build(&["hello"]);
        let encoded = state.encode("hello");
        assert_eq!(state.decode(&encoded, 5).unwrap(), "hello");
    }

    #[test]
    fn huffman_round_trips_single_string() {
        let state = HuffmanCodec.build(&["aaabbbccd"]);
        let encoded = state.encode("aaabbbccd");
        let decoded = state.decode(&encoded, "aaabbbccd".len()).unwrap();
        assert_eq!(decoded, "aaabbbccd");
    }

    #[test]
    fn huffman_extra_round_trips_through_bytes() {
        let strings = ["the quick brown fox", "jumps over the lazy dog"];
        let state = HuffmanCodec.build(&strings);
        let extra = state.write_extra();
        let reloaded = HuffmanCodec.read_extra(&extra).unwrap();
        for s in strings {
            let encoded = state.encode(s);
            assert_eq!(reloaded.decode(&encoded, s.len()).unwrap(), s);
        }
    }

    #[test]
    fn huffman_handles_single_distinct_byte() {
        let state = HuffmanCodec.build(&["aaaa"]);
        let encoded = state.encode("aaaa");
        assert_eq!(state.decode(&encoded, 4).unwrap(), "aaaa");
    }

    #[test]
    fn registry_dispatches_by_flag_bit() {
        let reg = CodecRegistry::with_defaults();
        assert_eq!(reg.get(PLAIN_FLAG_BIT).unwrap().name(), "plain");
        assert_eq!(reg.get(HUFFMAN_FLAG_BIT).unwrap().name(), "huffman");
        assert!(reg.get(0xFF).is_err());
    }
}
