//! Codec for the `UAFV1TLV` assertion scheme.
//!
//! Each node is laid out as `Tag (u16 LE) | Length (u16 LE) | Value (Length bytes)`. Tags with the
//! [`CONTAINER_BIT`] set carry a concatenation of child nodes, every other tag carries a raw
//! payload. Tags this crate does not know are kept as [`Value::Unknown`] with their raw bytes so
//! that newer authenticators can still be parsed.
//!
//! <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-uaf-authnr-cmds-v1.1-ps-20170202.html#tlv-encoded-data>

use std::ops::Range;

mod fields;
mod tag;


pub use self::{
    fields::{AssertionInfo, Counters, LeafFields},
    tag::{Tag, CONTAINER_BIT},
};

/// Size of the tag and length prefix of every node.
pub const HEADER_LEN: usize = 4;

/// Maximum nesting of container nodes accepted while decoding.
pub const MAX_DEPTH: usize = 16;

/// Reasons a buffer is not a well formed TLV sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvError {
    /// There was nothing to decode.
    Empty,
    /// A node declared more bytes than remain in its enclosing buffer.
    Truncated {
        /// Raw tag of the offending node.
        tag: u16,
        /// Position of the node in the outermost buffer.
        offset: usize,
        /// Length the node declared.
        declared: usize,
        /// Bytes that were actually left.
        available: usize,
    },
    /// Fewer bytes than a node header were left after the last complete node.
    TrailingBytes {
        /// Position of the leftover bytes in the outermost buffer.
        offset: usize,
        /// Number of leftover bytes.
        len: usize,
    },
    /// Containers were nested deeper than [`MAX_DEPTH`].
    TooDeep,
    /// A value is too large for the 16 bit length field.
    TooLong(usize),
}

impl std::fmt::Display for TlvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlvError::Empty => f.write_str("empty TLV buffer"),
            TlvError::Truncated {
                tag,
                offset,
                declared,
                available,
            } => write!(
                f,
                "tag {tag:#06x} at offset {offset} declares {declared} bytes but only {available} remain"
            ),
            TlvError::TrailingBytes { offset, len } => {
                write!(f, "{len} trailing bytes at offset {offset}")
            }
            TlvError::TooDeep => write!(f, "containers nested deeper than {MAX_DEPTH} levels"),
            TlvError::TooLong(len) => write!(f, "value of {len} bytes does not fit a TLV length"),
        }
    }
}

impl std::error::Error for TlvError {}

/// A leaf payload together with the fields decoded from it, when its tag has a fixed layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    bytes: Vec<u8>,
    fields: Option<LeafFields>,
}

impl Leaf {
    fn decode(tag: Tag, bytes: &[u8]) -> Self {
        let fields = match tag {
            Tag::Counters => Counters::decode(bytes).map(LeafFields::Counters),
            Tag::AssertionInfo => AssertionInfo::decode(bytes).map(LeafFields::AssertionInfo),
            _ => None,
        };
        Self {
            bytes: bytes.to_vec(),
            fields,
        }
    }

    /// The raw payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded fields, if the tag has a fixed layout and the payload length matched it.
    pub fn fields(&self) -> Option<&LeafFields> {
        self.fields.as_ref()
    }
}

/// The value part of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Nested nodes of a container tag.
    Container(Vec<Node>),
    /// Payload of a known leaf tag.
    Leaf(Leaf),
    /// Payload of a tag this crate does not know, kept verbatim.
    Unknown(Vec<u8>),
}

/// A decoded TLV node.
///
/// Equality ignores the position a node was decoded from, so a decoded tree compares equal to the
/// tree it was encoded from.
#[derive(Debug, Clone)]
pub struct Node {
    tag: u16,
    offset: usize,
    value: Value,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.value == other.value
    }
}

impl Eq for Node {}

impl Node {
    /// Build a container node.
    pub fn container(tag: Tag, children: Vec<Node>) -> Self {
        Self {
            tag: tag.code(),
            offset: 0,
            value: Value::Container(children),
        }
    }

    /// Build a leaf node, decoding its fields the same way [`decode`] would.
    pub fn leaf(tag: Tag, bytes: impl AsRef<[u8]>) -> Self {
        Self {
            tag: tag.code(),
            offset: 0,
            value: Value::Leaf(Leaf::decode(tag, bytes.as_ref())),
        }
    }

    /// Build a node for a tag that has no known meaning.
    pub fn unknown(tag: u16, bytes: Vec<u8>) -> Self {
        Self {
            tag,
            offset: 0,
            value: Value::Unknown(bytes),
        }
    }

    /// Build a `TAG_COUNTERS` leaf.
    pub fn counters(counters: Counters) -> Self {
        Self::leaf(Tag::Counters, counters.to_bytes())
    }

    /// Build a `TAG_ASSERTION_INFO` leaf.
    pub fn assertion_info(info: AssertionInfo) -> Self {
        Self::leaf(Tag::AssertionInfo, info.to_bytes())
    }

    /// The raw tag number.
    pub fn tag_code(&self) -> u16 {
        self.tag
    }

    /// The tag, if it is a known one.
    pub fn tag(&self) -> Option<Tag> {
        Tag::try_from(self.tag).ok()
    }

    /// Position of this node's header in the buffer it was decoded from. Always `0` for nodes that
    /// were constructed rather than decoded.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the value, as carried in the length field.
    pub fn length(&self) -> usize {
        match &self.value {
            Value::Container(children) => children.iter().map(Node::encoded_len).sum(),
            Value::Leaf(leaf) => leaf.bytes.len(),
            Value::Unknown(bytes) => bytes.len(),
        }
    }

    /// Length of the whole node, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.length()
    }

    /// Byte range of the whole node, header included, inside the buffer it was decoded from.
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.encoded_len()
    }

    /// The node's value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[Node] {
        match &self.value {
            Value::Container(children) => children,
            _ => &[],
        }
    }

    /// First child carrying `tag`.
    pub fn child(&self, tag: Tag) -> Option<&Node> {
        find(self.children(), tag)
    }

    /// All children carrying `tag`.
    pub fn children_with(&self, tag: Tag) -> impl Iterator<Item = &Node> {
        let code = tag.code();
        self.children().iter().filter(move |node| node.tag == code)
    }

    /// Raw payload of a leaf or unknown node.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Leaf(leaf) => Some(leaf.bytes()),
            Value::Unknown(bytes) => Some(bytes),
            Value::Container(_) => None,
        }
    }

    /// Decoded fields of a leaf with a fixed layout.
    pub fn fields(&self) -> Option<&LeafFields> {
        match &self.value {
            Value::Leaf(leaf) => leaf.fields(),
            _ => None,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), TlvError> {
        let length = self.length();
        let length_field = u16::try_from(length).map_err(|_| TlvError::TooLong(length))?;
        out.extend(self.tag.to_le_bytes());
        out.extend(length_field.to_le_bytes());
        match &self.value {
            Value::Container(children) => {
                for child in children {
                    child.encode_into(out)?;
                }
            }
            Value::Leaf(leaf) => out.extend_from_slice(&leaf.bytes),
            Value::Unknown(bytes) => out.extend_from_slice(bytes),
        }
        Ok(())
    }

    /// Encode this node and its children.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TlvError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }
}

/// First node in `nodes` carrying `tag`.
pub fn find(nodes: &[Node], tag: Tag) -> Option<&Node> {
    let code = tag.code();
    nodes.iter().find(|node| node.tag == code)
}

/// Decode a buffer into its top level sibling nodes.
///
/// The whole buffer must be consumed: bytes left over after the last node are an error, as is a
/// node whose declared length runs past the end of its enclosing buffer.
pub fn decode(buffer: &[u8]) -> Result<Vec<Node>, TlvError> {
    if buffer.is_empty() {
        return Err(TlvError::Empty);
    }
    decode_siblings(buffer, 0, 0)
}

fn decode_siblings(buffer: &[u8], base: usize, depth: usize) -> Result<Vec<Node>, TlvError> {
    if depth > MAX_DEPTH {
        return Err(TlvError::TooDeep);
    }

    let mut nodes = Vec::new();
    let mut pos = 0;
    while pos < buffer.len() {
        let remaining = &buffer[pos..];
        let offset = base + pos;
        if remaining.len() < HEADER_LEN {
            return Err(TlvError::TrailingBytes {
                offset,
                len: remaining.len(),
            });
        }

        let tag = u16::from_le_bytes([remaining[0], remaining[1]]);
        let length = usize::from(u16::from_le_bytes([remaining[2], remaining[3]]));
        let value = remaining
            .get(HEADER_LEN..HEADER_LEN + length)
            .ok_or(TlvError::Truncated {
                tag,
                offset,
                declared: length,
                available: remaining.len() - HEADER_LEN,
            })?;

        let value = match Tag::try_from(tag) {
            Ok(known) if known.is_container() => {
                Value::Container(decode_siblings(value, offset + HEADER_LEN, depth + 1)?)
            }
            Ok(known) => Value::Leaf(Leaf::decode(known, value)),
            Err(_) => Value::Unknown(value.to_vec()),
        };

        nodes.push(Node { tag, offset, value });
        pos += HEADER_LEN + length;
    }

    Ok(nodes)
}

/// Encode a sequence of sibling nodes.
pub fn encode(nodes: &[Node]) -> Result<Vec<u8>, TlvError> {
    let mut out = Vec::with_capacity(nodes.iter().map(Node::encoded_len).sum());
    for node in nodes {
        node.encode_into(&mut out)?;
    }
    Ok(out)
}
