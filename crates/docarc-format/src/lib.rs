//! docarc-format: the marker-tagged binary record serializer (C6, §4.5),
//! its pluggable string-table codec registry (§6.1), and the schema-less
//! archive printer/walker (§4.5.1).

pub mod codec;
pub mod error;
pub mod printer;
pub mod wire;
pub mod writer;

pub mod prelude {
    pub use crate::codec::{CodecRegistry, CodecState, StringCodec, HUFFMAN_FLAG_BIT, PLAIN_FLAG_BIT};
    pub use crate::error::{Error, Result};
    pub use crate::printer::{print_archive, DebugObject, DebugTree, DebugValue};
    pub use crate::writer::{write_archive, WriteOptions, WrittenArchive};
}
