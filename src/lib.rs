//! docarc: a read-optimized columnar archive format for JSON-shaped
//! documents — this crate is a thin facade over the workspace's layered
//! pipeline (document model -> columnar transform -> marker-tagged binary
//! writer -> optional string-id index), re-exported for callers who don't
//! need the sub-crates individually. `docarc-cli` is the command-line
//! entry point built on the same pipeline.

pub use docarc_columnar as columnar;
pub use docarc_core as core;
pub use docarc_dict as dict;
pub use docarc_doc as doc;
pub use docarc_format as format;
pub use docarc_index as index;

pub mod prelude {
    pub use docarc_columnar::prelude::*;
    pub use docarc_core::prelude::*;
    pub use docarc_dict::{Dictionary, ShardedDictionary, StringDictionary};
    pub use docarc_doc::prelude::*;
    pub use docarc_format::prelude::*;
    pub use docarc_index::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn end_to_end_build_and_print() {
        let dict = StringDictionary::new();
        let docs = docarc_doc::from_json::from_json(&serde_json::json!({
            "name": "ann",
            "age": 30,
            "tags": ["a", "b"],
            "address": {"city": "nyc"},
        }))
        .unwrap();
        let root_doc = &docs[0];

        docarc_columnar::transform::preregister(root_doc, &dict, 1).unwrap();
        let mut root = docarc_columnar::transform::to_columndoc(root_doc, &dict).unwrap();
        sort_columndoc(&mut root, &dict);

        let registry = CodecRegistry::with_defaults();
        let written = write_archive(&root, &dict, &registry, &WriteOptions::default()).unwrap();

        let tree = print_archive(&written.bytes, &registry).unwrap();
        let keys: Vec<&str> = tree.root.properties.iter().map(|p| p.key.as_str()).collect();
        assert!(keys.contains(&"name"));
        assert!(keys.contains(&"tags"));
        assert!(keys.contains(&"address"));
    }
}
