use std::collections::HashMap;

use crate::stored_object;

/// The graph-side `Document` node. `metadata` is the patchable bag
/// `GraphStoreDal::update_document_metadata` writes into — title, tags,
/// and any caller-defined key ingestion didn't already set.
stored_object!(DocumentNode, "document_node", {
    name: String,
    source_type: Option<String>,
    metadata: HashMap<String, String>
});
