use crate::stored_object;

// `team_node`'s retrieval path is reserved — see retrieve_group_context's
// team scope (SPEC_FULL.md §4.6, §9). The node/edge types are kept total
// over the declared label set even though no query exercises them yet.
stored_object!(TeamNode, "team_node", {
    name: Option<String>
});
