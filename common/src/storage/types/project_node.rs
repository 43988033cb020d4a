use crate::stored_object;

stored_object!(ProjectNode, "project_node", {
    name: Option<String>
});
