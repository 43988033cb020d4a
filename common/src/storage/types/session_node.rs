use crate::stored_object;

stored_object!(SessionNode, "session_node", {
    name: Option<String>,
    project_id: Option<String>
});
