use crate::stored_object;

stored_object!(MessageNode, "message_node", {
    session_id: Option<String>
});
