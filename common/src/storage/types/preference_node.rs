use crate::stored_object;

stored_object!(PreferenceNode, "preference_node", {
    user_id: String,
    topic: Option<String>,
    statement: String
});
