use crate::stored_object;

stored_object!(UserNode, "user_node", {
    display_name: Option<String>
});
