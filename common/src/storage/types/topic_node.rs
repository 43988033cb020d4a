use crate::stored_object;

stored_object!(TopicNode, "topic_node", {
    name: String
});
