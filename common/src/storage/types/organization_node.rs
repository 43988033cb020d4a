use crate::stored_object;

stored_object!(OrganizationNode, "organization_node", {
    name: Option<String>
});
