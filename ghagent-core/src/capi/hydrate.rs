//! Session hydration.
//!
//! Raw sessions reference their pull request and acting user only by
//! numeric database IDs. One pass over the batch collects the node IDs
//! worth asking about, one `nodes(ids:)` query resolves the union set,
//! and the results are attached back in input order. Missing nodes
//! (deleted or inaccessible resources) simply stay `None`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;

use super::client::CapiHttpClient;
use crate::error::AgentTaskResult;
use crate::models::{PullRequest, RawSession, Session, User};
use crate::node_id::{encode_pull_request_node_id, encode_user_node_id};

const HYDRATION_QUERY: &str = "query($ids: [ID!]!) { nodes(ids: $ids) { __typename \
    ... on PullRequest { id fullDatabaseId number title state isDraft url body \
        createdAt updatedAt closedAt mergedAt repository { nameWithOwner } } \
    ... on User { login name databaseId } } }";

#[derive(Deserialize)]
struct NodesData {
    #[serde(default)]
    nodes: Vec<Option<HydrationNode>>,
}

#[derive(Deserialize)]
#[serde(tag = "__typename")]
enum HydrationNode {
    PullRequest(PullRequest),
    User(User),
    #[serde(other)]
    Other,
}

impl CapiHttpClient {
    pub(crate) async fn hydrate_sessions(
        &self,
        raw: Vec<RawSession>,
    ) -> AgentTaskResult<Vec<Session>> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let mut pr_node_ids: Vec<String> = Vec::new();
        let mut user_node_ids: Vec<String> = Vec::new();
        for session in &raw {
            if session.resource_type == "pull" && session.repo_id != 0 {
                let node_id =
                    encode_pull_request_node_id(session.repo_id, session.resource_id as u64);
                if !pr_node_ids.contains(&node_id) {
                    pr_node_ids.push(node_id);
                }
            }

            if session.user_id != 0 {
                let node_id = encode_user_node_id(session.user_id as u64);
                if !user_node_ids.contains(&node_id) {
                    user_node_ids.push(node_id);
                }
            }
        }

        let mut sessions: Vec<Session> = raw.into_iter().map(Session::from_raw).collect();

        let ids: Vec<String> = pr_node_ids.into_iter().chain(user_node_ids).collect();
        if ids.is_empty() {
            return Ok(sessions);
        }

        let data: NodesData = self.graphql(HYDRATION_QUERY, json!({ "ids": ids })).await?;

        let mut pr_map: HashMap<String, PullRequest> = HashMap::new();
        let mut user_map: HashMap<i64, User> = HashMap::new();
        for node in data.nodes.into_iter().flatten() {
            match node {
                HydrationNode::PullRequest(pr) => {
                    pr_map.insert(pr.full_database_id.clone(), pr);
                }
                HydrationNode::User(user) => {
                    user_map.insert(user.database_id, user);
                }
                HydrationNode::Other => {}
            }
        }

        for session in &mut sessions {
            session.pull_request = pr_map.get(&session.resource_id.to_string()).cloned();
            session.user = user_map.get(&session.user_id).cloned();
        }

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hydration_node_discriminator() {
        let json = r#"[
            {"__typename": "PullRequest", "id": "PR_x", "fullDatabaseId": "2000", "number": 42,
             "title": "t", "state": "OPEN", "isDraft": false, "url": "u", "body": ""},
            {"__typename": "User", "login": "octocat", "databaseId": 1},
            {"__typename": "Issue", "id": "I_x"}
        ]"#;

        let nodes: Vec<HydrationNode> = serde_json::from_str(json).unwrap();
        assert!(matches!(&nodes[0], HydrationNode::PullRequest(pr) if pr.number == 42));
        assert!(matches!(&nodes[1], HydrationNode::User(u) if u.login == "octocat"));
        assert!(matches!(&nodes[2], HydrationNode::Other));
    }
}
