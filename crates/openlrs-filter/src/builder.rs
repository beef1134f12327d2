//! Compilation of hook filter documents into predicates.
//!
//! The grammar is deliberately forgiving: unknown keys are ignored, list
//! entries that do not carry a usable identifier are skipped, and agent
//! descriptors that resolve to nobody constrain nothing. The only hard
//! failure is a filter document (or `related` entry) that is not an object,
//! and that failure is scoped to the hook that owns the document.

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

use openlrs_store::AgentStore;
use openlrs_types::{Agent, Ifi};

use crate::error::{FilterError, json_type_name};
use crate::predicate::{FieldTest, Predicate};

/// Compile a hook's filter document into a predicate.
///
/// Top-level keys combine with AND; the list under each key combines with
/// OR. Absent keys and `{}` place no constraint.
///
/// # Errors
///
/// [`FilterError::Malformed`] when `filters` or a `related` list entry is
/// not a JSON object.
pub async fn build_predicate(
    filters: &Value,
    agents: &AgentStore,
) -> Result<Predicate, FilterError> {
    let Some(map) = filters.as_object() else {
        return Err(FilterError::Malformed {
            found: json_type_name(filters),
        });
    };

    let mut actor_q = Predicate::Empty;
    if let Some(Value::Array(actors)) = map.get("actor") {
        for descriptor in actors {
            if let Some(ifi) = resolve_filter_agent(descriptor, agents).await {
                actor_q = actor_q.or(Predicate::Leaf(FieldTest::Actor(ifi)));
            }
        }
    }

    let mut verb_q = Predicate::Empty;
    if let Some(Value::Array(verbs)) = map.get("verb") {
        for entry in verbs {
            if let Some(id) = entry.get("id").and_then(Value::as_str) {
                verb_q = verb_q.or(Predicate::Leaf(FieldTest::Verb(id.to_owned())));
            }
        }
    }

    let mut object_q = Predicate::Empty;
    if let Some(Value::Array(objects)) = map.get("object") {
        for entry in objects {
            if let Some(id) = entry.get("id").and_then(Value::as_str) {
                object_q = object_q.or(Predicate::Leaf(FieldTest::ObjectActivity(id.to_owned())));
            }
        }
    }

    let mut filter_q = actor_q.and(verb_q).and(object_q);

    if let Some(Value::Array(related)) = map.get("related") {
        filter_q = filter_q.and(build_related(related, true, agents).await?);
    }

    Ok(filter_q)
}

/// Compile one level of a `related` list.
///
/// `or_operand` decides how this level's plain entries and the level's
/// overall result attach to their surroundings: `or` groups recurse with it
/// set, `and` groups recurse with it cleared. Plain activity entries are
/// gathered into a single membership test that attaches after everything
/// else at this level.
fn build_related<'a>(
    items: &'a [Value],
    or_operand: bool,
    agents: &'a AgentStore,
) -> BoxFuture<'a, Result<Predicate, FilterError>> {
    Box::pin(async move {
        let mut inner_q = Predicate::Empty;
        let mut object_q = Predicate::Empty;
        let mut activity_ids: Vec<String> = Vec::new();

        for entry in items {
            let Some(map) = entry.as_object() else {
                return Err(FilterError::Malformed {
                    found: json_type_name(entry),
                });
            };
            if let Some(group) = map.get("or") {
                if let Value::Array(members) = group {
                    inner_q = inner_q.or(build_related(members, true, agents).await?);
                }
            } else if let Some(group) = map.get("and") {
                if let Value::Array(members) = group {
                    inner_q = inner_q.and(build_related(members, false, agents).await?);
                }
            } else if let Some(id) = map.get("id") {
                // An `id` key marks an activity entry even when unusable.
                if let Some(id) = id.as_str() {
                    activity_ids.push(id.to_owned());
                }
            } else if let Some(ifi) = resolve_filter_agent(entry, agents).await {
                object_q = attach(object_q, FieldTest::RelatedAgent(ifi), or_operand);
            }
        }

        if !activity_ids.is_empty() {
            object_q = attach(object_q, FieldTest::RelatedActivity(activity_ids), or_operand);
        }

        Ok(if or_operand {
            object_q.or(inner_q)
        } else {
            object_q.and(inner_q)
        })
    })
}

fn attach(q: Predicate, test: FieldTest, or_operand: bool) -> Predicate {
    let leaf = Predicate::Leaf(test);
    if or_operand { q.or(leaf) } else { q.and(leaf) }
}

/// Resolve an agent descriptor against the store.
///
/// Returns `None` for descriptors that do not parse, that match more than
/// one stored actor, or that match none; only the first two are logged.
async fn resolve_filter_agent(descriptor: &Value, agents: &AgentStore) -> Option<Ifi> {
    let Some(agent) = Agent::from_value(descriptor) else {
        warn!(descriptor = %descriptor, "Agent data was invalid for agent filter");
        return None;
    };
    match agents.lookup(&agent.ifi).await {
        Ok(found) => found.map(|agent| agent.ifi),
        Err(error) => {
            warn!(%error, "Agent filter lookup was ambiguous");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use openlrs_types::{AgentKind, StatementId, StoredStatement};
    use serde_json::json;

    fn stored(document: serde_json::Value) -> StoredStatement {
        let id = StatementId::new();
        let raw = document.to_string();
        StoredStatement::from_document(id, chrono::Utc::now(), &document, raw).unwrap()
    }

    async fn store_with(mboxes: &[&str]) -> AgentStore {
        let agents = AgentStore::new();
        for mbox in mboxes {
            agents
                .register(Agent {
                    kind: AgentKind::Agent,
                    name: None,
                    ifi: Ifi::Mbox((*mbox).to_owned()),
                })
                .await;
        }
        agents
    }

    #[tokio::test]
    async fn empty_and_absent_filters_match_everything() {
        let agents = AgentStore::new();
        let predicate = build_predicate(&json!({}), &agents).await.unwrap();
        assert!(predicate.is_empty());
    }

    #[tokio::test]
    async fn non_object_filters_are_malformed() {
        let agents = AgentStore::new();
        let err = build_predicate(&json!(["actor"]), &agents).await.unwrap_err();
        assert!(matches!(err, FilterError::Malformed { found: "array" }));
    }

    #[tokio::test]
    async fn top_level_keys_combine_with_and() {
        let agents = store_with(&["mailto:sam@example.com"]).await;
        let filters = json!({
            "actor": [{"mbox": "mailto:sam@example.com"}],
            "verb": [{"id": "http://adlnet.gov/expapi/verbs/completed"}]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let matching = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/completed"},
            "object": {"id": "http://example.com/course/1"}
        }));
        let wrong_actor = stored(json!({
            "actor": {"mbox": "mailto:kim@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/completed"},
            "object": {"id": "http://example.com/course/1"}
        }));

        assert!(predicate.matches(&matching));
        assert!(!predicate.matches(&wrong_actor));
    }

    #[tokio::test]
    async fn list_entries_combine_with_or() {
        let agents = AgentStore::new();
        let filters = json!({
            "verb": [
                {"id": "http://adlnet.gov/expapi/verbs/passed"},
                {"id": "http://adlnet.gov/expapi/verbs/failed"}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let passed = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/passed"},
            "object": {"id": "http://example.com/exam"}
        }));
        let attempted = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/exam"}
        }));

        assert!(predicate.matches(&passed));
        assert!(!predicate.matches(&attempted));
    }

    #[tokio::test]
    async fn unknown_filter_agents_constrain_nothing() {
        // Nobody named in the filter is stored, so the actor clause
        // degrades to match-all rather than match-none.
        let agents = AgentStore::new();
        let filters = json!({"actor": [{"mbox": "mailto:ghost@example.com"}]});
        let predicate = build_predicate(&filters, &agents).await.unwrap();
        assert!(predicate.is_empty());
    }

    #[tokio::test]
    async fn invalid_filter_agents_are_skipped() {
        let agents = store_with(&["mailto:sam@example.com"]).await;
        let filters = json!({
            "actor": [
                {"mbox": "mailto:sam@example.com", "openid": "https://openid.example.com/sam"},
                {"mbox": "mailto:sam@example.com"}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let statement = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/completed"},
            "object": {"id": "http://example.com/course/1"}
        }));
        assert!(predicate.matches(&statement));
        assert!(!predicate.is_empty());
    }

    #[tokio::test]
    async fn related_ids_gather_into_one_membership_test() {
        let agents = AgentStore::new();
        let filters = json!({
            "related": [
                {"id": "http://example.com/course/a"},
                {"id": "http://example.com/course/b"}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let in_context = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"},
            "context": {
                "contextActivities": {
                    "parent": [{"id": "http://example.com/course/b"}]
                }
            }
        }));
        let unrelated = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"}
        }));

        assert!(predicate.matches(&in_context));
        assert!(!predicate.matches(&unrelated));
    }

    #[tokio::test]
    async fn related_and_group_requires_agent_and_activity() {
        let agents = store_with(&["mailto:kim@example.com"]).await;
        let filters = json!({
            "related": [
                {"and": [
                    {"mbox": "mailto:kim@example.com"},
                    {"id": "http://example.com/course/a"}
                ]}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let both = stored(json!({
            "actor": {"mbox": "mailto:kim@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/course/a"}
        }));
        let agent_only = stored(json!({
            "actor": {"mbox": "mailto:kim@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"}
        }));
        let activity_only = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/course/a"}
        }));

        assert!(predicate.matches(&both));
        assert!(!predicate.matches(&agent_only));
        assert!(!predicate.matches(&activity_only));
    }

    #[tokio::test]
    async fn and_grouped_ids_gather_into_one_membership_test() {
        let agents = AgentStore::new();
        let filters = json!({
            "related": [
                {"and": [
                    {"id": "http://example.com/course/a"},
                    {"id": "http://example.com/course/b"}
                ]}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        // Plain ids at one level always collapse into a single membership
        // test, so a statement related to either id satisfies the group.
        let only_a = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/course/a"}
        }));
        assert!(predicate.matches(&only_a));
    }

    #[tokio::test]
    async fn related_or_group_with_agent_and_activity() {
        let agents = store_with(&["mailto:kim@example.com"]).await;
        let filters = json!({
            "related": [
                {"or": [
                    {"mbox": "mailto:kim@example.com"},
                    {"id": "http://example.com/course/a"}
                ]}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let via_agent = stored(json!({
            "actor": {"mbox": "mailto:kim@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"}
        }));
        let via_activity = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/course/a"}
        }));
        let neither = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"}
        }));

        assert!(predicate.matches(&via_agent));
        assert!(predicate.matches(&via_activity));
        assert!(!predicate.matches(&neither));
    }

    #[tokio::test]
    async fn or_group_beside_plain_entry_unions_both() {
        let agents = AgentStore::new();
        let filters = json!({
            "related": [
                {"or": [{"id": "http://example.com/course/a"}]},
                {"id": "http://example.com/course/b"}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let via_group = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/course/a"}
        }));
        let via_plain = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"},
            "context": {
                "contextActivities": {
                    "grouping": [{"id": "http://example.com/course/b"}]
                }
            }
        }));
        let neither = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/other"}
        }));

        assert!(predicate.matches(&via_group));
        assert!(predicate.matches(&via_plain));
        assert!(!predicate.matches(&neither));
    }

    #[tokio::test]
    async fn related_entry_must_be_an_object() {
        let agents = AgentStore::new();
        let filters = json!({"related": ["http://example.com/course/a"]});
        let err = build_predicate(&filters, &agents).await.unwrap_err();
        assert!(matches!(err, FilterError::Malformed { found: "string" }));
    }

    #[tokio::test]
    async fn empty_and_group_does_not_poison_the_level() {
        let agents = AgentStore::new();
        let filters = json!({
            "related": [
                {"and": []},
                {"id": "http://example.com/course/a"}
            ]
        });
        let predicate = build_predicate(&filters, &agents).await.unwrap();

        let related = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
            "object": {"id": "http://example.com/course/a"}
        }));
        assert!(predicate.matches(&related));
    }
}
