//! Compiled filter predicates evaluated against stored statements.

use openlrs_types::{Ifi, StoredStatement};

// ---------------------------------------------------------------------------
// FIELD TESTS
// ---------------------------------------------------------------------------

/// A single comparison against one region of a stored statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTest {
    /// The statement's top-level actor carries this identifier.
    Actor(Ifi),
    /// The statement's verb IRI equals this value.
    Verb(String),
    /// The statement's object is an activity with this IRI.
    ObjectActivity(String),
    /// Any related activity position carries one of these IRIs.
    ///
    /// Related positions are the primary object, the four context activity
    /// slots, and the same five inside an embedded sub-statement.
    RelatedActivity(Vec<String>),
    /// Any related agent position carries this identifier.
    ///
    /// Related positions are actor, object agent, authority, context
    /// instructor and team, and all of those except authority inside an
    /// embedded sub-statement.
    RelatedAgent(Ifi),
}

impl FieldTest {
    /// Evaluate the test against one stored statement.
    #[must_use]
    pub fn matches(&self, statement: &StoredStatement) -> bool {
        match self {
            Self::Actor(ifi) => statement.actor.as_ref() == Some(ifi),
            Self::Verb(iri) => statement.verb_id == *iri,
            Self::ObjectActivity(iri) => statement.object_activity_id() == Some(iri.as_str()),
            Self::RelatedActivity(iris) => statement
                .related_activity_ids()
                .iter()
                .any(|found| iris.iter().any(|wanted| wanted.as_str() == *found)),
            Self::RelatedAgent(ifi) => statement.mentions_agent(ifi),
        }
    }
}

// ---------------------------------------------------------------------------
// PREDICATE TREE
// ---------------------------------------------------------------------------

/// A compiled filter: a boolean combination of field tests.
///
/// [`Predicate::Empty`] is the identity element for both combinators, the
/// same way an absent filter key constrains nothing. The `and`/`or`
/// constructors elide it, so an empty branch never turns into a universal
/// or an impossible match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every statement.
    Empty,
    /// A single field test.
    Leaf(FieldTest),
    /// Every branch must match.
    All(Vec<Predicate>),
    /// At least one branch must match.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Combine two predicates with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Empty, other) => other,
            (this, Self::Empty) => this,
            (Self::All(mut branches), other) => {
                branches.push(other);
                Self::All(branches)
            }
            (this, other) => Self::All(vec![this, other]),
        }
    }

    /// Combine two predicates with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Empty, other) => other,
            (this, Self::Empty) => this,
            (Self::Any(mut branches), other) => {
                branches.push(other);
                Self::Any(branches)
            }
            (this, other) => Self::Any(vec![this, other]),
        }
    }

    /// Evaluate against one stored statement.
    #[must_use]
    pub fn matches(&self, statement: &StoredStatement) -> bool {
        match self {
            Self::Empty => true,
            Self::Leaf(test) => test.matches(statement),
            Self::All(branches) => branches.iter().all(|branch| branch.matches(statement)),
            Self::Any(branches) => branches.iter().any(|branch| branch.matches(statement)),
        }
    }

    /// Whether this predicate places no constraint at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use openlrs_types::{StatementId, StoredStatement};
    use serde_json::json;

    fn stored(document: serde_json::Value) -> StoredStatement {
        let id = StatementId::new();
        let raw = document.to_string();
        StoredStatement::from_document(id, chrono::Utc::now(), &document, raw).unwrap()
    }

    fn completed(actor_mbox: &str, activity: &str) -> StoredStatement {
        stored(json!({
            "actor": {"mbox": actor_mbox},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/completed"},
            "object": {"id": activity}
        }))
    }

    #[test]
    fn empty_is_identity_for_both_combinators() {
        let leaf = Predicate::Leaf(FieldTest::Verb(
            "http://adlnet.gov/expapi/verbs/completed".into(),
        ));

        assert_eq!(Predicate::Empty.and(leaf.clone()), leaf);
        assert_eq!(leaf.clone().and(Predicate::Empty), leaf);
        assert_eq!(Predicate::Empty.or(leaf.clone()), leaf);
        assert_eq!(leaf.clone().or(Predicate::Empty), leaf);
        assert!(Predicate::Empty.and(Predicate::Empty).is_empty());
    }

    #[test]
    fn empty_matches_everything() {
        let statement = completed("mailto:sam@example.com", "http://example.com/course/1");
        assert!(Predicate::Empty.matches(&statement));
    }

    #[test]
    fn and_or_evaluate_over_leaves() {
        let statement = completed("mailto:sam@example.com", "http://example.com/course/1");

        let verb = Predicate::Leaf(FieldTest::Verb(
            "http://adlnet.gov/expapi/verbs/completed".into(),
        ));
        let wrong_verb = Predicate::Leaf(FieldTest::Verb(
            "http://adlnet.gov/expapi/verbs/attempted".into(),
        ));
        let object = Predicate::Leaf(FieldTest::ObjectActivity(
            "http://example.com/course/1".into(),
        ));

        assert!(verb.clone().and(object.clone()).matches(&statement));
        assert!(!wrong_verb.clone().and(object.clone()).matches(&statement));
        assert!(wrong_verb.clone().or(object).matches(&statement));
        assert!(!wrong_verb.or(Predicate::Leaf(FieldTest::ObjectActivity(
            "http://example.com/other".into()
        )))
        .matches(&statement));
    }

    #[test]
    fn related_activity_covers_context_and_substatement_positions() {
        let statement = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/commented"},
            "object": {
                "objectType": "SubStatement",
                "actor": {"mbox": "mailto:kim@example.com"},
                "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
                "object": {"id": "http://example.com/course/inner"},
                "context": {
                    "contextActivities": {
                        "parent": [{"id": "http://example.com/course/parent"}]
                    }
                }
            },
            "context": {
                "contextActivities": {
                    "grouping": [{"id": "http://example.com/programme"}]
                }
            }
        }));

        let hit = |iri: &str| {
            Predicate::Leaf(FieldTest::RelatedActivity(vec![iri.to_owned()])).matches(&statement)
        };

        assert!(hit("http://example.com/course/inner"));
        assert!(hit("http://example.com/course/parent"));
        assert!(hit("http://example.com/programme"));
        assert!(!hit("http://example.com/unrelated"));
    }

    #[test]
    fn related_agent_sees_substatement_actor_but_object_test_does_not() {
        let statement = stored(json!({
            "actor": {"mbox": "mailto:sam@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/commented"},
            "object": {
                "objectType": "SubStatement",
                "actor": {"mbox": "mailto:kim@example.com"},
                "verb": {"id": "http://adlnet.gov/expapi/verbs/attempted"},
                "object": {"id": "http://example.com/course/inner"}
            }
        }));

        let kim = Ifi::Mbox("mailto:kim@example.com".into());
        assert!(Predicate::Leaf(FieldTest::RelatedAgent(kim.clone())).matches(&statement));
        assert!(!Predicate::Leaf(FieldTest::Actor(kim)).matches(&statement));

        let sam = Ifi::Mbox("mailto:sam@example.com".into());
        assert!(Predicate::Leaf(FieldTest::Actor(sam)).matches(&statement));
    }
}
