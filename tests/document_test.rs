//! Integration tests for document assembly.

use jsonapi_response::{
    assemble, assemble_collection, ConfigurationError, Field, JsonApiResource, Link, Method,
    Relationship, ResourceDescriptor, SerializationError,
};
use serde_json::{json, Value};

struct SimplePojo {
    id: String,
    another_attribute: String,
    yet_another: i32,
}

impl SimplePojo {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            another_attribute: "something".to_string(),
            yet_another: 42,
        }
    }
}

impl JsonApiResource for SimplePojo {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("simple")
            .field(Field::public("id", |s: &SimplePojo| json!(s.id)).id())
            .field(Field::public("anotherAttribute", |s: &SimplePojo| {
                json!(s.another_attribute)
            }))
            .field(Field::public("yetAnother", |s: &SimplePojo| json!(s.yet_another)))
    }
}

struct SelfLinkPojo;

impl JsonApiResource for SelfLinkPojo {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("selflinker")
            .location("http://www.example.com/repository")
            .field(Field::private("id", |_: &SelfLinkPojo| json!("id")).id())
    }
}

struct GetterObject {
    string_attr: String,
}

impl JsonApiResource for GetterObject {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("GetterObject")
            .field(Field::private("id", |_: &GetterObject| json!("idValue")).id())
            .field(Field::private("stringAttr", |g: &GetterObject| json!(g.string_attr)))
            .field(Field::public("doubleAttr", |_: &GetterObject| json!(11)))
            .method(
                Method::private("methodName", |g: &GetterObject| json!(g.string_attr))
                    .rename("name"),
            )
            .method(Method::public("getNumber", |_: &GetterObject| json!(12)))
            .method(Method::private("getAnotherNumber", |_: &GetterObject| json!(13)))
            .method(Method::public("getStringAttr", |g: &GetterObject| {
                json!(g.string_attr)
            }))
            .method(Method::public("getDoubleAttr", |_: &GetterObject| json!(13)))
    }
}

struct Headline {
    title: String,
}

impl JsonApiResource for Headline {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("headline")
            .field(Field::private("id", |_: &Headline| json!("h")).id())
            .method(Method::public("getTitle", |_: &Headline| json!("from getter")))
            .method(Method::public("getSummary", |_: &Headline| json!("from getter")))
            .method(Method::private("headline", |h: &Headline| json!(h.title)).rename("title"))
            .field(Field::public("summary", |_: &Headline| json!("from field")))
            .field(Field::private("raw", |h: &Headline| json!(h.title)).rename("summary"))
    }
}

struct LinkObject;

impl JsonApiResource for LinkObject {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("linkObject")
            .location("linkLocation")
            .field(Field::private("id", |_: &LinkObject| json!("42")).id())
            .link(Link::new("other", "otherLocation").rename("other"))
            .link(Link::new("unnamed", "unnamedLocation"))
    }
}

struct RelationshipObject {
    related: SimplePojo,
    comments: Vec<SimplePojo>,
}

impl JsonApiResource for RelationshipObject {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("relationship")
            .field(Field::private("id", |_: &RelationshipObject| json!("relationship")).id())
            .relationship(Relationship::to_one("related", |r: &RelationshipObject| {
                &r.related
            }))
            .relationship(Relationship::to_many("comments", |r: &RelationshipObject| {
                r.comments.as_slice()
            }))
            .relationship(Relationship::external("history", "relationship/history"))
    }
}

struct Unregistered;

impl JsonApiResource for Unregistered {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource.field(Field::public("value", |_: &Unregistered| json!(1)))
    }
}

struct PointsAtUnregistered {
    target: Unregistered,
}

impl JsonApiResource for PointsAtUnregistered {
    fn describe(resource: ResourceDescriptor<Self>) -> ResourceDescriptor<Self> {
        resource
            .resource_type("pointer")
            .field(Field::private("id", |_: &PointsAtUnregistered| json!("p")).id())
            .relationship(Relationship::to_one("target", |p: &PointsAtUnregistered| {
                &p.target
            }))
    }
}

fn to_value<T: JsonApiResource>(entity: &T) -> Value {
    assemble(entity).unwrap().to_value().unwrap()
}

// === Single Resource Tests ===

mod single_resource {
    use super::*;

    #[test]
    fn simple_pojo() {
        let result = to_value(&SimplePojo::new("id"));

        assert!(result.is_object());
        assert_eq!(result["data"]["type"], json!("simple"));
        assert_eq!(result["data"]["id"], json!("id"));
        let attributes = result["data"]["attributes"].as_object().unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["anotherAttribute"], json!("something"));
        assert_eq!(attributes["yetAnother"], json!(42));
    }

    #[test]
    fn id_is_never_an_attribute() {
        let result = to_value(&SimplePojo::new("id"));
        assert!(result["data"]["attributes"].get("id").is_none());
    }

    #[test]
    fn methods_and_fields() {
        let result = to_value(&GetterObject {
            string_attr: "stringVal".into(),
        });

        let data = &result["data"];
        assert_eq!(data["id"], json!("idValue"));
        let attributes = data["attributes"].as_object().unwrap();
        assert_eq!(attributes.len(), 4);
        assert_eq!(attributes["number"], json!(12));
        assert_eq!(attributes["name"], json!("stringVal"));
        assert_eq!(attributes["stringAttr"], json!("stringVal"));
        // The public field wins over the getter of the same name.
        assert_eq!(attributes["doubleAttr"], json!(11));
    }

    #[test]
    fn explicit_names_beat_implicit_ones() {
        let result = to_value(&Headline {
            title: "Breaking".into(),
        });

        let attributes = result["data"]["attributes"].as_object().unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["title"], json!("Breaking"));
        assert_eq!(attributes["summary"], json!("Breaking"));
        let names: Vec<&str> = attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["summary", "title"]);
    }

    #[test]
    fn self_link_from_location() {
        let result = to_value(&SelfLinkPojo);
        let data = result["data"].as_object().unwrap();

        assert_eq!(data["links"]["self"], json!("http://www.example.com/repository/id"));
        assert_eq!(result.as_object().unwrap().len(), 1);
    }

    #[test]
    fn static_links() {
        let result = to_value(&LinkObject);
        let links = result["data"]["links"].as_object().unwrap();

        assert_eq!(links.len(), 3);
        assert_eq!(links["self"], json!("linkLocation/42"));
        assert_eq!(links["other"], json!("otherLocation"));
        assert_eq!(links["unnamed"], json!("unnamedLocation"));
    }

    #[test]
    fn serializing_twice_is_identical() {
        let entity = GetterObject {
            string_attr: "stringVal".into(),
        };
        let first = serde_json::to_string(&assemble(&entity).unwrap()).unwrap();
        let second = serde_json::to_string(&assemble(&entity).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

// === Collection Tests ===

mod collections {
    use super::*;

    #[test]
    fn collection() {
        let entities = [
            SimplePojo::new("1"),
            SimplePojo::new("2"),
            SimplePojo::new("3"),
        ];
        let result = assemble_collection(&entities).unwrap().to_value().unwrap();
        let data = result["data"].as_array().unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["id"], json!("1"));
        assert_eq!(data[1]["id"], json!("2"));
        assert_eq!(data[2]["id"], json!("3"));
        assert_eq!(data[0]["type"], json!("simple"));
        assert_eq!(data[1]["attributes"].as_object().unwrap().len(), 2);
        assert_eq!(data[2]["attributes"]["anotherAttribute"], json!("something"));
    }

    #[test]
    fn empty_collection() {
        let entities: Vec<SimplePojo> = Vec::new();
        let result = assemble_collection(&entities).unwrap().to_value().unwrap();

        assert_eq!(result["data"], json!([]));
        assert!(result.get("links").is_none());
    }

    #[test]
    fn every_element_links_to_itself() {
        let result = assemble_collection(&[LinkObject, LinkObject])
            .unwrap()
            .to_value()
            .unwrap();

        assert_eq!(result["links"]["self"], json!("linkLocation"));
        for element in result["data"].as_array().unwrap() {
            assert_eq!(element["links"]["self"], json!("linkLocation/42"));
        }
    }
}

// === Relationship Tests ===

mod relationships {
    use super::*;

    fn relationship_object() -> RelationshipObject {
        RelationshipObject {
            related: SimplePojo::new("relatedObject"),
            comments: vec![SimplePojo::new("c1"), SimplePojo::new("c2")],
        }
    }

    #[test]
    fn to_one() {
        let result = to_value(&relationship_object());
        assert_eq!(
            result["data"]["relationships"]["related"],
            json!({ "data": { "id": "relatedObject", "type": "simple" } })
        );
    }

    #[test]
    fn to_many() {
        let result = to_value(&relationship_object());
        let data = result["data"]["relationships"]["comments"]["data"]
            .as_array()
            .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1], json!({ "id": "c2", "type": "simple" }));
    }

    #[test]
    fn external_location() {
        let result = to_value(&relationship_object());
        let history = &result["data"]["relationships"]["history"];
        assert_eq!(history["links"]["self"], json!("relationship/history"));
        assert!(history.get("data").is_none());
    }

    #[test]
    fn declaration_order_preserved() {
        let result = to_value(&relationship_object());
        let names: Vec<&str> = result["data"]["relationships"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, ["related", "comments", "history"]);
    }

    #[test]
    fn relationships_are_not_attributes() {
        let result = to_value(&relationship_object());
        assert_eq!(result["data"]["attributes"], json!({}));
    }
}

// === Error Handling Tests ===

mod error_handling {
    use super::*;

    #[test]
    fn missing_type() {
        let result = assemble(&Unregistered);
        assert!(matches!(
            result,
            Err(SerializationError::Configuration(
                ConfigurationError::MissingType { .. }
            ))
        ));
    }

    #[test]
    fn relationship_target_without_metadata() {
        let result = assemble(&PointsAtUnregistered {
            target: Unregistered,
        });
        match result {
            Err(SerializationError::Relationship { class, name, source }) => {
                assert!(class.ends_with("PointsAtUnregistered"));
                assert_eq!(name, "target");
                assert!(matches!(source, ConfigurationError::MissingType { .. }));
            }
            other => panic!("expected relationship error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn error_names_the_type() {
        let error = assemble(&Unregistered).unwrap_err();
        assert!(error.to_string().contains("Unregistered"));
    }
}
