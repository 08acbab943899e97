//! Integration tests for inline content delivered to a callback

mod common;

use common::*;
use odata_consumer::callback::{CallbackError, OnReadInlineContent, ReadEntryResult, ReadFeedResult};
use odata_consumer::edm::NavigationProperty;
use odata_consumer::{MessageKey, PropertyValue, ReadProperties, SimpleValue, TargetType};
use std::rc::Rc;

fn atom_employee_with_team() -> String {
    let links = [
        atom_nav_link("Employees('1')", "ne_Team", "entry", Some(&atom_team_entry("1", "Team 1"))),
        atom_nav_link("Employees('1')", "ne_Room", "entry", None),
    ];
    atom_employee_with_links(&links.join("\n  "), "")
}

fn json_employee_with_team() -> String {
    json_employee_with(
        &json_deferred("Employees('1')", "ne_Manager"),
        &json_team("1", "Team 1"),
        &json_deferred("Employees('1')", "ne_Room"),
    )
}

fn payloads() -> [(&'static str, String); 2] {
    [(ATOM, atom_employee_with_team()), (JSON, json_employee_with_team())]
}

#[test]
fn test_inline_team_without_callback() {
    for (content_type, payload) in payloads() {
        let entry = read_entry(content_type, "Employees", &payload, ReadProperties::default()).unwrap();
        let team = entry.property("ne_Team").and_then(PropertyValue::as_entry).unwrap();
        assert_eq!(team.properties.len(), 3, "{}", content_type);
        assert!(entry.contains_inline_entry());
    }
}

#[test]
fn test_callback_receives_inline_team() {
    for (content_type, payload) in payloads() {
        let expected = read_entry(content_type, "Employees", &payload, ReadProperties::default())
            .unwrap()
            .property("ne_Team")
            .and_then(PropertyValue::as_entry)
            .cloned()
            .unwrap();

        let accumulator = Rc::new(InlineAccumulator::default());
        let props = ReadProperties::builder().callback(accumulator.clone()).build();
        let entry = read_entry(content_type, "Employees", &payload, props).unwrap();

        assert!(entry.property("ne_Team").is_none(), "{}", content_type);
        assert!(!entry.contains_inline_entry());
        assert!(entry.expand_select_tree.link("ne_Team").is_some());

        let entries = accumulator.entries.borrow();
        assert_eq!(entries.len(), 1);
        assert!(accumulator.feeds.borrow().is_empty());
        let result = &entries[0];
        assert_eq!(result.navigation_property.name, "ne_Team");
        assert_eq!(result.parent_entry_id.as_deref(), entry.metadata.id.as_deref());
        let team = result.entry.as_ref().unwrap();
        assert_eq!(team.properties, expected.properties);
    }
}

#[test]
fn test_callback_receives_inline_feed() {
    let payload = format!(
        r#"{{"__metadata":{{"uri":"{SERVICE_ROOT}Rooms('1')"}},"Id":"1","nr_Employees":{{"results":[{{"EmployeeId":"1"}},{{"EmployeeId":"2"}}]}}}}"#
    );
    let accumulator = Rc::new(InlineAccumulator::default());
    let props = ReadProperties::builder().callback(accumulator.clone()).build();
    let entry = read_entry(JSON, "Rooms", &payload, props).unwrap();

    assert!(entry.property("nr_Employees").is_none());
    let feeds = accumulator.feeds.borrow();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].feed.len(), 2);
    assert_eq!(feeds[0].parent_entry_id.as_deref(), Some(format!("{SERVICE_ROOT}Rooms('1')").as_str()));
}

#[test]
fn test_parent_id_known_when_inline_precedes_id() {
    // the navigation property comes before __metadata in document order
    let payload = format!(
        r#"{{"ne_Team":{},"__metadata":{{"id":"{SERVICE_ROOT}Employees('9')"}},"EmployeeId":"9"}}"#,
        json_team("1", "Team 1")
    );
    let accumulator = Rc::new(InlineAccumulator::default());
    let props = ReadProperties::builder().callback(accumulator.clone()).build();
    read_entry(JSON, "Employees", &payload, props).unwrap();

    let entries = accumulator.entries.borrow();
    assert_eq!(
        entries[0].parent_entry_id.as_deref(),
        Some(format!("{SERVICE_ROOT}Employees('9')").as_str())
    );
}

struct Failing;

impl OnReadInlineContent for Failing {
    fn handle_read_entry(&self, _result: ReadEntryResult) -> Result<(), CallbackError> {
        Err("storage unavailable".into())
    }

    fn handle_read_feed(&self, _result: ReadFeedResult) -> Result<(), CallbackError> {
        Ok(())
    }
}

#[test]
fn test_failing_callback() {
    for (content_type, payload) in payloads() {
        let props = ReadProperties::builder().callback(Rc::new(Failing)).build();
        let err = read_entry(content_type, "Employees", &payload, props).unwrap_err();
        assert_eq!(err.key(), MessageKey::CallbackFailed);
        assert_eq!(err.content(), ["ne_Team"]);
        assert_eq!(err.cause().map(|cause| cause.to_string()).as_deref(), Some("storage unavailable"));
    }
}

/// Widens room seat counts for content below `ne_Room`
#[derive(Default)]
struct SeatWidening {
    inner: InlineAccumulator,
}

impl OnReadInlineContent for SeatWidening {
    fn receive_read_properties(
        &self,
        read_properties: &ReadProperties,
        navigation_property: &NavigationProperty,
    ) -> Result<ReadProperties, CallbackError> {
        let mut builder = ReadProperties::builder()
            .merge_semantic(read_properties.is_merge())
            .validate_facets(read_properties.validate_facets());
        if navigation_property.name == "ne_Room" {
            builder = builder.type_mapping("Seats", TargetType::I64);
        }
        Ok(builder.build())
    }

    fn handle_read_entry(&self, result: ReadEntryResult) -> Result<(), CallbackError> {
        self.inner.handle_read_entry(result)
    }

    fn handle_read_feed(&self, result: ReadFeedResult) -> Result<(), CallbackError> {
        self.inner.handle_read_feed(result)
    }
}

#[test]
fn test_callback_supplies_child_read_properties() {
    let links = atom_nav_link("Employees('1')", "ne_Room", "entry", Some(&atom_room_entry("1", 66)));
    let payload = atom_employee_with_links(&links, "");

    let callback = Rc::new(SeatWidening::default());
    let props = ReadProperties::builder().callback(callback.clone()).build();
    let entry = read_entry(ATOM, "Employees", &payload, props).unwrap();

    // the returned properties carry no callback, so the room stays materialized
    assert!(entry.property("ne_Room").is_none());
    let entries = callback.inner.entries.borrow();
    let room = entries[0].entry.as_ref().unwrap();
    assert_eq!(room.property("Seats"), Some(&PropertyValue::Simple(SimpleValue::Int64(66))));
    assert!(entries[0].read_properties.callback().is_none());
}
