//! Shared test utilities for odata-consumer integration tests.
//!
//! Holds the reference scenario model (employees, managers, teams, rooms and
//! buildings), payload builders for both formats and an accumulating inline
//! callback, so every test crate imports them via `mod common;`.

#![allow(dead_code)]

use odata_consumer::callback::{CallbackError, OnReadInlineContent, ReadEntryResult, ReadFeedResult};
use odata_consumer::edm::{
    navigation, Edm, EdmSimpleTypeKind, Facets, FeedMappingTarget, FullQualifiedName,
    FunctionImport, Multiplicity, Property, PropertyType, ReturnType, SyndicationTarget,
};
use odata_consumer::{Entry, EntityReader, ReadProperties, Result};
use std::cell::RefCell;

pub const ATOM: &str = "application/atom+xml";
pub const JSON: &str = "application/json";
pub const SERVICE_ROOT: &str = "http://localhost:8080/ReferenceScenario.svc/";

const NAMESPACE: &str = "RefScenario";

pub fn fqn(name: &str) -> FullQualifiedName {
    FullQualifiedName::new(NAMESPACE, name)
}

// ===========================================================================
// Reference scenario model
// ===========================================================================

fn string(name: &str) -> Property {
    Property::simple(name, EdmSimpleTypeKind::String)
}

/// The reference scenario EDM
///
/// Employee is a media-link entry type whose `EmployeeName` is mapped to the
/// Atom title and not kept in the content. Manager derives from Employee.
pub fn ref_scenario() -> Edm {
    let employee_properties = vec![
        string("EmployeeId").with_facets(Facets::not_nullable()),
        string("EmployeeName")
            .with_mapping(FeedMappingTarget::Syndication(SyndicationTarget::Title), false),
        string("ManagerId"),
        string("RoomId"),
        string("TeamId").with_facets(Facets::default().with_max_length(2)),
        Property::complex("Location", fqn("c_Location")),
        Property::simple("Age", EdmSimpleTypeKind::Int32),
        Property::simple("EntryDate", EdmSimpleTypeKind::DateTime),
        string("ImageUrl"),
    ];

    Edm::builder()
        .complex_type(
            fqn("c_City"),
            None,
            vec![string("PostalCode"), string("CityName")],
        )
        .complex_type(
            fqn("c_Location"),
            None,
            vec![Property::complex("City", fqn("c_City")), string("Country")],
        )
        .media_entity_type(
            fqn("Employee"),
            None,
            &["EmployeeId"],
            employee_properties,
            vec![
                navigation("ne_Manager", fqn("ManagerEmployees"), "r_Employees", "r_Manager"),
                navigation("ne_Team", fqn("TeamEmployees"), "r_Employees", "r_Team"),
                navigation("ne_Room", fqn("RoomEmployees"), "r_Employees", "r_Room"),
            ],
        )
        .entity_type(
            fqn("Manager"),
            Some(fqn("Employee")),
            &[],
            vec![],
            vec![navigation("nm_Employees", fqn("ManagerEmployees"), "r_Manager", "r_Employees")],
        )
        .entity_type(
            fqn("Team"),
            None,
            &["Id"],
            vec![
                string("Id").with_facets(Facets::not_nullable()),
                string("Name"),
                Property::simple("isScrumTeam", EdmSimpleTypeKind::Boolean),
            ],
            vec![navigation("nt_Employees", fqn("TeamEmployees"), "r_Team", "r_Employees")],
        )
        .entity_type(
            fqn("Room"),
            None,
            &["Id"],
            vec![
                string("Id").with_facets(Facets::not_nullable()),
                string("Name"),
                Property::simple("Seats", EdmSimpleTypeKind::Int16),
                Property::simple("Version", EdmSimpleTypeKind::Int16),
            ],
            vec![
                navigation("nr_Employees", fqn("RoomEmployees"), "r_Room", "r_Employees"),
                navigation("nr_Building", fqn("BuildingRooms"), "r_Rooms", "r_Building"),
            ],
        )
        .entity_type(
            fqn("Building"),
            None,
            &["Id"],
            vec![
                string("Id").with_facets(Facets::not_nullable()),
                string("Name"),
                Property::simple("Image", EdmSimpleTypeKind::Binary),
            ],
            vec![navigation("nb_Rooms", fqn("BuildingRooms"), "r_Building", "r_Rooms")],
        )
        .association(
            fqn("ManagerEmployees"),
            ("r_Manager", fqn("Manager"), Multiplicity::One),
            ("r_Employees", fqn("Employee"), Multiplicity::Many),
        )
        .association(
            fqn("TeamEmployees"),
            ("r_Team", fqn("Team"), Multiplicity::One),
            ("r_Employees", fqn("Employee"), Multiplicity::Many),
        )
        .association(
            fqn("RoomEmployees"),
            ("r_Room", fqn("Room"), Multiplicity::One),
            ("r_Employees", fqn("Employee"), Multiplicity::Many),
        )
        .association(
            fqn("BuildingRooms"),
            ("r_Building", fqn("Building"), Multiplicity::One),
            ("r_Rooms", fqn("Room"), Multiplicity::Many),
        )
        .entity_set("Employees", fqn("Employee"))
        .entity_set("Managers", fqn("Manager"))
        .entity_set("Teams", fqn("Team"))
        .entity_set("Rooms", fqn("Room"))
        .entity_set("Buildings", fqn("Building"))
        .association_set(
            "ManagerEmployees",
            fqn("ManagerEmployees"),
            ("r_Manager", "Managers"),
            ("r_Employees", "Employees"),
        )
        .association_set(
            "TeamEmployees",
            fqn("TeamEmployees"),
            ("r_Team", "Teams"),
            ("r_Employees", "Employees"),
        )
        .association_set(
            "RoomEmployees",
            fqn("RoomEmployees"),
            ("r_Room", "Rooms"),
            ("r_Employees", "Employees"),
        )
        .association_set(
            "BuildingRooms",
            fqn("BuildingRooms"),
            ("r_Building", "Buildings"),
            ("r_Rooms", "Rooms"),
        )
        .function_import(FunctionImport {
            name: "AllLocations".to_string(),
            return_type: ReturnType::Property(PropertyType::Complex(fqn("c_Location"))),
            multiplicity: Multiplicity::Many,
            entity_set: None,
        })
        .function_import(FunctionImport {
            name: "AllUsedRoomIds".to_string(),
            return_type: ReturnType::Property(PropertyType::Simple(EdmSimpleTypeKind::String)),
            multiplicity: Multiplicity::Many,
            entity_set: None,
        })
        .function_import(FunctionImport {
            name: "MaximalAge".to_string(),
            return_type: ReturnType::Property(PropertyType::Simple(EdmSimpleTypeKind::Int16)),
            multiplicity: Multiplicity::One,
            entity_set: None,
        })
        .function_import(FunctionImport {
            name: "EmployeeSearch".to_string(),
            return_type: ReturnType::Entity(fqn("Employee")),
            multiplicity: Multiplicity::Many,
            entity_set: Some("Employees".to_string()),
        })
        .build()
}

// ===========================================================================
// Read helpers
// ===========================================================================

pub fn read_entry(content_type: &str, entity_set: &str, payload: &str, props: ReadProperties) -> Result<Entry> {
    let edm = ref_scenario();
    EntityReader::new(&edm, content_type)?
        .with_properties(props)
        .read_entry(entity_set, payload.as_bytes())
}

pub fn read_atom_entry(entity_set: &str, payload: &str) -> Result<Entry> {
    read_entry(ATOM, entity_set, payload, ReadProperties::default())
}

pub fn read_json_entry(entity_set: &str, payload: &str) -> Result<Entry> {
    read_entry(JSON, entity_set, payload, ReadProperties::default())
}

// ===========================================================================
// Atom payloads
// ===========================================================================

pub const ATOM_NAMESPACES: &str = r#"xmlns="http://www.w3.org/2005/Atom" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices""#;

const RELATED: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/related/";

/// `atom:link` of a navigation property, optionally with inline content
///
/// `inline` is the complete content of `m:inline`; `Some("")` yields an empty
/// inline wrapper.
pub fn atom_nav_link(owner: &str, name: &str, kind: &str, inline: Option<&str>) -> String {
    let open = format!(
        r#"<link href="{owner}/{name}" rel="{RELATED}{name}" type="application/atom+xml;type={kind}" title="{name}""#
    );
    match inline {
        None => format!("{open}/>"),
        Some(content) => format!("{open}><m:inline>{content}</m:inline></link>"),
    }
}

/// Employee 1 as a media-link entry; `links` are added after the edit links
pub fn atom_employee_with_links(links: &str, properties_extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry {ATOM_NAMESPACES} xml:base="{SERVICE_ROOT}" m:etag="W/&quot;1&quot;">
  <id>{SERVICE_ROOT}Employees('1')</id>
  <title type="text">Walter Winter</title>
  <updated>1999-01-01T00:00:00Z</updated>
  <category term="RefScenario.Employee" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
  <link href="Employees('1')" rel="edit" title="Employee"/>
  <link href="Employees('1')/$value" rel="edit-media" type="image/jpeg" m:etag="W/&quot;1&quot;"/>
  {links}
  <content type="image/jpeg" src="Employees('1')/$value"/>
  <m:properties>
    <d:EmployeeId>1</d:EmployeeId>
    <d:ManagerId>1</d:ManagerId>
    <d:RoomId>1</d:RoomId>
    <d:TeamId>1</d:TeamId>
    <d:Location m:type="RefScenario.c_Location">
      <d:City m:type="RefScenario.c_City">
        <d:PostalCode>69124</d:PostalCode>
        <d:CityName>Heidelberg</d:CityName>
      </d:City>
      <d:Country>Germany</d:Country>
    </d:Location>
    <d:Age>52</d:Age>
    <d:EntryDate>1999-01-01T00:00:00</d:EntryDate>
    <d:ImageUrl>Employees('1')/$value</d:ImageUrl>
    {properties_extra}
  </m:properties>
</entry>"#
    )
}

/// Employee 1 with deferred navigation links only
pub fn atom_employee() -> String {
    atom_employee_with_links(
        &[
            atom_nav_link("Employees('1')", "ne_Manager", "entry", None),
            atom_nav_link("Employees('1')", "ne_Team", "entry", None),
            atom_nav_link("Employees('1')", "ne_Room", "entry", None),
        ]
        .join("\n  "),
        "",
    )
}

/// Room entry without namespace declarations, for use inside `m:inline`
pub fn atom_room_entry(id: &str, seats: i16) -> String {
    format!(
        r#"<entry m:etag="W/&quot;1&quot;">
      <id>{SERVICE_ROOT}Rooms('{id}')</id>
      <title type="text">Room {id}</title>
      <updated>2012-01-01T00:00:00Z</updated>
      <category term="RefScenario.Room" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
      <link href="Rooms('{id}')" rel="edit" title="Room"/>
      {employees}
      <content type="application/xml">
        <m:properties>
          <d:Id>{id}</d:Id>
          <d:Name>Room {id}</d:Name>
          <d:Seats>{seats}</d:Seats>
          <d:Version>1</d:Version>
        </m:properties>
      </content>
    </entry>"#,
        employees = atom_nav_link(&format!("Rooms('{id}')"), "nr_Employees", "feed", None),
    )
}

/// Team entry without namespace declarations, for use inside `m:inline`
pub fn atom_team_entry(id: &str, name: &str) -> String {
    format!(
        r#"<entry>
      <id>{SERVICE_ROOT}Teams('{id}')</id>
      <title type="text">{name}</title>
      <updated>2012-01-01T00:00:00Z</updated>
      <category term="RefScenario.Team" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
      <link href="Teams('{id}')" rel="edit" title="Team"/>
      <content type="application/xml">
        <m:properties>
          <d:Id>{id}</d:Id>
          <d:Name>{name}</d:Name>
          <d:isScrumTeam>false</d:isScrumTeam>
        </m:properties>
      </content>
    </entry>"#
    )
}

/// Rooms feed with the given entries, `m:count` and extra feed children
pub fn atom_rooms_feed(entries: &[String], extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed {ATOM_NAMESPACES} xmlns:at="http://purl.org/atompub/tombstones/1.0" xml:base="{SERVICE_ROOT}">
  <id>{SERVICE_ROOT}Rooms</id>
  <title type="text">Rooms</title>
  <updated>2012-01-01T00:00:00Z</updated>
  <link href="Rooms" rel="self" title="Rooms"/>
  {extra}
  {entries}
</feed>"#,
        entries = entries.join("\n  "),
    )
}

// ===========================================================================
// JSON payloads
// ===========================================================================

pub fn json_deferred(owner: &str, name: &str) -> String {
    format!(r#"{{"__deferred":{{"uri":"{SERVICE_ROOT}{owner}/{name}"}}}}"#)
}

/// Employee 1 with the navigation members supplied by the caller
pub fn json_employee_with(ne_manager: &str, ne_team: &str, ne_room: &str) -> String {
    format!(
        r#"{{"d":{{"__metadata":{{"id":"{SERVICE_ROOT}Employees('1')","uri":"{SERVICE_ROOT}Employees('1')","type":"RefScenario.Employee","content_type":"image/jpeg","media_src":"Employees('1')/$value","edit_media":"{SERVICE_ROOT}Employees('1')/$value"}},
"EmployeeId":"1","EmployeeName":"Walter Winter","ManagerId":"1","RoomId":"1","TeamId":"1",
"Location":{{"__metadata":{{"type":"RefScenario.c_Location"}},"City":{{"__metadata":{{"type":"RefScenario.c_City"}},"PostalCode":"69124","CityName":"Heidelberg"}},"Country":"Germany"}},
"Age":52,"EntryDate":"\/Date(915148800000)\/","ImageUrl":"Employees('1')/$value",
"ne_Manager":{ne_manager},"ne_Team":{ne_team},"ne_Room":{ne_room}}}}}"#
    )
}

/// Employee 1 with deferred navigation properties
pub fn json_employee() -> String {
    json_employee_with(
        &json_deferred("Employees('1')", "ne_Manager"),
        &json_deferred("Employees('1')", "ne_Team"),
        &json_deferred("Employees('1')", "ne_Room"),
    )
}

pub fn json_room(id: &str, seats: i16) -> String {
    format!(
        r#"{{"__metadata":{{"id":"{SERVICE_ROOT}Rooms('{id}')","uri":"{SERVICE_ROOT}Rooms('{id}')","type":"RefScenario.Room","etag":"W/\"1\""}},"Id":"{id}","Name":"Room {id}","Seats":{seats},"Version":1,"nr_Employees":{employees}}}"#,
        employees = json_deferred(&format!("Rooms('{id}')"), "nr_Employees"),
    )
}

pub fn json_team(id: &str, name: &str) -> String {
    format!(
        r#"{{"__metadata":{{"uri":"{SERVICE_ROOT}Teams('{id}')","type":"RefScenario.Team"}},"Id":"{id}","Name":"{name}","isScrumTeam":false}}"#
    )
}

// ===========================================================================
// Inline callback
// ===========================================================================

/// Callback that keeps every inline result it is handed
#[derive(Default)]
pub struct InlineAccumulator {
    pub entries: RefCell<Vec<ReadEntryResult>>,
    pub feeds: RefCell<Vec<ReadFeedResult>>,
}

impl OnReadInlineContent for InlineAccumulator {
    fn handle_read_entry(&self, result: ReadEntryResult) -> std::result::Result<(), CallbackError> {
        self.entries.borrow_mut().push(result);
        Ok(())
    }

    fn handle_read_feed(&self, result: ReadFeedResult) -> std::result::Result<(), CallbackError> {
        self.feeds.borrow_mut().push(result);
        Ok(())
    }
}
