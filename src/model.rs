//! Typed records for upstream responses and derived projection types
//!
//! Each upstream endpoint gets an explicit record declaring the fields
//! this crate consumes; anything else in the payload is ignored, and a
//! missing or mistyped consumed field fails the deserialization instead
//! of propagating untyped data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET login` response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `GET url` response: the per-school server endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerUrlResponse {
    pub server: String,
}

/// `GET schoolCode` response. `school_code` is the provider's canonical
/// code, which may differ from the human-facing one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchoolInfo {
    #[serde(rename = "schoolCode")]
    pub school_code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET basicProgrammeAll` item. `year` is the programme length in years.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Programme {
    pub id: String,
    pub name: String,
    pub year: String,
}

/// `GET branchAllForProgrmmeYear` item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub id: String,
    pub name: String,
}

/// `GET groupAllForBranch` item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

/// Name reference inside a lecture (group, lecturer or room)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub name: String,
}

impl NamedRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// `GET scheduleByGroups` item. Read-only: lectures are never mutated,
/// only filtered and projected. Start/end are the provider's local
/// ISO timestamps, passed through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lecture {
    pub id: i64,
    #[serde(default)]
    pub course: String,
    #[serde(rename = "executionType", default)]
    pub execution_type: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub groups: Vec<NamedRef>,
    #[serde(default)]
    pub lecturers: Vec<NamedRef>,
    #[serde(default)]
    pub rooms: Vec<NamedRef>,
}

/// Group annotated with the branch it was resolved from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupWithBranch {
    pub id: String,
    pub name: String,
    pub branch_id: String,
}

/// Distinct group names per course, each list sorted for display
pub type CourseGroups = BTreeMap<String, Vec<String>>;

/// A user's group selection per course. An absent course means "no
/// constraint recorded"; how that reads is decided per call site, see
/// `schedule::UnselectedCoursePolicy`.
pub type SelectedGroups = BTreeMap<String, Vec<String>>;

/// Calendar-ready projection of a lecture. Serializes to the camelCase
/// JSON shape the calendar widget consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub background_color: String,
    pub border_color: String,
    pub text_color: String,
    pub extended_props: EventDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub course: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persons: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Resolved school prerequisite. Every downstream resolver call uses
/// the canonical `school_code` and `server_url` from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolContext {
    pub human_code: String,
    pub server_url: String,
    pub school_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_school_info_maps_camel_case_school_code() {
        let info: SchoolInfo =
            serde_json::from_value(json!({"schoolCode": "179", "name": "FERI"})).unwrap();
        assert_eq!(info.school_code, "179");
        assert_eq!(info.name.as_deref(), Some("FERI"));
    }

    #[test]
    fn test_school_info_tolerates_extra_fields() {
        let info: SchoolInfo = serde_json::from_value(
            json!({"schoolCode": "179", "firstDayOfWeek": 1, "color": "#fff"}),
        )
        .unwrap();
        assert_eq!(info.school_code, "179");
        assert_eq!(info.name, None);
    }

    #[test]
    fn test_school_info_rejects_missing_school_code() {
        let result = serde_json::from_value::<SchoolInfo>(json!({"name": "FERI"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_lecture_deserializes_upstream_shape() {
        let lecture: Lecture = serde_json::from_value(json!({
            "id": 8123,
            "course": "Programiranje I",
            "executionType": "LV",
            "start_time": "2025-10-06T08:00:00",
            "end_time": "2025-10-06T10:00:00",
            "groups": [{"name": "RV 1", "id": 10}],
            "lecturers": [{"name": "A. Novak"}],
            "rooms": [{"name": "G2-P1"}]
        }))
        .unwrap();

        assert_eq!(lecture.id, 8123);
        assert_eq!(lecture.execution_type, "LV");
        assert_eq!(lecture.groups, vec![NamedRef::new("RV 1")]);
    }

    #[test]
    fn test_lecture_defaults_missing_collections_to_empty() {
        let lecture: Lecture = serde_json::from_value(json!({
            "id": 1,
            "start_time": "2025-10-06T08:00:00",
            "end_time": "2025-10-06T10:00:00"
        }))
        .unwrap();

        assert!(lecture.course.is_empty());
        assert!(lecture.groups.is_empty());
        assert!(lecture.lecturers.is_empty());
        assert!(lecture.rooms.is_empty());
    }

    #[test]
    fn test_calendar_event_serializes_camel_case() {
        let event = CalendarEvent {
            id: "1-RV 1-G2-P1-0".into(),
            title: "Programiranje I".into(),
            start: "2025-10-06T08:00:00".into(),
            end: "2025-10-06T10:00:00".into(),
            background_color: "hsl(120, 65%, 50%)".into(),
            border_color: "hsl(120, 65%, 50%)".into(),
            text_color: "#ffffff".into(),
            extended_props: EventDetails {
                course: "Programiranje I".into(),
                kind: "LV".into(),
                group: "RV 1".into(),
                persons: None,
                location: Some("G2-P1".into()),
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["backgroundColor"], "hsl(120, 65%, 50%)");
        assert_eq!(value["extendedProps"]["type"], "LV");
        assert_eq!(value["extendedProps"]["location"], "G2-P1");
        // absent optionals are omitted, not null
        assert!(value["extendedProps"].get("persons").is_none());
    }
}
