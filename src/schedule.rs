//! Pure filtering and projection over resolved lectures
//!
//! No I/O and no async here: these functions are shared by the
//! server-rendered pages and the JSON handlers, both of which feed them
//! data obtained from the resolver.

use std::collections::BTreeSet;

use crate::model::{
    CalendarEvent, CourseGroups, EventDetails, GroupWithBranch, Lecture, NamedRef, SelectedGroups,
};

/// Saturation of generated event colors, in percent
const EVENT_SATURATION: u32 = 65;
/// Lightness of generated event colors, in percent
const EVENT_LIGHTNESS: u32 = 50;
/// Below this lightness the event text renders white
const LIGHT_TEXT_THRESHOLD: u32 = 60;

/// How `filter_lectures_by_groups` treats a course that is absent from
/// the selection. Both conventions are in real use: a first visit wants
/// everything shown, a calendar export wants nothing until chosen.
/// Callers pick per endpoint; there is no global default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnselectedCoursePolicy {
    /// A course absent from the selection keeps all of its lectures
    IncludeAll,
    /// A course absent from the selection loses all of its lectures
    ExcludeAll,
}

/// Map each course to the distinct group names it references, keeping
/// only names present in `allowed_groups`. Lectures without a course
/// name are skipped; every group list comes back sorted (case-sensitive
/// lexical order) for deterministic display.
pub fn build_course_group_mapping(
    lectures: &[Lecture],
    allowed_groups: &[GroupWithBranch],
) -> CourseGroups {
    let allowed: BTreeSet<&str> = allowed_groups.iter().map(|g| g.name.as_str()).collect();

    let mut mapping = CourseGroups::new();
    for lecture in lectures {
        if lecture.course.is_empty() {
            continue;
        }
        let entry = mapping.entry(lecture.course.clone()).or_default();
        for group in &lecture.groups {
            if allowed.contains(group.name.as_str()) && !entry.contains(&group.name) {
                entry.push(group.name.clone());
            }
        }
    }

    for groups in mapping.values_mut() {
        groups.sort();
    }
    mapping
}

/// Keep the lectures matching the user's per-course group selection.
/// A course present with an empty list drops all of its lectures; one
/// present with names keeps a lecture iff at least one of its groups is
/// selected; an absent course falls to `policy`.
pub fn filter_lectures_by_groups(
    lectures: &[Lecture],
    selection: &SelectedGroups,
    policy: UnselectedCoursePolicy,
) -> Vec<Lecture> {
    if selection.is_empty() && policy == UnselectedCoursePolicy::IncludeAll {
        return lectures.to_vec();
    }

    lectures
        .iter()
        .filter(|lecture| match selection.get(&lecture.course) {
            None => policy == UnselectedCoursePolicy::IncludeAll,
            Some(groups) if groups.is_empty() => false,
            Some(groups) => lecture
                .groups
                .iter()
                .any(|group| groups.contains(&group.name)),
        })
        .cloned()
        .collect()
}

/// Deterministic color for a course name: the same name always yields
/// the same hue within a run (and across runs, the hash has no seed).
pub fn course_color(name: &str) -> String {
    let hue = course_hash(name).unsigned_abs() % 360;
    format!("hsl({hue}, {EVENT_SATURATION}%, {EVENT_LIGHTNESS}%)")
}

// 32-bit accumulator over UTF-16 code units, kept bit-compatible with
// the web client so server- and client-rendered views agree on colors.
fn course_hash(name: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    hash
}

fn text_color_for(lightness: u32) -> &'static str {
    if lightness < LIGHT_TEXT_THRESHOLD {
        "#ffffff"
    } else {
        "#000000"
    }
}

fn join_names(refs: &[NamedRef]) -> String {
    refs.iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Project lectures into calendar events. Event ids combine the lecture
/// id with group names, room names and the ordinal position, so several
/// sections sharing a time slot never collide.
pub fn convert_lectures_to_events(lectures: &[Lecture]) -> Vec<CalendarEvent> {
    lectures
        .iter()
        .enumerate()
        .map(|(index, lecture)| {
            let group_names = join_names(&lecture.groups);
            let lecturer_names = join_names(&lecture.lecturers);
            let room_names = join_names(&lecture.rooms);

            let background_color = course_color(&lecture.course);
            let id = format!("{}-{}-{}-{}", lecture.id, group_names, room_names, index);

            CalendarEvent {
                id,
                title: lecture.course.clone(),
                start: lecture.start_time.clone(),
                end: lecture.end_time.clone(),
                border_color: background_color.clone(),
                text_color: text_color_for(EVENT_LIGHTNESS).to_string(),
                background_color,
                extended_props: EventDetails {
                    course: lecture.course.clone(),
                    kind: lecture.execution_type.clone(),
                    group: group_names,
                    persons: (!lecturer_names.is_empty()).then_some(lecturer_names),
                    location: (!room_names.is_empty()).then_some(room_names),
                },
            }
        })
        .collect()
}

/// The "everything selected" state: each course mapped to all of its
/// groups. Used to seed the selection UI on first visit.
pub fn default_selected_groups(course_groups: &CourseGroups) -> SelectedGroups {
    course_groups
        .iter()
        .map(|(course, groups)| (course.clone(), groups.clone()))
        .collect()
}
