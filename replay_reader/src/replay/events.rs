// Recorded browser events as handed to playback.

use serde_json::json;

use super::timestamps::TimeRange;
use super::types::{RecordingEvent, RRWEB_EVENT_CUSTOM};

pub const REPLAY_END_TAG: &str = "replay-end";

/// Event list handed to playback.
///
/// The capture order is kept as is. A custom `replay-end` marker is placed
/// after every event at or before the end of `range`, and the first event is
/// pinned to the start of `range` so playback begins at the session start.
pub fn rrweb_event_list_factory(
    range: TimeRange,
    events: Vec<RecordingEvent>,
) -> Vec<RecordingEvent> {
    let end_marker = RecordingEvent {
        kind: RRWEB_EVENT_CUSTOM,
        timestamp: range.end_ms,
        data: json!({ "tag": REPLAY_END_TAG }),
    };

    let insert_at = events
        .iter()
        .rposition(|event| event.timestamp <= range.end_ms)
        .map_or(0, |idx| idx + 1);

    let mut list = events;
    list.insert(insert_at, end_marker);

    if let Some(first) = list.first_mut() {
        first.timestamp = range.start_ms;
    }
    list
}
