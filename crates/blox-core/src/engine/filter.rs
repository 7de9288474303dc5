//! Queue merging: collapses drag ticks, repeated edits and viewport spam into
//! one event per logical action.
//!
//! Events are bucketed by `(kind, entity id, workspace id)`, where every UI
//! kind shares one bucket tag. Within a bucket:
//!
//! - moves merge only when strictly adjacent in the queue (raw index, nulls
//!   included)
//! - changes merge when they target the same element and field
//! - viewport changes always merge into the workspace's last viewport change
//! - a click right after a bubble opened is dropped
//!
//! Anything else takes over the bucket and is kept.

use crate::event::{ChangeElement, Event, EventPayload};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    tag: String,
    entity_id: String,
    workspace_id: String,
}

impl BucketKey {
    fn of(event: &Event) -> Self {
        let tag = if event.is_ui() { "ui" } else { event.kind_str() };
        Self {
            tag: tag.to_string(),
            entity_id: event.entity_id().to_string(),
            workspace_id: event.workspace_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BucketEntry {
    /// Position of the bucket's event in the output.
    out_index: usize,
    /// Position in the input queue of the last event folded into it.
    queue_index: usize,
}

fn is_mutation_change(event: &Event) -> bool {
    matches!(
        &event.payload,
        EventPayload::BlockChange(change) if change.element == ChangeElement::Mutation
    )
}

/// Merge compatible events in `queue`.
///
/// With `forward == false` the queue is merged in reverse chronological
/// order (as undo replays it) and returned in forward order.
#[must_use]
pub fn filter(mut queue: Vec<Event>, forward: bool) -> Vec<Event> {
    if !forward {
        queue.reverse();
    }

    let mut out: Vec<Event> = Vec::with_capacity(queue.len());
    let mut buckets: HashMap<BucketKey, BucketEntry> = HashMap::new();
    let mut last_viewport: HashMap<String, usize> = HashMap::new();

    for (i, event) in queue.into_iter().enumerate() {
        if event.is_null() {
            continue;
        }
        let key = BucketKey::of(&event);

        let merged = match buckets.get_mut(&key) {
            None => false,
            Some(entry) => {
                if let EventPayload::ViewportChange(next) = &event.payload {
                    match last_viewport.get(&event.workspace_id) {
                        Some(&idx) => {
                            if let EventPayload::ViewportChange(last) = &mut out[idx].payload {
                                last.absorb(next);
                            }
                            true
                        }
                        None => false,
                    }
                } else {
                    let adjacent = entry.queue_index + 1 == i;
                    match (&mut out[entry.out_index].payload, &event.payload) {
                        (EventPayload::BlockMove(last), EventPayload::BlockMove(next))
                            if adjacent =>
                        {
                            last.absorb(next);
                            entry.queue_index = i;
                            true
                        }
                        (EventPayload::CommentMove(last), EventPayload::CommentMove(next))
                            if adjacent =>
                        {
                            last.absorb(next);
                            entry.queue_index = i;
                            true
                        }
                        (EventPayload::BlockChange(last), EventPayload::BlockChange(next))
                            if last.same_target(next) =>
                        {
                            last.new_value = next.new_value.clone();
                            last.completes_intermediate |= next.completes_intermediate;
                            true
                        }
                        (EventPayload::CommentChange(last), EventPayload::CommentChange(next)) => {
                            last.new_contents = next.new_contents.clone();
                            true
                        }
                        // Opening a bubble produces a stray click.
                        (EventPayload::BubbleOpen(_), EventPayload::Click(_)) => true,
                        _ => false,
                    }
                }
            }
        };
        if merged {
            continue;
        }

        let out_index = out.len();
        if matches!(event.payload, EventPayload::ViewportChange(_)) {
            last_viewport.insert(event.workspace_id.clone(), out_index);
        }
        buckets.insert(
            key,
            BucketEntry {
                out_index,
                queue_index: i,
            },
        );
        out.push(event);
    }

    // Merging may have walked an event back to where it started.
    out.retain(|event| !event.is_null());

    if !forward {
        out.reverse();
    }

    // Mutation changes go first so mutator state is in place before the
    // structural events that depend on it.
    for i in 1..out.len() {
        if is_mutation_change(&out[i]) {
            let event = out.remove(i);
            out.insert(0, event);
        }
    }

    out
}
