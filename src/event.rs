use std::time::Instant;

/// Keys the viewer cares about
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Space,
    Shift,
    Control,
    Alt,
    Char(char),
    Other,
}

/// What element an event was aimed at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventTarget {
    Canvas,
    Page(usize),
    /// Text fields and editable content; key handling skips these
    TextInput,
    Other,
}

/// Listener key, one per event shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Wheel,
    KeyDown,
    KeyUp,
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerMove,
    PointerUp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventPayload {
    Scroll,
    Wheel,
    KeyDown { key: Key, target: EventTarget },
    KeyUp { key: Key },
    PointerEnter { target: EventTarget },
    PointerLeave { target: EventTarget },
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
}

/// A timestamped input event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerEvent {
    pub payload: EventPayload,
    pub at: Instant,
}

impl ViewerEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self::at(payload, Instant::now())
    }

    pub fn at(payload: EventPayload, at: Instant) -> Self {
        Self { payload, at }
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Scroll => EventKind::Scroll,
            EventPayload::Wheel => EventKind::Wheel,
            EventPayload::KeyDown { .. } => EventKind::KeyDown,
            EventPayload::KeyUp { .. } => EventKind::KeyUp,
            EventPayload::PointerEnter { .. } => EventKind::PointerEnter,
            EventPayload::PointerLeave { .. } => EventKind::PointerLeave,
            EventPayload::PointerDown { .. } => EventKind::PointerDown,
            EventPayload::PointerMove { .. } => EventKind::PointerMove,
            EventPayload::PointerUp => EventKind::PointerUp,
        }
    }

    pub fn scroll() -> Self {
        Self::new(EventPayload::Scroll)
    }

    pub fn wheel() -> Self {
        Self::new(EventPayload::Wheel)
    }

    pub fn key_down(key: Key, target: EventTarget) -> Self {
        Self::new(EventPayload::KeyDown { key, target })
    }

    pub fn key_up(key: Key) -> Self {
        Self::new(EventPayload::KeyUp { key })
    }

    pub fn pointer_enter(target: EventTarget) -> Self {
        Self::new(EventPayload::PointerEnter { target })
    }

    pub fn pointer_leave(target: EventTarget) -> Self {
        Self::new(EventPayload::PointerLeave { target })
    }

    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::new(EventPayload::PointerDown { x, y })
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::new(EventPayload::PointerMove { x, y })
    }

    pub fn pointer_up() -> Self {
        Self::new(EventPayload::PointerUp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_payload() {
        assert_eq!(ViewerEvent::scroll().kind(), EventKind::Scroll);
        assert_eq!(
            ViewerEvent::key_down(Key::Space, EventTarget::Canvas).kind(),
            EventKind::KeyDown
        );
        assert_eq!(ViewerEvent::pointer_move(1.0, 2.0).kind(), EventKind::PointerMove);
        assert_eq!(ViewerEvent::pointer_up().kind(), EventKind::PointerUp);
    }
}
