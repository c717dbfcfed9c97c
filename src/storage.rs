use std::collections::HashMap;

use serde::Serialize;

/// Drag state owned by the scroll plugin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScrollState {
    pub drag_enabled: bool,
    pub dragging: bool,
}

/// Value of one plugin's storage slice
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StorageValue {
    /// Plugins without storage (download)
    #[default]
    Empty,
    Zoom(f64),
    Page(usize),
    Scroll(ScrollState),
}

impl StorageValue {
    pub fn as_zoom(&self) -> Option<f64> {
        match self {
            Self::Zoom(z) => Some(*z),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<usize> {
        match self {
            Self::Page(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_scroll(&self) -> Option<ScrollState> {
        match self {
            Self::Scroll(s) => Some(*s),
            _ => None,
        }
    }
}

/// Handle returned by `Viewer::subscribe`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Callback = Box<dyn FnMut(&StorageValue)>;

/// Per-slice subscriber lists, notified in registration order
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    by_slice: HashMap<&'static str, Vec<(SubscriptionId, Callback)>>,
}

impl Subscribers {
    pub fn subscribe(&mut self, slice: &'static str, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.by_slice.entry(slice).or_default().push((id, callback));
        id
    }

    /// Returns false when `id` was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in self.by_slice.values_mut() {
            if let Some(pos) = list.iter().position(|(sub, _)| *sub == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn emit(&mut self, slice: &str, value: &StorageValue) {
        if let Some(list) = self.by_slice.get_mut(slice) {
            for (_, callback) in list.iter_mut() {
                callback(value);
            }
        }
    }

    pub fn count(&self, slice: &str) -> usize {
        self.by_slice.get(slice).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.by_slice.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emits_in_registration_order_and_unsubscribes_idempotently() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscribers::default();

        let first = {
            let seen = seen.clone();
            subs.subscribe("zoom", Box::new(move |v| seen.borrow_mut().push(("a", *v))))
        };
        {
            let seen = seen.clone();
            subs.subscribe("zoom", Box::new(move |v| seen.borrow_mut().push(("b", *v))));
        }

        subs.emit("zoom", &StorageValue::Zoom(2.0));
        subs.emit("page", &StorageValue::Page(1));
        assert_eq!(
            *seen.borrow(),
            vec![("a", StorageValue::Zoom(2.0)), ("b", StorageValue::Zoom(2.0))]
        );

        assert!(subs.unsubscribe(first));
        assert!(!subs.unsubscribe(first));
        assert_eq!(subs.count("zoom"), 1);
    }
}
