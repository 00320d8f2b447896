//! Item events, the manager-level event bus and the per-frame scheduler.
//!
//! Events raised on an item are delivered to that item's listeners, then
//! re-emitted on each ancestor in turn. When an event reaches the top of an
//! attached tree (or of a detached subtree) it is handed to the [`EventBus`],
//! which delivers it to manager subscribers. Throttled kinds such as
//! [`EventKind::StateChanged`] are coalesced so that subscribers see at most
//! one delivery per frame.

use std::fmt;

use indexmap::IndexMap;

use crate::config::ItemType;
use crate::items::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChanged,
    ItemCreated,
    /// `rowCreated`, `stackCreated` and friends.
    Created(ItemType),
    BeforeItemDestroyed,
    ItemDestroyed,
    ActiveContentItemChanged,
    ItemPickedUp,
    ItemDropped,
    TabCreated,
    Maximised,
    Minimised,
    TitleChanged,
    Resize,
    Shown,
    Hidden,
    Open,
    Close,
    SelectionChanged,
    WindowOpened,
    WindowClosed,
    Initialised,
}

impl EventKind {
    /// Kinds coalesced to a single manager delivery per frame.
    pub fn is_throttled(self) -> bool {
        matches!(self, EventKind::StateChanged)
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::StateChanged => "stateChanged",
            EventKind::ItemCreated => "itemCreated",
            EventKind::Created(ItemType::Root) => "rootCreated",
            EventKind::Created(ItemType::Row) => "rowCreated",
            EventKind::Created(ItemType::Column) => "columnCreated",
            EventKind::Created(ItemType::Stack) => "stackCreated",
            EventKind::Created(ItemType::Component) => "componentCreated",
            EventKind::BeforeItemDestroyed => "beforeItemDestroyed",
            EventKind::ItemDestroyed => "itemDestroyed",
            EventKind::ActiveContentItemChanged => "activeContentItemChanged",
            EventKind::ItemPickedUp => "itemPickedUp",
            EventKind::ItemDropped => "itemDropped",
            EventKind::TabCreated => "tabCreated",
            EventKind::Maximised => "maximised",
            EventKind::Minimised => "minimised",
            EventKind::TitleChanged => "titleChanged",
            EventKind::Resize => "resize",
            EventKind::Shown => "shown",
            EventKind::Hidden => "hide",
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::SelectionChanged => "selectionChanged",
            EventKind::WindowOpened => "windowOpened",
            EventKind::WindowClosed => "windowClosed",
            EventKind::Initialised => "initialised",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Envelope delivered to item listeners.
#[derive(Debug, Clone)]
pub struct ItemEvent {
    pub kind: EventKind,
    pub origin: NodeId,
    pub bubbling: bool,
    stopped: bool,
}

impl ItemEvent {
    pub fn local(kind: EventKind, origin: NodeId) -> Self {
        Self {
            kind,
            origin,
            bubbling: false,
            stopped: false,
        }
    }

    pub fn bubbling(kind: EventKind, origin: NodeId) -> Self {
        Self {
            kind,
            origin,
            bubbling: true,
            stopped: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

/// What manager subscribers receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEvent {
    pub kind: EventKind,
    pub origin: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type ItemCallback = Box<dyn FnMut(&mut ItemEvent)>;
type LayoutCallback = Box<dyn FnMut(&LayoutEvent)>;

/// Listeners registered on a single item. `None` as the filter subscribes to
/// every kind.
#[derive(Default)]
pub struct ItemListeners {
    next: u64,
    entries: Vec<(ListenerId, Option<EventKind>, ItemCallback)>,
}

impl fmt::Debug for ItemListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemListeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl ItemListeners {
    pub fn on(&mut self, filter: Option<EventKind>, callback: ItemCallback) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.entries.push((id, filter, callback));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _, _)| *entry != id);
        before != self.entries.len()
    }

    pub fn dispatch(&mut self, event: &mut ItemEvent) {
        for (_, filter, callback) in self.entries.iter_mut() {
            if filter.is_none_or(|kind| kind == event.kind) {
                callback(event);
                if event.is_propagation_stopped() {
                    return;
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Work postponed to the next frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Run `set_size` over the subtree rooted at the node.
    ResizeSubtree(NodeId),
}

/// Manager subscribers plus the per-frame queue.
#[derive(Default)]
pub struct EventBus {
    next: u64,
    subscribers: Vec<(ListenerId, Option<EventKind>, LayoutCallback)>,
    pending: IndexMap<EventKind, LayoutEvent>,
    deferred: Vec<Deferred>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("pending", &self.pending)
            .field("deferred", &self.deferred)
            .finish()
    }
}

impl EventBus {
    pub fn subscribe(&mut self, filter: Option<EventKind>, callback: LayoutCallback) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.subscribers.push((id, filter, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(entry, _, _)| *entry != id);
        before != self.subscribers.len()
    }

    /// Delivers immediately, bypassing throttling.
    pub fn emit(&mut self, event: LayoutEvent) {
        tracing::trace!(kind = %event.kind, origin = ?event.origin, "layout event");
        for (_, filter, callback) in self.subscribers.iter_mut() {
            if filter.is_none_or(|kind| kind == event.kind) {
                callback(&event);
            }
        }
    }

    /// Entry point for events leaving the item tree. Throttled kinds are
    /// queued once per frame; the first origin within a frame wins.
    pub fn propagate(&mut self, event: LayoutEvent) {
        if event.kind.is_throttled() {
            self.pending.entry(event.kind).or_insert(event);
        } else {
            self.emit(event);
        }
    }

    pub fn defer(&mut self, task: Deferred) {
        if !self.deferred.contains(&task) {
            self.deferred.push(task);
        }
    }

    pub fn take_deferred(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.deferred)
    }

    /// Flushes the coalesced events queued before this call.
    pub fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (_, event) in pending {
            self.emit(event);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.deferred.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn throttled_events_coalesce_until_flush() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::default();
        let sink = seen.clone();
        bus.subscribe(None, Box::new(move |e| sink.borrow_mut().push(*e)));

        let a = NodeId::from_raw(1);
        let b = NodeId::from_raw(2);
        bus.propagate(LayoutEvent {
            kind: EventKind::StateChanged,
            origin: Some(a),
        });
        bus.propagate(LayoutEvent {
            kind: EventKind::StateChanged,
            origin: Some(b),
        });
        assert!(seen.borrow().is_empty());

        bus.flush_pending();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].origin, Some(a));
    }

    #[test]
    fn unthrottled_events_are_immediate() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::default();
        let c = count.clone();
        bus.subscribe(
            Some(EventKind::ItemCreated),
            Box::new(move |_| *c.borrow_mut() += 1),
        );
        bus.propagate(LayoutEvent {
            kind: EventKind::ItemCreated,
            origin: None,
        });
        bus.propagate(LayoutEvent {
            kind: EventKind::Resize,
            origin: None,
        });
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn stopping_propagation_skips_later_listeners() {
        let mut listeners = ItemListeners::default();
        let hits = Rc::new(RefCell::new(0));
        listeners.on(None, Box::new(|e: &mut ItemEvent| e.stop_propagation()));
        let h = hits.clone();
        listeners.on(None, Box::new(move |_| *h.borrow_mut() += 1));
        let mut event = ItemEvent::bubbling(EventKind::StateChanged, NodeId::from_raw(3));
        listeners.dispatch(&mut event);
        assert!(event.is_propagation_stopped());
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn deferred_tasks_are_deduplicated() {
        let mut bus = EventBus::default();
        let id = NodeId::from_raw(4);
        bus.defer(Deferred::ResizeSubtree(id));
        bus.defer(Deferred::ResizeSubtree(id));
        assert_eq!(bus.take_deferred().len(), 1);
        assert!(bus.take_deferred().is_empty());
    }
}
