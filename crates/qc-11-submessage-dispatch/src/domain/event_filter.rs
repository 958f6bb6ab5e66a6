//! # Event Filter
//!
//! Splits handler events into the set a contract sees in its reply and the
//! full log emitted to the outside world.

use crate::domain::entities::{Event, EventFilterConfig, MessageKind};

/// Output of [`EventFilter::filter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilteredEvents {
    /// Events relayed into `Reply.result.ok.events`.
    pub contract_visible: Vec<Event>,
    /// Every event, in original order.
    pub full_log: Vec<Event>,
}

/// Stateless classifier driven by [`EventFilterConfig`].
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    config: EventFilterConfig,
}

impl EventFilter {
    /// Creates a filter from its rules.
    #[must_use]
    pub fn new(config: EventFilterConfig) -> Self {
        Self { config }
    }

    /// Returns the rules.
    #[must_use]
    pub fn config(&self) -> &EventFilterConfig {
        &self.config
    }

    /// Classifies the events produced by a message of kind `origin`.
    ///
    /// Events of non-contract messages are hidden from the contract unless
    /// the config says otherwise. Per-event rules apply on top.
    #[must_use]
    pub fn filter(&self, origin: MessageKind, events: Vec<Event>) -> FilteredEvents {
        let origin_visible =
            origin == MessageKind::Wasm || self.config.expose_non_contract_events;

        let contract_visible = if origin_visible {
            events
                .iter()
                .filter(|event| self.is_contract_visible(event))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        FilteredEvents {
            contract_visible,
            full_log: events,
        }
    }

    /// Per-event visibility rule.
    #[must_use]
    pub fn is_contract_visible(&self, event: &Event) -> bool {
        if self.config.hidden_event_types.iter().any(|t| *t == event.ty) {
            return false;
        }
        !event.attributes.iter().any(|attr| {
            self.config
                .protocol_origin_attribute_keys
                .iter()
                .any(|key| *key == attr.key)
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
