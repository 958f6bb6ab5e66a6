//! # Event Constructor
//!
//! Turns contract-declared events into namespaced chain events.
//!
//! - Module event: one `wasm` event carrying the contract's attributes.
//! - Custom events: one `wasm-<type>` event per declared event.
//!
//! Both flavors inject `_contract_address` as the first attribute and reject
//! attributes that would collide with it or with the reserved `_` prefix.

use crate::domain::entities::{Event, EventAttribute};
use crate::domain::value_objects::Address;
use crate::errors::EventError;

/// Type of the module-level event.
pub const MODULE_EVENT_TYPE: &str = "wasm";

/// Prefix of contract-declared event types.
pub const CUSTOM_EVENT_PREFIX: &str = "wasm-";

/// Attribute injected into every contract event.
pub const ATTRIBUTE_KEY_CONTRACT_ADDR: &str = "_contract_address";

/// Keys starting with this prefix are reserved for the chain.
pub const ATTRIBUTE_RESERVED_PREFIX: &str = "_";

/// Minimum length of a custom event type after trimming.
pub const MIN_EVENT_TYPE_LEN: usize = 2;

/// Builds the module-level `wasm` event for a contract response.
///
/// # Errors
///
/// Returns [`EventError`] if any attribute is invalid.
pub fn new_module_event(
    contract: &Address,
    attributes: &[EventAttribute],
) -> Result<Event, EventError> {
    Ok(Event {
        ty: MODULE_EVENT_TYPE.to_string(),
        attributes: contract_attributes(contract, attributes)?,
    })
}

/// Builds one `wasm-<type>` event per contract-declared event.
///
/// # Errors
///
/// Returns [`EventError`] if a type is too short or any attribute is invalid.
pub fn new_custom_events(contract: &Address, events: &[Event]) -> Result<Vec<Event>, EventError> {
    events
        .iter()
        .map(|event| {
            let ty = event.ty.trim();
            if ty.chars().count() < MIN_EVENT_TYPE_LEN {
                return Err(EventError::TypeTooShort(ty.to_string()));
            }
            Ok(Event {
                ty: format!("{CUSTOM_EVENT_PREFIX}{ty}"),
                attributes: contract_attributes(contract, &event.attributes)?,
            })
        })
        .collect()
}

/// Returns true if a module event for this contract is among `events`.
#[must_use]
pub fn has_module_event(events: &[Event], contract: &Address) -> bool {
    let expected = contract.to_canonical_string();
    events.iter().any(|event| {
        event.ty == MODULE_EVENT_TYPE
            && event
                .attributes
                .iter()
                .any(|attr| attr.key == ATTRIBUTE_KEY_CONTRACT_ADDR && attr.value == expected)
    })
}

/// Validates and trims contract attributes, prepending the contract address.
fn contract_attributes(
    contract: &Address,
    attributes: &[EventAttribute],
) -> Result<Vec<EventAttribute>, EventError> {
    let mut out = Vec::with_capacity(attributes.len() + 1);
    out.push(EventAttribute::new(
        ATTRIBUTE_KEY_CONTRACT_ADDR,
        contract.to_canonical_string(),
    ));

    for attr in attributes {
        let key = attr.key.trim();
        let value = attr.value.trim();
        if key.is_empty() {
            return Err(EventError::EmptyAttributeKey {
                value: value.to_string(),
            });
        }
        if key == ATTRIBUTE_KEY_CONTRACT_ADDR {
            return Err(EventError::ContractAddressAttribute(key.to_string()));
        }
        if key.starts_with(ATTRIBUTE_RESERVED_PREFIX) {
            return Err(EventError::ReservedAttributeKey(key.to_string()));
        }
        out.push(EventAttribute::new(key, value));
    }
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Address {
        Address::new([0x11; 20])
    }

    fn declared(ty: &str, attrs: &[(&str, &str)]) -> Event {
        Event {
            ty: ty.to_string(),
            attributes: attrs.iter().map(|(k, v)| EventAttribute::new(*k, *v)).collect(),
        }
    }

    fn expected(ty: &str, attrs: &[(&str, &str)]) -> Event {
        let mut event = Event::new(ty).add_attribute(
            ATTRIBUTE_KEY_CONTRACT_ADDR,
            contract().to_canonical_string(),
        );
        for (k, v) in attrs {
            event = event.add_attribute(*k, *v);
        }
        event
    }

    #[test]
    fn test_custom_events_namespaced() {
        let got = new_custom_events(
            &contract(),
            &[
                declared("foo", &[("myKey", "myVal")]),
                declared("bar", &[("otherKey", "otherVal")]),
            ],
        )
        .unwrap();
        assert_eq!(
            got,
            vec![
                expected("wasm-foo", &[("myKey", "myVal")]),
                expected("wasm-bar", &[("otherKey", "otherVal")]),
            ]
        );
    }

    #[test]
    fn test_custom_events_strip_whitespace() {
        let got = new_custom_events(&contract(), &[declared("  food\n", &[("my Key", "\tmyVal")])])
            .unwrap();
        assert_eq!(got, vec![expected("wasm-food", &[("my Key", "myVal")])]);
    }

    #[test]
    fn test_custom_events_whitespace_value_collapses() {
        let got = new_custom_events(&contract(), &[declared("foo", &[("myKey", "\n\n\n")])]).unwrap();
        assert_eq!(got, vec![expected("wasm-foo", &[("myKey", "")])]);
    }

    #[test]
    fn test_custom_events_without_attributes() {
        let got = new_custom_events(&contract(), &[declared("foo", &[])]).unwrap();
        assert_eq!(got, vec![expected("wasm-foo", &[])]);
        assert!(new_custom_events(&contract(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_custom_events_short_type() {
        assert_eq!(
            new_custom_events(&contract(), &[declared("f", &[])]),
            Err(EventError::TypeTooShort("f".to_string()))
        );
        assert!(new_custom_events(&contract(), &[declared("    f   ", &[("some", "data")])]).is_err());
        assert!(new_custom_events(&contract(), &vec![Event::default(); 3]).is_err());
    }

    #[test]
    fn test_contract_address_not_settable() {
        let result = new_custom_events(
            &contract(),
            &[declared("foo", &[(ATTRIBUTE_KEY_CONTRACT_ADDR, "anything")])],
        );
        assert!(matches!(result, Err(EventError::ContractAddressAttribute(_))));

        let result = new_module_event(
            &contract(),
            &[EventAttribute::new(ATTRIBUTE_KEY_CONTRACT_ADDR, "")],
        );
        assert!(matches!(result, Err(EventError::ContractAddressAttribute(_))));
    }

    #[test]
    fn test_reserved_prefix_rejected() {
        let result = new_custom_events(
            &contract(),
            &[declared("wasm", &[("_reserved", "is skipped"), ("normal", "is used")])],
        );
        assert_eq!(
            result,
            Err(EventError::ReservedAttributeKey("_reserved".to_string()))
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = new_custom_events(
            &contract(),
            &[declared("boom", &[("some", "data"), ("\n\n\n\n", "value")])],
        );
        assert_eq!(
            result,
            Err(EventError::EmptyAttributeKey {
                value: "value".to_string()
            })
        );
        assert!(new_module_event(&contract(), &[EventAttribute::new("  ", "value")]).is_err());
    }

    #[test]
    fn test_module_event() {
        let got = new_module_event(
            &contract(),
            &[EventAttribute::new("   my-real-key    ", "\n\n\nsome-val\t\t\t")],
        )
        .unwrap();
        assert_eq!(got, expected("wasm", &[("my-real-key", "some-val")]));

        let bare = new_module_event(&contract(), &[]).unwrap();
        assert_eq!(bare, expected("wasm", &[]));
        assert_eq!(bare.attributes[0].key, ATTRIBUTE_KEY_CONTRACT_ADDR);
    }

    #[test]
    fn test_has_module_event() {
        let module = new_module_event(&contract(), &[]).unwrap();
        assert!(has_module_event(&[module.clone()], &contract()));
        assert!(!has_module_event(&[module], &Address::new([0x22; 20])));

        let custom = expected(CUSTOM_EVENT_PREFIX, &[]);
        assert!(!has_module_event(&[custom], &contract()));
        assert!(!has_module_event(&[], &contract()));
    }
}
