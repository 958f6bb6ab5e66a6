//! # Domain Services
//!
//! Pure functions used by the dispatcher and the adapters: protocol
//! identifiers of contracts and construction of reply results.

use crate::domain::entities::{Event, ProtocolResponse, SubMsgResponse, SubMsgResult};
use crate::domain::value_objects::{Address, Bytes};
use crate::errors::{AddressError, HandlerError};

// =============================================================================
// PROTOCOL IDENTIFIERS
// =============================================================================

/// Prefix of classic IBC port identifiers owned by contracts.
pub const PORT_ID_PREFIX: &str = "wasm.";

/// Prefix of IBC v2 port identifiers owned by contracts.
pub const IBC_V2_PORT_ID_PREFIX: &str = "wasm2.";

/// Port identifier of a contract.
#[must_use]
pub fn port_id_for_contract(contract: &Address) -> String {
    format!("{PORT_ID_PREFIX}{contract}")
}

/// IBC v2 port identifier of a contract.
#[must_use]
pub fn ibc_v2_port_id_for_contract(contract: &Address) -> String {
    format!("{IBC_V2_PORT_ID_PREFIX}{contract}")
}

/// Recovers the contract address from either kind of port identifier.
///
/// # Errors
///
/// Returns [`AddressError::InvalidPortId`] for unknown prefixes, or the
/// address parse error of the remainder.
pub fn contract_from_port_id(port_id: &str) -> Result<Address, AddressError> {
    if let Some(rest) = port_id.strip_prefix(IBC_V2_PORT_ID_PREFIX) {
        Address::from_canonical(rest)
    } else if let Some(rest) = port_id.strip_prefix(PORT_ID_PREFIX) {
        Address::from_canonical(rest)
    } else {
        Err(AddressError::InvalidPortId(port_id.to_string()))
    }
}

// =============================================================================
// REPLY RESULTS
// =============================================================================

/// Builds the `Ok` branch of a reply.
///
/// Only the first data frame is kept. Protocol responses are flattened in
/// execution order.
#[must_use]
pub fn success_result(
    visible_events: Vec<Event>,
    data: Vec<Bytes>,
    protocol_responses: Vec<Vec<ProtocolResponse>>,
) -> SubMsgResult {
    let data = data.into_iter().next();
    let msg_responses = protocol_responses.into_iter().flatten().collect();
    SubMsgResult::Ok(SubMsgResponse {
        events: visible_events,
        data,
        msg_responses,
    })
}

/// Builds the `Err` branch of a reply. Never carries events.
#[must_use]
pub fn failure_result(err: &HandlerError, redact: bool) -> SubMsgResult {
    let msg = if redact {
        err.redacted()
    } else {
        err.to_string()
    };
    SubMsgResult::Err(msg)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_ids_roundtrip() {
        let contract = Address::new([0x42; 20]);
        let port = port_id_for_contract(&contract);
        assert!(port.starts_with("wasm.0x"));
        assert_eq!(contract_from_port_id(&port).unwrap(), contract);

        let port = ibc_v2_port_id_for_contract(&contract);
        assert!(port.starts_with("wasm2.0x"));
        assert_eq!(contract_from_port_id(&port).unwrap(), contract);
    }

    #[test]
    fn test_contract_from_port_id_rejects() {
        assert!(matches!(
            contract_from_port_id("transfer"),
            Err(AddressError::InvalidPortId(_))
        ));
        assert!(matches!(
            contract_from_port_id("wasm.0x1234"),
            Err(AddressError::InvalidLength(2))
        ));
    }

    #[test]
    fn test_success_result_keeps_first_frame() {
        let result = success_result(
            vec![Event::new("wasm-foo")],
            vec![Bytes::from("first"), Bytes::from("second")],
            vec![
                vec![ProtocolResponse::new("/a", "1")],
                Vec::new(),
                vec![ProtocolResponse::new("/b", "2"), ProtocolResponse::new("/c", "3")],
            ],
        );
        let response = result.ok().unwrap();
        assert_eq!(response.data, Some(Bytes::from("first")));
        let urls: Vec<_> = response.msg_responses.iter().map(|r| r.type_url.as_str()).collect();
        assert_eq!(urls, vec!["/a", "/b", "/c"]);
        assert_eq!(response.events.len(), 1);
    }

    #[test]
    fn test_success_result_without_data() {
        let result = success_result(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(result, SubMsgResult::Ok(SubMsgResponse::default()));
    }

    #[test]
    fn test_failure_result_redaction() {
        let err = HandlerError::ExecuteFailed("secret node path".to_string());
        assert_eq!(
            failure_result(&err, true),
            SubMsgResult::Err("codespace: wasm, code: 5".to_string())
        );
        assert_eq!(
            failure_result(&err, false),
            SubMsgResult::Err("execute wasm contract failed: secret node path".to_string())
        );
    }
}
