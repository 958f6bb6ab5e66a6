//! # Bank Handler Adapter
//!
//! Minimal bank module: balances live in the execution context under
//! `balance/<address>/<denom>` as decimal strings.

use crate::context::ExecutionContext;
use crate::domain::entities::{
    BankMessage, ContractMessage, DispatchOutcome, Event, ProtocolResponse,
};
use crate::domain::value_objects::{Address, Bytes, Coin, Gas, U256};
use crate::errors::HandlerError;
use crate::ports::outbound::MessageHandler;

/// Gas charged per coin moved.
pub const GAS_PER_COIN: Gas = 1_000;

/// Response type URL of a bank send.
pub const MSG_SEND_RESPONSE_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSendResponse";

/// Response type URL of a bank burn.
pub const MSG_BURN_RESPONSE_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgBurnResponse";

/// Storage key of a balance.
#[must_use]
pub fn balance_key(owner: &Address, denom: &str) -> Vec<u8> {
    format!("balance/{owner}/{denom}").into_bytes()
}

/// Reads a balance, zero if absent.
///
/// # Errors
///
/// Returns [`HandlerError::System`] if the stored value is corrupt.
pub fn balance_of(ctx: &ExecutionContext<'_>, owner: &Address, denom: &str) -> Result<U256, HandlerError> {
    match ctx.get(&balance_key(owner, denom)) {
        None => Ok(U256::zero()),
        Some(raw) => std::str::from_utf8(&raw)
            .ok()
            .and_then(|s| U256::from_dec_str(s).ok())
            .ok_or_else(|| HandlerError::System(format!("corrupt balance for {owner}/{denom}"))),
    }
}

/// Writes a balance.
pub fn set_balance(ctx: &mut ExecutionContext<'_>, owner: &Address, denom: &str, amount: U256) {
    ctx.set(balance_key(owner, denom), amount.to_string());
}

/// Handles [`ContractMessage::Bank`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BankHandler;

impl BankHandler {
    fn debit(ctx: &mut ExecutionContext<'_>, owner: &Address, coin: &Coin) -> Result<(), HandlerError> {
        let available = balance_of(ctx, owner, &coin.denom)?;
        if available < coin.amount {
            return Err(HandlerError::InsufficientFunds {
                required: coin.to_string(),
                available: Coin::new(available, coin.denom.clone()).to_string(),
            });
        }
        set_balance(ctx, owner, &coin.denom, available - coin.amount);
        Ok(())
    }

    fn credit(ctx: &mut ExecutionContext<'_>, owner: &Address, coin: &Coin) -> Result<(), HandlerError> {
        let current = balance_of(ctx, owner, &coin.denom)?;
        let updated = current
            .checked_add(coin.amount)
            .ok_or_else(|| HandlerError::System(format!("balance overflow for {owner}")))?;
        set_balance(ctx, owner, &coin.denom, updated);
        Ok(())
    }

    fn charge(ctx: &mut ExecutionContext<'_>, coins: &[Coin]) -> Result<(), HandlerError> {
        let coins = Gas::try_from(coins.len()).unwrap_or(Gas::MAX);
        ctx.consume_gas(GAS_PER_COIN.saturating_mul(coins), "bank")
    }
}

fn format_coins(coins: &[Coin]) -> String {
    coins.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

impl MessageHandler for BankHandler {
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        _protocol_id: &str,
        msg: &ContractMessage,
    ) -> Result<DispatchOutcome, HandlerError> {
        let ContractMessage::Bank(bank) = msg else {
            return Err(HandlerError::Unsupported(msg.kind()));
        };

        match bank {
            BankMessage::Send { to_address, amount } => {
                Self::charge(ctx, amount)?;
                for coin in amount {
                    Self::debit(ctx, contract, coin)?;
                    Self::credit(ctx, to_address, coin)?;
                }
                let sender = contract.to_string();
                let events = vec![
                    Event::new("message")
                        .add_attribute("module", "bank")
                        .add_attribute("sender", sender.clone()),
                    Event::new("transfer")
                        .add_attribute("recipient", to_address.to_string())
                        .add_attribute("sender", sender)
                        .add_attribute("amount", format_coins(amount)),
                ];
                Ok(DispatchOutcome {
                    events,
                    data: vec![Bytes::new()],
                    protocol_responses: vec![vec![ProtocolResponse::new(
                        MSG_SEND_RESPONSE_TYPE_URL,
                        Bytes::new(),
                    )]],
                })
            }
            BankMessage::Burn { amount } => {
                Self::charge(ctx, amount)?;
                for coin in amount {
                    Self::debit(ctx, contract, coin)?;
                }
                let events = vec![Event::new("burn")
                    .add_attribute("burner", contract.to_string())
                    .add_attribute("amount", format_coins(amount))];
                Ok(DispatchOutcome {
                    events,
                    data: vec![Bytes::new()],
                    protocol_responses: vec![vec![ProtocolResponse::new(
                        MSG_BURN_RESPONSE_TYPE_URL,
                        Bytes::new(),
                    )]],
                })
            }
        }
    }
}
