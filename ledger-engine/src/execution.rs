//! Transaction execution pipelines

use crate::ibc;
use crate::plugin::{CallContext, Plugins};
use crate::state::State;
use ledger_core::{
    fee_coins, Account, Address, AppTx, Coins, Dest, SendTx, Tx, TxError, TxInput, TxOutput,
    TxResult,
};
use ledger_store::KVStore;
use std::collections::HashMap;
use tracing::{debug, info};

/// Successful execution outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub data: Vec<u8>,
    pub log: String,
}

/// Validate and apply a decoded transaction against `state`.
///
/// All checks run in order and the first failure returns with zero
/// mutation. In check-only mode the transaction is validated and input
/// debits are buffered in the (scratch) target state, but output-side
/// credits are never persisted and plugins never run.
pub fn exec_tx<S: KVStore>(
    state: &mut State<S>,
    plugins: &mut Plugins,
    tx: &Tx,
    is_check: bool,
) -> TxResult<Receipt> {
    let chain_id = state.chain_id()?;
    match tx {
        Tx::Send(send) => {
            exec_send_tx(state, &chain_id, send, is_check)?;
            let id = tx.id(&chain_id)?;
            Ok(Receipt {
                data: id.as_ref().to_vec(),
                log: String::new(),
            })
        }
        Tx::App(app) => exec_app_tx(state, plugins, &chain_id, app, is_check),
    }
}

fn exec_send_tx<S: KVStore>(
    state: &mut State<S>,
    chain_id: &str,
    tx: &SendTx,
    is_check: bool,
) -> TxResult<()> {
    debug!(
        inputs = tx.inputs.len(),
        outputs = tx.outputs.len(),
        is_check,
        "executing transfer"
    );

    // Structural validation, before any store access.
    validate_inputs_basic(&tx.inputs).map_err(|e| e.context("in validate_inputs_basic"))?;
    validate_outputs_basic(&tx.outputs).map_err(|e| e.context("in validate_outputs_basic"))?;
    let fee = fee_coins(&tx.fee).map_err(|e| e.context("in fee_coins"))?;

    let mut accounts = get_inputs(state, &tx.inputs).map_err(|e| e.context("in get_inputs"))?;
    get_or_make_outputs(state, &mut accounts, &tx.outputs)
        .map_err(|e| e.context("in get_or_make_outputs"))?;

    let sign_bytes = tx.sign_bytes(chain_id)?;
    let in_total = validate_inputs_advanced(&accounts, &sign_bytes, &tx.inputs)
        .map_err(|e| e.context("in validate_inputs_advanced"))?;
    let out_total = sum_outputs(&tx.outputs)?;
    let out_plus_fees = out_total.plus(&fee)?;
    if !in_total.is_equal(&out_plus_fees) {
        return Err(TxError::InvalidOutput(format!(
            "input total ({in_total}) != output total + fees ({out_plus_fees})"
        )));
    }

    // Good. Adjust the accounts.
    adjust_by_inputs(state, &mut accounts, &tx.inputs);
    adjust_by_outputs(state, &mut accounts, &tx.outputs, chain_id, is_check)?;
    Ok(())
}

fn exec_app_tx<S: KVStore>(
    state: &mut State<S>,
    plugins: &mut Plugins,
    chain_id: &str,
    tx: &AppTx,
    is_check: bool,
) -> TxResult<Receipt> {
    tx.input
        .validate_basic()
        .map_err(|e| e.context("in validate_basic"))?;
    let fee = fee_coins(&tx.fee).map_err(|e| e.context("in fee_coins"))?;

    let mut in_acc = state.get_account(&tx.input.address).ok_or_else(|| {
        TxError::UnknownAddress(format!("input account {} does not exist", tx.input.address))
    })?;
    if let Some(pub_key) = tx.input.pub_key {
        in_acc.pub_key = Some(pub_key);
    }

    let sign_bytes = tx.sign_bytes(chain_id)?;
    validate_input_advanced(&in_acc, &sign_bytes, &tx.input).map_err(|e| {
        info!(address = %tx.input.address, error = %e, "input validation failed");
        e.context("in validate_input_advanced")
    })?;
    if !tx.input.coins.is_gte(&fee) {
        return Err(TxError::InsufficientFunds(format!(
            "input coins {} do not cover the fee {}",
            tx.input.coins, fee
        )));
    }

    // Resolve the plugin before any balance is touched.
    let Some(plugin) = plugins.get_by_name_mut(&tx.name) else {
        return Err(TxError::UnknownAddress(format!(
            "unrecognized plugin name {}",
            tx.name
        )));
    };

    // Good. Take the full input coins and bump the sequence.
    let coins = tx.input.coins.minus(&fee)?;
    in_acc.sequence += 1;
    in_acc.balance = in_acc.balance.minus(&tx.input.coins)?;
    state.set_account(&tx.input.address, &in_acc);

    // Pre-consensus validation stops before plugin logic.
    if is_check {
        return Ok(Receipt::default());
    }

    let checkpoint = in_acc.clone();

    // Run the call in a scratch layer so its writes land all or nothing.
    let mut cache = state.scratch();
    cache.set_account(&tx.input.address, &in_acc);
    let ctx = CallContext::new(tx.input.address, in_acc, coins.clone());
    match plugin.run_tx(&mut cache, ctx, &tx.data) {
        Ok(data) => {
            cache.flush();
            info!(plugin = %tx.name, "plugin call succeeded");
            Ok(Receipt {
                data,
                log: String::new(),
            })
        }
        Err(err) => {
            info!(plugin = %tx.name, error = %err, "plugin call failed");
            drop(cache);
            // Return the forwarded coins; the fee stays spent.
            let mut restored = checkpoint;
            restored.balance = restored.balance.plus(&coins)?;
            state.set_account(&tx.input.address, &restored);
            Err(err)
        }
    }
}

fn validate_inputs_basic(inputs: &[TxInput]) -> TxResult<()> {
    for input in inputs {
        input.validate_basic()?;
    }
    Ok(())
}

fn validate_outputs_basic(outputs: &[TxOutput]) -> TxResult<()> {
    for output in outputs {
        output.validate_basic()?;
    }
    Ok(())
}

/// Load the distinct input accounts, adopting a freshly supplied public key.
fn get_inputs<S: KVStore>(
    state: &State<S>,
    inputs: &[TxInput],
) -> TxResult<HashMap<Address, Account>> {
    let mut accounts = HashMap::with_capacity(inputs.len());
    for input in inputs {
        if accounts.contains_key(&input.address) {
            return Err(TxError::DuplicateAddress(format!(
                "input address {} repeated",
                input.address
            )));
        }
        let mut account = state.get_account(&input.address).ok_or_else(|| {
            TxError::UnknownAddress(format!("input account {} does not exist", input.address))
        })?;
        if let Some(pub_key) = input.pub_key {
            account.pub_key = Some(pub_key);
        }
        accounts.insert(input.address, account);
    }
    Ok(accounts)
}

/// Resolve local output accounts, creating empty placeholders for
/// addresses the ledger has never seen. Cross-chain outputs need no
/// local account; they leave as packets.
fn get_or_make_outputs<S: KVStore>(
    state: &State<S>,
    accounts: &mut HashMap<Address, Account>,
    outputs: &[TxOutput],
) -> TxResult<()> {
    for output in outputs {
        let address = match &output.dest {
            Dest::Chain { .. } => continue,
            Dest::Local(address) => *address,
        };
        if accounts.contains_key(&address) {
            return Err(TxError::DuplicateAddress(format!(
                "output address {address} repeated"
            )));
        }
        let account = state.get_account(&address).unwrap_or_default();
        accounts.insert(address, account);
    }
    Ok(())
}

/// Check sequence, funds, and signature for each input; sum the coins.
fn validate_inputs_advanced(
    accounts: &HashMap<Address, Account>,
    sign_bytes: &[u8],
    inputs: &[TxInput],
) -> TxResult<Coins> {
    let mut total = Coins::default();
    for input in inputs {
        let account = accounts
            .get(&input.address)
            .unwrap_or_else(|| panic!("validate_inputs_advanced expects account {}", input.address));
        validate_input_advanced(account, sign_bytes, input)?;
        total = total.plus(&input.coins)?;
    }
    Ok(total)
}

fn validate_input_advanced(account: &Account, sign_bytes: &[u8], input: &TxInput) -> TxResult<()> {
    if account.sequence + 1 != input.sequence {
        return Err(TxError::InvalidSequence(format!(
            "got {}, expected {} (account sequence {})",
            input.sequence,
            account.sequence + 1,
            account.sequence
        )));
    }
    if !account.balance.is_gte(&input.coins) {
        return Err(TxError::InsufficientFunds(format!(
            "balance is {}, tried to send {}",
            account.balance, input.coins
        )));
    }
    let Some(signature) = &input.signature else {
        return Err(TxError::InvalidSignature("missing signature".to_string()));
    };
    let verified = account
        .pub_key
        .as_ref()
        .is_some_and(|key| key.verify(sign_bytes, signature));
    if !verified {
        return Err(TxError::InvalidSignature(format!(
            "signature verification failed for {}",
            input.address
        )));
    }
    Ok(())
}

fn sum_outputs(outputs: &[TxOutput]) -> TxResult<Coins> {
    let mut total = Coins::default();
    for output in outputs {
        total = total.plus(&output.coins)?;
    }
    Ok(total)
}

/// Debit the inputs and bump sequences. Panics on invariant breaks: by
/// this point every account is loaded and funds are validated, so a
/// failure here means the engine itself is inconsistent.
fn adjust_by_inputs<S: KVStore>(
    state: &mut State<S>,
    accounts: &mut HashMap<Address, Account>,
    inputs: &[TxInput],
) {
    for input in inputs {
        let account = accounts
            .get_mut(&input.address)
            .unwrap_or_else(|| panic!("adjust_by_inputs expects account {}", input.address));
        account.balance = account
            .balance
            .minus(&input.coins)
            .unwrap_or_else(|_| {
                panic!("adjust_by_inputs expects sufficient funds for {}", input.address)
            });
        account.sequence += 1;
        state.set_account(&input.address, account);
    }
}

/// Credit the local outputs (durably only outside check mode) and turn
/// cross-chain outputs into egress packets.
fn adjust_by_outputs<S: KVStore>(
    state: &mut State<S>,
    accounts: &mut HashMap<Address, Account>,
    outputs: &[TxOutput],
    chain_id: &str,
    is_check: bool,
) -> TxResult<()> {
    for output in outputs {
        let address = match &output.dest {
            Dest::Chain { chain_id: dst_chain, address } => {
                ibc::push_outgoing_packet(state, chain_id, dst_chain, *address, &output.coins)?;
                continue;
            }
            Dest::Local(address) => *address,
        };
        let account = accounts
            .get_mut(&address)
            .unwrap_or_else(|| panic!("adjust_by_outputs expects account {address}"));
        account.balance = account.balance.plus(&output.coins)?;
        if !is_check {
            state.set_account(&address, account);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use ledger_core::{Coin, Keypair, Signature};
    use ledger_store::MemStore;
    use std::cell::Cell;
    use std::rc::Rc;

    const CHAIN_ID: &str = "test_chain";

    fn atoms(amount: i64) -> Coins {
        Coins::from(Coin::new("atom", amount))
    }

    fn no_fee() -> Coin {
        Coin::new("", 0)
    }

    fn test_state() -> State<MemStore> {
        let mut state = State::new(MemStore::new());
        state.set_chain_id(CHAIN_ID);
        state
    }

    fn seed_account(state: &mut State<MemStore>, keypair: &Keypair, balance: Coins, sequence: u64) {
        let account = Account {
            pub_key: Some(keypair.pub_key()),
            sequence,
            balance,
        };
        state.set_account(&keypair.address(), &account);
    }

    /// Single-input transfer, signed over the canonical payload.
    fn send_tx(from: &Keypair, outputs: Vec<TxOutput>, coins: Coins, sequence: u64, fee: Coin) -> Tx {
        let mut tx = SendTx {
            fee,
            inputs: vec![TxInput {
                address: from.address(),
                coins,
                sequence,
                signature: None,
                pub_key: Some(from.pub_key()),
            }],
            outputs,
        };
        let sign_bytes = tx.sign_bytes(CHAIN_ID).unwrap();
        tx.inputs[0].signature = Some(from.sign(&sign_bytes));
        Tx::Send(tx)
    }

    fn app_tx(from: &Keypair, name: &str, coins: Coins, sequence: u64, fee: Coin, data: &[u8]) -> Tx {
        let mut tx = AppTx {
            fee,
            name: name.to_string(),
            input: TxInput {
                address: from.address(),
                coins,
                sequence,
                signature: None,
                pub_key: Some(from.pub_key()),
            },
            data: data.to_vec(),
        };
        let sign_bytes = tx.sign_bytes(CHAIN_ID).unwrap();
        tx.input.signature = Some(from.sign(&sign_bytes));
        Tx::App(tx)
    }

    /// Test plugin that writes under its state key, counts invocations,
    /// and optionally fails every call.
    struct RecordingPlugin {
        fail: bool,
        calls: Rc<Cell<u32>>,
    }

    impl RecordingPlugin {
        fn new(fail: bool) -> (Self, Rc<Cell<u32>>) {
            let calls = Rc::new(Cell::new(0));
            (
                Self {
                    fail,
                    calls: Rc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl Plugin for RecordingPlugin {
        fn name(&self) -> &str {
            "recorder"
        }

        fn state_key(&self) -> Vec<u8> {
            b"recorder/".to_vec()
        }

        fn run_tx(
            &mut self,
            store: &mut dyn KVStore,
            ctx: CallContext,
            data: &[u8],
        ) -> TxResult<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(TxError::InvalidInput("plugin rejected the call".to_string()));
            }
            store.set(b"recorder/last", data.to_vec());
            store.set(b"recorder/coins", ctx.coins.to_string().into_bytes());
            Ok(data.to_vec())
        }
    }

    #[test]
    fn test_send_happy_path() {
        // Account A has {atom:100} at sequence 5; sends 30 to B.
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            6,
            no_fee(),
        );
        let receipt = exec_tx(&mut state, &mut plugins, &tx, false).unwrap();
        assert_eq!(receipt.data, tx.id(CHAIN_ID).unwrap().as_ref().to_vec());

        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(70));
        assert_eq!(a_acc.sequence, 6);

        let b_acc = state.get_account(&b.address()).unwrap();
        assert_eq!(b_acc.balance, atoms(30));
        assert_eq!(b_acc.sequence, 0);
        assert!(b_acc.pub_key.is_none());
    }

    #[test]
    fn test_send_conservation_violation_rejected() {
        // Same transfer but the output only claims 25 of the 30 input.
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(25))],
            atoms(30),
            6,
            no_fee(),
        );
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::InvalidOutput(_)));

        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(100));
        assert_eq!(a_acc.sequence, 5);
        assert!(state.get_account(&b.address()).is_none());
    }

    #[test]
    fn test_send_with_fee_balances() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(28))],
            atoms(30),
            1,
            Coin::new("atom", 2),
        );
        exec_tx(&mut state, &mut plugins, &tx, false).unwrap();
        assert_eq!(state.get_account(&a.address()).unwrap().balance, atoms(70));
        assert_eq!(state.get_account(&b.address()).unwrap().balance, atoms(28));
    }

    #[test]
    fn test_send_rejects_malformed_fee() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            6,
            Coin::new("atom", -2),
        );
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::InvalidInput(_)));
        assert_eq!(state.get_account(&a.address()).unwrap().balance, atoms(100));
    }

    #[test]
    fn test_send_unknown_input_account() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            1,
            no_fee(),
        );
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::UnknownAddress(_)));
    }

    #[test]
    fn test_send_duplicate_addresses_rejected() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 0);

        // Duplicate inputs.
        let mut send = SendTx {
            fee: no_fee(),
            inputs: vec![
                TxInput {
                    address: a.address(),
                    coins: atoms(10),
                    sequence: 1,
                    signature: None,
                    pub_key: Some(a.pub_key()),
                },
                TxInput {
                    address: a.address(),
                    coins: atoms(10),
                    sequence: 1,
                    signature: None,
                    pub_key: Some(a.pub_key()),
                },
            ],
            outputs: vec![TxOutput::local(b.address(), atoms(20))],
        };
        let sign_bytes = send.sign_bytes(CHAIN_ID).unwrap();
        for input in &mut send.inputs {
            input.signature = Some(a.sign(&sign_bytes));
        }
        let err = exec_tx(&mut state, &mut plugins, &Tx::Send(send), false).unwrap_err();
        assert!(matches!(err, TxError::DuplicateAddress(_)));

        // An output naming an input address is a duplicate too.
        let tx = send_tx(
            &a,
            vec![TxOutput::local(a.address(), atoms(30))],
            atoms(30),
            1,
            no_fee(),
        );
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::DuplicateAddress(_)));
    }

    #[test]
    fn test_send_invalid_sequence() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        for bad_sequence in [5, 7, 42] {
            let tx = send_tx(
                &a,
                vec![TxOutput::local(b.address(), atoms(30))],
                atoms(30),
                bad_sequence,
                no_fee(),
            );
            let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
            assert!(matches!(err, TxError::InvalidSequence(_)));
        }
        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.sequence, 5);
        assert_eq!(a_acc.balance, atoms(100));
    }

    #[test]
    fn test_send_insufficient_funds() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(10), 0);

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            1,
            no_fee(),
        );
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::InsufficientFunds(_)));
        assert_eq!(state.get_account(&a.address()).unwrap().balance, atoms(10));
    }

    #[test]
    fn test_send_tampered_payload_fails_signature() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        // Sign for 30, then rewrite both sides to 40 so conservation
        // still holds and only the signature can catch it.
        let Tx::Send(mut send) = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            6,
            no_fee(),
        ) else {
            unreachable!()
        };
        send.inputs[0].coins = atoms(40);
        send.outputs[0].coins = atoms(40);

        let err = exec_tx(&mut state, &mut plugins, &Tx::Send(send), false).unwrap_err();
        assert!(matches!(err, TxError::InvalidSignature(_)));
        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(100));
        assert_eq!(a_acc.sequence, 5);
    }

    #[test]
    fn test_send_garbage_signature_rejected() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        let Tx::Send(mut send) = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            6,
            no_fee(),
        ) else {
            unreachable!()
        };
        send.inputs[0].signature = Some(Signature::new([0u8; 64]));
        let err = exec_tx(&mut state, &mut plugins, &Tx::Send(send), false).unwrap_err();
        assert!(matches!(err, TxError::InvalidSignature(_)));
    }

    #[test]
    fn test_send_check_mode_debits_but_never_credits() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 5);

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(30))],
            atoms(30),
            6,
            no_fee(),
        );
        exec_tx(&mut state, &mut plugins, &tx, true).unwrap();

        // Input side is tracked (against the check target), output side
        // is never persisted in check mode.
        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(70));
        assert_eq!(a_acc.sequence, 6);
        assert!(state.get_account(&b.address()).is_none());

        // Replaying the same transfer now fails against the
        // accumulated speculative debit.
        let err = exec_tx(&mut state, &mut plugins, &tx, true).unwrap_err();
        assert!(matches!(err, TxError::InvalidSequence(_)));
    }

    #[test]
    fn test_send_cross_chain_output_becomes_packet() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = send_tx(
            &a,
            vec![TxOutput::chain("far_chain", b.address(), atoms(30))],
            atoms(30),
            1,
            no_fee(),
        );
        exec_tx(&mut state, &mut plugins, &tx, false).unwrap();

        assert_eq!(state.get_account(&a.address()).unwrap().balance, atoms(70));
        assert!(state.get_account(&b.address()).is_none());

        let packet = ibc::get_outgoing_packet(&state, "far_chain", 0).unwrap();
        assert_eq!(packet.src_chain, CHAIN_ID);
        assert_eq!(packet.address, b.address());
        assert_eq!(packet.coins, atoms(30));
    }

    #[test]
    fn test_app_tx_runs_plugin_in_isolation() {
        let a = Keypair::from_seed([1u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        let (plugin, calls) = RecordingPlugin::new(false);
        plugins.register(Box::new(plugin));
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = app_tx(&a, "recorder", atoms(10), 1, Coin::new("atom", 2), b"payload");
        let receipt = exec_tx(&mut state, &mut plugins, &tx, false).unwrap();
        assert_eq!(receipt.data, b"payload".to_vec());
        assert_eq!(calls.get(), 1);

        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(90));
        assert_eq!(a_acc.sequence, 1);

        // Plugin writes were flushed, forwarded coins were net of fee.
        assert_eq!(state.get(b"recorder/last"), Some(b"payload".to_vec()));
        assert_eq!(state.get(b"recorder/coins"), Some(b"8atom".to_vec()));
    }

    #[test]
    fn test_app_tx_unknown_plugin_leaves_account_untouched() {
        // Plugin resolution happens before the debit.
        let a = Keypair::from_seed([1u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = app_tx(&a, "missing", atoms(10), 1, Coin::new("atom", 2), b"");
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::UnknownAddress(_)));

        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(100));
        assert_eq!(a_acc.sequence, 0);
    }

    #[test]
    fn test_app_tx_failure_keeps_fee_refunds_rest() {
        let a = Keypair::from_seed([1u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        let (plugin, calls) = RecordingPlugin::new(true);
        plugins.register(Box::new(plugin));
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = app_tx(&a, "recorder", atoms(10), 1, Coin::new("atom", 2), b"payload");
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::InvalidInput(_)));
        assert_eq!(calls.get(), 1);

        // Fee kept, the forwarded 8 returned, sequence bumped.
        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(98));
        assert_eq!(a_acc.sequence, 1);

        // None of the plugin's writes survived.
        assert!(state.get(b"recorder/last").is_none());
        assert!(state.get(b"recorder/coins").is_none());
    }

    #[test]
    fn test_app_tx_check_mode_skips_plugin() {
        let a = Keypair::from_seed([1u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        let (plugin, calls) = RecordingPlugin::new(false);
        plugins.register(Box::new(plugin));
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = app_tx(&a, "recorder", atoms(10), 1, Coin::new("atom", 2), b"payload");
        let receipt = exec_tx(&mut state, &mut plugins, &tx, true).unwrap();
        assert!(receipt.data.is_empty());
        assert_eq!(calls.get(), 0);

        // The debit is tracked in the check target.
        let a_acc = state.get_account(&a.address()).unwrap();
        assert_eq!(a_acc.balance, atoms(90));
        assert_eq!(a_acc.sequence, 1);
        assert!(state.get(b"recorder/last").is_none());
    }

    #[test]
    fn test_app_tx_fee_exceeding_coins_rejected() {
        let a = Keypair::from_seed([1u8; 32]);
        let mut state = test_state();
        let mut plugins = Plugins::new();
        let (plugin, _) = RecordingPlugin::new(false);
        plugins.register(Box::new(plugin));
        seed_account(&mut state, &a, atoms(100), 0);

        let tx = app_tx(&a, "recorder", atoms(1), 1, Coin::new("atom", 2), b"");
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::InsufficientFunds(_)));
        assert_eq!(state.get_account(&a.address()).unwrap().balance, atoms(100));
    }

    #[test]
    fn test_unset_chain_id_is_internal_error() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let mut state = State::new(MemStore::new());
        let mut plugins = Plugins::new();

        let tx = send_tx(
            &a,
            vec![TxOutput::local(b.address(), atoms(1))],
            atoms(1),
            1,
            no_fee(),
        );
        let err = exec_tx(&mut state, &mut plugins, &tx, false).unwrap_err();
        assert!(matches!(err, TxError::Internal(_)));
    }
}
