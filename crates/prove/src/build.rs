//! Initial and target state construction
//!
//! Seeds a proof graph for one method: the initial configuration (program
//! bytecode, symbolic calldata, constrained special addresses), the
//! target configuration (free final cells plus the success or failure
//! predicate), and — when a completed setUp proof is supplied — the
//! grafted initial nodes copied forward from its final reachable states.

use crate::calldata::{symbolic_calldata, LengthBounds};
use crate::contract::{Contract, Method};
use crate::{Error, Result};
use athanor_core::kcfg::Kcfg;
use athanor_core::term::{CTerm, FreshVars, Term};
use athanor_core::{is_fail_test, Proof, ProofId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The Foundry cheat-code address, as a decimal EVM word. The executing
/// contract, caller, and origin must never collide with it.
const CHEATCODE_ADDRESS: &str = "645326474426547203313410069153905908525362434349";

/// Cells copied forward from a setup proof's final states into grafted
/// initial nodes. Everything else is rebuilt fresh for the new method.
const GRAFT_CELLS: &[&str] = &[
    "accounts",
    "number",
    "timestamp",
    "baseFee",
    "chainId",
    "coinbase",
    "callStack",
    "callDepth",
    "origin",
    "gas",
];

/// Flags controlling state construction.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Track gas symbolically instead of assuming an infinite supply.
    pub use_gas: bool,
    /// Make the test contract's own storage symbolic.
    pub symbolic_state: bool,
    /// Execute the constructor stage before setUp methods.
    pub run_constructor: bool,
    /// Allow grafting onto a setup proof with multiple final states.
    pub graft: bool,
    /// Exact-length annotations for dynamic calldata parameters.
    pub lengths: LengthBounds,
    /// Recorded chain state to merge into the initial accounts.
    pub deployment_state: Option<DeploymentState>,
}

/// Recorded account accesses from a deployment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentState {
    /// Accesses in recording order.
    pub accesses: Vec<StateAccess>,
}

/// How an account was touched during recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    /// Account created.
    Create,
    /// Storage or code written.
    Update,
    /// Balance read.
    Balance,
    /// Code-size read.
    Extcodesize,
    /// Code-hash read.
    Extcodehash,
    /// Code copied out.
    Extcodecopy,
}

/// One recorded account access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateAccess {
    /// What the access did.
    pub kind: AccessKind,
    /// Account address as a decimal word.
    pub account: String,
    /// Storage written by the access, slot to value (decimal words).
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
    /// Balance after the access, when recorded.
    #[serde(default)]
    pub balance: Option<String>,
    /// Code after the access, when recorded.
    #[serde(default, with = "hex::serde")]
    pub code: Vec<u8>,
    /// Whether the enclosing call frame reverted.
    #[serde(default)]
    pub reverted: bool,
}

impl StateAccess {
    /// Read-only access kinds have no state effect and are dropped
    /// before the merge.
    fn is_ignored(&self) -> bool {
        matches!(
            self.kind,
            AccessKind::Balance
                | AccessKind::Extcodesize
                | AccessKind::Extcodehash
                | AccessKind::Extcodecopy
        )
    }
}

/// Seeds a proof for `method` of `contract`, grafting onto `setup` when
/// one is supplied.
pub fn seed_proof(
    id: ProofId,
    contract: &Contract,
    method: &Method,
    setup: Option<&Proof>,
    config: &BuildConfig,
) -> Result<Proof> {
    let is_constructor = method.name == "constructor";
    let mut fresh = FreshVars::default();

    let initial = initial_config(contract, method, is_constructor, config, &mut fresh)?;
    let target = target_config(contract, method, is_constructor, &mut fresh);

    let mut kcfg = Kcfg::new();
    let target_node = kcfg.create_node(target);

    let init_node = match setup {
        None => kcfg.create_node(initial),
        Some(setup) => {
            let finals = graftable_finals(setup, config)?;
            let mut first_root = None;
            for final_id in finals {
                let final_state = setup.kcfg.node(final_id)?.cterm.clone();
                let root = kcfg.create_node(final_state.clone());
                first_root.get_or_insert(root);

                let mut grafted = initial.clone();
                for cell in GRAFT_CELLS {
                    if let Some(value) = final_state.cell(cell) {
                        grafted.set_cell(*cell, value.clone());
                    }
                }
                for constraint in final_state.constraints() {
                    grafted.add_constraint(constraint.clone());
                }
                // Re-derive well-formedness the copy does not carry: the
                // executing frame is never the cheat-code address.
                if let Some(current) = grafted.cell("id").cloned() {
                    grafted.add_constraint(Term::neq_int(
                        current,
                        Term::Int(CHEATCODE_ADDRESS.into()),
                    ));
                }

                let entry = kcfg.create_node(grafted);
                kcfg.create_edge(root, entry, 1)?;
            }
            // graftable_finals guarantees at least one final state.
            first_root.ok_or_else(|| Error::SetupNotPassed {
                setup: setup.id.clone(),
                status: "no reachable final state".to_string(),
            })?
        }
    };

    let mut proof = Proof::new(id, kcfg, init_node, target_node)?;
    proof.fresh = fresh;
    if let Some(setup) = setup {
        proof.subproofs.push(setup.id.clone());
    }
    tracing::debug!(proof = %proof.id, nodes = proof.kcfg.node_count(), "seeded proof graph");
    Ok(proof)
}

/// Validates the setup proof and returns its final reachable states (the
/// sources of covers into its target) for grafting.
fn graftable_finals(setup: &Proof, config: &BuildConfig) -> Result<Vec<athanor_core::NodeId>> {
    if setup.status != athanor_core::ProofStatus::Passed
        || !setup.pending().is_empty()
        || !setup.failing.is_empty()
    {
        return Err(Error::SetupNotPassed {
            setup: setup.id.clone(),
            status: setup.status.to_string(),
        });
    }
    let finals = setup.kcfg.covers_into(setup.target);
    if finals.len() > 1 && !config.graft {
        return Err(Error::UngraftableBranching {
            setup: setup.id.clone(),
            states: finals.len(),
        });
    }
    if finals.is_empty() {
        return Err(Error::SetupNotPassed {
            setup: setup.id.clone(),
            status: "no reachable final state".to_string(),
        });
    }
    Ok(finals)
}

fn initial_config(
    contract: &Contract,
    method: &Method,
    is_constructor: bool,
    config: &BuildConfig,
    fresh: &mut FreshVars,
) -> Result<CTerm> {
    let program = if is_constructor {
        if contract.init_bytecode.is_empty() {
            return Err(Error::MissingConstructor(contract.name.clone()));
        }
        contract.init_bytecode.clone()
    } else {
        contract.deployed_bytecode.clone()
    };

    let calldata = symbolic_calldata(method, &config.lengths, fresh, !is_constructor)?;

    let mut cterm = CTerm::new()
        .with_cell("program", Term::Bytes(program))
        .with_cell("callData", calldata.term)
        .with_cell("pc", Term::int(0u8))
        .with_cell("callDepth", Term::int(0u8))
        .with_cell("callStack", Term::App("list".into(), Vec::new()));
    for constraint in calldata.constraints {
        cterm.add_constraint(constraint);
    }

    // Call value: zero unless payable, then symbolic within word range.
    if method.payable {
        let value = Term::var(fresh.fresh("VCallValue_"));
        cterm.add_constraint(Term::unsigned_range(value.clone(), 256));
        cterm.set_cell("callValue", value);
    } else {
        cterm.set_cell("callValue", Term::int(0u8));
    }

    // Special addresses: symbolic, in address range, never the
    // cheat-code address.
    for (cell, prefix) in [("id", "VContract_"), ("caller", "VCaller_"), ("origin", "VOrigin_")] {
        let address = Term::var(fresh.fresh(prefix));
        cterm.add_constraint(Term::unsigned_range(address.clone(), 160));
        cterm.add_constraint(Term::neq_int(
            address.clone(),
            Term::Int(CHEATCODE_ADDRESS.into()),
        ));
        cterm.set_cell(cell, address);
    }

    // Block metadata stays symbolic within the obvious ranges.
    for (cell, prefix, bits) in [
        ("number", "VBlockNumber_", 256u32),
        ("timestamp", "VTimestamp_", 256),
        ("baseFee", "VBaseFee_", 256),
        ("chainId", "VChainId_", 64),
        ("coinbase", "VCoinbase_", 160),
    ] {
        let value = Term::var(fresh.fresh(prefix));
        cterm.add_constraint(Term::unsigned_range(value.clone(), bits));
        cterm.set_cell(cell, value);
    }

    if config.use_gas {
        let gas = Term::var(fresh.fresh("VGas_"));
        cterm.add_constraint(Term::unsigned_range(gas.clone(), 256));
        cterm.set_cell("gas", gas);
    } else {
        cterm.set_cell("gas", Term::App("infGas".into(), Vec::new()));
    }

    cterm.set_cell("accounts", accounts_cell(contract, config, fresh));
    Ok(cterm)
}

/// The initial account set: the contract under test plus every recorded
/// deployment access that actually affected state.
fn accounts_cell(contract: &Contract, config: &BuildConfig, fresh: &mut FreshVars) -> Term {
    let storage = if config.symbolic_state {
        Term::var(fresh.fresh("VStorage_"))
    } else {
        Term::App("storage".into(), Vec::new())
    };
    let mut accounts = vec![Term::App(
        "account".into(),
        vec![
            Term::var("VContractAddress".to_string()),
            Term::Bytes(contract.deployed_bytecode.clone()),
            storage,
        ],
    )];

    if let Some(state) = &config.deployment_state {
        for access in &state.accesses {
            if access.reverted || access.is_ignored() {
                continue;
            }
            let storage_entries = access
                .storage
                .iter()
                .map(|(slot, value)| {
                    Term::App(
                        "entry".into(),
                        vec![Term::Int(slot.clone()), Term::Int(value.clone())],
                    )
                })
                .collect();
            accounts.push(Term::App(
                "account".into(),
                vec![
                    Term::Int(access.account.clone()),
                    Term::Bytes(access.code.clone()),
                    Term::App("storage".into(), storage_entries),
                ],
            ));
        }
    }

    Term::App("accounts".into(), accounts)
}

fn target_config(
    contract: &Contract,
    method: &Method,
    is_constructor: bool,
    fresh: &mut FreshVars,
) -> CTerm {
    let program = if is_constructor {
        contract.init_bytecode.clone()
    } else {
        contract.deployed_bytecode.clone()
    };

    let status = Term::var(fresh.fresh("VStatusCode_"));
    let output = Term::var(fresh.fresh("VOutput_"));
    let failed = Term::var(fresh.fresh("VFailed_"));

    // Success: the call returned cleanly and the assertion flag stayed
    // clear. Fail-named tests require the negation.
    let success = Term::and(
        Term::eq_int(status.clone(), Term::int(1u8)),
        Term::eq_bool(failed.clone(), Term::Bool(false)),
    );
    let predicate = if is_fail_test(&method.name) {
        Term::not(success)
    } else {
        success
    };

    CTerm::new()
        .with_cell("program", Term::Bytes(program))
        .with_cell("statusCode", status)
        .with_cell("output", output)
        .with_cell("failed", failed)
        .with_constraint(predicate)
}
