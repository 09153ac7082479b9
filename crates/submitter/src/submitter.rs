//! The transaction submitter.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use crank_primitives::operations::CrankOperation;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{accounts::ProtocolAccounts, errors::SubmitError, instructions, target::CrankTarget};

/// How long to wait for a sent transaction to confirm before giving up on it.
const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How often to poll for confirmation of a sent transaction.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Submits one crank transaction for one target.
///
/// Implementations must treat every failure as per-record: the batch executor
/// logs the error and moves to the next record.
#[async_trait]
pub trait TxSubmitter {
    /// Builds, signs, submits, and confirms a single transaction for the
    /// given operation and target.
    async fn submit(
        &self,
        operation: CrankOperation,
        target: &CrankTarget,
    ) -> Result<Signature, SubmitError>;
}

/// A [`TxSubmitter`] that signs with the cranker keypair and submits over a
/// Solana RPC endpoint.
///
/// Transactions are sent with preflight simulation disabled: a failed-but-
/// billed transaction is accepted in exchange for lower latency and to avoid
/// false simulation rejects against rapidly-changing validator state.
pub struct SolanaSubmitter {
    rpc: Arc<RpcClient>,
    cranker: Keypair,
    accounts: ProtocolAccounts,
    request_timeout: Duration,
}

impl fmt::Debug for SolanaSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaSubmitter")
            .field("url", &self.rpc.url())
            .field("cranker", &self.cranker.pubkey())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl SolanaSubmitter {
    /// Creates a new submitter.
    pub fn new(
        rpc: Arc<RpcClient>,
        cranker: Keypair,
        accounts: ProtocolAccounts,
        request_timeout: Duration,
    ) -> Self {
        Self {
            rpc,
            cranker,
            accounts,
            request_timeout,
        }
    }

    /// The cranker's fee-payer address.
    pub fn cranker_pubkey(&self) -> solana_sdk::pubkey::Pubkey {
        self.cranker.pubkey()
    }

    fn build(
        &self,
        operation: CrankOperation,
        target: &CrankTarget,
    ) -> Result<(solana_sdk::instruction::Instruction, Vec<Keypair>), SubmitError> {
        let mismatched = || {
            SubmitError::InvalidTarget(format!("operation {operation} cannot run on {target}"))
        };

        match (operation, *target) {
            (
                CrankOperation::StakeReserve,
                CrankTarget::Reserve {
                    validator_index,
                    validator_vote,
                },
            ) => {
                // Must be a fresh account; the program initializes it.
                let stake_account = Keypair::new();
                let ix = instructions::stake_reserve(
                    &self.accounts,
                    validator_vote,
                    stake_account.pubkey(),
                    self.cranker.pubkey(),
                    validator_index,
                );

                Ok((ix, vec![stake_account]))
            }
            (
                CrankOperation::UpdateActive,
                CrankTarget::Delegation {
                    stake_account,
                    stake_index,
                    validator_index,
                    ..
                },
            ) => {
                let ix = instructions::update_active(
                    &self.accounts,
                    stake_account,
                    stake_index,
                    validator_index,
                );

                Ok((ix, vec![]))
            }
            (
                CrankOperation::UpdateDeactivated,
                CrankTarget::Delegation {
                    stake_account,
                    stake_index,
                    ..
                },
            ) => {
                let ix =
                    instructions::update_deactivated(&self.accounts, stake_account, stake_index);

                Ok((ix, vec![]))
            }
            (
                CrankOperation::DeactivateStake,
                CrankTarget::Delegation {
                    stake_account,
                    stake_index,
                    validator_index,
                    ..
                },
            ) => {
                let split_stake_account = Keypair::new();
                let ix = instructions::deactivate_stake(
                    &self.accounts,
                    stake_account,
                    split_stake_account.pubkey(),
                    self.cranker.pubkey(),
                    stake_index,
                    validator_index,
                );

                Ok((ix, vec![split_stake_account]))
            }
            (
                CrankOperation::MergeStakes,
                CrankTarget::Delegation {
                    stake_account,
                    stake_index,
                    validator_index,
                    ..
                },
            ) => {
                let ix = instructions::merge_stakes(
                    &self.accounts,
                    stake_account,
                    stake_account,
                    stake_index,
                    stake_index,
                    validator_index,
                );

                Ok((ix, vec![]))
            }
            (
                CrankOperation::Redelegate,
                CrankTarget::Delegation {
                    stake_account,
                    stake_index,
                    validator_index,
                    validator_vote,
                },
            ) => {
                let split_stake_account = Keypair::new();
                let redelegate_stake_account = Keypair::new();
                let ix = instructions::redelegate(
                    &self.accounts,
                    stake_account,
                    split_stake_account.pubkey(),
                    self.cranker.pubkey(),
                    validator_vote,
                    redelegate_stake_account.pubkey(),
                    stake_index,
                    validator_index,
                    validator_index,
                );

                Ok((ix, vec![split_stake_account, redelegate_stake_account]))
            }
            _ => Err(mismatched()),
        }
    }

    async fn bounded<T, F>(&self, what: &'static str, call: F) -> Result<T, SubmitError>
    where
        F: Future<Output = Result<T, solana_client::client_error::ClientError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SubmitError::Rpc(e)),
            Err(_) => Err(SubmitError::Timeout(what)),
        }
    }

    async fn wait_for_confirmation(&self, signature: &Signature) -> Result<(), SubmitError> {
        let deadline = Instant::now() + CONFIRMATION_TIMEOUT;

        loop {
            if self
                .bounded("confirmTransaction", self.rpc.confirm_transaction(signature))
                .await?
            {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(SubmitError::Unconfirmed(*signature));
            }

            tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl TxSubmitter for SolanaSubmitter {
    async fn submit(
        &self,
        operation: CrankOperation,
        target: &CrankTarget,
    ) -> Result<Signature, SubmitError> {
        let (instruction, extra_signers) = self.build(operation, target)?;

        // A fresh blockhash right before signing; a stale one is a defined
        // failure mode, not a bug.
        let blockhash = self
            .bounded("getLatestBlockhash", self.rpc.get_latest_blockhash())
            .await?;

        let transaction = {
            let mut signers: Vec<&dyn Signer> = vec![&self.cranker];
            signers.extend(extra_signers.iter().map(|keypair| keypair as &dyn Signer));

            Transaction::new_signed_with_payer(
                &[instruction],
                Some(&self.cranker.pubkey()),
                &signers,
                blockhash,
            )
        };

        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..Default::default()
        };

        let signature = self
            .bounded(
                "sendTransaction",
                self.rpc.send_transaction_with_config(&transaction, config),
            )
            .await?;
        debug!(%operation, %target, %signature, "transaction sent");

        self.wait_for_confirmation(&signature).await?;
        info!(%operation, %target, %signature, "transaction confirmed");

        Ok(signature)
    }
}
